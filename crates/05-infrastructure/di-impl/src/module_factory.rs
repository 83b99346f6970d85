//! 模块工厂实现
//!
//! 构建顺序：
//!
//! 1. 合并子模块的工厂引用
//! 2. 加载内置服务，按替换表换用调用方的实现
//! 3. 注册调用方的服务
//! 4. 注册调用方的组件
//! 5. 挂载根组件
//!
//! 同名注册会替换之前的工厂，但保留名称最初的注册位置。

use crate::factory::TypedFactory;
use crate::services::{baseline_services, LOGGER_SERVICE};
use di_abstractions::{
    Descriptor, Factory, FactoryHandle, InstanceRef, ModuleDefinition, ModuleRegistry,
    RootFactory, ServiceOverride,
};
use indexmap::IndexMap;
use infrastructure_common::{
    emit_to_tracing, DependencyError, Instance, InstanceId, InstanceKind, LogField, LogLevel,
    ModuleOptions, NamingConventions, Service, Severity, TypeInfo,
};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// 构建期间暂存的诊断信息，模块可用后再汇报
struct Diagnostic {
    severity: Severity,
    message: String,
    subject: String,
}

impl Diagnostic {
    fn new(severity: Severity, subject: &str, message: String) -> Self {
        Self {
            severity,
            message,
            subject: subject.to_string(),
        }
    }
}

/// 汇报期间置位，防止日志服务自身的问题再次进入汇报
struct ReportGuard<'a>(&'a AtomicBool);

impl Drop for ReportGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 模块工厂
///
/// 持有名称到工厂的映射。映射在构造时确定，之后只能通过工厂的
/// `create` / `destroy` 改变实例。
pub struct ModuleFactory {
    factories: IndexMap<String, FactoryHandle>,
    /// 合并的子模块，合并来的工厂仍然回调它们
    modules: Vec<Arc<dyn ModuleRegistry>>,
    options: ModuleOptions,
    reporting: AtomicBool,
}

impl ModuleFactory {
    /// 使用默认选项创建模块
    pub fn new(
        definition: ModuleDefinition,
        overrides: Vec<ServiceOverride>,
    ) -> Result<Arc<Self>, DependencyError> {
        Self::with_options(definition, ModuleOptions::default(), overrides)
    }

    /// 创建模块
    ///
    /// 名称无法分类、种类不匹配以及根组件未注册都是致命错误。
    pub fn with_options(
        definition: ModuleDefinition,
        options: ModuleOptions,
        overrides: Vec<ServiceOverride>,
    ) -> Result<Arc<Self>, DependencyError> {
        let mut definition = definition;
        let root_component = definition.root_component.clone();
        let modules = std::mem::take(&mut definition.modules);
        let mut diagnostics = Vec::new();
        let mut failure = None;

        let module = Arc::new_cyclic(|weak: &Weak<Self>| {
            let registry: Weak<dyn ModuleRegistry> = weak.clone();
            let factories = build_factories(
                &registry,
                options.log,
                &modules,
                definition,
                overrides,
                &mut diagnostics,
            )
            .unwrap_or_else(|e| {
                failure = Some(e);
                IndexMap::new()
            });

            Self {
                factories,
                modules,
                options,
                reporting: AtomicBool::new(false),
            }
        });

        if let Some(e) = failure {
            return Err(e);
        }

        for diagnostic in diagnostics {
            let context = [LogField::new("type", &diagnostic.subject)];
            module.report(diagnostic.severity, &diagnostic.message, &context);
        }

        if let Some(name) = root_component {
            module.mount_root(&name)?;
        }

        info!(
            factories = module.factories.len(),
            components = module.get_component_registry().len(),
            "模块工厂已创建"
        );
        Ok(module)
    }

    /// 按名称查找工厂
    ///
    /// 名称两个后缀都不匹配时返回错误；日志服务缺失时返回错误；
    /// 其他名称缺失只汇报错误并返回 `None`。
    pub fn get_factory(&self, name: &str) -> Result<Option<FactoryHandle>, DependencyError> {
        let kind = NamingConventions::classify(name)?;
        if let Some(handle) = self.factories.get(name) {
            return Ok(Some(handle.clone()));
        }

        if name == LOGGER_SERVICE {
            return Err(DependencyError::LoggerUnavailable {
                type_name: name.to_string(),
            });
        }

        self.report(
            Severity::Error,
            &format!("未找到 {} 的工厂: {}", kind, name),
            &[LogField::new("type", name)],
        );
        Ok(None)
    }

    /// 按类型查找工厂
    pub fn get_factory_of<T: ?Sized + 'static>(
        &self,
    ) -> Result<Option<FactoryHandle>, DependencyError> {
        self.get_factory(&TypeInfo::of::<T>().name)
    }

    /// 按名称获取实例，未指定ID时返回最近创建的存活实例
    pub fn get(
        &self,
        name: &str,
        id: Option<InstanceId>,
    ) -> Result<Option<InstanceRef>, DependencyError> {
        Ok(self.get_factory(name)?.and_then(|handle| handle.get(id)))
    }

    /// 按类型获取实例
    pub fn get_of<T: Any + Send + Sync>(
        &self,
        id: Option<InstanceId>,
    ) -> Result<Option<Arc<T>>, DependencyError> {
        self.get_as::<T>(&TypeInfo::of::<T>().name, id)
    }

    /// 按名称获取实例并转换为具体类型
    ///
    /// 注册在该名称下的实现不是 `T` 时返回 [`DependencyError::DowncastFailed`]。
    pub fn get_as<T: Any + Send + Sync>(
        &self,
        name: &str,
        id: Option<InstanceId>,
    ) -> Result<Option<Arc<T>>, DependencyError> {
        self.get(name, id)?
            .map(|instance| {
                instance
                    .downcast::<T>()
                    .ok_or_else(|| DependencyError::DowncastFailed {
                        type_name: name.to_string(),
                    })
            })
            .transpose()
    }

    /// 已注册的组件名称，按注册顺序
    pub fn get_component_registry(&self) -> Vec<String> {
        self.names_of(InstanceKind::Component)
    }

    /// 已注册的服务名称，按注册顺序
    pub fn service_registry(&self) -> Vec<String> {
        self.names_of(InstanceKind::Service)
    }

    /// 模块选项
    pub fn options(&self) -> &ModuleOptions {
        &self.options
    }

    /// 合并的子模块数量
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    fn names_of(&self, kind: InstanceKind) -> Vec<String> {
        self.factories
            .iter()
            .filter(|(_, handle)| handle.kind() == kind)
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn mount_root(&self, name: &str) -> Result<(), DependencyError> {
        let factory = self
            .factories
            .get(name)
            .and_then(FactoryHandle::as_component)
            .ok_or_else(|| DependencyError::ComponentNotRegistered {
                type_name: name.to_string(),
            })?;

        match factory.create_root(None)? {
            Some(root) => {
                debug!(component = name, id = ?root.id(), "根组件已挂载");
                Ok(())
            }
            None => Err(DependencyError::RootMountFailed {
                type_name: name.to_string(),
                message: "组件工厂没有构造函数".to_string(),
            }),
        }
    }

    /// 当前的日志服务实例，没有存活实例时创建一个
    fn logger(&self) -> Option<Arc<dyn Service>> {
        let factory = self.factories.get(LOGGER_SERVICE)?.as_service()?;
        factory
            .get(None)
            .or_else(|| factory.create(None).ok().flatten())
    }
}

impl ModuleRegistry for ModuleFactory {
    fn factory(&self, name: &str) -> Result<Option<FactoryHandle>, DependencyError> {
        self.get_factory(name)
    }

    fn factories(&self) -> Vec<(String, FactoryHandle)> {
        self.factories
            .iter()
            .map(|(name, handle)| (name.clone(), handle.clone()))
            .collect()
    }

    fn component_registry(&self) -> Vec<String> {
        self.get_component_registry()
    }

    fn options(&self) -> &ModuleOptions {
        &self.options
    }

    fn report(&self, severity: Severity, message: &str, context: &[LogField]) {
        if self.reporting.swap(true, Ordering::SeqCst) {
            if self.options.log.allows(severity) {
                emit_to_tracing(severity, message, context);
            }
            return;
        }
        let _guard = ReportGuard(&self.reporting);

        let logger = self.logger();
        match logger.as_deref().and_then(|logger| logger.log_sink()) {
            Some(sink) => sink.log(severity, message, context),
            None => {
                if self.options.log.allows(severity) {
                    emit_to_tracing(severity, message, context);
                }
            }
        }
    }
}

impl fmt::Debug for ModuleFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleFactory")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .field("modules", &self.modules.len())
            .field("options", &self.options)
            .finish()
    }
}

fn build_factories(
    module: &Weak<dyn ModuleRegistry>,
    log_level: LogLevel,
    modules: &[Arc<dyn ModuleRegistry>],
    definition: ModuleDefinition,
    overrides: Vec<ServiceOverride>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<IndexMap<String, FactoryHandle>, DependencyError> {
    let mut factories = IndexMap::new();

    for child in modules {
        for (name, handle) in child.factories() {
            factories.insert(name, handle);
        }
    }

    let mut overrides: IndexMap<String, ServiceOverride> = overrides
        .into_iter()
        .map(|override_| (override_.key().to_string(), override_))
        .collect();

    for baseline in baseline_services() {
        let descriptor = match overrides.shift_remove(baseline.registry_name()) {
            Some(override_) => {
                let descriptor = override_.into_descriptor();
                info!(
                    service = baseline.registry_name(),
                    replacement = %descriptor.type_info().name,
                    "替换内置服务"
                );
                descriptor
            }
            None => baseline,
        };
        let handle = register_service(module, log_level, descriptor, &factories, diagnostics)?;
        factories.insert(handle.name().to_string(), handle);
    }

    for key in overrides.keys() {
        diagnostics.push(Diagnostic::new(
            Severity::Warn,
            key,
            format!("{} 不是内置服务，替换被忽略", key),
        ));
    }

    for descriptor in definition.service_constructors {
        let handle = register_service(module, log_level, descriptor, &factories, diagnostics)?;
        factories.insert(handle.name().to_string(), handle);
    }

    for descriptor in definition.component_constructors {
        let name = descriptor.registry_name().to_string();
        NamingConventions::ensure_kind(&name, InstanceKind::Component)?;
        let prerequisites = resolve_prerequisites(
            &name,
            InstanceKind::Component,
            descriptor.prerequisites(),
            &factories,
            diagnostics,
        );
        let factory = build_factory(
            module,
            log_level,
            InstanceKind::Component,
            descriptor,
            prerequisites,
            diagnostics,
        )?;
        debug!(component = %name, "注册组件");
        factories.insert(name, FactoryHandle::Component(Arc::new(factory)));
    }

    Ok(factories)
}

fn register_service(
    module: &Weak<dyn ModuleRegistry>,
    log_level: LogLevel,
    descriptor: Descriptor<dyn Service>,
    factories: &IndexMap<String, FactoryHandle>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<FactoryHandle, DependencyError> {
    let name = descriptor.registry_name().to_string();
    NamingConventions::ensure_kind(&name, InstanceKind::Service)?;
    let prerequisites = resolve_prerequisites(
        &name,
        InstanceKind::Service,
        descriptor.prerequisites(),
        factories,
        diagnostics,
    );
    let factory = build_factory(
        module,
        log_level,
        InstanceKind::Service,
        descriptor,
        prerequisites,
        diagnostics,
    )?;
    debug!(service = %name, "注册服务");
    Ok(FactoryHandle::Service(Arc::new(factory)))
}

fn build_factory<I: ?Sized + Instance>(
    module: &Weak<dyn ModuleRegistry>,
    log_level: LogLevel,
    kind: InstanceKind,
    descriptor: Descriptor<I>,
    prerequisites: Vec<FactoryHandle>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<TypedFactory<I>, DependencyError> {
    if descriptor.constructor().is_none() {
        let name = descriptor.registry_name();
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            name,
            format!("{}: 缺少实例的构造函数，工厂无法创建实例", name),
        ));
    }
    Ok(TypedFactory::new(Some(module.clone()), kind, descriptor, prerequisites)?
        .with_log_level(log_level))
}

/// 把前置依赖名称解析为已注册的工厂引用
///
/// 服务只能依赖服务。
fn resolve_prerequisites(
    name: &str,
    kind: InstanceKind,
    prerequisites: &[String],
    factories: &IndexMap<String, FactoryHandle>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<FactoryHandle> {
    let mut resolved = Vec::with_capacity(prerequisites.len());
    for prerequisite in prerequisites {
        match factories.get(prerequisite) {
            Some(handle)
                if kind == InstanceKind::Service && handle.kind() == InstanceKind::Component =>
            {
                diagnostics.push(Diagnostic::new(
                    Severity::Error,
                    name,
                    format!("服务 {} 不能依赖组件 {}", name, prerequisite),
                ));
            }
            Some(handle) => resolved.push(handle.clone()),
            None => diagnostics.push(Diagnostic::new(
                Severity::Warn,
                name,
                format!("{} 的前置依赖 {} 尚未注册，已跳过", name, prerequisite),
            )),
        }
    }
    resolved
}
