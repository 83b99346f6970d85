//! 实例构造上下文
//!
//! 构造函数通过上下文拿到所属模块和已解析的前置依赖工厂

use crate::factory::{FactoryHandle, InstanceRef};
use crate::registry::ModuleRegistry;
use infrastructure_common::{
    Component, DependencyError, InstanceId, LogField, Service, Severity, TypeInfo,
};
use std::sync::{Arc, Weak};

/// 可注入类型
///
/// 描述自身如何从构造上下文创建。
pub trait Injectable: Sized {
    /// 使用构造上下文创建实例
    fn construct(ctx: &InstanceContext<'_>) -> Result<Self, DependencyError>;
}

/// 构造上下文
pub struct InstanceContext<'a> {
    module: &'a Weak<dyn ModuleRegistry>,
    name: &'a str,
    id: InstanceId,
    prerequisites: &'a [FactoryHandle],
}

impl<'a> InstanceContext<'a> {
    /// 创建新的构造上下文
    pub fn new(
        module: &'a Weak<dyn ModuleRegistry>,
        name: &'a str,
        id: InstanceId,
        prerequisites: &'a [FactoryHandle],
    ) -> Self {
        Self {
            module,
            name,
            id,
            prerequisites,
        }
    }

    /// 正在构造的注册名称
    pub fn name(&self) -> &str {
        self.name
    }

    /// 即将分配给实例的ID
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// 所属模块
    pub fn module(&self) -> Result<Arc<dyn ModuleRegistry>, DependencyError> {
        self.module
            .upgrade()
            .ok_or(DependencyError::MissingModuleContext)
    }

    /// 所属模块的弱引用，供实例保存以便之后回调
    pub fn module_ref(&self) -> Weak<dyn ModuleRegistry> {
        self.module.clone()
    }

    /// 已声明的前置依赖名称
    pub fn prerequisite_names(&self) -> Vec<&str> {
        self.prerequisites.iter().map(FactoryHandle::name).collect()
    }

    /// 前置依赖工厂
    pub fn prerequisite_factory(&self, name: &str) -> Result<&FactoryHandle, DependencyError> {
        self.prerequisites
            .iter()
            .find(|handle| handle.name() == name)
            .ok_or_else(|| DependencyError::PrerequisiteNotDeclared {
                type_name: self.name.to_string(),
                prerequisite: name.to_string(),
            })
    }

    /// 前置依赖实例
    ///
    /// 优先使用最近创建的存活实例，没有则创建一个。
    pub fn prerequisite(&self, name: &str) -> Result<InstanceRef, DependencyError> {
        let handle = self.prerequisite_factory(name)?;
        if let Some(instance) = handle.get(None) {
            return Ok(instance);
        }

        handle.create(None)?.ok_or_else(|| {
            DependencyError::creation_failed(name, format!("{} 的前置依赖工厂没有构造函数", self.name))
        })
    }

    /// 按类型获取前置服务
    pub fn service<T: Service>(&self) -> Result<Arc<T>, DependencyError> {
        self.typed_prerequisite::<T>()
    }

    /// 按类型获取前置组件
    pub fn component<T: Component>(&self) -> Result<Arc<T>, DependencyError> {
        self.typed_prerequisite::<T>()
    }

    fn typed_prerequisite<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, DependencyError> {
        let type_info = TypeInfo::of::<T>();
        self.prerequisite(&type_info.name)?
            .downcast::<T>()
            .ok_or(DependencyError::DowncastFailed {
                type_name: type_info.name,
            })
    }

    /// 通过所属模块汇报
    pub fn report(&self, severity: Severity, message: &str) {
        let context = [LogField::new("instance", self.name), LogField::new("id", self.id)];
        match self.module.upgrade() {
            Some(module) => module.report(severity, message, &context),
            None => infrastructure_common::emit_to_tracing(severity, message, &context),
        }
    }
}
