//! 类型工厂实现
//!
//! 一个 [`TypedFactory`] 对应一个注册名称，负责这个类型所有实例的创建、
//! 查找和销毁。ID 来自单调递增的计数器，从 1 开始，销毁后不复用。

use di_abstractions::{
    Constructor, Descriptor, Factory, FactoryHandle, InstanceContext, ModuleRegistry, RootFactory,
};
use indexmap::IndexMap;
use infrastructure_common::{
    emit_to_tracing, Component, DependencyError, Instance, InstanceData, InstanceId, InstanceKind,
    LogField, LogLevel, Service, Severity, TypeInfo,
};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

/// 服务工厂
pub type ServiceFactory = TypedFactory<dyn Service>;

/// 组件工厂
pub type ComponentFactory = TypedFactory<dyn Component>;

/// 工厂内部状态
struct FactoryState<I: ?Sized> {
    /// 下一个要分配的ID
    counter: InstanceId,
    /// 存活实例，按创建顺序
    instances: IndexMap<InstanceId, Arc<I>>,
}

/// 类型工厂
pub struct TypedFactory<I: ?Sized> {
    name: String,
    type_info: TypeInfo,
    kind: InstanceKind,
    constructor: Option<Constructor<I>>,
    prerequisites: Vec<FactoryHandle>,
    module: Weak<dyn ModuleRegistry>,
    /// 模块已释放时回退输出所用的级别
    log_level: LogLevel,
    state: Mutex<FactoryState<I>>,
}

impl<I: ?Sized + Instance> TypedFactory<I> {
    /// 创建新的类型工厂
    ///
    /// 缺少模块上下文是致命错误；缺少构造函数时工厂仍然创建，但处于惰性状态。
    pub fn new(
        module: Option<Weak<dyn ModuleRegistry>>,
        kind: InstanceKind,
        descriptor: Descriptor<I>,
        prerequisites: Vec<FactoryHandle>,
    ) -> Result<Self, DependencyError> {
        let module = module.ok_or(DependencyError::MissingModuleContext)?;

        Ok(Self {
            name: descriptor.registry_name().to_string(),
            type_info: descriptor.type_info().clone(),
            kind,
            constructor: descriptor.constructor().cloned(),
            prerequisites,
            module,
            log_level: LogLevel::default(),
            state: Mutex::new(FactoryState {
                counter: InstanceId::FIRST,
                instances: IndexMap::new(),
            }),
        })
    }

    /// 设置回退输出的日志级别，通常与所属模块的选项一致
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// 已解析的前置依赖工厂
    pub fn prerequisites(&self) -> &[FactoryHandle] {
        &self.prerequisites
    }

    /// 下一个将要分配的ID
    pub fn next_id(&self) -> InstanceId {
        self.state.lock().counter
    }

    /// 创建实例，`root` 为真时在共享前标记为根组件
    fn create_instance(
        &self,
        data: Option<InstanceData>,
        root: bool,
    ) -> Result<Option<Arc<I>>, DependencyError> {
        let Some(constructor) = &self.constructor else {
            self.report(
                Severity::Error,
                format!("{}: 缺少实例的构造函数，无法创建实例", self.name),
            );
            return Ok(None);
        };

        // 先占用ID再构造，构造函数可能回调同一个工厂
        let id = {
            let mut state = self.state.lock();
            let id = state.counter;
            state.counter = id.next();
            id
        };

        let context = InstanceContext::new(&self.module, &self.name, id, &self.prerequisites);
        let mut instance = constructor(&context)?;
        instance.set_data(id, data);
        if root {
            instance.base_mut().mark_root();
        }

        let instance: Arc<I> = Arc::from(instance);
        self.state.lock().instances.insert(id, Arc::clone(&instance));

        debug!(factory = %self.name, %id, root, "实例已创建");
        Ok(Some(instance))
    }

    /// 执行清理钩子并移除实例，实例不存在时返回 `false`
    fn release(&self, id: InstanceId) -> bool {
        let instance = self.state.lock().instances.get(&id).cloned();
        let Some(instance) = instance else {
            return false;
        };

        // 清理钩子只执行一次；失败只汇报，实例照常移除
        if instance.base().begin_release() {
            if let Err(e) = instance.destroy() {
                self.report(
                    Severity::Error,
                    format!("{}: 实例 {} 的清理钩子失败: {}", self.name, id, e),
                );
            }
        }

        self.state.lock().instances.shift_remove(&id);
        debug!(factory = %self.name, %id, "实例已销毁");
        true
    }

    fn report(&self, severity: Severity, message: String) {
        let context = [LogField::new("factory", &self.name)];
        match self.module.upgrade() {
            Some(module) => module.report(severity, &message, &context),
            None if self.log_level.allows(severity) => {
                emit_to_tracing(severity, &message, &context)
            }
            None => {}
        }
    }
}

impl<I: ?Sized + Instance> Factory for TypedFactory<I> {
    type Target = I;

    fn name(&self) -> &str {
        &self.name
    }

    fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    fn kind(&self) -> InstanceKind {
        self.kind
    }

    fn is_inert(&self) -> bool {
        self.constructor.is_none()
    }

    fn prerequisite_names(&self) -> Vec<String> {
        self.prerequisites
            .iter()
            .map(|handle| handle.name().to_string())
            .collect()
    }

    fn create(&self, data: Option<InstanceData>) -> Result<Option<Arc<I>>, DependencyError> {
        self.create_instance(data, false)
    }

    fn get(&self, id: Option<InstanceId>) -> Option<Arc<I>> {
        let Some(id) = id else {
            return self
                .state
                .lock()
                .instances
                .last()
                .map(|(_, instance)| Arc::clone(instance));
        };

        let found = self.state.lock().instances.get(&id).cloned();
        if found.is_none() {
            self.report(
                Severity::Error,
                format!("{}: 未找到ID为 {} 的实例", self.name, id),
            );
        }
        found
    }

    fn contains(&self, id: InstanceId) -> bool {
        self.state.lock().instances.contains_key(&id)
    }

    fn destroy(&self, id: InstanceId) {
        if !self.release(id) {
            self.report(
                Severity::Warn,
                format!("销毁实例 {} 失败: 工厂 {} 中不存在该ID", id, self.name),
            );
        }
    }

    fn destroy_all(&self) {
        // 只处理调用时的快照；清理钩子新建的实例保留，已被移除的ID跳过
        for id in self.live_ids() {
            self.release(id);
        }
    }

    fn live_ids(&self) -> Vec<InstanceId> {
        self.state.lock().instances.keys().copied().collect()
    }

    fn len(&self) -> usize {
        self.state.lock().instances.len()
    }
}

impl RootFactory for TypedFactory<dyn Component> {
    fn create_root(
        &self,
        data: Option<InstanceData>,
    ) -> Result<Option<Arc<dyn Component>>, DependencyError> {
        let Some(root) = self.create_instance(data, true)? else {
            return Ok(None);
        };

        if let Err(e) = root.append() {
            self.report(
                Severity::Error,
                format!("{}: 根组件挂载失败: {}", self.name, e),
            );
        }
        Ok(Some(root))
    }
}

impl<I: ?Sized> fmt::Debug for TypedFactory<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TypedFactory")
            .field("name", &self.name)
            .field("type", &self.type_info.name)
            .field("kind", &self.kind)
            .field("inert", &self.constructor.is_none())
            .field("prerequisites", &self.prerequisites)
            .field("counter", &state.counter)
            .field("live", &state.instances.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_abstractions::{ComponentDescriptor, ServiceDescriptor};
    use infrastructure_common::{InstanceBase, LifecycleError, ModuleOptions};
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::OnceLock;

    /// 只记录汇报内容的模块
    #[derive(Default)]
    struct RecordingModule {
        options: ModuleOptions,
        reports: parking_lot::Mutex<Vec<(Severity, String)>>,
    }

    impl RecordingModule {
        fn reports(&self) -> Vec<(Severity, String)> {
            self.reports.lock().clone()
        }
    }

    impl ModuleRegistry for RecordingModule {
        fn factory(&self, _name: &str) -> Result<Option<FactoryHandle>, DependencyError> {
            Ok(None)
        }

        fn factories(&self) -> Vec<(String, FactoryHandle)> {
            Vec::new()
        }

        fn component_registry(&self) -> Vec<String> {
            Vec::new()
        }

        fn options(&self) -> &ModuleOptions {
            &self.options
        }

        fn report(&self, severity: Severity, message: &str, _context: &[LogField]) {
            self.reports.lock().push((severity, message.to_string()));
        }
    }

    struct CounterService {
        base: InstanceBase,
        cleanups: Arc<AtomicUsize>,
        fail_cleanup: bool,
    }

    impl Instance for CounterService {
        fn base(&self) -> &InstanceBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut InstanceBase {
            &mut self.base
        }

        fn destroy(&self) -> Result<(), LifecycleError> {
            self.cleanups.fetch_add(1, Ordering::SeqCst);
            if self.fail_cleanup {
                return Err(LifecycleError::cleanup("句柄已关闭"));
            }
            Ok(())
        }
    }

    impl Service for CounterService {}

    struct PanelComponent {
        base: InstanceBase,
        appends: Arc<AtomicUsize>,
    }

    impl Instance for PanelComponent {
        fn base(&self) -> &InstanceBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut InstanceBase {
            &mut self.base
        }
    }

    impl Component for PanelComponent {
        fn append(&self) -> Result<(), LifecycleError> {
            self.appends.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn service_factory(
        module: &Arc<RecordingModule>,
        cleanups: Arc<AtomicUsize>,
        fail_cleanup: bool,
    ) -> ServiceFactory {
        let descriptor = ServiceDescriptor::from_fn(move |_| {
            Ok(CounterService {
                base: InstanceBase::new(),
                cleanups: Arc::clone(&cleanups),
                fail_cleanup,
            })
        });
        let weak: Weak<dyn ModuleRegistry> = Arc::downgrade(module) as Weak<dyn ModuleRegistry>;
        TypedFactory::new(Some(weak), InstanceKind::Service, descriptor, Vec::new()).unwrap()
    }

    #[test]
    fn test_missing_module_context_is_fatal() {
        let descriptor = ServiceDescriptor::declared("OrphanService");
        let result = ServiceFactory::new(None, InstanceKind::Service, descriptor, Vec::new());
        assert!(matches!(result, Err(DependencyError::MissingModuleContext)));
    }

    #[test]
    fn test_ids_increase_and_are_never_reused() {
        let module = Arc::new(RecordingModule::default());
        let factory = service_factory(&module, Arc::default(), false);

        let first = factory.create(None).unwrap().unwrap();
        let second = factory.create(None).unwrap().unwrap();
        assert_eq!(first.id(), Some(InstanceId::new(1)));
        assert_eq!(second.id(), Some(InstanceId::new(2)));

        factory.destroy(InstanceId::new(2));
        let third = factory.create(None).unwrap().unwrap();
        assert_eq!(third.id(), Some(InstanceId::new(3)));
        assert_eq!(factory.live_ids(), vec![InstanceId::new(1), InstanceId::new(3)]);
    }

    #[test]
    fn test_get_without_id_follows_creation_order() {
        let module = Arc::new(RecordingModule::default());
        let factory = service_factory(&module, Arc::default(), false);
        assert!(factory.get(None).is_none());

        factory.create(None).unwrap();
        factory.create(None).unwrap();
        factory.create(None).unwrap();

        factory.destroy(InstanceId::new(3));
        assert_eq!(factory.get(None).unwrap().id(), Some(InstanceId::new(2)));

        factory.destroy(InstanceId::new(1));
        factory.destroy(InstanceId::new(2));
        assert!(factory.get(None).is_none());
        assert!(module.reports().is_empty());
    }

    #[test]
    fn test_create_passes_data_through() {
        let module = Arc::new(RecordingModule::default());
        let factory = service_factory(&module, Arc::default(), false);

        let instance = factory
            .create(Some(serde_json::json!({"label": "header"})))
            .unwrap()
            .unwrap();
        assert_eq!(instance.data().unwrap()["label"], "header");
    }

    #[test]
    fn test_get_unknown_id_reports_error() {
        let module = Arc::new(RecordingModule::default());
        let factory = service_factory(&module, Arc::default(), false);

        assert!(factory.get(Some(InstanceId::new(42))).is_none());

        let reports = module.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, Severity::Error);
        assert!(reports[0].1.contains("42"));
    }

    #[test]
    fn test_destroy_runs_cleanup_once() {
        let module = Arc::new(RecordingModule::default());
        let cleanups = Arc::new(AtomicUsize::new(0));
        let factory = service_factory(&module, Arc::clone(&cleanups), false);

        let instance = factory.create(None).unwrap().unwrap();
        let id = instance.id().unwrap();
        factory.destroy(id);
        factory.destroy(id);

        assert_eq!(cleanups.load(Ordering::SeqCst), 1);
        assert!(!factory.contains(id));

        let reports = module.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, Severity::Warn);
    }

    #[test]
    fn test_failing_cleanup_still_removes_instance() {
        let module = Arc::new(RecordingModule::default());
        let cleanups = Arc::new(AtomicUsize::new(0));
        let factory = service_factory(&module, Arc::clone(&cleanups), true);

        factory.create(None).unwrap();
        factory.destroy(InstanceId::FIRST);

        assert!(factory.is_empty());
        assert_eq!(cleanups.load(Ordering::SeqCst), 1);
        assert_eq!(module.reports()[0].0, Severity::Error);
    }

    #[test]
    fn test_destroy_all() {
        let module = Arc::new(RecordingModule::default());
        let cleanups = Arc::new(AtomicUsize::new(0));
        let factory = service_factory(&module, Arc::clone(&cleanups), false);

        factory.destroy_all();
        assert!(module.reports().is_empty());

        for _ in 0..4 {
            factory.create(None).unwrap();
        }
        factory.destroy_all();

        assert!(factory.is_empty());
        assert_eq!(cleanups.load(Ordering::SeqCst), 4);
        assert_eq!(factory.next_id(), InstanceId::new(5));
    }

    /// 清理时再创建一个同类实例的服务
    struct RespawnService {
        base: InstanceBase,
        factory: Arc<OnceLock<Weak<ServiceFactory>>>,
    }

    impl Instance for RespawnService {
        fn base(&self) -> &InstanceBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut InstanceBase {
            &mut self.base
        }

        fn destroy(&self) -> Result<(), LifecycleError> {
            if let Some(factory) = self.factory.get().and_then(Weak::upgrade) {
                factory
                    .create(None)
                    .map_err(|e| LifecycleError::cleanup(e.to_string()))?;
            }
            Ok(())
        }
    }

    impl Service for RespawnService {}

    #[test]
    fn test_destroy_all_keeps_instances_created_by_cleanup() {
        let module = Arc::new(RecordingModule::default());
        let slot: Arc<OnceLock<Weak<ServiceFactory>>> = Arc::default();
        let shared = Arc::clone(&slot);
        let descriptor = ServiceDescriptor::from_fn(move |_| {
            Ok(RespawnService {
                base: InstanceBase::new(),
                factory: Arc::clone(&shared),
            })
        });
        let weak: Weak<dyn ModuleRegistry> = Arc::downgrade(&module) as Weak<dyn ModuleRegistry>;
        let factory = Arc::new(
            ServiceFactory::new(Some(weak), InstanceKind::Service, descriptor, Vec::new()).unwrap(),
        );
        assert!(slot.set(Arc::downgrade(&factory)).is_ok());

        factory.create(None).unwrap();
        factory.create(None).unwrap();
        factory.destroy_all();

        assert_eq!(factory.live_ids(), vec![InstanceId::new(3), InstanceId::new(4)]);
        assert!(module.reports().is_empty());
    }

    /// 收集 tracing 输出
    #[derive(Clone, Default)]
    struct CapturedOutput(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl CapturedOutput {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl io::Write for CapturedOutput {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_report_after_module_dropped_respects_log_level() {
        let module = Arc::new(RecordingModule::default());
        let factory =
            service_factory(&module, Arc::default(), false).with_log_level(LogLevel::Error);
        drop(module);

        let output = CapturedOutput::default();
        let writer = output.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            assert!(factory.get(Some(InstanceId::new(42))).is_none());
            factory.destroy(InstanceId::new(99));
        });

        let text = output.text();
        assert!(text.contains("未找到ID为 42 的实例"));
        assert!(!text.contains("销毁实例 99"));
    }

    #[test]
    fn test_inert_factory_reports_and_returns_none() {
        let module = Arc::new(RecordingModule::default());
        let weak: Weak<dyn ModuleRegistry> = Arc::downgrade(&module) as Weak<dyn ModuleRegistry>;
        let factory = ServiceFactory::new(
            Some(weak),
            InstanceKind::Service,
            ServiceDescriptor::declared("PendingService"),
            Vec::new(),
        )
        .unwrap();

        assert!(factory.is_inert());
        assert!(factory.create(None).unwrap().is_none());
        assert_eq!(module.reports().len(), 1);
    }

    #[test]
    fn test_create_root_marks_and_appends() {
        let module = Arc::new(RecordingModule::default());
        let appends = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&appends);
        let descriptor = ComponentDescriptor::from_fn(move |_| {
            Ok(PanelComponent {
                base: InstanceBase::new(),
                appends: Arc::clone(&counter),
            })
        });
        let weak: Weak<dyn ModuleRegistry> = Arc::downgrade(&module) as Weak<dyn ModuleRegistry>;
        let factory =
            ComponentFactory::new(Some(weak), InstanceKind::Component, descriptor, Vec::new())
                .unwrap();

        let plain = factory.create(None).unwrap().unwrap();
        let root = factory.create_root(None).unwrap().unwrap();

        assert!(!plain.is_root());
        assert!(root.is_root());
        assert_eq!(appends.load(Ordering::SeqCst), 1);
    }
}
