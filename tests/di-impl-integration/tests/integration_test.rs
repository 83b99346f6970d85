//! 跨 crate 集成测试：子模块合并、构建器和内置服务

use di_abstractions::{
    ComponentDescriptor, InstanceContext, Injectable, ModuleDefinition, ModuleRegistry,
    RootFactory, ServiceDescriptor,
};
use di_impl::{ApplicationEvent, ApplicationEventService, ListenerOptions, ModuleFactory};
use infrastructure_common::{
    Component, DependencyError, Instance, InstanceBase, InstanceId, LifecycleError, LogLevel,
    ModuleOptions, Service,
};
use infrastructure_composition::ModuleBuilder;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::{Arc, Weak};

/// 会话服务，保存所属模块的引用
struct SessionService {
    base: InstanceBase,
    module: Weak<dyn ModuleRegistry>,
}

impl Instance for SessionService {
    fn base(&self) -> &InstanceBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InstanceBase {
        &mut self.base
    }
}

impl Service for SessionService {}

impl Injectable for SessionService {
    fn construct(ctx: &InstanceContext<'_>) -> Result<Self, DependencyError> {
        Ok(Self {
            base: InstanceBase::new(),
            module: ctx.module_ref(),
        })
    }
}

/// 通过事件服务广播登录状态的组件
struct LoginComponent {
    base: InstanceBase,
    session: Arc<SessionService>,
    events: Arc<ApplicationEventService>,
}

impl Instance for LoginComponent {
    fn base(&self) -> &InstanceBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InstanceBase {
        &mut self.base
    }
}

impl Component for LoginComponent {
    fn append(&self) -> Result<(), LifecycleError> {
        self.events
            .send_event("mounted", Some(json!("LoginComponent")), false);
        Ok(())
    }
}

impl Injectable for LoginComponent {
    fn construct(ctx: &InstanceContext<'_>) -> Result<Self, DependencyError> {
        Ok(Self {
            base: InstanceBase::new(),
            session: ctx.service::<SessionService>()?,
            events: ctx.service::<ApplicationEventService>()?,
        })
    }
}

/// 构造时读取所属模块选项的时钟服务
struct ClockService {
    base: InstanceBase,
    level: LogLevel,
}

impl Instance for ClockService {
    fn base(&self) -> &InstanceBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InstanceBase {
        &mut self.base
    }
}

impl Service for ClockService {}

impl Injectable for ClockService {
    fn construct(ctx: &InstanceContext<'_>) -> Result<Self, DependencyError> {
        Ok(Self {
            base: InstanceBase::new(),
            level: ctx.module()?.options().log,
        })
    }
}

fn login_component() -> ComponentDescriptor {
    ComponentDescriptor::of::<LoginComponent>()
        .with_service::<SessionService>()
        .with_service::<ApplicationEventService>()
}

#[test]
fn test_child_module_factories_are_shared() {
    let child = ModuleFactory::new(
        ModuleDefinition::new().with_service(ServiceDescriptor::of::<SessionService>()),
        Vec::new(),
    )
    .unwrap();
    let parent = ModuleFactory::new(
        ModuleDefinition::new()
            .with_module(child.clone())
            .with_component(login_component()),
        Vec::new(),
    )
    .unwrap();

    let from_child = child.get_factory("SessionService").unwrap().unwrap();
    let from_parent = parent.get_factory("SessionService").unwrap().unwrap();
    assert!(from_child.same_factory(&from_parent));

    from_parent.create(None).unwrap();
    assert_eq!(from_child.len(), 1);

    // 实例回调的是创建工厂时所在的子模块
    let session = child.get_of::<SessionService>(None).unwrap().unwrap();
    let owner = session.module.upgrade().unwrap();
    assert!(owner.component_registry().is_empty());

    // 内置服务由父模块重新加载，不与子模块共享
    let child_events = child.get_factory("ApplicationEventService").unwrap().unwrap();
    let parent_events = parent.get_factory("ApplicationEventService").unwrap().unwrap();
    assert!(!child_events.same_factory(&parent_events));
}

#[test]
fn test_merged_child_outlives_its_last_outside_reference() {
    let parent = {
        let child = ModuleFactory::with_options(
            ModuleDefinition::new().with_service(ServiceDescriptor::of::<ClockService>()),
            ModuleOptions::default().with_log(LogLevel::Verbose),
            Vec::new(),
        )
        .unwrap();
        ModuleFactory::new(ModuleDefinition::new().with_module(child), Vec::new()).unwrap()
    };
    assert_eq!(parent.module_count(), 1);

    let clock = parent
        .get_factory("ClockService")
        .unwrap()
        .unwrap()
        .create(None)
        .unwrap()
        .unwrap()
        .downcast::<ClockService>()
        .unwrap();

    // 构造上下文仍指向子模块，读到的是子模块的选项
    assert_eq!(clock.level, LogLevel::Verbose);
    assert_eq!(parent.options().log, LogLevel::Info);
}

#[test]
fn test_root_component_mounts_through_builder() {
    let mounted = Arc::new(Mutex::new(Vec::<ApplicationEvent>::new()));

    let module = ModuleBuilder::new()
        .log_level(LogLevel::Verbose)
        .service(ServiceDescriptor::of::<SessionService>())
        .component(login_component())
        .build()
        .unwrap();

    let events = module
        .get_factory_of::<ApplicationEventService>()
        .unwrap()
        .unwrap()
        .create(None)
        .unwrap()
        .unwrap()
        .downcast::<ApplicationEventService>()
        .unwrap();
    let sink = Arc::clone(&mounted);
    let _listener = events.create_listener(
        "mounted",
        move |event| sink.lock().push(event.clone()),
        ListenerOptions::default(),
    );

    let login = module.get_factory_of::<LoginComponent>().unwrap().unwrap();
    let root = login.as_component().unwrap().create_root(None).unwrap().unwrap();

    assert!(root.is_root());
    assert_eq!(mounted.lock().len(), 1);
    assert_eq!(mounted.lock()[0].data, Some(json!("LoginComponent")));

    let login = module.get_of::<LoginComponent>(None).unwrap().unwrap();
    assert_eq!(login.session.id(), Some(InstanceId::FIRST));
    assert!(Arc::ptr_eq(&login.events, &events));
}

#[test]
fn test_root_mounted_during_build_sees_current_event_value() {
    let module = ModuleBuilder::new()
        .service(ServiceDescriptor::of::<SessionService>())
        .component(login_component())
        .root_component::<LoginComponent>()
        .build()
        .unwrap();

    let events = module.get_of::<ApplicationEventService>(None).unwrap().unwrap();
    let current = events.current_value("mounted").unwrap();
    assert_eq!(current.data, Some(json!("LoginComponent")));

    let received = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&received);
    let _listener = events.create_listener(
        "mounted",
        move |_| *counter.lock() += 1,
        ListenerOptions {
            current_value: true,
        },
    );
    assert_eq!(*received.lock(), 1);
}

#[test]
fn test_missing_prerequisite_fails_creation() {
    let module = ModuleFactory::new(
        ModuleDefinition::new().with_component(ComponentDescriptor::of::<LoginComponent>()),
        Vec::new(),
    )
    .unwrap();

    let login = module.get_factory_of::<LoginComponent>().unwrap().unwrap();
    let result = login.create(None);
    assert!(matches!(
        result,
        Err(DependencyError::PrerequisiteNotDeclared { ref prerequisite, .. })
            if prerequisite == "SessionService"
    ));
    assert!(login.is_empty());
}

#[test]
fn test_same_name_in_two_modules_is_independent() {
    let build = || {
        ModuleBuilder::new()
            .service(ServiceDescriptor::of::<SessionService>())
            .build()
            .unwrap()
    };
    let first = build();
    let second = build();

    let first_sessions = first.get_factory("SessionService").unwrap().unwrap();
    let second_sessions = second.get_factory("SessionService").unwrap().unwrap();
    first_sessions.create(None).unwrap();
    second_sessions.create(None).unwrap();
    second_sessions.create(None).unwrap();

    first_sessions.destroy_all();
    assert!(first_sessions.is_empty());
    assert_eq!(
        second_sessions.live_ids(),
        vec![InstanceId::new(1), InstanceId::new(2)]
    );
}
