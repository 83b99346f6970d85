//! 模块启动示例
//!
//! 演示如何声明服务和组件、挂载根组件并通过事件服务通信

use di_abstractions::{
    ComponentDescriptor, InstanceContext, Injectable, ServiceDescriptor,
};
use di_impl::{ApplicationEventService, ListenerOptions};
use infrastructure_common::{
    Component, DependencyError, Instance, InstanceBase, LifecycleError, LogLevel, Service,
};
use infrastructure_composition::{LoggingConfig, ModuleBuilder};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

// 示例：计数服务
#[derive(Default)]
pub struct CounterService {
    base: InstanceBase,
    value: Mutex<u64>,
}

impl CounterService {
    pub fn increment(&self) -> u64 {
        let mut value = self.value.lock();
        *value += 1;
        *value
    }
}

impl Instance for CounterService {
    fn base(&self) -> &InstanceBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InstanceBase {
        &mut self.base
    }
}

impl Service for CounterService {}

impl Injectable for CounterService {
    fn construct(_ctx: &InstanceContext<'_>) -> Result<Self, DependencyError> {
        Ok(Self::default())
    }
}

// 示例：应用根组件
pub struct AppComponent {
    base: InstanceBase,
    counter: Arc<CounterService>,
    events: Arc<ApplicationEventService>,
}

impl Instance for AppComponent {
    fn base(&self) -> &InstanceBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InstanceBase {
        &mut self.base
    }
}

impl Component for AppComponent {
    fn append(&self) -> Result<(), LifecycleError> {
        println!("AppComponent 已挂载");
        let count = self.counter.increment();
        self.events.send_event("started", Some(json!({ "count": count })), false);
        Ok(())
    }
}

impl Injectable for AppComponent {
    fn construct(ctx: &InstanceContext<'_>) -> Result<Self, DependencyError> {
        Ok(Self {
            base: InstanceBase::new(),
            counter: ctx.service::<CounterService>()?,
            events: ctx.service::<ApplicationEventService>()?,
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let module = ModuleBuilder::new()
        .with_logging(LoggingConfig::development())
        .log_level(LogLevel::Verbose)
        .service(ServiceDescriptor::of::<CounterService>())
        .component(
            ComponentDescriptor::of::<AppComponent>()
                .with_service::<CounterService>()
                .with_service::<ApplicationEventService>(),
        )
        .root_component::<AppComponent>()
        .build()?;

    println!("服务: {:?}", module.service_registry());
    println!("组件: {:?}", module.get_component_registry());

    if let Some(events) = module.get_of::<ApplicationEventService>(None)? {
        let listener = events.create_listener(
            "started",
            |event| println!("收到事件 {}: {:?}", event.name, event.data),
            ListenerOptions {
                current_value: true,
            },
        );
        listener.close();
    }

    if let Some(app) = module.get_factory_of::<AppComponent>()? {
        app.destroy_all();
        println!("剩余组件实例: {}", app.len());
    }

    Ok(())
}
