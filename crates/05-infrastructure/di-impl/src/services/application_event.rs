//! 应用事件服务
//!
//! 按名称分组的同步事件总线。每个事件名称保留最近一次发送的数据，
//! 新的监听器可以选择立即收到这个当前值。

use dashmap::DashMap;
use di_abstractions::{InstanceContext, Injectable, ModuleRegistry};
use indexmap::IndexMap;
use infrastructure_common::{
    DependencyError, Instance, InstanceBase, InstanceData, LifecycleError, LogField, Service,
    Severity,
};
use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// 事件回调
type Callback = Arc<dyn Fn(&ApplicationEvent) + Send + Sync>;

/// 事件注册表
type EventRegistry = DashMap<String, EventChannel>;

/// 一次发送的事件
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationEvent {
    /// 事件名称
    pub name: String,
    /// 事件数据
    pub data: Option<InstanceData>,
    /// 投递后是否关闭当前的监听器
    pub close_on_complete: bool,
}

/// 监听选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// 创建时立即收到该事件的当前值
    pub current_value: bool,
}

#[derive(Default)]
struct EventChannel {
    current: Option<ApplicationEvent>,
    listeners: IndexMap<Uuid, Callback>,
}

/// 应用事件服务
pub struct ApplicationEventService {
    base: InstanceBase,
    registry: Arc<EventRegistry>,
    module: Weak<dyn ModuleRegistry>,
}

impl ApplicationEventService {
    /// 发送事件
    ///
    /// 回调在锁外同步执行，可以在回调中继续发送事件或创建监听器。
    /// `close_after` 为真时，收到这次事件的监听器随后全部关闭。
    pub fn send_event(&self, name: &str, data: Option<InstanceData>, close_after: bool) {
        let event = ApplicationEvent {
            name: name.to_string(),
            data,
            close_on_complete: close_after,
        };

        let listeners: Vec<(Uuid, Callback)> = {
            let mut channel = self.registry.entry(name.to_string()).or_default();
            channel.current = Some(event.clone());
            channel
                .listeners
                .iter()
                .map(|(id, callback)| (*id, Arc::clone(callback)))
                .collect()
        };

        self.report(
            Severity::Debug,
            &format!("发送事件 {}，监听器 {} 个", name, listeners.len()),
        );

        for (_, callback) in &listeners {
            callback(&event);
        }

        if close_after {
            if let Some(mut channel) = self.registry.get_mut(name) {
                for (id, _) in &listeners {
                    channel.listeners.shift_remove(id);
                }
            }
        }
    }

    /// 创建监听器
    pub fn create_listener<F>(
        &self,
        name: &str,
        callback: F,
        options: ListenerOptions,
    ) -> ApplicationListener
    where
        F: Fn(&ApplicationEvent) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        let callback: Callback = Arc::new(callback);

        let current = {
            let mut channel = self.registry.entry(name.to_string()).or_default();
            channel.listeners.insert(id, Arc::clone(&callback));
            channel.current.clone()
        };

        if options.current_value {
            if let Some(event) = current {
                callback(&event);
            }
        }

        ApplicationListener {
            id,
            event_name: name.to_string(),
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// 事件的当前值
    pub fn current_value(&self, name: &str) -> Option<ApplicationEvent> {
        self.registry
            .get(name)
            .and_then(|channel| channel.current.clone())
    }

    /// 事件的监听器数量
    pub fn listener_count(&self, name: &str) -> usize {
        self.registry
            .get(name)
            .map_or(0, |channel| channel.listeners.len())
    }

    fn report(&self, severity: Severity, message: &str) {
        if let Some(module) = self.module.upgrade() {
            let context = [LogField::new("service", "ApplicationEventService")];
            module.report(severity, message, &context);
        }
    }
}

impl Injectable for ApplicationEventService {
    fn construct(ctx: &InstanceContext<'_>) -> Result<Self, DependencyError> {
        Ok(Self {
            base: InstanceBase::new(),
            registry: Arc::new(DashMap::new()),
            module: ctx.module_ref(),
        })
    }
}

impl Instance for ApplicationEventService {
    fn base(&self) -> &InstanceBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InstanceBase {
        &mut self.base
    }

    fn destroy(&self) -> Result<(), LifecycleError> {
        self.registry.clear();
        Ok(())
    }
}

impl Service for ApplicationEventService {}

impl fmt::Debug for ApplicationEventService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationEventService")
            .field("id", &self.base.id())
            .field("events", &self.registry.len())
            .finish()
    }
}

/// 事件监听器
///
/// 调用 [`ApplicationListener::close`] 之前一直有效，丢弃句柄不会取消监听。
#[derive(Debug)]
pub struct ApplicationListener {
    id: Uuid,
    event_name: String,
    registry: Weak<EventRegistry>,
}

impl ApplicationListener {
    /// 监听器ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 监听的事件名称
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// 是否已关闭
    pub fn is_closed(&self) -> bool {
        self.registry.upgrade().map_or(true, |registry| {
            registry
                .get(&self.event_name)
                .map_or(true, |channel| !channel.listeners.contains_key(&self.id))
        })
    }

    /// 关闭监听器，重复调用无影响
    pub fn close(&self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Some(mut channel) = registry.get_mut(&self.event_name) {
                channel.listeners.shift_remove(&self.id);
            }
        }
    }
}
