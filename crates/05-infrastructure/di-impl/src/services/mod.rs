//! 内置服务
//!
//! 每个模块都会加载的服务目录，可以通过 [`di_abstractions::ServiceOverride`] 替换。

mod application_event;
mod logger;

pub use application_event::{
    ApplicationEvent, ApplicationEventService, ApplicationListener, ListenerOptions,
};
pub use logger::LoggerService;

use di_abstractions::ServiceDescriptor;

/// 日志服务的注册名称
pub const LOGGER_SERVICE: &str = "LoggerService";

/// 应用事件服务的注册名称
pub const APPLICATION_EVENT_SERVICE: &str = "ApplicationEventService";

/// 内置服务描述符，按加载顺序
pub fn baseline_services() -> Vec<ServiceDescriptor> {
    vec![
        ServiceDescriptor::of::<LoggerService>(),
        ServiceDescriptor::of::<ApplicationEventService>(),
    ]
}
