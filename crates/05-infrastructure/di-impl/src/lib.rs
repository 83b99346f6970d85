//! # 依赖注入具体实现
//!
//! 提供类型工厂、模块工厂以及内置服务。
//!
//! ## 核心类型
//!
//! - [`TypedFactory`] - 单一类型的实例注册表，[`ServiceFactory`] / [`ComponentFactory`] 是它的两种特化
//! - [`ModuleFactory`] - 构建名称到工厂的映射，解析前置依赖并挂载根组件
//! - [`LoggerService`] / [`ApplicationEventService`] - 每个模块都会加载的内置服务
//!
//! ## 示例
//!
//! ```
//! use di_abstractions::ModuleDefinition;
//! use di_impl::{LoggerService, ModuleFactory};
//!
//! let module = ModuleFactory::new(ModuleDefinition::new(), Vec::new()).unwrap();
//! let factory = module.get_factory_of::<LoggerService>().unwrap().unwrap();
//! assert_eq!(factory.name(), "LoggerService");
//! ```

pub mod factory;
pub mod module_factory;
pub mod services;

pub use factory::{ComponentFactory, ServiceFactory, TypedFactory};
pub use module_factory::ModuleFactory;
pub use services::{
    baseline_services, ApplicationEvent, ApplicationEventService, ApplicationListener,
    ListenerOptions, LoggerService, APPLICATION_EVENT_SERVICE, LOGGER_SERVICE,
};
