//! # Infrastructure Common
//!
//! 这个 crate 提供了 Vivi 模块运行时的公共 traits 和值类型。
//!
//! ## 核心组件
//!
//! - [`Instance`] - 由工厂创建和销毁的实例基础 trait
//! - [`Service`] / [`Component`] - 两种实例种类
//! - [`NamingConventions`] - 基于名称后缀的种类约定
//! - [`LogSink`] - 非致命错误的日志汇报接口
//! - [`ModuleOptions`] - 模块级配置
//!
//! ## 设计原则
//!
//! - 显式传递上下文，不存在全局注册表
//! - 种类标签在注册时计算一次
//! - 约定优于配置

pub mod component;
pub mod configuration;
pub mod conventions;
pub mod errors;
pub mod lifecycle;
pub mod logging;
pub mod metadata;

pub use component::*;
pub use configuration::*;
pub use conventions::*;
pub use errors::*;
pub use lifecycle::*;
pub use logging::*;
pub use metadata::*;
