//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义实例工厂和模块注册表的核心接口。
//!
//! ## 核心接口
//!
//! - [`Factory`] - 单一类型的实例注册表（创建、获取、销毁）
//! - [`RootFactory`] - 支持挂载根组件的组件工厂
//! - [`FactoryHandle`] - 带种类标签的工厂引用
//! - [`ModuleRegistry`] - 名称到工厂的模块注册表
//! - [`InstanceContext`] - 实例构造时拿到的上下文

pub mod container;
pub mod factory;
pub mod registry;
pub mod resolver;

pub use container::*;
pub use factory::*;
pub use registry::*;
pub use resolver::*;
