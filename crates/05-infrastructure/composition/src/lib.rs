//! # 基础设施组合层
//!
//! 把模块定义、内置服务替换、模块选项和日志初始化组合成一个可运行的模块。
//!
//! ## 主要功能
//!
//! - **模块构建器**: 使用构建者模式组装 [`di_impl::ModuleFactory`]
//! - **配置源管理**: 从配置文件和环境变量读取 [`infrastructure_common::ModuleOptions`]
//! - **日志初始化**: 按开发或生产预设初始化 tracing 订阅者
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{LoggingConfig, ModuleBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let module = ModuleBuilder::new()
//!         .options_from_env("VIVI")?
//!         .with_logging(LoggingConfig::development())
//!         .build()?;
//!
//!     println!("已注册服务: {:?}", module.service_registry());
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod config_sources;


// 重新导出主要类型
pub use builder::{LoggingConfig, ModuleBuilder};
pub use config_sources::{OptionsSource, OptionsSources};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
