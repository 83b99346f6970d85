//! 模块构建器

use crate::config_sources::OptionsSources;
use di_abstractions::{
    ComponentDescriptor, ModuleDefinition, ModuleRegistry, ServiceDescriptor, ServiceOverride,
};
use di_impl::ModuleFactory;
use infrastructure_common::{Component, InfrastructureError, LogLevel, ModuleOptions};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// 模块构建器
///
/// 使用建造者模式收集描述符、替换和选项，最后构建 [`ModuleFactory`]。
pub struct ModuleBuilder {
    /// 模块定义
    definition: ModuleDefinition,
    /// 内置服务替换
    overrides: Vec<ServiceOverride>,
    /// 模块选项
    options: ModuleOptions,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl ModuleBuilder {
    /// 创建新的模块构建器
    pub fn new() -> Self {
        Self {
            definition: ModuleDefinition::new(),
            overrides: Vec::new(),
            options: ModuleOptions::default(),
            logging_enabled: false, // 默认不启用日志初始化
            logging_config: LoggingConfig::default(),
        }
    }

    /// 添加服务，需要按依赖顺序添加
    pub fn service(mut self, descriptor: ServiceDescriptor) -> Self {
        debug!("添加服务: {}", descriptor.registry_name());
        self.definition = self.definition.with_service(descriptor);
        self
    }

    /// 添加组件
    pub fn component(mut self, descriptor: ComponentDescriptor) -> Self {
        debug!("添加组件: {}", descriptor.registry_name());
        self.definition = self.definition.with_component(descriptor);
        self
    }

    /// 设置根组件
    pub fn root_component<T: Component>(mut self) -> Self {
        self.definition = self.definition.with_root::<T>();
        self
    }

    /// 按名称设置根组件
    pub fn root_component_name(mut self, name: impl Into<String>) -> Self {
        self.definition = self.definition.with_root_name(name);
        self
    }

    /// 合并子模块
    pub fn module(mut self, module: Arc<dyn ModuleRegistry>) -> Self {
        self.definition = self.definition.with_module(module);
        self
    }

    /// 替换内置服务
    pub fn override_service(mut self, override_: ServiceOverride) -> Self {
        info!("替换内置服务: {}", override_.key());
        self.overrides.push(override_);
        self
    }

    /// 设置模块选项
    pub fn options(mut self, options: ModuleOptions) -> Self {
        self.options = options;
        self
    }

    /// 设置模块日志级别
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.options = self.options.with_log(level);
        self
    }

    /// 从配置文件读取模块选项
    pub fn options_from_file<P: AsRef<Path>>(
        mut self,
        path: P,
    ) -> Result<Self, InfrastructureError> {
        info!("读取模块选项: {}", path.as_ref().display());
        self.options = OptionsSources::new().add_file(path)?.load()?;
        Ok(self)
    }

    /// 从环境变量读取模块选项，例如前缀 `VIVI` 对应 `VIVI_LOG`
    pub fn options_from_env(mut self, prefix: &str) -> Result<Self, InfrastructureError> {
        info!("读取环境变量模块选项，前缀: {}", prefix);
        self.options = OptionsSources::new().add_env(prefix).load()?;
        Ok(self)
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true; // 启用日志初始化
        self
    }

    /// 构建模块
    pub fn build(self) -> Result<Arc<ModuleFactory>, InfrastructureError> {
        // 只有在明确配置了日志时才初始化日志
        if self.logging_enabled {
            self.logging_config.init()?;
        }

        info!("开始构建模块");
        let module = ModuleFactory::with_options(self.definition, self.options, self.overrides)?;
        info!("模块构建完成");
        Ok(module)
    }
}

impl Default for ModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 与模块日志级别对应的配置
    ///
    /// `none` 仍然保留 tracing 的错误输出，模块级过滤由日志服务完成。
    pub fn for_level(level: LogLevel) -> Self {
        let level = match level {
            LogLevel::None | LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Verbose => tracing::Level::DEBUG,
        };
        Self {
            level,
            ..Self::default()
        }
    }

    /// 初始化全局 tracing 订阅者
    ///
    /// 已经初始化过时返回错误。
    pub fn init(&self) -> Result<(), InfrastructureError> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(self.level)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}
