//! 模块选项的配置源
//!
//! 通过 `config` crate 合并配置文件和环境变量，后添加的配置源优先。

use infrastructure_common::{ConfigError, ModuleOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// 配置源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsSource {
    /// 配置文件，格式由扩展名决定（toml / json / yaml）
    File(PathBuf),
    /// 环境变量前缀
    Environment(String),
}

/// 模块选项的配置源列表
#[derive(Debug, Clone, Default)]
pub struct OptionsSources {
    sources: Vec<OptionsSource>,
}

impl OptionsSources {
    /// 创建空的配置源列表
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加配置文件，文件不存在时返回错误
    pub fn add_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        debug!("添加配置文件: {}", path.display());
        self.sources.push(OptionsSource::File(path.to_path_buf()));
        Ok(self)
    }

    /// 添加环境变量配置源
    ///
    /// 变量名为前缀加 `_` 加字段名，嵌套字段用 `__` 分隔。
    pub fn add_env(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        debug!("添加环境变量配置源，前缀: {}", prefix);
        self.sources.push(OptionsSource::Environment(prefix));
        self
    }

    /// 已添加的配置源
    pub fn sources(&self) -> &[OptionsSource] {
        &self.sources
    }

    /// 合并所有配置源并读取模块选项，缺少的字段使用默认值
    pub fn load(&self) -> Result<ModuleOptions, ConfigError> {
        let mut builder = config::Config::builder();
        for source in &self.sources {
            builder = match source {
                OptionsSource::File(path) => builder.add_source(config::File::from(path.as_path())),
                OptionsSource::Environment(prefix) => builder.add_source(
                    config::Environment::with_prefix(prefix)
                        .prefix_separator("_")
                        .separator("__"),
                ),
            };
        }

        let settings = builder.build().map_err(|e| {
            error!("配置构建失败: {}", e);
            ConfigError::ParseError {
                source: Box::new(e),
            }
        })?;

        let options: ModuleOptions = settings.try_deserialize().map_err(|e| {
            error!("模块选项绑定失败: {}", e);
            ConfigError::ParseError {
                source: Box::new(e),
            }
        })?;

        debug!("模块选项: {:?}", options);
        Ok(options)
    }
}
