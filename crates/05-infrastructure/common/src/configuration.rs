//! 模块配置

use crate::errors::ConfigError;
use crate::logging::Severity;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 模块日志级别
///
/// - `none` - 不输出日志
/// - `error` - 只输出错误
/// - `warn` - 输出错误和警告
/// - `info` - 输出错误、警告和其他信息
/// - `verbose` - 全部级别，包括调试信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    None,
    Error,
    Warn,
    #[default]
    Info,
    Verbose,
}

impl LogLevel {
    /// 该级别是否允许输出指定的汇报
    pub fn allows(self, severity: Severity) -> bool {
        match self {
            Self::None => false,
            Self::Error => severity >= Severity::Error,
            Self::Warn => severity >= Severity::Warn,
            Self::Info => severity >= Severity::Info,
            Self::Verbose => true,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "verbose" => Ok(Self::Verbose),
            _ => Err(ConfigError::InvalidValue {
                key: "log".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// 模块选项
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleOptions {
    /// 日志级别
    pub log: LogLevel,
}

impl ModuleOptions {
    /// 设置日志级别
    pub fn with_log(mut self, log: LogLevel) -> Self {
        self.log = log;
        self
    }
}
