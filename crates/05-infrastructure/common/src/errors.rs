//! 错误类型定义

use crate::conventions::InstanceKind;
use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置值无效: {key}, 值: {value}")]
    InvalidValue { key: String, value: String },
}

/// 依赖注入错误类型
///
/// 这里的每个变体都是致命错误，可恢复的情况只会写入日志。
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("缺少 ModuleFactory 上下文，工厂无法初始化")]
    MissingModuleContext,

    #[error("无法解析类型种类: {type_name}（名称必须以 Service 或 Component 结尾）")]
    UnresolvableKind { type_name: String },

    #[error("类型种类不匹配: {type_name}, 期望 {expected}, 实际 {actual}")]
    KindMismatch {
        type_name: String,
        expected: InstanceKind,
        actual: InstanceKind,
    },

    #[error("未找到日志服务的工厂: {type_name}")]
    LoggerUnavailable { type_name: String },

    #[error("组件未注册: {type_name}")]
    ComponentNotRegistered { type_name: String },

    #[error("前置依赖未声明: {type_name} 没有声明 {prerequisite}")]
    PrerequisiteNotDeclared {
        type_name: String,
        prerequisite: String,
    },

    #[error("实例创建失败: {type_name}, 原因: {message}")]
    InstanceCreationFailed { type_name: String, message: String },

    #[error("类型转换失败: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("根组件挂载失败: {type_name}, 原因: {message}")]
    RootMountFailed { type_name: String, message: String },
}

impl DependencyError {
    /// 创建实例创建失败错误
    pub fn creation_failed(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InstanceCreationFailed {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// 返回错误所涉及的类型名称
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::MissingModuleContext => None,
            Self::UnresolvableKind { type_name }
            | Self::KindMismatch { type_name, .. }
            | Self::LoggerUnavailable { type_name }
            | Self::ComponentNotRegistered { type_name }
            | Self::PrerequisiteNotDeclared { type_name, .. }
            | Self::InstanceCreationFailed { type_name, .. }
            | Self::DowncastFailed { type_name }
            | Self::RootMountFailed { type_name, .. } => Some(type_name),
        }
    }
}

/// 实例生命周期错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("实例清理失败: {message}")]
    CleanupFailed { message: String },

    #[error("组件挂载失败: {message}")]
    MountFailed { message: String },
}

impl LifecycleError {
    /// 创建清理失败错误
    pub fn cleanup(message: impl Into<String>) -> Self {
        Self::CleanupFailed {
            message: message.into(),
        }
    }

    /// 创建挂载失败错误
    pub fn mount(message: impl Into<String>) -> Self {
        Self::MountFailed {
            message: message.into(),
        }
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("生命周期错误: {source}")]
    LifecycleError {
        #[from]
        source: LifecycleError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type LifecycleResult<T> = Result<T, LifecycleError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
