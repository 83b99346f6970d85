//! 日志汇报接口
//!
//! 核心在遇到可恢复的错误时只会通过 [`LogSink`] 汇报，从不检查返回值。

use std::fmt;

/// 汇报级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// 日志上下文字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogField {
    pub key: String,
    pub value: String,
}

impl LogField {
    /// 创建新的上下文字段
    pub fn new(key: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            key: key.into(),
            value: value.to_string(),
        }
    }

    /// 把字段列表格式化为 `key=value` 形式
    pub fn join(fields: &[LogField]) -> String {
        fields
            .iter()
            .map(|field| format!("{}={}", field.key, field.value))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// 日志汇报接口
pub trait LogSink: Send + Sync {
    /// 错误
    fn error(&self, message: &str, context: &[LogField]);

    /// 警告
    fn warn(&self, message: &str, context: &[LogField]);

    /// 一般信息
    fn info(&self, message: &str, context: &[LogField]);

    /// 调试信息
    fn debug(&self, message: &str, context: &[LogField]);

    /// 按级别分发
    fn log(&self, severity: Severity, message: &str, context: &[LogField]) {
        match severity {
            Severity::Error => self.error(message, context),
            Severity::Warn => self.warn(message, context),
            Severity::Info => self.info(message, context),
            Severity::Debug => self.debug(message, context),
        }
    }
}

/// 直接写入 tracing 的汇报
///
/// 在日志服务不可用时使用。
pub fn emit_to_tracing(severity: Severity, message: &str, context: &[LogField]) {
    let context = LogField::join(context);
    match severity {
        Severity::Error => tracing::error!(context = %context, "{}", message),
        Severity::Warn => tracing::warn!(context = %context, "{}", message),
        Severity::Info => tracing::info!(context = %context, "{}", message),
        Severity::Debug => tracing::debug!(context = %context, "{}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_fields() {
        let fields = vec![LogField::new("factory", "MenuComponent"), LogField::new("id", 3)];
        assert_eq!(LogField::join(&fields), "factory=MenuComponent id=3");
        assert_eq!(LogField::join(&[]), "");
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Error > Severity::Warn);
        assert!(Severity::Info > Severity::Debug);
    }
}
