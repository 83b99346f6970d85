//! 日志服务

use di_abstractions::{InstanceContext, Injectable};
use infrastructure_common::{
    emit_to_tracing, DependencyError, Instance, InstanceBase, LogField, LogLevel, LogSink,
    Service, Severity,
};

/// 日志服务
///
/// 模块的默认汇报出口，按模块选项中的日志级别过滤后写入 tracing。
#[derive(Debug, Default)]
pub struct LoggerService {
    base: InstanceBase,
    level: LogLevel,
}

impl LoggerService {
    /// 创建指定级别的日志服务
    pub fn new(level: LogLevel) -> Self {
        Self {
            base: InstanceBase::new(),
            level,
        }
    }

    /// 当前日志级别
    pub fn level(&self) -> LogLevel {
        self.level
    }

    fn emit(&self, severity: Severity, message: &str, context: &[LogField]) {
        if self.level.allows(severity) {
            emit_to_tracing(severity, message, context);
        }
    }
}

impl Injectable for LoggerService {
    fn construct(ctx: &InstanceContext<'_>) -> Result<Self, DependencyError> {
        let level = ctx.module()?.options().log;
        Ok(Self::new(level))
    }
}

impl Instance for LoggerService {
    fn base(&self) -> &InstanceBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InstanceBase {
        &mut self.base
    }
}

impl Service for LoggerService {
    fn log_sink(&self) -> Option<&dyn LogSink> {
        Some(self)
    }
}

impl LogSink for LoggerService {
    fn error(&self, message: &str, context: &[LogField]) {
        self.emit(Severity::Error, message, context);
    }

    fn warn(&self, message: &str, context: &[LogField]) {
        self.emit(Severity::Warn, message, context);
    }

    fn info(&self, message: &str, context: &[LogField]) {
        self.emit(Severity::Info, message, context);
    }

    fn debug(&self, message: &str, context: &[LogField]) {
        self.emit(Severity::Debug, message, context);
    }
}
