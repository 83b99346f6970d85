//! 约定规范定义
//!
//! 类型种类由名称后缀决定：`...Service` 为服务，`...Component` 为组件。
//! 这个约定只在注册时用来计算种类标签，查找时不会反复解析。

use crate::errors::DependencyError;
use std::fmt;

/// 服务名称后缀
pub const SERVICE_SUFFIX: &str = "Service";

/// 组件名称后缀
pub const COMPONENT_SUFFIX: &str = "Component";

/// 实例种类标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceKind {
    /// 服务，只能依赖其他服务
    Service,
    /// 组件，可以依赖服务和先注册的组件，支持挂载为根组件
    Component,
}

impl InstanceKind {
    /// 该种类对应的名称后缀
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Service => SERVICE_SUFFIX,
            Self::Component => COMPONENT_SUFFIX,
        }
    }
}

impl fmt::Display for InstanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// 约定规则
#[derive(Debug, Clone)]
pub struct ConventionRule {
    /// 名称模式
    pub pattern: String,
    /// 匹配后得到的种类
    pub kind: InstanceKind,
}

impl ConventionRule {
    /// 创建新的约定规则
    pub fn new(pattern: impl Into<String>, kind: InstanceKind) -> Self {
        Self {
            pattern: pattern.into(),
            kind,
        }
    }

    /// 检查名称是否匹配此规则
    pub fn matches(&self, name: &str) -> bool {
        if self.pattern.contains('*') {
            // 简单的通配符匹配
            let pattern_parts: Vec<&str> = self.pattern.split('*').collect();

            if pattern_parts.len() == 2 {
                let prefix = pattern_parts[0];
                let suffix = pattern_parts[1];

                name.len() > suffix.len() && name.starts_with(prefix) && name.ends_with(suffix)
            } else {
                false
            }
        } else {
            name == self.pattern
        }
    }
}

/// 命名约定规范
#[derive(Debug)]
pub struct NamingConventions {
    rules: Vec<ConventionRule>,
}

impl NamingConventions {
    /// 创建带默认规则的命名约定
    pub fn new() -> Self {
        Self {
            rules: vec![
                ConventionRule::new(format!("*{SERVICE_SUFFIX}"), InstanceKind::Service),
                ConventionRule::new(format!("*{COMPONENT_SUFFIX}"), InstanceKind::Component),
            ],
        }
    }

    /// 获取所有约定规则
    pub fn rules(&self) -> &[ConventionRule] {
        &self.rules
    }

    /// 根据名称查找种类
    pub fn find_kind(&self, name: &str) -> Option<InstanceKind> {
        self.rules
            .iter()
            .find(|rule| rule.matches(name))
            .map(|rule| rule.kind)
    }

    /// 按默认约定对名称分类
    ///
    /// 两个后缀都不匹配时返回 [`DependencyError::UnresolvableKind`]。
    pub fn classify(name: &str) -> Result<InstanceKind, DependencyError> {
        Self::new()
            .find_kind(name)
            .ok_or_else(|| DependencyError::UnresolvableKind {
                type_name: name.to_string(),
            })
    }

    /// 分类并校验名称与声明的种类一致
    pub fn ensure_kind(name: &str, expected: InstanceKind) -> Result<InstanceKind, DependencyError> {
        let actual = Self::classify(name)?;
        if actual != expected {
            return Err(DependencyError::KindMismatch {
                type_name: name.to_string(),
                expected,
                actual,
            });
        }
        Ok(actual)
    }
}

impl Default for NamingConventions {
    fn default() -> Self {
        Self::new()
    }
}
