//! 元数据定义
//!
//! 提供类型和实例的标识信息

use std::any::TypeId;
use std::fmt;

/// 实例创建时传入的数据，对工厂来说是不透明的
pub type InstanceData = serde_json::Value;

/// 类型信息
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// 类型名称（不包含模块路径）
    pub name: String,
    /// 类型ID，只按名称声明的类型没有
    pub id: Option<TypeId>,
    /// 完整类型路径
    pub module_path: String,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        let full = std::any::type_name::<T>();
        Self {
            name: short_type_name(full).to_string(),
            id: Some(TypeId::of::<T>()),
            module_path: full.to_string(),
        }
    }

    /// 从类型名称创建类型信息
    pub fn from_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: None,
            module_path: name.to_string(),
        }
    }

    /// 是否为指定类型
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == Some(TypeId::of::<T>())
    }
}

/// 去掉模块路径和泛型参数
fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// 实例ID
///
/// 由所属工厂的创建计数器分配，从 1 开始，销毁后不会复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    /// 第一个实例的ID
    pub const FIRST: Self = Self(1);

    /// 创建新的实例ID
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// 数值形式
    pub fn value(self) -> u64 {
        self.0
    }

    /// 下一个ID
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// 字符串形式的键
    pub fn key(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for InstanceId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl From<u64> for InstanceId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
