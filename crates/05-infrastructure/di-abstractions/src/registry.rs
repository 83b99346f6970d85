//! 模块注册表抽象接口与类型描述符

use crate::factory::{constructor, Constructor, FactoryHandle};
use crate::resolver::{InstanceContext, Injectable};
use infrastructure_common::{
    Component, DependencyError, LogField, ModuleOptions, Service, Severity, TypeInfo,
};
use std::fmt;

/// 模块注册表 trait
///
/// 名称到工厂的映射，每个名称唯一。工厂和实例通过它回调注册表，
/// 而不是通过任何全局引用。
pub trait ModuleRegistry: Send + Sync {
    /// 按名称查找工厂
    ///
    /// 名称无法分类时返回错误；日志服务缺失时返回错误；其他缺失只汇报并返回 `None`。
    fn factory(&self, name: &str) -> Result<Option<FactoryHandle>, DependencyError>;

    /// 所有工厂，按注册顺序
    fn factories(&self) -> Vec<(String, FactoryHandle)>;

    /// 已注册的组件名称，按注册顺序
    fn component_registry(&self) -> Vec<String>;

    /// 模块选项
    fn options(&self) -> &ModuleOptions;

    /// 通过日志服务汇报
    fn report(&self, severity: Severity, message: &str, context: &[LogField]);
}

/// 类型描述符
///
/// 构造函数加上有序的前置依赖名称。注册表构建完成后不再使用。
pub struct Descriptor<I: ?Sized> {
    type_info: TypeInfo,
    key: Option<String>,
    constructor: Option<Constructor<I>>,
    prerequisites: Vec<String>,
}

/// 服务描述符
pub type ServiceDescriptor = Descriptor<dyn Service>;

/// 组件描述符
pub type ComponentDescriptor = Descriptor<dyn Component>;

impl<I: ?Sized> Descriptor<I> {
    /// 使用现成的构造函数创建描述符
    pub fn with_constructor(type_info: TypeInfo, constructor: Constructor<I>) -> Self {
        Self {
            type_info,
            key: None,
            constructor: Some(constructor),
            prerequisites: Vec::new(),
        }
    }

    /// 只声明名称、没有构造函数的描述符
    ///
    /// 对应的工厂处于惰性状态。
    pub fn declared(name: &str) -> Self {
        Self {
            type_info: TypeInfo::from_name(name),
            key: None,
            constructor: None,
            prerequisites: Vec::new(),
        }
    }

    /// 构造的类型
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// 注册名称，默认为类型名称
    pub fn registry_name(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.type_info.name)
    }

    /// 以其他名称注册
    pub fn registered_as(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// 构造函数
    pub fn constructor(&self) -> Option<&Constructor<I>> {
        self.constructor.as_ref()
    }

    /// 前置依赖名称
    pub fn prerequisites(&self) -> &[String] {
        &self.prerequisites
    }

    /// 添加前置依赖类型
    pub fn with_prerequisite<T: ?Sized + 'static>(self) -> Self {
        let name = TypeInfo::of::<T>().name;
        self.with_prerequisite_name(name)
    }

    /// 按名称添加前置依赖
    pub fn with_prerequisite_name(mut self, name: impl Into<String>) -> Self {
        self.prerequisites.push(name.into());
        self
    }
}

impl Descriptor<dyn Service> {
    /// 从可注入类型创建服务描述符
    pub fn of<T: Service + Injectable>() -> Self {
        Self::from_fn(T::construct)
    }

    /// 从构造闭包创建服务描述符
    pub fn from_fn<T, F>(f: F) -> Self
    where
        T: Service,
        F: Fn(&InstanceContext<'_>) -> Result<T, DependencyError> + Send + Sync + 'static,
    {
        let build = constructor(move |ctx: &InstanceContext<'_>| {
            f(ctx).map(|service| Box::new(service) as Box<dyn Service>)
        });
        Self::with_constructor(TypeInfo::of::<T>(), build)
    }
}

impl Descriptor<dyn Component> {
    /// 从可注入类型创建组件描述符
    pub fn of<T: Component + Injectable>() -> Self {
        Self::from_fn(T::construct)
    }

    /// 从构造闭包创建组件描述符
    pub fn from_fn<T, F>(f: F) -> Self
    where
        T: Component,
        F: Fn(&InstanceContext<'_>) -> Result<T, DependencyError> + Send + Sync + 'static,
    {
        let build = constructor(move |ctx: &InstanceContext<'_>| {
            f(ctx).map(|component| Box::new(component) as Box<dyn Component>)
        });
        Self::with_constructor(TypeInfo::of::<T>(), build)
    }

    /// 添加依赖的服务，与前置依赖等价
    pub fn with_service<T: Service>(self) -> Self {
        self.with_prerequisite::<T>()
    }
}

impl<I: ?Sized> Clone for Descriptor<I> {
    fn clone(&self) -> Self {
        Self {
            type_info: self.type_info.clone(),
            key: self.key.clone(),
            constructor: self.constructor.clone(),
            prerequisites: self.prerequisites.clone(),
        }
    }
}

impl<I: ?Sized> fmt::Debug for Descriptor<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("type_info", &self.type_info)
            .field("key", &self.key)
            .field("constructor", &self.constructor.as_ref().map(|_| "<function>"))
            .field("prerequisites", &self.prerequisites)
            .finish()
    }
}

/// 内置服务的替换
///
/// 替换后的实现以内置服务的名称注册，依赖方的查找键不变。
#[derive(Debug, Clone)]
pub struct ServiceOverride {
    key: String,
    descriptor: ServiceDescriptor,
}

impl ServiceOverride {
    /// 按名称替换
    pub fn keyed(key: impl Into<String>, descriptor: ServiceDescriptor) -> Self {
        Self {
            key: key.into(),
            descriptor,
        }
    }

    /// 替换指定的内置服务类型
    pub fn replacing<B: Service>(descriptor: ServiceDescriptor) -> Self {
        Self::keyed(TypeInfo::of::<B>().name, descriptor)
    }

    /// 被替换的服务名称
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 以被替换服务的名称注册的描述符
    pub fn into_descriptor(self) -> ServiceDescriptor {
        self.descriptor.registered_as(self.key)
    }
}
