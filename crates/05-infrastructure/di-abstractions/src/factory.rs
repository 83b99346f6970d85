//! 实例工厂抽象接口
//!
//! 每个注册的类型名称对应一个工厂，工厂拥有它创建的全部存活实例。

use crate::resolver::InstanceContext;
use infrastructure_common::{
    AsAny, Component, DependencyError, Instance, InstanceData, InstanceId, InstanceKind, Service,
    TypeInfo,
};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 构造函数类型
///
/// 无论类型声明了多少依赖，都通过同一个签名调用。
pub type Constructor<I> =
    Arc<dyn Fn(&InstanceContext<'_>) -> Result<Box<I>, DependencyError> + Send + Sync>;

/// 把闭包包装成 [`Constructor`]
pub fn constructor<I, F>(f: F) -> Constructor<I>
where
    I: ?Sized + 'static,
    F: Fn(&InstanceContext<'_>) -> Result<Box<I>, DependencyError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// 实例工厂 trait
///
/// 单线程同步语义：创建、获取和销毁都在返回前完成。
pub trait Factory: Send + Sync {
    /// 工厂产出的实例类型
    type Target: ?Sized + Instance;

    /// 注册名称
    fn name(&self) -> &str;

    /// 实际构造的类型
    fn type_info(&self) -> &TypeInfo;

    /// 种类标签
    fn kind(&self) -> InstanceKind;

    /// 缺少构造函数时工厂处于惰性状态，不能创建实例
    fn is_inert(&self) -> bool;

    /// 已解析的前置依赖名称
    fn prerequisite_names(&self) -> Vec<String>;

    /// 创建新实例
    ///
    /// 惰性工厂汇报错误并返回 `Ok(None)`；构造函数本身失败时返回错误。
    fn create(&self, data: Option<InstanceData>)
        -> Result<Option<Arc<Self::Target>>, DependencyError>;

    /// 获取实例
    ///
    /// 指定ID时返回对应实例，不存在则汇报错误；未指定ID时返回最近创建的存活实例。
    fn get(&self, id: Option<InstanceId>) -> Option<Arc<Self::Target>>;

    /// 是否存在指定ID的存活实例
    fn contains(&self, id: InstanceId) -> bool;

    /// 销毁实例，未知ID只汇报警告
    fn destroy(&self, id: InstanceId);

    /// 销毁调用时存活的所有实例
    ///
    /// 清理钩子期间新建的实例不在本次销毁范围内。
    fn destroy_all(&self);

    /// 存活实例ID，按创建顺序
    fn live_ids(&self) -> Vec<InstanceId>;

    /// 存活实例数量
    fn len(&self) -> usize;

    /// 是否没有存活实例
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 组件工厂 trait
pub trait RootFactory: Factory<Target = dyn Component> {
    /// 创建根组件并调用它的 `append`
    ///
    /// 多次调用不会去重，调用方需要保证只挂载一次。
    fn create_root(
        &self,
        data: Option<InstanceData>,
    ) -> Result<Option<Arc<dyn Component>>, DependencyError>;
}

/// 服务工厂 trait 对象
pub type DynServiceFactory = dyn Factory<Target = dyn Service>;

/// 带种类标签的工厂引用
///
/// 合并子模块时复制的是这个引用，工厂本身共享。
#[derive(Clone)]
pub enum FactoryHandle {
    Service(Arc<DynServiceFactory>),
    Component(Arc<dyn RootFactory>),
}

impl FactoryHandle {
    /// 种类标签
    pub fn kind(&self) -> InstanceKind {
        match self {
            Self::Service(_) => InstanceKind::Service,
            Self::Component(_) => InstanceKind::Component,
        }
    }

    /// 注册名称
    pub fn name(&self) -> &str {
        match self {
            Self::Service(factory) => factory.name(),
            Self::Component(factory) => factory.name(),
        }
    }

    /// 实际构造的类型
    pub fn type_info(&self) -> &TypeInfo {
        match self {
            Self::Service(factory) => factory.type_info(),
            Self::Component(factory) => factory.type_info(),
        }
    }

    /// 创建新实例
    pub fn create(&self, data: Option<InstanceData>) -> Result<Option<InstanceRef>, DependencyError> {
        Ok(match self {
            Self::Service(factory) => factory.create(data)?.map(InstanceRef::Service),
            Self::Component(factory) => factory.create(data)?.map(InstanceRef::Component),
        })
    }

    /// 获取实例
    pub fn get(&self, id: Option<InstanceId>) -> Option<InstanceRef> {
        match self {
            Self::Service(factory) => factory.get(id).map(InstanceRef::Service),
            Self::Component(factory) => factory.get(id).map(InstanceRef::Component),
        }
    }

    /// 销毁实例
    pub fn destroy(&self, id: InstanceId) {
        match self {
            Self::Service(factory) => factory.destroy(id),
            Self::Component(factory) => factory.destroy(id),
        }
    }

    /// 销毁所有实例
    pub fn destroy_all(&self) {
        match self {
            Self::Service(factory) => factory.destroy_all(),
            Self::Component(factory) => factory.destroy_all(),
        }
    }

    /// 存活实例ID
    pub fn live_ids(&self) -> Vec<InstanceId> {
        match self {
            Self::Service(factory) => factory.live_ids(),
            Self::Component(factory) => factory.live_ids(),
        }
    }

    /// 存活实例数量
    pub fn len(&self) -> usize {
        match self {
            Self::Service(factory) => factory.len(),
            Self::Component(factory) => factory.len(),
        }
    }

    /// 是否没有存活实例
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 服务工厂
    pub fn as_service(&self) -> Option<&Arc<DynServiceFactory>> {
        match self {
            Self::Service(factory) => Some(factory),
            Self::Component(_) => None,
        }
    }

    /// 组件工厂
    pub fn as_component(&self) -> Option<&Arc<dyn RootFactory>> {
        match self {
            Self::Component(factory) => Some(factory),
            Self::Service(_) => None,
        }
    }

    /// 两个引用是否指向同一个工厂
    pub fn same_factory(&self, other: &FactoryHandle) -> bool {
        self.data_ptr() == other.data_ptr()
    }

    fn data_ptr(&self) -> *const () {
        match self {
            Self::Service(factory) => Arc::as_ptr(factory).cast::<()>(),
            Self::Component(factory) => Arc::as_ptr(factory).cast::<()>(),
        }
    }
}

impl fmt::Debug for FactoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryHandle")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .field("type", &self.type_info().name)
            .field("live", &self.len())
            .finish()
    }
}

/// 带种类标签的实例引用
#[derive(Clone)]
pub enum InstanceRef {
    Service(Arc<dyn Service>),
    Component(Arc<dyn Component>),
}

impl InstanceRef {
    /// 种类标签
    pub fn kind(&self) -> InstanceKind {
        match self {
            Self::Service(_) => InstanceKind::Service,
            Self::Component(_) => InstanceKind::Component,
        }
    }

    /// 实例ID
    pub fn id(&self) -> Option<InstanceId> {
        match self {
            Self::Service(service) => service.id(),
            Self::Component(component) => component.id(),
        }
    }

    /// 服务实例
    pub fn as_service(&self) -> Option<&Arc<dyn Service>> {
        match self {
            Self::Service(service) => Some(service),
            Self::Component(_) => None,
        }
    }

    /// 组件实例
    pub fn as_component(&self) -> Option<&Arc<dyn Component>> {
        match self {
            Self::Component(component) => Some(component),
            Self::Service(_) => None,
        }
    }

    /// 向下转型为具体类型
    pub fn downcast<T: Any + Send + Sync>(self) -> Option<Arc<T>> {
        let any = match self {
            Self::Service(service) => AsAny::into_any_arc(service),
            Self::Component(component) => AsAny::into_any_arc(component),
        };
        any.downcast::<T>().ok()
    }

    /// 两个引用是否指向同一个实例
    pub fn same_instance(&self, other: &InstanceRef) -> bool {
        self.data_ptr() == other.data_ptr()
    }

    fn data_ptr(&self) -> *const () {
        match self {
            Self::Service(service) => Arc::as_ptr(service).cast::<()>(),
            Self::Component(component) => Arc::as_ptr(component).cast::<()>(),
        }
    }
}

impl fmt::Debug for InstanceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceRef")
            .field("kind", &self.kind())
            .field("id", &self.id())
            .finish()
    }
}
