//! 模块定义
//!
//! 构造 ModuleFactory 时的声明式输入

use crate::registry::{ComponentDescriptor, ModuleRegistry, ServiceDescriptor};
use infrastructure_common::{Component, TypeInfo};
use std::fmt;
use std::sync::Arc;

/// 模块定义
///
/// - 服务描述符：按依赖顺序声明，不做拓扑排序
/// - 组件描述符：在所有服务之后注册
/// - 根组件：必须同时出现在组件描述符中
/// - 子模块：最先合并，共享其中的工厂
#[derive(Clone, Default)]
pub struct ModuleDefinition {
    pub service_constructors: Vec<ServiceDescriptor>,
    pub component_constructors: Vec<ComponentDescriptor>,
    pub root_component: Option<String>,
    pub modules: Vec<Arc<dyn ModuleRegistry>>,
}

impl ModuleDefinition {
    /// 创建空的模块定义
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加服务
    pub fn with_service(mut self, descriptor: ServiceDescriptor) -> Self {
        self.service_constructors.push(descriptor);
        self
    }

    /// 添加组件
    pub fn with_component(mut self, descriptor: ComponentDescriptor) -> Self {
        self.component_constructors.push(descriptor);
        self
    }

    /// 设置根组件
    pub fn with_root<T: Component>(self) -> Self {
        self.with_root_name(TypeInfo::of::<T>().name)
    }

    /// 按名称设置根组件
    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_component = Some(name.into());
        self
    }

    /// 合并子模块
    pub fn with_module(mut self, module: Arc<dyn ModuleRegistry>) -> Self {
        self.modules.push(module);
        self
    }
}

impl fmt::Debug for ModuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDefinition")
            .field("service_constructors", &self.service_constructors)
            .field("component_constructors", &self.component_constructors)
            .field("root_component", &self.root_component)
            .field("modules", &self.modules.len())
            .finish()
    }
}
