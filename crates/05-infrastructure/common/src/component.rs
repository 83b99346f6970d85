//! 实例基础接口定义
//!
//! 所有由工厂管理的服务和组件都必须实现的 trait

use crate::errors::LifecycleError;
use crate::lifecycle::InstanceBase;
use crate::logging::LogSink;
use crate::metadata::{InstanceData, InstanceId};
use std::any::Any;
use std::sync::Arc;

/// 动态类型转换支持
pub trait AsAny: Any + Send + Sync {
    /// 转换为 `Arc<dyn Any>`，用于向下转型
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// 实例基础 trait
///
/// 工厂在构造后立即调用一次 [`Instance::set_data`]，在移除前调用一次
/// [`Instance::destroy`]。
pub trait Instance: AsAny {
    /// 内嵌的基础状态
    fn base(&self) -> &InstanceBase;

    /// 内嵌的基础状态（可变）
    fn base_mut(&mut self) -> &mut InstanceBase;

    /// 写入ID和创建数据
    fn set_data(&mut self, id: InstanceId, data: Option<InstanceData>) {
        self.base_mut().assign(id, data);
    }

    /// 实例ID
    fn id(&self) -> Option<InstanceId> {
        self.base().id()
    }

    /// 创建数据
    fn data(&self) -> Option<&InstanceData> {
        self.base().data()
    }

    /// 清理钩子
    ///
    /// 对已释放的资源重复清理时不能报错。
    fn destroy(&self) -> Result<(), LifecycleError> {
        Ok(())
    }
}

/// 服务 trait
pub trait Service: Instance {
    /// 日志汇报能力，日志服务及其替换实现需要返回自身
    fn log_sink(&self) -> Option<&dyn LogSink> {
        None
    }
}

/// 组件 trait
pub trait Component: Instance {
    /// 挂载到宿主，只对根组件调用一次
    fn append(&self) -> Result<(), LifecycleError>;

    /// 是否为根组件
    fn is_root(&self) -> bool {
        self.base().is_root()
    }
}
