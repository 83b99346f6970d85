//! 实例生命周期管理

use crate::metadata::{InstanceData, InstanceId};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};

/// 实例生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// 已构造，尚未由工厂分配ID
    Constructed,
    /// 已分配ID，存活中
    Live,
    /// 已执行清理
    Destroyed,
}

/// 实例基础状态
///
/// 由工厂写入的ID、创建数据和根组件标记。实现 [`crate::Instance`] 的类型
/// 内嵌一个 `InstanceBase` 并通过 `base()` / `base_mut()` 暴露。
#[derive(Debug)]
pub struct InstanceBase {
    id: Option<InstanceId>,
    data: Option<InstanceData>,
    root: bool,
    released: AtomicBool,
    created_at: DateTime<Utc>,
}

impl InstanceBase {
    /// 创建新的实例基础状态
    pub fn new() -> Self {
        Self {
            id: None,
            data: None,
            root: false,
            released: AtomicBool::new(false),
            created_at: Utc::now(),
        }
    }

    /// 写入工厂分配的ID和创建数据
    pub fn assign(&mut self, id: InstanceId, data: Option<InstanceData>) {
        self.id = Some(id);
        self.data = data;
    }

    /// 实例ID
    pub fn id(&self) -> Option<InstanceId> {
        self.id
    }

    /// 创建数据
    pub fn data(&self) -> Option<&InstanceData> {
        self.data.as_ref()
    }

    /// 标记为根组件
    pub fn mark_root(&mut self) {
        self.root = true;
    }

    /// 是否为根组件
    pub fn is_root(&self) -> bool {
        self.root
    }

    /// 创建时间
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 开始释放，只有第一次调用返回 `true`
    pub fn begin_release(&self) -> bool {
        !self.released.swap(true, Ordering::AcqRel)
    }

    /// 当前生命周期状态
    pub fn state(&self) -> LifecycleState {
        if self.released.load(Ordering::Acquire) {
            LifecycleState::Destroyed
        } else if self.id.is_some() {
            LifecycleState::Live
        } else {
            LifecycleState::Constructed
        }
    }
}

impl Default for InstanceBase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        let mut base = InstanceBase::new();
        assert_eq!(base.state(), LifecycleState::Constructed);

        base.assign(InstanceId::FIRST, Some(serde_json::json!({"title": "menu"})));
        assert_eq!(base.state(), LifecycleState::Live);
        assert_eq!(base.id(), Some(InstanceId::FIRST));
        assert_eq!(base.data().unwrap()["title"], "menu");

        assert!(base.begin_release());
        assert!(!base.begin_release());
        assert_eq!(base.state(), LifecycleState::Destroyed);
    }

    #[test]
    fn test_root_flag() {
        let mut base = InstanceBase::default();
        assert!(!base.is_root());
        base.mark_root();
        assert!(base.is_root());
    }
}
