//! 过期目标清理

use crate::detection::ObjectId;

use super::registry::TrackRegistry;

#[derive(Clone, Copy, Debug)]
pub struct LifecycleReaper {
    timeout_ms: u64,
}

impl LifecycleReaper {
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }

    /// 删除超时未见的目标 (无条件,未完成的确认/发射状态一并丢弃),返回被删ID
    pub fn reap(&self, registry: &mut TrackRegistry, now: u64) -> Vec<ObjectId> {
        let stale: Vec<ObjectId> = registry
            .iter()
            .filter(|t| t.idle(now) > self.timeout_ms)
            .map(|t| t.id)
            .collect();
        for id in &stale {
            registry.remove(*id);
        }
        stale
    }
}
