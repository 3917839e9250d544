//! 重复检测过滤
//!
//! 上游跟踪器偶尔会给同一颗豆分配第二个ID。新检测满足以下全部条件即视为
//! 已有目标的重复:
//! 1. 与已有目标首次出现的时间差 < 窗口
//! 2. 水平中心距离 < 阈值
//! 3. 类别出现在已有目标的投票历史中

use crate::detection::{Detection, ObjectId};

use super::registry::TrackRegistry;

#[derive(Clone, Copy, Debug)]
pub struct DuplicateFilter {
    window_ms: u64,
    distance_px: f32,
}

impl DuplicateFilter {
    pub fn new(window_ms: u64, distance_px: f32) -> Self {
        Self {
            window_ms,
            distance_px,
        }
    }

    /// 返回被重复的已有目标ID (按ID升序取第一个匹配)
    pub fn find_original(
        &self,
        detection: &Detection,
        registry: &TrackRegistry,
        now: u64,
    ) -> Option<ObjectId> {
        let center_x = detection.center_x();
        registry
            .iter()
            .filter(|t| t.id != detection.id)
            .find(|t| {
                now.abs_diff(t.first_seen_at) < self.window_ms
                    && (center_x - t.center_x).abs() < self.distance_px
                    && t.class_history.contains(&detection.class_name)
            })
            .map(|t| t.id)
    }
}
