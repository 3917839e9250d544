//! 跟踪对象 (单个咖啡豆的滚动状态)

use crate::detection::{BBox, Detection, ObjectId};
use crate::ring::Ring;

/// 跟踪对象
///
/// 只由 `TrackRegistry` 创建,只由 `LifecycleReaper` 删除
#[derive(Clone, Debug)]
pub struct Track {
    /// 上游跟踪ID
    pub id: ObjectId,

    /// 最近K帧的类别标签 (投票用)
    pub class_history: Ring<String>,

    /// 首次/最近一次出现时间 (毫秒)
    pub first_seen_at: u64,
    pub last_seen_at: u64,

    /// 累计更新次数
    pub frames_seen: u32,

    /// 最近一帧的水平中心 (像素)
    pub center_x: f32,

    /// 最近一帧的检测框 (裁剪保存用)
    pub last_box: BBox,

    confirmed_class: Option<String>,
    counted: bool,
    arm_sent: bool,
}

impl Track {
    pub(crate) fn new(id: ObjectId, now: u64, history_capacity: usize) -> Self {
        Self {
            id,
            class_history: Ring::new(history_capacity),
            first_seen_at: now,
            last_seen_at: now,
            frames_seen: 0,
            center_x: 0.0,
            last_box: BBox::default(),
            confirmed_class: None,
            counted: false,
            arm_sent: false,
        }
    }

    /// 融合一次观测
    pub(crate) fn observe(&mut self, detection: &Detection, now: u64) {
        self.frames_seen += 1;
        self.last_seen_at = now;
        self.center_x = detection.center_x();
        self.last_box = detection.bbox;
        self.class_history.push(detection.class_name.clone());
    }

    pub fn confirmed_class(&self) -> Option<&str> {
        self.confirmed_class.as_deref()
    }

    pub fn is_counted(&self) -> bool {
        self.counted
    }

    pub fn arm_sent(&self) -> bool {
        self.arm_sent
    }

    /// 确认类别 (只生效一次),返回是否为首次确认
    pub(crate) fn confirm(&mut self, class_name: String) -> bool {
        if self.counted {
            return false;
        }
        self.confirmed_class = Some(class_name);
        self.counted = true;
        true
    }

    /// 标记已发射 (不可撤销)
    pub(crate) fn mark_armed(&mut self) {
        self.arm_sent = true;
    }

    /// 自首次检测以来的时长
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.first_seen_at)
    }

    /// 自最近一次检测以来的时长
    pub fn idle(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_seen_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(class_name: &str, x1: f32) -> Detection {
        Detection::new(9, class_name, 0.9, BBox::new(x1, 0.0, x1 + 20.0, 20.0))
    }

    #[test]
    fn test_observe_updates_rolling_state() {
        let mut track = Track::new(9, 100, 5);
        track.observe(&det("A", 100.0), 100);
        track.observe(&det("AA", 140.0), 133);

        assert_eq!(track.frames_seen, 2);
        assert_eq!(track.first_seen_at, 100);
        assert_eq!(track.last_seen_at, 133);
        assert_eq!(track.center_x, 150.0);
        assert_eq!(track.class_history.latest().map(String::as_str), Some("AA"));
    }

    #[test]
    fn test_confirm_is_sticky() {
        let mut track = Track::new(1, 0, 5);
        assert!(track.confirm("Black".to_string()));
        assert!(!track.confirm("A".to_string()));
        assert_eq!(track.confirmed_class(), Some("Black"));
        assert!(track.is_counted());
    }

    #[test]
    fn test_age_saturates() {
        let track = Track::new(1, 500, 5);
        assert_eq!(track.age(400), 0);
        assert_eq!(track.age(900), 400);
    }
}
