//! 剔除调度器
//!
//! 每帧最多发射一次: 冷却期外,按ID升序扫描,第一个满足全部条件的坏豆触发执行器
//! - 已确认类别且为坏豆
//! - 水平中心位于投放区内 (开区间)
//! - 尚未发射
//! - 自首次检测起已超过提前量 (补偿相机到喷嘴的传送距离)

use crate::actuator::Actuator;
use crate::config::Grade;
use crate::detection::{BBox, ObjectId};

use super::registry::TrackRegistry;
use super::track::Track;

/// 投放区 (像素)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArmingZone {
    pub start_px: i32,
    pub end_px: i32,
}

impl ArmingZone {
    /// 由宽度比例换算像素边界 (每帧重新计算)
    pub fn from_ratios(start_ratio: f32, end_ratio: f32, frame_width: u32) -> Self {
        Self {
            start_px: (start_ratio * frame_width as f32) as i32,
            end_px: (end_ratio * frame_width as f32) as i32,
        }
    }

    pub fn contains(&self, center_x: f32) -> bool {
        (self.start_px as f32) < center_x && center_x < (self.end_px as f32)
    }
}

/// 一次成功发射
#[derive(Clone, Debug, PartialEq)]
pub struct Ejection {
    pub id: ObjectId,
    pub class_name: String,
    pub center_x: f32,
    pub last_box: BBox,
    pub total: u64,
}

/// 单帧调度结果
#[derive(Debug, Default)]
pub struct ScheduleOutcome {
    pub fired: Option<Ejection>,
    /// 发射失败的目标及原因 (仍可在后续帧重试)
    pub failed: Vec<(ObjectId, String)>,
}

pub struct EjectionScheduler {
    lead_time_ms: u64,
    cooldown_ms: u64,
    last_command_at: Option<u64>,
}

impl EjectionScheduler {
    pub fn new(lead_time_ms: u64, cooldown_ms: u64) -> Self {
        Self {
            lead_time_ms,
            cooldown_ms,
            last_command_at: None,
        }
    }

    /// 冷却结束 (从未发射过也视为就绪)
    pub fn is_ready(&self, now: u64) -> bool {
        self.last_command_at
            .map_or(true, |last| now.saturating_sub(last) > self.cooldown_ms)
    }

    fn is_eligible(
        &self,
        track: &Track,
        zone: ArmingZone,
        now: u64,
        grade: &impl Fn(&str) -> Grade,
    ) -> bool {
        let is_bad = track
            .confirmed_class()
            .map_or(false, |c| grade(c) == Grade::Bad);
        is_bad
            && zone.contains(track.center_x)
            && !track.arm_sent()
            && track.age(now) >= self.lead_time_ms
    }

    /// 扫描并最多发射一次
    ///
    /// 发射失败时该目标保持未发射状态,继续尝试下一个候选
    pub fn schedule(
        &mut self,
        registry: &mut TrackRegistry,
        zone: ArmingZone,
        now: u64,
        grade: impl Fn(&str) -> Grade,
        actuator: &mut dyn Actuator,
        ejection_total: &mut u64,
    ) -> ScheduleOutcome {
        let mut outcome = ScheduleOutcome::default();
        if !self.is_ready(now) {
            return outcome;
        }

        let candidates: Vec<ObjectId> = registry
            .iter()
            .filter(|t| self.is_eligible(t, zone, now, &grade))
            .map(|t| t.id)
            .collect();

        for id in candidates {
            let Some(track) = registry.get_mut(id) else {
                continue;
            };

            if let Err(e) = actuator.fire() {
                outcome.failed.push((id, e.to_string()));
                continue;
            }

            self.last_command_at = Some(now);
            *ejection_total += 1;
            track.mark_armed();
            outcome.fired = Some(Ejection {
                id,
                class_name: track.confirmed_class().unwrap_or_default().to_string(),
                center_x: track.center_x,
                last_box: track.last_box,
                total: *ejection_total,
            });
            break;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::RecordingActuator;
    use crate::detection::Detection;

    fn grade(class_name: &str) -> Grade {
        if class_name == "Black" {
            Grade::Bad
        } else {
            Grade::Good
        }
    }

    /// 建立一个已确认类别的目标
    fn confirmed(registry: &mut TrackRegistry, id: ObjectId, class_name: &str, cx: f32, at: u64) {
        let det = Detection::new(id, class_name, 0.9, BBox::new(cx - 5.0, 0.0, cx + 5.0, 10.0));
        registry.upsert(&det, at);
        registry.get_mut(id).unwrap().confirm(class_name.to_string());
    }

    #[test]
    fn test_zone_from_ratios() {
        let zone = ArmingZone::from_ratios(0.25, 0.75, 1920);
        assert_eq!(zone, ArmingZone { start_px: 480, end_px: 1440 });
        assert!(!zone.contains(480.0));
        assert!(zone.contains(480.5));
        assert!(!zone.contains(1440.0));
    }

    #[test]
    fn test_waits_for_lead_time() {
        let mut scheduler = EjectionScheduler::new(800, 300);
        let mut registry = TrackRegistry::new(5);
        let mut actuator = RecordingActuator::new();
        let mut total = 0;
        let zone = ArmingZone::from_ratios(0.25, 0.75, 1000);
        confirmed(&mut registry, 1, "Black", 500.0, 1000);

        assert!(scheduler
            .schedule(&mut registry, zone, 1799, grade, &mut actuator, &mut total)
            .fired
            .is_none());
        let ejection = scheduler
            .schedule(&mut registry, zone, 1800, grade, &mut actuator, &mut total)
            .fired
            .unwrap();
        assert_eq!(ejection.id, 1);
        assert_eq!(actuator.fired(), 1);
        assert_eq!(total, 1);
        assert!(registry.get(1).unwrap().arm_sent());
    }

    #[test]
    fn test_one_fire_per_cooldown_window() {
        let mut scheduler = EjectionScheduler::new(0, 300);
        let mut registry = TrackRegistry::new(5);
        let mut actuator = RecordingActuator::new();
        let mut total = 0;
        let zone = ArmingZone::from_ratios(0.25, 0.75, 1000);
        confirmed(&mut registry, 1, "Black", 400.0, 0);
        confirmed(&mut registry, 2, "Black", 600.0, 0);

        let first = scheduler.schedule(&mut registry, zone, 1000, grade, &mut actuator, &mut total);
        assert_eq!(first.fired.map(|e| e.id), Some(1));
        let second = scheduler.schedule(&mut registry, zone, 1050, grade, &mut actuator, &mut total);
        assert!(second.fired.is_none());
        assert_eq!(actuator.fired(), 1);

        let third = scheduler.schedule(&mut registry, zone, 1301, grade, &mut actuator, &mut total);
        assert_eq!(third.fired.map(|e| e.id), Some(2));
        assert_eq!(total, 2);
    }

    #[test]
    fn test_good_beans_are_never_fired() {
        let mut scheduler = EjectionScheduler::new(0, 300);
        let mut registry = TrackRegistry::new(5);
        let mut actuator = RecordingActuator::new();
        let mut total = 0;
        let zone = ArmingZone::from_ratios(0.25, 0.75, 1000);
        confirmed(&mut registry, 1, "A", 500.0, 0);

        assert!(scheduler
            .schedule(&mut registry, zone, 5000, grade, &mut actuator, &mut total)
            .fired
            .is_none());
        assert_eq!(actuator.fired(), 0);
    }

    #[test]
    fn test_failed_fire_leaves_track_armable() {
        let mut scheduler = EjectionScheduler::new(0, 300);
        let mut registry = TrackRegistry::new(5);
        let mut actuator = RecordingActuator::failing(1);
        let mut total = 0;
        let zone = ArmingZone::from_ratios(0.25, 0.75, 1000);
        confirmed(&mut registry, 1, "Black", 500.0, 0);

        let outcome = scheduler.schedule(&mut registry, zone, 100, grade, &mut actuator, &mut total);
        assert!(outcome.fired.is_none());
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0, 1);
        assert!(!registry.get(1).unwrap().arm_sent());
        assert_eq!(total, 0);
        assert!(scheduler.is_ready(101));

        let retry = scheduler.schedule(&mut registry, zone, 133, grade, &mut actuator, &mut total);
        assert_eq!(retry.fired.map(|e| e.id), Some(1));
        assert_eq!(actuator.fired(), 1);
    }
}
