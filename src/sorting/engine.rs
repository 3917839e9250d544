//! 分拣决策循环 (Decision Loop)
//!
//! 单线程逐帧处理: 一帧的 去重 → 更新 → 投票 → 调度 → 清理 全部完成后才处理下一帧。
//! 注册表/计数器/冷却时间只在本循环内修改。

use crossbeam_channel::Receiver;
use image::RgbImage;
use tracing::{error, info, warn};

use crate::actuator::Actuator;
use crate::config::{Grade, SorterConfig};
use crate::detection::{BBox, Detection, DetectionFrame, ObjectId};
use crate::persist::{timestamped, CropBucket, CropSink, TextLog};
use crate::ring::Ring;

use super::dedup::DuplicateFilter;
use super::events::{EventRecord, EventSink, SorterEvent};
use super::reaper::LifecycleReaper;
use super::registry::TrackRegistry;
use super::scheduler::{ArmingZone, EjectionScheduler};
use super::voting::VotingClassifier;

/// 统计计数 (只能被显式清零)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub good: u64,
    pub bad: u64,
    pub ejected: u64,
}

/// 执行器状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemStatus {
    Ready,
    Cooldown,
}

impl SystemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemStatus::Ready => "READY",
            SystemStatus::Cooldown => "COOLDOWN",
        }
    }
}

/// 单帧处理摘要
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub zone: Option<ArmingZone>,
    pub duplicates: Vec<(ObjectId, ObjectId)>,
    pub confirmed: Vec<ObjectId>,
    pub ejected: Option<ObjectId>,
    pub removed: Vec<ObjectId>,
}

#[derive(Clone, Copy)]
enum Severity {
    Info,
    Error,
}

pub struct DecisionLoop {
    config: SorterConfig,
    registry: TrackRegistry,
    dedup: DuplicateFilter,
    voting: VotingClassifier,
    scheduler: EjectionScheduler,
    reaper: LifecycleReaper,
    stats: SessionStats,

    actuator: Box<dyn Actuator>,
    events: Box<dyn EventSink>,
    crops: Option<Box<dyn CropSink>>,

    display: Ring<String>,
    feedback: Option<Receiver<String>>,
    text_log: Option<TextLog>,
}

impl DecisionLoop {
    pub fn new(config: SorterConfig, actuator: Box<dyn Actuator>, events: Box<dyn EventSink>) -> Self {
        Self {
            registry: TrackRegistry::new(config.class_history_capacity),
            dedup: DuplicateFilter::new(config.duplicate_window_ms, config.duplicate_distance_px),
            voting: VotingClassifier::new(config.stability_frames),
            scheduler: EjectionScheduler::new(config.lead_time_ms, config.command_cooldown_ms),
            reaper: LifecycleReaper::new(config.object_timeout_ms),
            stats: SessionStats::default(),
            actuator,
            events,
            crops: None,
            display: Ring::new(config.display_log_capacity),
            feedback: None,
            text_log: None,
            config,
        }
    }

    /// 确认/剔除时保存裁剪图
    pub fn with_crops(mut self, crops: Box<dyn CropSink>) -> Self {
        self.crops = Some(crops);
        self
    }

    /// 执行器回传通道 (每帧汇入显示日志)
    pub fn with_feedback(mut self, rx: Receiver<String>) -> Self {
        self.feedback = Some(rx);
        self
    }

    pub fn with_text_log(mut self, log: TextLog) -> Self {
        self.text_log = Some(log);
        self
    }

    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// 叠加显示用统计文本
    pub fn stats_text(&self) -> String {
        format!(
            "GOOD: {} | BAD: {} | EJECTED: {}",
            self.stats.good, self.stats.bad, self.stats.ejected
        )
    }

    pub fn is_ready(&self, now: u64) -> bool {
        self.scheduler.is_ready(now)
    }

    pub fn status(&self, now: u64) -> SystemStatus {
        if self.is_ready(now) {
            SystemStatus::Ready
        } else {
            SystemStatus::Cooldown
        }
    }

    /// 最近的显示日志 (最旧 → 最新)
    pub fn display_log(&self) -> impl Iterator<Item = &String> {
        self.display.iter()
    }

    pub fn arming_zone(&self, frame_width: u32) -> ArmingZone {
        ArmingZone::from_ratios(
            self.config.arming_zone_start_ratio,
            self.config.arming_zone_end_ratio,
            frame_width,
        )
    }

    /// 启动: 记录参数并发出 `startup` 事件
    pub fn startup(&mut self, now: u64) {
        self.log_line(Severity::Info, "Coffee sorter system started".to_string());
        self.log_line(
            Severity::Info,
            format!(
                "Lead time: {}ms, Arming zone: {:.0}% - {:.0}%",
                self.config.lead_time_ms,
                self.config.arming_zone_start_ratio * 100.0,
                self.config.arming_zone_end_ratio * 100.0
            ),
        );
        self.emit(
            now,
            SorterEvent::Startup {
                lead_ms: self.config.lead_time_ms,
                zone_start: (self.config.arming_zone_start_ratio * 100.0) as u32,
                zone_end: (self.config.arming_zone_end_ratio * 100.0) as u32,
                conf: self.config.confidence_threshold,
            },
        );
    }

    /// 清零统计,不影响任何跟踪对象
    pub fn reset_stats(&mut self, now: u64) {
        self.stats = SessionStats::default();
        self.log_line(Severity::Info, "Statistics reset".to_string());
        self.emit(now, SorterEvent::StatsReset);
    }

    /// 把执行器回传汇入显示日志
    pub fn pump_feedback(&mut self) {
        let Some(rx) = &self.feedback else {
            return;
        };
        let lines: Vec<String> = rx.try_iter().collect();
        for line in lines {
            self.display.push(line);
        }
    }

    /// 处理一帧检测
    ///
    /// `image` 为该帧原始画面,缺省时不保存裁剪图
    pub fn process_frame(&mut self, frame: &DetectionFrame, image: Option<&RgbImage>) -> FrameReport {
        let now = frame.ts_ms;
        // 画面尺寸可能逐帧变化,每帧重新计算
        let zone = self.arming_zone(frame.width);
        let mut report = FrameReport {
            zone: Some(zone),
            ..Default::default()
        };

        self.pump_feedback();

        for detection in &frame.detections {
            if detection.confidence < self.config.confidence_threshold {
                continue;
            }
            self.observe(detection, frame, image, now, &mut report);
        }

        self.schedule(zone, now, image, &mut report);
        self.reap(now, &mut report);

        report
    }

    fn observe(
        &mut self,
        detection: &Detection,
        frame: &DetectionFrame,
        image: Option<&RgbImage>,
        now: u64,
        report: &mut FrameReport,
    ) {
        if let Some(original) = self.dedup.find_original(detection, &self.registry, now) {
            self.log_line(
                Severity::Info,
                format!(
                    "DUPLICATE: Skipped ID {} as duplicate of {}",
                    detection.id, original
                ),
            );
            self.emit(
                now,
                SorterEvent::Duplicate {
                    id: detection.id,
                    dup_of: original,
                    cls: detection.class_name.clone(),
                },
            );
            report.duplicates.push((detection.id, original));
            return;
        }

        let config = &self.config;
        let track = self.registry.upsert(detection, now);
        let Some(verdict) = self.voting.classify(track, |c| config.grade(c)) else {
            return;
        };
        let (id, center_x, frames_seen, last_box) =
            (track.id, track.center_x, track.frames_seen, track.last_box);

        match verdict.grade {
            Grade::Good => self.stats.good += 1,
            Grade::Bad => self.stats.bad += 1,
            Grade::Unknown => {}
        }

        self.log_line(
            Severity::Info,
            format!("CLASSIFY: ID {} confirmed as '{}'", id, verdict.class_name),
        );
        self.emit(
            now,
            SorterEvent::Confirm {
                id,
                cls: verdict.class_name.clone(),
                x_center: center_x as i32,
                frames_seen,
                fw: frame.width,
                fh: frame.height,
            },
        );
        if self.config.save_crops_on_confirm {
            self.save_crop(image, &last_box, &verdict.class_name, id, CropBucket::Confirmed);
        }
        report.confirmed.push(id);
    }

    fn schedule(
        &mut self,
        zone: ArmingZone,
        now: u64,
        image: Option<&RgbImage>,
        report: &mut FrameReport,
    ) {
        let config = &self.config;
        let outcome = self.scheduler.schedule(
            &mut self.registry,
            zone,
            now,
            |c| config.grade(c),
            self.actuator.as_mut(),
            &mut self.stats.ejected,
        );

        for (id, reason) in outcome.failed {
            self.log_line(
                Severity::Error,
                format!("ERROR: Failed to send ARM command for ID {} - {}", id, reason),
            );
        }

        let Some(ejection) = outcome.fired else {
            return;
        };
        self.log_line(
            Severity::Info,
            format!(
                "ARM: Sent command for ID {} ('{}') - Total: {}",
                ejection.id, ejection.class_name, ejection.total
            ),
        );

        let crop = if self.config.save_crops_on_eject {
            self.save_crop(
                image,
                &ejection.last_box,
                &ejection.class_name,
                ejection.id,
                CropBucket::Ejected,
            )
        } else {
            None
        };
        self.emit(
            now,
            SorterEvent::Eject {
                id: ejection.id,
                cls: ejection.class_name,
                x_center: ejection.center_x as i32,
                in_zone: zone.contains(ejection.center_x),
                crop,
            },
        );
        report.ejected = Some(ejection.id);
    }

    fn reap(&mut self, now: u64, report: &mut FrameReport) {
        let removed = self.reaper.reap(&mut self.registry, now);
        for id in &removed {
            self.log_line(Severity::Info, format!("CLEANUP: Removed stale ID {}", id));
            self.emit(now, SorterEvent::Cleanup { id: *id });
        }
        report.removed = removed;
    }

    fn save_crop(
        &mut self,
        image: Option<&RgbImage>,
        bbox: &BBox,
        class_name: &str,
        id: ObjectId,
        bucket: CropBucket,
    ) -> Option<String> {
        let (crops, image) = (self.crops.as_mut()?, image?);
        match crops.save_crop(image, bbox, class_name, id, bucket) {
            Ok(path) => Some(path.display().to_string()),
            Err(e) => {
                warn!("Save crop error: {}", e);
                None
            }
        }
    }

    fn emit(&mut self, ts: u64, event: SorterEvent) {
        self.events.emit(EventRecord { ts, event });
    }

    fn log_line(&mut self, severity: Severity, message: String) {
        match severity {
            Severity::Info => info!("{}", message),
            Severity::Error => error!("{}", message),
        }
        let line = timestamped(&message);
        if let Some(log) = &self.text_log {
            log.append(&line);
        }
        self.display.push(line);
    }
}
