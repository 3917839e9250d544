//! 分拣参数配置 - 通过JSON文件调整参数

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

/// 类别判定结果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grade {
    Good,
    Bad,
    /// 不在好/坏列表中: 确认但不计数
    Unknown,
}

/// 分拣参数配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SorterConfig {
    // === 检测参数 ===
    pub confidence_threshold: f32, // 检测置信度阈值

    // === 投放区与时序 ===
    pub arming_zone_start_ratio: f32, // 投放区起点 (画面宽度比例)
    pub arming_zone_end_ratio: f32,   // 投放区终点
    pub lead_time_ms: u64,            // 首次检测后至少等待多久才允许发射
    pub command_cooldown_ms: u64,     // 两次发射命令的最小间隔

    // === 投票确认 ===
    pub stability_frames: u32,         // 至少观测多少帧才确认类别
    pub class_history_capacity: usize, // 投票历史长度

    // === 生命周期 ===
    pub object_timeout_ms: u64, // 超过该时长未见则删除

    // === 去重 ===
    pub duplicate_window_ms: u64, // 与已有目标首次出现时间差
    pub duplicate_distance_px: f32, // 水平中心距离

    // === 类别表 ===
    pub good_classes: BTreeSet<String>,
    pub bad_classes: BTreeSet<String>,

    // === 采集/日志 ===
    pub display_log_capacity: usize,
    pub save_crops_on_confirm: bool,
    pub save_crops_on_eject: bool,
    pub crop_padding: u32,
    pub save_frames: bool,
    pub frame_save_every_n: u64,
}

fn labels(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,

            arming_zone_start_ratio: 0.25,
            arming_zone_end_ratio: 0.75,
            lead_time_ms: 800,
            command_cooldown_ms: 300,

            stability_frames: 5,
            class_history_capacity: 5,

            object_timeout_ms: 5000,

            duplicate_window_ms: 400,
            duplicate_distance_px: 40.0,

            good_classes: labels(&["A", "AA", "AAA", "B", "Dry", "Honey", "Pea berry", "Wash"]),
            bad_classes: labels(&[
                "Black",
                "Chipped",
                "Elephant ear",
                "Faded",
                "Split",
                "Triangle",
                "Weevil-infested",
            ]),

            display_log_capacity: 10,
            save_crops_on_confirm: true,
            save_crops_on_eject: true,
            crop_padding: 8,
            save_frames: false,
            frame_save_every_n: 1,
        }
    }
}

impl SorterConfig {
    /// 从JSON文件加载配置; 文件不存在时写入默认配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = match fs::read_to_string(path) {
            Ok(json) => {
                let config: Self = serde_json::from_str(&json)
                    .with_context(|| format!("配置文件解析失败: {}", path.display()))?;
                info!("✅ 配置已从 {} 加载", path.display());
                config
            }
            Err(_) => {
                info!("📝 配置文件不存在,创建默认配置...");
                let config = Self::default();
                config.save(path)?;
                config
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("序列化配置失败")?;
        fs::write(path, json).with_context(|| format!("保存配置失败: {}", path.display()))?;
        info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("arming zone start", self.arming_zone_start_ratio),
            ("arming zone end", self.arming_zone_end_ratio),
            ("confidence threshold", self.confidence_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RatioOutOfRange { name, value });
            }
        }
        if self.arming_zone_start_ratio >= self.arming_zone_end_ratio {
            return Err(ConfigError::EmptyArmingZone {
                start: self.arming_zone_start_ratio,
                end: self.arming_zone_end_ratio,
            });
        }
        if self.stability_frames == 0 {
            return Err(ConfigError::Zero("stability_frames"));
        }
        if self.class_history_capacity == 0 {
            return Err(ConfigError::Zero("class_history_capacity"));
        }
        if self.frame_save_every_n == 0 {
            return Err(ConfigError::Zero("frame_save_every_n"));
        }
        if let Some(label) = self.good_classes.intersection(&self.bad_classes).next() {
            return Err(ConfigError::OverlappingTaxonomy(label.clone()));
        }
        Ok(())
    }

    /// 判定类别好坏
    pub fn grade(&self, class_name: &str) -> Grade {
        if self.good_classes.contains(class_name) {
            Grade::Good
        } else if self.bad_classes.contains(class_name) {
            Grade::Bad
        } else {
            Grade::Unknown
        }
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        info!("🎛️  当前分拣配置:");
        info!("  检测置信度: {:.2}", self.confidence_threshold);
        info!(
            "  投放区: {:.0}% - {:.0}%",
            self.arming_zone_start_ratio * 100.0,
            self.arming_zone_end_ratio * 100.0
        );
        info!("  提前量: {}ms | 冷却: {}ms", self.lead_time_ms, self.command_cooldown_ms);
        info!(
            "  投票: {}帧确认 / 历史{}",
            self.stability_frames, self.class_history_capacity
        );
        info!("  目标超时: {}ms", self.object_timeout_ms);
        info!(
            "  类别表: 好 {} 类 | 坏 {} 类",
            self.good_classes.len(),
            self.bad_classes.len()
        );
    }
}
