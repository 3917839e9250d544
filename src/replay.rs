//! 检测流回放 (JSON Lines)
//!
//! 每行一条 `InputRecord`; 无法解析的行只告警并跳过

use std::io::BufRead;

use anyhow::{Context, Result};
use image::RgbImage;
use tracing::{info, warn};

use crate::detection::{DetectionFrame, InputRecord};
use crate::persist::FrameCapture;
use crate::sorting::DecisionLoop;

/// 每隔多少帧打印一次统计
const STATS_EVERY_N_FRAMES: u64 = 300;

/// 回放统计
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub frames: u64,
    pub resets: u64,
    pub skipped: u64,
}

/// 回放整条检测流
///
/// 读取第一行之前先发出启动事件,空流或全部无法解析时也会记录
pub fn replay<R: BufRead>(
    engine: &mut DecisionLoop,
    input: R,
    mut frame_capture: Option<&mut FrameCapture>,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    engine.startup(0);

    for (line_no, line) in input.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record = match serde_json::from_str::<InputRecord>(line) {
            Ok(record) => record,
            Err(e) => {
                warn!("⚠️ Skipping line {}: {}", line_no + 1, e);
                summary.skipped += 1;
                continue;
            }
        };

        match record {
            InputRecord::Frame(frame) => {
                let image = load_image(&frame);
                engine.process_frame(&frame, image.as_ref());

                if let (Some(capture), Some(image)) = (frame_capture.as_deref_mut(), image.as_ref()) {
                    capture.maybe_save(image);
                }

                summary.frames += 1;
                if summary.frames % STATS_EVERY_N_FRAMES == 0 {
                    info!(
                        "📊 {} | {} | tracks: {}",
                        engine.stats_text(),
                        engine.status(frame.ts_ms).as_str(),
                        engine.registry().len()
                    );
                }
            }
            InputRecord::Reset { ts_ms } => {
                engine.reset_stats(ts_ms);
                summary.resets += 1;
            }
        }
    }
    Ok(summary)
}

/// 读取帧画面 (用于裁剪/存帧), 失败时只告警
fn load_image(frame: &DetectionFrame) -> Option<RgbImage> {
    let path = frame.image.as_deref()?;
    match image::open(path) {
        Ok(img) => Some(img.to_rgb8()),
        Err(e) => {
            warn!("⚠️ Unable to read frame image {}: {}", path, e);
            None
        }
    }
}
