//! 周期性整帧保存

use std::path::PathBuf;

use image::RgbImage;
use tracing::warn;

pub struct FrameCapture {
    dir: PathBuf,
    every_n: u64,
    counter: u64,
}

impl FrameCapture {
    pub fn new(dir: impl Into<PathBuf>, every_n: u64) -> Self {
        Self {
            dir: dir.into(),
            every_n: every_n.max(1),
            counter: 0,
        }
    }

    /// 每 N 帧保存一次 `frame_<NNNNNN>.jpg`,返回写入路径
    pub fn maybe_save(&mut self, frame: &RgbImage) -> Option<PathBuf> {
        self.counter += 1;
        if self.counter % self.every_n != 0 {
            return None;
        }
        let path = self.dir.join(format!("frame_{:06}.jpg", self.counter));
        match frame.save(&path) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("Save frame error: {}", e);
                None
            }
        }
    }
}
