/// 检测输入数据结构定义
/// Data structures consumed from the upstream detector/tracker
use serde::{Deserialize, Serialize};

/// 上游跟踪器分配的目标ID
pub type ObjectId = u32;

// ========== 数据结构 ==========

/// 检测框 (x1, y1, x2, y2 像素坐标)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 水平中心 (用于投放区判断与去重)
    pub fn center_x(&self) -> f32 {
        (self.x1 + self.x2) / 2.0
    }

    /// 外扩 `pad` 像素并裁剪到画面范围 [0, W-1] x [0, H-1]
    pub fn padded(&self, pad: u32, frame_width: u32, frame_height: u32) -> (u32, u32, u32, u32) {
        let clip = |v: f32, hi: u32| -> u32 {
            let hi = hi.saturating_sub(1) as i64;
            (v as i64).clamp(0, hi) as u32
        };
        let pad = pad as f32;
        (
            clip(self.x1 - pad, frame_width),
            clip(self.y1 - pad, frame_height),
            clip(self.x2 + pad, frame_width),
            clip(self.y2 + pad, frame_height),
        )
    }
}

impl From<[f32; 4]> for BBox {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// 单个检测结果 (已带跟踪ID)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub id: ObjectId,
    #[serde(rename = "class")]
    pub class_name: String,
    pub confidence: f32,
    pub bbox: BBox,
}

impl Detection {
    pub fn new(id: ObjectId, class_name: impl Into<String>, confidence: f32, bbox: BBox) -> Self {
        Self {
            id,
            class_name: class_name.into(),
            confidence,
            bbox,
        }
    }

    pub fn center_x(&self) -> f32 {
        self.bbox.center_x()
    }
}

/// 一帧的全部检测 (空列表也是合法帧)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    /// 单调时间戳 (毫秒)
    pub ts_ms: u64,
    pub width: u32,
    pub height: u32,
    /// 可选: 原始画面路径 (用于裁剪保存)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// 输入流记录 (JSON Lines, 以 `type` 区分)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputRecord {
    Frame(DetectionFrame),
    /// 统计清零命令
    Reset { ts_ms: u64 },
}
