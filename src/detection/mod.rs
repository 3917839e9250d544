/// 检测输入 (Detection Input)
///
/// 上游检测器/跟踪器的输出格式,本系统只消费不生产
/// - BBox:           检测框
/// - Detection:      带跟踪ID的单个检测
/// - DetectionFrame: 一帧检测结果
/// - InputRecord:    回放流记录 (帧 / 清零命令)
pub mod types;

pub use types::{BBox, Detection, DetectionFrame, InputRecord, ObjectId};
