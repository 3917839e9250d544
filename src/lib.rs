// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod actuator; // 剔除执行器 (串口 / 演练)
pub mod config; // 分拣参数
pub mod detection; // 检测输入格式
pub mod error; // 错误类型
pub mod persist; // 日志与图像落盘
pub mod replay; // 检测流回放
pub mod ring; // 定长环形缓冲
pub mod sorting; // 分拣决策核心

pub use crate::actuator::{Actuator, DryRunActuator, FeedbackReader, SerialActuator};
pub use crate::config::{Grade, SorterConfig};
pub use crate::detection::{BBox, Detection, DetectionFrame, InputRecord, ObjectId};
pub use crate::error::{ActuatorError, ConfigError, PersistError};
pub use crate::persist::{CropStore, CsvEventLog, FrameCapture, RunDirs, TextLog};
pub use crate::ring::Ring;
pub use crate::sorting::{
    DecisionLoop, EventRecord, EventSink, FrameReport, SessionStats, SorterEvent, SystemStatus,
};
