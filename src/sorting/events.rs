//! 结构化事件 (Structured sorter events)
//!
//! 分拣核心只负责产出事件,落盘格式由 `persist::CsvEventLog` 决定

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::detection::ObjectId;

/// 事件内容
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SorterEvent {
    /// 系统启动 (记录关键参数)
    Startup {
        lead_ms: u64,
        zone_start: u32,
        zone_end: u32,
        conf: f32,
    },
    /// 同一物体被分配了新ID,跳过
    Duplicate {
        id: ObjectId,
        dup_of: ObjectId,
        cls: String,
    },
    /// 投票确认类别
    Confirm {
        id: ObjectId,
        cls: String,
        x_center: i32,
        frames_seen: u32,
        fw: u32,
        fh: u32,
    },
    /// 发射剔除命令
    Eject {
        id: ObjectId,
        cls: String,
        x_center: i32,
        in_zone: bool,
        crop: Option<String>,
    },
    /// 超时删除
    Cleanup { id: ObjectId },
    /// 统计清零
    StatsReset,
}

impl SorterEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            SorterEvent::Startup { .. } => "startup",
            SorterEvent::Duplicate { .. } => "duplicate",
            SorterEvent::Confirm { .. } => "confirm",
            SorterEvent::Eject { .. } => "eject",
            SorterEvent::Cleanup { .. } => "cleanup",
            SorterEvent::StatsReset => "stats_reset",
        }
    }
}

/// 带时间戳的事件记录
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventRecord {
    pub ts: u64,
    #[serde(flatten)]
    pub event: SorterEvent,
}

/// 事件接收端 (CSV日志 / 内存 / 其他)
///
/// 实现方自行处理写入失败,不得向分拣循环传播错误
pub trait EventSink {
    fn emit(&mut self, record: EventRecord);
}

/// 内存事件记录器 (可克隆共享,测试与嵌入使用)
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().clone()
    }

    /// 指定类型的事件
    pub fn of_kind(&self, kind: &str) -> Vec<SorterEvent> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.event.kind() == kind)
            .map(|r| r.event.clone())
            .collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&mut self, record: EventRecord) {
        self.records.lock().push(record);
    }
}
