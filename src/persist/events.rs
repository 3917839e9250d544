//! CSV 事件日志
//!
//! 固定表头 (所有事件字段的并集),未用到的列留空

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use crate::detection::ObjectId;
use crate::error::PersistError;
use crate::sorting::events::{EventRecord, EventSink, SorterEvent};

pub const HEADER: [&str; 15] = [
    "ts",
    "event",
    "id",
    "dup_of",
    "cls",
    "x_center",
    "frames_seen",
    "fw",
    "fh",
    "in_zone",
    "crop",
    "lead_ms",
    "zone_start",
    "zone_end",
    "conf",
];

/// 一行CSV (列顺序与 `HEADER` 一致)
#[derive(Debug, Default, Serialize)]
struct CsvRow<'a> {
    ts: u64,
    event: &'static str,
    id: Option<ObjectId>,
    dup_of: Option<ObjectId>,
    cls: Option<&'a str>,
    x_center: Option<i32>,
    frames_seen: Option<u32>,
    fw: Option<u32>,
    fh: Option<u32>,
    in_zone: Option<u8>,
    crop: Option<&'a str>,
    lead_ms: Option<u64>,
    zone_start: Option<u32>,
    zone_end: Option<u32>,
    conf: Option<f32>,
}

impl<'a> From<&'a EventRecord> for CsvRow<'a> {
    fn from(record: &'a EventRecord) -> Self {
        let base = CsvRow {
            ts: record.ts,
            event: record.event.kind(),
            ..Default::default()
        };
        match &record.event {
            SorterEvent::Startup {
                lead_ms,
                zone_start,
                zone_end,
                conf,
            } => CsvRow {
                lead_ms: Some(*lead_ms),
                zone_start: Some(*zone_start),
                zone_end: Some(*zone_end),
                conf: Some(*conf),
                ..base
            },
            SorterEvent::Duplicate { id, dup_of, cls } => CsvRow {
                id: Some(*id),
                dup_of: Some(*dup_of),
                cls: Some(cls.as_str()),
                ..base
            },
            SorterEvent::Confirm {
                id,
                cls,
                x_center,
                frames_seen,
                fw,
                fh,
            } => CsvRow {
                id: Some(*id),
                cls: Some(cls.as_str()),
                x_center: Some(*x_center),
                frames_seen: Some(*frames_seen),
                fw: Some(*fw),
                fh: Some(*fh),
                ..base
            },
            SorterEvent::Eject {
                id,
                cls,
                x_center,
                in_zone,
                crop,
            } => CsvRow {
                id: Some(*id),
                cls: Some(cls.as_str()),
                x_center: Some(*x_center),
                in_zone: Some(u8::from(*in_zone)),
                crop: crop.as_deref(),
                ..base
            },
            SorterEvent::Cleanup { id } => CsvRow {
                id: Some(*id),
                ..base
            },
            SorterEvent::StatsReset => base,
        }
    }
}

pub struct CsvEventLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvEventLog {
    /// 以追加方式打开; 新文件或空文件先写表头
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_empty = file.metadata()?.len() == 0;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_empty {
            writer.write_record(HEADER)?;
            writer.flush()?;
        }
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&mut self, record: &EventRecord) -> Result<(), PersistError> {
        self.writer.serialize(CsvRow::from(record))?;
        self.writer.flush()?;
        Ok(())
    }
}

impl EventSink for CsvEventLog {
    fn emit(&mut self, record: EventRecord) {
        if let Err(e) = self.write(&record) {
            warn!("CSV log error: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_rows(path: &Path) -> Vec<csv::StringRecord> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        assert_eq!(reader.headers().unwrap(), &csv::StringRecord::from(HEADER.to_vec()));
        reader.records().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_writes_header_once_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");

        let mut log = CsvEventLog::open(&path).unwrap();
        log.emit(EventRecord {
            ts: 10,
            event: SorterEvent::Eject {
                id: 4,
                cls: "Faded".to_string(),
                x_center: 812,
                in_zone: true,
                crop: None,
            },
        });
        drop(log);

        let mut log = CsvEventLog::open(&path).unwrap();
        log.emit(EventRecord {
            ts: 20,
            event: SorterEvent::Cleanup { id: 4 },
        });

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "eject");
        assert_eq!(&rows[0][2], "4");
        assert_eq!(&rows[0][4], "Faded");
        assert_eq!(&rows[0][9], "1");
        assert_eq!(&rows[0][10], "");
        assert_eq!(&rows[1][0], "20");
        assert_eq!(&rows[1][1], "cleanup");
        assert_eq!(&rows[1][4], "");
    }

    #[test]
    fn test_startup_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        let mut log = CsvEventLog::open(&path).unwrap();
        log.emit(EventRecord {
            ts: 0,
            event: SorterEvent::Startup {
                lead_ms: 800,
                zone_start: 25,
                zone_end: 75,
                conf: 0.5,
            },
        });
        let rows = read_rows(&path);
        assert_eq!(&rows[0][1], "startup");
        assert_eq!(&rows[0][11], "800");
        assert_eq!(&rows[0][12], "25");
        assert_eq!(&rows[0][14], "0.5");
    }
}
