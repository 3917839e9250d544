/// 持久化系统 (Persistence)
///
/// 所有写入失败只记录日志,不会阻塞或中断分拣决策
/// - CsvEventLog: 结构化事件日志
/// - CropStore:   确认/剔除时保存目标裁剪图
/// - FrameCapture: 周期性保存整帧
/// - RunDirs:     按启动时间划分的日志/图像目录
/// - TextLog:     文本日志 (系统消息 + 执行器回传)
pub mod crops;
pub mod events;
pub mod frames;

pub use crops::{CropBucket, CropSink, CropStore};
pub use events::CsvEventLog;
pub use frames::FrameCapture;

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

/// 本次运行的标签, 如 `2025-03-01_08-30-00`
pub fn gen_run_tag() -> String {
    chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// 给显示/文本日志行加本地时间前缀
pub fn timestamped(message: &str) -> String {
    format!(
        "[{}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        message
    )
}

/// 当前墙钟毫秒 (文件命名用)
pub fn wall_clock_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 运行目录
///
/// ```text
/// <logs>/<tag>/arduino_log.txt
/// <logs>/<tag>/events.csv
/// <captures>/<tag>/frames/
/// <captures>/<tag>/crops/{confirmed,ejected}/<class>/
/// ```
#[derive(Clone, Debug)]
pub struct RunDirs {
    pub run_tag: String,
    pub log_dir: PathBuf,
    pub capture_dir: PathBuf,
}

impl RunDirs {
    pub fn create(logs_root: impl AsRef<Path>, captures_root: impl AsRef<Path>) -> io::Result<Self> {
        Self::create_tagged(logs_root, captures_root, gen_run_tag())
    }

    pub fn create_tagged(
        logs_root: impl AsRef<Path>,
        captures_root: impl AsRef<Path>,
        run_tag: String,
    ) -> io::Result<Self> {
        let dirs = Self {
            log_dir: logs_root.as_ref().join(&run_tag),
            capture_dir: captures_root.as_ref().join(&run_tag),
            run_tag,
        };
        fs::create_dir_all(&dirs.log_dir)?;
        fs::create_dir_all(dirs.frames_dir())?;
        for bucket in [CropBucket::Confirmed, CropBucket::Ejected] {
            fs::create_dir_all(dirs.crops_dir().join(bucket.as_str()))?;
        }
        Ok(dirs)
    }

    pub fn text_log(&self) -> PathBuf {
        self.log_dir.join("arduino_log.txt")
    }

    pub fn events_csv(&self) -> PathBuf {
        self.log_dir.join("events.csv")
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.capture_dir.join("frames")
    }

    pub fn crops_dir(&self) -> PathBuf {
        self.capture_dir.join("crops")
    }
}

/// 追加写入的文本日志
///
/// 克隆共享同一把锁,回传线程与决策循环同时写入时每行保持完整
#[derive(Clone, Debug)]
pub struct TextLog {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl TextLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, line: &str) {
        let mut entry = String::with_capacity(line.len() + 1);
        entry.push_str(line);
        entry.push('\n');

        let _guard = self.lock.lock();
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| f.write_all(entry.as_bytes()));
        if let Err(e) = result {
            warn!("File log error: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_dirs_layout() {
        let root = tempfile::tempdir().unwrap();
        let dirs = RunDirs::create_tagged(
            root.path().join("logs"),
            root.path().join("captures"),
            "run-1".to_string(),
        )
        .unwrap();
        assert!(dirs.log_dir.ends_with("logs/run-1"));
        assert!(dirs.frames_dir().is_dir());
        assert!(dirs.crops_dir().join("confirmed").is_dir());
        assert!(dirs.crops_dir().join("ejected").is_dir());
        assert_eq!(dirs.events_csv().file_name().unwrap(), "events.csv");
    }

    #[test]
    fn test_text_log_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = TextLog::new(dir.path().join("log.txt"));
        log.append("first");
        log.append(&timestamped("second"));
        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "first");
        assert!(lines[1].ends_with("] second"));
    }

    #[test]
    fn test_concurrent_appends_keep_lines_whole() {
        let dir = tempfile::tempdir().unwrap();
        let log = TextLog::new(dir.path().join("log.txt"));
        let filler = "X".repeat(200);

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let log = log.clone();
                let filler = filler.clone();
                std::thread::spawn(move || {
                    for i in 0..500 {
                        log.append(&format!("T{}-{:05}-{}", t, i, filler));
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2000);
        for line in lines {
            let mut parts = line.splitn(3, '-');
            let (tag, seq, rest) = (parts.next(), parts.next(), parts.next());
            assert!(tag.map_or(false, |t| t.len() == 2 && t.starts_with('T')), "torn line {:?}", line);
            assert_eq!(seq.map(str::len), Some(5), "torn line {:?}", line);
            assert_eq!(rest, Some(filler.as_str()), "torn line {:?}", line);
        }
    }

    #[test]
    fn test_run_tag_shape() {
        let tag = gen_run_tag();
        assert_eq!(tag.len(), "2025-01-01_00-00-00".len());
        assert_eq!(&tag[10..11], "_");
    }
}
