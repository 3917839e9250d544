//! 执行器回传读取线程
//!
//! 与分拣循环只通过有界通道交互: 本线程只发送文本行,不触碰任何分拣状态

use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Sender, TrySendError};
use tracing::{debug, info, warn};

use crate::persist::{timestamped, TextLog};

/// 轮询间隔 (停止标志最迟在一个间隔内被观察到)
pub const FEEDBACK_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct FeedbackReader {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FeedbackReader {
    /// 启动读取线程
    ///
    /// 每行加时间戳后非阻塞地推入 `tx`,通道满时丢弃该行
    pub fn spawn<R>(source: R, tx: Sender<String>, text_log: Option<TextLog>) -> Self
    where
        R: Read + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let handle = thread::spawn(move || {
            info!("📡 执行器回传线程启动");
            read_loop(source, &tx, text_log.as_ref(), &flag);
            info!("📡 执行器回传线程退出");
        });
        Self {
            running,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
            && self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    /// 通知线程退出并等待
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("⚠️  执行器回传线程异常退出");
            }
        }
    }
}

impl Drop for FeedbackReader {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_loop<R: Read>(
    source: R,
    tx: &Sender<String>,
    text_log: Option<&TextLog>,
    running: &AtomicBool,
) {
    let mut reader = BufReader::new(source);
    let mut buf = Vec::new();

    while running.load(Ordering::Relaxed) {
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                // EOF: 输出残留的半行后结束
                publish(&buf, tx, text_log);
                break;
            }
            Ok(_) => {
                if buf.ends_with(b"\n") {
                    publish(&buf, tx, text_log);
                    buf.clear();
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                thread::sleep(FEEDBACK_POLL_INTERVAL);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                warn!("Arduino read error: {}", e);
                thread::sleep(FEEDBACK_POLL_INTERVAL);
            }
        }
    }
}

fn publish(raw: &[u8], tx: &Sender<String>, text_log: Option<&TextLog>) {
    let text = String::from_utf8_lossy(raw);
    let message = text.trim();
    if message.is_empty() {
        return;
    }
    let entry = timestamped(message);
    if let Some(log) = text_log {
        log.append(&entry);
    }
    match tx.try_send(entry) {
        Ok(()) => {}
        Err(TrySendError::Full(line)) => debug!("回传通道已满,丢弃: {}", line),
        Err(TrySendError::Disconnected(_)) => {}
    }
}
