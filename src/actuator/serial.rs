//! Arduino 串口执行器
//!
//! 命令协议: 单字节 `A` 触发一次气阀剔除; 回传为任意文本行

use std::io::{Read, Write};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use serialport::SerialPort;
use tracing::{info, warn};

use super::{Actuator, FEEDBACK_POLL_INTERVAL};
use crate::error::ActuatorError;

/// 剔除命令字节
pub const ARM_COMMAND: &[u8] = b"A";

/// Arduino 上电复位等待时间
const RESET_SETTLE: Duration = Duration::from_millis(2500);

pub struct SerialActuator {
    port: Box<dyn SerialPort>,
}

impl SerialActuator {
    /// 打开串口并等待控制器复位,打印其启动信息
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        info!("🔌 Connecting to Arduino on port {}...", path);
        let mut port = serialport::new(path, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()
            .with_context(|| format!("Unable to open port {}", path))?;

        thread::sleep(RESET_SETTLE);

        let startup = drain_pending(port.as_mut(), |p| p.bytes_to_read());
        for line in String::from_utf8_lossy(&startup).lines() {
            let line = line.trim();
            if !line.is_empty() {
                info!("📟 Startup message from Arduino: {}", line);
            }
        }

        info!("✅ Successfully connected to Arduino on port {}", path);
        Ok(Self { port })
    }

    /// 克隆一个句柄给回传读取线程
    ///
    /// 读超时设为轮询间隔,停止标志最迟一个间隔内被观察到
    pub fn feedback_handle(&self) -> Result<Box<dyn SerialPort>, ActuatorError> {
        let mut handle = self.port.try_clone()?;
        handle.set_timeout(FEEDBACK_POLL_INTERVAL)?;
        Ok(handle)
    }
}

/// 读空缓冲区中已到达的字节 (控制器启动信息)
fn drain_pending<P, F>(port: &mut P, bytes_to_read: F) -> Vec<u8>
where
    P: Read + ?Sized,
    F: Fn(&P) -> serialport::Result<u32>,
{
    let mut out = Vec::new();
    loop {
        let pending = match bytes_to_read(&*port) {
            Ok(0) => break,
            Ok(n) => n as usize,
            Err(e) => {
                warn!("⚠️  Unable to query Arduino input buffer: {}", e);
                break;
            }
        };
        let mut buf = vec![0u8; pending];
        match port.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => out.extend_from_slice(&buf[..n]),
            Err(e) => {
                warn!("⚠️  Arduino startup read error: {}", e);
                break;
            }
        }
    }
    out
}

impl Actuator for SerialActuator {
    fn fire(&mut self) -> Result<(), ActuatorError> {
        self.port.write_all(ARM_COMMAND)?;
        self.port.flush()?;
        Ok(())
    }
}
