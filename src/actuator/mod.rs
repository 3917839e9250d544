/// 执行器系统 (Actuator System)
///
/// - Actuator:       发射命令接口 (尽力而为,可能失败)
/// - SerialActuator: Arduino 串口执行器
/// - DryRunActuator: 仅记录日志,不驱动硬件
/// - FeedbackReader: 独立线程读取执行器回传文本
pub mod feedback;
pub mod serial;

pub use feedback::{FeedbackReader, FEEDBACK_POLL_INTERVAL};
pub use serial::SerialActuator;

use tracing::info;

use crate::error::ActuatorError;

/// 发射命令接口
pub trait Actuator {
    /// 发送一次剔除命令
    fn fire(&mut self) -> Result<(), ActuatorError>;
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn fire(&mut self) -> Result<(), ActuatorError> {
        (**self).fire()
    }
}

/// 空执行器: 只打日志
#[derive(Default)]
pub struct DryRunActuator {
    fired: u64,
}

impl DryRunActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }
}

impl Actuator for DryRunActuator {
    fn fire(&mut self) -> Result<(), ActuatorError> {
        self.fired += 1;
        info!("🧪 [dry-run] 发射命令 #{}", self.fired);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) use tests::RecordingActuator;
