//! 错误类型
//!
//! 分拣核心本身不会因为这些错误中断: 执行器与持久化失败只记录日志

use std::io;

use thiserror::Error;

/// 执行器 (串口) 错误
#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("actuator I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

/// 事件日志 / 图像保存错误
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("persistence I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("empty crop region {0:?}")]
    EmptyCrop((u32, u32, u32, u32)),
}

/// 配置校验错误
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} ratio {value} is outside [0, 1]")]
    RatioOutOfRange { name: &'static str, value: f32 },

    #[error("arming zone start ratio {start} must be below end ratio {end}")]
    EmptyArmingZone { start: f32, end: f32 },

    #[error("{0} must be at least 1")]
    Zero(&'static str),

    #[error("class {0:?} is listed as both good and bad")]
    OverlappingTaxonomy(String),
}
