// 咖啡豆分拣主程序 - 回放检测流并驱动剔除执行器
//
// 直接运行: cargo run --bin sorter -- -i frames.jsonl --dry-run
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::bounded;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bean_sorter::actuator::{Actuator, DryRunActuator, FeedbackReader, SerialActuator};
use bean_sorter::persist::{CropStore, CsvEventLog, FrameCapture, RunDirs, TextLog};
use bean_sorter::replay::replay;
use bean_sorter::{DecisionLoop, SorterConfig};

/// 执行器回传通道容量 (满了直接丢弃)
const FEEDBACK_CHANNEL_CAPACITY: usize = 64;

#[derive(Parser, Debug)]
#[command(author, version, about = "咖啡豆分拣决策引擎", long_about = None)]
struct Args {
    /// 配置文件 (不存在时写入默认值)
    #[arg(short, long, default_value = "sorter.json")]
    config: PathBuf,

    /// 检测流 (JSON Lines), 缺省从标准输入读取
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Arduino 串口
    #[arg(short, long, default_value = "COM9")]
    port: String,

    /// 串口波特率
    #[arg(short, long, default_value_t = 9600)]
    baud: u32,

    /// 不连接串口,只记录发射命令
    #[arg(long)]
    dry_run: bool,

    /// 文本/事件日志根目录
    #[arg(long, default_value = "logs")]
    logs_dir: PathBuf,

    /// 帧/裁剪图根目录
    #[arg(long, default_value = "captures")]
    captures_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = SorterConfig::load(&args.config)?;
    config.print_summary();

    let dirs = RunDirs::create(&args.logs_dir, &args.captures_dir)
        .context("Unable to create run directories")?;
    info!("📁 Logs: {}", dirs.log_dir.display());
    info!("📁 Captures: {}", dirs.capture_dir.display());

    let text_log = TextLog::new(dirs.text_log());
    let events = CsvEventLog::open(dirs.events_csv())?;

    // 执行器 + 回传读取线程
    let (tx_feedback, rx_feedback) = bounded::<String>(FEEDBACK_CHANNEL_CAPACITY);
    let mut feedback_reader = None;
    let actuator: Box<dyn Actuator> = if args.dry_run {
        info!("🧪 Dry-run mode: no serial port");
        Box::new(DryRunActuator::new())
    } else {
        let serial = SerialActuator::open(&args.port, args.baud)?;
        let handle = serial.feedback_handle()?;
        feedback_reader = Some(FeedbackReader::spawn(
            handle,
            tx_feedback,
            Some(text_log.clone()),
        ));
        Box::new(serial)
    };

    let mut engine = DecisionLoop::new(config.clone(), actuator, Box::new(events))
        .with_crops(Box::new(CropStore::new(dirs.crops_dir(), config.crop_padding)))
        .with_feedback(rx_feedback)
        .with_text_log(text_log);

    let mut frame_capture = config
        .save_frames
        .then(|| FrameCapture::new(dirs.frames_dir(), config.frame_save_every_n));

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Unable to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let summary = replay(&mut engine, reader, frame_capture.as_mut())?;
    info!(
        "📊 Final: {} | frames: {} | skipped lines: {}",
        engine.stats_text(),
        summary.frames,
        summary.skipped
    );

    if let Some(mut reader) = feedback_reader.take() {
        reader.stop();
    }
    info!("✅ System shutdown complete");
    Ok(())
}
