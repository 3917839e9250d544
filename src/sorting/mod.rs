/// 分拣决策系统 (Sorting Decision Engine)
///
/// 逐帧消费带跟踪ID的检测结果,决定何时触发剔除执行器
/// - TrackRegistry:     跟踪对象注册表
/// - DuplicateFilter:   重复ID过滤
/// - VotingClassifier:  时序多数投票确认类别
/// - EjectionScheduler: 投放区 + 提前量 + 冷却 调度
/// - LifecycleReaper:   过期目标清理
/// - DecisionLoop:      串联以上组件的单线程决策循环
pub mod dedup;
pub mod engine;
pub mod events;
pub mod reaper;
pub mod registry;
pub mod scheduler;
pub mod track;
pub mod voting;

pub use dedup::DuplicateFilter;
pub use engine::{DecisionLoop, FrameReport, SessionStats, SystemStatus};
pub use events::{EventRecord, EventSink, MemorySink, SorterEvent};
pub use reaper::LifecycleReaper;
pub use registry::TrackRegistry;
pub use scheduler::{ArmingZone, Ejection, EjectionScheduler, ScheduleOutcome};
pub use track::Track;
pub use voting::{majority_vote, Verdict, VotingClassifier};
