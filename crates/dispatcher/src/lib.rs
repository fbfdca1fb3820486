//! 编排协调层
//!
//! 发现 → 扇出 → 屏障汇合的编排执行：
//! - [`OrchestrationContext`]：活动调用、重试与屏障
//! - [`FanOutOrchestrator`]：可复用的两阶段扇出编排
//! - [`OrchestrationRunner`]：实例生命周期，实现 `OrchestrationClient`
//! - [`TimerTrigger`]：按cron定时启动编排

pub mod builtin;
pub mod context;
pub mod cron_utils;
pub mod orchestrator;
pub mod retry_service;
pub mod runner;
pub mod timer;

pub use builtin::*;
pub use context::OrchestrationContext;
pub use cron_utils::CronScheduler;
pub use orchestrator::{FanOutOrchestrator, FanOutStage, Orchestrator, OrchestratorRegistry};
pub use retry_service::{ActivityRetryService, RetryOutcome};
pub use runner::OrchestrationRunner;
pub use timer::{previous_month_end, TimerTrigger};
