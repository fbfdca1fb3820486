use chrono::{DateTime, Duration, Utc};
use cron::Schedule;
use std::str::FromStr;
use tracing::{debug, warn};

use orchestrator_core::{OrchestratorError, OrchestratorResult};

/// CRON表达式解析和调度工具
#[derive(Debug, Clone)]
pub struct CronScheduler {
    schedule: Schedule,
}

impl CronScheduler {
    pub fn new(cron_expr: &str) -> OrchestratorResult<Self> {
        let schedule =
            Schedule::from_str(cron_expr).map_err(|e| OrchestratorError::InvalidCron {
                expr: cron_expr.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self { schedule })
    }

    /// 检查在 `last_run` 之后、`now` 之前（含）是否有触发点
    pub fn should_trigger(&self, last_run: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        // 从未触发过时只回看一分钟，避免启动时补跑很久以前的触发点
        let check_from = last_run.unwrap_or(now - Duration::minutes(1));

        match self.schedule.after(&check_from).next() {
            Some(next_time) => {
                let should_trigger = next_time <= now;
                if should_trigger {
                    debug!(
                        "定时器应该触发: 起点={}, 触发点={}, 当前时间={}",
                        check_from.format("%Y-%m-%d %H:%M:%S UTC"),
                        next_time.format("%Y-%m-%d %H:%M:%S UTC"),
                        now.format("%Y-%m-%d %H:%M:%S UTC")
                    );
                }
                should_trigger
            }
            None => {
                warn!(
                    "无法计算下一次触发时间，起点: {}",
                    check_from.format("%Y-%m-%d %H:%M:%S UTC")
                );
                false
            }
        }
    }

    pub fn next_execution_time(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&from).next()
    }

    pub fn upcoming_times(&self, from: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        self.schedule.after(&from).take(count).collect()
    }

    pub fn validate_cron_expression(cron_expr: &str) -> OrchestratorResult<()> {
        Self::new(cron_expr).map(|_| ())
    }
}
