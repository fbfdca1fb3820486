use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use metrics::counter;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use orchestrator_core::{
    JobRequest, OrchestrationClient, OrchestrationInstance, OrchestratorError,
    OrchestratorResult, TimerConfig, AS_OF_DATE_KEY,
};

use crate::cron_utils::CronScheduler;

/// 触发时间所在月份的上一个月末，月度报表的估值日期
pub fn previous_month_end(now: DateTime<Utc>) -> OrchestratorResult<NaiveDate> {
    now.date_naive()
        .with_day(1)
        .and_then(|first| first.pred_opt())
        .ok_or_else(|| OrchestratorError::Internal(format!("无法计算 {now} 的上月月末")))
}

struct ScheduledTimer {
    orchestrator: String,
    schedule: String,
    cron: CronScheduler,
    last_fired: DateTime<Utc>,
}

/// 定时触发器
///
/// 按配置的cron表达式定期检查，到点后通过编排客户端启动对应编排。
pub struct TimerTrigger {
    client: Arc<dyn OrchestrationClient>,
    timers: Vec<ScheduledTimer>,
    poll_interval: Duration,
}

impl TimerTrigger {
    /// 只加载已启用的定时器；cron无效或编排器未注册时失败
    pub fn new(
        client: Arc<dyn OrchestrationClient>,
        configs: &[TimerConfig],
        poll_interval: Duration,
        started_at: DateTime<Utc>,
    ) -> OrchestratorResult<Self> {
        let known = client.orchestrator_names();
        let mut timers = Vec::new();

        for config in configs.iter().filter(|c| c.enabled) {
            if !known.contains(&config.orchestrator) {
                return Err(OrchestratorError::OrchestratorNotFound {
                    name: config.orchestrator.clone(),
                });
            }

            timers.push(ScheduledTimer {
                orchestrator: config.orchestrator.clone(),
                schedule: config.schedule.clone(),
                cron: CronScheduler::new(&config.schedule)?,
                last_fired: started_at,
            });
        }

        Ok(Self {
            client,
            timers,
            poll_interval,
        })
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// 检查一次，启动所有到点的编排
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Vec<OrchestrationInstance> {
        let mut started = Vec::new();

        for timer in &mut self.timers {
            if !timer.cron.should_trigger(Some(timer.last_fired), now) {
                continue;
            }
            timer.last_fired = now;

            let as_of_date = match previous_month_end(now) {
                Ok(date) => date,
                Err(e) => {
                    error!("定时器 {} 计算估值日期失败: {}", timer.orchestrator, e);
                    continue;
                }
            };

            let mut request = JobRequest::default();
            request.set_param(
                AS_OF_DATE_KEY,
                Value::String(as_of_date.format("%Y-%m-%d").to_string()),
            );

            match self.client.start_new(&timer.orchestrator, request).await {
                Ok(instance) => {
                    info!(
                        "定时器 [{}] 触发编排 {}，实例: {}, 估值日期: {}",
                        timer.schedule, timer.orchestrator, instance.id, as_of_date
                    );
                    counter!(
                        "orchestrator_timer_fires_total",
                        "orchestrator" => timer.orchestrator.clone()
                    )
                    .increment(1);
                    started.push(instance);
                }
                Err(e) => {
                    error!("定时器启动编排 {} 失败: {}", timer.orchestrator, e);
                }
            }
        }

        started
    }

    /// 运行定时循环，直到收到关闭信号
    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(
            "定时触发器启动，共 {} 个定时器，检查间隔 {:?}",
            self.timers.len(),
            self.poll_interval
        );

        let mut interval = tokio::time::interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let started = self.tick(Utc::now()).await;
                    if !started.is_empty() {
                        debug!("本轮定时检查启动了 {} 个编排", started.len());
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("定时触发器收到关闭信号");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_previous_month_end() {
        let now = Utc.with_ymd_and_hms(2022, 4, 1, 6, 0, 0).unwrap();
        assert_eq!(
            previous_month_end(now).unwrap(),
            NaiveDate::from_ymd_opt(2022, 3, 31).unwrap()
        );

        let now = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(
            previous_month_end(now).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );

        let now = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            previous_month_end(now).unwrap(),
            NaiveDate::from_ymd_opt(2022, 12, 31).unwrap()
        );
    }
}
