use serde::{Deserialize, Serialize};

use crate::models::SiblingPolicy;

fn default_max_concurrent_activities() -> usize {
    16
}

fn default_timer_poll_interval_seconds() -> u64 {
    30
}

fn default_attribution_periods() -> Vec<String> {
    ["MTD", "QTD", "YTD", "1Y"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

/// 编排协调器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// 同时在途的活动调用上限（宿主工作池大小）
    #[serde(default = "default_max_concurrent_activities")]
    pub max_concurrent_activities: usize,
    #[serde(default)]
    pub sibling_policy: SiblingPolicy,
    #[serde(default = "default_timer_poll_interval_seconds")]
    pub timer_poll_interval_seconds: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent_activities: default_max_concurrent_activities(),
            sibling_policy: SiblingPolicy::default(),
            timer_poll_interval_seconds: default_timer_poll_interval_seconds(),
        }
    }
}

impl DispatcherConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_concurrent_activities == 0 {
            return Err(anyhow::anyhow!("最大并发活动数必须大于0"));
        }

        if self.timer_poll_interval_seconds == 0 {
            return Err(anyhow::anyhow!("定时器轮询间隔必须大于0"));
        }

        Ok(())
    }
}

/// 报表活动配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// 归因分析的区间标签，发现阶段原样返回
    #[serde(default = "default_attribution_periods")]
    pub attribution_periods: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            attribution_periods: default_attribution_periods(),
        }
    }
}

impl WorkerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.attribution_periods.is_empty() {
            return Err(anyhow::anyhow!("归因区间列表不能为空"));
        }

        if let Some(period) = self.attribution_periods.iter().find(|p| p.trim().is_empty()) {
            return Err(anyhow::anyhow!("归因区间标签无效: '{}'", period));
        }

        Ok(())
    }
}

/// 定时触发配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub orchestrator: String,
    /// 六段式cron表达式（含秒）
    pub schedule: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl TimerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.orchestrator.trim().is_empty() {
            return Err(anyhow::anyhow!("定时器的编排器名称不能为空"));
        }

        if self.schedule.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "定时器 {} 的cron表达式不能为空",
                self.orchestrator
            ));
        }

        Ok(())
    }
}
