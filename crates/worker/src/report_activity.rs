use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use orchestrator_core::{
    Activity, JobKind, JobRequest, OrchestratorError, OrchestratorResult, RunContext,
    WorkerConfig,
};

use crate::handlers::{discovery, fund_report, peer_summary, period_attribution};

/// 报表活动
///
/// 无状态的工作单元，按请求中的 `run` 分发到具体的作业处理函数。
/// 同样的参数总是写到同样的路径，重复执行会覆盖之前的结果。
#[derive(Debug, Clone)]
pub struct ReportActivity {
    attribution_periods: Vec<String>,
}

impl ReportActivity {
    pub const NAME: &'static str = "ReportActivity";

    pub fn new(attribution_periods: Vec<String>) -> Self {
        Self {
            attribution_periods,
        }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(config.attribution_periods.clone())
    }

    pub fn attribution_periods(&self) -> &[String] {
        &self.attribution_periods
    }
}

impl Default for ReportActivity {
    fn default() -> Self {
        Self::from_config(&WorkerConfig::default())
    }
}

#[async_trait]
impl Activity for ReportActivity {
    async fn execute(&self, ctx: &RunContext, request: &JobRequest) -> OrchestratorResult<Value> {
        let job = JobKind::from_request(request)?;

        if job.as_of_date() != ctx.as_of_date {
            return Err(OrchestratorError::InvalidJobParams(format!(
                "作业估值日期 {} 与运行上下文 {} 不一致",
                job.as_of_date(),
                ctx.as_of_date
            )));
        }

        info!(
            "执行报表作业: instance={}, run={}, branch={}",
            ctx.instance_id,
            job.kind(),
            job.label()
        );

        let output = match &job {
            JobKind::Discovery(params) => {
                discovery::handle(ctx, params, &self.attribution_periods).await
            }
            JobKind::PeerSummary(params) => peer_summary::handle(ctx, params).await,
            JobKind::FundReport(params) => fund_report::handle(ctx, params).await,
            JobKind::PeriodAttribution(params) => {
                period_attribution::handle(ctx, params, &self.attribution_periods).await
            }
        }?;

        debug!("报表作业 {} ({}) 完成", job.kind(), job.label());
        Ok(output)
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "报表发现、同业汇总、基金报表与区间归因"
    }
}
