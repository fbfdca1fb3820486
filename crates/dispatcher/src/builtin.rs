//! 内置的报表编排器

use std::sync::Arc;

use orchestrator_core::{RetryOptions, RunKind};

use crate::orchestrator::{FanOutOrchestrator, FanOutStage, OrchestratorRegistry};

/// 报表活动名称
pub const REPORT_ACTIVITY: &str = "ReportActivity";

pub const PERFORMANCE_QUALITY_REPORT: &str = "PerformanceQualityReportOrchestrator";
pub const EOF_RBA_REPORT: &str = "EofRbaReportOrchestrator";

/// 发现调用：单次尝试，最长等待600秒
const DISCOVERY_TIMEOUT_MS: u64 = 600_000;

/// 业绩质量报表
///
/// 先为每个同业组生成同业输入，再为每只基金生成报表。基金报表会读取
/// 同业输入，所以基金阶段必须等同业阶段结束。
pub fn performance_quality_report() -> FanOutOrchestrator {
    FanOutOrchestrator::new(PERFORMANCE_QUALITY_REPORT, REPORT_ACTIVITY)
        .with_discovery_retry(RetryOptions::single_attempt(DISCOVERY_TIMEOUT_MS))
        .stage(FanOutStage::new(
            "peer_groups",
            RunKind::PeerSummary,
            "peer_group",
        ))
        .stage(FanOutStage::new("fund_names", RunKind::FundReport, "fund_name").after_previous())
}

/// 风险预算归因报表，按区间扇出
pub fn eof_rba_report() -> FanOutOrchestrator {
    FanOutOrchestrator::new(EOF_RBA_REPORT, REPORT_ACTIVITY)
        .with_discovery_retry(RetryOptions::single_attempt(DISCOVERY_TIMEOUT_MS))
        .stage(FanOutStage::new(
            "periods",
            RunKind::PeriodAttribution,
            "period",
        ))
}

/// 注册全部内置编排器
pub fn register_builtin(registry: &mut OrchestratorRegistry) {
    registry.register(Arc::new(performance_quality_report()));
    registry.register(Arc::new(eof_rba_report()));
}
