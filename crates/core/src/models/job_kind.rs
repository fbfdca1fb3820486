use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::job::{JobRequest, RUN_KEY};
use crate::{OrchestratorError, OrchestratorResult};

/// 作业类型判别值
///
/// 所有受支持的 `run` 取值的封闭集合，扇出阶段用它来声明分支类型，
/// 避免手写字符串带来的拼写错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Discovery,
    PeerSummary,
    FundReport,
    PeriodAttribution,
}

impl RunKind {
    pub const ALL: [RunKind; 4] = [
        RunKind::Discovery,
        RunKind::PeerSummary,
        RunKind::FundReport,
        RunKind::PeriodAttribution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RunKind::Discovery => "discovery",
            RunKind::PeerSummary => "peer_summary",
            RunKind::FundReport => "fund_report",
            RunKind::PeriodAttribution => "period_attribution",
        }
    }
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunKind {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RunKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| OrchestratorError::InvalidJobParams(format!("未知的作业类型: {s}")))
    }
}

/// 发现作业参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryParams {
    pub as_of_date: NaiveDate,
    #[serde(default)]
    pub scope: Option<String>,
}

/// 同业组汇总作业参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerSummaryParams {
    pub as_of_date: NaiveDate,
    pub peer_group: String,
    #[serde(default)]
    pub scope: Option<String>,
}

/// 单基金报表作业参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundReportParams {
    pub as_of_date: NaiveDate,
    pub fund_name: String,
    /// 未指定时由数据源解析基金所属同业组
    #[serde(default)]
    pub peer_group: Option<String>,
}

/// 区间归因作业参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAttributionParams {
    pub as_of_date: NaiveDate,
    pub period: String,
    #[serde(default)]
    pub scope: Option<String>,
}

/// 强类型的作业描述
///
/// 以 `run` 字段为标签，每个变体携带自己的参数结构。活动通过模式匹配分发，
/// 而不是对字符串做 if/else 比较。
///
/// ```rust
/// use orchestrator_core::models::{JobKind, JobRequest, RunKind};
/// use serde_json::json;
///
/// let request = JobRequest::from_body(json!({
///     "run": "peer_summary",
///     "as_of_date": "2022-03-31",
///     "peer_group": "GCM TMT"
/// })).unwrap();
///
/// let kind = JobKind::from_request(&request).unwrap();
/// assert_eq!(kind.kind(), RunKind::PeerSummary);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "run", rename_all = "snake_case")]
pub enum JobKind {
    Discovery(DiscoveryParams),
    PeerSummary(PeerSummaryParams),
    FundReport(FundReportParams),
    PeriodAttribution(PeriodAttributionParams),
}

impl JobKind {
    /// 从作业请求参数解析作业类型
    pub fn from_request(request: &JobRequest) -> OrchestratorResult<Self> {
        let run = request.run().ok_or_else(|| {
            OrchestratorError::InvalidJobParams(format!("缺少作业类型字段: {RUN_KEY}"))
        })?;
        // 先校验判别值，给出比serde更明确的错误信息
        let kind = RunKind::from_str(run)?;

        serde_json::from_value(Value::Object(request.params.clone())).map_err(|e| {
            OrchestratorError::InvalidJobParams(format!("{kind} 作业参数无效: {e}"))
        })
    }

    pub fn kind(&self) -> RunKind {
        match self {
            JobKind::Discovery(_) => RunKind::Discovery,
            JobKind::PeerSummary(_) => RunKind::PeerSummary,
            JobKind::FundReport(_) => RunKind::FundReport,
            JobKind::PeriodAttribution(_) => RunKind::PeriodAttribution,
        }
    }

    pub fn as_of_date(&self) -> NaiveDate {
        match self {
            JobKind::Discovery(p) => p.as_of_date,
            JobKind::PeerSummary(p) => p.as_of_date,
            JobKind::FundReport(p) => p.as_of_date,
            JobKind::PeriodAttribution(p) => p.as_of_date,
        }
    }

    /// 分支标识，用于日志
    pub fn label(&self) -> String {
        match self {
            JobKind::Discovery(p) => p.scope.clone().unwrap_or_else(|| "all".to_string()),
            JobKind::PeerSummary(p) => p.peer_group.clone(),
            JobKind::FundReport(p) => p.fund_name.clone(),
            JobKind::PeriodAttribution(p) => p.period.clone(),
        }
    }
}
