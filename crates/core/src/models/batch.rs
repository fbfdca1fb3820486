use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::job::JobRequest;
use super::retry::RetryOptions;

/// 一次待分发的活动调用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityCall {
    /// 分支标识（基金名、同业组名、区间标签等）
    pub branch: String,
    pub activity: String,
    pub request: JobRequest,
    #[serde(default)]
    pub retry: Option<RetryOptions>,
}

impl ActivityCall {
    pub fn new(branch: impl Into<String>, activity: impl Into<String>, request: JobRequest) -> Self {
        Self {
            branch: branch.into(),
            activity: activity.into(),
            request,
            retry: None,
        }
    }

    pub fn with_retry(mut self, retry: Option<RetryOptions>) -> Self {
        self.retry = retry;
        self
    }
}

/// 扇出批次
///
/// 一起分发的一组活动调用，编排器在屏障上等待全部完成。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FanOutBatch {
    pub stage: String,
    pub calls: Vec<ActivityCall>,
}

impl FanOutBatch {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            calls: Vec::new(),
        }
    }

    pub fn push(&mut self, call: ActivityCall) {
        self.calls.push(call);
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// 兄弟分支失败时的处理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiblingPolicy {
    /// 等待已分发的兄弟分支跑完，再让屏障失败
    #[default]
    Drain,
    /// 第一个失败出现时丢弃仍在运行的兄弟分支
    CancelOnFailure,
}

/// 单个分支的执行结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchOutcome {
    pub branch: String,
    pub activity: String,
    pub succeeded: bool,
    pub output: Option<Value>,
    pub error_message: Option<String>,
    pub attempts: u32,
    pub duration_ms: u64,
}

impl BranchOutcome {
    pub fn success(
        branch: impl Into<String>,
        activity: impl Into<String>,
        output: Value,
        attempts: u32,
        duration_ms: u64,
    ) -> Self {
        Self {
            branch: branch.into(),
            activity: activity.into(),
            succeeded: true,
            output: Some(output),
            error_message: None,
            attempts,
            duration_ms,
        }
    }

    pub fn failure(
        branch: impl Into<String>,
        activity: impl Into<String>,
        error_message: String,
        attempts: u32,
        duration_ms: u64,
    ) -> Self {
        Self {
            branch: branch.into(),
            activity: activity.into(),
            succeeded: false,
            output: None,
            error_message: Some(error_message),
            attempts,
            duration_ms,
        }
    }
}

/// 一个扇出批次的汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub stage: String,
    pub outcomes: Vec<BranchOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded).count()
    }

    pub fn succeeded(&self) -> usize {
        self.total() - self.failed()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.succeeded)
    }

    pub fn failures(&self) -> impl Iterator<Item = &BranchOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded)
    }
}

/// 编排运行的显式输出
///
/// 部分成功也能表达：每个批次都记录了各分支的成功/失败与原因。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub orchestrator: String,
    pub instance_id: Uuid,
    pub as_of_date: NaiveDate,
    pub batches: Vec<BatchReport>,
    pub succeeded: bool,
}

impl RunSummary {
    pub fn new(
        orchestrator: impl Into<String>,
        instance_id: Uuid,
        as_of_date: NaiveDate,
        batches: Vec<BatchReport>,
    ) -> Self {
        let succeeded = batches.iter().all(BatchReport::is_success);
        Self {
            orchestrator: orchestrator.into(),
            instance_id,
            as_of_date,
            batches,
            succeeded,
        }
    }

    pub fn branch_count(&self) -> usize {
        self.batches.iter().map(BatchReport::total).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.batches.iter().map(BatchReport::failed).sum()
    }
}
