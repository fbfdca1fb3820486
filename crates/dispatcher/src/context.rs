use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use futures::stream::{FuturesUnordered, StreamExt};
use metrics::{counter, histogram};
use serde_json::Value;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};
use uuid::Uuid;

use orchestrator_core::{
    ActivityCall, ActivityRegistry, BatchReport, BranchOutcome, FanOutBatch, JobRequest,
    OrchestratorError, OrchestratorResult, RetryOptions, RunContext, SiblingPolicy,
};

use crate::retry_service::{ActivityRetryService, RetryOutcome};

/// 单次调用的执行记录
struct CallExecution {
    result: OrchestratorResult<Value>,
    attempts: u32,
    duration_ms: u64,
}

/// 编排上下文
///
/// 编排器通过它调用活动：单次调用、带重试的调用，以及在屏障上等待一整批扇出调用。
/// 同时在途的活动调用数受共享信号量限制；每个执行过的批次都会被记录下来，
/// 运行失败时据此保存部分结果。
#[derive(Clone)]
pub struct OrchestrationContext {
    run_context: RunContext,
    activities: Arc<ActivityRegistry>,
    limiter: Arc<Semaphore>,
    sibling_policy: SiblingPolicy,
    reports: Arc<Mutex<Vec<BatchReport>>>,
}

impl OrchestrationContext {
    pub fn new(
        run_context: RunContext,
        activities: Arc<ActivityRegistry>,
        limiter: Arc<Semaphore>,
        sibling_policy: SiblingPolicy,
    ) -> Self {
        Self {
            run_context,
            activities,
            limiter,
            sibling_policy,
            reports: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn instance_id(&self) -> Uuid {
        self.run_context.instance_id
    }

    pub fn as_of_date(&self) -> NaiveDate {
        self.run_context.as_of_date
    }

    pub fn run_context(&self) -> &RunContext {
        &self.run_context
    }

    pub fn sibling_policy(&self) -> SiblingPolicy {
        self.sibling_policy
    }

    /// 调用一次活动，失败即返回
    pub async fn call_activity(&self, name: &str, request: JobRequest) -> OrchestratorResult<Value> {
        let call = ActivityCall::new(branch_label(name, &request), name, request);
        self.execute_call(&call).await.result
    }

    /// 按重试策略调用活动
    pub async fn call_activity_with_retry(
        &self,
        name: &str,
        options: &RetryOptions,
        request: JobRequest,
    ) -> OrchestratorResult<Value> {
        options.validate()?;
        let call = ActivityCall::new(branch_label(name, &request), name, request)
            .with_retry(Some(options.clone()));
        self.execute_call(&call).await.result
    }

    /// 扇出并在屏障上等待全部分支
    ///
    /// 任一分支失败时返回 `BatchFailed`，其错误链指向批次中第一个失败的分支。
    pub async fn task_all(&self, batch: FanOutBatch) -> OrchestratorResult<BatchReport> {
        let stage = batch.stage.clone();
        let (report, first_error) = self.run_batch(batch).await;

        match first_error {
            Some(source) => Err(OrchestratorError::BatchFailed {
                stage,
                failed: report.failed(),
                total: report.total(),
                source: Box::new(source),
            }),
            None => Ok(report),
        }
    }

    /// 扇出并等待全部分支，逐个记录成败，本身不会失败
    pub async fn task_all_settled(&self, batch: FanOutBatch) -> BatchReport {
        self.run_batch(batch).await.0
    }

    /// 已执行批次的报告（按完成顺序）
    pub async fn reports(&self) -> Vec<BatchReport> {
        self.reports.lock().await.clone()
    }

    async fn run_batch(&self, batch: FanOutBatch) -> (BatchReport, Option<OrchestratorError>) {
        let FanOutBatch { stage, calls } = batch;
        let total = calls.len();

        if total == 0 {
            warn!("批次 {} 没有任何分支，直接通过屏障", stage);
        } else {
            info!("批次 {} 扇出 {} 个分支", stage, total);
        }

        let labels: Vec<(String, String)> = calls
            .iter()
            .map(|c| (c.branch.clone(), c.activity.clone()))
            .collect();

        let mut pending = FuturesUnordered::new();
        for (index, call) in calls.into_iter().enumerate() {
            let ctx = self.clone();
            pending.push(async move {
                let execution = ctx.execute_call(&call).await;
                (index, execution)
            });
        }

        let mut slots: Vec<Option<BranchOutcome>> = vec![None; total];
        let mut first_error: Option<(usize, OrchestratorError)> = None;
        let mut cancelled = false;

        while let Some((index, execution)) = pending.next().await {
            let (branch, activity) = &labels[index];
            match execution.result {
                Ok(output) => {
                    slots[index] = Some(BranchOutcome::success(
                        branch.as_str(),
                        activity.as_str(),
                        output,
                        execution.attempts,
                        execution.duration_ms,
                    ));
                }
                Err(error) => {
                    slots[index] = Some(BranchOutcome::failure(
                        branch.as_str(),
                        activity.as_str(),
                        error.chain_message(),
                        execution.attempts,
                        execution.duration_ms,
                    ));

                    if first_error.as_ref().map_or(true, |(i, _)| index < *i) {
                        first_error = Some((index, error));
                    }

                    if self.sibling_policy == SiblingPolicy::CancelOnFailure {
                        cancelled = true;
                        break;
                    }
                }
            }
        }

        // 丢弃未完成的分支即取消它们
        drop(pending);

        let outcomes: Vec<BranchOutcome> = slots
            .into_iter()
            .zip(labels)
            .map(|(slot, (branch, activity))| {
                slot.unwrap_or_else(|| {
                    BranchOutcome::failure(branch, activity, OrchestratorError::Cancelled.to_string(), 0, 0)
                })
            })
            .collect();

        let report = BatchReport { stage, outcomes };

        if report.is_success() {
            info!("批次 {} 全部 {} 个分支完成", report.stage, report.total());
        } else {
            warn!(
                "批次 {} 有 {}/{} 个分支失败{}",
                report.stage,
                report.failed(),
                report.total(),
                if cancelled { "，其余分支已取消" } else { "" }
            );
        }

        self.reports.lock().await.push(report.clone());

        (report, first_error.map(|(_, error)| error))
    }

    async fn execute_call(&self, call: &ActivityCall) -> CallExecution {
        let started = Instant::now();

        let activity = match self.activities.resolve(&call.activity).await {
            Ok(activity) => activity,
            Err(error) => {
                return CallExecution {
                    result: Err(OrchestratorError::activity_failed(
                        call.activity.as_str(),
                        call.branch.as_str(),
                        error,
                    )),
                    attempts: 0,
                    duration_ms: 0,
                }
            }
        };

        debug!("调用活动 {} (分支: {})", call.activity, call.branch);

        let retry = ActivityRetryService::new(call.retry.clone()).with_limiter(self.limiter.clone());
        let RetryOutcome { result, attempts } = retry
            .execute(&call.activity, |_attempt| {
                let activity = activity.clone();
                let run_context = &self.run_context;
                let request = &call.request;
                async move { activity.execute(run_context, request).await }
            })
            .await;

        let duration_ms = started.elapsed().as_millis() as u64;
        let outcome = if result.is_ok() { "success" } else { "failure" };

        counter!(
            "orchestrator_activity_calls_total",
            "activity" => call.activity.clone(),
            "outcome" => outcome
        )
        .increment(1);
        histogram!("orchestrator_activity_duration_ms", "activity" => call.activity.clone())
            .record(duration_ms as f64);

        CallExecution {
            result: result.map_err(|error| {
                OrchestratorError::activity_failed(call.activity.as_str(), call.branch.as_str(), error)
            }),
            attempts,
            duration_ms,
        }
    }
}

/// 单次调用的分支标识：优先使用作业类型
fn branch_label(name: &str, request: &JobRequest) -> String {
    request.run().unwrap_or(name).to_string()
}
