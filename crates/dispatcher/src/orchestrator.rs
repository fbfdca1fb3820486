use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{join_all, try_join_all};
use serde_json::Value;
use tracing::{info, warn};

use orchestrator_core::{
    ActivityCall, DiscoveryResult, FanOutBatch, JobRequest, OrchestratorError,
    OrchestratorResult, RetryOptions, RunKind, RunSummary, SiblingPolicy,
};

use crate::context::OrchestrationContext;

/// 编排器接口
///
/// 一个编排器描述一类作业的调用顺序：先发现，再扇出，最后在屏障上汇合。
#[async_trait]
pub trait Orchestrator: Send + Sync {
    fn name(&self) -> &str;

    async fn run(
        &self,
        ctx: &OrchestrationContext,
        request: &JobRequest,
    ) -> OrchestratorResult<RunSummary>;
}

/// 扇出阶段定义
#[derive(Debug, Clone, PartialEq)]
pub struct FanOutStage {
    /// 发现结果中的列表键，如 `fund_names`
    pub list_key: String,
    pub run: RunKind,
    /// 分支参数名，如 `fund_name`
    pub param_key: String,
    pub retry: Option<RetryOptions>,
    /// 为真时等待前面所有阶段完成后才开始
    pub after_previous: bool,
}

impl FanOutStage {
    pub fn new(list_key: impl Into<String>, run: RunKind, param_key: impl Into<String>) -> Self {
        Self {
            list_key: list_key.into(),
            run,
            param_key: param_key.into(),
            retry: None,
            after_previous: false,
        }
    }

    pub fn after_previous(mut self) -> Self {
        self.after_previous = true;
        self
    }

    pub fn with_retry(mut self, retry: RetryOptions) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn stage_name(&self) -> &'static str {
        self.run.as_str()
    }
}

/// 通用的两阶段扇出编排器
///
/// 1. 以 `run=discovery` 调用入口活动，解析出动态列表
/// 2. 在分发任何调用之前解析所有阶段需要的列表
/// 3. 按阶段扇出，每个阶段自成屏障；`after_previous` 的阶段开启新的一波
///
/// `CancelOnFailure` 策略下，某个批次失败会同时取消同一波中仍在执行的其他批次。
#[derive(Debug, Clone)]
pub struct FanOutOrchestrator {
    name: String,
    activity: String,
    discovery_retry: Option<RetryOptions>,
    stages: Vec<FanOutStage>,
}

impl FanOutOrchestrator {
    pub fn new(name: impl Into<String>, activity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            activity: activity.into(),
            discovery_retry: None,
            stages: Vec::new(),
        }
    }

    pub fn with_discovery_retry(mut self, retry: RetryOptions) -> Self {
        self.discovery_retry = Some(retry);
        self
    }

    pub fn stage(mut self, stage: FanOutStage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn activity(&self) -> &str {
        &self.activity
    }

    pub fn stages(&self) -> &[FanOutStage] {
        &self.stages
    }

    /// 根据发现结果构造全部批次，按波次分组
    ///
    /// 任一阶段的列表缺失都会在构造阶段失败，保证缺数据时不会分发任何调用。
    pub fn plan_waves(
        &self,
        request: &JobRequest,
        discovery: &DiscoveryResult,
    ) -> OrchestratorResult<Vec<Vec<FanOutBatch>>> {
        let mut resolved = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            resolved.push((stage, discovery.require_list(&stage.list_key)?));
        }

        let mut waves: Vec<Vec<FanOutBatch>> = Vec::new();
        for (stage, items) in resolved {
            let mut batch = FanOutBatch::new(stage.stage_name());
            for item in items {
                let value = Value::String(item.clone());
                let branch_request = request.branch(stage.run, &stage.param_key, &value);
                batch.push(
                    ActivityCall::new(item.as_str(), self.activity.as_str(), branch_request)
                        .with_retry(stage.retry.clone()),
                );
            }

            match waves.last_mut() {
                Some(wave) if !stage.after_previous => wave.push(batch),
                _ => waves.push(vec![batch]),
            }
        }

        Ok(waves)
    }
}

#[async_trait]
impl Orchestrator for FanOutOrchestrator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        ctx: &OrchestrationContext,
        request: &JobRequest,
    ) -> OrchestratorResult<RunSummary> {
        let as_of_date = request.as_of_date()?;
        if as_of_date != ctx.as_of_date() {
            return Err(OrchestratorError::InvalidJobParams(format!(
                "as_of_date {} 与运行上下文 {} 不一致",
                as_of_date,
                ctx.as_of_date()
            )));
        }

        info!(
            "编排器 {} 开始发现阶段，实例: {}, 估值日期: {}",
            self.name,
            ctx.instance_id(),
            as_of_date
        );

        let discovery_request = request.with_run(RunKind::Discovery);
        let payload = match &self.discovery_retry {
            Some(retry) => {
                ctx.call_activity_with_retry(&self.activity, retry, discovery_request)
                    .await?
            }
            None => ctx.call_activity(&self.activity, discovery_request).await?,
        };
        let discovery = DiscoveryResult::parse(&payload)?;

        let waves = self.plan_waves(request, &discovery)?;
        info!(
            "编排器 {} 发现完成，共 {} 波 {} 个批次",
            self.name,
            waves.len(),
            waves.iter().map(Vec::len).sum::<usize>()
        );

        for (index, wave) in waves.into_iter().enumerate() {
            let batches = wave.into_iter().map(|batch| ctx.task_all(batch));
            let result = match ctx.sibling_policy() {
                SiblingPolicy::CancelOnFailure => try_join_all(batches).await.map(drop),
                SiblingPolicy::Drain => join_all(batches)
                    .await
                    .into_iter()
                    .collect::<OrchestratorResult<Vec<_>>>()
                    .map(drop),
            };

            if let Err(error) = result {
                warn!("编排器 {} 第 {} 波失败，后续阶段不再执行", self.name, index + 1);
                return Err(error);
            }
        }

        let summary = RunSummary::new(
            self.name.as_str(),
            ctx.instance_id(),
            as_of_date,
            ctx.reports().await,
        );

        info!(
            "编排器 {} 完成，共 {} 个分支",
            self.name,
            summary.branch_count()
        );

        Ok(summary)
    }
}

/// 编排器注册表
#[derive(Default)]
pub struct OrchestratorRegistry {
    orchestrators: HashMap<String, Arc<dyn Orchestrator>>,
}

impl OrchestratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以编排器自身的名称注册
    pub fn register(&mut self, orchestrator: Arc<dyn Orchestrator>) {
        self.orchestrators
            .insert(orchestrator.name().to_string(), orchestrator);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Orchestrator>> {
        self.orchestrators.get(name).cloned()
    }

    /// 获取编排器，未注册时返回 `OrchestratorNotFound`
    pub fn resolve(&self, name: &str) -> OrchestratorResult<Arc<dyn Orchestrator>> {
        self.get(name)
            .ok_or_else(|| OrchestratorError::OrchestratorNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.orchestrators.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.orchestrators.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.orchestrators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orchestrators.is_empty()
    }
}
