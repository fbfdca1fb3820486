use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use metrics::{counter, histogram};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use uuid::Uuid;

use orchestrator_core::{
    ActivityRegistry, ArtifactStore, DataSource, DispatcherConfig, EnvironmentProfile,
    InstanceStatus, InstanceStore, JobRequest, OrchestrationClient, OrchestrationInstance,
    OrchestratorError, OrchestratorResult, RunContext, RunSummary, SiblingPolicy,
};

use crate::context::OrchestrationContext;
use crate::orchestrator::OrchestratorRegistry;

/// 编排运行器
///
/// 负责实例的生命周期：PENDING → RUNNING → COMPLETED / FAILED。
/// 同一运行器上的所有实例共享一个并发上限。
#[derive(Clone)]
pub struct OrchestrationRunner {
    orchestrators: Arc<OrchestratorRegistry>,
    activities: Arc<ActivityRegistry>,
    store: Arc<dyn InstanceStore>,
    artifacts: Arc<dyn ArtifactStore>,
    data_source: Arc<dyn DataSource>,
    profile: EnvironmentProfile,
    limiter: Arc<Semaphore>,
    sibling_policy: SiblingPolicy,
}

impl OrchestrationRunner {
    pub fn new(
        orchestrators: Arc<OrchestratorRegistry>,
        activities: Arc<ActivityRegistry>,
        store: Arc<dyn InstanceStore>,
        artifacts: Arc<dyn ArtifactStore>,
        data_source: Arc<dyn DataSource>,
        profile: EnvironmentProfile,
        config: &DispatcherConfig,
    ) -> Self {
        Self {
            orchestrators,
            activities,
            store,
            artifacts,
            data_source,
            profile,
            limiter: Arc::new(Semaphore::new(config.max_concurrent_activities.max(1))),
            sibling_policy: config.sibling_policy,
        }
    }

    pub fn profile(&self) -> EnvironmentProfile {
        self.profile
    }

    /// 同步执行一次编排，返回终态实例
    pub async fn run_to_completion(
        &self,
        name: &str,
        request: JobRequest,
    ) -> OrchestratorResult<OrchestrationInstance> {
        let instance = self.create_instance(name, request).await?;
        Ok(self.execute(instance).await)
    }

    async fn create_instance(
        &self,
        name: &str,
        request: JobRequest,
    ) -> OrchestratorResult<OrchestrationInstance> {
        self.orchestrators.resolve(name)?;

        let instance = OrchestrationInstance::new(name, request);
        self.store.create(&instance).await?;
        counter!("orchestrator_instances_started_total", "orchestrator" => name.to_string())
            .increment(1);

        info!("创建编排实例 {} ({})", instance.id, name);
        Ok(instance)
    }

    async fn execute(&self, mut instance: OrchestrationInstance) -> OrchestrationInstance {
        let started = Instant::now();
        instance.update_status(InstanceStatus::Running);
        self.persist(&instance).await;

        let result = self.run_instance(&instance).await;

        match result {
            Ok(summary) => match serde_json::to_value(&summary) {
                Ok(output) => {
                    info!(
                        "编排实例 {} ({}) 完成，共 {} 个分支",
                        instance.id,
                        instance.name,
                        summary.branch_count()
                    );
                    instance.complete(output);
                }
                Err(e) => {
                    let err = OrchestratorError::from(e);
                    error!("编排实例 {} 输出序列化失败: {}", instance.id, err);
                    instance.fail(err.chain_message(), None);
                }
            },
            Err((err, partial)) => {
                let message = err.chain_message();
                error!(
                    "编排实例 {} ({}) 失败: {}",
                    instance.id, instance.name, message
                );
                let partial_output = partial.and_then(|summary| serde_json::to_value(summary).ok());
                instance.fail(message, partial_output);
            }
        }

        self.persist(&instance).await;

        counter!(
            "orchestrator_instances_finished_total",
            "orchestrator" => instance.name.clone(),
            "status" => instance.status.as_str()
        )
        .increment(1);
        histogram!("orchestrator_instance_duration_ms", "orchestrator" => instance.name.clone())
            .record(started.elapsed().as_millis() as f64);

        instance
    }

    /// 失败时连同已完成批次组成的部分结果一起返回
    async fn run_instance(
        &self,
        instance: &OrchestrationInstance,
    ) -> Result<RunSummary, (OrchestratorError, Option<RunSummary>)> {
        let orchestrator = self
            .orchestrators
            .resolve(&instance.name)
            .map_err(|e| (e, None))?;
        let as_of_date = instance.input.as_of_date().map_err(|e| (e, None))?;

        let run_context = RunContext::new(
            instance.id,
            as_of_date,
            self.profile,
            self.artifacts.clone(),
            self.data_source.clone(),
        );
        let ctx = OrchestrationContext::new(
            run_context,
            self.activities.clone(),
            self.limiter.clone(),
            self.sibling_policy,
        );

        match orchestrator.run(&ctx, &instance.input).await {
            Ok(summary) => Ok(summary),
            Err(err) => {
                let partial =
                    RunSummary::new(instance.name.as_str(), instance.id, as_of_date, ctx.reports().await);
                Err((err, Some(partial)))
            }
        }
    }

    async fn persist(&self, instance: &OrchestrationInstance) {
        if let Err(e) = self.store.update(instance).await {
            warn!("更新编排实例 {} 状态失败: {}", instance.id, e);
        }
    }
}

#[async_trait]
impl OrchestrationClient for OrchestrationRunner {
    async fn start_new(
        &self,
        name: &str,
        request: JobRequest,
    ) -> OrchestratorResult<OrchestrationInstance> {
        let instance = self.create_instance(name, request).await?;

        let runner = self.clone();
        let pending = instance.clone();
        tokio::spawn(async move {
            runner.execute(pending).await;
        });

        Ok(instance)
    }

    async fn get_status(&self, id: Uuid) -> OrchestratorResult<OrchestrationInstance> {
        self.store
            .get(id)
            .await?
            .ok_or(OrchestratorError::InstanceNotFound { id })
    }

    async fn list_instances(
        &self,
        name: Option<&str>,
        limit: usize,
    ) -> OrchestratorResult<Vec<OrchestrationInstance>> {
        self.store.list(name, limit).await
    }

    fn orchestrator_names(&self) -> Vec<String> {
        self.orchestrators.names()
    }
}
