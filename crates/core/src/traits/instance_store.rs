use async_trait::async_trait;
use uuid::Uuid;

use crate::models::OrchestrationInstance;
use crate::OrchestratorResult;

/// 编排实例状态存储接口
#[async_trait]
pub trait InstanceStore: Send + Sync {
    async fn create(&self, instance: &OrchestrationInstance) -> OrchestratorResult<()>;

    async fn get(&self, id: Uuid) -> OrchestratorResult<Option<OrchestrationInstance>>;

    /// 整体替换实例记录，实例不存在时返回 `InstanceNotFound`
    async fn update(&self, instance: &OrchestrationInstance) -> OrchestratorResult<()>;

    /// 按创建时间倒序列出实例
    async fn list(
        &self,
        name: Option<&str>,
        limit: usize,
    ) -> OrchestratorResult<Vec<OrchestrationInstance>>;
}
