use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{JobRequest, OrchestrationInstance};
use crate::OrchestratorResult;

/// 编排客户端接口
///
/// 触发面（HTTP、定时器、命令行）通过它按名称启动编排并查询状态。
#[async_trait]
pub trait OrchestrationClient: Send + Sync {
    /// 按名称启动一次编排，立即返回处于 PENDING 状态的实例
    async fn start_new(
        &self,
        name: &str,
        request: JobRequest,
    ) -> OrchestratorResult<OrchestrationInstance>;

    async fn get_status(&self, id: Uuid) -> OrchestratorResult<OrchestrationInstance>;

    async fn list_instances(
        &self,
        name: Option<&str>,
        limit: usize,
    ) -> OrchestratorResult<Vec<OrchestrationInstance>>;

    /// 已注册的编排器名称
    fn orchestrator_names(&self) -> Vec<String>;
}
