use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use orchestrator_core::{
    InstanceStore, OrchestrationInstance, OrchestratorError, OrchestratorResult,
};

/// 内存实例状态存储
///
/// 进程重启后状态丢失，适用于单进程部署和测试。
#[derive(Debug, Clone, Default)]
pub struct InMemoryInstanceStore {
    instances: Arc<RwLock<HashMap<Uuid, OrchestrationInstance>>>,
}

impl InMemoryInstanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.instances.read().await.len()
    }
}

#[async_trait]
impl InstanceStore for InMemoryInstanceStore {
    async fn create(&self, instance: &OrchestrationInstance) -> OrchestratorResult<()> {
        let mut instances = self.instances.write().await;
        if instances.contains_key(&instance.id) {
            return Err(OrchestratorError::Internal(format!(
                "编排实例已存在: {}",
                instance.id
            )));
        }
        instances.insert(instance.id, instance.clone());
        debug!("保存编排实例 {} ({})", instance.id, instance.name);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> OrchestratorResult<Option<OrchestrationInstance>> {
        Ok(self.instances.read().await.get(&id).cloned())
    }

    async fn update(&self, instance: &OrchestrationInstance) -> OrchestratorResult<()> {
        let mut instances = self.instances.write().await;
        match instances.get_mut(&instance.id) {
            Some(existing) => {
                *existing = instance.clone();
                Ok(())
            }
            None => Err(OrchestratorError::InstanceNotFound { id: instance.id }),
        }
    }

    async fn list(
        &self,
        name: Option<&str>,
        limit: usize,
    ) -> OrchestratorResult<Vec<OrchestrationInstance>> {
        let instances = self.instances.read().await;
        let mut matched: Vec<OrchestrationInstance> = instances
            .values()
            .filter(|i| name.map_or(true, |n| i.name == n))
            .cloned()
            .collect();

        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched.truncate(limit);
        Ok(matched)
    }
}
