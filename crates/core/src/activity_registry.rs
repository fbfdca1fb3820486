use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::{traits::Activity, OrchestratorError, OrchestratorResult};

/// 活动注册表
///
/// 按名称管理可被编排器调用的活动实例。
pub struct ActivityRegistry {
    activities: Arc<RwLock<HashMap<String, Arc<dyn Activity>>>>,
}

/// 活动信息
#[derive(Debug, Clone, Serialize)]
pub struct ActivityInfo {
    pub name: String,
    pub description: String,
    pub healthy: bool,
}

impl ActivityRegistry {
    pub fn new() -> Self {
        Self {
            activities: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 以活动自身的名称注册
    pub async fn register(&self, activity: Arc<dyn Activity>) {
        let mut registry = self.activities.write().await;
        registry.insert(activity.name().to_string(), activity);
    }

    pub async fn register_batch(&self, activities: Vec<Arc<dyn Activity>>) {
        let mut registry = self.activities.write().await;
        for activity in activities {
            registry.insert(activity.name().to_string(), activity);
        }
    }

    pub async fn get(&self, name: &str) -> Option<Arc<dyn Activity>> {
        let registry = self.activities.read().await;
        registry.get(name).cloned()
    }

    /// 获取活动，未注册时返回 `ActivityNotFound`
    pub async fn resolve(&self, name: &str) -> OrchestratorResult<Arc<dyn Activity>> {
        self.get(name)
            .await
            .ok_or_else(|| OrchestratorError::ActivityNotFound {
                name: name.to_string(),
            })
    }

    pub async fn unregister(&self, name: &str) -> bool {
        let mut registry = self.activities.write().await;
        registry.remove(name).is_some()
    }

    pub async fn contains(&self, name: &str) -> bool {
        let registry = self.activities.read().await;
        registry.contains_key(name)
    }

    pub async fn count(&self) -> usize {
        let registry = self.activities.read().await;
        registry.len()
    }

    pub async fn list_activities(&self) -> Vec<String> {
        let registry = self.activities.read().await;
        let mut names: Vec<String> = registry.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn get_all_info(&self) -> Vec<ActivityInfo> {
        let registry = self.activities.read().await;
        let mut infos = Vec::with_capacity(registry.len());

        for activity in registry.values() {
            let healthy = activity.health_check().await.unwrap_or(false);
            infos.push(ActivityInfo {
                name: activity.name().to_string(),
                description: activity.description().to_string(),
                healthy,
            });
        }

        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }
}

impl Default for ActivityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
