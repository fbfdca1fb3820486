#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use tokio::sync::Semaphore;
use uuid::Uuid;

use orchestrator_core::{
    Activity, ActivityRegistry, DispatcherConfig, EnvironmentProfile, JobRequest,
    OrchestratorError, OrchestratorResult, RunContext, SiblingPolicy,
};
use orchestrator_dispatcher::{register_builtin, OrchestrationContext, OrchestrationRunner, OrchestratorRegistry};
use orchestrator_infrastructure::{InMemoryArtifactStore, InMemoryInstanceStore, StaticDataSource};

const BRANCH_KEYS: [&str; 3] = ["fund_name", "peer_group", "period"];

/// 一次被记录的活动调用
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub run: String,
    pub branch: Option<String>,
    pub params: Map<String, Value>,
}

/// 按脚本返回结果的活动，记录每一次调用
pub struct ScriptedActivity {
    discovery: Value,
    failing: HashSet<String>,
    invalid: HashSet<String>,
    transient: Mutex<HashMap<String, u32>>,
    slow: HashMap<String, Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedActivity {
    pub fn new(discovery: Value) -> Self {
        Self {
            discovery,
            failing: HashSet::new(),
            invalid: HashSet::new(),
            transient: Mutex::new(HashMap::new()),
            slow: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 该分支总是失败
    pub fn failing(mut self, branch: &str) -> Self {
        self.failing.insert(branch.to_string());
        self
    }

    /// 该分支以不可重试的参数错误失败
    pub fn invalid(mut self, branch: &str) -> Self {
        self.invalid.insert(branch.to_string());
        self
    }

    /// 该分支前 `times` 次失败，之后成功
    pub fn transient(self, branch: &str, times: u32) -> Self {
        self.transient
            .lock()
            .unwrap()
            .insert(branch.to_string(), times);
        self
    }

    pub fn slow(mut self, branch: &str, delay: Duration) -> Self {
        self.slow.insert(branch.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, run: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.run == run)
            .collect()
    }
}

#[async_trait]
impl Activity for ScriptedActivity {
    async fn execute(&self, _ctx: &RunContext, request: &JobRequest) -> OrchestratorResult<Value> {
        let run = request.run().unwrap_or_default().to_string();
        let branch = BRANCH_KEYS
            .iter()
            .find_map(|key| request.param_str(key))
            .map(str::to_string);

        self.calls.lock().unwrap().push(RecordedCall {
            run: run.clone(),
            branch: branch.clone(),
            params: request.params.clone(),
        });

        if run == "discovery" {
            return Ok(Value::String(self.discovery.to_string()));
        }

        let Some(branch) = branch else {
            return Err(OrchestratorError::InvalidJobParams("缺少分支参数".into()));
        };

        if let Some(delay) = self.slow.get(&branch) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing.contains(&branch) {
            return Err(OrchestratorError::DataSource(format!("{branch} 数据加载失败")));
        }

        if self.invalid.contains(&branch) {
            return Err(OrchestratorError::InvalidJobParams(format!("{branch} 参数无效")));
        }

        {
            let mut transient = self.transient.lock().unwrap();
            if let Some(remaining) = transient.get_mut(&branch) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(OrchestratorError::Storage(format!("{branch} 暂时不可用")));
                }
            }
        }

        Ok(json!({ "run": run, "branch": branch }))
    }

    fn name(&self) -> &str {
        "ReportActivity"
    }
}

pub fn as_of_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 3, 31).unwrap()
}

pub fn request() -> JobRequest {
    JobRequest::from_body(json!({ "as_of_date": "2022-03-31" })).unwrap()
}

pub async fn context(activity: Arc<ScriptedActivity>, policy: SiblingPolicy) -> OrchestrationContext {
    context_with_permits(activity, policy, 8).await
}

pub async fn context_with_permits(
    activity: Arc<ScriptedActivity>,
    policy: SiblingPolicy,
    permits: usize,
) -> OrchestrationContext {
    let activities = Arc::new(ActivityRegistry::new());
    activities.register(activity).await;

    let run_context = RunContext::new(
        Uuid::new_v4(),
        as_of_date(),
        EnvironmentProfile::default(),
        Arc::new(InMemoryArtifactStore::new()),
        Arc::new(StaticDataSource::default()),
    );

    OrchestrationContext::new(run_context, activities, Arc::new(Semaphore::new(permits)), policy)
}

pub async fn runner(activity: Arc<ScriptedActivity>, policy: SiblingPolicy) -> OrchestrationRunner {
    let activities = Arc::new(ActivityRegistry::new());
    activities.register(activity).await;

    let mut orchestrators = OrchestratorRegistry::new();
    register_builtin(&mut orchestrators);

    let config = DispatcherConfig {
        sibling_policy: policy,
        ..DispatcherConfig::default()
    };

    OrchestrationRunner::new(
        Arc::new(orchestrators),
        activities,
        Arc::new(InMemoryInstanceStore::new()),
        Arc::new(InMemoryArtifactStore::new()),
        Arc::new(StaticDataSource::default()),
        EnvironmentProfile::default(),
        &config,
    )
}
