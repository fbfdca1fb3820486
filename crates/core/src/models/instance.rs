use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::job::JobRequest;

/// 编排实例状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum InstanceStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "RUNNING")]
    Running,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "FAILED")]
    Failed,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Pending => "PENDING",
            InstanceStatus::Running => "RUNNING",
            InstanceStatus::Completed => "COMPLETED",
            InstanceStatus::Failed => "FAILED",
        }
    }
}

/// 编排实例
///
/// 一次编排运行在宿主侧的状态记录，供状态查询接口读取。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationInstance {
    pub id: Uuid,
    pub name: String,
    pub status: InstanceStatus,
    pub input: JobRequest,
    pub output: Option<Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl OrchestrationInstance {
    pub fn new(name: impl Into<String>, input: JobRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            status: InstanceStatus::Pending,
            input,
            output: None,
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status, InstanceStatus::Running)
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            InstanceStatus::Completed | InstanceStatus::Failed
        )
    }

    pub fn is_successful(&self) -> bool {
        matches!(self.status, InstanceStatus::Completed)
    }

    pub fn update_status(&mut self, status: InstanceStatus) {
        self.status = status;
        match status {
            InstanceStatus::Running => {
                if self.started_at.is_none() {
                    self.started_at = Some(Utc::now());
                }
            }
            InstanceStatus::Completed | InstanceStatus::Failed => {
                if self.completed_at.is_none() {
                    self.completed_at = Some(Utc::now());
                }
            }
            InstanceStatus::Pending => {}
        }
    }

    pub fn complete(&mut self, output: Value) {
        self.output = Some(output);
        self.update_status(InstanceStatus::Completed);
    }

    pub fn fail(&mut self, error_message: String, partial_output: Option<Value>) {
        self.error_message = Some(error_message);
        if partial_output.is_some() {
            self.output = partial_output;
        }
        self.update_status(InstanceStatus::Failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_transitions_stamp_times() {
        let mut instance = OrchestrationInstance::new("Test", JobRequest::default());
        assert_eq!(instance.status, InstanceStatus::Pending);
        assert!(instance.started_at.is_none());

        instance.update_status(InstanceStatus::Running);
        assert!(instance.is_running());
        assert!(instance.started_at.is_some());

        instance.complete(json!({"succeeded": true}));
        assert!(instance.is_finished());
        assert!(instance.is_successful());
        assert!(instance.completed_at.is_some());
    }

    #[test]
    fn test_fail_keeps_partial_output() {
        let mut instance = OrchestrationInstance::new("Test", JobRequest::default());
        instance.update_status(InstanceStatus::Running);
        instance.fail("boom".to_string(), Some(json!({"batches": []})));

        assert_eq!(instance.status, InstanceStatus::Failed);
        assert_eq!(instance.error_message.as_deref(), Some("boom"));
        assert!(instance.output.is_some());
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&InstanceStatus::Completed).unwrap(),
            "\"COMPLETED\""
        );
        assert_eq!(InstanceStatus::Failed.as_str(), "FAILED");
    }
}
