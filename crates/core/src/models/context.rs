use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::traits::{ArtifactStore, DataSource};
use crate::OrchestratorError;

/// 部署环境
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployEnvironment {
    #[default]
    Dev,
    Uat,
    Prd,
}

impl DeployEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployEnvironment::Dev => "dev",
            DeployEnvironment::Uat => "uat",
            DeployEnvironment::Prd => "prd",
        }
    }
}

impl FromStr for DeployEnvironment {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(DeployEnvironment::Dev),
            "uat" => Ok(DeployEnvironment::Uat),
            "prd" | "prod" => Ok(DeployEnvironment::Prd),
            _ => Err(OrchestratorError::Configuration(format!(
                "不支持的部署环境: {s}"
            ))),
        }
    }
}

/// 订阅（数据源所在的物理账户）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subscription {
    NonPrd,
    Prd,
}

impl Subscription {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subscription::NonPrd => "nonprd",
            Subscription::Prd => "prd",
        }
    }
}

/// 环境/订阅组合
///
/// 决定数据访问和制品存储解析到哪一组物理端点：
/// `dev`/`nonprd`、`uat`/`nonprd`、`prd`/`prd`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentProfile {
    pub environment: DeployEnvironment,
    pub subscription: Subscription,
}

impl EnvironmentProfile {
    pub fn for_environment(environment: DeployEnvironment) -> Self {
        let subscription = match environment {
            DeployEnvironment::Dev | DeployEnvironment::Uat => Subscription::NonPrd,
            DeployEnvironment::Prd => Subscription::Prd,
        };
        Self {
            environment,
            subscription,
        }
    }

    /// 制品存储路径前缀
    pub fn storage_prefix(&self) -> String {
        format!("{}/{}", self.environment.as_str(), self.subscription.as_str())
    }
}

impl Default for EnvironmentProfile {
    fn default() -> Self {
        Self::for_environment(DeployEnvironment::default())
    }
}

/// 运行上下文
///
/// 显式传递给每个活动调用的不可变上下文，取代全局的"当前运行"状态。
/// 克隆只复制 `Arc` 句柄，兄弟分支共享只读的数据访问与存储句柄。
#[derive(Clone)]
pub struct RunContext {
    pub instance_id: Uuid,
    pub as_of_date: NaiveDate,
    pub profile: EnvironmentProfile,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub data_source: Arc<dyn DataSource>,
}

impl RunContext {
    pub fn new(
        instance_id: Uuid,
        as_of_date: NaiveDate,
        profile: EnvironmentProfile,
        artifacts: Arc<dyn ArtifactStore>,
        data_source: Arc<dyn DataSource>,
    ) -> Self {
        Self {
            instance_id,
            as_of_date,
            profile,
            artifacts,
            data_source,
        }
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("instance_id", &self.instance_id)
            .field("as_of_date", &self.as_of_date)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_subscription_pairs() {
        assert_eq!(
            EnvironmentProfile::for_environment(DeployEnvironment::Dev).storage_prefix(),
            "dev/nonprd"
        );
        assert_eq!(
            EnvironmentProfile::for_environment(DeployEnvironment::Uat).storage_prefix(),
            "uat/nonprd"
        );
        assert_eq!(
            EnvironmentProfile::for_environment(DeployEnvironment::Prd).storage_prefix(),
            "prd/prd"
        );
    }

    #[test]
    fn test_parse_environment() {
        assert_eq!(DeployEnvironment::from_str("UAT").unwrap(), DeployEnvironment::Uat);
        assert_eq!(DeployEnvironment::from_str("prod").unwrap(), DeployEnvironment::Prd);
        assert!(DeployEnvironment::from_str("staging").is_err());
    }
}
