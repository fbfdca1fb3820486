//! 报表编排系统的核心类型
//!
//! 包含作业请求、发现结果、重试策略、批次与实例模型，
//! 以及活动、存储、数据源等接口和统一的错误类型。

pub mod activity_registry;
pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use activity_registry::*;
pub use self::config::*;
pub use errors::*;
pub use models::{
    ActivityCall, BatchReport, BranchOutcome, DeployEnvironment, DiscoveryParams,
    DiscoveryResult, EnvironmentProfile, FanOutBatch, FundReportParams, InstanceStatus, JobKind,
    JobRequest, OrchestrationInstance, PeerSummaryParams, PeriodAttributionParams, RetryOptions,
    RunContext, RunKind, RunSummary, SiblingPolicy, Subscription, AS_OF_DATE_KEY, RUN_KEY,
};
pub use traits::{
    Activity, ArtifactStore, DataSource, FundRecord, InstanceStore, OrchestrationClient,
};

/// 统一的Result类型
pub type OrchestratorResult<T> = std::result::Result<T, OrchestratorError>;
