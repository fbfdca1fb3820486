pub mod batch;
pub mod context;
pub mod discovery;
pub mod instance;
pub mod job;
pub mod job_kind;
pub mod retry;

pub use batch::{ActivityCall, BatchReport, BranchOutcome, FanOutBatch, RunSummary, SiblingPolicy};
pub use context::{DeployEnvironment, EnvironmentProfile, RunContext, Subscription};
pub use discovery::DiscoveryResult;
pub use instance::{InstanceStatus, OrchestrationInstance};
pub use job::{JobRequest, AS_OF_DATE_KEY, RUN_KEY};
pub use job_kind::{
    DiscoveryParams, FundReportParams, JobKind, PeerSummaryParams, PeriodAttributionParams,
    RunKind,
};
pub use retry::RetryOptions;
