//! 活动（工作单元）接口定义
//!
//! 活动是编排器扇出时实际执行的无状态子作业：
//! - 输入是一份完全解析好的参数映射（带 `run` 判别字段）
//! - 输出是可序列化为JSON的结果，或一个错误
//! - 不感知兄弟分支，也不感知编排器附加的重试策略
//!
//! ## 实现自定义活动
//!
//! ```rust
//! use async_trait::async_trait;
//! use orchestrator_core::{Activity, JobRequest, OrchestratorResult, RunContext};
//! use serde_json::{json, Value};
//!
//! pub struct EchoActivity;
//!
//! #[async_trait]
//! impl Activity for EchoActivity {
//!     async fn execute(&self, _ctx: &RunContext, request: &JobRequest) -> OrchestratorResult<Value> {
//!         Ok(json!({ "echo": request.params }))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "EchoActivity"
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde_json::Value;

use crate::models::{JobRequest, RunContext};
use crate::OrchestratorResult;

/// 活动核心接口
///
/// # 线程安全
///
/// 此trait要求实现 `Send + Sync`，同一个活动实例会被同一批次的多个分支并发调用。
///
/// # 幂等性
///
/// 相同参数的重复调用应当产生相同输出并覆盖同一存储位置。
#[async_trait]
pub trait Activity: Send + Sync {
    /// 执行一次子作业
    ///
    /// # 错误
    ///
    /// * `InvalidJobParams` - 参数缺失或类型不符，不会被重试
    /// * `DataSource` / `Storage` - 外部协作者错误，原样向上传播
    async fn execute(&self, ctx: &RunContext, request: &JobRequest) -> OrchestratorResult<Value>;

    /// 活动名称，编排器按此名称分发调用
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        "Generic activity"
    }

    /// 健康检查
    async fn health_check(&self) -> OrchestratorResult<bool> {
        Ok(true)
    }
}
