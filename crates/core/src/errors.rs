use thiserror::Error;
use uuid::Uuid;

/// 编排器错误类型定义
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("发现结果缺少必需的列表: {key}")]
    MissingScopeData { key: String },

    #[error("活动 {activity} 在分支 {branch} 上执行失败: {source}")]
    ActivityFailed {
        activity: String,
        branch: String,
        #[source]
        source: Box<OrchestratorError>,
    },

    #[error("扇出批次 {stage} 失败: {failed}/{total} 个分支失败")]
    BatchFailed {
        stage: String,
        failed: usize,
        total: usize,
        #[source]
        source: Box<OrchestratorError>,
    },

    #[error("活动未注册: {name}")]
    ActivityNotFound { name: String },

    #[error("编排器未注册: {name}")]
    OrchestratorNotFound { name: String },

    #[error("编排实例未找到: {id}")]
    InstanceNotFound { id: Uuid },

    #[error("无效的作业参数: {0}")]
    InvalidJobParams(String),

    #[error("无效的重试策略: {0}")]
    InvalidRetryOptions(String),

    #[error("无效的CRON表达式: {expr} - {message}")]
    InvalidCron { expr: String, message: String },

    #[error("活动执行超时: {activity}")]
    Timeout { activity: String },

    #[error("数据源错误: {0}")]
    DataSource(String),

    #[error("存储错误: {0}")]
    Storage(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("分支已取消")]
    Cancelled,

    #[error("内部错误: {0}")]
    Internal(String),
}

impl OrchestratorError {
    /// 包装活动错误，保留原始错误链
    pub fn activity_failed(
        activity: impl Into<String>,
        branch: impl Into<String>,
        source: OrchestratorError,
    ) -> Self {
        Self::ActivityFailed {
            activity: activity.into(),
            branch: branch.into(),
            source: Box::new(source),
        }
    }

    /// 是否值得按重试策略再次尝试
    ///
    /// 参数校验类和"未找到"类错误重试不会改变结果。
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::MissingScopeData { .. }
            | Self::ActivityNotFound { .. }
            | Self::OrchestratorNotFound { .. }
            | Self::InstanceNotFound { .. }
            | Self::InvalidJobParams(_)
            | Self::InvalidRetryOptions(_)
            | Self::InvalidCron { .. }
            | Self::Configuration(_)
            | Self::Cancelled => false,
            Self::ActivityFailed { source, .. } | Self::BatchFailed { source, .. } => {
                source.is_retryable()
            }
            _ => true,
        }
    }

    /// 把整个错误链展开成一行文本，用于持久化到实例状态
    pub fn chain_message(&self) -> String {
        let mut message = self.to_string();
        let mut current = std::error::Error::source(self);
        while let Some(cause) = current {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(" <- ");
                message.push_str(&text);
            }
            current = std::error::Error::source(cause);
        }
        message
    }
}

/// 统一的Result类型
pub type Result<T> = std::result::Result<T, OrchestratorError>;
