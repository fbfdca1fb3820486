use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use orchestrator_core::OrchestratorError;
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("编排器错误: {0}")]
    Orchestrator(#[from] OrchestratorError),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("未找到资源")]
    NotFound,

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, String, &'static str) {
        match self {
            ApiError::Orchestrator(OrchestratorError::OrchestratorNotFound { name }) => (
                StatusCode::NOT_FOUND,
                format!("编排器 {name} 不存在"),
                "ORCHESTRATOR_NOT_FOUND",
            ),
            ApiError::Orchestrator(OrchestratorError::InstanceNotFound { id }) => (
                StatusCode::NOT_FOUND,
                format!("编排实例 {id} 不存在"),
                "INSTANCE_NOT_FOUND",
            ),
            ApiError::Orchestrator(OrchestratorError::InvalidJobParams(msg)) => (
                StatusCode::BAD_REQUEST,
                format!("作业参数无效: {msg}"),
                "INVALID_JOB_PARAMS",
            ),
            ApiError::Orchestrator(OrchestratorError::Serialization(e)) => (
                StatusCode::BAD_REQUEST,
                format!("请求体解析失败: {e}"),
                "BAD_REQUEST",
            ),
            ApiError::Orchestrator(other) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                other.chain_message(),
                "ORCHESTRATOR_ERROR",
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                format!("请求参数错误: {msg}"),
                "BAD_REQUEST",
            ),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "请求的资源不存在".to_string(),
                "NOT_FOUND",
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                msg.clone(),
                "INTERNAL_ERROR",
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, code) = self.parts();

        if status.is_server_error() {
            error!("API请求处理失败: {}", message);
        }

        let body = Json(json!({
            "success": false,
            "error": {
                "code": code,
                "message": message,
            },
            "timestamp": chrono::Utc::now(),
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
