use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use orchestrator_core::{InstanceStatus, JobRequest, OrchestrationInstance};

use crate::{
    error::{ApiError, ApiResult},
    response::success,
    routes::AppState,
};

const DEFAULT_LIST_LIMIT: usize = 20;
const MAX_LIST_LIMIT: usize = 100;

/// 启动编排后返回给调用方的状态查询信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckStatusResponse {
    pub id: Uuid,
    pub name: String,
    pub status: InstanceStatus,
    pub status_query_get_uri: String,
}

impl CheckStatusResponse {
    fn from_instance(instance: &OrchestrationInstance) -> Self {
        Self {
            id: instance.id,
            name: instance.name.clone(),
            status: instance.status,
            status_query_get_uri: status_uri(instance.id),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct InstanceQuery {
    pub name: Option<String>,
    pub limit: Option<usize>,
}

fn status_uri(id: Uuid) -> String {
    format!("/api/instances/{id}")
}

/// 解析请求体，空请求体视为无参数
fn parse_body(body: &[u8]) -> ApiResult<JobRequest> {
    let value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("请求体不是合法的JSON: {e}")))?
    };

    Ok(JobRequest::from_body(value)?)
}

/// 按名称启动编排
///
/// 立即返回 202，编排在后台执行，调用方通过 `Location` 轮询状态。
pub async fn start_orchestration(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let request = parse_body(&body)?;
    let instance = state.client.start_new(&name, request).await?;

    info!("已通过HTTP启动编排 {}: {}", name, instance.id);

    let payload = CheckStatusResponse::from_instance(&instance);
    Ok((
        StatusCode::ACCEPTED,
        [(header::LOCATION, payload.status_query_get_uri.clone())],
        Json(payload),
    ))
}

pub async fn list_orchestrators(State(state): State<AppState>) -> impl IntoResponse {
    success(state.client.orchestrator_names())
}

pub async fn list_instances(
    State(state): State<AppState>,
    Query(query): Query<InstanceQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let instances = state
        .client
        .list_instances(query.name.as_deref(), limit)
        .await?;

    Ok(success(instances))
}

pub async fn get_instance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest(format!("无效的实例ID: {id}")))?;

    let instance = state.client.get_status(id).await?;
    Ok(success(instance))
}
