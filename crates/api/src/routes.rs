use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use orchestrator_core::OrchestrationClient;

use crate::handlers::{
    health::health_check,
    metrics::render_metrics,
    orchestrations::{get_instance, list_instances, list_orchestrators, start_orchestration},
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn OrchestrationClient>,
    pub metrics: Option<PrometheusHandle>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 健康检查与指标
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        // 编排触发
        .route("/api/orchestrators", get(list_orchestrators))
        .route("/api/orchestrators/{name}", post(start_orchestration))
        // 实例状态
        .route("/api/instances", get(list_instances))
        .route("/api/instances/{id}", get(get_instance))
        .with_state(state)
}
