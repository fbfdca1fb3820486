//! # Orchestrator API
//!
//! 编排系统的HTTP触发面，基于Axum构建。
//!
//! ## API 端点
//!
//! - `POST /api/orchestrators/{name}` - 按名称启动编排，返回 202 和状态查询地址
//! - `GET /api/orchestrators` - 已注册的编排器
//! - `GET /api/instances?name=&limit=` - 最近的编排实例
//! - `GET /api/instances/{id}` - 编排实例状态
//! - `GET /health` - 健康检查
//! - `GET /metrics` - Prometheus指标
//!
//! ## 调用示例
//!
//! ```bash
//! curl -X POST http://localhost:8080/api/orchestrators/PerformanceQualityReportOrchestrator \
//!   -H "Content-Type: application/json" \
//!   -d '{"as_of_date": "2022-03-31"}'
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower::ServiceBuilder;

use middleware::{cors_layer, request_logging, trace_layer};
use orchestrator_core::{ApiConfig, OrchestrationClient};
use routes::{create_routes, AppState};

/// 创建完整的API应用
pub fn create_app(
    client: Arc<dyn OrchestrationClient>,
    metrics: Option<PrometheusHandle>,
    api_config: &ApiConfig,
) -> Router {
    let router = create_routes(AppState { client, metrics });

    let router = if api_config.cors_enabled {
        router.layer(cors_layer())
    } else {
        router
    };

    router.layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(axum::middleware::from_fn(request_logging)),
    )
}
