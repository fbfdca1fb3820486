use serde_json::{json, Value};
use tracing::info;

use orchestrator_core::{DiscoveryParams, OrchestratorResult, RunContext};

/// 发现作业：返回驱动扇出的列表
///
/// 结果以JSON编码后的字符串返回，由编排器解析。
pub async fn handle(
    ctx: &RunContext,
    params: &DiscoveryParams,
    periods: &[String],
) -> OrchestratorResult<Value> {
    let scope = params.scope.as_deref();
    let fund_names = ctx.data_source.fund_names(params.as_of_date, scope).await?;
    let peer_groups = ctx.data_source.peer_groups(params.as_of_date, scope).await?;

    info!(
        "发现完成: 估值日期={}, 范围={}, 基金 {} 只, 同业组 {} 个",
        params.as_of_date,
        scope.unwrap_or("all"),
        fund_names.len(),
        peer_groups.len()
    );

    let payload = json!({
        "as_of_date": params.as_of_date.format("%Y-%m-%d").to_string(),
        "fund_names": fund_names,
        "peer_groups": peer_groups,
        "periods": periods,
    });

    Ok(Value::String(payload.to_string()))
}
