use serde_json::{json, Value};
use tracing::{info, warn};

use orchestrator_core::{FundReportParams, OrchestratorError, OrchestratorResult, RunContext};

use crate::artifacts::{fund_report_path, peer_inputs_path, read_json, write_json};

/// 单基金报表：读取所属同业组的同业输入，与基金自身数据合并写出
///
/// 没有所属同业组的基金照常出报表，同业部分为空。
pub async fn handle(ctx: &RunContext, params: &FundReportParams) -> OrchestratorResult<Value> {
    let path = fund_report_path(&ctx.profile, &params.fund_name, params.as_of_date)?;

    let record = ctx
        .data_source
        .fund_record(&params.fund_name, params.as_of_date)
        .await?;

    let peer_group = params
        .peer_group
        .clone()
        .or_else(|| record.peer_group.clone());

    let peers = match &peer_group {
        Some(group) => load_peers(ctx, params, group).await?,
        None => {
            warn!("基金 {} 没有所属同业组，报表不含同业对比", params.fund_name);
            Vec::new()
        }
    };

    let document = json!({
        "fund_name": params.fund_name,
        "peer_group": peer_group,
        "as_of_date": params.as_of_date.format("%Y-%m-%d").to_string(),
        "records": record.records,
        "peers": peers,
    });
    write_json(ctx.artifacts.as_ref(), &path, &document).await?;

    info!(
        "基金 {} 报表完成，同业组 {}（{} 个同业），输出: {}",
        params.fund_name,
        peer_group.as_deref().unwrap_or("无"),
        peers.len(),
        path
    );

    Ok(json!({
        "fund_name": params.fund_name,
        "peer_group": peer_group,
        "artifact": path,
    }))
}

async fn load_peers(
    ctx: &RunContext,
    params: &FundReportParams,
    peer_group: &str,
) -> OrchestratorResult<Vec<Value>> {
    let inputs_path = peer_inputs_path(&ctx.profile, peer_group, params.as_of_date)?;
    let peer_inputs = read_json(ctx.artifacts.as_ref(), &inputs_path)
        .await?
        .ok_or_else(|| OrchestratorError::Storage(format!("同业输入不存在: {inputs_path}")))?;

    Ok(peer_inputs
        .get("members")
        .and_then(Value::as_array)
        .map(|members| {
            members
                .iter()
                .filter(|m| m.get("fund_name").and_then(Value::as_str) != Some(params.fund_name.as_str()))
                .cloned()
                .collect()
        })
        .unwrap_or_default())
}
