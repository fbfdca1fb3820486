use serde_json::{json, Value};
use tracing::{info, warn};

use orchestrator_core::{OrchestratorResult, PeerSummaryParams, RunContext};

use crate::artifacts::{peer_inputs_path, write_json};

/// 同业组汇总：收集组内基金的数据记录，写出同业输入
pub async fn handle(ctx: &RunContext, params: &PeerSummaryParams) -> OrchestratorResult<Value> {
    let path = peer_inputs_path(&ctx.profile, &params.peer_group, params.as_of_date)?;

    let members = ctx
        .data_source
        .peer_group_members(&params.peer_group, params.as_of_date)
        .await?;

    let mut records = Vec::with_capacity(members.len());
    for member in &members {
        let record = ctx.data_source.fund_record(member, params.as_of_date).await?;
        if !record.in_scope(params.scope.as_deref()) {
            continue;
        }
        records.push(json!({
            "fund_name": record.name,
            "records": record.records,
        }));
    }

    if records.is_empty() {
        warn!("同业组 {} 没有范围内的成员", params.peer_group);
    }

    let document = json!({
        "peer_group": params.peer_group,
        "as_of_date": params.as_of_date.format("%Y-%m-%d").to_string(),
        "members": records,
    });
    write_json(ctx.artifacts.as_ref(), &path, &document).await?;

    info!(
        "同业组 {} 汇总完成，成员 {} 只，输出: {}",
        params.peer_group,
        records.len(),
        path
    );

    Ok(json!({
        "peer_group": params.peer_group,
        "member_count": records.len(),
        "artifact": path,
    }))
}
