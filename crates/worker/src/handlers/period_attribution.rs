use serde_json::{json, Value};
use tracing::info;

use orchestrator_core::{OrchestratorError, OrchestratorResult, PeriodAttributionParams, RunContext};

use crate::artifacts::{attribution_path, write_json};

/// 区间归因：汇总范围内每只基金在该区间的记录
pub async fn handle(
    ctx: &RunContext,
    params: &PeriodAttributionParams,
    periods: &[String],
) -> OrchestratorResult<Value> {
    if !periods.iter().any(|p| p == &params.period) {
        return Err(OrchestratorError::InvalidJobParams(format!(
            "未配置的归因区间: {}，支持: {:?}",
            params.period, periods
        )));
    }

    let path = attribution_path(&ctx.profile, &params.period, params.as_of_date)?;

    let fund_names = ctx
        .data_source
        .fund_names(params.as_of_date, params.scope.as_deref())
        .await?;

    let mut funds = Vec::new();
    let mut missing = Vec::new();
    for fund_name in &fund_names {
        let record = ctx.data_source.fund_record(fund_name, params.as_of_date).await?;
        match record.records.get(&params.period) {
            Some(value) => funds.push(json!({ "fund_name": fund_name, "record": value })),
            None => missing.push(fund_name.clone()),
        }
    }

    let document = json!({
        "period": params.period,
        "as_of_date": params.as_of_date.format("%Y-%m-%d").to_string(),
        "funds": funds,
        "missing": missing,
    });
    write_json(ctx.artifacts.as_ref(), &path, &document).await?;

    info!(
        "区间 {} 归因完成，基金 {} 只（缺少记录 {} 只），输出: {}",
        params.period,
        funds.len(),
        missing.len(),
        path
    );

    Ok(json!({
        "period": params.period,
        "fund_count": funds.len(),
        "artifact": path,
    }))
}
