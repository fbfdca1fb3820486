use chrono::NaiveDate;
use serde_json::Value;

use orchestrator_core::{ArtifactStore, EnvironmentProfile, OrchestratorError, OrchestratorResult};

/// 校验用于拼接制品路径的标识符
///
/// 基金名、同业组名等会直接出现在文件名里，不允许包含路径分隔符或 `..`。
pub fn sanitize_identifier<'a>(field: &str, value: &'a str) -> OrchestratorResult<&'a str> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(OrchestratorError::InvalidJobParams(format!("{field} 不能为空")));
    }

    if trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.contains("..")
        || trimmed.chars().any(char::is_control)
    {
        return Err(OrchestratorError::InvalidJobParams(format!(
            "{field} 包含非法字符: {value}"
        )));
    }

    Ok(trimmed)
}

fn date_stamp(as_of_date: NaiveDate) -> String {
    as_of_date.format("%Y-%m-%d").to_string()
}

pub fn peer_inputs_path(
    profile: &EnvironmentProfile,
    peer_group: &str,
    as_of_date: NaiveDate,
) -> OrchestratorResult<String> {
    let peer_group = sanitize_identifier("peer_group", peer_group)?;
    Ok(format!(
        "{}/peer_inputs/{}_peer_inputs_{}.json",
        profile.storage_prefix(),
        peer_group,
        date_stamp(as_of_date)
    ))
}

pub fn fund_report_path(
    profile: &EnvironmentProfile,
    fund_name: &str,
    as_of_date: NaiveDate,
) -> OrchestratorResult<String> {
    let fund_name = sanitize_identifier("fund_name", fund_name)?;
    Ok(format!(
        "{}/fund_reports/{}_report_{}.json",
        profile.storage_prefix(),
        fund_name,
        date_stamp(as_of_date)
    ))
}

pub fn attribution_path(
    profile: &EnvironmentProfile,
    period: &str,
    as_of_date: NaiveDate,
) -> OrchestratorResult<String> {
    let period = sanitize_identifier("period", period)?;
    Ok(format!(
        "{}/attribution/attribution_{}_{}.json",
        profile.storage_prefix(),
        period,
        date_stamp(as_of_date)
    ))
}

pub async fn write_json(
    store: &dyn ArtifactStore,
    path: &str,
    document: &Value,
) -> OrchestratorResult<()> {
    let content = serde_json::to_vec_pretty(document)?;
    store.put(path, content).await
}

/// 读取JSON制品，不存在时返回 `None`
pub async fn read_json(store: &dyn ArtifactStore, path: &str) -> OrchestratorResult<Option<Value>> {
    match store.get(path).await? {
        Some(content) => Ok(Some(serde_json::from_slice(&content)?)),
        None => Ok(None),
    }
}
