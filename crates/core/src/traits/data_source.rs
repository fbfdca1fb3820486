use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::OrchestratorResult;

/// 基金数据记录
///
/// `records` 是不透明的业务数据（按区间标签组织的收益、风险等指标），
/// 编排层只做透传，不解释其含义。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundRecord {
    pub name: String,
    #[serde(default)]
    pub peer_group: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub records: Map<String, Value>,
}

impl FundRecord {
    pub fn in_scope(&self, scope: Option<&str>) -> bool {
        match scope {
            Some(scope) => self.scopes.iter().any(|s| s == scope),
            None => true,
        }
    }
}

/// 数据访问接口
///
/// 对SQL、数据湖等数据源访问的抽象，实际端点由环境配置决定。
#[async_trait]
pub trait DataSource: Send + Sync {
    /// 估值日期下范围内的基金名称
    async fn fund_names(
        &self,
        as_of_date: NaiveDate,
        scope: Option<&str>,
    ) -> OrchestratorResult<Vec<String>>;

    /// 估值日期下范围内的同业组名称
    async fn peer_groups(
        &self,
        as_of_date: NaiveDate,
        scope: Option<&str>,
    ) -> OrchestratorResult<Vec<String>>;

    async fn peer_group_members(
        &self,
        peer_group: &str,
        as_of_date: NaiveDate,
    ) -> OrchestratorResult<Vec<String>>;

    /// 单只基金的数据记录，未知基金返回 `DataSource` 错误
    async fn fund_record(
        &self,
        fund_name: &str,
        as_of_date: NaiveDate,
    ) -> OrchestratorResult<FundRecord>;

    fn name(&self) -> &str {
        "data-source"
    }
}
