use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use orchestrator_core::{DataSource, FundRecord, OrchestratorError, OrchestratorResult};

/// 基金数据集
///
/// ```json
/// {"funds": [{"name": "Skye", "peer_group": "GCM TMT", "scopes": ["performance_quality"], "records": {}}]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    #[serde(default)]
    pub funds: Vec<FundRecord>,
}

/// 静态数据源
///
/// 数据来自JSON文件或程序构造，不随估值日期变化。
#[derive(Debug, Clone, Default)]
pub struct StaticDataSource {
    funds: Vec<FundRecord>,
}

impl StaticDataSource {
    pub fn new(universe: Universe) -> Self {
        Self {
            funds: universe.funds,
        }
    }

    pub fn from_json_str(json: &str) -> OrchestratorResult<Self> {
        let universe: Universe = serde_json::from_str(json)?;
        Ok(Self::new(universe))
    }

    /// 从JSON文件加载数据集
    pub async fn load(path: impl AsRef<Path>) -> OrchestratorResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            OrchestratorError::DataSource(format!("读取数据集文件 {} 失败: {e}", path.display()))
        })?;

        let source = Self::from_json_str(&content)?;
        info!(
            "从 {} 加载数据集，共 {} 只基金",
            path.display(),
            source.funds.len()
        );
        Ok(source)
    }

    /// 追加一只基金
    pub fn with_fund(
        mut self,
        name: impl Into<String>,
        peer_group: Option<&str>,
        scopes: &[&str],
    ) -> Self {
        self.funds.push(FundRecord {
            name: name.into(),
            peer_group: peer_group.map(str::to_string),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            records: Map::new(),
        });
        self
    }

    /// 为已有基金设置一条区间记录
    pub fn with_record(mut self, fund_name: &str, period: impl Into<String>, value: Value) -> Self {
        if let Some(fund) = self.funds.iter_mut().find(|f| f.name == fund_name) {
            fund.records.insert(period.into(), value);
        }
        self
    }

    pub fn fund_count(&self) -> usize {
        self.funds.len()
    }

    pub fn fund_peer_group(&self, fund_name: &str) -> Option<String> {
        self.find(fund_name).and_then(|f| f.peer_group.clone())
    }

    fn find(&self, fund_name: &str) -> Option<&FundRecord> {
        self.funds.iter().find(|f| f.name == fund_name)
    }
}

#[async_trait]
impl DataSource for StaticDataSource {
    async fn fund_names(
        &self,
        _as_of_date: NaiveDate,
        scope: Option<&str>,
    ) -> OrchestratorResult<Vec<String>> {
        Ok(self
            .funds
            .iter()
            .filter(|f| f.in_scope(scope))
            .map(|f| f.name.clone())
            .collect())
    }

    async fn peer_groups(
        &self,
        _as_of_date: NaiveDate,
        scope: Option<&str>,
    ) -> OrchestratorResult<Vec<String>> {
        let mut seen = HashSet::new();
        Ok(self
            .funds
            .iter()
            .filter(|f| f.in_scope(scope))
            .filter_map(|f| f.peer_group.clone())
            .filter(|group| seen.insert(group.clone()))
            .collect())
    }

    async fn peer_group_members(
        &self,
        peer_group: &str,
        _as_of_date: NaiveDate,
    ) -> OrchestratorResult<Vec<String>> {
        Ok(self
            .funds
            .iter()
            .filter(|f| f.peer_group.as_deref() == Some(peer_group))
            .map(|f| f.name.clone())
            .collect())
    }

    async fn fund_record(
        &self,
        fund_name: &str,
        _as_of_date: NaiveDate,
    ) -> OrchestratorResult<FundRecord> {
        self.find(fund_name)
            .cloned()
            .ok_or_else(|| OrchestratorError::DataSource(format!("未知基金: {fund_name}")))
    }

    fn name(&self) -> &str {
        "static"
    }
}
