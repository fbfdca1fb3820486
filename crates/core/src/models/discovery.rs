use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value};

use crate::{OrchestratorError, OrchestratorResult};

/// 发现结果
///
/// 发现作业返回的载荷，包含驱动扇出基数的若干命名列表
/// （如 `fund_names`、`peer_groups`）。每次编排运行只产生一次，之后只读。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryResult {
    lists: BTreeMap<String, Option<Vec<String>>>,
    /// 值不是列表的字段及其JSON类型，只有被当作列表使用时才报错
    scalars: BTreeMap<String, &'static str>,
}

impl DiscoveryResult {
    /// 解析发现载荷
    ///
    /// 载荷可以是JSON编码后的字符串，也可以直接是JSON对象。
    pub fn parse(payload: &Value) -> OrchestratorResult<Self> {
        match payload {
            Value::String(encoded) => {
                let decoded: Value = serde_json::from_str(encoded)?;
                Self::from_object(&decoded)
            }
            other => Self::from_object(other),
        }
    }

    fn from_object(value: &Value) -> OrchestratorResult<Self> {
        let map = value.as_object().ok_or_else(|| {
            OrchestratorError::InvalidJobParams(format!("发现结果必须是JSON对象，实际为: {value}"))
        })?;

        let mut lists = BTreeMap::new();
        let mut scalars = BTreeMap::new();
        for (key, entry) in map {
            match entry {
                Value::Null => {
                    lists.insert(key.clone(), None);
                }
                Value::Array(items) => {
                    lists.insert(key.clone(), Some(Self::collect_ids(key, items)?));
                }
                // 非列表字段（如估值日期）不参与扇出
                other => {
                    scalars.insert(key.clone(), json_type(other));
                }
            }
        }

        Ok(Self { lists, scalars })
    }

    fn collect_ids(key: &str, items: &[Value]) -> OrchestratorResult<Vec<String>> {
        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(items.len());

        for item in items {
            let id = item.as_str().ok_or_else(|| {
                OrchestratorError::InvalidJobParams(format!(
                    "发现结果列表 {key} 只能包含字符串，发现: {item}"
                ))
            })?;
            // 重复标识只保留第一次出现，保证每个分支的标识唯一
            if seen.insert(id.to_string()) {
                ids.push(id.to_string());
            }
        }

        Ok(ids)
    }

    /// 获取必需的列表，缺失或为null时中止整个运行
    ///
    /// 字段存在但不是列表时返回 `InvalidJobParams`。
    pub fn require_list(&self, key: &str) -> OrchestratorResult<&[String]> {
        if let Some(kind) = self.scalars.get(key) {
            return Err(OrchestratorError::InvalidJobParams(format!(
                "发现结果字段 {key} 应为字符串列表，实际为{kind}"
            )));
        }

        self.list(key)
            .ok_or_else(|| OrchestratorError::MissingScopeData {
                key: key.to_string(),
            })
    }

    pub fn list(&self, key: &str) -> Option<&[String]> {
        self.lists
            .get(key)
            .and_then(|list| list.as_deref())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lists.keys().map(String::as_str)
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (key, list) in &self.lists {
            let value = match list {
                Some(items) => Value::from(items.clone()),
                None => Value::Null,
            };
            map.insert(key.clone(), value);
        }
        Value::Object(map)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "布尔值",
        Value::Number(_) => "数字",
        Value::String(_) => "字符串",
        Value::Array(_) => "列表",
        Value::Object(_) => "对象",
    }
}
