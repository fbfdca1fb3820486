use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::job_kind::RunKind;
use crate::{OrchestratorError, OrchestratorResult};

/// 作业类型判别字段
pub const RUN_KEY: &str = "run";
/// 估值日期字段，格式 `YYYY-MM-DD`
pub const AS_OF_DATE_KEY: &str = "as_of_date";

/// 作业请求
///
/// 一次编排运行的参数载荷，也是编排器发给活动的调用载荷。
///
/// # 字段说明
///
/// - `params`: 命名参数（`run` 判别字段、`as_of_date`、范围标识等）
/// - `data`: 结果袋，可以为空或部分填充
///
/// 扇出时每个分支都会拿到自己的一份拷贝（见 [`JobRequest::branch`]），
/// 分支之间不共享可变的参数对象。
///
/// # 使用示例
///
/// ```rust
/// use orchestrator_core::models::{JobRequest, RunKind};
/// use serde_json::json;
///
/// let request = JobRequest::from_body(json!({"as_of_date": "2022-03-31"})).unwrap();
/// let branch = request.branch(RunKind::FundReport, "fund_name", &json!("Skye"));
///
/// assert_eq!(branch.run(), Some("fund_report"));
/// assert!(request.run().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl JobRequest {
    pub fn new(params: Map<String, Value>) -> Self {
        Self {
            params,
            data: Map::new(),
        }
    }

    /// 从HTTP请求体构造作业请求
    ///
    /// 支持三种形态：
    /// 1. `null` - 空请求（定时触发没有请求体）
    /// 2. 带 `params` 对象的完整请求 `{"params": {...}, "data": {...}}`
    /// 3. 扁平对象，整体视为 `params`
    pub fn from_body(body: Value) -> OrchestratorResult<Self> {
        match body {
            Value::Null => Ok(Self::default()),
            Value::Object(map) => {
                if matches!(map.get("params"), Some(Value::Object(_))) {
                    serde_json::from_value(Value::Object(map)).map_err(|e| {
                        OrchestratorError::InvalidJobParams(format!("解析作业请求失败: {e}"))
                    })
                } else {
                    Ok(Self::new(map))
                }
            }
            other => Err(OrchestratorError::InvalidJobParams(format!(
                "请求体必须是JSON对象，实际为: {other}"
            ))),
        }
    }

    /// 当前的作业类型判别值
    pub fn run(&self) -> Option<&str> {
        self.param_str(RUN_KEY)
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    /// 解析估值日期
    pub fn as_of_date(&self) -> OrchestratorResult<NaiveDate> {
        let raw = self.param_str(AS_OF_DATE_KEY).ok_or_else(|| {
            OrchestratorError::InvalidJobParams(format!("缺少参数: {AS_OF_DATE_KEY}"))
        })?;

        NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
            OrchestratorError::InvalidJobParams(format!("无效的估值日期 '{raw}': {e}"))
        })
    }

    pub fn set_param(&mut self, key: impl Into<String>, value: Value) {
        self.params.insert(key.into(), value);
    }

    /// 合并参数，新值覆盖旧值
    pub fn merge_params(&mut self, params: Map<String, Value>) {
        for (key, value) in params {
            self.params.insert(key, value);
        }
    }

    /// 拷贝一份并设置作业类型
    pub fn with_run(&self, kind: RunKind) -> Self {
        let mut request = self.clone();
        request.set_param(RUN_KEY, Value::String(kind.as_str().to_string()));
        request
    }

    /// 为一个扇出分支拷贝参数：设置作业类型并注入分支标识
    pub fn branch(&self, kind: RunKind, key: &str, value: &Value) -> Self {
        let mut request = self.with_run(kind);
        request.set_param(key, value.clone());
        request
    }
}
