use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{OrchestratorError, OrchestratorResult};

fn default_backoff_coefficient() -> f64 {
    1.0
}

/// 重试策略
///
/// 附加在单次编排器到活动调用上的声明式策略。未附加策略时只尝试一次，
/// 首次失败即为该调用的最终结果。
///
/// # 字段说明
///
/// * `first_retry_interval_ms` - 第一次重试前的等待时间（毫秒）
/// * `max_number_of_attempts` - 最大尝试次数（包含第一次）
/// * `backoff_coefficient` - 指数退避系数，默认1.0即固定间隔
/// * `max_retry_interval_ms` - 重试间隔上限
/// * `jitter_factor` - 重试间隔的随机抖动范围（0.0-1.0）
/// * `attempt_timeout_ms` - 单次尝试的最长等待时间
///
/// # 示例
///
/// ```rust
/// use orchestrator_core::models::RetryOptions;
/// use std::time::Duration;
///
/// let options = RetryOptions::new(1_000, 3).unwrap().with_backoff(2.0);
/// assert_eq!(options.delay_for_retry(1), Duration::from_millis(1_000));
/// assert_eq!(options.delay_for_retry(2), Duration::from_millis(2_000));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryOptions {
    pub first_retry_interval_ms: u64,
    pub max_number_of_attempts: u32,
    #[serde(default = "default_backoff_coefficient")]
    pub backoff_coefficient: f64,
    #[serde(default)]
    pub max_retry_interval_ms: Option<u64>,
    #[serde(default)]
    pub jitter_factor: f64,
    #[serde(default)]
    pub attempt_timeout_ms: Option<u64>,
}

impl RetryOptions {
    /// 创建重试策略并校验
    pub fn new(first_retry_interval_ms: u64, max_number_of_attempts: u32) -> OrchestratorResult<Self> {
        let options = Self {
            first_retry_interval_ms,
            max_number_of_attempts,
            backoff_coefficient: default_backoff_coefficient(),
            max_retry_interval_ms: None,
            jitter_factor: 0.0,
            attempt_timeout_ms: None,
        };
        options.validate()?;
        Ok(options)
    }

    /// 单次长超时尝试
    ///
    /// 对应报表发现调用上观察到的 (600秒, 1次) 策略：不会真正重试，
    /// 等待时间作为单次尝试的超时上限。
    pub fn single_attempt(timeout_ms: u64) -> Self {
        Self {
            first_retry_interval_ms: timeout_ms.max(1),
            max_number_of_attempts: 1,
            backoff_coefficient: default_backoff_coefficient(),
            max_retry_interval_ms: None,
            jitter_factor: 0.0,
            attempt_timeout_ms: Some(timeout_ms.max(1)),
        }
    }

    pub fn with_backoff(mut self, coefficient: f64) -> Self {
        self.backoff_coefficient = coefficient;
        self
    }

    pub fn with_max_retry_interval(mut self, max_ms: u64) -> Self {
        self.max_retry_interval_ms = Some(max_ms);
        self
    }

    pub fn with_jitter(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = jitter_factor;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout_ms: u64) -> Self {
        self.attempt_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn validate(&self) -> OrchestratorResult<()> {
        if self.max_number_of_attempts == 0 {
            return Err(OrchestratorError::InvalidRetryOptions(
                "max_number_of_attempts 必须大于0".to_string(),
            ));
        }
        if self.first_retry_interval_ms == 0 {
            return Err(OrchestratorError::InvalidRetryOptions(
                "first_retry_interval_ms 必须大于0".to_string(),
            ));
        }
        if !self.backoff_coefficient.is_finite() || self.backoff_coefficient < 1.0 {
            return Err(OrchestratorError::InvalidRetryOptions(format!(
                "backoff_coefficient 必须不小于1.0，实际为 {}",
                self.backoff_coefficient
            )));
        }
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(OrchestratorError::InvalidRetryOptions(format!(
                "jitter_factor 必须在0.0到1.0之间，实际为 {}",
                self.jitter_factor
            )));
        }
        if self.attempt_timeout_ms == Some(0) {
            return Err(OrchestratorError::InvalidRetryOptions(
                "attempt_timeout_ms 必须大于0".to_string(),
            ));
        }
        Ok(())
    }

    /// 第n次重试前的等待时间（n从1开始），不含抖动
    pub fn delay_for_retry(&self, retry_number: u32) -> Duration {
        let exponent = retry_number.saturating_sub(1) as i32;
        let base = self.first_retry_interval_ms as f64;
        let mut interval = base * self.backoff_coefficient.powi(exponent);

        if let Some(max_ms) = self.max_retry_interval_ms {
            interval = interval.min(max_ms as f64);
        }

        Duration::from_millis(interval as u64)
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_ms.map(Duration::from_millis)
    }
}
