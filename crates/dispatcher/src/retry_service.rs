use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use orchestrator_core::{OrchestratorError, OrchestratorResult, RetryOptions};

/// 一次带重试的调用结果
#[derive(Debug)]
pub struct RetryOutcome {
    pub result: OrchestratorResult<Value>,
    /// 实际尝试次数
    pub attempts: u32,
}

/// 活动调用的重试服务
///
/// 未附加重试策略时只尝试一次。每次尝试可选地受 `attempt_timeout_ms` 限制，
/// 不可重试的错误（参数校验、未找到等）立即返回，不消耗剩余次数。
/// 配置了并发限制时，每次尝试先取得许可再开始计时，重试等待期间不占用许可。
#[derive(Debug, Clone, Default)]
pub struct ActivityRetryService {
    options: Option<RetryOptions>,
    limiter: Option<Arc<Semaphore>>,
}

impl ActivityRetryService {
    pub fn new(options: Option<RetryOptions>) -> Self {
        Self {
            options,
            limiter: None,
        }
    }

    pub fn with_limiter(mut self, limiter: Arc<Semaphore>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    async fn acquire(&self) -> OrchestratorResult<Option<OwnedSemaphorePermit>> {
        match &self.limiter {
            Some(limiter) => limiter
                .clone()
                .acquire_owned()
                .await
                .map(Some)
                .map_err(|_| OrchestratorError::Cancelled),
            None => Ok(None),
        }
    }

    pub fn options(&self) -> Option<&RetryOptions> {
        self.options.as_ref()
    }

    pub fn max_attempts(&self) -> u32 {
        self.options
            .as_ref()
            .map(|o| o.max_number_of_attempts.max(1))
            .unwrap_or(1)
    }

    /// 计算第n次重试前的等待时间（含随机抖动）
    pub fn calculate_retry_delay(&self, retry_number: u32) -> Duration {
        let Some(options) = &self.options else {
            return Duration::ZERO;
        };

        let base = options.delay_for_retry(retry_number).as_millis() as f64;
        // 加入随机抖动，避免同一批次的分支同时重试
        let jitter = base * options.jitter_factor * (rand::random::<f64>() - 0.5) * 2.0;
        let final_ms = (base + jitter).max(0.0);

        Duration::from_millis(final_ms as u64)
    }

    /// 判断第 `attempt` 次尝试失败后是否还应重试
    pub fn should_retry(&self, error: &OrchestratorError, attempt: u32) -> bool {
        attempt < self.max_attempts() && error.is_retryable()
    }

    /// 按策略执行调用，`attempt_fn` 的参数是从1开始的尝试序号
    pub async fn execute<F, Fut>(&self, activity: &str, mut attempt_fn: F) -> RetryOutcome
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = OrchestratorResult<Value>>,
    {
        let timeout = self.options.as_ref().and_then(RetryOptions::attempt_timeout);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = match self.acquire().await {
                Ok(_permit) => match timeout {
                    Some(limit) => match tokio::time::timeout(limit, attempt_fn(attempt)).await {
                        Ok(result) => result,
                        Err(_) => Err(OrchestratorError::Timeout {
                            activity: activity.to_string(),
                        }),
                    },
                    None => attempt_fn(attempt).await,
                },
                Err(error) => Err(error),
            };

            match result {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("活动 {} 在第 {} 次尝试时成功", activity, attempt);
                    }
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: attempt,
                    };
                }
                Err(error) if self.should_retry(&error, attempt) => {
                    let delay = self.calculate_retry_delay(attempt);
                    warn!(
                        "活动 {} 第 {}/{} 次尝试失败: {}，{}ms 后重试",
                        activity,
                        attempt,
                        self.max_attempts(),
                        error,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    if !error.is_retryable() && attempt < self.max_attempts() {
                        debug!("活动 {} 的错误不可重试: {}", activity, error);
                    }
                    return RetryOutcome {
                        result: Err(error),
                        attempts: attempt,
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_max_attempts_defaults_to_one() {
        let service = ActivityRetryService::new(None);
        assert_eq!(service.max_attempts(), 1);
        assert_eq!(service.calculate_retry_delay(1), Duration::ZERO);
    }

    #[test]
    fn test_retry_delay_with_jitter_stays_in_range() {
        let options = RetryOptions::new(1_000, 5)
            .unwrap()
            .with_backoff(2.0)
            .with_jitter(0.1);
        let service = ActivityRetryService::new(Some(options));

        for _ in 0..20 {
            let delay = service.calculate_retry_delay(2).as_millis();
            assert!((1_800..=2_200).contains(&delay), "delay out of range: {delay}");
        }
    }

    #[test]
    fn test_should_retry_respects_error_class() {
        let service = ActivityRetryService::new(Some(RetryOptions::new(10, 3).unwrap()));

        assert!(service.should_retry(&OrchestratorError::DataSource("x".into()), 1));
        assert!(!service.should_retry(&OrchestratorError::DataSource("x".into()), 3));
        assert!(!service.should_retry(&OrchestratorError::InvalidJobParams("x".into()), 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_retries_until_success() {
        let service = ActivityRetryService::new(Some(RetryOptions::new(100, 3).unwrap()));
        let calls = Arc::new(AtomicU32::new(0));

        let outcome = service
            .execute("ReportActivity", |_| {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(OrchestratorError::Storage("暂时不可用".into()))
                    } else {
                        Ok(json!("done"))
                    }
                }
            })
            .await;

        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.result.unwrap(), json!("done"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_attempt_timeout() {
        let service = ActivityRetryService::new(Some(RetryOptions::single_attempt(50)));

        let outcome = service
            .execute("ReportActivity", |_| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(Value::Null)
            })
            .await;

        assert_eq!(outcome.attempts, 1);
        assert!(matches!(
            outcome.result,
            Err(OrchestratorError::Timeout { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_starts_after_permit() {
        let limiter = Arc::new(Semaphore::new(1));
        let held = limiter.clone().acquire_owned().await.unwrap();

        let release = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            drop(held);
        });

        let service = ActivityRetryService::new(Some(RetryOptions::single_attempt(100_000)))
            .with_limiter(limiter);
        let outcome = service
            .execute("ReportActivity", |_| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(json!("done"))
            })
            .await;

        release.await.unwrap();
        assert_eq!(outcome.result.unwrap(), json!("done"));
    }

    #[tokio::test]
    async fn test_closed_limiter_is_cancelled() {
        let limiter = Arc::new(Semaphore::new(1));
        limiter.close();

        let service = ActivityRetryService::new(None).with_limiter(limiter);
        let outcome = service
            .execute("ReportActivity", |_| async { Ok(Value::Null) })
            .await;

        assert!(matches!(outcome.result, Err(OrchestratorError::Cancelled)));
    }
}
