use anyhow::{Context, Result};
use ::config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    api_observability::{ApiConfig, ObservabilityConfig},
    dispatcher_worker::{DispatcherConfig, TimerConfig, WorkerConfig},
    storage::{DataSourceConfig, StorageConfig},
};
use crate::models::{DeployEnvironment, EnvironmentProfile};

/// 系统配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: DeployEnvironment,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub data_source: DataSourceConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub timers: Vec<TimerConfig>,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序：
    /// 1. 默认值
    /// 2. 配置文件（TOML）
    /// 3. 环境变量覆盖（前缀 `ORCHESTRATOR__`）
    ///
    /// `config_path` 为 `None` 时依次尝试默认路径，都不存在则只使用默认值。
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else {
            let default_paths = [
                "config/orchestrator.toml",
                "orchestrator.toml",
                "/etc/orchestrator/config.toml",
            ];

            if let Some(path) = default_paths.iter().find(|p| Path::new(p).exists()) {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("ORCHESTRATOR")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    /// 从TOML字符串加载配置
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;

        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }

    /// 当前部署环境对应的环境/订阅组合
    pub fn profile(&self) -> EnvironmentProfile {
        EnvironmentProfile::for_environment(self.environment)
    }

    /// 已启用的定时器
    pub fn enabled_timers(&self) -> impl Iterator<Item = &TimerConfig> {
        self.timers.iter().filter(|t| t.enabled)
    }

    pub fn validate(&self) -> Result<()> {
        self.dispatcher
            .validate()
            .context("Dispatcher配置验证失败")?;

        self.worker.validate().context("Worker配置验证失败")?;

        self.storage.validate().context("存储配置验证失败")?;

        self.data_source
            .validate()
            .context("数据源配置验证失败")?;

        self.api.validate().context("API配置验证失败")?;

        for timer in &self.timers {
            timer.validate().context("定时器配置验证失败")?;
        }

        self.observability
            .validate()
            .context("可观测性配置验证失败")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SiblingPolicy, Subscription};
    use crate::config::StorageBackend;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.environment, DeployEnvironment::Dev);
        assert_eq!(config.dispatcher.max_concurrent_activities, 16);
        assert_eq!(config.dispatcher.sibling_policy, SiblingPolicy::Drain);
        assert_eq!(config.storage.backend, StorageBackend::Filesystem);
        assert_eq!(
            config.worker.attribution_periods,
            vec!["MTD", "QTD", "YTD", "1Y"]
        );
        assert!(config.timers.is_empty());
    }

    #[test]
    fn test_from_toml_partial_sections_use_defaults() {
        let toml_str = r#"
environment = "prd"

[dispatcher]
max_concurrent_activities = 4
sibling_policy = "cancel_on_failure"

[[timers]]
orchestrator = "PerformanceQualityReportOrchestrator"
schedule = "0 0 6 1 * *"

[[timers]]
orchestrator = "EofRbaReportOrchestrator"
schedule = "0 0 7 1 * *"
enabled = false
"#;

        let config = AppConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.environment, DeployEnvironment::Prd);
        assert_eq!(config.profile().subscription, Subscription::Prd);
        assert_eq!(config.dispatcher.max_concurrent_activities, 4);
        assert_eq!(
            config.dispatcher.sibling_policy,
            SiblingPolicy::CancelOnFailure
        );
        assert_eq!(config.dispatcher.timer_poll_interval_seconds, 30);
        assert_eq!(config.api.bind_address, "0.0.0.0:8080");
        assert_eq!(config.timers.len(), 2);

        let enabled: Vec<_> = config.enabled_timers().collect();
        assert_eq!(enabled.len(), 1);
        assert_eq!(
            enabled[0].orchestrator,
            "PerformanceQualityReportOrchestrator"
        );
    }

    #[test]
    fn test_validation_failures() {
        let mut config = AppConfig::default();
        config.dispatcher.max_concurrent_activities = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.worker.attribution_periods.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.api.bind_address = "not-an-address".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.observability.log_format = "xml".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.timers.push(TimerConfig {
            orchestrator: String::new(),
            schedule: "0 0 6 1 * *".to_string(),
            enabled: true,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = AppConfig::default();
        config.environment = DeployEnvironment::Uat;
        config.storage.backend = StorageBackend::Memory;

        let toml_str = config.to_toml().unwrap();
        let parsed = AppConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
environment = "uat"

[storage]
backend = "memory"

[data_source]
universe_path = "data/universe.json"
"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.environment, DeployEnvironment::Uat);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(
            config.data_source.universe_path.as_deref(),
            Some("data/universe.json")
        );
        assert_eq!(config.profile().storage_prefix(), "uat/nonprd");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = AppConfig::load(Some("/nonexistent/orchestrator.toml"));
        assert!(result.is_err());
    }
}
