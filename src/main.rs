use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use orchestrator_core::{AppConfig, InstanceStatus, JobRequest};
use report_orchestrator::app::{AppMode, Application};
use report_orchestrator::shutdown::ShutdownManager;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("orchestrator")
        .version(env!("CARGO_PKG_VERSION"))
        .about("报表批处理编排系统")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径，不指定时按默认位置查找"),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .value_name("MODE")
                .help("运行模式")
                .value_parser(["api", "timer", "all", "run"])
                .default_value("all"),
        )
        .arg(
            Arg::new("orchestrator")
                .short('o')
                .long("orchestrator")
                .value_name("NAME")
                .help("要执行的编排器名称 (仅在run模式下使用)")
                .required_if_eq("mode", "run"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("JSON")
                .help("编排输入，例如 '{\"as_of_date\":\"2022-03-31\"}' (仅在run模式下使用)"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别，覆盖配置文件")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式，覆盖配置文件")
                .value_parser(["json", "pretty"]),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config");
    let mode_str = matches
        .get_one::<String>("mode")
        .map(String::as_str)
        .unwrap_or("all");

    let config = AppConfig::load(config_path.map(String::as_str)).with_context(|| {
        format!(
            "加载配置失败: {}",
            config_path.map(String::as_str).unwrap_or("<默认路径>")
        )
    })?;

    let log_level = matches
        .get_one::<String>("log-level")
        .unwrap_or(&config.observability.log_level);
    let log_format = matches
        .get_one::<String>("log-format")
        .unwrap_or(&config.observability.log_format);
    init_logging(log_level, log_format)?;

    info!("启动报表编排系统");
    info!("运行模式: {mode_str}");
    info!("部署环境: {}", config.profile().storage_prefix());

    let metrics = if config.observability.metrics_enabled {
        Some(init_metrics()?)
    } else {
        None
    };

    if mode_str == "run" {
        let name = matches
            .get_one::<String>("orchestrator")
            .context("run模式需要 --orchestrator")?;
        let input = matches.get_one::<String>("input").map(String::as_str);
        return run_once(config, metrics, name, input).await;
    }

    let app_mode = parse_app_mode(mode_str, &config)?;
    let app = Arc::new(Application::new(config, app_mode, metrics).await?);

    let shutdown_manager = ShutdownManager::new();

    let app_handle = {
        let shutdown_rx = shutdown_manager.subscribe().await;
        let app = Arc::clone(&app);

        tokio::spawn(async move {
            if let Err(e) = app.run(shutdown_rx).await {
                error!("应用运行失败: {:#}", e);
            }
        })
    };

    wait_for_shutdown_signal().await;

    info!("收到关闭信号，开始优雅关闭...");
    shutdown_manager.shutdown().await;

    match tokio::time::timeout(Duration::from_secs(30), app_handle).await {
        Ok(Ok(())) => info!("应用已优雅关闭"),
        Ok(Err(e)) => error!("应用关闭时发生错误: {e}"),
        Err(_) => warn!("应用关闭超时，强制退出"),
    }

    info!("报表编排系统已退出");
    Ok(())
}

/// 单次执行一个编排并输出结果，失败时以错误退出
async fn run_once(
    config: AppConfig,
    metrics: Option<PrometheusHandle>,
    name: &str,
    input: Option<&str>,
) -> Result<()> {
    let body = match input {
        Some(raw) => serde_json::from_str(raw).context("解析 --input 失败")?,
        None => serde_json::Value::Null,
    };
    let request = JobRequest::from_body(body)?;

    let app = Application::new(config, AppMode::Api, metrics).await?;
    let instance = app.run_once(name, request).await?;

    println!("{}", serde_json::to_string_pretty(&instance)?);

    match instance.status {
        InstanceStatus::Completed => Ok(()),
        _ => Err(anyhow::anyhow!(
            "编排 {} 执行失败: {}",
            instance.id,
            instance.error_message.unwrap_or_default()
        )),
    }
}

fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
        _ => {
            return Err(anyhow::anyhow!("不支持的日志格式: {log_format}"));
        }
    }

    Ok(())
}

/// 安装全局Prometheus记录器，返回供 `/metrics` 渲染的句柄
fn init_metrics() -> Result<PrometheusHandle> {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|e| anyhow::anyhow!("安装指标记录器失败: {}", e))?;

    Ok(handle)
}

fn parse_app_mode(mode_str: &str, config: &AppConfig) -> Result<AppMode> {
    match mode_str {
        "api" => {
            if !config.api.enabled {
                return Err(anyhow::anyhow!("API模式被禁用，请检查配置"));
            }
            Ok(AppMode::Api)
        }
        "timer" => Ok(AppMode::Timer),
        "all" => Ok(AppMode::All),
        _ => Err(anyhow::anyhow!("不支持的运行模式: {mode_str}")),
    }
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("安装Ctrl+C信号处理器失败: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("安装SIGTERM信号处理器失败: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("收到Ctrl+C信号");
        },
        _ = terminate => {
            info!("收到SIGTERM信号");
        },
    }
}
