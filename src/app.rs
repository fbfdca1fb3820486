use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{error, info, warn};

use orchestrator_api::create_app;
use orchestrator_core::{
    ActivityRegistry, AppConfig, ArtifactStore, DataSource, JobRequest, OrchestrationClient,
    OrchestrationInstance, StorageBackend,
};
use orchestrator_dispatcher::{
    register_builtin, OrchestrationRunner, OrchestratorRegistry, TimerTrigger,
};
use orchestrator_infrastructure::{
    FileSystemArtifactStore, InMemoryArtifactStore, InMemoryInstanceStore, StaticDataSource,
};
use orchestrator_worker::ReportActivity;

/// 应用运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// 仅运行HTTP触发面
    Api,
    /// 仅运行定时触发器
    Timer,
    /// 运行所有组件
    All,
}

/// 主应用程序
pub struct Application {
    config: AppConfig,
    mode: AppMode,
    runner: Arc<OrchestrationRunner>,
    metrics: Option<PrometheusHandle>,
}

impl Application {
    pub async fn new(
        config: AppConfig,
        mode: AppMode,
        metrics: Option<PrometheusHandle>,
    ) -> Result<Self> {
        info!("初始化应用程序，模式: {:?}", mode);

        let runner = Arc::new(build_runner(&config).await?);

        Ok(Self {
            config,
            mode,
            runner,
            metrics,
        })
    }

    pub fn runner(&self) -> Arc<OrchestrationRunner> {
        Arc::clone(&self.runner)
    }

    /// 在当前任务内执行一次编排直到结束，供命令行单次运行使用
    pub async fn run_once(&self, name: &str, request: JobRequest) -> Result<OrchestrationInstance> {
        self.runner
            .run_to_completion(name, request)
            .await
            .with_context(|| format!("启动编排失败: {name}"))
    }

    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!("启动应用程序，模式: {:?}", self.mode);

        match self.mode {
            AppMode::Api => self.run_api(shutdown_rx).await,
            AppMode::Timer => self.run_timer(shutdown_rx).await,
            AppMode::All => self.run_all_components(shutdown_rx).await,
        }
    }

    async fn run_api(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let bind_address = &self.config.api.bind_address;
        info!("启动API服务器: {}", bind_address);

        let client: Arc<dyn OrchestrationClient> = self.runner();
        let app = create_app(client, self.metrics.clone(), &self.config.api);

        let listener = TcpListener::bind(bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {bind_address}"))?;

        info!("API服务器启动在 http://{}", bind_address);

        let server_handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                error!("API服务器运行失败: {}", e);
            }
        });

        let _ = shutdown_rx.recv().await;
        info!("API服务器收到关闭信号");

        server_handle.abort();

        info!("API服务器已停止");
        Ok(())
    }

    async fn run_timer(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let timers: Vec<_> = self.config.enabled_timers().cloned().collect();
        if timers.is_empty() {
            warn!("没有启用的定时器");
        }

        let client: Arc<dyn OrchestrationClient> = self.runner();
        let trigger = TimerTrigger::new(
            client,
            &timers,
            Duration::from_secs(self.config.dispatcher.timer_poll_interval_seconds),
            Utc::now(),
        )
        .context("创建定时触发器失败")?;

        info!("启动定时触发器，共 {} 个定时器", trigger.timer_count());
        trigger.run(shutdown_rx).await;

        info!("定时触发器已停止");
        Ok(())
    }

    async fn run_all_components(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!("启动所有组件");

        let mut handles = Vec::new();

        {
            let app = self.clone_for_mode(AppMode::Timer);
            let shutdown_rx = shutdown_rx.resubscribe();

            handles.push(tokio::spawn(async move {
                if let Err(e) = app.run_timer(shutdown_rx).await {
                    error!("定时触发器运行失败: {:#}", e);
                }
            }));
        }

        if self.config.api.enabled {
            let app = self.clone_for_mode(AppMode::Api);
            let shutdown_rx = shutdown_rx.resubscribe();

            handles.push(tokio::spawn(async move {
                if let Err(e) = app.run_api(shutdown_rx).await {
                    error!("API服务器运行失败: {:#}", e);
                }
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }

        info!("所有组件已停止");
        Ok(())
    }

    fn clone_for_mode(&self, mode: AppMode) -> Self {
        Self {
            config: self.config.clone(),
            mode,
            runner: Arc::clone(&self.runner),
            metrics: self.metrics.clone(),
        }
    }
}

/// 按配置组装编排运行器
pub async fn build_runner(config: &AppConfig) -> Result<OrchestrationRunner> {
    let activities = Arc::new(ActivityRegistry::new());
    activities
        .register(Arc::new(ReportActivity::from_config(&config.worker)))
        .await;

    let mut orchestrators = OrchestratorRegistry::new();
    register_builtin(&mut orchestrators);
    info!("已注册编排器: {:?}", orchestrators.names());

    let artifacts = create_artifact_store(config);
    let data_source = create_data_source(config).await?;

    Ok(OrchestrationRunner::new(
        Arc::new(orchestrators),
        activities,
        Arc::new(InMemoryInstanceStore::new()),
        artifacts,
        data_source,
        config.profile(),
        &config.dispatcher,
    ))
}

fn create_artifact_store(config: &AppConfig) -> Arc<dyn ArtifactStore> {
    match config.storage.backend {
        StorageBackend::Filesystem => {
            info!("使用文件系统制品存储: {}", config.storage.root_dir);
            Arc::new(FileSystemArtifactStore::new(&config.storage.root_dir))
        }
        StorageBackend::Memory => {
            info!("使用内存制品存储");
            Arc::new(InMemoryArtifactStore::new())
        }
    }
}

async fn create_data_source(config: &AppConfig) -> Result<Arc<dyn DataSource>> {
    match &config.data_source.universe_path {
        Some(path) => {
            let source = StaticDataSource::load(path)
                .await
                .with_context(|| format!("加载基金清单失败: {path}"))?;
            info!("已加载基金清单 {}，共 {} 只基金", path, source.fund_count());
            Ok(Arc::new(source))
        }
        None => {
            warn!("未配置基金清单，使用空数据源");
            Ok(Arc::new(StaticDataSource::default()))
        }
    }
}
