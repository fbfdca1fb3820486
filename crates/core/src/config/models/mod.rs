pub mod api_observability;
pub mod app_config;
pub mod dispatcher_worker;
pub mod storage;

pub use api_observability::{ApiConfig, ObservabilityConfig};
pub use app_config::AppConfig;
pub use dispatcher_worker::{DispatcherConfig, TimerConfig, WorkerConfig};
pub use storage::{DataSourceConfig, StorageBackend, StorageConfig};
