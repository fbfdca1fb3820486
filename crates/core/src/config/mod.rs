//! 配置管理
//!
//! 配置按以下顺序加载，后者覆盖前者：
//! 1. 结构体默认值（serde default）
//! 2. TOML配置文件（显式路径或默认位置）
//! 3. 环境变量（前缀 `ORCHESTRATOR__`，层级分隔符 `__`）
//!
//! ```rust,no_run
//! use orchestrator_core::config::AppConfig;
//!
//! let config = AppConfig::load(Some("config/orchestrator.toml")).unwrap();
//! println!("API监听地址: {}", config.api.bind_address);
//! ```

pub mod models;

pub use models::*;
