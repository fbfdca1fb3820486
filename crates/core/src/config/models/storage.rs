use serde::{Deserialize, Serialize};

/// 制品存储后端
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
    Memory,
}

fn default_root_dir() -> String {
    "artifacts".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// 文件系统后端的根目录
    #[serde(default = "default_root_dir")]
    pub root_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            root_dir: default_root_dir(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.backend == StorageBackend::Filesystem && self.root_dir.trim().is_empty() {
            return Err(anyhow::anyhow!("文件系统存储的根目录不能为空"));
        }

        Ok(())
    }
}

/// 数据源配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// 基金数据集JSON文件路径，未配置时使用空数据集
    #[serde(default)]
    pub universe_path: Option<String>,
}

impl DataSourceConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(path) = &self.universe_path {
            if path.trim().is_empty() {
                return Err(anyhow::anyhow!("数据集文件路径不能为空字符串"));
            }
        }

        Ok(())
    }
}
