use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use orchestrator_core::{ArtifactStore, OrchestratorError, OrchestratorResult};

/// 校验制品路径：非空、相对路径、不含 `..`
fn validate_path(path: &str) -> OrchestratorResult<()> {
    if path.trim().is_empty() {
        return Err(OrchestratorError::Storage("制品路径不能为空".to_string()));
    }

    let candidate = Path::new(path);
    let is_safe = candidate
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

    if !is_safe {
        return Err(OrchestratorError::Storage(format!(
            "制品路径不允许越出存储根目录: {path}"
        )));
    }

    Ok(())
}

/// 本地文件系统制品存储
#[derive(Debug, Clone)]
pub struct FileSystemArtifactStore {
    root: PathBuf,
}

impl FileSystemArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> OrchestratorResult<PathBuf> {
        validate_path(path)?;
        Ok(self.root.join(path))
    }

    async fn collect_files(&self, dir: PathBuf, out: &mut Vec<String>) -> OrchestratorResult<()> {
        let mut stack = vec![dir];

        while let Some(current) = stack.pop() {
            let mut entries = match tokio::fs::read_dir(&current).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    stack.push(path);
                } else if let Ok(relative) = path.strip_prefix(&self.root) {
                    let parts: Vec<String> = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect();
                    out.push(parts.join("/"));
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for FileSystemArtifactStore {
    async fn put(&self, path: &str, content: Vec<u8>) -> OrchestratorResult<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, content).await?;
        debug!("写入制品 {}", target.display());
        Ok(())
    }

    async fn get(&self, path: &str) -> OrchestratorResult<Option<Vec<u8>>> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, prefix: &str) -> OrchestratorResult<Vec<String>> {
        let mut paths = Vec::new();
        self.collect_files(self.root.clone(), &mut paths).await?;

        paths.retain(|p| p.starts_with(prefix));
        paths.sort();
        Ok(paths)
    }
}

/// 内存制品存储
#[derive(Debug, Clone, Default)]
pub struct InMemoryArtifactStore {
    blobs: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn put(&self, path: &str, content: Vec<u8>) -> OrchestratorResult<()> {
        validate_path(path)?;
        self.blobs.write().await.insert(path.to_string(), content);
        Ok(())
    }

    async fn get(&self, path: &str) -> OrchestratorResult<Option<Vec<u8>>> {
        validate_path(path)?;
        Ok(self.blobs.read().await.get(path).cloned())
    }

    async fn list(&self, prefix: &str) -> OrchestratorResult<Vec<String>> {
        Ok(self
            .blobs
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("dev/nonprd/fund_reports/Skye.json").is_ok());
        assert!(validate_path("").is_err());
        assert!(validate_path("../etc/passwd").is_err());
        assert!(validate_path("dev/../../x").is_err());
        assert!(validate_path("/absolute/path").is_err());
    }

    #[tokio::test]
    async fn test_in_memory_put_get_list() {
        let store = InMemoryArtifactStore::new();
        store.put("dev/nonprd/a.json", b"1".to_vec()).await.unwrap();
        store.put("dev/nonprd/b.json", b"2".to_vec()).await.unwrap();
        store.put("uat/nonprd/c.json", b"3".to_vec()).await.unwrap();

        assert_eq!(store.get("dev/nonprd/a.json").await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get("missing.json").await.unwrap(), None);
        assert!(store.exists("uat/nonprd/c.json").await.unwrap());
        assert_eq!(
            store.list("dev/").await.unwrap(),
            vec!["dev/nonprd/a.json", "dev/nonprd/b.json"]
        );

        // 同一路径覆盖写入
        store.put("dev/nonprd/a.json", b"9".to_vec()).await.unwrap();
        assert_eq!(store.len().await, 3);
        assert_eq!(store.get("dev/nonprd/a.json").await.unwrap(), Some(b"9".to_vec()));
    }
}
