use async_trait::async_trait;

use crate::OrchestratorResult;

/// 报表制品存储接口
///
/// 路径使用 `/` 分隔的相对路径，按环境/订阅前缀划分命名空间。
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// 写入制品，已存在时覆盖
    async fn put(&self, path: &str, content: Vec<u8>) -> OrchestratorResult<()>;

    /// 读取制品，不存在时返回 `None`
    async fn get(&self, path: &str) -> OrchestratorResult<Option<Vec<u8>>>;

    async fn exists(&self, path: &str) -> OrchestratorResult<bool> {
        Ok(self.get(path).await?.is_some())
    }

    /// 列出指定前缀下的制品路径（按字典序）
    async fn list(&self, prefix: &str) -> OrchestratorResult<Vec<String>>;
}
