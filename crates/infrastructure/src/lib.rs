//! 基础设施实现：实例状态存储、报表制品存储和静态数据源

pub mod artifact_store;
pub mod data_source;
pub mod in_memory_store;

pub use artifact_store::{FileSystemArtifactStore, InMemoryArtifactStore};
pub use data_source::{StaticDataSource, Universe};
pub use in_memory_store::InMemoryInstanceStore;
