//! KvStore port - 外部 key-value store の 4 つのプリミティブ
//!
//! Compare-and-swap は提供されない前提です。条件付き mutation は
//! `exists` と `set`/`delete` の二回の呼び出しで構成されます。

use async_trait::async_trait;

use crate::error::StoreError;

pub const PING_PROBE_KEY: &str = "kvq:ping";

/// Store adapter over an external key-value store.
///
/// Every operation fails with [`StoreError::Unavailable`] when the store
/// cannot be reached or reports an error. Implementations perform no side
/// effects beyond the requested operation.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Startup connectivity check. Defaults to an `exists` on a probe key.
    async fn ping(&self) -> Result<(), StoreError> {
        self.exists(PING_PROBE_KEY).await.map(|_| ())
    }
}
