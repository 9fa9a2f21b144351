//! FaultyStore - 障害注入用のラッパー
//!
//! 内側の store に委譲しつつ、指定回数だけ `StoreError::Unavailable` を返します。
//! 呼び出し回数も操作ごとに数えるので、リトライ回数の検証に使えます。

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::ports::KvStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Exists,
    Get,
    Set,
    Delete,
}

impl StoreOp {
    fn index(self) -> usize {
        match self {
            StoreOp::Exists => 0,
            StoreOp::Get => 1,
            StoreOp::Set => 2,
            StoreOp::Delete => 3,
        }
    }
}

pub struct FaultyStore<S> {
    inner: S,
    /// Failures still to inject. `u32::MAX` means "always".
    remaining: AtomicU32,
    /// Restrict injection to one operation; `None` targets all of them.
    target: Option<StoreOp>,
    message: String,
    calls: [AtomicU32; 4],
}

impl<S: KvStore> FaultyStore<S> {
    /// Wraps `inner` without injecting anything yet.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            remaining: AtomicU32::new(0),
            target: None,
            message: "Connection refused".to_string(),
            calls: Default::default(),
        }
    }

    /// Fail the next `n` targeted calls.
    pub fn fail_next(self, n: u32) -> Self {
        self.remaining.store(n, Ordering::SeqCst);
        self
    }

    /// Fail every targeted call.
    pub fn fail_always(self) -> Self {
        self.fail_next(u32::MAX)
    }

    /// Only inject failures into `op`.
    pub fn only(mut self, op: StoreOp) -> Self {
        self.target = Some(op);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Number of calls made to `op` so far, failed ones included.
    pub fn calls(&self, op: StoreOp) -> u32 {
        self.calls[op.index()].load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn check(&self, op: StoreOp) -> Result<(), StoreError> {
        self.calls[op.index()].fetch_add(1, Ordering::SeqCst);
        if self.target.is_some_and(|t| t != op) {
            return Ok(());
        }
        let injected = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
                0 => None,
                u32::MAX => Some(u32::MAX),
                n => Some(n - 1),
            })
            .is_ok();
        if injected {
            Err(StoreError::unavailable(self.message.clone()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<S: KvStore> KvStore for FaultyStore<S> {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.check(StoreOp::Exists)?;
        self.inner.exists(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check(StoreOp::Get)?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check(StoreOp::Set)?;
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check(StoreOp::Delete)?;
        self.inner.delete(key).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryStore;

    #[tokio::test]
    async fn fails_exactly_n_times() {
        let store = FaultyStore::new(InMemoryStore::with_entries([("a", "1")])).fail_next(2);

        assert!(store.get("a").await.is_err());
        assert!(store.get("a").await.is_err());
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(store.calls(StoreOp::Get), 3);
    }

    #[tokio::test]
    async fn targeted_failures_leave_other_ops_alone() {
        let store = FaultyStore::new(InMemoryStore::new())
            .fail_always()
            .only(StoreOp::Set)
            .with_message("READONLY You can't write against a read only replica.");

        assert!(!store.exists("a").await.unwrap());
        let err = store.set("a", "1").await.unwrap_err();
        assert_eq!(
            err.message(),
            "READONLY You can't write against a read only replica."
        );
        assert!(store.set("a", "1").await.is_err());
        assert!(store.inner().is_empty().await);
    }
}
