//! Retry-guarded read path.
//!
//! 同期（呼び出し側が待つ）read。`StoreUnavailable` のみリトライし、
//! 値が無いこと（NotFound）は正常な結果としてそのまま返します。

use std::sync::Arc;

use tracing::warn;

use crate::error::StoreError;
use crate::ports::KvStore;
use crate::retry::RetryPolicy;

pub struct RetryGuardedReader {
    store: Arc<dyn KvStore>,
    policy: RetryPolicy,
}

impl RetryGuardedReader {
    pub fn new(store: Arc<dyn KvStore>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    /// Read `key`; `Ok(None)` means the key does not exist.
    ///
    /// After `max_attempts` failed calls the last `StoreError` is returned.
    pub async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let err = match self.store.get(key).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let Some(delay) = self.policy.next_delay(attempts) else {
                warn!(key, attempts, error = %err, "read failed; retry budget exhausted");
                return Err(err);
            };
            warn!(key, attempt = attempts, error = %err, "read failed; retrying");
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{FaultyStore, InMemoryStore, StoreOp};
    use tokio::time::{Duration, Instant};

    fn reader_over(store: &Arc<FaultyStore<InMemoryStore>>) -> RetryGuardedReader {
        let store: Arc<dyn KvStore> = store.clone();
        RetryGuardedReader::new(store, RetryPolicy::default())
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_two_transient_failures() {
        let store = Arc::new(FaultyStore::new(InMemoryStore::with_entries([("a", "1")])).fail_next(2));
        let reader = reader_over(&store);

        let started = Instant::now();
        let value = reader.read("a").await.unwrap();

        assert_eq!(value.as_deref(), Some("1"));
        assert_eq!(store.calls(StoreOp::Get), 3);
        assert!(started.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn propagates_after_three_failures() {
        let store = Arc::new(
            FaultyStore::new(InMemoryStore::with_entries([("a", "1")]))
                .fail_always()
                .with_message("Timeout reading from socket"),
        );
        let reader = reader_over(&store);

        let err = reader.read("a").await.unwrap_err();

        assert_eq!(err, StoreError::unavailable("Timeout reading from socket"));
        assert_eq!(store.calls(StoreOp::Get), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_key_is_not_retried() {
        let store = Arc::new(FaultyStore::new(InMemoryStore::new()));
        let reader = reader_over(&store);

        let started = Instant::now();
        assert_eq!(reader.read("missing").await.unwrap(), None);
        assert_eq!(store.calls(StoreOp::Get), 1);
        assert!(started.elapsed() < Duration::from_millis(1));
    }
}
