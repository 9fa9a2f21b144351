//! RedisStore - Redis を key-value store として使うアダプター
//!
//! `EXISTS` / `GET` / `SET` / `DEL` をそのまま対応させます。
//! Redis 側のエラーコードは解釈せず、すべて `StoreError::Unavailable` に畳み込みます。
//!
//! # Connection Model
//!
//! [`MultiplexedConnection`] は clone が安価で、clone 同士が同じ TCP 接続を共有します。
//! 各メソッドは接続を clone して使います。

use ::redis::aio::MultiplexedConnection;
use ::redis::AsyncCommands;
use async_trait::async_trait;

use crate::error::StoreError;
use crate::ports::KvStore;

#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Connects to Redis at `url` (`redis://[:<password>@]<host>:<port>[/<db>]`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = ::redis::Client::open(url).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)?;
        Ok(Self { conn })
    }

    pub fn with_connection(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

fn unavailable(err: ::redis::RedisError) -> StoreError {
    StoreError::unavailable(err.to_string())
}

#[async_trait]
impl KvStore for RedisStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let found: bool = conn.exists(key).await.map_err(unavailable)?;
        Ok(found)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await.map_err(unavailable)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await.map_err(unavailable)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await.map_err(unavailable)?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = ::redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}


/// Contract tests against a real Redis instance.
///
/// Requires a running Redis (default `redis://127.0.0.1:6379`, override with
/// `REDIS_URL`):
/// ```bash
/// cargo test -p kvq-core --features redis-tests -- redis_
/// ```
#[cfg(all(test, feature = "redis-tests"))]
mod integration_tests {
    use super::*;

    async fn test_store() -> (RedisStore, String) {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let store = RedisStore::connect(&url)
            .await
            .expect("Redis connection failed -- is Redis running?");
        (store, format!("kvq-test-{}", ulid::Ulid::new()))
    }

    #[tokio::test]
    async fn redis_ping() {
        let (store, _prefix) = test_store().await;
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn redis_set_get_exists_delete() {
        let (store, prefix) = test_store().await;
        let key = format!("{prefix}:a");

        assert!(!store.exists(&key).await.unwrap());
        assert_eq!(store.get(&key).await.unwrap(), None);

        store.set(&key, "1").await.unwrap();
        assert!(store.exists(&key).await.unwrap());
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("1"));

        store.delete(&key).await.unwrap();
        assert!(!store.exists(&key).await.unwrap());
    }
}
