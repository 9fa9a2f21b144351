//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # Fail-fast 設計
//! - build() で config を検証する
//! - store に ping して、起動時に到達できなければ BuildError を返す

use std::sync::Arc;

use tracing::info;

use crate::config::{ConfigError, KvqConfig};
use crate::error::StoreError;
use crate::executor::MutationExecutor;
use crate::impls::{InMemoryResultBackend, InMemoryStore};
use crate::ports::{IdGenerator, KvStore, ResultBackend};
use crate::queue::InMemoryQueue;
use crate::reader::RetryGuardedReader;
use crate::retry::RetryPolicy;
use crate::service::KvService;
use crate::worker::WorkerGroup;

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new()
///     .with_config(config)
///     .build()
///     .await?;
/// let ack = app.service().create("a", "1").await?;
/// ```
#[derive(Default)]
pub struct AppBuilder {
    config: KvqConfig,
    store: Option<Arc<dyn KvStore>>,
    results: Option<Arc<dyn ResultBackend>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("store unavailable at startup: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("store_url {0:?} requires kvq-core to be built with the `redis` feature")]
    RedisDisabled(String),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: KvqConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this store instead of the one described by `store_url`.
    pub fn with_store(mut self, store: Arc<dyn KvStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_result_backend(mut self, results: Arc<dyn ResultBackend>) -> Self {
        self.results = Some(results);
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Validate, connect, and start the workers.
    pub async fn build(self) -> Result<App, BuildError> {
        self.config.validate()?;

        let store = match self.store {
            Some(store) => store,
            None => connect_store(&self.config).await?,
        };
        store.ping().await?;

        let results: Arc<dyn ResultBackend> = match self.results {
            Some(results) => results,
            None => Arc::new(InMemoryResultBackend::new()),
        };

        let mut queue = InMemoryQueue::new(Arc::clone(&results), self.config.lease_timeout());
        if let Some(ids) = self.ids {
            queue = queue.with_id_generator(ids);
        }
        let queue = Arc::new(queue);

        let executor = Arc::new(MutationExecutor::new(Arc::clone(&store)));
        let reader = RetryGuardedReader::new(
            Arc::clone(&store),
            RetryPolicy::from(&self.config.read_retry),
        );
        let service = Arc::new(KvService::new(queue.clone(), reader, results));
        let workers = WorkerGroup::spawn(self.config.workers, queue.clone(), executor);

        info!(
            workers = self.config.workers,
            store = self.config.store_url.as_deref().unwrap_or("in-memory"),
            "kvq started"
        );

        Ok(App {
            config: self.config,
            service,
            queue,
            workers,
        })
    }
}

async fn connect_store(config: &KvqConfig) -> Result<Arc<dyn KvStore>, BuildError> {
    match &config.store_url {
        None => Ok(Arc::new(InMemoryStore::new())),
        #[cfg(feature = "redis")]
        Some(url) => Ok(Arc::new(crate::impls::RedisStore::connect(url).await?)),
        #[cfg(not(feature = "redis"))]
        Some(url) => Err(BuildError::RedisDisabled(url.clone())),
    }
}

/// App は起動済みのランタイム
pub struct App {
    config: KvqConfig,
    service: Arc<KvService>,
    queue: Arc<InMemoryQueue>,
    workers: WorkerGroup,
}

impl App {
    pub fn service(&self) -> &Arc<KvService> {
        &self.service
    }

    pub fn queue(&self) -> &Arc<InMemoryQueue> {
        &self.queue
    }

    pub fn config(&self) -> &KvqConfig {
        &self.config
    }

    /// Refuse new tasks, let the workers drain what is queued, and wait for them.
    pub async fn shutdown(self) {
        self.queue.close();
        self.workers.join().await;
        info!("kvq stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct DownStore;

    #[async_trait]
    impl KvStore for DownStore {
        async fn exists(&self, _key: &str) -> Result<bool, StoreError> {
            Err(StoreError::unavailable("down"))
        }
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::unavailable("down"))
        }
        async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::unavailable("down"))
        }
        async fn delete(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::unavailable("down"))
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::unavailable("Redis service is unavailable"))
        }
    }

    #[tokio::test]
    async fn test_build_with_defaults() {
        let app = AppBuilder::new().build().await.unwrap();
        assert_eq!(app.config().workers, 4);
        app.shutdown().await;
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_config() {
        let config = KvqConfig {
            workers: 0,
            ..KvqConfig::default()
        };
        let app = AppBuilder::new().with_config(config).build().await;
        assert!(matches!(app, Err(BuildError::Config(ConfigError::Invalid(_)))));
    }

    #[tokio::test]
    async fn test_build_fails_fast_when_store_is_down() {
        let app = AppBuilder::new().with_store(Arc::new(DownStore)).build().await;
        assert!(matches!(
            app,
            Err(BuildError::StoreUnavailable(err)) if err.message() == "Redis service is unavailable"
        ));
    }

    #[cfg(not(feature = "redis"))]
    #[tokio::test]
    async fn test_build_store_url_without_redis_feature() {
        let config = KvqConfig {
            store_url: Some("redis://redis-kv-service:6379".to_string()),
            ..KvqConfig::default()
        };
        let app = AppBuilder::new().with_config(config).build().await;
        assert!(matches!(app, Err(BuildError::RedisDisabled(url)) if url == "redis://redis-kv-service:6379"));
    }
}
