//! kvq-core
//!
//! Conditional create/update/delete on a shared key-value store, executed
//! asynchronously by background workers, plus a retry-guarded read path.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, mutation, task, outcome）
//! - **ports**: 抽象化レイヤー（KvStore, ResultBackend, Clock, IdGenerator）
//! - **impls**: ports の実装（InMemoryStore, RedisStore, InMemoryResultBackend など）
//! - **queue**: TaskQueue trait + in-memory 実装（lease / redelivery）
//! - **executor**: 条件付き mutation の実行（check-then-act）
//! - **reader**: リトライ付きの同期 read
//! - **worker**: queue と executor をつなぐ worker group
//! - **service**: front end 向けのファサード
//! - **app**: 構築とワイヤリング（AppBuilder）

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod executor;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;
pub mod reader;
pub mod retry;
pub mod service;
pub mod worker;

pub use app::{App, AppBuilder, BuildError};
pub use config::{ConfigError, KvqConfig, ReadRetryConfig};
pub use domain::{Mutation, MutationKind, MutationTask, TaskId, TaskResult, TaskStatus};
pub use error::{QueueError, StoreError};
pub use executor::MutationExecutor;
pub use reader::RetryGuardedReader;
pub use retry::RetryPolicy;
pub use service::{Entry, KvService, Submission, TaskProgress};
