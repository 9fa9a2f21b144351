//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryStore**: 開発用・テスト用の key-value store
//! - **FaultyStore**: 障害注入ラッパー（StoreUnavailable を返す）
//! - **InMemoryResultBackend**: task 結果の保存先
//! - **RedisStore**: 本番用（`redis` feature）

pub mod faulty_store;
pub mod memory_results;
pub mod memory_store;
#[cfg(feature = "redis")]
pub mod redis_store;

pub use self::faulty_store::{FaultyStore, StoreOp};
pub use self::memory_results::InMemoryResultBackend;
pub use self::memory_store::InMemoryStore;
#[cfg(feature = "redis")]
pub use self::redis_store::RedisStore;
