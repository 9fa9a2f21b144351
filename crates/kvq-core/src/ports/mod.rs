//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（key-value store, 結果保存先, 時刻, ID 生成）への
//! インターフェースで、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - store が存在判定の正本（source of truth）
//! - task の結果は ResultBackend に置くキャッシュに過ぎない
//! - store クライアントは一度だけ構築し、明示的に注入する（グローバル状態なし）

pub mod clock;
pub mod id_generator;
pub mod result_backend;
pub mod store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::result_backend::ResultBackend;
pub use self::store::KvStore;
