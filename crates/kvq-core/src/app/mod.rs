//! App - 構築とワイヤリング
//!
//! # 主要コンポーネント
//! - **AppBuilder**: config から store / queue / executor / reader / workers を組み立てる
//! - **App**: 起動済みのランタイム（service + worker group）

pub mod builder;

pub use self::builder::{App, AppBuilder, BuildError};
