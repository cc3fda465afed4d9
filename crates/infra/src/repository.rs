//! # リポジトリ実装
//!
//! 永続化操作のトレイトと PostgreSQL 実装を提供する。
//!
//! ## 設計方針
//!
//! - **トレイト境界**: ユースケース層は `Arc<dyn XxxRepository>` として受け取る
//! - **実行時クエリ**: `sqlx::query_as` + `FromRow` の中間構造体で行を受け、`TryFrom` でドメインに変換
//! - **テスタビリティ**: `test-utils` feature のインメモリ実装（[`crate::mock`]）と差し替え可能

pub mod presence_repository;
pub mod sensor_repository;
pub mod user_repository;
pub mod work_session_repository;

pub use presence_repository::{PostgresPresenceRepository, PresenceRepository};
pub use sensor_repository::{PostgresSensorRepository, SensorRepository};
pub use user_repository::{PostgresUserRepository, UserRepository};
pub use work_session_repository::{PostgresWorkSessionRepository, WorkSessionRepository};
