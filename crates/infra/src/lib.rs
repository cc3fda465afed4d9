//! # Presencia インフラ層
//!
//! PostgreSQL への永続化とパスワードハッシュ計算を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理とマイグレーション
//! - **リポジトリ実装**: ユーザー・打刻記録・勤務セッション・センサーログの永続化
//! - **パスワードハッシュ**: Argon2id によるパスワード（PIN 兼用）のハッシュ化と検証
//!
//! ## 依存関係
//!
//! ```text
//! sensor-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL データベース接続管理
//! - [`error`] - インフラ層エラー定義
//! - [`password`] - パスワードハッシュ
//! - [`repository`] - リポジトリ実装
//! - `mock` - テスト用インメモリ実装（`test-utils` feature）
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use presencia_infra::{db, repository::PostgresPresenceRepository};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::create_pool("postgres://localhost/presencia").await?;
//!     db::run_migrations(&pool).await?;
//!
//!     let presence_repo = PostgresPresenceRepository::new(pool.clone());
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod password;
pub mod repository;

pub use error::{InfraError, InfraErrorKind};
pub use password::{Argon2PasswordHasher, PasswordHasher};
