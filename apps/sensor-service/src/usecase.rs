//! # ユースケース層
//!
//! Sensor Service のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリ・時刻・パスワードハッシュを `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは DTO の変換だけを行い、ロジックはユースケースに集約
//!
//! ## モジュール構成
//!
//! - `attendance`: 打刻の記録と勤務セッションの計上
//! - `ingest`: 端末ペイロード（認証・カード・センサー）の振り分け
//! - `user`: ユーザーの登録・更新・初期管理者の投入
//! - `query`: 参照系

pub mod attendance;
pub mod ingest;
pub mod query;
pub mod user;

pub use attendance::{AttendanceUseCaseImpl, ManualClockInput};
pub use ingest::{IngestInput, IngestOutcome, IngestUseCaseImpl};
pub use query::{DataSnapshot, QueryUseCaseImpl};
pub use user::{RegisterUserInput, UpdateUserInput, UserUseCaseImpl};
