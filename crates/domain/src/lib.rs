//! # Presencia ドメイン層
//!
//! ESP32 打刻端末バックエンドのドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（例: User, PresenceRecord）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（例: Username, MovementType）
//! - **ドメインサービス**: エンティティに属さないビジネスロジック（打刻判定）
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! sensor-service → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（DB、外部サービス）には一切依存しない。
//! 現在時刻も [`clock::Clock`] 経由で注入される。
//!
//! ## モジュール構成
//!
//! - [`attendance`] - 直前の打刻から次の打刻種別と勤務セッションを決める判定ロジック
//! - [`presence`] - 打刻記録（追記専用のイベントログ）
//! - [`work_session`] - 入室〜退室の組から導出される勤務セッション
//! - [`user`] - ユーザー（認証情報・勤務スケジュール）
//! - [`sensor`] - 気象・照度・未登録カードのセンサーログ
//! - [`password`] - パスワード（PIN 兼用）の値オブジェクト
//! - [`clock`] - 時刻プロバイダ
//! - [`error`] - ドメイン層エラー
//!
//! ## 使用例
//!
//! ```rust
//! use presencia_domain::{
//!     attendance::{AttendanceSignal, decide},
//!     presence::MovementType,
//! };
//!
//! // 初回打刻（直前の記録なし）で種別指定なしなら入室になる
//! let decision = decide(None, AttendanceSignal::Toggle, chrono::Utc::now());
//! assert_eq!(decision.movement, MovementType::Entrada);
//! assert!(decision.closed_session.is_none());
//! ```

#[macro_use]
mod macros;

pub mod attendance;
pub mod clock;
pub mod error;
pub mod password;
pub mod presence;
pub mod sensor;
pub mod user;
pub mod work_session;

pub use error::DomainError;
