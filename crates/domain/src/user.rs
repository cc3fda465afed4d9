//! # ユーザー
//!
//! 打刻端末を利用するユーザーと、その認証情報・勤務スケジュールを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`User`] | ユーザー | 認証情報と勤務スケジュールを持つ利用者 |
//! | [`Username`] | ユーザー名 | システム全体で一意 |
//! | [`RfidToken`] | RFID トークン | カードに書き込まれた認証トークン |
//! | [`UserRole`] | 役割 | `trabajador`（作業者）または `admin` |
//! | [`Schedule`] | 勤務スケジュール | 曜日名 → 勤務時間帯の表記 |
//!
//! ## 不変条件
//!
//! - `username` はシステム全体で一意（リポジトリとユースケースで保証）
//! - パスワードは常にハッシュで保持し、平文は保持しない
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use presencia_domain::{
//!     password::PasswordHash,
//!     user::{NewUser, User, UserId, UserRole, Username},
//! };
//!
//! let user = User::new(NewUser {
//!     id:            UserId::new(),
//!     username:      Username::new("borja")?,
//!     password_hash: PasswordHash::new("$argon2id$..."),
//!     rfid_token:    None,
//!     role:          UserRole::default(),
//!     is_admin:      false,
//!     schedule:      Default::default(),
//!     now:           chrono::Utc::now(),
//! });
//!
//! assert_eq!(user.role(), UserRole::Trabajador);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{DomainError, password::PasswordHash};

define_uuid_id! {
    /// ユーザー ID
    pub struct UserId;
}

define_text_value! {
    /// ユーザー名（一意）
    pub struct Username {
        label: "ユーザー名",
        max_chars: 64,
        visibility: plain,
    }
}

define_text_value! {
    /// RFID トークン
    ///
    /// カードを提示するだけで本人確認に使われるため、ログには出さない。
    pub struct RfidToken {
        label: "RFID トークン",
        max_chars: 128,
        visibility: credential,
    }
}

/// ユーザーの役割
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    /// 作業者（既定値）
    #[default]
    #[serde(alias = "usuario")]
    Trabajador,
    /// 管理者
    Admin,
}

impl std::str::FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            // モバイルアプリは一般ユーザーを "usuario" として送る
            "trabajador" | "usuario" => Ok(Self::Trabajador),
            "admin" => Ok(Self::Admin),
            _ => Err(DomainError::Validation(format!("不正な役割: {}", s))),
        }
    }
}

/// 勤務スケジュール
///
/// 曜日名（`"Lunes"` など）から勤務時間帯の表記（`"09:00 - 18:00"`、`"Descanso"`）への対応。
/// 表記は自由文字列で、サーバー側では解釈しない。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule(BTreeMap<String, String>);

impl Schedule {
    pub fn new(days: BTreeMap<String, String>) -> Self {
        Self(days)
    }

    /// 指定した曜日の表記を取得する
    pub fn day(&self, day: &str) -> Option<&str> {
        self.0.get(day).map(String::as_str)
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 新規ユーザー作成パラメータ
pub struct NewUser {
    pub id:            UserId,
    pub username:      Username,
    pub password_hash: PasswordHash,
    pub rfid_token:    Option<RfidToken>,
    pub role:          UserRole,
    pub is_admin:      bool,
    pub schedule:      Schedule,
    pub now:           DateTime<Utc>,
}

/// ユーザーエンティティ
///
/// パスワードハッシュは PIN の照合にも使われる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: Username,
    password_hash: PasswordHash,
    rfid_token: Option<RfidToken>,
    role: UserRole,
    is_admin: bool,
    schedule: Schedule,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// 新しいユーザーを作成する
    pub fn new(params: NewUser) -> Self {
        Self {
            id: params.id,
            username: params.username,
            password_hash: params.password_hash,
            rfid_token: params.rfid_token,
            role: params.role,
            is_admin: params.is_admin,
            schedule: params.schedule,
            created_at: params.now,
            updated_at: params.now,
        }
    }

    /// 既存のデータからユーザーを復元する（データベースから取得時）
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: UserId,
        username: Username,
        password_hash: PasswordHash,
        rfid_token: Option<RfidToken>,
        role: UserRole,
        is_admin: bool,
        schedule: Schedule,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            password_hash,
            rfid_token,
            role,
            is_admin,
            schedule,
            created_at,
            updated_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    pub fn rfid_token(&self) -> Option<&RfidToken> {
        self.rfid_token.as_ref()
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // 更新メソッド（新しいインスタンスを返す）

    /// ユーザー名を変更した新しいインスタンスを返す
    pub fn with_username(self, username: Username, now: DateTime<Utc>) -> Self {
        Self {
            username,
            updated_at: now,
            ..self
        }
    }

    /// パスワードハッシュを変更した新しいインスタンスを返す
    pub fn with_password_hash(self, password_hash: PasswordHash, now: DateTime<Utc>) -> Self {
        Self {
            password_hash,
            updated_at: now,
            ..self
        }
    }

    /// RFID トークンを変更した新しいインスタンスを返す
    pub fn with_rfid_token(self, rfid_token: Option<RfidToken>, now: DateTime<Utc>) -> Self {
        Self {
            rfid_token,
            updated_at: now,
            ..self
        }
    }

    /// 役割と管理者フラグを変更した新しいインスタンスを返す
    pub fn with_role(self, role: UserRole, is_admin: bool, now: DateTime<Utc>) -> Self {
        Self {
            role,
            is_admin,
            updated_at: now,
            ..self
        }
    }

    /// 勤務スケジュールを変更した新しいインスタンスを返す
    pub fn with_schedule(self, schedule: Schedule, now: DateTime<Utc>) -> Self {
        Self {
            schedule,
            updated_at: now,
            ..self
        }
    }
}
