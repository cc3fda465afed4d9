//! # UserRepository
//!
//! ユーザー情報の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **一意性**: `username` は UNIQUE 制約で保証し、ユースケース層でも事前に確認する
//! - **スケジュール**: 曜日 → 勤務時間帯の対応を JSONB で保持する
//! - **行の変換**: `TryFrom<UserRow>` に変換ロジックを集約する

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use presencia_domain::{
   password::PasswordHash,
   user::{RfidToken, Schedule, User, UserId, UserRole, Username},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// ユーザーリポジトリトレイト
#[async_trait]
pub trait UserRepository: Send + Sync {
   /// ID でユーザーを検索
   async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError>;

   /// ユーザー名でユーザーを検索
   async fn find_by_username(&self, username: &Username) -> Result<Option<User>, InfraError>;

   /// RFID トークンでユーザーを検索
   ///
   /// 端末がカードのトークンを送ってきたときの本人特定に使う。
   async fn find_by_rfid_token(&self, token: &RfidToken) -> Result<Option<User>, InfraError>;

   /// ユーザー名が登録済みか
   async fn exists_by_username(&self, username: &Username) -> Result<bool, InfraError>;

   /// 全ユーザーを取得（作成日時順）
   async fn find_all(&self) -> Result<Vec<User>, InfraError>;

   /// 新規ユーザーを作成
   async fn insert(&self, user: &User) -> Result<(), InfraError>;

   /// 既存ユーザーを更新
   ///
   /// 対象の行が存在しない場合もエラーにはしない（存在確認はユースケース層で行う）。
   async fn update(&self, user: &User) -> Result<(), InfraError>;
}

/// DB の users テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct UserRow {
   id:            Uuid,
   username:      String,
   password_hash: String,
   rfid_token:    Option<String>,
   role:          String,
   is_admin:      bool,
   schedule:      serde_json::Value,
   created_at:    DateTime<Utc>,
   updated_at:    DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
   type Error = InfraError;

   fn try_from(row: UserRow) -> Result<Self, Self::Error> {
      let schedule: Schedule = serde_json::from_value(row.schedule)?;

      Ok(User::from_db(
         UserId::from_uuid(row.id),
         Username::new(row.username)?,
         PasswordHash::new(row.password_hash),
         row.rfid_token.map(RfidToken::new).transpose()?,
         row.role.parse::<UserRole>()?,
         row.is_admin,
         schedule,
         row.created_at,
         row.updated_at,
      ))
   }
}

const SELECT_USER: &str = r#"
    SELECT
        id, username, password_hash, rfid_token, role, is_admin, schedule,
        created_at, updated_at
    FROM users
"#;

/// PostgreSQL 実装の UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
   pool: PgPool,
}

impl PostgresUserRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }

   async fn find_one_by(&self, column: &str, value: &str) -> Result<Option<User>, InfraError> {
      let sql = format!("{SELECT_USER} WHERE {column} = $1");
      let row = sqlx::query_as::<_, UserRow>(&sql)
         .bind(value)
         .fetch_optional(&self.pool)
         .await?;

      row.map(User::try_from).transpose()
   }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
   async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError> {
      let sql = format!("{SELECT_USER} WHERE id = $1");
      let row = sqlx::query_as::<_, UserRow>(&sql)
         .bind(id.as_uuid())
         .fetch_optional(&self.pool)
         .await?;

      row.map(User::try_from).transpose()
   }

   async fn find_by_username(&self, username: &Username) -> Result<Option<User>, InfraError> {
      self.find_one_by("username", username.as_str()).await
   }

   async fn find_by_rfid_token(&self, token: &RfidToken) -> Result<Option<User>, InfraError> {
      self.find_one_by("rfid_token", token.as_str()).await
   }

   async fn exists_by_username(&self, username: &Username) -> Result<bool, InfraError> {
      let (exists,): (bool,) =
         sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
            .bind(username.as_str())
            .fetch_one(&self.pool)
            .await?;

      Ok(exists)
   }

   async fn find_all(&self) -> Result<Vec<User>, InfraError> {
      let sql = format!("{SELECT_USER} ORDER BY created_at ASC, id ASC");
      let rows = sqlx::query_as::<_, UserRow>(&sql)
         .fetch_all(&self.pool)
         .await?;

      rows.into_iter().map(User::try_from).collect()
   }

   async fn insert(&self, user: &User) -> Result<(), InfraError> {
      let role: &'static str = user.role().into();

      sqlx::query(
         r#"
            INSERT INTO users (
                id, username, password_hash, rfid_token, role, is_admin, schedule,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
      )
      .bind(user.id().as_uuid())
      .bind(user.username().as_str())
      .bind(user.password_hash().as_str())
      .bind(user.rfid_token().map(RfidToken::as_str))
      .bind(role)
      .bind(user.is_admin())
      .bind(serde_json::to_value(user.schedule())?)
      .bind(user.created_at())
      .bind(user.updated_at())
      .execute(&self.pool)
      .await?;

      Ok(())
   }

   async fn update(&self, user: &User) -> Result<(), InfraError> {
      let role: &'static str = user.role().into();

      sqlx::query(
         r#"
            UPDATE users SET
                username = $2,
                password_hash = $3,
                rfid_token = $4,
                role = $5,
                is_admin = $6,
                schedule = $7,
                updated_at = $8
            WHERE id = $1
            "#,
      )
      .bind(user.id().as_uuid())
      .bind(user.username().as_str())
      .bind(user.password_hash().as_str())
      .bind(user.rfid_token().map(RfidToken::as_str))
      .bind(role)
      .bind(user.is_admin())
      .bind(serde_json::to_value(user.schedule())?)
      .bind(user.updated_at())
      .execute(&self.pool)
      .await?;

      Ok(())
   }
}
