//! # PresenceRepository
//!
//! 打刻記録の永続化を担当するリポジトリ。
//!
//! 打刻記録は追記専用のため、更新・削除の操作は持たない。
//! 一覧は記録時刻の昇順で返す。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use presencia_domain::presence::{AuthMethod, MovementType, PresenceRecord, PresenceRecordId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 打刻記録リポジトリトレイト
#[async_trait]
pub trait PresenceRepository: Send + Sync {
   /// 打刻記録を追記する
   async fn insert(&self, record: &PresenceRecord) -> Result<(), InfraError>;

   /// ユーザーの最新の打刻記録を取得する
   ///
   /// 打刻判定の「直前の記録」として使う。拒否された試行も含む。
   async fn find_latest_by_username(
      &self,
      username: &str,
   ) -> Result<Option<PresenceRecord>, InfraError>;

   /// ユーザーの打刻履歴を取得する（記録時刻の昇順）
   async fn find_by_username(&self, username: &str) -> Result<Vec<PresenceRecord>, InfraError>;

   /// 全ユーザーの打刻記録を取得する（記録時刻の昇順）
   async fn find_all(&self) -> Result<Vec<PresenceRecord>, InfraError>;
}

/// DB の presence_records テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct PresenceRecordRow {
   id:             Uuid,
   username:       String,
   recorded_at:    DateTime<Utc>,
   auth_method:    String,
   movement:       String,
   access_granted: bool,
   details:        String,
}

impl TryFrom<PresenceRecordRow> for PresenceRecord {
   type Error = InfraError;

   fn try_from(row: PresenceRecordRow) -> Result<Self, Self::Error> {
      Ok(PresenceRecord::from_db(
         PresenceRecordId::from_uuid(row.id),
         row.username,
         row.recorded_at,
         row.auth_method.parse::<AuthMethod>()?,
         row.movement.parse::<MovementType>()?,
         row.access_granted,
         row.details,
      ))
   }
}

/// PostgreSQL 実装の PresenceRepository
#[derive(Debug, Clone)]
pub struct PostgresPresenceRepository {
   pool: PgPool,
}

impl PostgresPresenceRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl PresenceRepository for PostgresPresenceRepository {
   async fn insert(&self, record: &PresenceRecord) -> Result<(), InfraError> {
      sqlx::query(
         r#"
            INSERT INTO presence_records (
                id, username, recorded_at, auth_method, movement, access_granted, details
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
      )
      .bind(record.id().as_uuid())
      .bind(record.username())
      .bind(record.timestamp())
      .bind(record.auth_method().as_str())
      .bind(record.movement().as_str())
      .bind(record.access_granted())
      .bind(record.details())
      .execute(&self.pool)
      .await?;

      Ok(())
   }

   async fn find_latest_by_username(
      &self,
      username: &str,
   ) -> Result<Option<PresenceRecord>, InfraError> {
      // 同一時刻の記録は UUID v7 の生成順で後のものを最新とする
      let row = sqlx::query_as::<_, PresenceRecordRow>(
         r#"
            SELECT id, username, recorded_at, auth_method, movement, access_granted, details
            FROM presence_records
            WHERE username = $1
            ORDER BY recorded_at DESC, id DESC
            LIMIT 1
            "#,
      )
      .bind(username)
      .fetch_optional(&self.pool)
      .await?;

      row.map(PresenceRecord::try_from).transpose()
   }

   async fn find_by_username(&self, username: &str) -> Result<Vec<PresenceRecord>, InfraError> {
      let rows = sqlx::query_as::<_, PresenceRecordRow>(
         r#"
            SELECT id, username, recorded_at, auth_method, movement, access_granted, details
            FROM presence_records
            WHERE username = $1
            ORDER BY recorded_at ASC, id ASC
            "#,
      )
      .bind(username)
      .fetch_all(&self.pool)
      .await?;

      rows.into_iter().map(PresenceRecord::try_from).collect()
   }

   async fn find_all(&self) -> Result<Vec<PresenceRecord>, InfraError> {
      let rows = sqlx::query_as::<_, PresenceRecordRow>(
         r#"
            SELECT id, username, recorded_at, auth_method, movement, access_granted, details
            FROM presence_records
            ORDER BY recorded_at ASC, id ASC
            "#,
      )
      .fetch_all(&self.pool)
      .await?;

      rows.into_iter().map(PresenceRecord::try_from).collect()
   }
}
