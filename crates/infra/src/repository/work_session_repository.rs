//! # WorkSessionRepository
//!
//! 勤務セッションの永続化を担当するリポジトリ。
//! セッションは作成後に変更しないため、追記と検索のみを提供する。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use presencia_domain::work_session::{WorkSession, WorkSessionId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 勤務セッションリポジトリトレイト
#[async_trait]
pub trait WorkSessionRepository: Send + Sync {
   /// 勤務セッションを追記する
   async fn insert(&self, session: &WorkSession) -> Result<(), InfraError>;

   /// ユーザーの勤務セッションを取得する（開始時刻の昇順）
   async fn find_by_username(&self, username: &str) -> Result<Vec<WorkSession>, InfraError>;

   /// 開始時刻が `[from, to]` に含まれる勤務セッションを取得する（開始時刻の昇順）
   async fn find_by_username_started_between(
      &self,
      username: &str,
      from: DateTime<Utc>,
      to: DateTime<Utc>,
   ) -> Result<Vec<WorkSession>, InfraError>;
}

/// DB の work_sessions テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct WorkSessionRow {
   id:               Uuid,
   username:         String,
   started_at:       DateTime<Utc>,
   ended_at:         DateTime<Utc>,
   duration_minutes: i64,
}

impl From<WorkSessionRow> for WorkSession {
   fn from(row: WorkSessionRow) -> Self {
      WorkSession::from_db(
         WorkSessionId::from_uuid(row.id),
         row.username,
         row.started_at,
         row.ended_at,
         row.duration_minutes,
      )
   }
}

/// PostgreSQL 実装の WorkSessionRepository
#[derive(Debug, Clone)]
pub struct PostgresWorkSessionRepository {
   pool: PgPool,
}

impl PostgresWorkSessionRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl WorkSessionRepository for PostgresWorkSessionRepository {
   async fn insert(&self, session: &WorkSession) -> Result<(), InfraError> {
      sqlx::query(
         r#"
            INSERT INTO work_sessions (id, username, started_at, ended_at, duration_minutes)
            VALUES ($1, $2, $3, $4, $5)
            "#,
      )
      .bind(session.id().as_uuid())
      .bind(session.username())
      .bind(session.start())
      .bind(session.end())
      .bind(session.duration_minutes())
      .execute(&self.pool)
      .await?;

      Ok(())
   }

   async fn find_by_username(&self, username: &str) -> Result<Vec<WorkSession>, InfraError> {
      let rows = sqlx::query_as::<_, WorkSessionRow>(
         r#"
            SELECT id, username, started_at, ended_at, duration_minutes
            FROM work_sessions
            WHERE username = $1
            ORDER BY started_at ASC
            "#,
      )
      .bind(username)
      .fetch_all(&self.pool)
      .await?;

      Ok(rows.into_iter().map(WorkSession::from).collect())
   }

   async fn find_by_username_started_between(
      &self,
      username: &str,
      from: DateTime<Utc>,
      to: DateTime<Utc>,
   ) -> Result<Vec<WorkSession>, InfraError> {
      let rows = sqlx::query_as::<_, WorkSessionRow>(
         r#"
            SELECT id, username, started_at, ended_at, duration_minutes
            FROM work_sessions
            WHERE username = $1 AND started_at BETWEEN $2 AND $3
            ORDER BY started_at ASC
            "#,
      )
      .bind(username)
      .bind(from)
      .bind(to)
      .fetch_all(&self.pool)
      .await?;

      Ok(rows.into_iter().map(WorkSession::from).collect())
   }
}
