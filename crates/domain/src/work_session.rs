//! # 勤務セッション
//!
//! 入室系の打刻から退室系の打刻までの区間を、経過分数付きで記録する。
//! 打刻記録から導出され、作成後に変更されることはない。

use chrono::{DateTime, Utc};

use crate::{DomainError, attendance::SessionSpan};

define_uuid_id! {
    /// 勤務セッション ID
    pub struct WorkSessionId;
}

/// 勤務セッションエンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkSession {
    id: WorkSessionId,
    username: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    duration_minutes: i64,
}

impl WorkSession {
    /// 区間を閉じて勤務セッションを作成する
    ///
    /// # エラー
    ///
    /// 終了時刻が開始時刻より前の場合は `DomainError::Validation` を返す。
    pub fn close(username: impl Into<String>, span: SessionSpan) -> Result<Self, DomainError> {
        if span.end < span.start {
            return Err(DomainError::Validation(format!(
                "勤務セッションの終了 ({}) が開始 ({}) より前です",
                span.end, span.start
            )));
        }

        Ok(Self {
            id: WorkSessionId::new(),
            username: username.into(),
            start: span.start,
            end: span.end,
            duration_minutes: span.duration_minutes(),
        })
    }

    /// 既存のデータから復元する（データベースから取得時）
    pub fn from_db(
        id: WorkSessionId,
        username: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        duration_minutes: i64,
    ) -> Self {
        Self {
            id,
            username,
            start,
            end,
            duration_minutes,
        }
    }

    pub fn id(&self) -> &WorkSessionId {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration_minutes
    }
}
