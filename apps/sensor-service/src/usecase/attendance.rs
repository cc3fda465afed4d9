//! 打刻ユースケース
//!
//! 打刻判定（[`presencia_domain::attendance::decide`]）の結果を永続化する。
//!
//! 1. 対象ユーザーの直前の打刻記録を取得
//! 2. シグナルと在室状態から打刻種別を決める
//! 3. 退室系の打刻なら勤務セッションを記録（失敗してもログのみ）。
//!    アプリからの手動打刻では入室直後の `SALIDA` だけが対象
//! 4. 打刻記録を追記

use std::sync::Arc;

use chrono::{DateTime, Utc};
use presencia_domain::{
    attendance::{AttendanceDecision, AttendanceSignal, SessionSpan, decide, decide_manual},
    clock::Clock,
    presence::{AuthMethod, PresenceRecord},
    user::Username,
    work_session::WorkSession,
};
use presencia_infra::repository::{PresenceRepository, UserRepository, WorkSessionRepository};
use presencia_shared::{
    event_log::{error as log_error, event},
    log_business_event,
};

use crate::error::ApiError;

/// 端末での打刻成功時の詳細
pub const DETAILS_ACCESS_GRANTED: &str = "Acceso Correcto";

/// アプリからの手動打刻のデフォルト位置
pub const DEFAULT_MANUAL_LOCATION: &str = "APP";

/// 手動打刻の入力
#[derive(Debug, Clone)]
pub struct ManualClockInput {
    pub username: String,
    pub tipo:     String,
    pub location: Option<String>,
}

/// 打刻ユースケース
pub struct AttendanceUseCaseImpl {
    user_repository: Arc<dyn UserRepository>,
    presence_repository: Arc<dyn PresenceRepository>,
    work_session_repository: Arc<dyn WorkSessionRepository>,
    clock: Arc<dyn Clock>,
}

impl AttendanceUseCaseImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        presence_repository: Arc<dyn PresenceRepository>,
        work_session_repository: Arc<dyn WorkSessionRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            presence_repository,
            work_session_repository,
            clock,
        }
    }

    /// 認証済みユーザーの打刻を記録する
    ///
    /// 打刻記録は必ず書き込む。勤務セッションの記録に失敗しても打刻は成立する。
    #[tracing::instrument(skip_all, fields(username = %username, method = %auth_method))]
    pub async fn record_movement(
        &self,
        username: &str,
        auth_method: AuthMethod,
        signal: AttendanceSignal,
        details: String,
    ) -> Result<PresenceRecord, ApiError> {
        let last = self
            .presence_repository
            .find_latest_by_username(username)
            .await?;

        let now = self.clock.now();
        let decision = decide(last.as_ref(), signal, now);

        self.persist(username, auth_method, decision, details, now)
            .await
    }

    /// アプリからの手動打刻を記録する
    ///
    /// `tipo` は端末と同じ規則で解釈する。ユーザーが存在しない場合は 400。
    /// 勤務セッションは入室直後の `SALIDA` でだけ記録する。
    pub async fn record_manual(&self, input: ManualClockInput) -> Result<PresenceRecord, ApiError> {
        let username = Username::new(input.username)?;
        let signal = AttendanceSignal::parse(Some(&input.tipo))?;

        if !self.user_repository.exists_by_username(&username).await? {
            return Err(ApiError::BadRequest("Usuario no encontrado".to_string()));
        }

        let location = input
            .location
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MANUAL_LOCATION.to_string());

        let last = self
            .presence_repository
            .find_latest_by_username(username.as_str())
            .await?;
        let now = self.clock.now();
        let decision = decide_manual(last.as_ref(), signal, now);

        self.persist(
            username.as_str(),
            AuthMethod::ManualApp,
            decision,
            format!("Registrado desde App ({})", location),
            now,
        )
        .await
    }

    /// 判定結果を書き込む
    async fn persist(
        &self,
        username: &str,
        auth_method: AuthMethod,
        decision: AttendanceDecision,
        details: String,
        now: DateTime<Utc>,
    ) -> Result<PresenceRecord, ApiError> {
        if let Some(span) = decision.closed_session {
            self.close_session(username, span).await;
        }

        let record = PresenceRecord::granted(username, auth_method, decision.movement, details, now);
        self.presence_repository.insert(&record).await?;

        log_business_event!(
            event.category = event::category::ATTENDANCE,
            event.action = event::action::ATTENDANCE_RECORDED,
            event.entity_type = event::entity_type::PRESENCE_RECORD,
            event.entity_id = %record.id(),
            event.username = username,
            event.movement = %record.movement(),
            event.was_inside = decision.was_inside,
            event.result = event::result::SUCCESS,
            "打刻を記録しました"
        );

        Ok(record)
    }

    /// 勤務セッションを記録する
    ///
    /// エラーは呼び出し元に返さない。
    async fn close_session(&self, username: &str, span: SessionSpan) {
        let session = match WorkSession::close(username, span) {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(
                    error.category = log_error::category::DOMAIN,
                    error.kind = log_error::kind::SESSION_ACCOUNTING,
                    "勤務セッションを計算できませんでした: {}",
                    e
                );
                log_business_event!(
                    event.category = event::category::ATTENDANCE,
                    event.action = event::action::SESSION_SKIPPED,
                    event.username = username,
                    event.result = event::result::FAILURE,
                    "勤務セッションの記録をスキップしました"
                );
                return;
            }
        };

        if let Err(e) = self.work_session_repository.insert(&session).await {
            tracing::error!(
                error.category = log_error::category::INFRASTRUCTURE,
                error.kind = log_error::kind::SESSION_ACCOUNTING,
                "勤務セッションの保存に失敗しました: {}",
                e
            );
            log_business_event!(
                event.category = event::category::ATTENDANCE,
                event.action = event::action::SESSION_SKIPPED,
                event.username = username,
                event.result = event::result::FAILURE,
                "勤務セッションの記録をスキップしました"
            );
            return;
        }

        log_business_event!(
            event.category = event::category::ATTENDANCE,
            event.action = event::action::SESSION_CLOSED,
            event.entity_type = event::entity_type::WORK_SESSION,
            event.entity_id = %session.id(),
            event.username = username,
            event.duration_minutes = session.duration_minutes(),
            event.result = event::result::SUCCESS,
            "勤務セッションを記録しました"
        );
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use pretty_assertions::assert_eq;
    use presencia_domain::{clock::FixedClock, presence::MovementType};
    use presencia_infra::mock::{
        FailingWorkSessionRepository,
        MockPresenceRepository,
        MockUserRepository,
        MockWorkSessionRepository,
    };
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_760_000_000, 0).unwrap()
    }

    fn entry_at(at: DateTime<Utc>) -> PresenceRecord {
        PresenceRecord::granted(
            "borja",
            AuthMethod::Token,
            MovementType::Entrada,
            DETAILS_ACCESS_GRANTED,
            at,
        )
    }

    fn sut_with(
        presence: &MockPresenceRepository,
        sessions: Arc<dyn WorkSessionRepository>,
        now: DateTime<Utc>,
    ) -> AttendanceUseCaseImpl {
        AttendanceUseCaseImpl::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(presence.clone()),
            sessions,
            Arc::new(FixedClock::new(now)),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn test_在室中のトグルで退室と勤務セッションが記録される(now: DateTime<Utc>) {
        // Given
        let presence = MockPresenceRepository::new();
        presence.add_record(entry_at(now - Duration::minutes(125)));
        let sessions = MockWorkSessionRepository::new();
        let sut = sut_with(&presence, Arc::new(sessions.clone()), now);

        // When
        let record = sut
            .record_movement(
                "borja",
                AuthMethod::Token,
                AttendanceSignal::Toggle,
                DETAILS_ACCESS_GRANTED.to_string(),
            )
            .await
            .unwrap();

        // Then
        assert_eq!(record.movement(), MovementType::Salida);
        assert_eq!(presence.records().len(), 2);
        let stored = sessions.sessions();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].duration_minutes(), 125);
        assert_eq!(stored[0].start(), now - Duration::minutes(125));
        assert_eq!(stored[0].end(), now);
    }

    #[rstest]
    #[tokio::test]
    async fn test_勤務セッションの保存に失敗しても打刻は記録される(now: DateTime<Utc>) {
        // Given
        let presence = MockPresenceRepository::new();
        presence.add_record(entry_at(now - Duration::hours(8)));
        let sut = sut_with(&presence, Arc::new(FailingWorkSessionRepository), now);

        // When
        let result = sut
            .record_movement(
                "borja",
                AuthMethod::Token,
                AttendanceSignal::Toggle,
                DETAILS_ACCESS_GRANTED.to_string(),
            )
            .await;

        // Then
        assert!(result.is_ok());
        let records = presence.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].movement(), MovementType::Salida);
    }

    #[rstest]
    #[tokio::test]
    async fn test_終了が開始より前の区間はセッションを作らず打刻だけ記録する(now: DateTime<Utc>) {
        // Given: 直前の記録が未来時刻（端末の時計ずれ）
        let presence = MockPresenceRepository::new();
        presence.add_record(entry_at(now + Duration::minutes(5)));
        let sessions = MockWorkSessionRepository::new();
        let sut = sut_with(&presence, Arc::new(sessions.clone()), now);

        // When
        let record = sut
            .record_movement(
                "borja",
                AuthMethod::Token,
                AttendanceSignal::Toggle,
                DETAILS_ACCESS_GRANTED.to_string(),
            )
            .await
            .unwrap();

        // Then
        assert_eq!(record.movement(), MovementType::Salida);
        assert!(sessions.sessions().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_手動打刻は未登録ユーザーを400で拒否する(now: DateTime<Utc>) {
        let presence = MockPresenceRepository::new();
        let sut = sut_with(&presence, Arc::new(MockWorkSessionRepository::new()), now);

        let result = sut
            .record_manual(ManualClockInput {
                username: "nadie".to_string(),
                tipo:     "ENTRADA".to_string(),
                location: None,
            })
            .await;

        assert!(matches!(result, Err(ApiError::BadRequest(_))));
        assert!(presence.records().is_empty());
    }
}
