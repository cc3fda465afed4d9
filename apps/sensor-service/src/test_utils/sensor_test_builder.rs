//! センサーサービステストビルダー
//!
//! モックリポジトリ一式と、それを注入したユースケースを組み立てる。
//! モックは `Arc<Mutex<_>>` を共有するため、セットアップ後もテストから
//! 初期データの投入と書き込み結果の確認ができる。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use presencia_domain::{
    clock::{Clock, FixedClock},
    presence::{AuthMethod, MovementType, PresenceRecord},
    user::{NewUser, RfidToken, Schedule, User, UserId, UserRole, Username},
};
use presencia_infra::{
    PasswordHasher,
    mock::{
        FailingWorkSessionRepository,
        MockPasswordHasher,
        MockPresenceRepository,
        MockSensorRepository,
        MockUserRepository,
        MockWorkSessionRepository,
    },
    repository::WorkSessionRepository,
};

use crate::{
    handler::AppStates,
    usecase::{
        AttendanceUseCaseImpl,
        IngestUseCaseImpl,
        QueryUseCaseImpl,
        UserUseCaseImpl,
        attendance::DETAILS_ACCESS_GRANTED,
    },
};

/// SensorTestBuilder が生成するモックとユースケースのセット
pub struct SensorTestSetup {
    pub users:      MockUserRepository,
    pub presence:   MockPresenceRepository,
    pub sessions:   MockWorkSessionRepository,
    pub sensors:    MockSensorRepository,
    pub attendance: Arc<AttendanceUseCaseImpl>,
    pub ingest:     Arc<IngestUseCaseImpl>,
    pub user:       Arc<UserUseCaseImpl>,
    pub query:      Arc<QueryUseCaseImpl>,
}

impl SensorTestSetup {
    /// ルーター用の共有状態を作る
    pub fn app_states(&self) -> AppStates {
        AppStates::new(
            self.attendance.clone(),
            self.ingest.clone(),
            self.user.clone(),
            self.query.clone(),
        )
    }
}

/// センサーサービステストビルダー
///
/// # 使用例
///
/// ```ignore
/// let builder = SensorTestBuilder::new();
/// let setup = builder.build();
/// setup.users.add_user(builder.build_user("borja", "A1B2C3D4", "1234"));
///
/// let outcome = setup.ingest.ingest(input).await;
/// ```
pub struct SensorTestBuilder {
    now: DateTime<Utc>,
    failing_work_sessions: bool,
}

impl Default for SensorTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorTestBuilder {
    pub fn new() -> Self {
        Self {
            now: Utc::now(),
            failing_work_sessions: false,
        }
    }

    /// 現在時刻を指定
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// 勤務セッションの書き込みを常に失敗させる
    pub fn with_failing_work_sessions(mut self) -> Self {
        self.failing_work_sessions = true;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// トークンとパスワード（PIN）を持つ作業者ユーザーを作成
    ///
    /// パスワードは [`MockPasswordHasher`] の形式でハッシュ化する。
    pub fn build_user(&self, username: &str, token: &str, password: &str) -> User {
        User::new(NewUser {
            id:            UserId::new(),
            username:      Username::new(username).unwrap(),
            password_hash: MockPasswordHasher::hash_of(password),
            rfid_token:    Some(RfidToken::new(token).unwrap()),
            role:          UserRole::Trabajador,
            is_admin:      false,
            schedule:      Schedule::default(),
            now:           self.now,
        })
    }

    /// 許可された入室記録を作成
    pub fn build_entry(&self, username: &str, at: DateTime<Utc>) -> PresenceRecord {
        PresenceRecord::granted(
            username,
            AuthMethod::Token,
            MovementType::Entrada,
            DETAILS_ACCESS_GRANTED,
            at,
        )
    }

    /// モックを注入したユースケース一式を組み立てる
    pub fn build(&self) -> SensorTestSetup {
        let users = MockUserRepository::new();
        let presence = MockPresenceRepository::new();
        let sessions = MockWorkSessionRepository::new();
        let sensors = MockSensorRepository::new();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(self.now));
        let hasher: Arc<dyn PasswordHasher> = Arc::new(MockPasswordHasher);

        let session_repo: Arc<dyn WorkSessionRepository> = if self.failing_work_sessions {
            Arc::new(FailingWorkSessionRepository)
        } else {
            Arc::new(sessions.clone())
        };

        let attendance = Arc::new(AttendanceUseCaseImpl::new(
            Arc::new(users.clone()),
            Arc::new(presence.clone()),
            session_repo.clone(),
            clock.clone(),
        ));
        let ingest = Arc::new(IngestUseCaseImpl::new(
            Arc::new(users.clone()),
            Arc::new(presence.clone()),
            Arc::new(sensors.clone()),
            hasher.clone(),
            attendance.clone(),
            clock.clone(),
        ));
        let user = Arc::new(UserUseCaseImpl::new(
            Arc::new(users.clone()),
            hasher,
            clock.clone(),
        ));
        let query = Arc::new(QueryUseCaseImpl::new(
            Arc::new(users.clone()),
            Arc::new(presence.clone()),
            session_repo,
            Arc::new(sensors.clone()),
            clock,
        ));

        SensorTestSetup {
            users,
            presence,
            sessions,
            sensors,
            attendance,
            ingest,
            user,
            query,
        }
    }
}
