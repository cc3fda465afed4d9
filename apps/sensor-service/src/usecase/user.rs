//! ユーザー管理ユースケース

use std::sync::Arc;

use presencia_domain::{
    DomainError,
    clock::Clock,
    password::PlainPassword,
    user::{NewUser, RfidToken, Schedule, User, UserId, UserRole, Username},
};
use presencia_infra::{InfraError, PasswordHasher, repository::UserRepository};
use presencia_shared::{event_log::event, log_business_event};

use crate::error::ApiError;

/// ユーザー登録の入力
#[derive(Debug, Clone, Default)]
pub struct RegisterUserInput {
    pub username:   String,
    pub password:   String,
    pub rfid_token: Option<String>,
    pub role:       Option<String>,
    pub is_admin:   Option<bool>,
    pub schedule:   Option<Schedule>,
}

/// ユーザー更新の入力
///
/// `None` の項目は変更しない。`rfid_token` の空文字列はトークンの解除、
/// `password` の空文字列は「変更しない」を意味する。
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub user_id:    UserId,
    pub username:   Option<String>,
    pub password:   Option<String>,
    pub rfid_token: Option<String>,
    pub role:       Option<String>,
    pub is_admin:   Option<bool>,
    pub schedule:   Option<Schedule>,
}

/// ユーザー管理ユースケース
pub struct UserUseCaseImpl {
    user_repository: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
}

impl UserUseCaseImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
            clock,
        }
    }

    /// ユーザーを登録する
    ///
    /// 1. 入力の検証
    /// 2. ユーザー名の重複チェック（重複なら何も書き込まない）
    /// 3. パスワードのハッシュ化
    /// 4. users テーブルに挿入
    pub async fn register_user(&self, input: RegisterUserInput) -> Result<User, ApiError> {
        let username = Username::new(input.username)?;
        let password = PlainPassword::from_input(Some(input.password))
            .ok_or_else(|| ApiError::BadRequest("パスワードは必須です".to_string()))?;
        let rfid_token = parse_rfid_token(input.rfid_token)?;
        let role = parse_role(input.role)?.unwrap_or_default();

        if self.user_repository.exists_by_username(&username).await? {
            return Err(duplicate_username(&username).into());
        }

        let user = User::new(NewUser {
            id: UserId::new(),
            username,
            password_hash: self.password_hasher.hash(&password)?,
            rfid_token,
            role,
            is_admin: input.is_admin.unwrap_or(false),
            schedule: input.schedule.unwrap_or_default(),
            now: self.clock.now(),
        });

        self.user_repository
            .insert(&user)
            .await
            .map_err(|e| map_unique_violation(e, user.username()))?;

        log_business_event!(
            event.category = event::category::USER,
            event.action = event::action::USER_REGISTERED,
            event.entity_type = event::entity_type::USER,
            event.entity_id = %user.id(),
            event.username = %user.username(),
            event.result = event::result::SUCCESS,
            "ユーザーを登録しました"
        );

        Ok(user)
    }

    /// ユーザー情報を部分更新する
    pub async fn update_user(&self, input: UpdateUserInput) -> Result<User, ApiError> {
        let mut user = self
            .user_repository
            .find_by_id(&input.user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("ユーザー '{}' が見つかりません", input.user_id)))?;
        let now = self.clock.now();

        if let Some(username) = input.username {
            let username = Username::new(username)?;
            if &username != user.username() {
                if self.user_repository.exists_by_username(&username).await? {
                    return Err(duplicate_username(&username).into());
                }
                user = user.with_username(username, now);
            }
        }

        if let Some(password) = PlainPassword::from_input(input.password) {
            user = user.with_password_hash(self.password_hasher.hash(&password)?, now);
        }

        if let Some(token) = input.rfid_token {
            user = user.with_rfid_token(parse_rfid_token(Some(token))?, now);
        }

        if input.role.is_some() || input.is_admin.is_some() {
            let role = parse_role(input.role)?.unwrap_or(user.role());
            let is_admin = input.is_admin.unwrap_or(user.is_admin());
            user = user.with_role(role, is_admin, now);
        }

        if let Some(schedule) = input.schedule {
            user = user.with_schedule(schedule, now);
        }

        self.user_repository
            .update(&user)
            .await
            .map_err(|e| map_unique_violation(e, user.username()))?;

        log_business_event!(
            event.category = event::category::USER,
            event.action = event::action::USER_UPDATED,
            event.entity_type = event::entity_type::USER,
            event.entity_id = %user.id(),
            event.username = %user.username(),
            event.result = event::result::SUCCESS,
            "ユーザーを更新しました"
        );

        Ok(user)
    }

    /// 管理者ユーザーが存在しなければ作成する
    ///
    /// 作成した場合は `true` を返す。既存ユーザーの権限やパスワードは変更しない。
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, ApiError> {
        let name = Username::new(username)?;
        if self.user_repository.exists_by_username(&name).await? {
            tracing::debug!(username = %name, "初期管理者は既に存在します");
            return Ok(false);
        }

        self.register_user(RegisterUserInput {
            username: username.to_string(),
            password: password.to_string(),
            role: Some(UserRole::Admin.to_string()),
            is_admin: Some(true),
            ..Default::default()
        })
        .await?;

        tracing::info!(username = %name, "初期管理者を作成しました");
        Ok(true)
    }
}

/// 空文字列はトークンなしとして扱う
fn parse_rfid_token(raw: Option<String>) -> Result<Option<RfidToken>, DomainError> {
    raw.filter(|t| !t.trim().is_empty())
        .map(RfidToken::new)
        .transpose()
}

fn parse_role(raw: Option<String>) -> Result<Option<UserRole>, DomainError> {
    raw.map(|r| r.trim().to_lowercase().parse::<UserRole>())
        .transpose()
}

fn duplicate_username(username: &Username) -> DomainError {
    DomainError::Conflict(format!("Error: El usuario '{}' ya existe.", username))
}

/// 同時登録や RFID トークンの重複による一意性制約違反は 400 にする
fn map_unique_violation(err: InfraError, username: &Username) -> ApiError {
    if err.is_unique_violation() {
        ApiError::BadRequest(format!(
            "ユーザー '{}' のユーザー名または RFID トークンは既に使用されています",
            username
        ))
    } else {
        ApiError::Database(err)
    }
}
