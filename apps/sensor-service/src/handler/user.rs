//! # ユーザーハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /api/usuarios/registrar` - ユーザー登録
//! - `PUT /api/usuarios/{id}` - ユーザーの部分更新
//!
//! レスポンスにパスワードハッシュは含めない。

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use presencia_domain::user::{Schedule, User, UserId};
use presencia_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    usecase::{RegisterUserInput, UpdateUserInput, UserUseCaseImpl},
};

/// ユーザー API の共有状態
pub struct UserState {
    pub usecase: Arc<UserUseCaseImpl>,
}

// --- リクエスト/レスポンス型 ---

/// ユーザー登録リクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub username:   String,
    pub password:   String,
    pub rfid_token: Option<String>,
    pub rol:        Option<String>,
    pub is_admin:   Option<bool>,
    pub horario:    Option<BTreeMap<String, String>>,
}

/// ユーザー更新リクエスト（未指定の項目は変更しない）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username:   Option<String>,
    pub password:   Option<String>,
    pub rfid_token: Option<String>,
    pub rol:        Option<String>,
    pub is_admin:   Option<bool>,
    pub horario:    Option<BTreeMap<String, String>>,
}

/// ユーザー DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id:         Uuid,
    pub username:   String,
    pub rfid_token: Option<String>,
    pub rol:        String,
    pub is_admin:   bool,
    pub horario:    BTreeMap<String, String>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id:         *user.id().as_uuid(),
            username:   user.username().as_str().to_string(),
            rfid_token: user.rfid_token().map(|t| t.as_str().to_string()),
            rol:        user.role().to_string(),
            is_admin:   user.is_admin(),
            horario:    user.schedule().as_map().clone(),
        }
    }
}

// --- ハンドラ ---

/// POST /api/usuarios/registrar
///
/// ## レスポンス
///
/// - `201 Created`: 登録したユーザー
/// - `400 Bad Request`: ユーザー名の重複、入力不備
#[tracing::instrument(skip_all)]
pub async fn register_user(
    State(state): State<Arc<UserState>>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = RegisterUserInput {
        username:   req.username,
        password:   req.password,
        rfid_token: req.rfid_token,
        role:       req.rol,
        is_admin:   req.is_admin,
        schedule:   req.horario.map(Schedule::new),
    };

    let user = state.usecase.register_user(input).await?;

    let response = ApiResponse::new(UserDto::from(&user));
    Ok((StatusCode::CREATED, Json(response)))
}

/// PUT /api/usuarios/{id}
///
/// ## レスポンス
///
/// - `200 OK`: 更新後のユーザー
/// - `400 Bad Request`: 他のユーザーと重複するユーザー名、入力不備
/// - `404 Not Found`: ユーザーが存在しない
#[tracing::instrument(skip_all, fields(%id))]
pub async fn update_user(
    State(state): State<Arc<UserState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = UpdateUserInput {
        user_id:    UserId::from_uuid(id),
        username:   req.username,
        password:   req.password,
        rfid_token: req.rfid_token,
        role:       req.rol,
        is_admin:   req.is_admin,
        schedule:   req.horario.map(Schedule::new),
    };

    let user = state.usecase.update_user(input).await?;

    let response = ApiResponse::new(UserDto::from(&user));
    Ok((StatusCode::OK, Json(response)))
}
