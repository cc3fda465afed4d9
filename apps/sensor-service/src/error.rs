//! # Sensor Service エラー定義
//!
//! Sensor Service 固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! レスポンス本文は [`presencia_shared::ErrorResponse`]（RFC 9457 Problem Details）。

use axum::{
   Json,
   http::StatusCode,
   response::{IntoResponse, Response},
};
use presencia_domain::DomainError;
use presencia_shared::ErrorResponse;
use thiserror::Error;

/// Sensor Service で発生するエラー
#[derive(Debug, Error)]
pub enum ApiError {
   /// 不正なリクエスト（必須項目の欠落、未知の打刻種別、ユーザー名の重複）
   #[error("不正なリクエスト: {0}")]
   BadRequest(String),

   /// 認証失敗（未登録トークン、PIN 不一致、ログイン失敗）
   #[error("認証に失敗しました: {0}")]
   Unauthorized(String),

   /// リソースが見つからない
   #[error("リソースが見つかりません: {0}")]
   NotFound(String),

   /// データベースエラー
   #[error("データベースエラー: {0}")]
   Database(#[from] presencia_infra::InfraError),

   /// 内部エラー
   #[error("内部エラー: {0}")]
   Internal(String),
}

impl From<DomainError> for ApiError {
   fn from(err: DomainError) -> Self {
      match err {
         DomainError::Validation(msg) | DomainError::Conflict(msg) => ApiError::BadRequest(msg),
         err @ DomainError::NotFound { .. } => ApiError::NotFound(err.to_string()),
      }
   }
}

impl IntoResponse for ApiError {
   fn into_response(self) -> Response {
      let body = match &self {
         ApiError::BadRequest(msg) => ErrorResponse::bad_request(msg.clone()),
         ApiError::Unauthorized(msg) => ErrorResponse::access_denied(msg.clone()),
         ApiError::NotFound(msg) => ErrorResponse::not_found(msg.clone()),
         ApiError::Database(e) => {
            tracing::error!(
               error.category = presencia_shared::event_log::error::category::INFRASTRUCTURE,
               error.kind = presencia_shared::event_log::error::kind::DATABASE,
               span_trace = %e.span_trace(),
               "データベースエラー: {}",
               e
            );
            ErrorResponse::internal_error()
         }
         ApiError::Internal(msg) => {
            tracing::error!(
               error.kind = presencia_shared::event_log::error::kind::INTERNAL,
               "内部エラー: {}",
               msg
            );
            ErrorResponse::internal_error()
         }
      };

      let status =
         StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
      (status, Json(body)).into_response()
   }
}
