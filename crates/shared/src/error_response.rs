//! # エラーレスポンス（RFC 9457 Problem Details）
//!
//! 端末・モバイルアプリに返すエラー本文。
//!
//! `ErrorResponse` はデータ構造だけを持ち、axum の `IntoResponse` 変換は
//! sensor-service 側で行う（shared は axum に依存しない）。
//!
//! ```json
//! {
//!   "type": "https://presencia.example.com/errors/access-denied",
//!   "title": "Access Denied",
//!   "status": 401,
//!   "detail": "PIN INCORRECTO"
//! }
//! ```
//!
//! 端末のファームウェアは `detail` をそのまま表示するため、
//! 認証失敗の `detail` は大文字の短い文言にしている。

use serde::{Deserialize, Serialize};

const ERROR_TYPE_BASE: &str = "https://presencia.example.com/errors";

/// エラーレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
   #[serde(rename = "type")]
   pub error_type: String,
   pub title:      String,
   pub status:     u16,
   pub detail:     String,
}

impl ErrorResponse {
   /// `slug` はベース URI の末尾に付く問題種別
   pub fn new(slug: &str, title: impl Into<String>, status: u16, detail: impl Into<String>) -> Self {
      Self {
         error_type: format!("{ERROR_TYPE_BASE}/{slug}"),
         title: title.into(),
         status,
         detail: detail.into(),
      }
   }

   /// 400: 必須項目の欠落、未知の打刻種別、ユーザー名の重複
   pub fn bad_request(detail: impl Into<String>) -> Self {
      Self::new("bad-request", "Bad Request", 400, detail)
   }

   /// 401: 未登録トークン、PIN 不一致、ログイン失敗
   pub fn access_denied(detail: impl Into<String>) -> Self {
      Self::new("access-denied", "Access Denied", 401, detail)
   }

   /// 404
   pub fn not_found(detail: impl Into<String>) -> Self {
      Self::new("not-found", "Not Found", 404, detail)
   }

   /// 500
   ///
   /// detail は固定値。原因はサーバーログにだけ残す。
   pub fn internal_error() -> Self {
      Self::new(
         "internal-error",
         "Internal Server Error",
         500,
         "内部エラーが発生しました",
      )
   }
}
