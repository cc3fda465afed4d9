//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗、未知の打刻種別 |
//! | `NotFound` | 404 Not Found | エンティティが存在しない |
//! | `Conflict` | 400 Bad Request | ユーザー名の重複 |
//!
//! ユーザー名の重複は既存クライアント（モバイルアプリ）との互換のため 400 で返す。
//!
//! ## 使用例
//!
//! ```rust
//! use presencia_domain::DomainError;
//!
//! fn validate_pin(pin: &str) -> Result<(), DomainError> {
//!     if pin.is_empty() {
//!         return Err(DomainError::Validation("PIN は必須です".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_pin("").is_err());
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// API 層でこのエラーを受け取り、適切な HTTP レスポンスに変換する。
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// - 必須フィールドが未入力
    /// - 文字数制限の超過
    /// - 未知の打刻種別
    /// - 終了が開始より前の勤務セッション
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// エンティティが見つからない
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// エンティティの種類（"User" など）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },

    /// 一意性制約の競合（ユーザー名の重複など）
    #[error("競合が発生しました: {0}")]
    Conflict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_foundのメッセージにエンティティ種別とidが含まれる() {
        let err = DomainError::NotFound {
            entity_type: "User",
            id:          "borja".to_string(),
        };

        assert_eq!(err.to_string(), "User が見つかりません: borja");
    }
}
