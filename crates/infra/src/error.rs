//! # インフラ層エラー定義
//!
//! データベースアクセスやパスワードハッシュ計算で発生するエラーを表現する。
//!
//! ## 構造
//!
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別（Database, PasswordHash 等）
//!
//! `From` 実装や convenience constructor でエラーを生成した時点の
//! スパン情報（どのリポジトリ・どのユースケースから呼ばれたか）が記録される。

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// エラー種別に応じた処理には [`kind()`](InfraError::kind) を使用する:
///
/// ```ignore
/// match error.kind() {
///     InfraErrorKind::Database(e) => { /* DB エラー */ }
///     _ => { /* その他 */ }
/// }
/// ```
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// データベースエラー
    ///
    /// SQL クエリの実行失敗、接続エラー、制約違反など。
    #[error("データベースエラー: {0}")]
    Database(#[source] sqlx::Error),

    /// シリアライズ/デシリアライズエラー
    ///
    /// 勤務スケジュール（JSONB）の変換に失敗した場合。
    #[error("シリアライズエラー: {0}")]
    Serialization(#[source] serde_json::Error),

    /// パスワードハッシュの計算・解析エラー
    #[error("パスワードハッシュエラー: {0}")]
    PasswordHash(String),

    /// 予期しないエラー
    ///
    /// DB に保存された値がドメインの制約を満たさない場合など。
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// 一意性制約違反かどうか
    ///
    /// 同名ユーザーの同時登録で、事前チェックをすり抜けた INSERT を判定する。
    pub fn is_unique_violation(&self) -> bool {
        match &self.kind {
            InfraErrorKind::Database(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }

    // ===== Convenience constructors =====

    /// パスワードハッシュエラーを生成する
    pub fn password_hash(msg: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::PasswordHash(msg.into()),
            span_trace: SpanTrace::capture(),
        }
    }

    /// 予期しないエラーを生成する
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::Unexpected(msg.into()),
            span_trace: SpanTrace::capture(),
        }
    }
}

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

// ===== From 実装（SpanTrace 自動キャプチャ） =====

impl From<sqlx::Error> for InfraError {
    fn from(source: sqlx::Error) -> Self {
        Self {
            kind:       InfraErrorKind::Database(source),
            span_trace: SpanTrace::capture(),
        }
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(source: serde_json::Error) -> Self {
        Self {
            kind:       InfraErrorKind::Serialization(source),
            span_trace: SpanTrace::capture(),
        }
    }
}

impl From<presencia_domain::DomainError> for InfraError {
    /// DB の値からエンティティを復元できなかった場合
    fn from(source: presencia_domain::DomainError) -> Self {
        Self::unexpected(source.to_string())
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::layer::SubscriberExt as _;

    use super::*;

    /// テスト用に ErrorLayer 付き subscriber を設定する
    fn with_error_layer(f: impl FnOnce()) {
        let subscriber = tracing_subscriber::registry().with(tracing_error::ErrorLayer::default());
        let _guard = tracing::subscriber::set_default(subscriber);
        f();
    }

    #[test]
    fn test_from_sqlx_errorでspan_traceがキャプチャされる() {
        with_error_layer(|| {
            let span = tracing::info_span!("presence_repository", username = "borja");
            let _enter = span.enter();

            let err: InfraError = sqlx::Error::RowNotFound.into();

            assert!(matches!(err.kind(), InfraErrorKind::Database(_)));
            let trace_str = format!("{}", err.span_trace());
            assert!(
                trace_str.contains("presence_repository"),
                "SpanTrace がスパン名を含むこと: {trace_str}",
            );
        });
    }

    #[test]
    fn test_from_serde_json_errorはserializationになる() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: InfraError = json_err.into();

        assert!(matches!(err.kind(), InfraErrorKind::Serialization(_)));
    }

    #[test]
    fn test_password_hashでspan_traceがキャプチャされる() {
        with_error_layer(|| {
            let span = tracing::info_span!("hash_password");
            let _enter = span.enter();

            let err = InfraError::password_hash("salt が不正");

            assert!(matches!(
                err.kind(),
                InfraErrorKind::PasswordHash(msg) if msg == "salt が不正"
            ));
            assert!(format!("{}", err.span_trace()).contains("hash_password"));
        });
    }

    #[test]
    fn test_ドメインエラーはunexpectedに変換される() {
        let domain_err = presencia_domain::DomainError::Validation("ユーザー名は必須です".into());

        let err: InfraError = domain_err.into();

        assert!(matches!(err.kind(), InfraErrorKind::Unexpected(_)));
        assert_eq!(
            err.to_string(),
            "予期しないエラー: バリデーションエラー: ユーザー名は必須です"
        );
    }

    #[test]
    fn test_row_not_foundは一意性制約違反ではない() {
        let err: InfraError = sqlx::Error::RowNotFound.into();

        assert!(!err.is_unique_violation());
    }

    #[test]
    fn test_sourceがinfra_error_kindに委譲する() {
        use std::error::Error;

        let err: InfraError = sqlx::Error::RowNotFound.into();

        assert!(err.source().is_some());
        assert!(InfraError::unexpected("x").source().is_none());
    }
}
