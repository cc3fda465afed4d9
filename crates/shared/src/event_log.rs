//! # ビジネスイベントログの構造化ヘルパー
//!
//! 打刻・認証・ユーザー管理のイベントを `jq` で追跡しやすい形で出力するための
//! ヘルパーマクロとフィールド定数を提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用する。JSON 出力ではフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。呼び出し側のクレートは `tracing` に依存している必要がある。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.username`: 対象ユーザー名
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const ATTENDANCE: &str = "attendance";
        pub const AUTH: &str = "auth";
        pub const USER: &str = "user";
        pub const SENSOR: &str = "sensor";
    }

    /// イベントアクション
    pub mod action {
        // 打刻
        pub const ATTENDANCE_RECORDED: &str = "attendance.recorded";
        pub const SESSION_CLOSED: &str = "session.closed";
        pub const SESSION_SKIPPED: &str = "session.skipped";

        // 認証
        pub const TOKEN_REJECTED: &str = "auth.token_rejected";
        pub const PIN_REJECTED: &str = "auth.pin_rejected";
        pub const LOGIN_SUCCESS: &str = "auth.login_success";
        pub const LOGIN_FAILURE: &str = "auth.login_failure";

        // ユーザー管理
        pub const USER_REGISTERED: &str = "user.registered";
        pub const USER_UPDATED: &str = "user.updated";

        // センサー
        pub const CARD_SCANNED: &str = "sensor.card_scanned";
        pub const READINGS_STORED: &str = "sensor.readings_stored";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const PRESENCE_RECORD: &str = "presence_record";
        pub const WORK_SESSION: &str = "work_session";
        pub const USER: &str = "user";
        pub const RFID_SCAN: &str = "rfid_scan";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（DB）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// ドメインルール違反
        pub const DOMAIN: &str = "domain";
    }

    /// エラー種別
    pub mod kind {
        pub const DATABASE: &str = "database";
        pub const INTERNAL: &str = "internal";
        pub const SESSION_ACCOUNTING: &str = "session_accounting";
        pub const PASSWORD_VERIFICATION: &str = "password_verification";
    }
}

#[cfg(test)]
mod tests {
    use super::event;

    #[test]
    fn test_log_business_eventがドット記法のフィールドを受け付ける() {
        // subscriber 未設定でもマクロ展開とフィールド構文がコンパイル・実行できること
        crate::log_business_event!(
            event.category = event::category::ATTENDANCE,
            event.action = event::action::ATTENDANCE_RECORDED,
            event.result = event::result::SUCCESS,
            event.username = "borja",
            "打刻を記録しました"
        );
    }

    #[test]
    fn test_アクション定数はカテゴリ接頭辞を持つ() {
        assert!(event::action::TOKEN_REJECTED.starts_with("auth."));
        assert!(event::action::SESSION_CLOSED.starts_with("session."));
        assert!(event::action::USER_REGISTERED.starts_with("user."));
    }
}
