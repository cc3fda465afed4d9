//! # 打刻記録
//!
//! 端末・アプリからの入退室イベントを追記専用のログとして表現する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`PresenceRecord`] | 打刻記録 | 1 回の打刻または失敗した試行 |
//! | [`MovementType`] | 打刻種別 | `ENTRADA` / `SALIDA` / 休憩 / 通院 / `INTENTO` |
//! | [`AuthMethod`] | 認証方式 | `TOKEN` / `TOKEN+PIN` / `MANUAL_APP` |
//!
//! ## 不変条件
//!
//! - 一度書き込んだ記録は変更しない
//! - 失敗した試行は `INTENTO` かつ `access_granted = false` で記録する

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::DomainError;

define_uuid_id! {
    /// 打刻記録 ID
    pub struct PresenceRecordId;
}

/// 未登録トークンによる試行を記録するときのユーザー名
pub const UNKNOWN_USERNAME: &str = "DESCONOCIDO";

/// 打刻種別
///
/// 入室系（[`is_entry_like`](Self::is_entry_like)）の記録が最後にあれば
/// そのユーザーは「在室中」とみなす。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    /// 入室
    Entrada,
    /// 退室
    Salida,
    /// 休憩開始
    InicioPausa,
    /// 休憩終了
    FinPausa,
    /// 通院で外出
    Consulta,
    /// 通院から戻り
    VueltaMedico,
    /// 失敗した試行
    Intento,
}

impl MovementType {
    /// 入室系（在室状態に入る打刻）か
    pub fn is_entry_like(self) -> bool {
        matches!(self, Self::Entrada | Self::FinPausa | Self::VueltaMedico)
    }

    /// 退室系（在室状態を抜ける打刻）か
    pub fn is_exit_like(self) -> bool {
        matches!(self, Self::Salida | Self::InicioPausa | Self::Consulta)
    }

    /// DB・ワイヤ上の表記
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MovementType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ENTRADA" => Ok(Self::Entrada),
            "SALIDA" => Ok(Self::Salida),
            "INICIO_PAUSA" => Ok(Self::InicioPausa),
            "FIN_PAUSA" => Ok(Self::FinPausa),
            "CONSULTA" => Ok(Self::Consulta),
            "VUELTA_MEDICO" => Ok(Self::VueltaMedico),
            "INTENTO" => Ok(Self::Intento),
            _ => Err(DomainError::Validation(format!("不正な打刻種別: {}", s))),
        }
    }
}

/// 認証方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMethod {
    /// RFID トークンのみ
    #[serde(rename = "TOKEN")]
    Token,
    /// RFID トークン + PIN
    #[serde(rename = "TOKEN+PIN")]
    TokenPin,
    /// モバイルアプリからの手動打刻
    #[serde(rename = "MANUAL_APP")]
    ManualApp,
}

impl AuthMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Token => "TOKEN",
            Self::TokenPin => "TOKEN+PIN",
            Self::ManualApp => "MANUAL_APP",
        }
    }
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuthMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TOKEN" => Ok(Self::Token),
            "TOKEN+PIN" => Ok(Self::TokenPin),
            "MANUAL_APP" => Ok(Self::ManualApp),
            _ => Err(DomainError::Validation(format!("不正な認証方式: {}", s))),
        }
    }
}

/// 打刻記録エンティティ
///
/// ユーザー名は [`Username`](crate::user::Username) ではなく文字列で持つ。
/// 未登録トークンの試行では [`UNKNOWN_USERNAME`] が入るため。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceRecord {
    id: PresenceRecordId,
    username: String,
    timestamp: DateTime<Utc>,
    auth_method: AuthMethod,
    movement: MovementType,
    access_granted: bool,
    details: String,
}

impl PresenceRecord {
    /// 許可された打刻を作成する
    pub fn granted(
        username: impl Into<String>,
        auth_method: AuthMethod,
        movement: MovementType,
        details: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PresenceRecordId::new(),
            username: username.into(),
            timestamp: now,
            auth_method,
            movement,
            access_granted: true,
            details: details.into(),
        }
    }

    /// 拒否された試行を作成する
    pub fn attempt(
        username: impl Into<String>,
        auth_method: AuthMethod,
        details: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PresenceRecordId::new(),
            username: username.into(),
            timestamp: now,
            auth_method,
            movement: MovementType::Intento,
            access_granted: false,
            details: details.into(),
        }
    }

    /// 未登録トークンによる試行を作成する
    pub fn unknown_token(token: &str, now: DateTime<Utc>) -> Self {
        Self::attempt(
            UNKNOWN_USERNAME,
            AuthMethod::Token,
            format!("Token no registrado: {}", token),
            now,
        )
    }

    /// 既存のデータから復元する（データベースから取得時）
    pub fn from_db(
        id: PresenceRecordId,
        username: String,
        timestamp: DateTime<Utc>,
        auth_method: AuthMethod,
        movement: MovementType,
        access_granted: bool,
        details: String,
    ) -> Self {
        Self {
            id,
            username,
            timestamp,
            auth_method,
            movement,
            access_granted,
            details,
        }
    }

    pub fn id(&self) -> &PresenceRecordId {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn auth_method(&self) -> AuthMethod {
        self.auth_method
    }

    pub fn movement(&self) -> MovementType {
        self.movement
    }

    pub fn access_granted(&self) -> bool {
        self.access_granted
    }

    pub fn details(&self) -> &str {
        &self.details
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(MovementType::Entrada, true, false)]
    #[case(MovementType::FinPausa, true, false)]
    #[case(MovementType::VueltaMedico, true, false)]
    #[case(MovementType::Salida, false, true)]
    #[case(MovementType::InicioPausa, false, true)]
    #[case(MovementType::Consulta, false, true)]
    #[case(MovementType::Intento, false, false)]
    fn test_打刻種別の入室系と退室系の分類(
        #[case] movement: MovementType,
        #[case] entry_like: bool,
        #[case] exit_like: bool,
    ) {
        assert_eq!(movement.is_entry_like(), entry_like);
        assert_eq!(movement.is_exit_like(), exit_like);
    }

    #[rstest]
    #[case("ENTRADA", MovementType::Entrada)]
    #[case("SALIDA", MovementType::Salida)]
    #[case("INICIO_PAUSA", MovementType::InicioPausa)]
    #[case("FIN_PAUSA", MovementType::FinPausa)]
    #[case("CONSULTA", MovementType::Consulta)]
    #[case("VUELTA_MEDICO", MovementType::VueltaMedico)]
    #[case("INTENTO", MovementType::Intento)]
    fn test_打刻種別は大文字スネークケースで往復する(
        #[case] raw: &str,
        #[case] expected: MovementType,
    ) {
        let parsed: MovementType = raw.parse().unwrap();

        assert_eq!(parsed, expected);
        assert_eq!(parsed.as_str(), raw);
        assert_eq!(serde_json::to_value(parsed).unwrap(), serde_json::json!(raw));
    }

    #[rstest]
    fn test_未知の打刻種別はバリデーションエラー() {
        assert!(matches!(
            "DESAYUNO".parse::<MovementType>(),
            Err(DomainError::Validation(_))
        ));
    }

    #[rstest]
    #[case("TOKEN", AuthMethod::Token)]
    #[case("TOKEN+PIN", AuthMethod::TokenPin)]
    #[case("MANUAL_APP", AuthMethod::ManualApp)]
    fn test_認証方式はdbの表記と往復する(#[case] raw: &str, #[case] expected: AuthMethod) {
        let parsed: AuthMethod = raw.parse().unwrap();

        assert_eq!(parsed, expected);
        assert_eq!(parsed.as_str(), raw);
        assert_eq!(serde_json::to_value(parsed).unwrap(), serde_json::json!(raw));
    }

    #[rstest]
    fn test_認証方式tokenとpinはプラス記号で表記する() {
        assert_eq!(AuthMethod::TokenPin.to_string(), "TOKEN+PIN");
        assert_eq!("TOKEN+PIN".parse::<AuthMethod>().unwrap(), AuthMethod::TokenPin);
        assert_eq!(
            serde_json::to_value(AuthMethod::ManualApp).unwrap(),
            serde_json::json!("MANUAL_APP")
        );
    }

    #[rstest]
    fn test_未登録トークンの試行はdesconocidoで拒否として記録される() {
        let now = Utc::now();
        let record = PresenceRecord::unknown_token("FFFF", now);

        assert_eq!(record.username(), UNKNOWN_USERNAME);
        assert_eq!(record.movement(), MovementType::Intento);
        assert_eq!(record.auth_method(), AuthMethod::Token);
        assert!(!record.access_granted());
        assert_eq!(record.details(), "Token no registrado: FFFF");
        assert_eq!(record.timestamp(), now);
    }
}
