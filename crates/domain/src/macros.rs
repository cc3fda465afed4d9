//! ID 型と文字列値オブジェクトを生成するマクロ
//!
//! `UserId` や `PresenceRecordId` などの ID と、`Username` / `RfidToken` の
//! ように入力検証を伴う文字列をここで一括定義する。

use crate::DomainError;

/// 前後の空白を除き、必須チェックと最大文字数チェックを行う
///
/// 端末やアプリから届く値は末尾に改行や空白が混ざることがあるため、
/// 照合や一意性判定の前に必ず正規化する。
pub(crate) fn required_text(
    value: String,
    label: &str,
    max_chars: usize,
) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{label}は必須です")));
    }
    if trimmed.chars().count() > max_chars {
        return Err(DomainError::Validation(format!(
            "{label}は {max_chars} 文字以内である必要があります"
        )));
    }
    Ok(trimmed.to_string())
}

/// UUID v7 の Newtype ID を定義する
///
/// 打刻記録・勤務セッション・センサーログはすべて追記専用なので、
/// v7 の時刻順序がそのまま挿入順になる。
///
/// ```rust
/// use presencia_domain::presence::PresenceRecordId;
///
/// let id = PresenceRecordId::new();
/// assert_eq!(PresenceRecordId::from_uuid(*id.as_uuid()), id);
/// ```
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[display("{_0}")]
        $vis struct $Name(uuid::Uuid);

        impl $Name {
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// DB から読み出した UUID で復元する
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $Name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// 検証済み文字列の値オブジェクトを定義する
///
/// `new()` は [`required_text`] で正規化する。`visibility` で出力の扱いを選ぶ。
///
/// - `plain`: `Debug` / `Display` / `Hash` を持つ（ユーザー名など）
/// - `credential`: `Debug` は `[REDACTED]` になり `Display` を持たない。
///   カードの提示だけで本人扱いになる RFID トークン用
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use presencia_domain::user::{RfidToken, Username};
///
/// assert_eq!(Username::new("  borja ")?.as_str(), "borja");
/// assert!(!format!("{:?}", RfidToken::new("A1B2C3")?).contains("A1B2C3"));
/// # Ok(())
/// # }
/// ```
macro_rules! define_text_value {
    (@accessors $Name:ident, $label:expr, $max:expr) => {
        impl $Name {
            pub fn new(value: impl Into<String>) -> Result<Self, $crate::DomainError> {
                $crate::macros::required_text(value.into(), $label, $max).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident {
            label: $label:expr,
            max_chars: $max:expr,
            visibility: credential $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        $vis struct $Name(String);

        impl std::fmt::Debug for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!($Name)).field(&"[REDACTED]").finish()
            }
        }

        define_text_value!(@accessors $Name, $label, $max);
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident {
            label: $label:expr,
            max_chars: $max:expr,
            visibility: plain $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        $vis struct $Name(String);

        define_text_value!(@accessors $Name, $label, $max);
    };
}
