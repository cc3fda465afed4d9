//! # パスワード / PIN
//!
//! アプリのログインパスワードと打刻端末の PIN は同じ `password` 列に
//! 保存される。端末で入力された PIN も [`PlainPassword`] として照合する。

/// 平文のパスワードまたは PIN
///
/// `Debug` では値を出さない。
#[derive(Clone)]
pub struct PlainPassword(String);

impl std::fmt::Debug for PlainPassword {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.write_str("PlainPassword([REDACTED])")
   }
}

impl PlainPassword {
   pub fn new(value: impl Into<String>) -> Self {
      Self(value.into())
   }

   /// フォームの入力値から作る
   ///
   /// アプリは未入力の欄を空文字で送ってくるので、未指定 (`None`) と
   /// 空文字をどちらも「入力なし」として `None` にする。
   pub fn from_input(value: Option<String>) -> Option<Self> {
      value.filter(|v| !v.is_empty()).map(Self)
   }

   pub fn as_str(&self) -> &str {
      &self.0
   }
}

/// Argon2id の PHC 文字列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
   pub fn new(hash: impl Into<String>) -> Self {
      Self(hash.into())
   }

   pub fn as_str(&self) -> &str {
      &self.0
   }
}

/// 照合結果
///
/// 不一致は端末に「PIN INCORRECTO」として返り、拒否記録が残る。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordVerifyResult {
   Match,
   Mismatch,
}

impl PasswordVerifyResult {
   pub fn is_match(&self) -> bool {
      matches!(self, Self::Match)
   }
}

impl From<bool> for PasswordVerifyResult {
   fn from(matched: bool) -> Self {
      if matched { Self::Match } else { Self::Mismatch }
   }
}
