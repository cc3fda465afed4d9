//! # API レスポンスエンベロープ
//!
//! REST API の統一レスポンス形式 `{ "data": T }` を提供する。

use serde::{Deserialize, Serialize};

/// REST API の統一レスポンス型
///
/// 成功レスポンスはすべて `{ "data": T }` 形式で返す。
/// ESP32 デバイスとモバイルアプリの双方が同じ形式を受け取る。
///
/// ## 使用例
///
/// ```
/// use presencia_shared::ApiResponse;
///
/// let response = ApiResponse::new("SALIDA");
/// assert_eq!(response.data, "SALIDA");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// 新しい `ApiResponse` を作成する
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
