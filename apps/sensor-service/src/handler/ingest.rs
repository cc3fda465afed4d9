//! # 端末データ受信ハンドラ
//!
//! ESP32 端末とモバイルアプリが共用する受信口。
//!
//! ## エンドポイント
//!
//! - `POST /api/datos` - トークン認証・旧式ログイン・カード UID・センサー計測値の受信
//!
//! ## リクエスト例
//!
//! ```json
//! { "token": "A1B2C3D4", "pin": "1234", "tipo": "PAUSA" }
//! { "temperatura": 21.5, "humedad": 40.0, "luz": true }
//! ```

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use presencia_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use super::user::UserDto;
use crate::{
    error::ApiError,
    usecase::{IngestInput, IngestOutcome, IngestUseCaseImpl},
};

/// 端末データ受信 API の共有状態
pub struct IngestState {
    pub usecase: Arc<IngestUseCaseImpl>,
}

// --- リクエスト/レスポンス型 ---

/// 端末ペイロード
#[derive(Debug, Default, Deserialize)]
pub struct SensorPayload {
    #[serde(rename = "temperatura")]
    pub temperature: Option<f64>,
    #[serde(rename = "humedad")]
    pub humidity:    Option<f64>,
    #[serde(rename = "luz")]
    pub light:       Option<bool>,
    #[serde(rename = "rfidUid")]
    pub rfid_uid:    Option<String>,
    #[serde(rename = "usuario")]
    pub username:    Option<String>,
    pub password:    Option<String>,
    pub token:       Option<String>,
    pub pin:         Option<String>,
    pub tipo:        Option<String>,
}

impl From<SensorPayload> for IngestInput {
    fn from(payload: SensorPayload) -> Self {
        Self {
            temperature: payload.temperature,
            humidity:    payload.humidity,
            light:       payload.light,
            rfid_uid:    payload.rfid_uid,
            username:    payload.username,
            password:    payload.password,
            token:       payload.token,
            pin:         payload.pin,
            tipo:        payload.tipo,
        }
    }
}

/// 打刻結果
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MovementDto {
    pub movement: String,
    pub username: String,
}

/// カード読み取り結果
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CardScannedDto {
    pub uid:        String,
    #[serde(rename = "fecha")]
    pub scanned_at: String,
}

/// 計測値の保存結果
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ReadingsStoredDto {
    #[serde(rename = "meteorologia")]
    pub weather: bool,
    #[serde(rename = "luz")]
    pub light:   bool,
}

/// 受信結果（分岐ごとに形が異なる）
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum IngestResponse {
    Movement(MovementDto),
    LoggedIn(UserDto),
    CardScanned(CardScannedDto),
    ReadingsStored(ReadingsStoredDto),
}

impl From<IngestOutcome> for IngestResponse {
    fn from(outcome: IngestOutcome) -> Self {
        match outcome {
            IngestOutcome::Movement { movement, username } => Self::Movement(MovementDto {
                movement: movement.as_str().to_string(),
                username,
            }),
            IngestOutcome::LoggedIn(user) => Self::LoggedIn(UserDto::from(&user)),
            IngestOutcome::CardScanned(scan) => Self::CardScanned(CardScannedDto {
                uid:        scan.uid().as_str().to_string(),
                scanned_at: scan.scanned_at().to_rfc3339(),
            }),
            IngestOutcome::ReadingsStored { weather, light } => {
                Self::ReadingsStored(ReadingsStoredDto { weather, light })
            }
        }
    }
}

// --- ハンドラ ---

/// POST /api/datos
///
/// ## レスポンス
///
/// - `200 OK`: 打刻結果 / ログインしたユーザー / カード読み取り / 計測値の保存結果
/// - `400 Bad Request`: 未知の打刻種別
/// - `401 Unauthorized`: 未登録トークン、PIN 不一致、ログイン失敗
#[tracing::instrument(skip_all)]
pub async fn ingest(
    State(state): State<Arc<IngestState>>,
    Json(payload): Json<SensorPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.usecase.ingest(payload.into()).await?;

    let response = ApiResponse::new(IngestResponse::from(outcome));
    Ok((StatusCode::OK, Json(response)))
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Method, Request},
        routing::post,
    };
    use chrono::{DateTime, Duration, Utc};
    use pretty_assertions::assert_eq;
    use presencia_domain::presence::{MovementType, UNKNOWN_USERNAME};
    use presencia_shared::ErrorResponse;
    use rstest::rstest;
    use tower::ServiceExt;

    use super::*;
    use crate::test_utils::{SensorTestBuilder, SensorTestSetup};

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_760_000_000, 0).unwrap()
    }

    fn create_test_app(setup: &SensorTestSetup) -> Router {
        let state = Arc::new(IngestState {
            usecase: setup.ingest.clone(),
        });
        Router::new()
            .route("/api/datos", post(ingest))
            .with_state(state)
    }

    fn datos_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/datos")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn response_body<T: serde::de::DeserializeOwned>(
        response: axum::http::Response<Body>,
    ) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_token_在室中のトグルで退室が返る() {
        // Given
        let builder = SensorTestBuilder::new().with_now(fixed_now());
        let setup = builder.build();
        setup.users.add_user(builder.build_user("borja", "A1B2C3D4", "1234"));
        setup
            .presence
            .add_record(builder.build_entry("borja", fixed_now() - Duration::minutes(61)));
        let sut = create_test_app(&setup);

        // When
        let response = sut
            .oneshot(datos_request(serde_json::json!({ "token": "A1B2C3D4" })))
            .await
            .unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body: ApiResponse<MovementDto> = response_body(response).await;
        assert_eq!(
            body.data,
            MovementDto {
                movement: "SALIDA".to_string(),
                username: "borja".to_string(),
            }
        );
        assert_eq!(setup.sessions.sessions()[0].duration_minutes(), 61);
    }

    #[tokio::test]
    async fn test_token_未登録トークンは401で拒否記録が残る() {
        let setup = SensorTestBuilder::new().build();
        let sut = create_test_app(&setup);

        let response = sut
            .oneshot(datos_request(serde_json::json!({ "token": "FFFF" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let records = setup.presence.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].username(), UNKNOWN_USERNAME);
        assert!(!records[0].access_granted());
        assert_eq!(records[0].details(), "Token no registrado: FFFF");
    }

    #[tokio::test]
    async fn test_token_pin不一致は401で本人名義の試行が残る() {
        let builder = SensorTestBuilder::new();
        let setup = builder.build();
        setup.users.add_user(builder.build_user("borja", "A1B2C3D4", "1234"));
        let sut = create_test_app(&setup);

        let response = sut
            .oneshot(datos_request(
                serde_json::json!({ "token": "A1B2C3D4", "pin": "0000" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = response_body(response).await;
        assert_eq!(body.detail, "PIN INCORRECTO");
        let records = setup.presence.records();
        assert_eq!(records[0].username(), "borja");
        assert_eq!(records[0].movement(), MovementType::Intento);
        assert_eq!(records[0].details(), "PIN Incorrecto");
    }

    #[tokio::test]
    async fn test_token_未知の種別は400で何も書き込まない() {
        let builder = SensorTestBuilder::new();
        let setup = builder.build();
        setup.users.add_user(builder.build_user("borja", "A1B2C3D4", "1234"));
        let sut = create_test_app(&setup);

        let response = sut
            .oneshot(datos_request(
                serde_json::json!({ "token": "A1B2C3D4", "tipo": "VACACIONES" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(setup.presence.records().is_empty());
    }

    #[tokio::test]
    async fn test_legacy_ログイン成功でユーザー表現が返る() {
        let builder = SensorTestBuilder::new();
        let setup = builder.build();
        setup.users.add_user(builder.build_user("borja", "A1B2C3D4", "1234"));
        let sut = create_test_app(&setup);

        let response = sut
            .oneshot(datos_request(
                serde_json::json!({ "usuario": "borja", "password": "1234" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: ApiResponse<UserDto> = response_body(response).await;
        assert_eq!(body.data.username, "borja");
        assert!(setup.presence.records().is_empty());
    }

    #[tokio::test]
    async fn test_legacy_パスワード不一致は401() {
        let builder = SensorTestBuilder::new();
        let setup = builder.build();
        setup.users.add_user(builder.build_user("borja", "A1B2C3D4", "1234"));
        let sut = create_test_app(&setup);

        let response = sut
            .oneshot(datos_request(
                serde_json::json!({ "usuario": "borja", "password": "nope" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_uid_カード読み取りが記録される() {
        let setup = SensorTestBuilder::new().build();
        let sut = create_test_app(&setup);

        let response = sut
            .oneshot(datos_request(serde_json::json!({ "rfidUid": "04A32B1C" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: ApiResponse<CardScannedDto> = response_body(response).await;
        assert_eq!(body.data.uid, "04A32B1C");
        assert_eq!(setup.sensors.rfid_scans().len(), 1);
    }

    #[rstest]
    #[case("A".repeat(65))]
    #[case("   ".to_string())]
    #[tokio::test]
    async fn test_uid_長い値や空白だけの値も捨てずに記録する(#[case] uid: String) {
        let setup = SensorTestBuilder::new().build();
        let sut = create_test_app(&setup);

        let response = sut
            .oneshot(datos_request(serde_json::json!({ "rfidUid": uid })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let scans = setup.sensors.rfid_scans();
        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0].uid().as_str(), uid);
    }

    #[tokio::test]
    async fn test_sensor_気象と照度が保存される() {
        let setup = SensorTestBuilder::new().build();
        let sut = create_test_app(&setup);

        let response = sut
            .oneshot(datos_request(
                serde_json::json!({ "temperatura": 21.5, "humedad": 40.0, "luz": false }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: ApiResponse<ReadingsStoredDto> = response_body(response).await;
        assert_eq!(
            body.data,
            ReadingsStoredDto {
                weather: true,
                light:   true,
            }
        );
        assert_eq!(setup.sensors.weather()[0].temperature(), 21.5);
        assert!(!setup.sensors.light()[0].is_lit());
    }

    #[tokio::test]
    async fn test_sensor_湿度だけでは気象計測を保存しない() {
        let setup = SensorTestBuilder::new().build();
        let sut = create_test_app(&setup);

        let response = sut
            .oneshot(datos_request(serde_json::json!({ "humedad": 40.0 })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(setup.sensors.weather().is_empty());
        assert!(setup.sensors.light().is_empty());
    }
}
