//! # 打刻ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /api/presencia/manual` - アプリからの手動打刻
//!
//! 打刻記録の DTO は参照系ハンドラでも使う。

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use presencia_domain::presence::PresenceRecord;
use presencia_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    usecase::{AttendanceUseCaseImpl, ManualClockInput},
};

/// 打刻 API の共有状態
pub struct AttendanceState {
    pub usecase: Arc<AttendanceUseCaseImpl>,
}

// --- リクエスト/レスポンス型 ---

/// 手動打刻リクエスト
#[derive(Debug, Deserialize)]
pub struct ManualClockRequest {
    #[serde(rename = "usuario")]
    pub username: Option<String>,
    pub tipo:     Option<String>,
    #[serde(rename = "ubicacion")]
    pub location: Option<String>,
}

/// 打刻記録 DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PresenceRecordDto {
    pub id:             Uuid,
    #[serde(rename = "usuario")]
    pub username:       String,
    #[serde(rename = "fechaHora")]
    pub timestamp:      String,
    #[serde(rename = "metodoAuth")]
    pub auth_method:    String,
    pub tipo:           String,
    #[serde(rename = "accesoPermitido")]
    pub access_granted: bool,
    #[serde(rename = "detalles")]
    pub details:        String,
}

impl From<&PresenceRecord> for PresenceRecordDto {
    fn from(record: &PresenceRecord) -> Self {
        Self {
            id:             *record.id().as_uuid(),
            username:       record.username().to_string(),
            timestamp:      record.timestamp().to_rfc3339(),
            auth_method:    record.auth_method().as_str().to_string(),
            tipo:           record.movement().as_str().to_string(),
            access_granted: record.access_granted(),
            details:        record.details().to_string(),
        }
    }
}

// --- ハンドラ ---

/// POST /api/presencia/manual
///
/// ## レスポンス
///
/// - `200 OK`: 記録した打刻
/// - `400 Bad Request`: `usuario` / `tipo` の欠落、未登録ユーザー、未知の打刻種別
#[tracing::instrument(skip_all)]
pub async fn record_manual(
    State(state): State<Arc<AttendanceState>>,
    Json(req): Json<ManualClockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(username), Some(tipo)) = (req.username, req.tipo) else {
        return Err(ApiError::BadRequest(
            "Faltan datos (usuario, tipo)".to_string(),
        ));
    };

    let record = state
        .usecase
        .record_manual(ManualClockInput {
            username,
            tipo,
            location: req.location,
        })
        .await?;

    let response = ApiResponse::new(PresenceRecordDto::from(&record));
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
    use rstest::rstest;
    use tower::ServiceExt;

    use super::*;
    use crate::test_utils::{SensorTestBuilder, SensorTestSetup};

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_760_000_000, 0).unwrap()
    }

    fn create_test_app(setup: &SensorTestSetup) -> Router {
        let state = Arc::new(AttendanceState {
            usecase: setup.attendance.clone(),
        });
        Router::new()
            .route("/api/presencia/manual", post(record_manual))
            .with_state(state)
    }

    fn manual_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/presencia/manual")
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
    async fn test_手動の退室で勤務セッションが閉じられる() {
        // Given
        let builder = SensorTestBuilder::new().with_now(fixed_now());
        let setup = builder.build();
        setup.users.add_user(builder.build_user("borja", "A1B2", "1234"));
        setup
            .presence
            .add_record(builder.build_entry("borja", fixed_now() - Duration::minutes(240)));
        let sut = create_test_app(&setup);

        // When
        let response = sut
            .oneshot(manual_request(serde_json::json!({
                "usuario": "borja",
                "tipo": "SALIDA",
                "ubicacion": "Oficina"
            })))
            .await
            .unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body: ApiResponse<PresenceRecordDto> = response_body(response).await;
        assert_eq!(body.data.tipo, "SALIDA");
        assert_eq!(body.data.auth_method, "MANUAL_APP");
        assert_eq!(body.data.details, "Registrado desde App (Oficina)");
        assert!(body.data.access_granted);
        let sessions = setup.sessions.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].duration_minutes(), 240);
    }

    #[rstest]
    #[case("INICIO_PAUSA")]
    #[case("CONSULTA")]
    #[tokio::test]
    async fn test_手動の休憩開始と通院外出では勤務セッションを記録しない(#[case] tipo: &str) {
        // Given: 1 時間前に入室
        let builder = SensorTestBuilder::new().with_now(fixed_now());
        let setup = builder.build();
        setup.users.add_user(builder.build_user("borja", "A1B2", "1234"));
        setup
            .presence
            .add_record(builder.build_entry("borja", fixed_now() - Duration::minutes(60)));
        let sut = create_test_app(&setup);

        // When
        let response = sut
            .oneshot(manual_request(serde_json::json!({
                "usuario": "borja",
                "tipo": tipo
            })))
            .await
            .unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body: ApiResponse<PresenceRecordDto> = response_body(response).await;
        assert_eq!(body.data.tipo, tipo);
        assert!(setup.sessions.sessions().is_empty());
        assert_eq!(setup.presence.records().len(), 2);
    }

    #[tokio::test]
    async fn test_位置の指定がなければappになる() {
        let builder = SensorTestBuilder::new();
        let setup = builder.build();
        setup.users.add_user(builder.build_user("borja", "A1B2", "1234"));
        let sut = create_test_app(&setup);

        let response = sut
            .oneshot(manual_request(serde_json::json!({
                "usuario": "borja",
                "tipo": "ENTRADA"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: ApiResponse<PresenceRecordDto> = response_body(response).await;
        assert_eq!(body.data.details, "Registrado desde App (APP)");
    }

    #[tokio::test]
    async fn test_tipoが欠けていれば400() {
        let setup = SensorTestBuilder::new().build();
        let sut = create_test_app(&setup);

        let response = sut
            .oneshot(manual_request(serde_json::json!({ "usuario": "borja" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(setup.presence.records().is_empty());
    }

    #[tokio::test]
    async fn test_未登録ユーザーは400() {
        let setup = SensorTestBuilder::new().build();
        let sut = create_test_app(&setup);

        let response = sut
            .oneshot(manual_request(serde_json::json!({
                "usuario": "nadie",
                "tipo": "ENTRADA"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: presencia_shared::ErrorResponse = response_body(response).await;
        assert_eq!(body.detail, "Usuario no encontrado");
    }
}
