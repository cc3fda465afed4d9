//! 打刻フローの統合テスト
//!
//! ルーター全体を組み立て、端末とアプリからの一連の呼び出しを検証する。

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use chrono::{DateTime, Duration, Utc};
use presencia_domain::presence::{AuthMethod, MovementType, UNKNOWN_USERNAME};
use presencia_sensor_service::{
    handler::build_router,
    test_utils::{SensorTestBuilder, SensorTestSetup},
};
use tower::ServiceExt;

fn fixed_now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_760_000_000, 0).unwrap()
}

fn app(setup: &SensorTestSetup) -> Router {
    build_router(setup.app_states())
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_入室してトグルで退室するとセッションが1件できる() {
    // Arrange
    let builder = SensorTestBuilder::new().with_now(fixed_now());
    let setup = builder.build();
    setup
        .users
        .add_user(builder.build_user("borja", "A1B2C3D4", "1234"));

    // Act
    let first = app(&setup)
        .oneshot(post_json("/api/datos", serde_json::json!({ "token": "A1B2C3D4" })))
        .await
        .unwrap();
    let second = app(&setup)
        .oneshot(post_json("/api/datos", serde_json::json!({ "token": "A1B2C3D4" })))
        .await
        .unwrap();

    // Assert
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(json_body(first).await["data"]["movement"], "ENTRADA");
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(json_body(second).await["data"]["movement"], "SALIDA");

    let movements: Vec<MovementType> = setup
        .presence
        .records()
        .iter()
        .map(|r| r.movement())
        .collect();
    assert_eq!(movements, vec![MovementType::Entrada, MovementType::Salida]);
    assert_eq!(setup.sessions.sessions().len(), 1);
}

#[tokio::test]
async fn test_在室中の休憩ボタンは休憩開始になりセッションを閉じる() {
    let builder = SensorTestBuilder::new().with_now(fixed_now());
    let setup = builder.build();
    setup
        .users
        .add_user(builder.build_user("borja", "A1B2C3D4", "1234"));
    setup
        .presence
        .add_record(builder.build_entry("borja", fixed_now() - Duration::minutes(240)));

    let response = app(&setup)
        .oneshot(post_json(
            "/api/datos",
            serde_json::json!({ "token": "A1B2C3D4", "tipo": "PAUSA" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["movement"], "INICIO_PAUSA");
    let sessions = setup.sessions.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].duration_minutes(), 240);
}

#[tokio::test]
async fn test_通院ボタンは在室状態で種別が変わる() {
    let builder = SensorTestBuilder::new().with_now(fixed_now());
    let setup = builder.build();
    setup
        .users
        .add_user(builder.build_user("borja", "A1B2C3D4", "1234"));
    let medico = serde_json::json!({ "token": "A1B2C3D4", "tipo": "MEDICO" });

    // 外にいる状態では入室扱い
    let outside = app(&setup)
        .oneshot(post_json("/api/datos", medico.clone()))
        .await
        .unwrap();
    assert_eq!(json_body(outside).await["data"]["movement"], "ENTRADA");
    assert!(setup.sessions.sessions().is_empty());

    // 在室中は通院で外出し、セッションを閉じる
    let inside = app(&setup)
        .oneshot(post_json("/api/datos", medico))
        .await
        .unwrap();
    assert_eq!(json_body(inside).await["data"]["movement"], "CONSULTA");
    assert_eq!(setup.sessions.sessions().len(), 1);
}

#[tokio::test]
async fn test_未登録トークンは拒否記録だけが残り在室状態に影響しない() {
    let builder = SensorTestBuilder::new().with_now(fixed_now());
    let setup = builder.build();

    let response = app(&setup)
        .oneshot(post_json("/api/datos", serde_json::json!({ "token": "FFFF0000" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let records = setup.presence.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].username(), UNKNOWN_USERNAME);
    assert!(!records[0].access_granted());
    assert!(setup.sessions.sessions().is_empty());
}

#[tokio::test]
async fn test_pin不一致の試行は在室判定に数えない() {
    let builder = SensorTestBuilder::new().with_now(fixed_now());
    let setup = builder.build();
    setup
        .users
        .add_user(builder.build_user("borja", "A1B2C3D4", "1234"));

    let rejected = app(&setup)
        .oneshot(post_json(
            "/api/datos",
            serde_json::json!({ "token": "A1B2C3D4", "pin": "9999", "tipo": "ENTRADA" }),
        ))
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);

    // 正しい PIN での次の打刻は外からの入室になる
    let accepted = app(&setup)
        .oneshot(post_json(
            "/api/datos",
            serde_json::json!({ "token": "A1B2C3D4", "pin": "1234" }),
        ))
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::OK);
    assert_eq!(json_body(accepted).await["data"]["movement"], "ENTRADA");

    let records = setup.presence.records();
    assert_eq!(records[0].movement(), MovementType::Intento);
    assert!(!records[0].access_granted());
    assert_eq!(records[1].auth_method(), AuthMethod::TokenPin);
}

#[tokio::test]
async fn test_セッション書き込みが失敗しても打刻は成功する() {
    let builder = SensorTestBuilder::new()
        .with_now(fixed_now())
        .with_failing_work_sessions();
    let setup = builder.build();
    setup
        .users
        .add_user(builder.build_user("borja", "A1B2C3D4", "1234"));
    setup
        .presence
        .add_record(builder.build_entry("borja", fixed_now() - Duration::hours(8)));

    let response = app(&setup)
        .oneshot(post_json("/api/datos", serde_json::json!({ "token": "A1B2C3D4" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let records = setup.presence.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].movement(), MovementType::Salida);
}

#[tokio::test]
async fn test_アプリからの手動打刻と端末の打刻が同じ在室状態を共有する() {
    let builder = SensorTestBuilder::new().with_now(fixed_now());
    let setup = builder.build();
    setup
        .users
        .add_user(builder.build_user("borja", "A1B2C3D4", "1234"));

    let manual = app(&setup)
        .oneshot(post_json(
            "/api/presencia/manual",
            serde_json::json!({ "usuario": "borja", "tipo": "ENTRADA", "ubicacion": "Oficina" }),
        ))
        .await
        .unwrap();
    assert_eq!(manual.status(), StatusCode::OK);
    let body = json_body(manual).await;
    assert_eq!(body["data"]["metodoAuth"], "MANUAL_APP");
    assert_eq!(body["data"]["detalles"], "Registrado desde App (Oficina)");

    let device = app(&setup)
        .oneshot(post_json("/api/datos", serde_json::json!({ "token": "A1B2C3D4" })))
        .await
        .unwrap();
    assert_eq!(json_body(device).await["data"]["movement"], "SALIDA");
    assert_eq!(setup.sessions.sessions().len(), 1);
}

#[tokio::test]
async fn test_登録したユーザーのトークンで打刻できる() {
    let setup = SensorTestBuilder::new().with_now(fixed_now()).build();

    let registered = app(&setup)
        .oneshot(post_json(
            "/api/usuarios/registrar",
            serde_json::json!({ "username": "ana", "password": "4321", "rfidToken": "CAFE01" }),
        ))
        .await
        .unwrap();
    assert_eq!(registered.status(), StatusCode::CREATED);

    let duplicate = app(&setup)
        .oneshot(post_json(
            "/api/usuarios/registrar",
            serde_json::json!({ "username": "ana", "password": "0000" }),
        ))
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
    assert_eq!(setup.users.users().len(), 1);

    let response = app(&setup)
        .oneshot(post_json(
            "/api/datos",
            serde_json::json!({ "token": "CAFE01", "pin": "4321" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["username"], "ana");
}

#[tokio::test]
async fn test_打刻履歴とセッション一覧を参照できる() {
    let builder = SensorTestBuilder::new().with_now(fixed_now());
    let setup = builder.build();
    setup
        .users
        .add_user(builder.build_user("borja", "A1B2C3D4", "1234"));
    setup
        .presence
        .add_record(builder.build_entry("borja", fixed_now() - Duration::minutes(30)));

    let toggle = app(&setup)
        .oneshot(post_json("/api/datos", serde_json::json!({ "token": "A1B2C3D4" })))
        .await
        .unwrap();
    assert_eq!(toggle.status(), StatusCode::OK);

    let history = app(&setup)
        .oneshot(get("/api/control-presencia/usuario/borja"))
        .await
        .unwrap();
    assert_eq!(history.status(), StatusCode::OK);
    let history = json_body(history).await;
    assert_eq!(history["data"].as_array().unwrap().len(), 2);
    assert_eq!(history["data"][1]["tipo"], "SALIDA");

    let sessions = app(&setup)
        .oneshot(get("/api/sesiones/usuario/borja?dias=1"))
        .await
        .unwrap();
    assert_eq!(sessions.status(), StatusCode::OK);
    let sessions = json_body(sessions).await;
    assert_eq!(sessions["data"][0]["duracionMinutos"], 30);
}

#[tokio::test]
async fn test_全データ取得と受信が同じパスで共存する() {
    let setup = SensorTestBuilder::new().with_now(fixed_now()).build();

    let stored = app(&setup)
        .oneshot(post_json(
            "/api/datos",
            serde_json::json!({ "temperatura": 19.0, "humedad": 55.0, "luz": true }),
        ))
        .await
        .unwrap();
    assert_eq!(stored.status(), StatusCode::OK);

    let all = app(&setup).oneshot(get("/api/datos")).await.unwrap();
    assert_eq!(all.status(), StatusCode::OK);
    let all = json_body(all).await;
    assert_eq!(all["data"]["meteorologia"][0]["temperatura"], 19.0);
    assert_eq!(all["data"]["luz"][0]["luz"], true);

    let health = app(&setup).oneshot(get("/health")).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}
