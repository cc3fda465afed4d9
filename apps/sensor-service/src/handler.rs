//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは DTO の変換だけを行い、ビジネスロジックはユースケース層に委譲

pub mod health;
pub mod ingest;
pub mod presence;
pub mod query;
pub mod user;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
pub use health::health_check;
pub use ingest::{IngestState, ingest};
pub use presence::{AttendanceState, record_manual};
pub use query::{
    QueryState,
    get_all_data,
    get_latest_light,
    get_latest_weather,
    get_presence_history,
    list_presence,
    list_rfid_scans,
    list_work_sessions,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
pub use user::{UserState, register_user, update_user};

use crate::usecase::{
    AttendanceUseCaseImpl,
    IngestUseCaseImpl,
    QueryUseCaseImpl,
    UserUseCaseImpl,
};

/// ルーター全体の共有状態
pub struct AppStates {
    pub attendance: Arc<AttendanceState>,
    pub ingest:     Arc<IngestState>,
    pub user:       Arc<UserState>,
    pub query:      Arc<QueryState>,
}

impl AppStates {
    pub fn new(
        attendance: Arc<AttendanceUseCaseImpl>,
        ingest: Arc<IngestUseCaseImpl>,
        user: Arc<UserUseCaseImpl>,
        query: Arc<QueryUseCaseImpl>,
    ) -> Self {
        Self {
            attendance: Arc::new(AttendanceState {
                usecase: attendance,
            }),
            ingest:     Arc::new(IngestState { usecase: ingest }),
            user:       Arc::new(UserState { usecase: user }),
            query:      Arc::new(QueryState { usecase: query }),
        }
    }
}

/// 全エンドポイントのルーターを構築する
///
/// 端末とモバイルアプリが直接呼び出すため、CORS はすべてのオリジンを許可する。
pub fn build_router(states: AppStates) -> Router {
    // `/api/datos` は GET（参照）と POST（受信）で状態が異なるため、メソッドごとに状態を渡す
    let datos = get(get_all_data)
        .with_state(states.query.clone())
        .merge(post(ingest).with_state(states.ingest));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/datos", datos)
        // 参照 API
        .route("/api/datos/meteorologia", get(get_latest_weather))
        .route("/api/datos/luz", get(get_latest_light))
        .route("/api/datos/rfid", get(list_rfid_scans))
        .route("/api/datos/presencia", get(list_presence))
        .route("/api/control-presencia", get(list_presence))
        .route(
            "/api/control-presencia/usuario/{username}",
            get(get_presence_history),
        )
        .route("/api/sesiones/usuario/{username}", get(list_work_sessions))
        .with_state(states.query)
        // 打刻 API
        .route("/api/presencia/manual", post(record_manual))
        .with_state(states.attendance)
        // ユーザー API
        .route("/api/usuarios/registrar", post(register_user))
        .route("/api/usuarios/{id}", put(update_user))
        .with_state(states.user)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
