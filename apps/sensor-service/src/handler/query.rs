//! # 参照系ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/datos` - 全コレクション
//! - `GET /api/control-presencia`, `GET /api/datos/presencia` - 全打刻記録（古い順）
//! - `GET /api/datos/meteorologia` - 最新の気象計測
//! - `GET /api/datos/luz` - 最新の照度計測
//! - `GET /api/datos/rfid` - 未登録カードの読み取りログ
//! - `GET /api/control-presencia/usuario/{username}` - ユーザーの打刻履歴
//! - `GET /api/sesiones/usuario/{username}?dias=N` - ユーザーの勤務セッション

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use presencia_domain::{
    sensor::{LightReading, RfidScan, WeatherReading},
    work_session::WorkSession,
};
use presencia_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{presence::PresenceRecordDto, user::UserDto};
use crate::{error::ApiError, usecase::QueryUseCaseImpl};

/// 参照 API の共有状態
pub struct QueryState {
    pub usecase: Arc<QueryUseCaseImpl>,
}

// --- リクエスト/レスポンス型 ---

/// 勤務セッションの期間指定
#[derive(Debug, Deserialize)]
pub struct SessionWindowQuery {
    pub dias: Option<i64>,
}

/// 気象計測 DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct WeatherReadingDto {
    pub id:          Uuid,
    #[serde(rename = "temperatura")]
    pub temperature: f64,
    #[serde(rename = "humedad")]
    pub humidity:    f64,
    #[serde(rename = "fecha")]
    pub recorded_at: String,
}

impl From<&WeatherReading> for WeatherReadingDto {
    fn from(r: &WeatherReading) -> Self {
        Self {
            id:          *r.id().as_uuid(),
            temperature: r.temperature(),
            humidity:    r.humidity(),
            recorded_at: r.recorded_at().to_rfc3339(),
        }
    }
}

/// 照度計測 DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LightReadingDto {
    pub id:          Uuid,
    #[serde(rename = "luz")]
    pub is_lit:      bool,
    #[serde(rename = "fecha")]
    pub recorded_at: String,
}

impl From<&LightReading> for LightReadingDto {
    fn from(r: &LightReading) -> Self {
        Self {
            id:          *r.id().as_uuid(),
            is_lit:      r.is_lit(),
            recorded_at: r.recorded_at().to_rfc3339(),
        }
    }
}

/// カード読み取り DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RfidScanDto {
    pub id:         Uuid,
    pub uid:        String,
    #[serde(rename = "fecha")]
    pub scanned_at: String,
}

impl From<&RfidScan> for RfidScanDto {
    fn from(s: &RfidScan) -> Self {
        Self {
            id:         *s.id().as_uuid(),
            uid:        s.uid().as_str().to_string(),
            scanned_at: s.scanned_at().to_rfc3339(),
        }
    }
}

/// 勤務セッション DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkSessionDto {
    pub id:               Uuid,
    #[serde(rename = "usuario")]
    pub username:         String,
    #[serde(rename = "inicio")]
    pub start:            String,
    #[serde(rename = "fin")]
    pub end:              String,
    #[serde(rename = "duracionMinutos")]
    pub duration_minutes: i64,
}

impl From<&WorkSession> for WorkSessionDto {
    fn from(s: &WorkSession) -> Self {
        Self {
            id:               *s.id().as_uuid(),
            username:         s.username().to_string(),
            start:            s.start().to_rfc3339(),
            end:              s.end().to_rfc3339(),
            duration_minutes: s.duration_minutes(),
        }
    }
}

/// 全コレクション DTO
#[derive(Debug, Serialize)]
pub struct DataSnapshotDto {
    pub meteorologia: Vec<WeatherReadingDto>,
    pub luz:          Vec<LightReadingDto>,
    pub rfid:         Vec<RfidScanDto>,
    pub usuarios:     Vec<UserDto>,
    pub presencia:    Vec<PresenceRecordDto>,
}

fn to_dtos<'a, T: 'a, D: From<&'a T>>(items: &'a [T]) -> Vec<D> {
    items.iter().map(D::from).collect()
}

// --- ハンドラ ---

/// GET /api/datos
#[tracing::instrument(skip_all)]
pub async fn get_all_data(
    State(state): State<Arc<QueryState>>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.usecase.snapshot().await?;

    let dto = DataSnapshotDto {
        meteorologia: to_dtos(&snapshot.weather),
        luz:          to_dtos(&snapshot.light),
        rfid:         to_dtos(&snapshot.rfid_scans),
        usuarios:     to_dtos(&snapshot.users),
        presencia:    to_dtos(&snapshot.presence),
    };

    Ok((StatusCode::OK, Json(ApiResponse::new(dto))))
}

/// GET /api/control-presencia, GET /api/datos/presencia
#[tracing::instrument(skip_all)]
pub async fn list_presence(
    State(state): State<Arc<QueryState>>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state.usecase.list_presence().await?;
    let items: Vec<PresenceRecordDto> = to_dtos(&records);
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// GET /api/control-presencia/usuario/{username}
#[tracing::instrument(skip_all, fields(%username))]
pub async fn get_presence_history(
    State(state): State<Arc<QueryState>>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state.usecase.presence_history(&username).await?;
    let items: Vec<PresenceRecordDto> = to_dtos(&records);
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// GET /api/datos/meteorologia
///
/// 最新の 1 件だけを配列で返す（計測がなければ空配列）。
#[tracing::instrument(skip_all)]
pub async fn get_latest_weather(
    State(state): State<Arc<QueryState>>,
) -> Result<impl IntoResponse, ApiError> {
    let readings = state.usecase.latest_weather().await?;
    let items: Vec<WeatherReadingDto> = to_dtos(&readings);
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// GET /api/datos/luz
///
/// 最新の 1 件だけを配列で返す（計測がなければ空配列）。
#[tracing::instrument(skip_all)]
pub async fn get_latest_light(
    State(state): State<Arc<QueryState>>,
) -> Result<impl IntoResponse, ApiError> {
    let readings = state.usecase.latest_light().await?;
    let items: Vec<LightReadingDto> = to_dtos(&readings);
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// GET /api/datos/rfid
#[tracing::instrument(skip_all)]
pub async fn list_rfid_scans(
    State(state): State<Arc<QueryState>>,
) -> Result<impl IntoResponse, ApiError> {
    let scans = state.usecase.list_rfid_scans().await?;
    let items: Vec<RfidScanDto> = to_dtos(&scans);
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// GET /api/sesiones/usuario/{username}?dias=N
///
/// ## レスポンス
///
/// - `200 OK`: 勤務セッション（開始時刻の昇順）
/// - `400 Bad Request`: `dias` が負
#[tracing::instrument(skip_all, fields(%username))]
pub async fn list_work_sessions(
    State(state): State<Arc<QueryState>>,
    Path(username): Path<String>,
    Query(query): Query<SessionWindowQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = state.usecase.work_sessions(&username, query.dias).await?;
    let items: Vec<WorkSessionDto> = to_dtos(&sessions);
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}
