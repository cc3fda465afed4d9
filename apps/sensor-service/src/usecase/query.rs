//! 参照系ユースケース
//!
//! 打刻履歴・勤務セッション・センサーログの読み出しをまとめる。

use std::sync::Arc;

use presencia_domain::{
    clock::Clock,
    presence::PresenceRecord,
    sensor::{LightReading, RfidScan, WeatherReading},
    user::User,
    work_session::WorkSession,
};
use presencia_infra::repository::{
    PresenceRepository,
    SensorRepository,
    UserRepository,
    WorkSessionRepository,
};

use crate::error::ApiError;

/// 全コレクションのスナップショット
#[derive(Debug, Clone)]
pub struct DataSnapshot {
    pub weather:    Vec<WeatherReading>,
    pub light:      Vec<LightReading>,
    pub rfid_scans: Vec<RfidScan>,
    pub users:      Vec<User>,
    pub presence:   Vec<PresenceRecord>,
}

/// 参照系ユースケース
pub struct QueryUseCaseImpl {
    user_repository: Arc<dyn UserRepository>,
    presence_repository: Arc<dyn PresenceRepository>,
    work_session_repository: Arc<dyn WorkSessionRepository>,
    sensor_repository: Arc<dyn SensorRepository>,
    clock: Arc<dyn Clock>,
}

impl QueryUseCaseImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        presence_repository: Arc<dyn PresenceRepository>,
        work_session_repository: Arc<dyn WorkSessionRepository>,
        sensor_repository: Arc<dyn SensorRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            presence_repository,
            work_session_repository,
            sensor_repository,
            clock,
        }
    }

    pub async fn snapshot(&self) -> Result<DataSnapshot, ApiError> {
        Ok(DataSnapshot {
            weather:    self.sensor_repository.find_all_weather().await?,
            light:      self.sensor_repository.find_all_light().await?,
            rfid_scans: self.sensor_repository.find_all_rfid_scans().await?,
            users:      self.user_repository.find_all().await?,
            presence:   self.presence_repository.find_all().await?,
        })
    }

    pub async fn list_presence(&self) -> Result<Vec<PresenceRecord>, ApiError> {
        Ok(self.presence_repository.find_all().await?)
    }

    pub async fn presence_history(&self, username: &str) -> Result<Vec<PresenceRecord>, ApiError> {
        Ok(self.presence_repository.find_by_username(username).await?)
    }

    /// 最新の気象計測（0 件または 1 件）
    pub async fn latest_weather(&self) -> Result<Vec<WeatherReading>, ApiError> {
        Ok(self
            .sensor_repository
            .find_latest_weather()
            .await?
            .into_iter()
            .collect())
    }

    /// 最新の照度計測（0 件または 1 件）
    pub async fn latest_light(&self) -> Result<Vec<LightReading>, ApiError> {
        Ok(self
            .sensor_repository
            .find_latest_light()
            .await?
            .into_iter()
            .collect())
    }

    pub async fn list_rfid_scans(&self) -> Result<Vec<RfidScan>, ApiError> {
        Ok(self.sensor_repository.find_all_rfid_scans().await?)
    }

    /// ユーザーの勤務セッションを取得する
    ///
    /// `days` を指定した場合は、開始時刻が `[now - days, now]` のものに絞る。
    pub async fn work_sessions(
        &self,
        username: &str,
        days: Option<i64>,
    ) -> Result<Vec<WorkSession>, ApiError> {
        let Some(days) = days else {
            return Ok(self
                .work_session_repository
                .find_by_username(username)
                .await?);
        };

        if days < 0 {
            return Err(ApiError::BadRequest(
                "dias は 0 以上である必要があります".to_string(),
            ));
        }

        let (from, to) = self
            .clock
            .lookback_days(days)
            .ok_or_else(|| ApiError::BadRequest(format!("dias が大きすぎます: {}", days)))?;

        Ok(self
            .work_session_repository
            .find_by_username_started_between(username, from, to)
            .await?)
    }
}
