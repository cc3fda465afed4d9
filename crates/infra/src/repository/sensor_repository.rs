//! # SensorRepository
//!
//! 気象・照度の計測値と、トークンを持たないカードの読み取りを永続化する。
//! いずれも追記専用のログ。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use presencia_domain::sensor::{
   CardUid,
   LightReading,
   LightReadingId,
   RfidScan,
   RfidScanId,
   WeatherReading,
   WeatherReadingId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// センサーログリポジトリトレイト
#[async_trait]
pub trait SensorRepository: Send + Sync {
   async fn insert_weather(&self, reading: &WeatherReading) -> Result<(), InfraError>;

   /// 全気象計測を取得する（計測時刻の昇順）
   async fn find_all_weather(&self) -> Result<Vec<WeatherReading>, InfraError>;

   /// 最新の気象計測を取得する
   async fn find_latest_weather(&self) -> Result<Option<WeatherReading>, InfraError>;

   async fn insert_light(&self, reading: &LightReading) -> Result<(), InfraError>;

   /// 全照度計測を取得する（計測時刻の昇順）
   async fn find_all_light(&self) -> Result<Vec<LightReading>, InfraError>;

   /// 最新の照度計測を取得する
   async fn find_latest_light(&self) -> Result<Option<LightReading>, InfraError>;

   async fn insert_rfid_scan(&self, scan: &RfidScan) -> Result<(), InfraError>;

   /// 全カード読み取りを取得する（読み取り時刻の昇順）
   async fn find_all_rfid_scans(&self) -> Result<Vec<RfidScan>, InfraError>;
}

#[derive(sqlx::FromRow)]
struct WeatherReadingRow {
   id:          Uuid,
   temperature: f64,
   humidity:    f64,
   recorded_at: DateTime<Utc>,
}

impl From<WeatherReadingRow> for WeatherReading {
   fn from(row: WeatherReadingRow) -> Self {
      WeatherReading::from_db(
         WeatherReadingId::from_uuid(row.id),
         row.temperature,
         row.humidity,
         row.recorded_at,
      )
   }
}

#[derive(sqlx::FromRow)]
struct LightReadingRow {
   id:          Uuid,
   is_lit:      bool,
   recorded_at: DateTime<Utc>,
}

impl From<LightReadingRow> for LightReading {
   fn from(row: LightReadingRow) -> Self {
      LightReading::from_db(LightReadingId::from_uuid(row.id), row.is_lit, row.recorded_at)
   }
}

#[derive(sqlx::FromRow)]
struct RfidScanRow {
   id:         Uuid,
   uid:        String,
   scanned_at: DateTime<Utc>,
}

impl From<RfidScanRow> for RfidScan {
   fn from(row: RfidScanRow) -> Self {
      RfidScan::from_db(RfidScanId::from_uuid(row.id), CardUid::new(row.uid), row.scanned_at)
   }
}

/// PostgreSQL 実装の SensorRepository
#[derive(Debug, Clone)]
pub struct PostgresSensorRepository {
   pool: PgPool,
}

impl PostgresSensorRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl SensorRepository for PostgresSensorRepository {
   async fn insert_weather(&self, reading: &WeatherReading) -> Result<(), InfraError> {
      sqlx::query(
         r#"
            INSERT INTO weather_readings (id, temperature, humidity, recorded_at)
            VALUES ($1, $2, $3, $4)
            "#,
      )
      .bind(reading.id().as_uuid())
      .bind(reading.temperature())
      .bind(reading.humidity())
      .bind(reading.recorded_at())
      .execute(&self.pool)
      .await?;

      Ok(())
   }

   async fn find_all_weather(&self) -> Result<Vec<WeatherReading>, InfraError> {
      let rows = sqlx::query_as::<_, WeatherReadingRow>(
         "SELECT id, temperature, humidity, recorded_at FROM weather_readings ORDER BY recorded_at ASC",
      )
      .fetch_all(&self.pool)
      .await?;

      Ok(rows.into_iter().map(WeatherReading::from).collect())
   }

   async fn find_latest_weather(&self) -> Result<Option<WeatherReading>, InfraError> {
      let row = sqlx::query_as::<_, WeatherReadingRow>(
         r#"
            SELECT id, temperature, humidity, recorded_at
            FROM weather_readings
            ORDER BY recorded_at DESC, id DESC
            LIMIT 1
            "#,
      )
      .fetch_optional(&self.pool)
      .await?;

      Ok(row.map(WeatherReading::from))
   }

   async fn insert_light(&self, reading: &LightReading) -> Result<(), InfraError> {
      sqlx::query("INSERT INTO light_readings (id, is_lit, recorded_at) VALUES ($1, $2, $3)")
         .bind(reading.id().as_uuid())
         .bind(reading.is_lit())
         .bind(reading.recorded_at())
         .execute(&self.pool)
         .await?;

      Ok(())
   }

   async fn find_all_light(&self) -> Result<Vec<LightReading>, InfraError> {
      let rows = sqlx::query_as::<_, LightReadingRow>(
         "SELECT id, is_lit, recorded_at FROM light_readings ORDER BY recorded_at ASC",
      )
      .fetch_all(&self.pool)
      .await?;

      Ok(rows.into_iter().map(LightReading::from).collect())
   }

   async fn find_latest_light(&self) -> Result<Option<LightReading>, InfraError> {
      let row = sqlx::query_as::<_, LightReadingRow>(
         r#"
            SELECT id, is_lit, recorded_at
            FROM light_readings
            ORDER BY recorded_at DESC, id DESC
            LIMIT 1
            "#,
      )
      .fetch_optional(&self.pool)
      .await?;

      Ok(row.map(LightReading::from))
   }

   async fn insert_rfid_scan(&self, scan: &RfidScan) -> Result<(), InfraError> {
      sqlx::query("INSERT INTO rfid_scans (id, uid, scanned_at) VALUES ($1, $2, $3)")
         .bind(scan.id().as_uuid())
         .bind(scan.uid().as_str())
         .bind(scan.scanned_at())
         .execute(&self.pool)
         .await?;

      Ok(())
   }

   async fn find_all_rfid_scans(&self) -> Result<Vec<RfidScan>, InfraError> {
      let rows = sqlx::query_as::<_, RfidScanRow>(
         "SELECT id, uid, scanned_at FROM rfid_scans ORDER BY scanned_at ASC",
      )
      .fetch_all(&self.pool)
      .await?;

      Ok(rows.into_iter().map(RfidScan::from).collect())
   }
}
