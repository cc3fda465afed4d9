//! # テスト用モックリポジトリ
//!
//! ユースケース・ハンドラのテストで使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! presencia-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use presencia_domain::{
   password::{PasswordHash, PasswordVerifyResult, PlainPassword},
   presence::PresenceRecord,
   sensor::{LightReading, RfidScan, WeatherReading},
   user::{RfidToken, User, UserId, Username},
   work_session::WorkSession,
};

use crate::{
   error::InfraError,
   password::PasswordHasher,
   repository::{PresenceRepository, SensorRepository, UserRepository, WorkSessionRepository},
};

// ===== MockUserRepository =====

#[derive(Clone, Default)]
pub struct MockUserRepository {
   users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn add_user(&self, user: User) {
      self.users.lock().unwrap().push(user);
   }

   /// 保存済みのユーザーを取得する（テストのアサーション用）
   pub fn users(&self) -> Vec<User> {
      self.users.lock().unwrap().clone()
   }
}

#[async_trait]
impl UserRepository for MockUserRepository {
   async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError> {
      Ok(self
         .users
         .lock()
         .unwrap()
         .iter()
         .find(|u| u.id() == id)
         .cloned())
   }

   async fn find_by_username(&self, username: &Username) -> Result<Option<User>, InfraError> {
      Ok(self
         .users
         .lock()
         .unwrap()
         .iter()
         .find(|u| u.username() == username)
         .cloned())
   }

   async fn find_by_rfid_token(&self, token: &RfidToken) -> Result<Option<User>, InfraError> {
      Ok(self
         .users
         .lock()
         .unwrap()
         .iter()
         .find(|u| u.rfid_token() == Some(token))
         .cloned())
   }

   async fn exists_by_username(&self, username: &Username) -> Result<bool, InfraError> {
      Ok(self
         .users
         .lock()
         .unwrap()
         .iter()
         .any(|u| u.username() == username))
   }

   async fn find_all(&self) -> Result<Vec<User>, InfraError> {
      Ok(self.users.lock().unwrap().clone())
   }

   async fn insert(&self, user: &User) -> Result<(), InfraError> {
      self.users.lock().unwrap().push(user.clone());
      Ok(())
   }

   async fn update(&self, user: &User) -> Result<(), InfraError> {
      let mut users = self.users.lock().unwrap();
      if let Some(pos) = users.iter().position(|u| u.id() == user.id()) {
         users[pos] = user.clone();
      }
      Ok(())
   }
}

// ===== MockPresenceRepository =====

#[derive(Clone, Default)]
pub struct MockPresenceRepository {
   records: Arc<Mutex<Vec<PresenceRecord>>>,
}

impl MockPresenceRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn add_record(&self, record: PresenceRecord) {
      self.records.lock().unwrap().push(record);
   }

   /// 保存済みの打刻記録を挿入順で取得する（テストのアサーション用）
   pub fn records(&self) -> Vec<PresenceRecord> {
      self.records.lock().unwrap().clone()
   }
}

#[async_trait]
impl PresenceRepository for MockPresenceRepository {
   async fn insert(&self, record: &PresenceRecord) -> Result<(), InfraError> {
      self.records.lock().unwrap().push(record.clone());
      Ok(())
   }

   async fn find_latest_by_username(
      &self,
      username: &str,
   ) -> Result<Option<PresenceRecord>, InfraError> {
      // 同一時刻なら後から挿入したものを最新とする
      Ok(self
         .records
         .lock()
         .unwrap()
         .iter()
         .filter(|r| r.username() == username)
         .fold(None, |latest: Option<&PresenceRecord>, r| match latest {
            Some(l) if l.timestamp() > r.timestamp() => Some(l),
            _ => Some(r),
         })
         .cloned())
   }

   async fn find_by_username(&self, username: &str) -> Result<Vec<PresenceRecord>, InfraError> {
      let mut records: Vec<PresenceRecord> = self
         .records
         .lock()
         .unwrap()
         .iter()
         .filter(|r| r.username() == username)
         .cloned()
         .collect();
      records.sort_by_key(PresenceRecord::timestamp);
      Ok(records)
   }

   async fn find_all(&self) -> Result<Vec<PresenceRecord>, InfraError> {
      let mut records = self.records.lock().unwrap().clone();
      records.sort_by_key(PresenceRecord::timestamp);
      Ok(records)
   }
}

// ===== MockWorkSessionRepository =====

#[derive(Clone, Default)]
pub struct MockWorkSessionRepository {
   sessions: Arc<Mutex<Vec<WorkSession>>>,
}

impl MockWorkSessionRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn add_session(&self, session: WorkSession) {
      self.sessions.lock().unwrap().push(session);
   }

   /// 保存済みの勤務セッションを取得する（テストのアサーション用）
   pub fn sessions(&self) -> Vec<WorkSession> {
      self.sessions.lock().unwrap().clone()
   }

   fn sorted_by_start(&self, filter: impl Fn(&WorkSession) -> bool) -> Vec<WorkSession> {
      let mut sessions: Vec<WorkSession> = self
         .sessions
         .lock()
         .unwrap()
         .iter()
         .filter(|s| filter(*s))
         .cloned()
         .collect();
      sessions.sort_by_key(WorkSession::start);
      sessions
   }
}

#[async_trait]
impl WorkSessionRepository for MockWorkSessionRepository {
   async fn insert(&self, session: &WorkSession) -> Result<(), InfraError> {
      self.sessions.lock().unwrap().push(session.clone());
      Ok(())
   }

   async fn find_by_username(&self, username: &str) -> Result<Vec<WorkSession>, InfraError> {
      Ok(self.sorted_by_start(|s| s.username() == username))
   }

   async fn find_by_username_started_between(
      &self,
      username: &str,
      from: DateTime<Utc>,
      to: DateTime<Utc>,
   ) -> Result<Vec<WorkSession>, InfraError> {
      Ok(self.sorted_by_start(|s| s.username() == username && s.start() >= from && s.start() <= to))
   }
}

// ===== FailingWorkSessionRepository =====

/// 書き込みが常に失敗する勤務セッションリポジトリ
///
/// セッションの保存に失敗しても打刻記録が残ることを検証するために使う。
#[derive(Clone, Default)]
pub struct FailingWorkSessionRepository;

#[async_trait]
impl WorkSessionRepository for FailingWorkSessionRepository {
   async fn insert(&self, _session: &WorkSession) -> Result<(), InfraError> {
      Err(InfraError::unexpected("work_sessions への書き込みに失敗"))
   }

   async fn find_by_username(&self, _username: &str) -> Result<Vec<WorkSession>, InfraError> {
      Ok(Vec::new())
   }

   async fn find_by_username_started_between(
      &self,
      _username: &str,
      _from: DateTime<Utc>,
      _to: DateTime<Utc>,
   ) -> Result<Vec<WorkSession>, InfraError> {
      Ok(Vec::new())
   }
}

// ===== MockSensorRepository =====

#[derive(Clone, Default)]
pub struct MockSensorRepository {
   weather: Arc<Mutex<Vec<WeatherReading>>>,
   light: Arc<Mutex<Vec<LightReading>>>,
   rfid_scans: Arc<Mutex<Vec<RfidScan>>>,
}

impl MockSensorRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn weather(&self) -> Vec<WeatherReading> {
      self.weather.lock().unwrap().clone()
   }

   pub fn light(&self) -> Vec<LightReading> {
      self.light.lock().unwrap().clone()
   }

   pub fn rfid_scans(&self) -> Vec<RfidScan> {
      self.rfid_scans.lock().unwrap().clone()
   }
}

#[async_trait]
impl SensorRepository for MockSensorRepository {
   async fn insert_weather(&self, reading: &WeatherReading) -> Result<(), InfraError> {
      self.weather.lock().unwrap().push(reading.clone());
      Ok(())
   }

   async fn find_all_weather(&self) -> Result<Vec<WeatherReading>, InfraError> {
      Ok(self.weather())
   }

   async fn find_latest_weather(&self) -> Result<Option<WeatherReading>, InfraError> {
      Ok(self
         .weather
         .lock()
         .unwrap()
         .iter()
         .max_by_key(|r| r.recorded_at())
         .cloned())
   }

   async fn insert_light(&self, reading: &LightReading) -> Result<(), InfraError> {
      self.light.lock().unwrap().push(reading.clone());
      Ok(())
   }

   async fn find_all_light(&self) -> Result<Vec<LightReading>, InfraError> {
      Ok(self.light())
   }

   async fn find_latest_light(&self) -> Result<Option<LightReading>, InfraError> {
      Ok(self
         .light
         .lock()
         .unwrap()
         .iter()
         .max_by_key(|r| r.recorded_at())
         .cloned())
   }

   async fn insert_rfid_scan(&self, scan: &RfidScan) -> Result<(), InfraError> {
      self.rfid_scans.lock().unwrap().push(scan.clone());
      Ok(())
   }

   async fn find_all_rfid_scans(&self) -> Result<Vec<RfidScan>, InfraError> {
      Ok(self.rfid_scans())
   }
}

// ===== MockPasswordHasher =====

/// `mock$<平文>` 形式で「ハッシュ」する高速なテスト用実装
///
/// Argon2id は 1 回あたり 64 MB を確保するため、ハンドラテストではこちらを使う。
#[derive(Clone, Default)]
pub struct MockPasswordHasher;

impl MockPasswordHasher {
   const PREFIX: &'static str = "mock$";

   /// 平文からテスト用ハッシュを作る（フィクスチャ用）
   pub fn hash_of(password: &str) -> PasswordHash {
      PasswordHash::new(format!("{}{}", Self::PREFIX, password))
   }
}

impl PasswordHasher for MockPasswordHasher {
   fn hash(&self, password: &PlainPassword) -> Result<PasswordHash, InfraError> {
      Ok(Self::hash_of(password.as_str()))
   }

   fn verify(
      &self,
      password: &PlainPassword,
      hash: &PasswordHash,
   ) -> Result<PasswordVerifyResult, InfraError> {
      let Some(stored) = hash.as_str().strip_prefix(Self::PREFIX) else {
         return Err(InfraError::password_hash("テスト用ハッシュの形式ではありません"));
      };
      Ok(PasswordVerifyResult::from(stored == password.as_str()))
   }
}
