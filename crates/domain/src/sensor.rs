//! # センサーログ
//!
//! 端末が定期送信する気象・照度の計測値と、トークンを持たないカードの読み取りを
//! 追記専用のログとして表現する。

use chrono::{DateTime, Utc};
use derive_more::{Display, From};

define_uuid_id! {
    /// 気象計測 ID
    pub struct WeatherReadingId;
}

define_uuid_id! {
    /// 照度計測 ID
    pub struct LightReadingId;
}

define_uuid_id! {
    /// カード読み取り ID
    pub struct RfidScanId;
}

/// カード UID
///
/// リーダーが送った値をそのまま保持する。未知のカードの読み取りは
/// 観測ログなので、長すぎる値や空白だけの値も捨てずに記録する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From)]
pub struct CardUid(String);

impl CardUid {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 気象計測（温度・湿度）
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReading {
    id: WeatherReadingId,
    temperature: f64,
    humidity: f64,
    recorded_at: DateTime<Utc>,
}

impl WeatherReading {
    pub fn new(temperature: f64, humidity: f64, now: DateTime<Utc>) -> Self {
        Self {
            id: WeatherReadingId::new(),
            temperature,
            humidity,
            recorded_at: now,
        }
    }

    pub fn from_db(
        id: WeatherReadingId,
        temperature: f64,
        humidity: f64,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            temperature,
            humidity,
            recorded_at,
        }
    }

    pub fn id(&self) -> &WeatherReadingId {
        &self.id
    }

    /// 温度（℃）
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// 相対湿度（%）
    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

/// 照度計測
///
/// 端末は照度センサーの閾値判定結果だけを送る。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightReading {
    id: LightReadingId,
    is_lit: bool,
    recorded_at: DateTime<Utc>,
}

impl LightReading {
    pub fn new(is_lit: bool, now: DateTime<Utc>) -> Self {
        Self {
            id: LightReadingId::new(),
            is_lit,
            recorded_at: now,
        }
    }

    pub fn from_db(id: LightReadingId, is_lit: bool, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id,
            is_lit,
            recorded_at,
        }
    }

    pub fn id(&self) -> &LightReadingId {
        &self.id
    }

    pub fn is_lit(&self) -> bool {
        self.is_lit
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

/// トークンを持たないカードの読み取り
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RfidScan {
    id: RfidScanId,
    uid: CardUid,
    scanned_at: DateTime<Utc>,
}

impl RfidScan {
    pub fn new(uid: CardUid, now: DateTime<Utc>) -> Self {
        Self {
            id: RfidScanId::new(),
            uid,
            scanned_at: now,
        }
    }

    pub fn from_db(id: RfidScanId, uid: CardUid, scanned_at: DateTime<Utc>) -> Self {
        Self {
            id,
            uid,
            scanned_at,
        }
    }

    pub fn id(&self) -> &RfidScanId {
        &self.id
    }

    pub fn uid(&self) -> &CardUid {
        &self.uid
    }

    pub fn scanned_at(&self) -> DateTime<Utc> {
        self.scanned_at
    }
}
