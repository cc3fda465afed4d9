//! 端末データ受信ユースケース
//!
//! `POST /api/datos` の 1 つのペイロードには、トークン認証・旧式ログイン・
//! カード UID・センサー計測値のいずれかが入っている。上から順に評価し、
//! 最初に該当した分岐の結果を返す。
//!
//! | 順 | 条件 | 処理 |
//! |----|------|------|
//! | 1 | `token` あり | トークン（+ PIN）認証して打刻 |
//! | 2 | `usuario` と `password` あり | 旧式ログイン |
//! | 3 | `rfidUid` あり | 未登録カードの読み取りログ |
//! | 4 | それ以外 | 気象・照度の計測値を保存 |

use std::sync::Arc;

use presencia_domain::{
    attendance::AttendanceSignal,
    clock::Clock,
    password::PlainPassword,
    presence::{AuthMethod, MovementType, PresenceRecord},
    sensor::{CardUid, LightReading, RfidScan, WeatherReading},
    user::{RfidToken, User, Username},
};
use presencia_infra::{
    PasswordHasher,
    repository::{PresenceRepository, SensorRepository, UserRepository},
};
use presencia_shared::{
    event_log::{error as log_error, event},
    log_business_event,
};

use super::attendance::{AttendanceUseCaseImpl, DETAILS_ACCESS_GRANTED};
use crate::error::ApiError;

/// PIN 不一致時の詳細
pub const DETAILS_WRONG_PIN: &str = "PIN Incorrecto";

/// 端末から届くペイロード
///
/// 空文字列は未指定として扱う。
#[derive(Debug, Clone, Default)]
pub struct IngestInput {
    pub temperature: Option<f64>,
    pub humidity:    Option<f64>,
    pub light:       Option<bool>,
    pub rfid_uid:    Option<String>,
    pub username:    Option<String>,
    pub password:    Option<String>,
    pub token:       Option<String>,
    pub pin:         Option<String>,
    pub tipo:        Option<String>,
}

/// 受信処理の結果
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// トークン認証に成功して打刻した
    Movement {
        movement: MovementType,
        username: String,
    },
    /// 旧式ログインに成功した
    LoggedIn(User),
    /// 未登録カードの読み取りを記録した
    CardScanned(RfidScan),
    /// センサー計測値を保存した（どちらも false なら何も保存していない）
    ReadingsStored { weather: bool, light: bool },
}

/// 端末データ受信ユースケース
pub struct IngestUseCaseImpl {
    user_repository: Arc<dyn UserRepository>,
    presence_repository: Arc<dyn PresenceRepository>,
    sensor_repository: Arc<dyn SensorRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    attendance: Arc<AttendanceUseCaseImpl>,
    clock: Arc<dyn Clock>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl IngestUseCaseImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        presence_repository: Arc<dyn PresenceRepository>,
        sensor_repository: Arc<dyn SensorRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        attendance: Arc<AttendanceUseCaseImpl>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            presence_repository,
            sensor_repository,
            password_hasher,
            attendance,
            clock,
        }
    }

    /// ペイロードを分岐して処理する
    #[tracing::instrument(skip_all)]
    pub async fn ingest(&self, input: IngestInput) -> Result<IngestOutcome, ApiError> {
        if let Some(token) = non_empty(input.token) {
            return self
                .authenticate_token(&token, non_empty(input.pin), input.tipo.as_deref())
                .await;
        }

        if let (Some(username), Some(password)) = (input.username, input.password) {
            return self.legacy_login(&username, &password).await;
        }

        if let Some(uid) = non_empty(input.rfid_uid) {
            return self.record_card_scan(uid).await;
        }

        self.store_readings(input.temperature, input.humidity, input.light)
            .await
    }

    /// トークン（+ PIN）で認証して打刻する
    async fn authenticate_token(
        &self,
        token: &str,
        pin: Option<String>,
        tipo: Option<&str>,
    ) -> Result<IngestOutcome, ApiError> {
        let user = match RfidToken::new(token) {
            Ok(token) => self.user_repository.find_by_rfid_token(&token).await?,
            Err(_) => None,
        };

        let Some(user) = user else {
            let record = PresenceRecord::unknown_token(token, self.clock.now());
            self.presence_repository.insert(&record).await?;
            log_business_event!(
                event.category = event::category::AUTH,
                event.action = event::action::TOKEN_REJECTED,
                event.entity_type = event::entity_type::PRESENCE_RECORD,
                event.entity_id = %record.id(),
                event.result = event::result::FAILURE,
                "未登録のトークンによる打刻を拒否しました"
            );
            return Err(ApiError::Unauthorized("TOKEN NO RECONOCIDO".to_string()));
        };

        let username = user.username().as_str().to_string();
        let auth_method = match pin {
            Some(pin) => {
                if !self.verify_password(&user, &pin) {
                    let record = PresenceRecord::attempt(
                        username.as_str(),
                        AuthMethod::TokenPin,
                        DETAILS_WRONG_PIN,
                        self.clock.now(),
                    );
                    self.presence_repository.insert(&record).await?;
                    log_business_event!(
                        event.category = event::category::AUTH,
                        event.action = event::action::PIN_REJECTED,
                        event.entity_type = event::entity_type::PRESENCE_RECORD,
                        event.entity_id = %record.id(),
                        event.username = %username,
                        event.result = event::result::FAILURE,
                        "PIN が一致しませんでした"
                    );
                    return Err(ApiError::Unauthorized("PIN INCORRECTO".to_string()));
                }
                AuthMethod::TokenPin
            }
            None => AuthMethod::Token,
        };

        let signal = AttendanceSignal::parse(tipo)?;
        let record = self
            .attendance
            .record_movement(
                &username,
                auth_method,
                signal,
                DETAILS_ACCESS_GRANTED.to_string(),
            )
            .await?;

        Ok(IngestOutcome::Movement {
            movement: record.movement(),
            username,
        })
    }

    /// ユーザー名とパスワードで照合する
    ///
    /// 打刻記録は残さない。
    async fn legacy_login(&self, username: &str, password: &str) -> Result<IngestOutcome, ApiError> {
        let user = match Username::new(username) {
            Ok(name) => self.user_repository.find_by_username(&name).await?,
            Err(_) => None,
        };

        match user {
            Some(user) if self.verify_password(&user, password) => {
                log_business_event!(
                    event.category = event::category::AUTH,
                    event.action = event::action::LOGIN_SUCCESS,
                    event.entity_type = event::entity_type::USER,
                    event.entity_id = %user.id(),
                    event.username = %user.username(),
                    event.result = event::result::SUCCESS,
                    "ログインに成功しました"
                );
                Ok(IngestOutcome::LoggedIn(user))
            }
            _ => {
                log_business_event!(
                    event.category = event::category::AUTH,
                    event.action = event::action::LOGIN_FAILURE,
                    event.username = username,
                    event.result = event::result::FAILURE,
                    "ログインに失敗しました"
                );
                Err(ApiError::Unauthorized("LOGIN FALLIDO".to_string()))
            }
        }
    }

    async fn record_card_scan(&self, uid: String) -> Result<IngestOutcome, ApiError> {
        let scan = RfidScan::new(CardUid::new(uid), self.clock.now());
        self.sensor_repository.insert_rfid_scan(&scan).await?;

        log_business_event!(
            event.category = event::category::SENSOR,
            event.action = event::action::CARD_SCANNED,
            event.entity_type = event::entity_type::RFID_SCAN,
            event.entity_id = %scan.id(),
            event.result = event::result::SUCCESS,
            "カードの読み取りを記録しました"
        );

        Ok(IngestOutcome::CardScanned(scan))
    }

    async fn store_readings(
        &self,
        temperature: Option<f64>,
        humidity: Option<f64>,
        light: Option<bool>,
    ) -> Result<IngestOutcome, ApiError> {
        let now = self.clock.now();

        let weather = match (temperature, humidity) {
            (Some(temperature), Some(humidity)) => {
                self.sensor_repository
                    .insert_weather(&WeatherReading::new(temperature, humidity, now))
                    .await?;
                true
            }
            _ => false,
        };

        let light = match light {
            Some(is_lit) => {
                self.sensor_repository
                    .insert_light(&LightReading::new(is_lit, now))
                    .await?;
                true
            }
            None => false,
        };

        if weather || light {
            log_business_event!(
                event.category = event::category::SENSOR,
                event.action = event::action::READINGS_STORED,
                event.weather = weather,
                event.light = light,
                event.result = event::result::SUCCESS,
                "センサー計測値を保存しました"
            );
        } else {
            tracing::debug!("保存対象の計測値がないペイロードを受信しました");
        }

        Ok(IngestOutcome::ReadingsStored { weather, light })
    }

    /// パスワード（PIN）を照合する
    ///
    /// ハッシュが壊れている場合は不一致として扱い、エラーはログに残す。
    fn verify_password(&self, user: &User, password: &str) -> bool {
        match self
            .password_hasher
            .verify(&PlainPassword::new(password), user.password_hash())
        {
            Ok(result) => result.is_match(),
            Err(e) => {
                tracing::error!(
                    error.category = log_error::category::INFRASTRUCTURE,
                    error.kind = log_error::kind::PASSWORD_VERIFICATION,
                    username = %user.username(),
                    "パスワードの検証に失敗しました: {}",
                    e
                );
                false
            }
        }
    }
}
