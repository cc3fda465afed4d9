//! # Sensor Service 設定
//!
//! 環境変数から Sensor Service サーバーの設定を読み込む。

use std::env;

/// Sensor Service サーバーの設定
#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// データベース接続 URL
    pub database_url: String,
    /// 起動時に作成する管理者（未設定なら作成しない）
    pub seed_admin: Option<SeedAdminConfig>,
}

/// 起動時に投入する管理者ユーザー
///
/// `SEED_ADMIN_USERNAME` と `SEED_ADMIN_PASSWORD` の両方が設定されている場合のみ有効。
#[derive(Clone)]
pub struct SeedAdminConfig {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SeedAdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedAdminConfig")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl SensorConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            host: env::var("SENSOR_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SENSOR_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("SENSOR_PORT は有効なポート番号である必要があります"),
            database_url: env::var("DATABASE_URL")?,
            seed_admin: SeedAdminConfig::from_env(),
        })
    }
}

impl SeedAdminConfig {
    fn from_env() -> Option<Self> {
        let username = env::var("SEED_ADMIN_USERNAME").ok()?;
        let password = env::var("SEED_ADMIN_PASSWORD").ok()?;
        if username.trim().is_empty() || password.is_empty() {
            return None;
        }
        Some(Self { username, password })
    }
}
