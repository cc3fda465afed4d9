//! # Sensor Service サーバー
//!
//! ESP32 打刻端末とモバイルアプリから直接呼び出される REST API。
//!
//! ## 役割
//!
//! - **打刻**: トークン（+ PIN）認証による入退室・休憩・通院の記録と勤務セッションの計上
//! - **センサーログ**: 気象・照度の計測値と未登録カードの読み取りの保存
//! - **ユーザー管理**: 登録・更新
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `SENSOR_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `SENSOR_PORT` | No | ポート番号（デフォルト: `8080`） |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `SEED_ADMIN_USERNAME` | No | 起動時に作成する管理者のユーザー名 |
//! | `SEED_ADMIN_PASSWORD` | No | 起動時に作成する管理者のパスワード |
//! | `LOG_FORMAT` | No | `json` または `pretty`（デフォルト） |
//! | `RUST_LOG` | No | ログレベル（デフォルト: `info,presencia=debug,tower_http=debug`） |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境
//! cargo run -p presencia-sensor-service
//!
//! # 本番環境
//! LOG_FORMAT=json DATABASE_URL=postgres://... cargo run -p presencia-sensor-service --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use presencia_domain::clock::{Clock, SystemClock};
use presencia_infra::{
    Argon2PasswordHasher,
    PasswordHasher,
    db,
    repository::{
        PostgresPresenceRepository,
        PostgresSensorRepository,
        PostgresUserRepository,
        PostgresWorkSessionRepository,
        PresenceRepository,
        SensorRepository,
        UserRepository,
        WorkSessionRepository,
    },
};
use presencia_sensor_service::{
    config::SensorConfig,
    handler::{AppStates, build_router},
    usecase::{AttendanceUseCaseImpl, IngestUseCaseImpl, QueryUseCaseImpl, UserUseCaseImpl},
};
use presencia_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// Sensor Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    init_tracing(&TracingConfig::from_env("sensor-service"))?;

    // 設定読み込み
    let config = SensorConfig::from_env().expect("DATABASE_URL が設定されていません");

    tracing::info!(
        "Sensor Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // データベース接続プールを作成し、スキーマを最新にする
    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("データベースに接続しました");

    // 依存コンポーネントを初期化
    let user_repository: Arc<dyn UserRepository> =
        Arc::new(PostgresUserRepository::new(pool.clone()));
    let presence_repository: Arc<dyn PresenceRepository> =
        Arc::new(PostgresPresenceRepository::new(pool.clone()));
    let work_session_repository: Arc<dyn WorkSessionRepository> =
        Arc::new(PostgresWorkSessionRepository::new(pool.clone()));
    let sensor_repository: Arc<dyn SensorRepository> =
        Arc::new(PostgresSensorRepository::new(pool));
    let password_hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let attendance_usecase = Arc::new(AttendanceUseCaseImpl::new(
        user_repository.clone(),
        presence_repository.clone(),
        work_session_repository.clone(),
        clock.clone(),
    ));
    let ingest_usecase = Arc::new(IngestUseCaseImpl::new(
        user_repository.clone(),
        presence_repository.clone(),
        sensor_repository.clone(),
        password_hasher.clone(),
        attendance_usecase.clone(),
        clock.clone(),
    ));
    let user_usecase = Arc::new(UserUseCaseImpl::new(
        user_repository.clone(),
        password_hasher,
        clock.clone(),
    ));
    let query_usecase = Arc::new(QueryUseCaseImpl::new(
        user_repository,
        presence_repository,
        work_session_repository,
        sensor_repository,
        clock,
    ));

    // 初期管理者の投入
    if let Some(seed) = &config.seed_admin {
        user_usecase
            .ensure_admin(&seed.username, &seed.password)
            .await
            .map_err(|e| anyhow::anyhow!("初期管理者の作成に失敗しました: {e}"))?;
    }

    // ルーター構築
    let app = build_router(AppStates::new(
        attendance_usecase,
        ingest_usecase,
        user_usecase,
        query_usecase,
    ));

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Sensor Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
