//! # Observability 基盤
//!
//! sensor-service のトレーシング初期化。
//!
//! | 環境変数 | 既定値 | 用途 |
//! |----------|--------|------|
//! | `LOG_FORMAT` | `pretty` | `json` で 1 行 1 イベントの JSON を出力 |
//! | `RUST_LOG` | [`DEFAULT_FILTER`] | `EnvFilter` のディレクティブ |

/// `RUST_LOG` 未設定時のフィルタ
pub const DEFAULT_FILTER: &str = "info,presencia=debug,tower_http=debug";

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 収集基盤向け
    Json,
    /// 端末での目視向け
    #[default]
    Pretty,
}

impl LogFormat {
    /// `LOG_FORMAT` の値を解釈する（大文字小文字は区別しない）
    ///
    /// 不明な値は `None`。
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" | "text" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// トレーシング初期化設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// 起動ログに出力するサービス名
    pub service_name: String,
    pub log_format:   LogFormat,
    /// `RUST_LOG` がないときに使うフィルタ
    pub fallback_filter: String,
}

impl TracingConfig {
    pub fn new(service_name: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            service_name: service_name.into(),
            log_format,
            fallback_filter: DEFAULT_FILTER.to_string(),
        }
    }

    /// 環境変数から組み立てる
    ///
    /// `LOG_FORMAT` が不明な値なら警告を出して pretty にする。
    /// tracing の初期化前なので警告は stderr に直接書く。
    pub fn from_env(service_name: impl Into<String>) -> Self {
        let log_format = match std::env::var("LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw).unwrap_or_else(|| {
                eprintln!("WARNING: LOG_FORMAT={raw:?} は不明な値です。pretty で出力します");
                LogFormat::Pretty
            }),
            Err(_) => LogFormat::default(),
        };
        Self::new(service_name, log_format)
    }
}

/// グローバルサブスクライバを登録する
///
/// `tracing_error::ErrorLayer` も登録するので、`InfraError` が保持する
/// SpanTrace に生成時点のスパンが記録される。
///
/// # エラー
///
/// サブスクライバが既に登録済みの場合はエラーを返す。
#[cfg(feature = "observability")]
pub fn init_tracing(
    config: &TracingConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::{
        EnvFilter,
        Layer as _,
        fmt,
        layer::SubscriberExt,
        util::SubscriberInitExt,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.fallback_filter));

    let output = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => fmt::layer().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .with(tracing_error::ErrorLayer::default())
        .try_init()?;

    tracing::debug!(
        service = %config.service_name,
        format = ?config.log_format,
        "トレーシングを初期化しました"
    );
    Ok(())
}
