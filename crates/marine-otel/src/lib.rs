use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

/// Target used by the HTTP access-log middleware.
pub const ACCESS_TARGET: &str = "http.access";

static ACCESS_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Minutely,
    Hourly,
    Daily,
}

impl Rotation {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hourly" => Rotation::Hourly,
            "minutely" => Rotation::Minutely,
            _ => Rotation::Daily,
        }
    }
}

/// Rolling file sink for `http.access` events.
#[derive(Debug, Clone)]
pub struct AccessLogFile {
    pub dir: PathBuf,
    pub prefix: String,
    pub rotation: Rotation,
}

impl AccessLogFile {
    /// Enabled with `MARINE_ACCESS_LOG_ROLL=1`; the directory falls back to
    /// `MARINE_ACCESS_LOG_DIR`, then `logs_dir`.
    pub fn from_env(logs_dir: &Path) -> Option<Self> {
        if std::env::var("MARINE_ACCESS_LOG_ROLL").ok().as_deref() != Some("1") {
            return None;
        }
        let dir = std::env::var("MARINE_ACCESS_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| logs_dir.to_path_buf());
        let prefix =
            std::env::var("MARINE_ACCESS_LOG_PREFIX").unwrap_or_else(|_| "http-access".into());
        let rotation = std::env::var("MARINE_ACCESS_LOG_ROTATION")
            .map(|raw| Rotation::parse(&raw))
            .unwrap_or(Rotation::Daily);
        Some(Self {
            dir,
            prefix,
            rotation,
        })
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init(default_filter: &str, access_log: Option<AccessLogFile>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(fmt_layer.with_filter(filter));

    match access_log {
        Some(file) => {
            if std::fs::create_dir_all(&file.dir).is_err() {
                eprintln!(
                    "warning: failed to create access log directory {}",
                    file.dir.display()
                );
            }
            let writer = match file.rotation {
                Rotation::Hourly => tracing_appender::rolling::hourly(&file.dir, &file.prefix),
                Rotation::Minutely => {
                    tracing_appender::rolling::minutely(&file.dir, &file.prefix)
                }
                Rotation::Daily => tracing_appender::rolling::daily(&file.dir, &file.prefix),
            };
            let (nb, guard) = tracing_appender::non_blocking(writer);
            let _ = ACCESS_GUARD.set(guard);
            let targets = Targets::new().with_target(ACCESS_TARGET, tracing::Level::INFO);
            let access_layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(nb)
                .with_filter(targets);
            let _ = registry.with(access_layer).try_init();
        }
        None => {
            let _ = registry.try_init();
        }
    }
}

/// Console-only subscriber for command-line tools.
pub fn init_cli(verbose: bool) {
    init(if verbose { "debug" } else { "warn" }, None);
}
