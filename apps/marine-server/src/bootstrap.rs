use anyhow::Context;
use marine_core::Settings;
use marine_kernel::{InitOutcome, Kernel};
use tracing::{info, warn};

use crate::{access_log, app_state::AppState, router::build_router, security};

pub(crate) struct BootstrapOutput {
    pub router: axum::Router<AppState>,
    pub state: AppState,
}

pub(crate) async fn build(settings: &Settings) -> anyhow::Result<BootstrapOutput> {
    let kernel = Kernel::open(&settings.db_path)
        .with_context(|| format!("opening database {}", settings.db_path.display()))?;
    if settings.auto_init {
        auto_initialize(&kernel, settings).await;
    }
    let (router, endpoints, endpoints_meta) = build_router();
    let state = AppState::new(
        kernel,
        settings.sql_candidates.clone(),
        endpoints,
        endpoints_meta,
    );
    Ok(BootstrapOutput { router, state })
}

/// A failed auto-init leaves the server up so DB Init can report the problem.
async fn auto_initialize(kernel: &Kernel, settings: &Settings) {
    match kernel
        .ensure_initialized_async(settings.sql_candidates.clone(), true)
        .await
    {
        Ok(InitOutcome::AlreadyPresent) => {
            info!(db = %kernel.db_path().display(), "database ready");
        }
        Ok(outcome @ InitOutcome::Initialized { .. }) => {
            info!(db = %kernel.db_path().display(), "{}", outcome.message(kernel.db_path()));
        }
        Err(err) => warn!("database auto-init failed: {err}"),
    }
}

pub(crate) fn attach_http_layers(
    router: axum::Router<()>,
    concurrency_limit: usize,
) -> axum::Router<()> {
    use tower::limit::ConcurrencyLimitLayer;
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    router
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(ConcurrencyLimitLayer::new(concurrency_limit))
}

pub(crate) fn attach_global_layers(router: axum::Router<()>) -> axum::Router<()> {
    router
        .layer(axum::middleware::from_fn(access_log::access_log_mw))
        .layer(axum::middleware::from_fn(security::headers_mw))
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum HttpConfigError {
    #[error("invalid MARINE_BIND: {0}")]
    InvalidBind(String),
    #[error("MARINE_BIND={bind} is public and MARINE_ADMIN_TOKEN is not set; refusing to start")]
    MissingAdminToken { bind: String },
}

#[derive(Debug)]
pub(crate) struct HttpConfig {
    pub addr: std::net::SocketAddr,
    pub concurrency_limit: usize,
}

pub(crate) fn http_config(settings: &Settings) -> Result<HttpConfig, HttpConfigError> {
    let bind = settings.bind.trim();
    enforce_admin_token_guard(bind)?;
    let host = match bind {
        "localhost" => "127.0.0.1",
        other => other.trim_start_matches('[').trim_end_matches(']'),
    };
    let ip: std::net::IpAddr = host
        .parse()
        .map_err(|_| HttpConfigError::InvalidBind(bind.to_string()))?;
    Ok(HttpConfig {
        addr: std::net::SocketAddr::new(ip, settings.port),
        concurrency_limit: settings.max_concurrency,
    })
}

fn enforce_admin_token_guard(bind: &str) -> Result<(), HttpConfigError> {
    let bind_lower = bind.to_ascii_lowercase();
    let is_loopback = matches!(
        bind_lower.as_str(),
        "127.0.0.1" | "::1" | "[::1]" | "localhost"
    );
    if !is_loopback && !security::admin_token_set() {
        return Err(HttpConfigError::MissingAdminToken {
            bind: bind.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::env;
    use std::path::PathBuf;

    fn settings(bind: &str) -> Settings {
        Settings {
            config_source: None,
            state_dir: PathBuf::from("state"),
            logs_dir: PathBuf::from("state/logs"),
            bind: bind.into(),
            port: 8095,
            max_concurrency: 16,
            db_path: PathBuf::from("state/marine.sqlite"),
            sql_candidates: Vec::new(),
            auto_init: false,
            log_filter: "info".into(),
        }
    }

    #[test]
    fn loopback_binds_without_token() {
        let mut guard = env::guard();
        guard.remove("MARINE_ADMIN_TOKEN");
        let cfg = http_config(&settings("localhost")).unwrap();
        assert_eq!(cfg.addr.to_string(), "127.0.0.1:8095");
        assert_eq!(cfg.concurrency_limit, 16);
        assert_eq!(
            http_config(&settings("[::1]")).unwrap().addr.to_string(),
            "[::1]:8095"
        );
    }

    #[test]
    fn public_bind_requires_token() {
        let mut guard = env::guard();
        guard.remove("MARINE_ADMIN_TOKEN");
        assert!(matches!(
            http_config(&settings("0.0.0.0")),
            Err(HttpConfigError::MissingAdminToken { .. })
        ));
        guard.set("MARINE_ADMIN_TOKEN", "reef");
        assert!(http_config(&settings("0.0.0.0")).is_ok());
    }

    #[test]
    fn garbage_bind_is_rejected() {
        let mut guard = env::guard();
        guard.set("MARINE_ADMIN_TOKEN", "reef");
        assert!(matches!(
            http_config(&settings("not an ip")),
            Err(HttpConfigError::InvalidBind(_))
        ));
    }

    #[tokio::test]
    async fn build_auto_initializes_from_bundled_schema() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = settings("127.0.0.1");
        s.db_path = dir.path().join("marine.sqlite");
        s.auto_init = true;
        let out = build(&s).await.unwrap();
        assert!(out.state.kernel().is_initialized().unwrap());
        assert!(out
            .state
            .endpoints()
            .iter()
            .any(|e| e == "POST /api/observations"));
    }
}
