use std::net::SocketAddr;

use anyhow::Context;
use tracing::{error, info};

mod access_log;
mod api;
mod app_state;
mod bootstrap;
mod openapi;
mod responses;
mod router;
mod security;
#[cfg(test)]
mod test_support;

pub(crate) use app_state::AppState;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(2);
    }
}

async fn run() -> anyhow::Result<()> {
    let settings = marine_core::load_settings()?;
    marine_otel::init(
        &settings.log_filter,
        marine_otel::AccessLogFile::from_env(&settings.logs_dir),
    );
    let http_cfg = bootstrap::http_config(&settings)?;
    let bootstrap::BootstrapOutput { router, state } = bootstrap::build(&settings).await?;

    let app = bootstrap::attach_global_layers(bootstrap::attach_http_layers(
        router.with_state::<()>(state),
        http_cfg.concurrency_limit,
    ));

    let listener = tokio::net::TcpListener::bind(http_cfg.addr)
        .await
        .with_context(|| format!("binding {}", http_cfg.addr))?;
    info!(addr = %http_cfg.addr, db = %settings.db_path.display(), "marine-server listening");

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal());

    if let Err(err) = server.await {
        error!("http server exited with error: {err}");
    }
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                error!("failed to install SIGTERM handler: {err}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutdown signal received");
}
