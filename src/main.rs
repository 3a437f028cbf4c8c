//! homehub server entry point.
//!
//! Starts the envelope listener and, when configured, the admin HTTP API.

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use homehub::api;
use homehub::app_state::AppState;
use homehub::config::HubConfig;
use homehub::server::HubServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = HubConfig::from_env().context("loading configuration")?;
    tracing::info!(
        listen = %config.listen_addr,
        admin = ?config.admin_addr,
        capacity = config.max_connections,
        "starting homehub"
    );

    let state = AppState::new(config);
    if state.hub.credential_is_default().await {
        tracing::warn!("admin credential is the built-in default; set HUB_ADMIN_PASSWORD");
    }

    let shutdown = CancellationToken::new();

    let server = HubServer::bind(state.config.listen_addr, state.clone())
        .await
        .with_context(|| format!("binding {}", state.config.listen_addr))?;
    tracing::info!(addr = %server.local_addr()?, "envelope listener ready");

    let admin = match state.config.admin_addr {
        Some(addr) => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("binding admin api {addr}"))?;
            tracing::info!(%addr, "admin api listening");
            Some(tokio::spawn(api::serve(
                listener,
                state.clone(),
                shutdown.clone(),
            )))
        }
        None => None,
    };

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("stopping");
        signal_token.cancel();
    });

    server.run(shutdown).await;

    if let Some(admin) = admin {
        match admin.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::error!(error = %err, "admin api failed"),
            Err(err) => tracing::error!(error = %err, "admin api task panicked"),
        }
    }

    tracing::info!("server stopped");
    Ok(())
}

/// Initializes the global subscriber. `RUST_LOG` picks the filter (default
/// `info`); `HUB_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("HUB_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "ctrl-c handler failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "SIGTERM handler failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
