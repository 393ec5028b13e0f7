pub mod aggregate;
pub mod backend;
pub mod config;
pub mod error;
pub mod filter;
pub mod logger;
pub mod model;
pub mod routes;
pub mod session;

mod macros;

use snafu::ResultExt as _;
use tokio::net::TcpListener;
use tokio::signal;

use crate::config::Config;
use crate::error::{ApplicationError, BindAddressSnafu, WebServerSnafu};

/// Bind to the configured address and serve the routes until a shutdown signal arrives.
pub async fn serve(config: &Config) -> Result<(), ApplicationError> {
    let address = config.host;
    let app = routes::router(config.app());

    let listener = TcpListener::bind(address)
        .await
        .context(BindAddressSnafu { address })?;
    tracing::info!(%address, backend = %config.backend, "server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context(WebServerSnafu)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }

        tracing::info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                tracing::info!("received terminate signal, shutting down");
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for the terminate signal");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
