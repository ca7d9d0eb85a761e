use std::sync::Arc;

use catalog::catalog::Catalog;
use catalog::config::{Cli, Config};
use catalog::db::{self, DocumentStore};
use catalog::handler::AppState;
use catalog::routes::app;
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    // .env is optional; values already in the environment win
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("catalog.svc starting");

    let cfg = Config::load(&args).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to load config");
        std::process::exit(1);
    });

    let store = db::connect(&cfg).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup document store");
        std::process::exit(1);
    });
    let catalog = Arc::new(Catalog::new(store.clone(), cfg.collections.clone()));

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let cancellation_token = CancellationToken::new();

    let signal_token = cancellation_token.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown signal received, preparing to shutdown");
        signal_token.cancel();
    });

    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!("catalog.svc running on {}", &address);
    let server = axum::serve(listener, app(AppState { catalog }))
        .with_graceful_shutdown(cancellation_token.clone().cancelled_owned());

    if let Err(err) = server.await {
        tracing::error!(error = %err, "server exited with error");
    }

    if let Err(err) = store.shutdown().await {
        tracing::warn!(error = %err, "failed to close document store");
    }
    tracing::info!("catalog.svc going off, graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl+c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
