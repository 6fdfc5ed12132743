//! # Coffee Shop API Server
//!
//! ```bash
//! # Run with config/coffee-shop.toml
//! cargo run --bin coffee-shop-api
//!
//! # Point at another settings file and reset the table on start
//! COFFEE_SHOP_CONFIG_PATH=/etc/coffee-shop.toml \
//!   COFFEE_SHOP__DATABASE__RESET_ON_START=true cargo run --bin coffee-shop-api
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use coffee_shop::auth::TokenVerifier;
use coffee_shop::config::Settings;
use coffee_shop::logging;
use coffee_shop::storage::PgDrinkStore;
use coffee_shop::web::{create_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load configuration")?;
    logging::init_tracing(&settings.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        build_mode = if cfg!(debug_assertions) { "debug" } else { "release" },
        "Starting coffee shop API"
    );

    let store = PgDrinkStore::connect(&settings.database)
        .await
        .context("Failed to connect to database")?;

    if settings.database.reset_on_start {
        store
            .drop_and_create_all()
            .await
            .context("Failed to reset drinks table")?;
    } else if settings.database.run_schema_setup {
        store
            .setup_schema()
            .await
            .context("Failed to create drinks schema")?;
    }

    let verifier = TokenVerifier::from_settings(&settings.auth)
        .await
        .context("Failed to initialize token verification")?;

    let bind_address = settings.server.bind_address.clone();
    let state = AppState::new(settings, Arc::new(store.clone()), Arc::new(verifier));
    let app = create_app(state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    info!(address = %bind_address, "Coffee shop API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    store.pool().close().await;
    info!("Coffee shop API shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
