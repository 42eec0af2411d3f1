//! # SaaSBP Sign-up Server
//!
//! Serves the organization sign-up form. Each submission creates a tenant,
//! a tenant-scoped API key, an application with `admin` and `member` roles,
//! and registers the submitting user, then redirects the browser to
//! `https://<organization>.<base-domain>/signin`.
//!
//! ## Usage
//!
//! ```bash
//! IDENTITY_PROVIDER_URL=http://localhost:9011 \
//! IDENTITY_PROVIDER_API_KEY=... \
//! IDENTITY_PROVIDER_SOURCE_TENANT_ID=... \
//! cargo run -p saasbp-api
//! ```

use anyhow::Context;
use saasbp_api::{
    app::{build_router, AppState},
    config::Config,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "saasbp_api=debug,saasbp_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "SaaSBP sign-up server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let bind_address = config.bind_address();

    tracing::info!(
        provider = %config.identity.url,
        base_domain = %config.signup.base_domain,
        rollback_on_failure = config.signup.rollback_on_failure,
        "Configuration loaded"
    );

    let state = AppState::from_config(config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
