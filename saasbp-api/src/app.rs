/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use saasbp_api::{app::AppState, config::Config};
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::from_config(config);
/// let app = saasbp_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    http::{header, HeaderValue, Method},
    response::Redirect,
    routing::get,
    Router,
};
use saasbp_shared::identity::{ClientFactory, HttpClientFactory};
use saasbp_shared::provisioning::ProvisioningWorkflow;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,

    /// Sign-up provisioning workflow
    pub workflow: ProvisioningWorkflow,
}

impl AppState {
    /// Creates new application state over any identity provider client factory
    pub fn new(config: Config, factory: Arc<dyn ClientFactory>) -> Self {
        let workflow = ProvisioningWorkflow::new(factory, config.provisioning_config());

        Self {
            config: Arc::new(config),
            workflow,
        }
    }

    /// Creates application state talking HTTP to the configured identity provider
    pub fn from_config(config: Config) -> Self {
        let factory = HttpClientFactory::new(config.provider_config());
        Self::new(config, Arc::new(factory))
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /                    # Redirects to /signup
/// ├── GET  /signup              # Sign-up form
/// ├── POST /signup              # Provision organization
/// ├── GET  /static/signup.js    # Form script
/// └── GET  /health              # Health check
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let signup_routes = Router::new()
        .route("/", get(|| async { Redirect::to("/signup") }))
        .route(
            "/signup",
            get(routes::signup::signup_form).post(routes::signup::submit_signup),
        )
        .route("/static/signup.js", get(routes::signup::signup_script));

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(signup_routes)
        .merge(health_routes)
        .fallback(|| async { ApiError::NotFound("Route not found".to_string()) })
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
