//! Sitedesk - content backend and server-rendered site, library for app
//! logic and testing

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod maintenance;
pub mod pages;
pub mod routes;
pub mod schema;
pub mod seed;
pub mod slug;
pub mod state;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware, Router,
};
use std::{net::SocketAddr, sync::Arc};
use thiserror::Error;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, trace::TraceLayer,
};

use crate::config::{AppConfig, ConfigError};
use crate::routes::resources;
use crate::schema::{
    BlogPost, CaseStudy, ContentBlock, FooterSettings, HeroSection, IndustryCard, TeamCategory,
    Testimonial, TrustedCompany, WhyChooseUs,
};
use crate::state::AppState;
use crate::upload::LocalUploads;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database unavailable: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid bind address: {0}")]
    Address(#[from] std::net::AddrParseError),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// CORS for the configured frontend origins. Credentials are allowed so the
/// session cookie travels with cross-origin admin calls.
pub fn configure_cors(config: &AppConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(config.allowed_origins.clone())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();
    let cors = configure_cors(&config);
    tracing::info!("CORS configured");

    Router::new()
        .merge(routes::health::router())
        .merge(routes::auth::router())
        .merge(resources::router::<BlogPost>())
        .merge(resources::router::<CaseStudy>())
        .merge(resources::router::<IndustryCard>())
        .merge(resources::router::<TeamCategory>())
        .merge(resources::router::<Testimonial>())
        .merge(resources::router::<TrustedCompany>())
        .merge(resources::router::<HeroSection>())
        .merge(resources::router::<ContentBlock>())
        .merge(routes::contact::router())
        .merge(routes::singletons::router::<FooterSettings>("/api/footer"))
        .merge(routes::singletons::router::<WhyChooseUs>("/api/why-choose-us"))
        .merge(routes::upload::router())
        .merge(routes::feeds::router())
        .merge(pages::router())
        .nest_service(
            &config.uploads.public_prefix,
            ServeDir::new(&config.uploads.dir),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_admin,
        ))
        .with_state(state)
        // Raise axum's per-extractor cap to match the global body limit
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(config.body_limit))
        .layer(cors)
}

/// Run the server (used by main).
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    // Guards MUST be held for the programme's lifetime; dropping them early
    // shuts down background log-writer threads and loses buffered log lines.
    let _log_guards = logging::init(&logging::LogConfig::from_env());

    let result = serve().await;
    if let Err(e) = &result {
        tracing::error!("Startup failed: {}", e);
    }
    result
}

async fn serve() -> Result<(), StartupError> {
    let config = AppConfig::from_env()?;
    let db_config = config
        .database
        .clone()
        .ok_or(ConfigError::Missing("DATABASE_URL"))?;

    let pool = db::init_pool(&db_config).await?;
    db::run_migrations(&pool).await?;

    let uploads = LocalUploads::new(
        &config.uploads.dir,
        &config.uploads.public_prefix,
        config.uploads.max_bytes,
    );
    tokio::fs::create_dir_all(uploads.dir()).await?;

    // Bind address is configurable via HOST / PORT env vars
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let state = AppState::new(config, Arc::new(db::PgStore::new(pool)), Arc::new(uploads));
    let app = create_app(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
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
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_create_app_serves_health() {
        let (state, _dir) = test_state();
        let res = create_app(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_uploaded_files_are_served() {
        let (state, dir) = test_state();
        std::fs::write(dir.path().join("1-logo.svg"), "<svg></svg>").unwrap();
        let res = create_app(state)
            .oneshot(Request::get("/uploads/1-logo.svg").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_mutation_without_cookie_is_rejected() {
        let (state, _dir) = test_state();
        let res = create_app(state)
            .oneshot(
                Request::post("/api/testimonials")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"a","quote":"b"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
