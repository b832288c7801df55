use crate::{
    api::handlers::auth::{self, SessionAuthenticator, SqliteUserDirectory, UserDirectory},
    cli::telemetry,
};
use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Method, Request},
    middleware,
    routing::{get, options, post},
};
use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    services::{ServeDir, ServeFile},
    set_header::SetRequestHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use utoipa_axum::router::OpenApiRouter;

pub mod handlers;
pub mod schema;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use openapi::openapi;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

#[derive(Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub dsn: String,
    pub web_dir: PathBuf,
    pub request_timeout: Duration,
    pub bootstrap_admin: Option<(String, SecretString)>,
}

/// Assemble the full application: documented API routes, the admin page,
/// login/logout aliases, `OPTIONS /health` and static files as the fallback.
pub fn app(
    pool: SqlitePool,
    authenticator: Arc<SessionAuthenticator>,
    web_dir: &Path,
    request_timeout: Duration,
) -> Router {
    let cors = CorsLayer::new()
        .allow_headers(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_origin(Any);

    // `/admin.html` is matched here so the static fallback never serves it ungated.
    let admin_html = web_dir.join("admin.html");
    let admin_page = Router::new()
        .route_service("/admin", ServeFile::new(&admin_html))
        .route_service("/admin.html", ServeFile::new(&admin_html))
        .route_layer(middleware::from_fn(auth::require_admin));

    let (router, _openapi) = router().split_for_parts();
    router
        .merge(admin_page)
        .route("/admin/login", post(auth::session::login))
        .route("/admin/logout", get(auth::session::logout))
        .route("/health", options(handlers::health::health))
        .fallback_service(ServeDir::new(web_dir))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(TimeoutLayer::new(request_timeout))
                .layer(Extension(authenticator))
                .layer(Extension(pool)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(config: ServerConfig, auth_config: auth::AuthConfig) -> Result<()> {
    let pool = schema::connect(&config.dsn).await?;

    if let Some((username, password)) = &config.bootstrap_admin {
        auth::ensure_admin(&pool, username, password.expose_secret())
            .await
            .context("Failed to create bootstrap admin user")?;
    }

    let directory: Arc<dyn UserDirectory> = Arc::new(SqliteUserDirectory::new(pool.clone()));
    let authenticator = Arc::new(SessionAuthenticator::new(auth_config, directory));

    let app = app(
        pool.clone(),
        authenticator,
        &config.web_dir,
        config.request_timeout,
    );

    let listener = TcpListener::bind(format!("::0:{}", config.port)).await?;

    info!("Listening on [::]:{}", config.port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    telemetry::shutdown_tracer();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
