//! HTTP surface: router assembly, middleware stack, and the server loop.

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware,
    routing::get,
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{debug_span, info, Span};
use ulid::Ulid;
use url::Url;

pub mod csrf;
pub mod email;
pub mod handlers;
mod openapi;

pub use handlers::auth::{AuthConfig, AuthState};
pub use openapi::openapi;

use csrf::CsrfStore;
use handlers::{auth, health};

/// Assemble the full application router around a shared auth state.
///
/// The CSRF guard sits inside the middleware stack so the token store and
/// auth state extensions are already attached when it runs.
///
/// # Errors
///
/// Returns an error if the configured frontend URL cannot be turned into a
/// CORS origin.
pub fn app(state: Arc<AuthState>) -> Result<Router> {
    let cors = cors_layer(state.config().frontend_base_url())?;
    let csrf_store = Arc::new(CsrfStore::new());

    let router = Router::new()
        .route("/health", get(health::health))
        .route("/api/csrf-token", get(csrf::csrf_token))
        .merge(auth::routes())
        .layer(middleware::from_fn(csrf::csrf_guard))
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
                .layer(Extension(state))
                .layer(Extension(csrf_store)),
        );

    Ok(router)
}

/// Serve until interrupted.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(port: u16, state: Arc<AuthState>) -> Result<()> {
    let app = app(state)?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

/// Only the configured frontend may call the API from a browser. The URL is
/// reduced to its origin so paths in the config do not break matching.
fn cors_layer(frontend_base_url: &str) -> Result<CorsLayer> {
    let url = Url::parse(frontend_base_url)
        .with_context(|| format!("invalid frontend URL: {frontend_base_url}"))?;

    let mut origin = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        origin.push_str(&format!(":{port}"));
    }

    let origin = HeaderValue::from_str(&origin)
        .with_context(|| format!("frontend origin is not a valid header value: {origin}"))?;

    Ok(CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(csrf::CSRF_HEADER_NAME),
        ])
        .allow_origin(origin))
}

// span
fn make_span(request: &Request<Body>) -> Span {
    let headers = request.headers();
    let path = request.uri().path();
    let request_id = headers
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    debug_span!("http-request", path, ?headers, request_id)
}
