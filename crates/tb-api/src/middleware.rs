//! Layers shared by every route: request tracing, CORS and response
//! compression.

use std::time::Duration;

use axum::{http::Method, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub fn standard_layers(router: Router) -> Router {
    router
        .layer(CompressionLayer::new())
        .layer(cors_policy())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// The feed is read-only, so only safe methods are allowed cross-origin.
pub fn cors_policy() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD])
        .max_age(Duration::from_secs(3600))
}
