//! # tb-api
//!
//! The web routing layer for Threadboard.

pub mod error;
pub mod handlers;
pub mod middleware;

use axum::{routing::get, Router};

pub use error::ApiError;
pub use handlers::AppState;

/// Builds the full application router. The feed is mounted at the path the
/// feed service generates its page links for.
pub fn router(state: AppState) -> Router {
    let feed_path = state.feed.options().path.clone();
    let routes = Router::new()
        .route(&feed_path, get(handlers::posts_index))
        .route("/home", get(handlers::home))
        .route("/health", get(handlers::health))
        .with_state(state);

    middleware::standard_layers(routes)
}
