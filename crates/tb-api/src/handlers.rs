//! # tb-api Handlers
//!
//! Thin adapters between HTTP and the feed service.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tb_core::{FeedService, PageRequest, PaginatedPage, PostWithRelations};
use tb_ui::ExpansionState;
use tracing::debug;

use crate::error::ApiError;

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<FeedService>,
}

impl AppState {
    pub fn new(feed: FeedService) -> Self {
        Self {
            feed: Arc::new(feed),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub page: Option<i64>,
}

/// JSON envelope of the feed.
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub posts: PaginatedPage<PostWithRelations>,
}

/// `GET /?page=N`. HTML unless the client asks for JSON.
pub async fn posts_index(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<FeedQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let request = PageRequest::new(query.page.unwrap_or(1))?;
    let page = state.feed.page(request).await?;

    if wants_json(&headers) {
        debug!(page = page.meta.current_page, "serving feed as json");
        return Ok(Json(FeedResponse { posts: page }).into_response());
    }

    let html = tb_ui::render_feed(&page, &ExpansionState::default())?;
    Ok(Html(html).into_response())
}

pub async fn home(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    Ok(Html(tb_ui::render_home(&state.feed.options().path)?))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}
