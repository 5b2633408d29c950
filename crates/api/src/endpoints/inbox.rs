//! Inbox endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde_json::Value;
use socialdist_common::AppResult;

use super::RouteWithSlash;
use crate::{
    extractors::{Auth, Pagination, uuid_segment},
    middleware::AppState,
    response::{Collection, Created},
};

/// Push an item into an author's inbox. Peers and local authors may.
async fn receive(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path(author): Path<String>,
    Json(payload): Json<Value>,
) -> AppResult<Created<Value>> {
    let stored = state
        .inbox_service
        .receive(&principal, uuid_segment(&author)?, payload)
        .await?;
    Ok(Created(stored))
}

/// Read an inbox. Owner only.
async fn list(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path(author): Path<String>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Collection<Value>> {
    let items = state
        .inbox_service
        .list(
            &principal,
            uuid_segment(&author)?,
            pagination.limit(),
            pagination.offset(),
        )
        .await?;
    Ok(Collection::new("inbox", pagination, items))
}

pub fn router() -> Router<AppState> {
    Router::new().route_with_slash("/author/{author}/inbox", get(list).post(receive))
}
