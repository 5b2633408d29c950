//! Author endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use socialdist_common::AppResult;
use socialdist_core::{RegisterInput, representation::AuthorRepresentation};
use tracing::info;

use super::RouteWithSlash;
use crate::{
    extractors::{Pagination, uuid_segment},
    middleware::AppState,
    response::{Collection, Created},
};

/// List local authors.
async fn list(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Collection<AuthorRepresentation>> {
    let authors = state
        .author_service
        .list(pagination.limit(), pagination.offset())
        .await?;
    let items = authors
        .iter()
        .map(|author| state.author_service.represent(author))
        .collect();
    Ok(Collection::new("authors", pagination, items))
}

/// Show a local author.
async fn show(
    State(state): State<AppState>,
    Path(author): Path<String>,
) -> AppResult<Json<AuthorRepresentation>> {
    let author = state.author_service.get(uuid_segment(&author)?).await?;
    Ok(Json(state.author_service.represent(&author)))
}

/// Register a local account.
async fn signup(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<Created<AuthorRepresentation>> {
    let author = state.author_service.register(input).await?;
    info!(author = %author.id, "Signed up");
    Ok(Created(state.author_service.represent(&author)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route_with_slash("/authors", get(list))
        .route_with_slash("/author/{author}", get(show))
        .route_with_slash("/signup", post(signup))
}
