//! Follower endpoints.
//!
//! Only the owning author adds followers. A follower row may also be
//! removed by a registered peer acting for one of its authors.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use serde_json::Value;
use socialdist_common::{AppError, AppResult};
use socialdist_core::Principal;
use uuid::Uuid;

use super::RouteWithSlash;
use crate::{
    extractors::{Auth, Pagination, uuid_segment},
    middleware::AppState,
    response::{Collection, ok},
};

fn may_remove_followers(principal: &Principal, author: Uuid) -> AppResult<()> {
    match principal {
        Principal::Node(_) => Ok(()),
        Principal::Author(_) => principal.require_author(author).map(|_| ()),
    }
}

/// List an author's followers.
async fn list(
    State(state): State<AppState>,
    Path(author): Path<String>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Collection<Value>> {
    let author = state.author_service.get(uuid_segment(&author)?).await?;
    let items = state
        .friendship_service
        .followers(author.id, pagination.limit(), pagination.offset())
        .await?;
    Ok(Collection::new("followers", pagination, items))
}

/// Show `foreign` if it follows the author.
async fn show(
    State(state): State<AppState>,
    Path((author, foreign)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let author = state.author_service.get(uuid_segment(&author)?).await?;
    let follower = state
        .friendship_service
        .follower(author.id, uuid_segment(&foreign)?)
        .await?;
    Ok(Json(follower))
}

/// Record `foreign` as a follower.
async fn add(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path((author, foreign)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let author = state.author_service.get(uuid_segment(&author)?).await?;
    principal.require_author(author.id)?;

    state
        .friendship_service
        .add_follower(author.id, uuid_segment(&foreign)?)
        .await?;
    Ok(ok())
}

/// Remove `foreign` from the followers.
async fn remove(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path((author, foreign)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let author = state.author_service.get(uuid_segment(&author)?).await?;
    may_remove_followers(&principal, author.id)?;

    let foreign = uuid_segment(&foreign)?;
    if !state
        .friendship_service
        .remove_follower(author.id, foreign)
        .await?
    {
        return Err(AppError::NotFound(format!("{foreign} does not follow {}", author.id)));
    }
    Ok(ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route_with_slash("/author/{author}/followers", get(list))
        .route_with_slash(
            "/author/{author}/followers/{foreign}",
            get(show).put(add).delete(remove),
        )
}
