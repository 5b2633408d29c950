//! Following, friends and friend request endpoints. Owner only.

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, put},
};
use serde_json::Value;
use socialdist_common::AppResult;

use super::RouteWithSlash;
use crate::{
    extractors::{Auth, uuid_segment},
    middleware::AppState,
    response::{Collection, ok},
};

/// Follow `foreign`, local or remote.
async fn follow(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path((author, foreign)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let author = principal.require_author(uuid_segment(&author)?)?;
    state
        .friendship_service
        .follow(author, uuid_segment(&foreign)?)
        .await?;
    Ok(ok())
}

/// Stop following `foreign`.
async fn unfollow(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path((author, foreign)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let author = principal.require_author(uuid_segment(&author)?)?;
    state
        .friendship_service
        .unfollow(author, uuid_segment(&foreign)?)
        .await?;
    Ok(ok())
}

/// Confirmed friends.
async fn friends(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path(author): Path<String>,
) -> AppResult<Collection<Value>> {
    let author = principal.require_author(uuid_segment(&author)?)?;
    let items = state.friendship_service.get_author_friends(author).await?;
    Ok(Collection::all("friends", items))
}

/// Follow requests from authors who are not friends yet.
async fn friend_requests(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path(author): Path<String>,
) -> AppResult<Collection<Value>> {
    let author = principal.require_author(uuid_segment(&author)?)?;
    let items = state
        .friendship_service
        .pending_friend_requests(author)
        .await?;
    Ok(Collection::all("friendrequests", items))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route_with_slash(
            "/author/{author}/following/{foreign}",
            put(follow).delete(unfollow),
        )
        .route_with_slash("/author/{author}/friends", get(friends))
        .route_with_slash("/author/{author}/friendrequests", get(friend_requests))
}
