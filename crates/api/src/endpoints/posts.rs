//! Post, comment, like and stream endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use serde_json::Value;
use socialdist_common::{AppError, AppResult};
use socialdist_core::{
    CreateCommentInput, CreatePostInput,
    representation::{CommentRepresentation, LikeRepresentation, PostRepresentation},
};
use socialdist_db::entities::{like::LikeTarget, post};
use uuid::Uuid;

use super::RouteWithSlash;
use crate::{
    extractors::{Auth, MaybeAuth, Pagination, uuid_segment},
    middleware::AppState,
    response::{Collection, Comments, Created, ok},
};

/// A post by `author` that the caller may see.
async fn visible_post(
    state: &AppState,
    viewer: &MaybeAuth,
    author: Uuid,
    post: Uuid,
) -> AppResult<post::Model> {
    let post = state
        .post_service
        .get_for_viewer(post, viewer.viewer())
        .await?;
    if post.author_id != author {
        return Err(AppError::PostNotFound(post.id.to_string()));
    }
    Ok(post)
}

/// An author's PUBLIC posts, newest first.
async fn list(
    State(state): State<AppState>,
    Path(author): Path<String>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Collection<PostRepresentation>> {
    let author = state.author_service.get(uuid_segment(&author)?).await?;
    let posts = state
        .post_service
        .list_public(author.id, pagination.limit(), pagination.offset())
        .await?;
    let items = state.post_service.represent_all(&posts).await?;
    Ok(Collection::new("posts", pagination, items))
}

/// Publish a post as the owning author.
async fn create(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path(author): Path<String>,
    Json(input): Json<CreatePostInput>,
) -> AppResult<Created<PostRepresentation>> {
    let author = principal.require_author(uuid_segment(&author)?)?;
    let post = state.post_service.create(author, input).await?;
    Ok(Created(state.post_service.represent(&post).await?))
}

async fn show(
    viewer: MaybeAuth,
    State(state): State<AppState>,
    Path((author, post)): Path<(String, String)>,
) -> AppResult<Json<PostRepresentation>> {
    let post = visible_post(&state, &viewer, uuid_segment(&author)?, uuid_segment(&post)?).await?;
    Ok(Json(state.post_service.represent(&post).await?))
}

async fn delete(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path((author, post)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let author = principal.require_author(uuid_segment(&author)?)?;
    state
        .post_service
        .delete(author, uuid_segment(&post)?)
        .await?;
    Ok(ok())
}

async fn list_comments(
    viewer: MaybeAuth,
    State(state): State<AppState>,
    Path((author, post)): Path<(String, String)>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Comments<CommentRepresentation>> {
    let author = uuid_segment(&author)?;
    let post = visible_post(&state, &viewer, author, uuid_segment(&post)?).await?;
    let comments = state
        .comment_service
        .list(author, post.id, pagination.limit(), pagination.offset())
        .await?;

    let representer = state.post_service.representer();
    let post_url = representer.post_url(author, post.id);
    Ok(Comments {
        kind: "comments",
        page: pagination.page(),
        size: pagination.size(),
        id: format!("{post_url}/comments"),
        post: post_url,
        comments,
    })
}

/// Comment on a post, local or remote.
async fn create_comment(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path((author, post)): Path<(String, String)>,
    Json(input): Json<CreateCommentInput>,
) -> AppResult<Created<Value>> {
    let commenter = principal.require_any_author()?;
    let comment = state
        .comment_service
        .create(commenter, uuid_segment(&author)?, uuid_segment(&post)?, input)
        .await?;
    Ok(Created(comment))
}

async fn list_post_likes(
    viewer: MaybeAuth,
    State(state): State<AppState>,
    Path((author, post)): Path<(String, String)>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Collection<LikeRepresentation>> {
    let post = visible_post(&state, &viewer, uuid_segment(&author)?, uuid_segment(&post)?).await?;
    let items = state
        .like_service
        .list(LikeTarget::Post(post.id), pagination.limit(), pagination.offset())
        .await?;
    Ok(Collection::new("likes", pagination, items))
}

/// Like a post, local or remote.
async fn like_post(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path((author, post)): Path<(String, String)>,
) -> AppResult<Created<Value>> {
    let liker = principal.require_any_author()?;
    let like = state
        .like_service
        .like_post(liker, uuid_segment(&author)?, uuid_segment(&post)?)
        .await?;
    Ok(Created(like))
}

async fn list_comment_likes(
    viewer: MaybeAuth,
    State(state): State<AppState>,
    Path((author, post, comment)): Path<(String, String, String)>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Collection<LikeRepresentation>> {
    let post = visible_post(&state, &viewer, uuid_segment(&author)?, uuid_segment(&post)?).await?;
    let comment = state.comment_service.get(uuid_segment(&comment)?).await?;
    if comment.post_id != post.id {
        return Err(AppError::NotFound(format!("comment {}", comment.id)));
    }
    let items = state
        .like_service
        .list(
            LikeTarget::Comment(comment.id),
            pagination.limit(),
            pagination.offset(),
        )
        .await?;
    Ok(Collection::new("likes", pagination, items))
}

/// Posts the caller may see, newest first.
async fn stream(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Collection<PostRepresentation>> {
    let viewer = principal.require_any_author()?;
    let posts = state
        .post_service
        .visible_posts(viewer.id, pagination.limit(), pagination.offset())
        .await?;
    let items = state.post_service.represent_all(&posts).await?;
    Ok(Collection::new("stream", pagination, items))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route_with_slash("/author/{author}/posts", get(list).post(create))
        .route_with_slash("/author/{author}/posts/{post}", get(show).delete(delete))
        .route_with_slash(
            "/author/{author}/posts/{post}/comments",
            get(list_comments).post(create_comment),
        )
        .route_with_slash(
            "/author/{author}/posts/{post}/likes",
            get(list_post_likes).post(like_post),
        )
        .route_with_slash(
            "/author/{author}/posts/{post}/comments/{comment}/likes",
            get(list_comment_likes),
        )
        .route_with_slash("/stream", get(stream))
}
