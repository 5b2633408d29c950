//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use sea_orm::DatabaseConnection;
use socialdist_common::AppError;
use socialdist_core::{
    AuthService, AuthorService, CommentService, FriendshipService, InboxService, LikeService,
    NodeService, PostService, Representer,
};
use socialdist_db::repositories::{
    AuthorRepository, CommentRepository, FollowerRepository, FollowingRepository,
    InboxRepository, LikeRepository, NodeRepository, PostRepository, UserRepository,
};
use socialdist_federation::{AdapterRegistry, RemoteResolver};
use tracing::debug;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub author_service: AuthorService,
    pub node_service: NodeService,
    pub friendship_service: FriendshipService,
    pub inbox_service: InboxService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub like_service: LikeService,
}

impl AppState {
    /// Wire every service against one database.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        registry: Arc<AdapterRegistry>,
        resolver: RemoteResolver,
        representer: Representer,
    ) -> Self {
        let author_repo = AuthorRepository::new(db.clone());
        let user_repo = UserRepository::new(db.clone());
        let node_repo = NodeRepository::new(db.clone());
        let follower_repo = FollowerRepository::new(db.clone());
        let following_repo = FollowingRepository::new(db.clone());
        let inbox_repo = InboxRepository::new(db.clone());
        let post_repo = PostRepository::new(db.clone());
        let comment_repo = CommentRepository::new(db.clone());
        let like_repo = LikeRepository::new(db);

        Self {
            auth_service: AuthService::new(
                node_repo.clone(),
                user_repo.clone(),
                author_repo.clone(),
            ),
            author_service: AuthorService::new(
                author_repo.clone(),
                user_repo,
                representer.clone(),
            ),
            node_service: NodeService::new(node_repo, registry.clone()),
            friendship_service: FriendshipService::new(
                author_repo.clone(),
                follower_repo.clone(),
                following_repo.clone(),
                inbox_repo.clone(),
                resolver.clone(),
                representer.clone(),
            ),
            inbox_service: InboxService::new(
                author_repo.clone(),
                inbox_repo.clone(),
                post_repo.clone(),
                comment_repo.clone(),
                like_repo.clone(),
                registry,
            ),
            post_service: PostService::new(
                post_repo.clone(),
                comment_repo.clone(),
                author_repo.clone(),
                follower_repo.clone(),
                following_repo.clone(),
                representer.clone(),
            ),
            comment_service: CommentService::new(
                comment_repo.clone(),
                post_repo.clone(),
                author_repo.clone(),
                follower_repo.clone(),
                following_repo.clone(),
                inbox_repo.clone(),
                resolver.clone(),
                representer.clone(),
            ),
            like_service: LikeService::new(
                like_repo,
                post_repo,
                comment_repo,
                author_repo,
                follower_repo,
                following_repo,
                inbox_repo,
                resolver,
                representer,
            ),
        }
    }
}

/// HTTP Basic authentication middleware.
///
/// Valid credentials attach a [`socialdist_core::Principal`] to the request.
/// Requests without credentials pass through; endpoints that need a caller
/// reject them. Credentials that are present but wrong are rejected here.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(header_value) = req.headers().get(header::AUTHORIZATION) else {
        return next.run(req).await;
    };

    let Some((username, password)) = header_value
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Basic "))
        .and_then(decode_basic)
    else {
        debug!("Malformed Authorization header");
        return AppError::Unauthorized.into_response();
    };

    match state
        .auth_service
        .authenticate_basic(&username, &password)
        .await
    {
        Ok(principal) => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}

/// `base64(username:password)` into its two halves.
fn decode_basic(encoded: &str) -> Option<(String, String)> {
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
