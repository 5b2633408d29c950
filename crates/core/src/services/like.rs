//! Like service.

use chrono::Utc;
use sea_orm::Set;
use serde_json::{Value, json};
use socialdist_common::{AppError, AppResult, IdGenerator, canonicalize};
use socialdist_db::{
    entities::{
        author, inbox_item,
        inbox_item::InboxKind,
        like::{self, LikeTarget},
    },
    repositories::{
        AuthorRepository, CommentRepository, FollowerRepository, FollowingRepository,
        InboxRepository, LikeRepository, PostRepository,
    },
};
use socialdist_federation::RemoteResolver;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    representation::{LikeRepresentation, Representer},
    services::{
        author::{AuthorRef, resolve_local_author},
        post::is_visible_to,
    },
};

/// Like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    like_repo: LikeRepository,
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    author_repo: AuthorRepository,
    follower_repo: FollowerRepository,
    following_repo: FollowingRepository,
    inbox_repo: InboxRepository,
    resolver: RemoteResolver,
    representer: Representer,
    id_gen: IdGenerator,
}

impl LikeService {
    #[must_use]
    pub fn new(
        like_repo: LikeRepository,
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        author_repo: AuthorRepository,
        follower_repo: FollowerRepository,
        following_repo: FollowingRepository,
        inbox_repo: InboxRepository,
        resolver: RemoteResolver,
        representer: Representer,
    ) -> Self {
        Self {
            like_repo,
            post_repo,
            comment_repo,
            author_repo,
            follower_repo,
            following_repo,
            inbox_repo,
            resolver,
            representer,
            id_gen: IdGenerator::new(),
        }
    }

    /// `author` likes a local post or comment. Liking twice is a no-op;
    /// returns whether a new like was recorded.
    pub async fn like(&self, author: &author::Model, target: LikeTarget) -> AppResult<bool> {
        let (owner, object) = self.locate(target).await?;

        let created = self
            .like_repo
            .insert_if_absent(like::ActiveModel {
                id: Set(self.id_gen.generate()),
                author_uuid: Set(author.id),
                target_kind: Set(target.kind()),
                target_uuid: Set(target.uuid()),
                created_at: Set(Utc::now().into()),
            })
            .await?;

        // Comment authors may be remote; only local owners have an inbox here.
        if created && owner != author.id && self.author_repo.find_by_id(owner).await?.is_some() {
            let payload = serde_json::to_value(
                self.representer
                    .like(self.representer.author_value(author), object),
            )
            .map_err(|e| AppError::Internal(e.to_string()))?;
            self.inbox_repo
                .create(inbox_item::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    author_id: Set(owner),
                    kind: Set(InboxKind::Like),
                    payload: Set(payload),
                    received_at: Set(Utc::now().into()),
                })
                .await?;
        }

        info!(author = %author.id, ?target, created, "Liked");
        Ok(created)
    }

    /// `author` likes a post hosted by `post_author`, local or remote.
    /// A local post the liker may not see is reported as missing.
    pub async fn like_post(
        &self,
        author: &author::Model,
        post_author: Uuid,
        post_id: Uuid,
    ) -> AppResult<Value> {
        if let Some(post) = self.post_repo.find_by_id(post_id).await? {
            if post.author_id != post_author
                || !is_visible_to(&post, Some(author.id), &self.follower_repo, &self.following_repo).await?
            {
                return Err(AppError::PostNotFound(post_id.to_string()));
            }
            self.like(author, LikeTarget::Post(post_id)).await?;
            let object = self.representer.post_url(post_author, post_id);
            return serde_json::to_value(
                self.representer
                    .like(self.representer.author_value(author), object),
            )
            .map_err(|e| AppError::Internal(e.to_string()));
        }

        let remote_author = self
            .resolver
            .resolve_author(post_author)
            .await?
            .ok_or_else(|| AppError::AuthorNotFound(post_author.to_string()))?;
        let object = format!(
            "{}/posts/{}",
            remote_author
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| AppError::Federation("remote author has no id".to_string()))?
                .trim_end_matches('/'),
            canonicalize(&post_id.to_string())
        );
        let payload = serde_json::to_value(
            self.representer
                .like(self.representer.author_value(author), object),
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;

        self.resolver
            .deliver_to_inbox(post_author, &payload)
            .await?
            .ok_or_else(|| AppError::AuthorNotFound(post_author.to_string()))?;
        info!(author = %author.id, post = %post_id, "Delivered remote like");
        Ok(payload)
    }

    /// A page of likes on a local post or comment, oldest first.
    pub async fn list(&self, target: LikeTarget, limit: u64, offset: u64) -> AppResult<Vec<LikeRepresentation>> {
        let (_, object) = self.locate(target).await?;
        let likes = self.like_repo.find_by_target(target, limit, offset).await?;

        let mut items = Vec::with_capacity(likes.len());
        for like in &likes {
            let author = self.liker(like).await?;
            items.push(self.representer.stored_like(like, author, object.clone()));
        }
        Ok(items)
    }

    pub async fn count(&self, target: LikeTarget) -> AppResult<u64> {
        self.like_repo.count_by_target(target).await
    }

    /// Owner and URL of a local like target.
    async fn locate(&self, target: LikeTarget) -> AppResult<(Uuid, String)> {
        match target {
            LikeTarget::Post(id) => {
                let post = self
                    .post_repo
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("post {id}")))?;
                Ok((post.author_id, self.representer.post_url(post.author_id, post.id)))
            }
            LikeTarget::Comment(id) => {
                let comment = self
                    .comment_repo
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("comment {id}")))?;
                let post = self.post_repo.get_by_id(comment.post_id).await?;
                Ok((
                    comment.author_uuid,
                    self.representer
                        .comment_url(post.author_id, post.id, comment.id),
                ))
            }
        }
    }

    async fn liker(&self, like: &like::Model) -> AppResult<Value> {
        match resolve_local_author(&self.author_repo, AuthorRef::Like(like)).await {
            Ok(local) => Ok(self.representer.author_value(&local)),
            Err(AppError::AuthorNotFound(_)) => match self.resolver.resolve_author(like.author_uuid).await {
                Ok(Some(remote)) => Ok(remote),
                Ok(None) => Ok(json!({ "type": "author", "id": canonicalize(&like.author_uuid.to_string()) })),
                Err(err) => {
                    warn!(author = %like.author_uuid, error = %err, "Liker unavailable");
                    Ok(json!({ "type": "author", "id": canonicalize(&like.author_uuid.to_string()) }))
                }
            },
            Err(err) => Err(err),
        }
    }
}
