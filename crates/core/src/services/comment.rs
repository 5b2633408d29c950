//! Comment service.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use serde_json::{Value, json};
use socialdist_common::{AppError, AppResult, IdGenerator, canonicalize};
use socialdist_db::{
    entities::{author, comment, inbox_item, inbox_item::InboxKind, post::ContentType},
    repositories::{
        AuthorRepository, CommentRepository, FollowerRepository, FollowingRepository,
        InboxRepository, PostRepository,
    },
};
use socialdist_federation::RemoteResolver;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    representation::{CommentRepresentation, Representer},
    services::post::is_visible_to,
};

/// Input for commenting on a post.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    #[validate(length(min = 1, max = 10000))]
    pub comment: String,

    #[serde(default = "default_content_type")]
    pub content_type: ContentType,
}

const fn default_content_type() -> ContentType {
    ContentType::Plain
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    author_repo: AuthorRepository,
    follower_repo: FollowerRepository,
    following_repo: FollowingRepository,
    inbox_repo: InboxRepository,
    resolver: RemoteResolver,
    representer: Representer,
    id_gen: IdGenerator,
}

impl CommentService {
    #[must_use]
    pub fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        author_repo: AuthorRepository,
        follower_repo: FollowerRepository,
        following_repo: FollowingRepository,
        inbox_repo: InboxRepository,
        resolver: RemoteResolver,
        representer: Representer,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            author_repo,
            follower_repo,
            following_repo,
            inbox_repo,
            resolver,
            representer,
            id_gen: IdGenerator::new(),
        }
    }

    /// A page of comments on a local post, newest first.
    ///
    /// Comment authors that cannot be resolved are shown by id only.
    pub async fn list(
        &self,
        post_author: Uuid,
        post_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<CommentRepresentation>> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if post.author_id != post_author {
            return Err(AppError::PostNotFound(post_id.to_string()));
        }

        let comments = self
            .comment_repo
            .find_by_post(post.id, limit, offset)
            .await?;
        let mut items = Vec::with_capacity(comments.len());
        for comment in &comments {
            let author = self.author_value(comment.author_uuid).await?;
            items.push(self.representer.comment(post_author, comment, author));
        }
        Ok(items)
    }

    pub async fn count(&self, post_id: Uuid) -> AppResult<u64> {
        self.comment_repo.count_by_post(post_id).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<comment::Model> {
        self.comment_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("comment {id}")))
    }

    /// Comment as `author` on `post_id`, written by `post_author`.
    ///
    /// A local post gets the comment row and an inbox item for its author,
    /// provided the commenter may see it.
    /// A post elsewhere gets the comment delivered to its author's inbox.
    pub async fn create(
        &self,
        author: &author::Model,
        post_author: Uuid,
        post_id: Uuid,
        input: CreateCommentInput,
    ) -> AppResult<Value> {
        input.validate()?;

        if let Some(post) = self.post_repo.find_by_id(post_id).await? {
            if post.author_id != post_author
                || !is_visible_to(&post, Some(author.id), &self.follower_repo, &self.following_repo).await?
            {
                return Err(AppError::PostNotFound(post_id.to_string()));
            }

            let comment = self
                .comment_repo
                .create(comment::ActiveModel {
                    id: Set(self.id_gen.generate_content_id()),
                    post_id: Set(post.id),
                    author_uuid: Set(author.id),
                    content_type: Set(input.content_type),
                    comment: Set(input.comment),
                    published: Set(Utc::now().into()),
                })
                .await?;

            let representation = serde_json::to_value(self.representer.comment(
                post_author,
                &comment,
                self.representer.author_value(author),
            ))
            .map_err(|e| AppError::Internal(e.to_string()))?;

            if post.author_id != author.id {
                self.inbox_repo
                    .create(inbox_item::ActiveModel {
                        id: Set(self.id_gen.generate()),
                        author_id: Set(post.author_id),
                        kind: Set(InboxKind::Comment),
                        payload: Set(representation.clone()),
                        received_at: Set(Utc::now().into()),
                    })
                    .await?;
            }
            info!(author = %author.id, post = %post.id, comment = %comment.id, "Created comment");
            return Ok(representation);
        }

        let remote_author = self
            .resolver
            .resolve_author(post_author)
            .await?
            .ok_or_else(|| AppError::AuthorNotFound(post_author.to_string()))?;
        let author_url = remote_author
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Federation("remote author has no id".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let payload = json!({
            "type": "comment",
            "id": format!(
                "{author_url}/posts/{}/comments/{}",
                canonicalize(&post_id.to_string()),
                canonicalize(&self.id_gen.generate_content_id().to_string())
            ),
            "author": self.representer.author_value(author),
            "comment": input.comment,
            "contentType": input.content_type,
            "published": Utc::now().to_rfc3339(),
        });

        self.resolver
            .deliver_to_inbox(post_author, &payload)
            .await?
            .ok_or_else(|| AppError::AuthorNotFound(post_author.to_string()))?;
        info!(author = %author.id, post = %post_id, "Delivered remote comment");
        Ok(payload)
    }

    async fn author_value(&self, uuid: Uuid) -> AppResult<Value> {
        if let Some(local) = self.author_repo.find_by_id(uuid).await? {
            return Ok(self.representer.author_value(&local));
        }
        match self.resolver.resolve_author(uuid).await {
            Ok(Some(remote)) => Ok(remote),
            Ok(None) => Ok(json!({ "type": "author", "id": canonicalize(&uuid.to_string()) })),
            Err(err) => {
                warn!(author = %uuid, error = %err, "Comment author unavailable");
                Ok(json!({ "type": "author", "id": canonicalize(&uuid.to_string()) }))
            }
        }
    }
}
