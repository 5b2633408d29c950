//! Inbox pipeline.
//!
//! `received -> validated -> stored`, or `received -> rejected`. Items pushed
//! by a peer pass through that peer's adapter before validation. Stored
//! items are handed back exactly as they were accepted.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::Set;
use serde_json::Value;
use socialdist_common::{
    AppError, AppResult, IdGenerator, extract_author_uuid, extract_post_uuid, parse_uuid,
};
use socialdist_db::{
    entities::{comment, inbox_item, inbox_item::InboxKind, like, like::LikeTarget, post::ContentType},
    repositories::{AuthorRepository, CommentRepository, InboxRepository, LikeRepository, PostRepository},
};
use socialdist_federation::{AdapterRegistry, validate_inbox_item};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::auth::Principal;

/// Inbox service for business logic.
#[derive(Clone)]
pub struct InboxService {
    author_repo: AuthorRepository,
    inbox_repo: InboxRepository,
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    like_repo: LikeRepository,
    registry: Arc<AdapterRegistry>,
    id_gen: IdGenerator,
}

impl InboxService {
    #[must_use]
    pub const fn new(
        author_repo: AuthorRepository,
        inbox_repo: InboxRepository,
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        like_repo: LikeRepository,
        registry: Arc<AdapterRegistry>,
    ) -> Self {
        Self {
            author_repo,
            inbox_repo,
            post_repo,
            comment_repo,
            like_repo,
            registry,
            id_gen: IdGenerator::new(),
        }
    }

    /// Accept an item pushed to `owner`'s inbox.
    ///
    /// Returns the stored payload. Rejections are logged and returned as
    /// validation errors; nothing is stored for them.
    pub async fn receive(&self, principal: &Principal, owner: Uuid, payload: Value) -> AppResult<Value> {
        self.author_repo.get_by_id(owner).await?;

        let payload = match principal {
            Principal::Node(node) => self
                .registry
                .resolve(&node.adapter)
                .post_inbox_item(node, payload),
            Principal::Author(_) => payload,
        };

        let (kind, payload) = match validate_inbox_item(owner, payload) {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(owner = %owner, sender = %principal.label(), error = %err, "Rejected inbox item");
                return Err(err);
            }
        };

        let stored = self
            .inbox_repo
            .create(inbox_item::ActiveModel {
                id: Set(self.id_gen.generate()),
                author_id: Set(owner),
                kind: Set(kind),
                payload: Set(payload),
                received_at: Set(Utc::now().into()),
            })
            .await?;
        info!(owner = %owner, item = %stored.id, ?kind, sender = %principal.label(), "Stored inbox item");

        self.apply(kind, &stored.payload).await;
        Ok(stored.payload)
    }

    /// A page of `owner`'s inbox, newest first. Only the owner may read it.
    pub async fn list(
        &self,
        principal: &Principal,
        owner: Uuid,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<Value>> {
        principal.require_author(owner)?;
        Ok(self
            .inbox_repo
            .find_by_author(owner, limit, offset)
            .await?
            .into_iter()
            .map(|item| item.payload)
            .collect())
    }

    pub async fn count(&self, principal: &Principal, owner: Uuid) -> AppResult<u64> {
        principal.require_author(owner)?;
        self.inbox_repo.count_by_author(owner).await
    }

    /// Mirror likes and comments on local objects into their tables.
    /// Failures here never undo the stored inbox item.
    async fn apply(&self, kind: InboxKind, payload: &Value) {
        let result = match kind {
            InboxKind::Like => self.record_like(payload).await,
            InboxKind::Comment => self.record_comment(payload).await,
            InboxKind::Post | InboxKind::Follow => Ok(()),
        };
        if let Err(err) = result {
            warn!(?kind, error = %err, "Could not record inbox item locally");
        }
    }

    async fn record_like(&self, payload: &Value) -> AppResult<()> {
        let author = payload_author(payload)?;
        let object = payload
            .get("object")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::invalid_field("object", "missing like target"))?;

        let target = if let Some(comment) = comment_uuid(object) {
            LikeTarget::Comment(comment)
        } else if let Some(post) = extract_post_uuid(object) {
            LikeTarget::Post(post)
        } else {
            debug!(object = %object, "Like target is not a local object");
            return Ok(());
        };

        let exists = match target {
            LikeTarget::Post(id) => self.post_repo.find_by_id(id).await?.is_some(),
            LikeTarget::Comment(id) => self.comment_repo.find_by_id(id).await?.is_some(),
        };
        if !exists {
            debug!(?target, "Like target not found locally");
            return Ok(());
        }

        let created = self
            .like_repo
            .insert_if_absent(like::ActiveModel {
                id: Set(self.id_gen.generate()),
                author_uuid: Set(author),
                target_kind: Set(target.kind()),
                target_uuid: Set(target.uuid()),
                created_at: Set(Utc::now().into()),
            })
            .await?;
        debug!(?target, author = %author, created, "Recorded like");
        Ok(())
    }

    async fn record_comment(&self, payload: &Value) -> AppResult<()> {
        let author = payload_author(payload)?;
        let id = payload.get("id").and_then(Value::as_str).unwrap_or_default();
        let Some(post_id) = extract_post_uuid(id) else {
            debug!(id = %id, "Comment does not name a post");
            return Ok(());
        };
        if self.post_repo.find_by_id(post_id).await?.is_none() {
            debug!(post = %post_id, "Commented post not found locally");
            return Ok(());
        }

        let comment_id = comment_uuid(id).unwrap_or_else(|| self.id_gen.generate_content_id());
        if self.comment_repo.find_by_id(comment_id).await?.is_some() {
            return Ok(());
        }

        let content_type = payload
            .get("contentType")
            .cloned()
            .and_then(|value| serde_json::from_value::<ContentType>(value).ok())
            .unwrap_or(ContentType::Plain);
        let published = payload
            .get("published")
            .and_then(Value::as_str)
            .and_then(|value| chrono::DateTime::parse_from_rfc3339(value).ok())
            .unwrap_or_else(|| Utc::now().into());

        self.comment_repo
            .create(comment::ActiveModel {
                id: Set(comment_id),
                post_id: Set(post_id),
                author_uuid: Set(author),
                content_type: Set(content_type),
                comment: Set(payload
                    .get("comment")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()),
                published: Set(published),
            })
            .await?;
        debug!(post = %post_id, comment = %comment_id, "Recorded comment");
        Ok(())
    }
}

fn payload_author(payload: &Value) -> AppResult<Uuid> {
    payload
        .get("author")
        .and_then(|author| author.get("id"))
        .and_then(Value::as_str)
        .and_then(|id| extract_author_uuid(id).or_else(|| parse_uuid(id)))
        .ok_or_else(|| AppError::invalid_field("author.id", "not an author identifier"))
}

/// The trailing `/comments/<uuid>` of an identifier, if any.
fn comment_uuid(identifier: &str) -> Option<Uuid> {
    let (_, rest) = identifier.rsplit_once("/comments/")?;
    parse_uuid(rest.trim_end_matches('/'))
}
