//! Post service and visibility router.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use serde_json::Value;
use socialdist_common::{AppError, AppResult, IdGenerator, extract_author_uuid, parse_uuid};
use socialdist_db::{
    entities::{
        author,
        post::{self, ContentType, Visibility},
    },
    repositories::{
        AuthorRepository, CommentRepository, FollowerRepository, FollowingRepository,
        PostRepository,
    },
};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::representation::{PostRepresentation, Representer};

/// Whether `viewer` may see a local post: PUBLIC to anyone, the author
/// always, PRIVATE to its recipient, FRIENDS to the author's friends.
pub(crate) async fn is_visible_to(
    post: &post::Model,
    viewer: Option<Uuid>,
    follower_repo: &FollowerRepository,
    following_repo: &FollowingRepository,
) -> AppResult<bool> {
    Ok(match (post.visibility, viewer) {
        (Visibility::Public, _) => true,
        (_, Some(viewer)) if viewer == post.author_id => true,
        (Visibility::Private, Some(viewer)) => post.recipient_id == Some(viewer),
        (Visibility::Friends, Some(viewer)) => {
            follower_repo.is_follower(post.author_id, viewer).await?
                && following_repo.is_following(post.author_id, viewer).await?
        }
        (_, None) => false,
    })
}

/// Input for creating a post.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 300))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,

    pub content_type: ContentType,

    pub content: String,

    /// A list of non-empty strings.
    #[serde(default = "empty_categories")]
    pub categories: Value,

    pub visibility: Visibility,

    /// Author UUID or author URL; only kept for PRIVATE posts.
    #[serde(default)]
    pub recipient: Option<String>,

    #[serde(default)]
    pub unlisted: bool,

    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub origin: Option<String>,
}

fn empty_categories() -> Value {
    Value::Array(Vec::new())
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    author_repo: AuthorRepository,
    follower_repo: FollowerRepository,
    following_repo: FollowingRepository,
    representer: Representer,
    id_gen: IdGenerator,
}

impl PostService {
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        author_repo: AuthorRepository,
        follower_repo: FollowerRepository,
        following_repo: FollowingRepository,
        representer: Representer,
    ) -> Self {
        Self {
            post_repo,
            comment_repo,
            author_repo,
            follower_repo,
            following_repo,
            representer,
            id_gen: IdGenerator::new(),
        }
    }

    /// Publish a post as `author`.
    pub async fn create(&self, author: &author::Model, input: CreatePostInput) -> AppResult<post::Model> {
        input.validate()?;
        validate_categories(&input.categories)?;

        let recipient = match (input.visibility, input.recipient.as_deref()) {
            (Visibility::Private, Some(recipient)) => Some(
                extract_author_uuid(recipient)
                    .or_else(|| parse_uuid(recipient))
                    .ok_or_else(|| {
                        AppError::invalid_field("recipient", "not an author identifier")
                    })?,
            ),
            (visibility, Some(recipient)) => {
                warn!(
                    author = %author.id,
                    ?visibility,
                    recipient = %recipient,
                    "Dropping recipient of a non-private post"
                );
                None
            }
            (_, None) => None,
        };

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate_content_id()),
            author_id: Set(author.id),
            content_type: Set(input.content_type),
            title: Set(input.title),
            description: Set(input.description),
            content: Set(input.content),
            categories: Set(input.categories),
            visibility: Set(input.visibility),
            recipient_id: Set(recipient),
            unlisted: Set(input.unlisted),
            source: Set(input.source),
            origin: Set(input.origin),
            published: Set(Utc::now().into()),
        };

        let post = self.post_repo.create(model).await?;
        info!(author = %author.id, post = %post.id, visibility = ?post.visibility, "Created post");
        Ok(post)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<post::Model> {
        self.post_repo.get_by_id(id).await
    }

    /// A post as seen by `viewer`. Posts the viewer may not see are
    /// reported as missing.
    pub async fn get_for_viewer(&self, id: Uuid, viewer: Option<Uuid>) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(id).await?;
        if is_visible_to(&post, viewer, &self.follower_repo, &self.following_repo).await? {
            Ok(post)
        } else {
            Err(AppError::PostNotFound(id.to_string()))
        }
    }

    /// Delete a post with its comments and likes. Only its author may.
    pub async fn delete(&self, author: &author::Model, id: Uuid) -> AppResult<()> {
        let post = self.post_repo.get_by_id(id).await?;
        if post.author_id != author.id {
            return Err(AppError::Forbidden(
                "only the author may delete a post".to_string(),
            ));
        }
        self.post_repo.delete_cascade(post.id).await?;
        info!(author = %author.id, post = %post.id, "Deleted post");
        Ok(())
    }

    /// A page of `author_id`'s PUBLIC posts, newest first.
    pub async fn list_public(&self, author_id: Uuid, limit: u64, offset: u64) -> AppResult<Vec<post::Model>> {
        self.post_repo
            .find_public_by_author(author_id, limit, offset)
            .await
    }

    pub async fn count_public(&self, author_id: Uuid) -> AppResult<u64> {
        self.post_repo.count_public_by_author(author_id).await
    }

    /// Posts `viewer` may see, newest first: every PUBLIC post, FRIENDS
    /// posts of authors who both follow and are followed by the viewer
    /// (local rows only), and PRIVATE posts addressed to the viewer.
    pub async fn visible_posts(&self, viewer: Uuid, limit: u64, offset: u64) -> AppResult<Vec<post::Model>> {
        let followed_by_viewer: HashSet<Uuid> = self
            .follower_repo
            .authors_followed_by(viewer)
            .await?
            .into_iter()
            .collect();
        let friends: Vec<Uuid> = self
            .following_repo
            .authors_following(viewer)
            .await?
            .into_iter()
            .filter(|author| followed_by_viewer.contains(author))
            .collect();

        self.post_repo
            .find_visible(viewer, &friends, limit, offset)
            .await
    }

    #[must_use]
    pub const fn representer(&self) -> &Representer {
        &self.representer
    }

    pub async fn represent(&self, post: &post::Model) -> AppResult<PostRepresentation> {
        let author = self.author_repo.get_by_id(post.author_id).await?;
        let count = self.comment_repo.count_by_post(post.id).await?;
        Ok(self.representer.post(post, &author, count))
    }

    pub async fn represent_all(&self, posts: &[post::Model]) -> AppResult<Vec<PostRepresentation>> {
        let mut representations = Vec::with_capacity(posts.len());
        for post in posts {
            representations.push(self.represent(post).await?);
        }
        Ok(representations)
    }
}

fn validate_categories(categories: &Value) -> AppResult<()> {
    let valid = categories.as_array().is_some_and(|items| {
        items
            .iter()
            .all(|item| item.as_str().is_some_and(|tag| !tag.trim().is_empty()))
    });
    if valid {
        Ok(())
    } else {
        Err(AppError::invalid_field(
            "categories",
            "must be a list of non-empty strings",
        ))
    }
}
