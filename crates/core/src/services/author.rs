//! Author service.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use socialdist_common::{AppError, AppResult, IdGenerator};
use socialdist_db::{
    entities::{author, follower, following, like, user},
    repositories::{AuthorRepository, UserRepository},
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    representation::{AuthorRepresentation, Representer},
    services::auth::hash_password,
};

/// Input for registering a local account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 150))]
    pub username: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    /// Defaults to the username.
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,

    #[validate(url)]
    pub github_url: Option<String>,
}

/// A row whose author UUID should name a local author.
#[derive(Debug, Clone, Copy)]
pub enum AuthorRef<'a> {
    /// The liking author.
    Like(&'a like::Model),
    /// The following author.
    Follower(&'a follower::Model),
    /// The followed author.
    Following(&'a following::Model),
}

impl AuthorRef<'_> {
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        match self {
            Self::Like(like) => like.author_uuid,
            Self::Follower(follower) => follower.follower_uuid,
            Self::Following(following) => following.following_uuid,
        }
    }
}

/// Resolve the local author a row refers to, or `AuthorNotFound` when the
/// author lives elsewhere.
pub async fn resolve_local_author(
    repo: &AuthorRepository,
    reference: AuthorRef<'_>,
) -> AppResult<author::Model> {
    let uuid = reference.uuid();
    repo.find_by_id(uuid)
        .await?
        .ok_or_else(|| AppError::AuthorNotFound(uuid.to_string()))
}

/// Author service for business logic.
#[derive(Clone)]
pub struct AuthorService {
    author_repo: AuthorRepository,
    user_repo: UserRepository,
    representer: Representer,
    id_gen: IdGenerator,
}

impl AuthorService {
    #[must_use]
    pub fn new(
        author_repo: AuthorRepository,
        user_repo: UserRepository,
        representer: Representer,
    ) -> Self {
        Self {
            author_repo,
            user_repo,
            representer,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a login account and its author atomically.
    pub async fn register(&self, input: RegisterInput) -> AppResult<author::Model> {
        input.validate()?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "username `{}` is taken",
                input.username
            )));
        }

        let now = Utc::now().into();
        let user_id = self.id_gen.generate();
        let user = user::ActiveModel {
            id: Set(user_id.clone()),
            username: Set(input.username.clone()),
            password_hash: Set(hash_password(&input.password)?),
            created_at: Set(now),
        };
        let author = author::ActiveModel {
            id: Set(self.id_gen.generate_identity()),
            user_id: Set(user_id),
            display_name: Set(input.display_name.unwrap_or(input.username)),
            github_url: Set(input.github_url),
            profile_image: Set(None),
            created_at: Set(now),
        };

        let (user, author) = self.author_repo.create_with_user(user, author).await?;
        info!(username = %user.username, author = %author.id, "Registered author");
        Ok(author)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<author::Model> {
        self.author_repo.get_by_id(id).await
    }

    pub async fn find(&self, id: Uuid) -> AppResult<Option<author::Model>> {
        self.author_repo.find_by_id(id).await
    }

    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<author::Model>> {
        self.author_repo.list(limit, offset).await
    }

    pub async fn count(&self) -> AppResult<u64> {
        self.author_repo.count().await
    }

    #[must_use]
    pub fn represent(&self, author: &author::Model) -> AuthorRepresentation {
        self.representer.author(author)
    }
}
