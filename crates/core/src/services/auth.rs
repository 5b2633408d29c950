//! Authentication service.
//!
//! Two kinds of caller present HTTP Basic credentials: registered peers and
//! local users. Which one authenticated is carried in [`Principal`], and
//! every authorization decision branches on it.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use socialdist_common::{AppError, AppResult};
use socialdist_db::{
    entities::{author, node},
    repositories::{AuthorRepository, NodeRepository, UserRepository},
};
use tracing::debug;
use uuid::Uuid;

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// A registered peer, authenticated with the credentials it presents to us.
    Node(node::Model),
    /// A local user, represented by their author.
    Author(author::Model),
}

impl Principal {
    #[must_use]
    pub const fn author(&self) -> Option<&author::Model> {
        match self {
            Self::Author(author) => Some(author),
            Self::Node(_) => None,
        }
    }

    #[must_use]
    pub const fn node(&self) -> Option<&node::Model> {
        match self {
            Self::Node(node) => Some(node),
            Self::Author(_) => None,
        }
    }

    /// Whether this is the local author `id`.
    #[must_use]
    pub fn is_author(&self, id: Uuid) -> bool {
        self.author().is_some_and(|author| author.id == id)
    }

    /// The caller as the local author `id`, or `Forbidden`.
    pub fn require_author(&self, id: Uuid) -> AppResult<&author::Model> {
        match self {
            Self::Author(author) if author.id == id => Ok(author),
            Self::Author(_) => Err(AppError::Forbidden(
                "authenticated as a different author".to_string(),
            )),
            Self::Node(_) => Err(AppError::Forbidden(
                "peers may not act as a local author".to_string(),
            )),
        }
    }

    /// The caller as any local author, or `Forbidden` for peers.
    pub fn require_any_author(&self) -> AppResult<&author::Model> {
        self.author()
            .ok_or_else(|| AppError::Forbidden("a local author is required".to_string()))
    }

    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Node(node) => format!("node:{}", node.host),
            Self::Author(author) => format!("author:{}", author.id),
        }
    }
}

/// Credential checks for both authentication universes.
#[derive(Clone)]
pub struct AuthService {
    node_repo: NodeRepository,
    user_repo: UserRepository,
    author_repo: AuthorRepository,
}

impl AuthService {
    #[must_use]
    pub const fn new(
        node_repo: NodeRepository,
        user_repo: UserRepository,
        author_repo: AuthorRepository,
    ) -> Self {
        Self {
            node_repo,
            user_repo,
            author_repo,
        }
    }

    /// Check Basic credentials. Peer credentials are tried before local
    /// accounts.
    pub async fn authenticate_basic(&self, username: &str, password: &str) -> AppResult<Principal> {
        if let Some(node) = self.node_repo.find_by_auth_username(username).await? {
            if node.auth_password == password {
                debug!(node = %node.host, "Authenticated peer");
                return Ok(Principal::Node(node));
            }
            return Err(AppError::Unauthorized);
        }

        let Some(user) = self.user_repo.find_by_username(username).await? else {
            return Err(AppError::Unauthorized);
        };
        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let author = self
            .author_repo
            .find_by_user_id(&user.id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("user {} has no author", user.id)))?;

        debug!(author = %author.id, "Authenticated local author");
        Ok(Principal::Author(author))
    }
}

/// Hash a password with Argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against an Argon2 PHC string.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
