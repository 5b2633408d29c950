//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Deserialize;
use socialdist_common::{AppError, AppResult, parse_uuid};
use socialdist_core::Principal;
use uuid::Uuid;

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: u64 = 5;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Authenticated caller extractor.
#[derive(Debug, Clone)]
pub struct Auth(pub Principal);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the Basic auth middleware
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(Auth)
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional authenticated caller extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuth(pub Option<Principal>);

impl<S> FromRequestParts<S> for MaybeAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Principal>().cloned()))
    }
}

impl MaybeAuth {
    /// The viewing local author, if any.
    #[must_use]
    pub fn viewer(&self) -> Option<Uuid> {
        self.0
            .as_ref()
            .and_then(Principal::author)
            .map(|author| author.id)
    }
}

/// A UUID path segment, hyphenated or not. Malformed segments are
/// not-found.
pub fn uuid_segment(segment: &str) -> AppResult<Uuid> {
    parse_uuid(segment).ok_or_else(|| AppError::NotFound(format!("no object `{segment}`")))
}

/// `page` (1-based) and `size` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<u64>,
    pub size: Option<u64>,
}

impl Pagination {
    #[must_use]
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    #[must_use]
    pub fn limit(&self) -> u64 {
        self.size()
    }

    #[must_use]
    pub fn offset(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.size())
    }
}
