//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::extractors::Pagination;

/// A typed page of items: `{ "type": ..., "page", "size", "items": [...] }`.
#[derive(Debug, Serialize)]
pub struct Collection<T: Serialize> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub page: u64,
    pub size: u64,
    pub items: Vec<T>,
}

impl<T: Serialize> Collection<T> {
    #[must_use]
    pub fn new(kind: &'static str, pagination: Pagination, items: Vec<T>) -> Self {
        Self {
            kind,
            page: pagination.page(),
            size: pagination.size(),
            items,
        }
    }

    /// An unpaginated list.
    #[must_use]
    pub fn all(kind: &'static str, items: Vec<T>) -> Self {
        let size = items.len() as u64;
        Self {
            kind,
            page: 1,
            size,
            items,
        }
    }
}

impl<T: Serialize> IntoResponse for Collection<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `{ "type": "comments", ... }`
#[derive(Debug, Serialize)]
pub struct Comments<T: Serialize> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub page: u64,
    pub size: u64,
    pub post: String,
    pub id: String,
    pub comments: Vec<T>,
}

impl<T: Serialize> IntoResponse for Comments<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `201 Created` with a JSON body.
pub struct Created<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

/// Empty success response.
#[must_use]
pub fn ok() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
