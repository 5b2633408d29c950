//! HTTP API layer for socialdist.
//!
//! This crate provides the peer-facing REST surface:
//!
//! - **Endpoints**: authors, followers, following, posts, comments, likes,
//!   inbox and stream
//! - **Extractors**: authenticated principal, pagination, UUID segments
//! - **Middleware**: HTTP Basic authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::{Router, middleware::from_fn_with_state};

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};

/// The API mounted under `/{api_prefix}` with authentication applied.
pub fn app(state: AppState, api_prefix: &str) -> Router {
    let prefix = api_prefix.trim_matches('/');
    let api = if prefix.is_empty() {
        router()
    } else {
        Router::new().nest(&format!("/{prefix}"), router())
    };

    api.layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
