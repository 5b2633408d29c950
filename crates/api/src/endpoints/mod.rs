//! API endpoints.
//!
//! Peers disagree on trailing slashes, so every route answers with and
//! without one.

mod authors;
mod followers;
mod following;
mod inbox;
mod posts;

use axum::{Router, routing::MethodRouter};

use crate::middleware::AppState;

/// Registers a route under both `path` and `path/`.
trait RouteWithSlash {
    fn route_with_slash(self, path: &str, method_router: MethodRouter<AppState>) -> Self;
}

impl RouteWithSlash for Router<AppState> {
    fn route_with_slash(self, path: &str, method_router: MethodRouter<AppState>) -> Self {
        self.route(path, method_router.clone())
            .route(&format!("{path}/"), method_router)
    }
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(authors::router())
        .merge(followers::router())
        .merge(following::router())
        .merge(inbox::router())
        .merge(posts::router())
}
