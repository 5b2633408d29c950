//! Business logic services.

#![allow(missing_docs)]

pub mod auth;
pub mod author;
pub mod comment;
pub mod friendship;
pub mod inbox;
pub mod like;
pub mod node;
pub mod post;

#[cfg(test)]
mod scenarios;

pub use auth::{AuthService, Principal};
pub use author::{AuthorRef, AuthorService, RegisterInput, resolve_local_author};
pub use comment::{CommentService, CreateCommentInput};
pub use friendship::FriendshipService;
pub use inbox::InboxService;
pub use like::LikeService;
pub use node::{NodeService, RegisterNodeInput};
pub use post::{CreatePostInput, PostService};
