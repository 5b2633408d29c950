//! Database entities.

#![allow(missing_docs)]

pub mod author;
pub mod comment;
pub mod follower;
pub mod following;
pub mod inbox_item;
pub mod like;
pub mod node;
pub mod post;
pub mod remote_location;
pub mod user;

pub use author::Entity as Author;
pub use comment::Entity as Comment;
pub use follower::Entity as Follower;
pub use following::Entity as Following;
pub use inbox_item::Entity as InboxItem;
pub use like::Entity as Like;
pub use node::Entity as Node;
pub use post::Entity as Post;
pub use remote_location::Entity as RemoteLocation;
pub use user::Entity as User;
