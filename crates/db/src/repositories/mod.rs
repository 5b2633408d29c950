//! Repositories wrapping sea-orm queries for each table.

pub mod author;
pub mod comment;
pub mod follower;
pub mod following;
pub mod inbox;
pub mod like;
pub mod node;
pub mod post;
pub mod remote_location;
pub mod user;

pub use author::AuthorRepository;
pub use comment::CommentRepository;
pub use follower::FollowerRepository;
pub use following::FollowingRepository;
pub use inbox::InboxRepository;
pub use like::LikeRepository;
pub use node::NodeRepository;
pub use post::PostRepository;
pub use remote_location::RemoteLocationRepository;
pub use user::UserRepository;
