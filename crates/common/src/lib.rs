//! Common utilities and shared types for socialdist.
//!
//! This crate provides foundational components used across all socialdist crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Identifiers**: UUID extraction from federation URLs via [`identifier`]
//! - **ID Generation**: ULID-based row identifiers via [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use socialdist_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("{} generated {}", config.server.url, id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod identifier;

pub use config::{Config, PeerConfig};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use identifier::{canonicalize, extract_author_uuid, extract_post_uuid, parse_uuid};
