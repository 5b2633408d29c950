//! ID generation utilities.

use ulid::Ulid;
use uuid::Uuid;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based row ID.
    ///
    /// Used for rows that never leave this node (follow edges, likes,
    /// inbox items, cache entries).
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a random identity UUID for an author.
    #[must_use]
    pub fn generate_identity(&self) -> Uuid {
        Uuid::new_v4()
    }

    /// Generate a time-ordered UUID for content (posts, comments).
    ///
    /// UUID v7 sorts by creation time, which gives same-timestamp posts a
    /// stable tie-break order.
    #[must_use]
    pub fn generate_content_id(&self) -> Uuid {
        Uuid::now_v7()
    }
}
