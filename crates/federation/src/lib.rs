//! Federation core for socialdist.
//!
//! - **Transport**: outbound HTTP to peers via [`PeerTransport`]
//! - **Adapters**: per-peer dialects behind [`NodeAdapter`], selected by tag
//!   through the static [`AdapterRegistry`]
//! - **Location cache**: UUID to peer hints in [`RemoteLocationCache`]
//! - **Resolution**: cache-then-broadcast lookups and deliveries in
//!   [`RemoteResolver`]
//! - **Inbox validation**: per-type checks in [`validate_inbox_item`]

pub mod adapter;
pub mod cache;
pub mod inbox;
pub mod resolver;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod transport;

pub use adapter::{AdapterRegistry, NodeAdapter};
pub use cache::RemoteLocationCache;
pub use inbox::validate_inbox_item;
pub use resolver::RemoteResolver;
pub use transport::{
    Credentials, HttpTransport, PeerRequest, PeerResponse, PeerTransport, TransportError,
};
