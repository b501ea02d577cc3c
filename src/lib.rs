//! A consistent hash ring to route requests onto a changing set of nodes
//! Nodes join and leave the ring at any time; only the requests falling on the arc of the changed node get remapped
//!
//! Every node is placed on a 32 bit ring by hashing its id
//! A request is hashed into the same space and served by the first node at or after its position,
//! wrapping around to the node with the smallest position
//!
//! Lookups return a primary node and, in almost every case, an alternate node (the successor of the primary)
//! that callers can fall back to. The ring itself does not know whether a node is healthy.
//!
//! The ring is safe to share between threads: joins and leaves are serialized, lookups run concurrently.
//!
//! ```
//! use consistent_ring::{HashRing, RingError};
//!
//! let ring = HashRing::new();
//! assert_eq!(ring.get("request-1"), Err(RingError::Unavailable));
//!
//! ring.join("server-a");
//! ring.join("server-b");
//!
//! let lookup = ring.get("request-1").unwrap();
//! assert!(lookup.primary == "server-a" || lookup.primary == "server-b");
//! assert!(lookup.alternate.is_some());
//!
//! ring.leave("server-a").unwrap();
//! assert_eq!(ring.leave("server-a"), Err(RingError::NotFound("server-a".into())));
//! ```

mod hashring;

pub use hashring::hasher::{Crc32, RingHash, Sip32};
pub use hashring::iterator::HashRingIterator;
pub use hashring::{HashRing, Joined, Lookup, Member};

/// Errors returned by ring operations. None of them are fatal, the ring stays unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RingError {
    /// `leave` targeted a node id that is not on the ring
    #[error("node {0} not found")]
    NotFound(String),
    /// `get` was called on a ring without nodes
    #[error("no nodes available")]
    Unavailable,
}

pub type Result<T> = std::result::Result<T, RingError>;
