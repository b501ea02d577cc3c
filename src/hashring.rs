use std::fmt::{self, Debug};

use parking_lot::RwLock;

#[cfg(feature = "derive")]
use serde::{Deserialize, Serialize};

mod crud;
pub(crate) mod hasher;
pub(crate) mod iterator;

use hasher::Crc32;

/// A named node placed on the ring
///
/// The position is the hash of the id, computed once when the node joins
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    id: String,
    position: u32,
}

impl Member {
    fn new(id: String, position: u32) -> Member {
        Member { id, position }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn position(&self) -> u32 {
        self.position
    }
}

/// Result of a successful lookup
///
/// * `primary` - the node responsible for the request
/// * `alternate` - the node following `primary` on the ring. It is set whenever the primary's id differs from the request id,
///   which is nearly always the case because request ids and node ids come from different naming spaces
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "derive", derive(Serialize, Deserialize))]
pub struct Lookup {
    pub primary: String,
    pub alternate: Option<String>,
}

/// Outcome of `HashRing::join_unique`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Joined {
    /// the node was placed on the ring
    Inserted,
    /// a node with the same id was already on the ring, nothing changed
    AlreadyPresent,
}

/// HashRing represents the set of nodes (cluster) requests are routed to
/// HashRing keeps its nodes sorted by position behind a single reader-writer lock
/// joins and leaves take the lock exclusively, lookups share it
///
/// The lock is never handed out: all access goes through the methods of HashRing
pub struct HashRing<S = Crc32> {
    hasher: S,
    ring: RwLock<Vec<Member>>,
}

impl Default for HashRing {
    fn default() -> Self {
        HashRing {
            hasher: Crc32,
            ring: RwLock::new(Vec::new()),
        }
    }
}

/// Hash Ring
///
/// A hash ring that places nodes and requests with a CRC-32 of their id.
impl HashRing {
    /// Create a new, empty `HashRing`.
    pub fn new() -> HashRing {
        HashRing::default()
    }
}

impl<S> HashRing<S> {
    /// Creates an empty `HashRing` which will place nodes and requests with the given hasher.
    ///
    /// # Arguments
    ///
    /// * `hasher` - implementation of RingHash, used for node ids and request ids alike
    ///
    /// # Examples
    ///
    /// ```
    /// use consistent_ring::{HashRing, Sip32};
    ///
    /// let ring = HashRing::with_hasher(Sip32);
    /// ring.join("127.0.0.1");
    /// assert_eq!(ring.get("foo").unwrap().primary, "127.0.0.1");
    /// ```
    pub fn with_hasher(hasher: S) -> HashRing<S> {
        HashRing {
            hasher,
            ring: RwLock::new(Vec::new()),
        }
    }

    /// Get the number of nodes in the hash ring, duplicates included.
    pub fn len(&self) -> usize {
        self.ring.read().len()
    }

    /// Returns true if the ring has no nodes.
    pub fn is_empty(&self) -> bool {
        self.ring.read().is_empty()
    }

    /// Returns a copy of all nodes, sorted by position.
    pub fn members(&self) -> Vec<Member> {
        self.ring.read().clone()
    }

    /// Returns the hasher used to place nodes and requests.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }
}

impl<S: Clone> Clone for HashRing<S> {
    fn clone(&self) -> Self {
        HashRing {
            hasher: self.hasher.clone(),
            ring: RwLock::new(self.members()),
        }
    }
}

impl<S: PartialEq> PartialEq for HashRing<S> {
    fn eq(&self, other: &Self) -> bool {
        // one guard at a time, two nested read guards can deadlock behind queued writers
        self.hasher == other.hasher && self.members() == other.members()
    }
}

impl<S: Debug> Debug for HashRing<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("hasher", &self.hasher)
            .field("ring", &self.members())
            .finish()
    }
}
