use tracing::{debug, trace};

use super::hasher::RingHash;
use super::{HashRing, Joined, Lookup, Member};
use crate::{Result, RingError};

impl<S> HashRing<S>
where
    S: RingHash,
{
    /// Add the node `id` to the hash ring.
    ///
    /// Ids are not deduplicated: joining the same id twice places two entries on the ring.
    pub fn join(&self, id: impl Into<String>) {
        let member = self.member(id.into());

        let mut ring = self.ring.write();
        insert(&mut ring, member);
    }

    /// Add the node `id` unless a node with the same id is already on the ring.
    pub fn join_unique(&self, id: impl Into<String>) -> Joined {
        let member = self.member(id.into());

        let mut ring = self.ring.write();
        if ring.iter().any(|m| m.id == member.id) {
            debug!(id = %member.id, "node already on ring");
            return Joined::AlreadyPresent;
        }
        insert(&mut ring, member);

        Joined::Inserted
    }

    /// Remove the node `id` from the hash ring.
    ///
    /// Only the first node at the position of `id` is inspected: it has to carry exactly this id,
    /// otherwise `RingError::NotFound` is returned and the ring stays unchanged
    pub fn leave(&self, id: &str) -> Result<()> {
        let position = self.hasher.position(id);

        let mut ring = self.ring.write();
        let index = search_index(&ring, position);
        if ring.get(index).is_none_or(|m| m.id != id) {
            return Err(RingError::NotFound(id.to_string()));
        }

        ring.remove(index);
        debug!(id, position, members = ring.len(), "node left ring");

        Ok(())
    }

    /// returns the node responsible for `request_id`, plus the next node on the ring as alternate
    /// Returns `RingError::Unavailable` if the ring is empty
    ///
    /// The alternate is omitted only if the responsible node's id equals `request_id`
    pub fn get(&self, request_id: &str) -> Result<Lookup> {
        let position = self.hasher.position(request_id);

        let ring = self.ring.read();
        if ring.is_empty() {
            return Err(RingError::Unavailable);
        }

        // past the last node the ring wraps around to the first one
        let index = match search_index(&ring, position) {
            n if n == ring.len() => 0,
            n => n,
        };

        let primary = &ring[index];
        let alternate = (primary.id != request_id).then(|| ring[(index + 1) % ring.len()].id.clone());
        trace!(request_id, position, primary = %primary.id, ?alternate, "lookup");

        Ok(Lookup {
            primary: primary.id.clone(),
            alternate,
        })
    }

    /// Returns true if a node with exactly this id is on the ring.
    pub fn contains(&self, id: &str) -> bool {
        self.ring.read().iter().any(|m| m.id == id)
    }

    /// The position `key` gets on this ring, used for node ids and request ids alike.
    pub fn position_of(&self, key: &str) -> u32 {
        self.hasher.position(key)
    }

    fn member(&self, id: String) -> Member {
        let position = self.hasher.position(&id);
        Member::new(id, position)
    }
}

// smallest index whose position is >= `position`, or `ring.len()` if there is none
fn search_index(ring: &[Member], position: u32) -> usize {
    ring.partition_point(|m| m.position < position)
}

// nodes sharing a position keep their insertion order
fn insert(ring: &mut Vec<Member>, member: Member) {
    let index = ring.partition_point(|m| m.position <= member.position);
    debug!(id = %member.id, position = member.position, members = ring.len() + 1, "node joined ring");
    ring.insert(index, member);
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use rand::Rng;

    use super::HashRing;
    use crate::{Joined, Lookup, RingError, RingHash};

    /// Places known ids at fixed positions, numeric ids at their value and everything else at 0
    struct FixedHasher {
        positions: HashMap<&'static str, u32>,
    }

    impl FixedHasher {
        fn new(positions: &[(&'static str, u32)]) -> Self {
            FixedHasher {
                positions: positions.iter().copied().collect(),
            }
        }
    }

    impl RingHash for FixedHasher {
        fn position(&self, key: &str) -> u32 {
            match self.positions.get(key) {
                Some(position) => *position,
                None => key.parse().unwrap_or(0),
            }
        }
    }

    fn greek_ring() -> HashRing<FixedHasher> {
        let ring = HashRing::with_hasher(FixedHasher::new(&[
            ("alpha", 200),
            ("beta", 300),
            ("gamma", 100),
        ]));
        ring.join("alpha");
        ring.join("beta");
        ring.join("gamma");
        ring
    }

    fn lookup(primary: &str, alternate: Option<&str>) -> Lookup {
        Lookup {
            primary: primary.to_string(),
            alternate: alternate.map(str::to_string),
        }
    }

    fn ids<S>(ring: &HashRing<S>) -> Vec<String> {
        ring.iter().collect()
    }

    fn assert_sorted<S>(ring: &HashRing<S>) {
        let members = ring.members();
        assert!(
            members.windows(2).all(|w| w[0].position() <= w[1].position()),
            "ring not sorted: {members:?}"
        );
    }

    #[test]
    fn join_keeps_nodes_sorted() {
        let ring = greek_ring();

        assert_eq!(ids(&ring), vec!["gamma", "alpha", "beta"]);
        assert_eq!(
            ring.members().iter().map(|m| m.position()).collect::<Vec<_>>(),
            vec![100, 200, 300]
        );
    }

    #[test]
    fn get_on_empty_ring_is_unavailable() {
        let ring = HashRing::new();

        assert_eq!(ring.get("request1"), Err(RingError::Unavailable));
        assert_eq!(ring.get(""), Err(RingError::Unavailable));
    }

    #[test]
    fn get_returns_successor_and_alternate() {
        let ring = greek_ring();

        assert_eq!(ring.get("150").unwrap(), lookup("alpha", Some("beta")));
        assert_eq!(ring.get("250").unwrap(), lookup("beta", Some("gamma")));
        assert_eq!(ring.get("50").unwrap(), lookup("gamma", Some("alpha")));
    }

    #[test]
    fn get_on_exact_position_picks_that_node() {
        let ring = greek_ring();

        assert_eq!(ring.get("200").unwrap(), lookup("alpha", Some("beta")));
        assert_eq!(ring.get("300").unwrap(), lookup("beta", Some("gamma")));
    }

    #[test]
    fn get_wraps_around_past_last_node() {
        let ring = greek_ring();

        assert_eq!(ring.get("350").unwrap(), lookup("gamma", Some("alpha")));
        assert_eq!(
            ring.get(&u32::MAX.to_string()).unwrap(),
            lookup("gamma", Some("alpha"))
        );
    }

    #[test]
    fn get_omits_alternate_if_request_id_equals_node_id() {
        let ring = greek_ring();

        assert_eq!(ring.get("alpha").unwrap(), lookup("alpha", None));
        assert_eq!(ring.get("gamma").unwrap(), lookup("gamma", None));
    }

    #[test]
    fn get_with_single_node_uses_it_as_alternate() {
        let ring = HashRing::new();
        ring.join("server1");

        assert_eq!(
            ring.get("request1").unwrap(),
            lookup("server1", Some("server1"))
        );
        assert_eq!(ring.get("server1").unwrap(), lookup("server1", None));
    }

    #[test]
    fn get_is_stable_for_unchanged_ring() {
        let ring = HashRing::new();
        for i in 0..10 {
            ring.join(format!("server{i}"));
        }

        for i in 0..100 {
            let request = format!("request{i}");
            let first = ring.get(&request).unwrap();
            assert_eq!(ring.get(&request).unwrap(), first);
            assert_eq!(ring.get(&request).unwrap(), first);
        }
    }

    #[test]
    fn leave_removes_node() {
        let ring = greek_ring();

        assert_eq!(ring.leave("alpha"), Ok(()));
        assert_eq!(ids(&ring), vec!["gamma", "beta"]);
        assert_eq!(ring.get("150").unwrap(), lookup("beta", Some("gamma")));

        assert_eq!(ring.leave("gamma"), Ok(()));
        assert_eq!(ring.leave("beta"), Ok(()));
        assert!(ring.is_empty());
        assert_eq!(ring.get("150"), Err(RingError::Unavailable));
    }

    #[test]
    fn leave_unknown_node_is_not_found() {
        let ring = greek_ring();

        assert_eq!(
            ring.leave("delta"),
            Err(RingError::NotFound("delta".to_string()))
        );
        assert_eq!(ring.len(), 3);

        let empty = HashRing::new();
        assert_eq!(empty.leave("x"), Err(RingError::NotFound("x".to_string())));
        assert_eq!(empty.len(), 0);
    }

    #[test]
    fn leave_past_last_node_is_not_found() {
        let ring = greek_ring();

        // 400 is beyond every node, the search ends at ring.len()
        assert_eq!(
            ring.leave("400"),
            Err(RingError::NotFound("400".to_string()))
        );
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn join_then_leave_restores_ring() {
        let ring = HashRing::new();
        for i in 0..5 {
            ring.join(format!("server{i}"));
        }
        let before = ring.members();

        ring.join("server-new");
        assert_eq!(ring.len(), 6);
        ring.leave("server-new").unwrap();

        assert_eq!(ring.members(), before);
    }

    #[test]
    fn duplicate_ids_are_separate_entries() {
        let ring = HashRing::new();
        ring.join("x");
        ring.join("x");
        assert_eq!(ring.len(), 2);

        ring.leave("x").unwrap();
        assert_eq!(ring.len(), 1);
        assert!(ring.contains("x"));

        ring.leave("x").unwrap();
        assert!(!ring.contains("x"));
        assert_eq!(ring.leave("x"), Err(RingError::NotFound("x".to_string())));
    }

    #[test]
    fn colliding_nodes_keep_insertion_order() {
        let ring = HashRing::with_hasher(FixedHasher::new(&[("a", 100), ("b", 100), ("c", 50)]));
        ring.join("a");
        ring.join("c");
        ring.join("b");

        assert_eq!(ids(&ring), vec!["c", "a", "b"]);
        assert_eq!(ring.get("75").unwrap(), lookup("a", Some("b")));

        // only the first node at position 100 is inspected
        assert_eq!(ring.leave("b"), Err(RingError::NotFound("b".to_string())));
        assert_eq!(ring.leave("a"), Ok(()));
        assert_eq!(ring.leave("b"), Ok(()));
        assert_eq!(ids(&ring), vec!["c"]);
    }

    #[test]
    fn join_unique_skips_known_ids() {
        let ring = HashRing::new();

        assert_eq!(ring.join_unique("server1"), Joined::Inserted);
        assert_eq!(ring.join_unique("server2"), Joined::Inserted);
        assert_eq!(ring.join_unique("server1"), Joined::AlreadyPresent);
        assert_eq!(ring.len(), 2);

        ring.leave("server1").unwrap();
        assert_eq!(ring.join_unique("server1"), Joined::Inserted);
    }

    #[test]
    fn accepts_any_identifier() {
        let ring = HashRing::new();
        let long = "x".repeat(10_000);

        ring.join("");
        ring.join(long.as_str());
        assert_eq!(ring.len(), 2);
        assert!(ring.get("").is_ok());

        ring.leave("").unwrap();
        ring.leave(&long).unwrap();
        assert!(ring.is_empty());
    }

    #[test]
    fn position_of_uses_ring_hasher() {
        let ring = greek_ring();

        assert_eq!(ring.position_of("beta"), 300);
        assert_eq!(ring.position_of("42"), 42);
        assert_eq!(HashRing::new().position_of("a"), 0xe8b7be43);
    }

    #[test]
    fn random_joins_and_leaves_keep_ring_sorted() {
        let mut rng = rand::rng();
        let ring = HashRing::new();
        let mut joined: Vec<String> = vec![];

        for _ in 0..2_000 {
            if joined.is_empty() || rng.random_bool(0.6) {
                let id = format!("server{}", rng.random_range(0..100));
                ring.join(id.as_str());
                joined.push(id);
            } else {
                let id = joined.swap_remove(rng.random_range(0..joined.len()));
                assert_eq!(ring.leave(&id), Ok(()), "{id} should be on the ring");
            }

            assert_sorted(&ring);
            assert_eq!(ring.len(), joined.len());
        }
    }
}
