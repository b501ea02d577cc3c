use super::{HashRing, Member};

/// Iterates over node ids in ring order
pub struct HashRingIterator {
    ring: std::vec::IntoIter<Member>,
}

impl Iterator for HashRingIterator {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.ring.next().map(|member| member.id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ring.size_hint()
    }
}

impl ExactSizeIterator for HashRingIterator {}

impl<S> IntoIterator for HashRing<S> {
    type Item = String;

    type IntoIter = HashRingIterator;

    fn into_iter(self) -> Self::IntoIter {
        HashRingIterator {
            ring: self.ring.into_inner().into_iter(),
        }
    }
}

impl<S> HashRing<S> {
    /// Iterates over a snapshot of the node ids, taken when `iter` is called.
    /// Later joins and leaves do not show up in the iterator
    pub fn iter(&self) -> HashRingIterator {
        HashRingIterator {
            ring: self.members().into_iter(),
        }
    }
}
