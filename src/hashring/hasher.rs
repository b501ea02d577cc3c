use std::hash::Hasher;

use siphasher::sip::SipHasher;

/// Maps a node id or a request id onto the 32 bit ring
///
/// Implementations must be deterministic: the same key always yields the same position,
/// otherwise nodes could not be found again when they leave
pub trait RingHash {
    fn position(&self, key: &str) -> u32;
}

/// CRC-32 (IEEE) of the key bytes, the default placement
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Crc32;

impl RingHash for Crc32 {
    fn position(&self, key: &str) -> u32 {
        crc32fast::hash(key.as_bytes())
    }
}

/// SipHash-2-4 with zero keys, folded to 32 bits
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sip32;

impl RingHash for Sip32 {
    fn position(&self, key: &str) -> u32 {
        let mut hasher = SipHasher::new();
        hasher.write(key.as_bytes());
        let hash = hasher.finish();

        ((hash >> 32) as u32) ^ (hash as u32)
    }
}
