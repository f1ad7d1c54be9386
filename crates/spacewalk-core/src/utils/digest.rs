//! Streaming content digests.
//!
//! The acquire protocol reports both MD5 and SHA-256 for every transfer.
//! Both are fed from the same chunks, in the same order, as they are
//! written to the destination.

use md5::Md5;
use sha2::{Digest, Sha256};

/// Accumulates size, MD5 and SHA-256 over a byte stream
#[derive(Clone, Default)]
pub struct DigestAccumulator {
    md5: Md5,
    sha256: Sha256,
    size: u64,
}

/// Final digests of a byte stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDigests {
    pub size: u64,
    pub md5: String,
    pub sha256: String,
}

impl DigestAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk to both digests
    pub fn update(&mut self, chunk: &[u8]) {
        self.md5.update(chunk);
        self.sha256.update(chunk);
        self.size += chunk.len() as u64;
    }

    /// Bytes seen so far
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn finalize(self) -> ContentDigests {
        ContentDigests {
            size: self.size,
            md5: hex::encode(self.md5.finalize()),
            sha256: hex::encode(self.sha256.finalize()),
        }
    }
}

/// Digests of an in-memory buffer
#[cfg(test)]
fn digest_bytes(data: &[u8]) -> ContentDigests {
    let mut acc = DigestAccumulator::new();
    acc.update(data);
    acc.finalize()
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn chunk_boundaries_do_not_change_digests(
            data in proptest::collection::vec(any::<u8>(), 0..2048),
            split in 0usize..2048,
        ) {
            let split = split.min(data.len());
            let mut acc = DigestAccumulator::new();
            acc.update(&data[..split]);
            acc.update(&data[split..]);
            prop_assert_eq!(acc.finalize(), digest_bytes(&data));
        }
    }
}
