/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Cryptographic primitives.
//!
//! Leaf contributions are computed with the hash function re-exported here, provided by the [`sha2`]
//! crate.

use super::basic::{Digest as RvbDigest, RvbId};

// re-exports below.
pub use sha2::Digest;
pub use sha2::Sha256 as CryptoHasher;

/// Hash `digest` together with the `rvb_id` it was supplied for.
pub(crate) fn rvb_hash(rvb_id: RvbId, digest: &RvbDigest) -> [u8; 32] {
    let mut hasher = CryptoHasher::new();
    hasher.update(rvb_id.to_be_bytes());
    hasher.update(digest.bytes());
    hasher.finalize().into()
}
