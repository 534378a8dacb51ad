/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Helpers that drive a [`RangeValidationTree`] through a state transfer.
//!
//! During a state transfer, a lagging replica fetches ranges of blocks from a source replica and must
//! check that what it receives is what the rest of the replica set agrees on. The tree makes this cheap:
//! 1. Both replicas compare [root hash values](RangeValidationTree::get_root_hash_val). If they agree,
//!    the fetching replica can trust the source's tree, e.g., one received in
//!    [serialized form](crate::rvt::serialization).
//! 2. The fetching replica [plans](plan_fetch) the fetch: for each RVB group in the range it wants, it
//!    records the group's member ids and hash value.
//! 3. For each group of RVB digests fetched, it [validates](validate_fetched_group) the digests against
//!    the group hash value before using them.
//!
//! Separately, the replica's own tree is kept in step with its storage by
//! [filling](fill_from_source) it as new RVBs become available and [pruning](prune_below) it as old
//! ones age out of the window. Storage is reached through the [`RvbDigestSource`] trait.

use crate::{
    rvt::{RangeValidationTree, RvtError},
    types::basic::{Digest, RvbId},
};

pub mod plan;

pub mod validation;

pub use plan::{fill_from_source, plan_fetch, prune_below, RvbGroupFetch};
pub use validation::{validate_fetched_group, FetchValidationError};

/// Read access to the digests of the RVBs held by the replica's storage.
///
/// Implemented by the storage adapter of the replica. The digest of an RVB is computed by the
/// adapter from the blocks in the RVB's range; the tree treats it as opaque.
pub trait RvbDigestSource {
    /// The digest of the RVB identified by `rvb_id`, or `None` if storage does not hold its range.
    fn rvb_digest(&self, rvb_id: RvbId) -> Option<Digest>;
}

/// Enumerates the different ways filling or pruning a tree from storage can fail.
#[derive(Debug)]
pub enum RvbSyncError {
    /// See: [`RvtError`].
    RvtError(RvtError),

    /// Storage no longer holds the digest needed to authenticate the removal of a live id.
    DigestUnavailable { rvb_id: RvbId },
}

impl From<RvtError> for RvbSyncError {
    fn from(value: RvtError) -> Self {
        RvbSyncError::RvtError(value)
    }
}
