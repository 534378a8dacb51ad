/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Keeping a tree in step with storage, and planning fetches from it.

use crate::{
    accumulator::HashVal,
    rvt::{RangeValidationTree, RvtError},
    types::basic::{RvbGroupId, RvbId},
};

use super::{RvbDigestSource, RvbSyncError};

/// What a fetching replica needs to validate one fetched RVB group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RvbGroupFetch {
    pub rvb_group_id: RvbGroupId,
    /// Member ids of the group, ascending.
    pub rvb_ids: Vec<RvbId>,
    /// The value the fetched digests of `rvb_ids` must accumulate to.
    pub group_hash: HashVal,
}

/// For every RVB group intersecting `[min_rvb_id, max_rvb_id]`, in ascending order, the group's id,
/// member ids and hash value.
pub fn plan_fetch(
    tree: &RangeValidationTree,
    min_rvb_id: RvbId,
    max_rvb_id: RvbId,
) -> Vec<RvbGroupFetch> {
    tree.get_rvb_group_ids(min_rvb_id, max_rvb_id)
        .into_iter()
        .filter_map(|rvb_group_id| {
            let group_hash = tree.group_hash_val(rvb_group_id)?;
            Some(RvbGroupFetch {
                rvb_group_id,
                rvb_ids: tree.get_rvb_ids(rvb_group_id),
                group_hash,
            })
        })
        .collect()
}

/// Add to `tree` every RVB id in `[min_rvb_id, max_rvb_id]` that `source` has a digest for and that is
/// not live yet. Returns the number of ids added.
///
/// # Error
///
/// Stops at, and returns, the first error of [`add_node`](RangeValidationTree::add_node). The ids added
/// before the error stay in the tree.
pub fn fill_from_source<S: RvbDigestSource>(
    tree: &mut RangeValidationTree,
    source: &S,
    min_rvb_id: RvbId,
    max_rvb_id: RvbId,
) -> Result<usize, RvtError> {
    let f = tree.fetch_range_size().int();
    let start = min_rvb_id.int().max(f);
    let Some(first) = start.checked_add((f - start % f) % f) else {
        return Ok(0);
    };

    let mut added = 0;
    let mut rvb_id = RvbId::new(first);
    while rvb_id <= max_rvb_id {
        if !tree.contains(rvb_id) {
            if let Some(digest) = source.rvb_digest(rvb_id) {
                tree.add_node(rvb_id, &digest)?;
                added += 1;
            }
        }
        let Some(next) = rvb_id.int().checked_add(f) else {
            break;
        };
        rvb_id = RvbId::new(next);
    }

    log::debug!(
        "Filled {} RVBs between {} and {} from storage",
        added,
        min_rvb_id,
        max_rvb_id
    );
    Ok(added)
}

/// Remove from `tree` every live id lower than `below`, authenticating each removal with the digest that
/// `source` reports for it. Returns the number of ids removed.
///
/// # Error
///
/// Stops at the first id whose digest `source` cannot provide ([`RvbSyncError::DigestUnavailable`]) or
/// whose removal fails, e.g., because the digests disagree. The ids removed before the error stay
/// removed.
pub fn prune_below<S: RvbDigestSource>(
    tree: &mut RangeValidationTree,
    source: &S,
    below: RvbId,
) -> Result<usize, RvbSyncError> {
    let stale: Vec<RvbId> = tree.rvb_ids().take_while(|rvb_id| *rvb_id < below).collect();

    let mut removed = 0;
    for rvb_id in stale {
        let digest = source
            .rvb_digest(rvb_id)
            .ok_or(RvbSyncError::DigestUnavailable { rvb_id })?;
        tree.remove_node(rvb_id, &digest)?;
        removed += 1;
    }

    log::debug!("Pruned {} RVBs below {}", removed, below);
    Ok(removed)
}
