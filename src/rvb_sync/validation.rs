/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Validation of RVB digests fetched from a peer against a trusted tree.

use std::time::SystemTime;

use crate::{
    accumulator::HashVal,
    events::{Event, RejectFetchedGroupEvent, RejectRvbGroupIdEvent},
    rvt::RangeValidationTree,
    types::basic::{Digest, RvbGroupId, RvbId},
};

/// Check that `fetched`, the ids and digests of the members of `rvb_group_id` as received from a peer,
/// are exactly the members `tree` has for the group, and that their digests accumulate to the group's
/// hash value in `tree`.
///
/// `fetched` may be in any order. Every rejection is logged and emitted as an event on `tree`.
///
/// # Error
///
/// - [`FetchValidationError::InvalidRvbGroupId`] if `rvb_group_id` does not identify a live group of
///   `tree`. Nothing else about `fetched` is looked at in that case.
/// - [`FetchValidationError::UnexpectedRvbIds`] if the fetched ids are not the group's member ids.
/// - [`FetchValidationError::GroupHashMismatch`] if the fetched digests do not accumulate to the
///   group's hash value.
pub fn validate_fetched_group(
    tree: &RangeValidationTree,
    rvb_group_id: RvbGroupId,
    fetched: &[(RvbId, Digest)],
) -> Result<(), FetchValidationError> {
    let Some(expected_hash) = tree.group_hash_val(rvb_group_id) else {
        log::warn!("Rejected fetched RVB group {}: not a live group", rvb_group_id);
        tree.emit(Event::RejectRvbGroupId(RejectRvbGroupIdEvent {
            timestamp: SystemTime::now(),
            rvb_group_id,
        }));
        return Err(FetchValidationError::InvalidRvbGroupId { rvb_group_id });
    };

    let expected_ids = tree.get_rvb_ids(rvb_group_id);
    let mut received_ids: Vec<RvbId> = fetched.iter().map(|(rvb_id, _)| *rvb_id).collect();
    received_ids.sort();
    if received_ids != expected_ids {
        reject(tree, rvb_group_id, fetched.len(), "unexpected RVB ids");
        return Err(FetchValidationError::UnexpectedRvbIds {
            rvb_group_id,
            expected: expected_ids,
            received: received_ids,
        });
    }

    let computed_hash = HashVal::sum(
        fetched
            .iter()
            .map(|(rvb_id, digest)| HashVal::of_rvb(*rvb_id, digest)),
    );
    if computed_hash != expected_hash {
        reject(tree, rvb_group_id, fetched.len(), "group hash mismatch");
        return Err(FetchValidationError::GroupHashMismatch {
            rvb_group_id,
            expected: expected_hash,
            computed: computed_hash,
        });
    }

    Ok(())
}

fn reject(tree: &RangeValidationTree, rvb_group_id: RvbGroupId, rvbs_fetched: usize, reason: &str) {
    log::warn!("Rejected fetched RVB group {}: {}", rvb_group_id, reason);
    tree.emit(Event::RejectFetchedGroup(RejectFetchedGroupEvent {
        timestamp: SystemTime::now(),
        rvb_group_id,
        rvbs_fetched,
    }));
}

/// Enumerates the reasons a fetched RVB group can be rejected by [`validate_fetched_group`].
#[derive(Debug, PartialEq, Eq)]
pub enum FetchValidationError {
    /// The group id does not identify a live group of the trusted tree.
    InvalidRvbGroupId { rvb_group_id: RvbGroupId },

    /// The fetched ids are not the group's member ids.
    UnexpectedRvbIds {
        rvb_group_id: RvbGroupId,
        expected: Vec<RvbId>,
        received: Vec<RvbId>,
    },

    /// The fetched digests do not accumulate to the group's hash value.
    GroupHashMismatch {
        rvb_group_id: RvbGroupId,
        expected: HashVal,
        computed: HashVal,
    },
}
