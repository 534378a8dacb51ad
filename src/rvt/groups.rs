/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Queries about RVB groups, the sets of up to K leaves that share a level-1 parent.
//!
//! A replica that fetches a range of blocks from a peer uses these to know which group hash values it
//! needs in order to validate what it fetched ([`get_rvb_group_ids`](RangeValidationTree::get_rvb_group_ids)),
//! which ids a group is made of ([`get_rvb_ids`](RangeValidationTree::get_rvb_ids)), and whether a group
//! id received from a peer can be trusted at all ([`validate_rvb_group_id`](RangeValidationTree::validate_rvb_group_id)).

use crate::{
    accumulator::HashVal,
    types::basic::{RvbGroupId, RvbId},
};

use super::{
    node::NodeInfo,
    tree::{rvb_index, RangeValidationTree, RvtError},
};

impl RangeValidationTree {
    /// The ids, in ascending order, of the live RVB groups whose covered id range intersects
    /// `[min_rvb_id, max_rvb_id]`.
    pub fn get_rvb_group_ids(&self, min_rvb_id: RvbId, max_rvb_id: RvbId) -> Vec<RvbGroupId> {
        let Some(groups) = self.levels.first() else {
            return Vec::new();
        };
        if min_rvb_id > max_rvb_id {
            return Vec::new();
        }

        let f = self.config.fetch_range_size.int();
        let k = self.config.branching_factor.int();
        let first_group = (min_rvb_id.int() / f).max(1).saturating_sub(1) / k;
        let last_group = (max_rvb_id.int() / f).max(1).saturating_sub(1) / k;

        groups
            .range(first_group..=last_group)
            .map(|(_, node)| node)
            .filter(|node| node.covers(min_rvb_id, max_rvb_id))
            .map(|node| node.info.rvb_group_id())
            .collect()
    }

    /// The live ids, in ascending order, that belong to `rvb_group_id`. Empty if `rvb_group_id` does not
    /// [identify a live group](Self::validate_rvb_group_id).
    pub fn get_rvb_ids(&self, rvb_group_id: RvbGroupId) -> Vec<RvbId> {
        if !self.validate_rvb_group_id(rvb_group_id) {
            return Vec::new();
        }
        self.group_leaves(NodeInfo::from_id(rvb_group_id.int()))
            .map(|(rvb_id, _)| *rvb_id)
            .collect()
    }

    /// Whether `rvb_group_id` names a level-1 position that currently holds a live node.
    ///
    /// Group ids received from peers must pass this check before anything derived from them is trusted.
    pub fn validate_rvb_group_id(&self, rvb_group_id: RvbGroupId) -> bool {
        let info = NodeInfo::from_id(rvb_group_id.int());
        info.level == 1 && self.node(info).is_some()
    }

    /// Like [`validate_rvb_group_id`](Self::validate_rvb_group_id), but returns an error naming the
    /// rejected group id.
    pub fn check_rvb_group_id(&self, rvb_group_id: RvbGroupId) -> Result<(), RvtError> {
        if self.validate_rvb_group_id(rvb_group_id) {
            Ok(())
        } else {
            log::warn!("Rejected RVB group id {}: not a live group", rvb_group_id);
            Err(RvtError::InvalidRvbGroupId { rvb_group_id })
        }
    }

    /// The accumulated value of the group `rvb_group_id`, if it is live.
    pub fn group_hash_val(&self, rvb_group_id: RvbGroupId) -> Option<HashVal> {
        if !self.validate_rvb_group_id(rvb_group_id) {
            return None;
        }
        self.node(NodeInfo::from_id(rvb_group_id.int()))
            .map(|node| node.value)
    }

    /// The id of the group that `rvb_id` belongs to, or would belong to if it were added. Does not
    /// require `rvb_id` to be live.
    pub fn rvb_group_id_of(&self, rvb_id: RvbId) -> Result<RvbGroupId, RvtError> {
        let rvb_index = rvb_index(&self.config, rvb_id)?;
        Ok(NodeInfo::group_of(rvb_index, self.config.branching_factor).rvb_group_id())
    }
}
