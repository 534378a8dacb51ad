/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Positioned nodes of the Range Validation Tree.
//!
//! Nodes are not linked by pointers. A node is addressed by its [`NodeInfo`], i.e., its level and its
//! index within that level, and the positions of its parent and children are computed from it:
//! - The parent of `(level, index)` is `(level + 1, index / K)`.
//! - The children of `(level, index)` are the live nodes at `level - 1` with indices in
//!   `[index * K, index * K + K)`, or, for `level == 1`, the live leaves whose RVB index falls in the
//!   node's RVB index range.

use crate::{
    accumulator::HashVal,
    types::basic::{BranchingFactor, Digest, FetchRangeSize, RvbGroupId, RvbId},
};

/// Number of bits of a [node id](NodeInfo::id) used for the index. The remaining high bits hold the level.
pub(crate) const INDEX_BITS: u32 = 56;

/// Largest index addressable in a node id.
pub(crate) const MAX_INDEX: u64 = (1 << INDEX_BITS) - 1;

/// The position of a summary node: its level (1 is the level directly above the leaves) and its index
/// within the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeInfo {
    pub level: u8,
    pub index: u64,
}

impl NodeInfo {
    pub(crate) const fn new(level: u8, index: u64) -> Self {
        Self { level, index }
    }

    /// The level-1 node that hosts the RVB with the given 1-based `rvb_index`.
    pub(crate) fn group_of(rvb_index: u64, k: BranchingFactor) -> Self {
        Self::new(1, (rvb_index - 1) / k.int())
    }

    pub(crate) fn parent(&self, k: BranchingFactor) -> Self {
        Self::new(self.level + 1, self.index / k.int())
    }

    /// Range of indices, at `self.level - 1`, that the children of this node may have.
    pub(crate) fn child_indices(&self, k: BranchingFactor) -> (u64, u64) {
        let first = self.index.saturating_mul(k.int());
        (first, first.saturating_add(k.int() - 1))
    }

    /// Range of RVB ids that a level-1 node may hold, given the fetch range size.
    pub(crate) fn group_rvb_ids(&self, k: BranchingFactor, f: FetchRangeSize) -> (RvbId, RvbId) {
        let first_rvb_index = self.index.saturating_mul(k.int()).saturating_add(1);
        let last_rvb_index = first_rvb_index.saturating_add(k.int() - 1);
        (
            RvbId::new(first_rvb_index.saturating_mul(f.int())),
            RvbId::new(last_rvb_index.saturating_mul(f.int())),
        )
    }

    /// Encode the position into a single integer: the level in the top 8 bits, the index in the rest.
    pub fn id(&self) -> u64 {
        (self.level as u64) << INDEX_BITS | self.index
    }

    /// Inverse of [`id`](Self::id).
    pub fn from_id(id: u64) -> Self {
        Self::new((id >> INDEX_BITS) as u8, id & MAX_INDEX)
    }

    pub(crate) fn rvb_group_id(&self) -> RvbGroupId {
        RvbGroupId::new(self.id())
    }
}

/// A summary node (level >= 1) of the Range Validation Tree.
///
/// A summary node does not keep the raw digests of what it summarizes. It keeps their accumulated
/// value, the range of RVB ids currently covered by its descendants, and the number of its live
/// children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RvtNode {
    pub(crate) info: NodeInfo,
    pub(crate) value: HashVal,
    pub(crate) min_rvb_id: RvbId,
    pub(crate) max_rvb_id: RvbId,
    pub(crate) n_children: u64,
}

impl RvtNode {
    /// Create a node at `info` whose first descendant is `rvb_id`. The node starts out with no value and
    /// no children; the caller attaches the first child with [`add_child`](Self::add_child).
    pub(crate) fn new(info: NodeInfo, rvb_id: RvbId) -> Self {
        Self {
            info,
            value: HashVal::EMPTY,
            min_rvb_id: rvb_id,
            max_rvb_id: rvb_id,
            n_children: 0,
        }
    }

    pub fn info(&self) -> NodeInfo {
        self.info
    }

    pub fn value(&self) -> HashVal {
        self.value
    }

    pub fn min_rvb_id(&self) -> RvbId {
        self.min_rvb_id
    }

    pub fn max_rvb_id(&self) -> RvbId {
        self.max_rvb_id
    }

    pub fn n_children(&self) -> u64 {
        self.n_children
    }

    pub(crate) fn add_contribution(&mut self, contribution: HashVal) {
        self.value = self.value.combine(contribution);
    }

    pub(crate) fn remove_contribution(&mut self, contribution: HashVal) {
        self.value = self.value.uncombine(contribution);
    }

    /// Widen the covered range to include `rvb_id`.
    pub(crate) fn cover(&mut self, rvb_id: RvbId) {
        self.min_rvb_id = self.min_rvb_id.min(rvb_id);
        self.max_rvb_id = self.max_rvb_id.max(rvb_id);
    }

    pub(crate) fn covers(&self, min: RvbId, max: RvbId) -> bool {
        self.min_rvb_id <= max && min <= self.max_rvb_id
    }

    pub(crate) fn add_child(&mut self) {
        self.n_children += 1;
    }

    pub(crate) fn remove_child(&mut self) {
        self.n_children -= 1;
    }
}

/// A leaf (level 0) of the Range Validation Tree: one per live RVB.
///
/// The caller's digest is stored verbatim so that [`remove_node`](super::RangeValidationTree::remove_node)
/// can check the caller's claim before mutating the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RvbLeaf {
    pub(crate) digest: Digest,
    pub(crate) value: HashVal,
}

impl RvbLeaf {
    pub(crate) fn new(rvb_id: RvbId, digest: Digest) -> Self {
        Self {
            value: HashVal::of_rvb(rvb_id, &digest),
            digest,
        }
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn value(&self) -> HashVal {
        self.value
    }
}
