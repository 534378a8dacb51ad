/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! A full structural self-check of the Range Validation Tree.
//!
//! # Invariants
//!
//! [`validate_tree`](RangeValidationTree::validate_tree) rebuilds, from the leaves alone, what every
//! summary node should contain, and compares the result with the nodes actually stored:
//! 1. **Leaves**: every leaf id is a valid RVB id and every leaf's value is the contribution of its
//!    id and digest.
//! 2. **Sums**: the value of every summary node is the modular sum of the values of its current
//!    children, with no stale contribution from removed children.
//! 3. **Shape**: no summary node exists without a child, every node's child count and covered id
//!    range match its actual children, the top level holds exactly one node, and the root has at
//!    least two children unless it is at level 1.
//! 4. **Bookkeeping**: the node counter matches the stored nodes, and the cached minimum and maximum
//!    ids are the smallest and largest live leaves.
//!
//! The check is O(n) and is meant for diagnostics and tests, not for the steady-state path.

use std::collections::BTreeMap;

use crate::{accumulator::HashVal, types::basic::RvbId};

use super::{
    node::{NodeInfo, RvtNode},
    tree::{rvb_index, RangeValidationTree},
};

impl RangeValidationTree {
    /// Check every invariant listed in the [module-level docs](self), returning the first violation
    /// found.
    pub fn validate_tree(&self) -> Result<(), TreeValidationError> {
        let k = self.config.branching_factor;

        // 1. Leaves, and the level-1 nodes they imply.
        let mut expected: BTreeMap<u64, RvtNode> = BTreeMap::new();
        for (rvb_id, leaf) in &self.leaves {
            let rvb_index = rvb_index(&self.config, *rvb_id)
                .map_err(|_| TreeValidationError::InvalidLeaf { rvb_id: *rvb_id })?;
            if leaf.value != HashVal::of_rvb(*rvb_id, &leaf.digest) {
                return Err(TreeValidationError::LeafValueMismatch { rvb_id: *rvb_id });
            }
            let info = NodeInfo::group_of(rvb_index, k);
            expected
                .entry(info.index)
                .or_insert_with(|| RvtNode::new(info, *rvb_id))
                .absorb(*rvb_id, *rvb_id, leaf.value);
        }

        // 2, 3. Every level, bottom up.
        let mut level = 1u8;
        while !expected.is_empty() {
            let actual = self
                .levels
                .get(level as usize - 1)
                .ok_or(TreeValidationError::MissingLevel { level })?;
            compare_level(&expected, actual)?;

            let is_top = level as usize == self.levels.len();
            if is_top {
                if actual.len() != 1 {
                    return Err(TreeValidationError::RootNotUnique {
                        level,
                        n_nodes: actual.len(),
                    });
                }
                if let Some(root) = actual.values().next() {
                    if level > 1 && root.n_children < 2 {
                        return Err(TreeValidationError::RootNotCollapsed { root: root.info });
                    }
                }
                break;
            }

            let mut parents: BTreeMap<u64, RvtNode> = BTreeMap::new();
            for node in actual.values() {
                let info = node.info.parent(k);
                parents
                    .entry(info.index)
                    .or_insert_with(|| RvtNode::new(info, node.min_rvb_id))
                    .absorb(node.min_rvb_id, node.max_rvb_id, node.value);
            }
            expected = parents;
            level += 1;
        }
        if self.leaves.is_empty() && !self.levels.is_empty() {
            return Err(TreeValidationError::NodesWithoutLeaves {
                total_levels: self.levels.len(),
            });
        }

        // 4. Bookkeeping.
        let n_nodes: usize = self.levels.iter().map(|level| level.len()).sum();
        if n_nodes != self.total_nodes {
            return Err(TreeValidationError::NodeCountMismatch {
                counted: n_nodes,
                recorded: self.total_nodes,
            });
        }
        let min = self.leaves.keys().next().copied();
        let max = self.leaves.keys().next_back().copied();
        if min != self.min_rvb_id || max != self.max_rvb_id {
            return Err(TreeValidationError::RvbIdBoundsMismatch {
                expected: (min, max),
                recorded: (self.min_rvb_id, self.max_rvb_id),
            });
        }

        Ok(())
    }
}

impl RvtNode {
    /// Account for a child covering `[min, max]` with value `value`.
    fn absorb(&mut self, min: RvbId, max: RvbId, value: HashVal) {
        self.add_child();
        self.add_contribution(value);
        self.cover(min);
        self.cover(max);
    }
}

fn compare_level(
    expected: &BTreeMap<u64, RvtNode>,
    actual: &BTreeMap<u64, RvtNode>,
) -> Result<(), TreeValidationError> {
    for (index, expected_node) in expected {
        let Some(actual_node) = actual.get(index) else {
            return Err(TreeValidationError::MissingNode {
                node: expected_node.info,
            });
        };
        if actual_node.info != expected_node.info {
            return Err(TreeValidationError::MisplacedNode {
                node: actual_node.info,
            });
        }
        if actual_node.value != expected_node.value {
            return Err(TreeValidationError::ValueMismatch {
                node: actual_node.info,
            });
        }
        if actual_node.n_children != expected_node.n_children {
            return Err(TreeValidationError::ChildCountMismatch {
                node: actual_node.info,
                counted: expected_node.n_children,
                recorded: actual_node.n_children,
            });
        }
        if actual_node.min_rvb_id != expected_node.min_rvb_id
            || actual_node.max_rvb_id != expected_node.max_rvb_id
        {
            return Err(TreeValidationError::BoundsMismatch {
                node: actual_node.info,
            });
        }
    }
    if let Some(orphan) = actual.values().find(|node| !expected.contains_key(&node.info.index)) {
        return Err(TreeValidationError::ChildlessNode { node: orphan.info });
    }
    Ok(())
}

/// The first invariant violation found by [`RangeValidationTree::validate_tree`].
#[derive(Debug, PartialEq, Eq)]
pub enum TreeValidationError {
    /// A leaf is stored under an id that is not a valid RVB id.
    InvalidLeaf { rvb_id: RvbId },

    /// A leaf's value is not the contribution of its id and digest.
    LeafValueMismatch { rvb_id: RvbId },

    /// A level that should exist, because the level below it has more than one node, does not.
    MissingLevel { level: u8 },

    /// A node that should exist, because it has live children, does not.
    MissingNode { node: NodeInfo },

    /// A node is stored under an index that does not match its own position.
    MisplacedNode { node: NodeInfo },

    /// A node exists but has no live children.
    ChildlessNode { node: NodeInfo },

    /// A node's value is not the modular sum of its children's values.
    ValueMismatch { node: NodeInfo },

    /// A node's recorded child count differs from its actual number of children.
    ChildCountMismatch {
        node: NodeInfo,
        counted: u64,
        recorded: u64,
    },

    /// A node's covered id range differs from the range covered by its children.
    BoundsMismatch { node: NodeInfo },

    /// The top level holds a number of nodes other than one.
    RootNotUnique { level: u8, n_nodes: usize },

    /// The root above level 1 has a single child, so it should have been collapsed.
    RootNotCollapsed { root: NodeInfo },

    /// The tree has no leaves but still has summary levels.
    NodesWithoutLeaves { total_levels: usize },

    /// The node counter differs from the number of stored nodes.
    NodeCountMismatch { counted: usize, recorded: usize },

    /// The cached minimum or maximum id is not the smallest or largest live leaf.
    RvbIdBoundsMismatch {
        expected: (Option<RvbId>, Option<RvbId>),
        recorded: (Option<RvbId>, Option<RvbId>),
    },
}
