/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The Range Validation Tree (RVT): an incrementally maintained accumulator tree over the digests of
//! a sliding window of Range Validation Blocks (RVBs).
//!
//! # Shape
//!
//! ```text
//! level 2                    [2,0]                      <- root
//!                        /          \
//! level 1           [1,0]            [1,1]              <- RVB groups
//!                 /   |   \            |
//! level 0        4    8    12          16               <- leaves (RVB ids), K = 3, F = 4
//! ```
//!
//! - **Leaves** (level 0) are the live RVB ids, each holding the digest it was added with.
//! - **Summary nodes** (levels 1 and up) are positioned by `(level, index)`. A level-1 node summarizes
//!   the up to K leaves of one RVB group, a level-`l` node summarizes up to K nodes of level `l - 1`.
//!   A summary node's value is the modular sum ([`HashVal::combine`](crate::accumulator::HashVal::combine))
//!   of its children's values.
//! - The **root** is the single node of the highest level, which is always the lowest level at which
//!   every live leaf shares an ancestor.
//!
//! [`total_nodes`](RangeValidationTree::total_nodes) and [`total_levels`](RangeValidationTree::total_levels)
//! count summary nodes and summary levels. A tree with a single leaf has one node (its group, which is
//! also the root) and one level; the tree pictured above has three nodes and two levels.
//!
//! # Updates
//!
//! Adding or removing a leaf touches only the leaf's ancestors: each ancestor's value is updated in O(1)
//! by combining in, or uncombining out, the leaf's contribution. Both operations are O(log_K n).
//!
//! Levels are grown and collapsed lazily:
//! - When a new leaf's ancestor at the root level is not the root, the root level has two nodes, and a
//!   new level is created above it. This repeats until the two branches meet.
//! - When a removal leaves the root with a single child, the root is discarded and the child becomes
//!   the new root. This repeats until the root has at least two children or is at level 1.
//!
//! # Submodules
//!
//! - [`node`]: node positions and node types.
//! - [`tree`]: the tree, its mutators and accessors, and [`RvtError`].
//! - [`groups`]: RVB group queries.
//! - [`invariants`]: [`validate_tree`](RangeValidationTree::validate_tree).
//! - [`serialization`]: the wire and checkpoint format.

pub mod groups;

pub mod invariants;

pub mod node;

pub mod serialization;

pub mod tree;

pub use tree::{RangeValidationTree, RvtError};
