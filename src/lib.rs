/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! A Rust implementation of the Range Validation Tree (RVT), the structure a BFT state machine
//! replication engine uses during state transfer to validate block ranges fetched from peers.
//!
//! The replicated log is cut into fixed-size, non-overlapping ranges called Range Validation Blocks
//! (RVBs), identified by multiples of a configured fetch range size. The RVT accumulates the digests
//! of a sliding window of RVBs into a tree whose root value two replicas can compare to know whether
//! their windows agree, and whose group values let a lagging replica validate a batch of fetched RVBs
//! without the rest of the window.
//!
//! The RVT is incremental: adding an RVB at the advancing edge of the log, or pruning one at the
//! trailing edge, only updates the O(log n) ancestors of its leaf, each in O(1), using a
//! [modular accumulator](accumulator) instead of re-hashing siblings.
//!
//! ## Getting started
//!
//! ```
//! use rvt_rs::{
//!     config::RvtConfiguration,
//!     rvt::RangeValidationTree,
//!     types::basic::{Digest, RvbId},
//! };
//!
//! let config = RvtConfiguration::builder()
//!     .branching_factor(3)
//!     .fetch_range_size(4)
//!     .build();
//! let mut rvt = RangeValidationTree::new(config).unwrap();
//!
//! for id in (4..=16).step_by(4) {
//!     rvt.add_node(RvbId::new(id), &Digest::from_slice(id.to_string().as_bytes())).unwrap();
//! }
//! assert_eq!(rvt.total_levels(), 2);
//! assert_eq!(rvt.total_nodes(), 3);
//!
//! let bytes = rvt.get_serialized_rvb_data().unwrap();
//! let copy = RangeValidationTree::from_serialized_rvb_data(&bytes, false).unwrap();
//! assert_eq!(copy.get_root_hash_val(), rvt.get_root_hash_val());
//! ```
//!
//! ## Modules
//!
//! - [`rvt`]: the tree.
//! - [`accumulator`]: the value type the tree accumulates.
//! - [`rvb_sync`]: fetch planning and fetched-data validation on top of the tree.
//! - [`config`], [`events`], [`logging`]: configuration and observability.
//! - [`types`]: identifiers and digests.

pub mod accumulator;

pub mod config;

pub mod events;

pub mod logging;

pub mod rvb_sync;

pub mod rvt;

pub mod types;
