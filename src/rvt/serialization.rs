/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The wire and checkpoint format of a Range Validation Tree.
//!
//! A serialized tree is the [Borsh](https://borsh.io) encoding of an [`RvtSnapshot`]:
//!
//! |Field|Type|Content|
//! |---|---|---|
//! |`magic`|`[u8; 4]`|`b"RVT1"`|
//! |`version`|`u8`|`1`|
//! |`branching_factor`|`u64`|K|
//! |`fetch_range_size`|`u64`|F|
//! |`root_hash`|`[u8; 32]`|Big-endian root value|
//! |`total_nodes`|`u64`|Number of summary nodes|
//! |`total_levels`|`u64`|Number of summary levels|
//! |`leaves`|`Vec<(u64, [u8; 32])>`|Live ids and their digests, ascending|
//!
//! Loading a snapshot rebuilds the tree from its leaves and then checks the rebuilt root value, node
//! count, and level count against the ones in the header. The live tree is only replaced once every
//! check has passed.

use std::time::SystemTime;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    accumulator::HashVal,
    config::RvtConfiguration,
    events::{Event, LoadSnapshotEvent},
    types::basic::{BranchingFactor, Digest, FetchRangeSize, RvbId},
};

use super::tree::{RangeValidationTree, RvtError};

pub const SNAPSHOT_MAGIC: [u8; 4] = *b"RVT1";

pub const SNAPSHOT_VERSION: u8 = 1;

/// The serialized form of a [`RangeValidationTree`].
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct RvtSnapshot {
    pub magic: [u8; 4],
    pub version: u8,
    pub branching_factor: BranchingFactor,
    pub fetch_range_size: FetchRangeSize,
    pub root_hash: [u8; 32],
    pub total_nodes: u64,
    pub total_levels: u64,
    pub leaves: Vec<(RvbId, Digest)>,
}

impl RangeValidationTree {
    /// Capture the state of this tree.
    pub fn snapshot(&self) -> RvtSnapshot {
        RvtSnapshot {
            magic: SNAPSHOT_MAGIC,
            version: SNAPSHOT_VERSION,
            branching_factor: self.config.branching_factor,
            fetch_range_size: self.config.fetch_range_size,
            root_hash: self.get_root_hash_val().to_be_bytes(),
            total_nodes: self.total_nodes as u64,
            total_levels: self.levels.len() as u64,
            leaves: self
                .leaves
                .iter()
                .map(|(rvb_id, leaf)| (*rvb_id, leaf.digest))
                .collect(),
        }
    }

    /// Serialize this tree into bytes that [`set_serialized_rvb_data`](Self::set_serialized_rvb_data)
    /// or [`from_serialized_rvb_data`](Self::from_serialized_rvb_data) can load.
    pub fn get_serialized_rvb_data(&self) -> Result<Vec<u8>, RvtError> {
        self.snapshot()
            .try_to_vec()
            .map_err(RvtError::SerializeError)
    }

    /// Build a new tree from bytes produced by [`get_serialized_rvb_data`](Self::get_serialized_rvb_data),
    /// taking the configuration recorded in them.
    pub fn from_serialized_rvb_data(bytes: &[u8], log_events: bool) -> Result<Self, RvtError> {
        let snapshot = decode(bytes)?;
        let tree = Self::from_snapshot(&snapshot, log_events)?;
        tree.emit_load_snapshot();
        Ok(tree)
    }

    /// Replace the state of this tree with the tree serialized in `bytes`.
    ///
    /// # Error
    ///
    /// Fails, leaving this tree unchanged, if `bytes` is not a well-formed serialized tree
    /// ([`RvtError::CorruptSerializedStream`]) or was produced by a tree configured with a different
    /// branching factor or fetch range size ([`RvtError::ConfigurationMismatch`]).
    pub fn set_serialized_rvb_data(&mut self, bytes: &[u8]) -> Result<(), RvtError> {
        let snapshot = decode(bytes)?;
        let expected = (self.config.branching_factor, self.config.fetch_range_size);
        let received = (snapshot.branching_factor, snapshot.fetch_range_size);
        if expected != received {
            log::warn!(
                "Rejected serialized tree with branching factor {} and fetch range size {}",
                received.0,
                received.1
            );
            return Err(RvtError::ConfigurationMismatch { expected, received });
        }

        let mut rebuilt = Self::from_snapshot(&snapshot, self.config.log_events)?;
        rebuilt.event_publisher = self.event_publisher.take();
        *self = rebuilt;
        self.emit_load_snapshot();
        Ok(())
    }

    /// Rebuild a tree from `snapshot` and check it against the snapshot's header.
    pub fn from_snapshot(snapshot: &RvtSnapshot, log_events: bool) -> Result<Self, RvtError> {
        if snapshot.magic != SNAPSHOT_MAGIC {
            return Err(CorruptStreamError::BadMagic {
                magic: snapshot.magic,
            }
            .into());
        }
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(CorruptStreamError::UnsupportedVersion {
                version: snapshot.version,
            }
            .into());
        }

        let config = RvtConfiguration::builder()
            .branching_factor(snapshot.branching_factor)
            .fetch_range_size(snapshot.fetch_range_size)
            .log_events(false)
            .build();
        let mut tree = Self::new(config).map_err(|_| CorruptStreamError::MalformedConfiguration {
            branching_factor: snapshot.branching_factor,
            fetch_range_size: snapshot.fetch_range_size,
        })?;

        let mut previous: Option<RvbId> = None;
        for (rvb_id, digest) in &snapshot.leaves {
            if previous.map_or(false, |previous| previous >= *rvb_id) {
                return Err(CorruptStreamError::UnorderedLeaves { rvb_id: *rvb_id }.into());
            }
            tree.add_node(*rvb_id, digest)
                .map_err(|_| CorruptStreamError::InvalidLeaf { rvb_id: *rvb_id })?;
            previous = Some(*rvb_id);
        }

        let root_hash = HashVal::try_from_be_bytes(snapshot.root_hash)
            .ok_or(CorruptStreamError::HeaderMismatch { field: "root_hash" })?;
        if tree.get_root_hash_val() != root_hash {
            return Err(CorruptStreamError::HeaderMismatch { field: "root_hash" }.into());
        }
        if tree.total_nodes() as u64 != snapshot.total_nodes {
            return Err(CorruptStreamError::HeaderMismatch {
                field: "total_nodes",
            }
            .into());
        }
        if tree.total_levels() as u64 != snapshot.total_levels {
            return Err(CorruptStreamError::HeaderMismatch {
                field: "total_levels",
            }
            .into());
        }

        tree.config.log_events = log_events;
        Ok(tree)
    }

    fn emit_load_snapshot(&self) {
        self.emit(Event::LoadSnapshot(LoadSnapshotEvent {
            timestamp: SystemTime::now(),
            root_hash: self.get_root_hash_val(),
            total_nodes: self.total_nodes(),
            total_levels: self.total_levels(),
        }));
    }
}

fn decode(bytes: &[u8]) -> Result<RvtSnapshot, RvtError> {
    RvtSnapshot::try_from_slice(bytes).map_err(|err| {
        log::warn!("Rejected serialized tree: {}", err);
        CorruptStreamError::Decode {
            reason: err.to_string(),
        }
        .into()
    })
}

/// Enumerates the structural and consistency checks that a serialized tree can fail.
#[derive(Debug, PartialEq, Eq)]
pub enum CorruptStreamError {
    /// The bytes are not the Borsh encoding of an [`RvtSnapshot`], or have trailing bytes.
    Decode { reason: String },

    /// The snapshot does not start with [`SNAPSHOT_MAGIC`].
    BadMagic { magic: [u8; 4] },

    /// The snapshot was written in a format version this crate does not read.
    UnsupportedVersion { version: u8 },

    /// The recorded branching factor or fetch range size cannot configure a tree.
    MalformedConfiguration {
        branching_factor: BranchingFactor,
        fetch_range_size: FetchRangeSize,
    },

    /// A recorded leaf id is not a valid RVB id for the recorded configuration.
    InvalidLeaf { rvb_id: RvbId },

    /// Leaf ids are not strictly ascending; this includes duplicates.
    UnorderedLeaves { rvb_id: RvbId },

    /// The tree rebuilt from the leaves disagrees with the header on `field`.
    HeaderMismatch { field: &'static str },
}
