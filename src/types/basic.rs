/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The types defined in [`crate::types::basic`] are "inert" types, i.e., those that are passed around
//! and inspected, but have no active behavior. They follow the newtype pattern and the API for using
//! them is defined in this module.

use borsh::{BorshDeserialize, BorshSerialize};
use std::{
    fmt::{self, Debug, Display, Formatter},
    ops::{Add, Sub},
};

/// Identifier of a Range Validation Block (RVB), i.e., a fixed-size range of the replicated log.
///
/// Valid ids are positive multiples of the tree's [`FetchRangeSize`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize,
)]
pub struct RvbId(u64);

impl RvbId {
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    pub const fn int(&self) -> u64 {
        self.0
    }

    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl Display for RvbId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<u64> for RvbId {
    fn from(value: u64) -> Self {
        RvbId::new(value)
    }
}

impl Add<u64> for RvbId {
    type Output = RvbId;
    fn add(self, rhs: u64) -> Self::Output {
        RvbId::new(self.0 + rhs)
    }
}

impl Sub<u64> for RvbId {
    type Output = RvbId;
    fn sub(self, rhs: u64) -> Self::Output {
        RvbId::new(self.0 - rhs)
    }
}

/// Caller-supplied cryptographic summary of the block range identified by an [`RvbId`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, BorshDeserialize, BorshSerialize)]
pub struct Digest([u8; 32]);

impl Digest {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Build a digest from an arbitrary byte string. Strings shorter than 32 bytes are zero-padded,
    /// longer strings are truncated.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut digest = [0u8; 32];
        let len = bytes.len().min(digest.len());
        digest[..len].copy_from_slice(&bytes[..len]);
        Self(digest)
    }
}

impl Debug for Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Maximum number of children of a summary node, and maximum number of members of an RVB group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct BranchingFactor(u64);

impl BranchingFactor {
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    pub const fn int(&self) -> u64 {
        self.0
    }
}

impl From<u64> for BranchingFactor {
    fn from(value: u64) -> Self {
        BranchingFactor::new(value)
    }
}

impl Display for BranchingFactor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Stride between two consecutive [`RvbId`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct FetchRangeSize(u64);

impl FetchRangeSize {
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    pub const fn int(&self) -> u64 {
        self.0
    }
}

impl From<u64> for FetchRangeSize {
    fn from(value: u64) -> Self {
        FetchRangeSize::new(value)
    }
}

impl Display for FetchRangeSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Identifier of an RVB group: the set of up to K leaves that share a level-1 parent.
///
/// The identifier is the [node id](crate::rvt::node::NodeInfo::id) of that parent, so it can be
/// checked structurally (its level must be 1) before being looked up.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize,
)]
pub struct RvbGroupId(u64);

impl RvbGroupId {
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    pub const fn int(&self) -> u64 {
        self.0
    }
}

impl Display for RvbGroupId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}
