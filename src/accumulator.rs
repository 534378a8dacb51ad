/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The modular accumulator used to combine child values into the value of their parent.
//!
//! A [`HashVal`] is an element of the integers modulo the prime `p = 2^256 - 189`. Two operations are
//! defined on it:
//! - [`combine`](HashVal::combine): modular addition, and
//! - [`uncombine`](HashVal::uncombine): modular subtraction.
//!
//! Because addition modulo `p` is commutative and associative, and subtraction is its exact inverse,
//! an ancestor's value can be updated in O(1) when one of its descendants is added or removed,
//! without re-reading the values of its other children, and independently of the order in which
//! those updates happen:
//!
//! ```text
//! v.combine(a).combine(b) == v.combine(b).combine(a)
//! v.combine(a).uncombine(a) == v
//! ```

use std::fmt::{self, Debug, Display, Formatter};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use uint::construct_uint;

use crate::types::{
    basic::{Digest, RvbId},
    crypto_primitives::rvb_hash,
};

construct_uint! {
    /// 256-bit unsigned integer backing [`HashVal`].
    pub(crate) struct U256(4);
}

/// The largest prime below 2^256, i.e., 2^256 - 189, in little-endian 64-bit words.
const MODULUS: U256 = U256([0xFFFF_FFFF_FFFF_FF43, u64::MAX, u64::MAX, u64::MAX]);

/// Accumulated value of a node of the Range Validation Tree.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HashVal(U256);

impl HashVal {
    /// The identity of [`combine`](Self::combine). Also the root value of an empty tree.
    pub const EMPTY: HashVal = HashVal(U256([0, 0, 0, 0]));

    /// Interpret `bytes` as a big-endian integer, reduced modulo `p`.
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(reduce(U256::from_big_endian(&bytes)))
    }

    /// The big-endian encoding of this value.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        self.0.to_big_endian(&mut bytes);
        bytes
    }

    /// Like [`from_be_bytes`](Self::from_be_bytes), but fails if `bytes` encodes an integer that is not
    /// already reduced modulo `p`, so that every accepted encoding is canonical.
    pub fn try_from_be_bytes(bytes: [u8; 32]) -> Option<Self> {
        let int = U256::from_big_endian(&bytes);
        if int < MODULUS {
            Some(Self(int))
        } else {
            None
        }
    }

    /// The contribution of an RVB leaf: the hash of its id and digest, read as an integer.
    pub fn of_rvb(rvb_id: RvbId, digest: &Digest) -> Self {
        Self::from_be_bytes(rvb_hash(rvb_id, digest))
    }

    /// `self + contribution (mod p)`.
    pub fn combine(self, contribution: HashVal) -> HashVal {
        let (sum, overflowed) = self.0.overflowing_add(contribution.0);
        if overflowed || sum >= MODULUS {
            // Both operands are below p, so the true sum is below 2p and a single wrapping
            // subtraction lands in [0, p).
            HashVal(sum.overflowing_sub(MODULUS).0)
        } else {
            HashVal(sum)
        }
    }

    /// `self - contribution (mod p)`.
    pub fn uncombine(self, contribution: HashVal) -> HashVal {
        let (difference, underflowed) = self.0.overflowing_sub(contribution.0);
        if underflowed {
            HashVal(difference.overflowing_add(MODULUS).0)
        } else {
            HashVal(difference)
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Accumulate `contributions`, starting from the identity.
    pub fn sum<I: IntoIterator<Item = HashVal>>(contributions: I) -> HashVal {
        contributions
            .into_iter()
            .fold(HashVal::EMPTY, |acc, contribution| acc.combine(contribution))
    }
}

fn reduce(int: U256) -> U256 {
    if int >= MODULUS {
        int - MODULUS
    } else {
        int
    }
}

impl Display for HashVal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", STANDARD_NO_PAD.encode(self.to_be_bytes()))
    }
}

impl Debug for HashVal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "HashVal({})", self)
    }
}
