//! Helpers for building trees over RVB ids with predictable digests.

use rand::Rng;

use rvt_rs::{
    config::RvtConfiguration,
    rvt::RangeValidationTree,
    types::basic::{Digest, RvbId},
};

/// The digest the tests add `rvb_id` with: the decimal representation of the id, zero-padded.
pub(crate) fn digest_of(rvb_id: u64) -> Digest {
    Digest::from_slice(rvb_id.to_string().as_bytes())
}

/// Create an empty tree with branching factor `k` and fetch range size `f`.
pub(crate) fn new_tree(k: u64, f: u64) -> RangeValidationTree {
    let config = RvtConfiguration::builder()
        .branching_factor(k)
        .fetch_range_size(f)
        .build();
    RangeValidationTree::new(config).unwrap()
}

/// Create a tree with branching factor `k` and fetch range size `f` holding every id in `rvb_ids`.
pub(crate) fn tree_with_ids(
    k: u64,
    f: u64,
    rvb_ids: impl IntoIterator<Item = u64>,
) -> RangeValidationTree {
    let mut rvt = new_tree(k, f);
    for rvb_id in rvb_ids {
        add(&mut rvt, rvb_id);
    }
    rvt
}

pub(crate) fn add(rvt: &mut RangeValidationTree, rvb_id: u64) {
    rvt.add_node(RvbId::new(rvb_id), &digest_of(rvb_id)).unwrap();
}

pub(crate) fn remove(rvt: &mut RangeValidationTree, rvb_id: u64) {
    rvt.remove_node(RvbId::new(rvb_id), &digest_of(rvb_id)).unwrap();
}

/// The first `n` RVB ids for fetch range size `f`.
pub(crate) fn first_ids(f: u64, n: u64) -> impl Iterator<Item = u64> {
    (1..=n).map(move |i| i * f)
}

/// A random number in `[min, max]`, rounded down to a multiple of `in_multiple_of` if it is non-zero.
pub(crate) fn random_num(min: u64, max: u64, in_multiple_of: u64) -> u64 {
    let num = rand::thread_rng().gen_range(min, max + 1);
    if in_multiple_of != 0 {
        num - num % in_multiple_of
    } else {
        num
    }
}

/// A random branching factor in `[3, 10]` and a random fetch range size in `[4, 20]`.
pub(crate) fn random_k_and_f() -> (u64, u64) {
    (random_num(3, 10, 0), random_num(4, 20, 0))
}

/// Number of summary levels of a tree holding the first `n` ids: the smallest `l >= 1` with `k^l >= n`.
pub(crate) fn expected_levels(k: u64, n: u64) -> usize {
    let mut levels = 1;
    let mut capacity = k as u128;
    while capacity < n as u128 {
        capacity *= k as u128;
        levels += 1;
    }
    levels
}

/// Number of summary nodes of a tree holding the first `n` ids: `ceil(n / k^l)` nodes at every level `l`.
pub(crate) fn expected_nodes(k: u64, n: u64) -> usize {
    let levels = expected_levels(k, n);
    let mut nodes = 0;
    let mut span = 1u128;
    for _ in 0..levels {
        span *= k as u128;
        nodes += ((n as u128 + span - 1) / span) as usize;
    }
    nodes
}
