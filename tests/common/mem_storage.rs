//! A simple, volatile, in-memory implementation of [`RvbDigestSource`].

use std::collections::BTreeMap;

use rvt_rs::{
    rvb_sync::RvbDigestSource,
    types::basic::{Digest, RvbId},
};

use super::rvb::digest_of;

/// An in-memory store of RVB digests.
#[derive(Clone, Default)]
pub(crate) struct MemStorage(BTreeMap<RvbId, Digest>);

impl MemStorage {
    /// Create a `MemStorage` holding the default digest of every id in `rvb_ids`.
    pub(crate) fn with_rvb_ids(rvb_ids: impl IntoIterator<Item = u64>) -> MemStorage {
        MemStorage(
            rvb_ids
                .into_iter()
                .map(|rvb_id| (RvbId::new(rvb_id), digest_of(rvb_id)))
                .collect(),
        )
    }

    pub(crate) fn set(&mut self, rvb_id: u64, digest: Digest) {
        self.0.insert(RvbId::new(rvb_id), digest);
    }

    pub(crate) fn delete(&mut self, rvb_id: u64) {
        self.0.remove(&RvbId::new(rvb_id));
    }

    /// The ids and digests of `rvb_ids`, as a peer would send them in response to a fetch.
    pub(crate) fn fetch(&self, rvb_ids: &[RvbId]) -> Vec<(RvbId, Digest)> {
        rvb_ids
            .iter()
            .filter_map(|rvb_id| self.0.get(rvb_id).map(|digest| (*rvb_id, *digest)))
            .collect()
    }
}

impl RvbDigestSource for MemStorage {
    fn rvb_digest(&self, rvb_id: RvbId) -> Option<Digest> {
        self.0.get(&rvb_id).copied()
    }
}
