/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The [`RangeValidationTree`] struct: node creation and deletion as the RVB window slides, root
//! bookkeeping, and O(1) accessors.

use std::{
    collections::{btree_map, BTreeMap},
    sync::mpsc::Sender,
    time::SystemTime,
};

use crate::{
    accumulator::HashVal,
    config::RvtConfiguration,
    events::*,
    types::basic::{BranchingFactor, Digest, FetchRangeSize, RvbGroupId, RvbId},
};

use super::{
    node::{NodeInfo, RvbLeaf, RvtNode, MAX_INDEX},
    serialization::CorruptStreamError,
};

/// An incrementally maintained accumulator tree over the digests of a window of RVBs.
///
/// See the [module-level docs](super) for the shape of the tree.
///
/// The tree is not internally synchronized. Callers that share it between threads must serialize
/// every access, e.g., by wrapping it in a `Mutex`.
pub struct RangeValidationTree {
    pub(crate) config: RvtConfiguration,

    /// Level 0: the live RVBs.
    pub(crate) leaves: BTreeMap<RvbId, RvbLeaf>,

    /// Levels 1 and up, `levels[l - 1]` holding the nodes of level `l` keyed by index. The last level
    /// always holds exactly one node, the root, unless the tree is empty, in which case there are no
    /// levels.
    pub(crate) levels: Vec<BTreeMap<u64, RvtNode>>,

    pub(crate) total_nodes: usize,
    pub(crate) min_rvb_id: Option<RvbId>,
    pub(crate) max_rvb_id: Option<RvbId>,

    pub(crate) event_publisher: Option<Sender<Event>>,
}

impl RangeValidationTree {
    /// Create an empty tree.
    ///
    /// # Error
    ///
    /// Returns [`RvtError::MalformedConfiguration`] if `config.branching_factor < 2` or
    /// `config.fetch_range_size == 0`.
    pub fn new(config: RvtConfiguration) -> Result<Self, RvtError> {
        if !config.is_valid() {
            log::debug!(
                "Rejected tree configuration with branching factor {} and fetch range size {}",
                config.branching_factor,
                config.fetch_range_size
            );
            return Err(RvtError::MalformedConfiguration {
                branching_factor: config.branching_factor,
                fetch_range_size: config.fetch_range_size,
            });
        }

        Ok(Self {
            config,
            leaves: BTreeMap::new(),
            levels: Vec::new(),
            total_nodes: 0,
            min_rvb_id: None,
            max_rvb_id: None,
            event_publisher: None,
        })
    }

    /// Send every subsequent [`Event`] of this tree to `event_publisher`.
    pub fn set_event_publisher(&mut self, event_publisher: Sender<Event>) {
        self.event_publisher = Some(event_publisher);
    }

    /// Add a leaf for `rvb_id` and apply the contribution of `digest` to every one of its ancestors,
    /// creating the ancestors that do not exist yet.
    ///
    /// If the root would have to summarize more than K children to host the new leaf, new levels are
    /// created above it until a single node covers the whole tree again.
    ///
    /// # Error
    ///
    /// Fails, leaving the tree unchanged, if `rvb_id` is not a valid RVB id
    /// ([`RvtError::InvalidRvbId`]) or is already live ([`RvtError::DuplicateRvbId`]).
    pub fn add_node(&mut self, rvb_id: RvbId, digest: &Digest) -> Result<(), RvtError> {
        let rvb_index = rvb_index(&self.config, rvb_id)?;
        if self.leaves.contains_key(&rvb_id) {
            log::debug!("Rejected addition of RVB {}: already live", rvb_id);
            return Err(RvtError::DuplicateRvbId { rvb_id });
        }

        let leaf = RvbLeaf::new(rvb_id, *digest);
        let contribution = leaf.value;
        self.leaves.insert(rvb_id, leaf);

        let k = self.config.branching_factor;
        let levels_before = self.levels.len();
        let mut info = NodeInfo::group_of(rvb_index, k);
        let mut child_is_new = true;
        loop {
            let created = self.attach(info, rvb_id, contribution, child_is_new);
            if info.level as usize == self.levels.len() {
                if self.levels[info.level as usize - 1].len() == 1 {
                    break;
                }
                self.lift_root(info);
            }
            child_is_new = created;
            info = info.parent(k);
        }

        self.min_rvb_id = Some(self.min_rvb_id.map_or(rvb_id, |min| min.min(rvb_id)));
        self.max_rvb_id = Some(self.max_rvb_id.map_or(rvb_id, |max| max.max(rvb_id)));

        self.emit(Event::AddRvb(AddRvbEvent {
            timestamp: SystemTime::now(),
            rvb_id,
            root_hash: self.get_root_hash_val(),
        }));
        if levels_before > 0 && self.levels.len() > levels_before {
            self.emit(Event::GrowTree(GrowTreeEvent {
                timestamp: SystemTime::now(),
                total_levels: self.levels.len(),
            }));
        }

        Ok(())
    }

    /// Remove the leaf for `rvb_id` and its contribution from every one of its ancestors. Ancestors left
    /// with no children are deleted, and the root is collapsed into its child for as long as it has
    /// only one.
    ///
    /// # Error
    ///
    /// Fails, leaving the tree unchanged, if `rvb_id` is not a valid RVB id
    /// ([`RvtError::InvalidRvbId`]), is not live ([`RvtError::RvbIdNotFound`]), or was added with a
    /// digest different from `digest` ([`RvtError::DigestMismatch`]).
    pub fn remove_node(&mut self, rvb_id: RvbId, digest: &Digest) -> Result<(), RvtError> {
        let rvb_index = rvb_index(&self.config, rvb_id)?;
        let contribution = match self.leaves.get(&rvb_id) {
            Some(leaf) if leaf.digest == *digest => leaf.value,
            Some(_) => {
                log::debug!("Rejected removal of RVB {}: digest mismatch", rvb_id);
                return Err(RvtError::DigestMismatch { rvb_id });
            }
            None => return Err(RvtError::RvbIdNotFound { rvb_id }),
        };
        self.leaves.remove(&rvb_id);

        let k = self.config.branching_factor;
        let levels_before = self.levels.len();
        let mut info = NodeInfo::group_of(rvb_index, k);
        let mut child_removed = true;
        while info.level as usize <= self.levels.len() {
            let bounds = self.children_bounds(info);
            let level = &mut self.levels[info.level as usize - 1];
            let Some(node) = level.get_mut(&info.index) else {
                break;
            };
            node.remove_contribution(contribution);
            if child_removed {
                node.remove_child();
            }
            match bounds {
                Some((min, max)) => {
                    node.min_rvb_id = min;
                    node.max_rvb_id = max;
                    child_removed = false;
                }
                None => {
                    level.remove(&info.index);
                    self.total_nodes -= 1;
                    child_removed = true;
                }
            }
            info = info.parent(k);
        }

        while self.levels.last().map_or(false, |top| top.is_empty()) {
            self.levels.pop();
        }
        while self.levels.len() > 1 && self.root().map_or(false, |root| root.n_children == 1) {
            self.levels.pop();
            self.total_nodes -= 1;
        }

        if self.min_rvb_id == Some(rvb_id) {
            self.min_rvb_id = self.leaves.keys().next().copied();
        }
        if self.max_rvb_id == Some(rvb_id) {
            self.max_rvb_id = self.leaves.keys().next_back().copied();
        }

        self.emit(Event::RemoveRvb(RemoveRvbEvent {
            timestamp: SystemTime::now(),
            rvb_id,
            root_hash: self.get_root_hash_val(),
        }));
        if !self.levels.is_empty() && self.levels.len() < levels_before {
            self.emit(Event::ShrinkTree(ShrinkTreeEvent {
                timestamp: SystemTime::now(),
                total_levels: self.levels.len(),
            }));
        }

        Ok(())
    }

    /// Number of summary nodes (levels 1 and up) in the tree.
    pub fn total_nodes(&self) -> usize {
        self.total_nodes
    }

    /// Number of summary levels in the tree, i.e., the level of the root.
    pub fn total_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn get_min_rvb_id(&self) -> Option<RvbId> {
        self.min_rvb_id
    }

    pub fn get_max_rvb_id(&self) -> Option<RvbId> {
        self.max_rvb_id
    }

    /// The accumulated value of the root, or [`HashVal::EMPTY`] if the tree is empty.
    pub fn get_root_hash_val(&self) -> HashVal {
        self.root().map_or(HashVal::EMPTY, |root| root.value)
    }

    /// The accumulated value of the level-1 parent of the leaf for `rvb_id`, or `None` if `rvb_id` is
    /// not live. Live ids in the same RVB group share the same value.
    pub fn get_direct_parent_hash_val(&self, rvb_id: RvbId) -> Option<HashVal> {
        if !self.leaves.contains_key(&rvb_id) {
            return None;
        }
        let rvb_index = rvb_index(&self.config, rvb_id).ok()?;
        let group = NodeInfo::group_of(rvb_index, self.config.branching_factor);
        self.node(group).map(|node| node.value)
    }

    pub fn config(&self) -> &RvtConfiguration {
        &self.config
    }

    pub fn branching_factor(&self) -> BranchingFactor {
        self.config.branching_factor
    }

    pub fn fetch_range_size(&self) -> FetchRangeSize {
        self.config.fetch_range_size
    }

    pub fn contains(&self, rvb_id: RvbId) -> bool {
        self.leaves.contains_key(&rvb_id)
    }

    /// The digest `rvb_id` was added with, if it is live.
    pub fn digest(&self, rvb_id: RvbId) -> Option<&Digest> {
        self.leaves.get(&rvb_id).map(|leaf| &leaf.digest)
    }

    /// Live RVB ids in ascending order.
    pub fn rvb_ids(&self) -> impl Iterator<Item = RvbId> + '_ {
        self.leaves.keys().copied()
    }

    /// The root node, if the tree is not empty.
    pub fn root(&self) -> Option<&RvtNode> {
        self.levels.last().and_then(|top| top.values().next())
    }

    /// The summary node at `info`, if it exists.
    pub fn node(&self, info: NodeInfo) -> Option<&RvtNode> {
        if info.level == 0 {
            return None;
        }
        self.levels
            .get(info.level as usize - 1)
            .and_then(|level| level.get(&info.index))
    }

    pub(crate) fn emit(&self, event: Event) {
        if self.config.log_events {
            event.log();
        }
        Event::publish(&self.event_publisher, event);
    }

    /// Apply `contribution` to the node at `info`, creating it if necessary. Returns whether the node
    /// was created.
    fn attach(
        &mut self,
        info: NodeInfo,
        rvb_id: RvbId,
        contribution: HashVal,
        child_is_new: bool,
    ) -> bool {
        if self.levels.len() < info.level as usize {
            self.levels.push(BTreeMap::new());
        }
        let mut created = false;
        let node = self.levels[info.level as usize - 1]
            .entry(info.index)
            .or_insert_with(|| {
                created = true;
                RvtNode::new(info, rvb_id)
            });
        if child_is_new {
            node.add_child();
        }
        node.add_contribution(contribution);
        node.cover(rvb_id);
        if created {
            self.total_nodes += 1;
        }
        created
    }

    /// The top level has just received a second node, `new_node`. Create a level above it that holds
    /// the parent of the old root.
    fn lift_root(&mut self, new_node: NodeInfo) {
        let k = self.config.branching_factor;
        let old_root = self.levels[new_node.level as usize - 1]
            .values()
            .find(|node| node.info != new_node)
            .cloned();
        if let Some(old_root) = old_root {
            let mut parent = RvtNode::new(old_root.info.parent(k), old_root.min_rvb_id);
            parent.cover(old_root.max_rvb_id);
            parent.add_contribution(old_root.value);
            parent.add_child();
            self.levels
                .push(BTreeMap::from([(parent.info.index, parent)]));
            self.total_nodes += 1;
        }
    }

    /// The live leaves that a level-1 node at `info` may hold.
    pub(crate) fn group_leaves(&self, info: NodeInfo) -> btree_map::Range<'_, RvbId, RvbLeaf> {
        let (first, last) =
            info.group_rvb_ids(self.config.branching_factor, self.config.fetch_range_size);
        self.leaves.range(first..=last)
    }

    /// The live children of the node at `info`, which must be at level 2 or higher.
    pub(crate) fn child_nodes(&self, info: NodeInfo) -> btree_map::Range<'_, u64, RvtNode> {
        let (first, last) = info.child_indices(self.config.branching_factor);
        self.levels[info.level as usize - 2].range(first..=last)
    }

    /// The smallest and largest RVB ids currently covered by the children of the node at `info`, or
    /// `None` if it has no children.
    fn children_bounds(&self, info: NodeInfo) -> Option<(RvbId, RvbId)> {
        if info.level == 1 {
            let mut leaves = self.group_leaves(info).map(|(rvb_id, _)| *rvb_id);
            let min = leaves.next()?;
            let max = leaves.next_back().unwrap_or(min);
            Some((min, max))
        } else {
            let mut children = self.child_nodes(info).map(|(_, node)| node);
            let first = children.next()?;
            let last = children.next_back().unwrap_or(first);
            Some((first.min_rvb_id, last.max_rvb_id))
        }
    }
}

/// The 1-based index of `rvb_id` among the RVB ids of a tree configured with `config`.
///
/// # Error
///
/// Returns [`RvtError::InvalidRvbId`] if `rvb_id` is not a positive multiple of the fetch range size, or
/// if its RVB group would not be addressable by an [`RvbGroupId`].
pub(crate) fn rvb_index(config: &RvtConfiguration, rvb_id: RvbId) -> Result<u64, RvtError> {
    let f = config.fetch_range_size.int();
    if rvb_id.int() == 0 || rvb_id.int() % f != 0 {
        return Err(RvtError::InvalidRvbId { rvb_id });
    }
    let rvb_index = rvb_id.int() / f;
    if (rvb_index - 1) / config.branching_factor.int() > MAX_INDEX {
        return Err(RvtError::InvalidRvbId { rvb_id });
    }
    Ok(rvb_index)
}

/// Enumerates the different ways an operation on a [`RangeValidationTree`] can fail. Every failing
/// operation leaves the tree as it was before the call.
#[derive(Debug)]
pub enum RvtError {
    /// The tree was configured with a branching factor lower than 2 or a fetch range size of 0.
    MalformedConfiguration {
        branching_factor: BranchingFactor,
        fetch_range_size: FetchRangeSize,
    },

    /// The id is not a positive multiple of the fetch range size, or is too large to be placed in the
    /// tree.
    InvalidRvbId { rvb_id: RvbId },

    /// An attempt was made to add an id that is already live.
    DuplicateRvbId { rvb_id: RvbId },

    /// An attempt was made to remove an id that is not live.
    RvbIdNotFound { rvb_id: RvbId },

    /// An attempt was made to remove an id with a digest different from the one it was added with.
    DigestMismatch { rvb_id: RvbId },

    /// A group id does not identify a live RVB group.
    InvalidRvbGroupId { rvb_group_id: RvbGroupId },

    /// See: [`CorruptStreamError`].
    CorruptSerializedStream(CorruptStreamError),

    /// A serialized tree was loaded into a tree with a different configuration.
    ConfigurationMismatch {
        expected: (BranchingFactor, FetchRangeSize),
        received: (BranchingFactor, FetchRangeSize),
    },

    /// Writing the serialized tree failed.
    SerializeError(std::io::Error),
}

impl From<CorruptStreamError> for RvtError {
    fn from(value: CorruptStreamError) -> Self {
        RvtError::CorruptSerializedStream(value)
    }
}
