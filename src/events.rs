/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions of Range Validation Tree events for event handling and logging.
//! Note: an event for a given action indicates that the action has been completed.
//!
//! Register a channel with [`RangeValidationTree::set_event_publisher`](crate::rvt::RangeValidationTree::set_event_publisher)
//! to receive events, and/or enable [`log_events`](crate::config::RvtConfiguration::log_events) to have
//! them [logged](crate::logging).

use std::sync::mpsc::Sender;
use std::time::SystemTime;

use crate::accumulator::HashVal;
use crate::types::basic::{RvbGroupId, RvbId};

#[derive(Clone, Debug)]
pub enum Event {
    // Events that change the tree.
    AddRvb(AddRvbEvent),
    RemoveRvb(RemoveRvbEvent),
    GrowTree(GrowTreeEvent),
    ShrinkTree(ShrinkTreeEvent),
    LoadSnapshot(LoadSnapshotEvent),
    // Events that reject data received from a peer.
    RejectRvbGroupId(RejectRvbGroupIdEvent),
    RejectFetchedGroup(RejectFetchedGroupEvent),
}

impl Event {
    pub(crate) fn publish(event_publisher: &Option<Sender<Event>>, event: Event) {
        if let Some(event_publisher) = event_publisher {
            // A subscriber that hung up does not affect the tree.
            let _ = event_publisher.send(event);
        }
    }
}

#[derive(Clone, Debug)]
pub struct AddRvbEvent {
    pub timestamp: SystemTime,
    pub rvb_id: RvbId,
    pub root_hash: HashVal,
}

#[derive(Clone, Debug)]
pub struct RemoveRvbEvent {
    pub timestamp: SystemTime,
    pub rvb_id: RvbId,
    pub root_hash: HashVal,
}

#[derive(Clone, Debug)]
pub struct GrowTreeEvent {
    pub timestamp: SystemTime,
    pub total_levels: usize,
}

#[derive(Clone, Debug)]
pub struct ShrinkTreeEvent {
    pub timestamp: SystemTime,
    pub total_levels: usize,
}

#[derive(Clone, Debug)]
pub struct LoadSnapshotEvent {
    pub timestamp: SystemTime,
    pub root_hash: HashVal,
    pub total_nodes: usize,
    pub total_levels: usize,
}

#[derive(Clone, Debug)]
pub struct RejectRvbGroupIdEvent {
    pub timestamp: SystemTime,
    pub rvb_group_id: RvbGroupId,
}

#[derive(Clone, Debug)]
pub struct RejectFetchedGroupEvent {
    pub timestamp: SystemTime,
    pub rvb_group_id: RvbGroupId,
    pub rvbs_fetched: usize,
}
