/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Functions that log out events.
//!
//! The logs defined in this module are printed if the user enabled them via the tree's
//! [config](crate::config::RvtConfiguration).
//!
//! The tree logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages
//! printed onto a terminal or to a file, set up a
//! [logging implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
//!
//! ## Log message format
//!
//! Log messages are CSVs (Comma Separated Values) with at least two values. The first two values are
//! always:
//! 1. The name of the [event](crate::events) in PascalCase (defined in this module as constants).
//! 2. The time the event was emitted (as number of seconds since the Unix Epoch).
//!
//! The rest of the values differ depending on the kind of event. For example, the following snippet
//! is how an [AddRvb](crate::events::AddRvbEvent) is printed:
//!
//! ```text
//! AddRvb, 1701329264, 40, fNGCJyk
//! ```
//!
//! In the snippet:
//! - The third value is the id of the added RVB.
//! - The fourth value is the first seven characters of the Base64 encoding of the root hash value
//!   after the addition.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use std::time::SystemTime;

use crate::{accumulator::HashVal, events::*};

// Names of each event in PascalCase for printing:
pub const ADD_RVB: &str = "AddRvb";
pub const REMOVE_RVB: &str = "RemoveRvb";
pub const GROW_TREE: &str = "GrowTree";
pub const SHRINK_TREE: &str = "ShrinkTree";
pub const LOAD_SNAPSHOT: &str = "LoadSnapshot";

pub const REJECT_RVB_GROUP_ID: &str = "RejectRvbGroupId";
pub const REJECT_FETCHED_GROUP: &str = "RejectFetchedGroup";

/// Implemented by event types. Used to get a closure that logs the event.
pub(crate) trait Logger {
    /// Returns a pointer to the default logging handler for a given event type.
    fn get_logger() -> Box<dyn Fn(&Self) + Send>;
}

impl Event {
    /// Log this event with the default logging handler of its type.
    pub(crate) fn log(&self) {
        match self {
            Event::AddRvb(event) => AddRvbEvent::get_logger()(event),
            Event::RemoveRvb(event) => RemoveRvbEvent::get_logger()(event),
            Event::GrowTree(event) => GrowTreeEvent::get_logger()(event),
            Event::ShrinkTree(event) => ShrinkTreeEvent::get_logger()(event),
            Event::LoadSnapshot(event) => LoadSnapshotEvent::get_logger()(event),
            Event::RejectRvbGroupId(event) => RejectRvbGroupIdEvent::get_logger()(event),
            Event::RejectFetchedGroup(event) => RejectFetchedGroupEvent::get_logger()(event),
        }
    }
}

impl Logger for AddRvbEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |add_rvb_event: &AddRvbEvent| {
            log::info!(
                "{}, {}, {}, {}",
                ADD_RVB,
                secs_since_unix_epoch(add_rvb_event.timestamp),
                add_rvb_event.rvb_id,
                first_seven_base64_chars(&add_rvb_event.root_hash)
            )
        };
        Box::new(logger)
    }
}

impl Logger for RemoveRvbEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |remove_rvb_event: &RemoveRvbEvent| {
            log::info!(
                "{}, {}, {}, {}",
                REMOVE_RVB,
                secs_since_unix_epoch(remove_rvb_event.timestamp),
                remove_rvb_event.rvb_id,
                first_seven_base64_chars(&remove_rvb_event.root_hash)
            )
        };
        Box::new(logger)
    }
}

impl Logger for GrowTreeEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |grow_tree_event: &GrowTreeEvent| {
            log::info!(
                "{}, {}, {}",
                GROW_TREE,
                secs_since_unix_epoch(grow_tree_event.timestamp),
                grow_tree_event.total_levels
            )
        };
        Box::new(logger)
    }
}

impl Logger for ShrinkTreeEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |shrink_tree_event: &ShrinkTreeEvent| {
            log::info!(
                "{}, {}, {}",
                SHRINK_TREE,
                secs_since_unix_epoch(shrink_tree_event.timestamp),
                shrink_tree_event.total_levels
            )
        };
        Box::new(logger)
    }
}

impl Logger for LoadSnapshotEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |load_snapshot_event: &LoadSnapshotEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                LOAD_SNAPSHOT,
                secs_since_unix_epoch(load_snapshot_event.timestamp),
                first_seven_base64_chars(&load_snapshot_event.root_hash),
                load_snapshot_event.total_nodes,
                load_snapshot_event.total_levels
            )
        };
        Box::new(logger)
    }
}

impl Logger for RejectRvbGroupIdEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |reject_rvb_group_id_event: &RejectRvbGroupIdEvent| {
            log::info!(
                "{}, {}, {}",
                REJECT_RVB_GROUP_ID,
                secs_since_unix_epoch(reject_rvb_group_id_event.timestamp),
                reject_rvb_group_id_event.rvb_group_id
            )
        };
        Box::new(logger)
    }
}

impl Logger for RejectFetchedGroupEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |reject_fetched_group_event: &RejectFetchedGroupEvent| {
            log::info!(
                "{}, {}, {}, {}",
                REJECT_FETCHED_GROUP,
                secs_since_unix_epoch(reject_fetched_group_event.timestamp),
                reject_fetched_group_event.rvb_group_id,
                reject_fetched_group_event.rvbs_fetched
            )
        };
        Box::new(logger)
    }
}

// Get a more readable representation of a hash value by base64-encoding it and taking the first 7 characters.
fn first_seven_base64_chars(hash_val: &HashVal) -> String {
    let encoded = STANDARD_NO_PAD.encode(hash_val.to_be_bytes());
    if encoded.len() > 7 {
        encoded[0..7].to_string()
    } else {
        encoded
    }
}

fn secs_since_unix_epoch(timestamp: SystemTime) -> u64 {
    timestamp
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}
