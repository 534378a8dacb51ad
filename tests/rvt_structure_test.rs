//! Tests of the shape of the Range Validation Tree as leaves are added and removed.

use std::sync::mpsc;

use log::LevelFilter;
use rand::{seq::SliceRandom, thread_rng};

use rvt_rs::{
    accumulator::HashVal,
    config::RvtConfiguration,
    events::Event,
    rvt::{RangeValidationTree, RvtError},
    types::basic::{Digest, RvbId},
};

mod common;

use common::{
    logging::setup_logger,
    rvb::{
        add, digest_of, expected_levels, expected_nodes, first_ids, new_tree, random_k_and_f,
        random_num, remove, tree_with_ids,
    },
};

const RVT_K: u64 = 3;

#[test]
fn construct_tree_with_single_first_node() {
    let rvt = tree_with_ids(RVT_K, 4, [4]);
    assert_eq!(rvt.total_nodes(), 1);
    assert!(!rvt.empty());
    assert_eq!(rvt.total_levels(), 1);
    assert!(rvt.validate_tree().is_ok());
}

#[test]
fn construct_tree_with_single_middle_node() {
    let rvt = tree_with_ids(RVT_K, 4, [8]);
    assert_eq!(rvt.total_nodes(), 1);
    assert_eq!(rvt.total_levels(), 1);
}

#[test]
fn construct_tree_with_single_last_node() {
    let rvt = tree_with_ids(RVT_K, 4, [4 * RVT_K]);
    assert_eq!(rvt.total_nodes(), 1);
    assert_eq!(rvt.total_levels(), 1);
}

#[test]
fn construct_tree_with_two_groups() {
    let rvt = tree_with_ids(RVT_K, 4, (4..=4 * RVT_K + 4).step_by(4));
    assert_eq!(rvt.total_levels(), 2);
    assert_eq!(rvt.total_nodes(), 3);
    assert_eq!(rvt.get_min_rvb_id(), Some(RvbId::new(4)));
    assert_eq!(rvt.get_max_rvb_id(), Some(RvbId::new(16)));
    assert!(rvt.validate_tree().is_ok());
}

#[test]
fn tree_node_removal_basic() {
    let mut rvt = tree_with_ids(RVT_K, 4, (4..=4 * RVT_K + 4).step_by(4));
    for rvb_id in (4..=4 * RVT_K + 4).step_by(4) {
        remove(&mut rvt, rvb_id);
        assert!(rvt.validate_tree().is_ok());
    }
    assert_eq!(rvt.total_nodes(), 0);
    assert_eq!(rvt.total_levels(), 0);
    assert!(rvt.empty());
    assert_eq!(rvt.get_root_hash_val(), HashVal::EMPTY);
    assert_eq!(rvt.get_min_rvb_id(), None);
    assert_eq!(rvt.get_max_rvb_id(), None);
}

/// For contiguous ids starting at the first RVB, the number of levels is the smallest `l` such that a
/// root at level `l` can cover all of them.
#[test]
fn levels_and_nodes_for_random_k_and_f() {
    for _ in 0..3 {
        let (k, f) = random_k_and_f();
        let n = random_num(1, 3000, 0);
        let rvt = tree_with_ids(k, f, first_ids(f, n));

        assert_eq!(rvt.total_levels(), expected_levels(k, n), "k: {k}, f: {f}, n: {n}");
        assert_eq!(rvt.total_nodes(), expected_nodes(k, n), "k: {k}, f: {f}, n: {n}");
        assert!(rvt.validate_tree().is_ok());
    }
}

#[test]
fn simple_add_remove_with_root_validation() {
    let f = 4;
    let mut rvt = new_tree(RVT_K, f);

    for i in 1..1000 {
        add(&mut rvt, i * f);
    }
    for i in 1..300 {
        remove(&mut rvt, i * f);
    }
    assert!(rvt.validate_tree().is_ok());
    assert_eq!(rvt.get_min_rvb_id(), Some(RvbId::new(300 * f)));

    for i in 1000..1500 {
        add(&mut rvt, i * f);
    }
    for i in 300..700 {
        remove(&mut rvt, i * f);
    }
    assert!(rvt.validate_tree().is_ok());
    assert_eq!(rvt.get_min_rvb_id(), Some(RvbId::new(700 * f)));
    assert_eq!(rvt.get_max_rvb_id(), Some(RvbId::new(1499 * f)));

    // The same window built from scratch has the same shape and root.
    let fresh = tree_with_ids(RVT_K, f, (700..1500).map(|i| i * f));
    assert_eq!(rvt.get_root_hash_val(), fresh.get_root_hash_val());
    assert_eq!(rvt.total_nodes(), fresh.total_nodes());
    assert_eq!(rvt.total_levels(), fresh.total_levels());

    for i in 700..1500 {
        remove(&mut rvt, i * f);
    }
    assert!(rvt.empty());
    assert_eq!(rvt.total_nodes(), 0);
}

#[test]
fn add_remove_cancellation_in_any_order() {
    let (k, f) = random_k_and_f();
    let mut rvb_ids: Vec<u64> = first_ids(f, 200).collect();
    let mut rng = thread_rng();
    rvb_ids.shuffle(&mut rng);

    let mut rvt = new_tree(k, f);
    for rvb_id in &rvb_ids {
        add(&mut rvt, *rvb_id);
    }
    assert!(rvt.validate_tree().is_ok());

    rvb_ids.shuffle(&mut rng);
    for rvb_id in &rvb_ids {
        remove(&mut rvt, *rvb_id);
        assert!(rvt.validate_tree().is_ok(), "k: {k}, f: {f}, removed: {rvb_id}");
    }
    assert!(rvt.empty());
    assert_eq!(rvt.total_nodes(), 0);
    assert_eq!(rvt.get_root_hash_val(), HashVal::EMPTY);
}

#[test]
fn random_interleaving_keeps_tree_valid() {
    let (k, f) = random_k_and_f();
    let mut rvt = tree_with_ids(k, f, first_ids(f, 100));

    for _ in 0..500 {
        let grow = random_num(0, 1, 0) == 1 || rvt.empty();
        if grow {
            let next = rvt.get_max_rvb_id().map_or(f, |max| max.int() + f);
            add(&mut rvt, next);
        } else {
            let min = rvt.get_min_rvb_id().unwrap().int();
            remove(&mut rvt, min);
        }
        assert!(rvt.validate_tree().is_ok(), "k: {k}, f: {f}");
    }
}

#[test]
fn interior_removal_matches_tree_without_the_id() {
    let f = 4;
    let mut rvt = tree_with_ids(RVT_K, f, first_ids(f, 30));
    remove(&mut rvt, 13 * f);
    remove(&mut rvt, 14 * f);
    remove(&mut rvt, 15 * f);
    assert!(rvt.validate_tree().is_ok());

    let without = tree_with_ids(
        RVT_K,
        f,
        first_ids(f, 30).filter(|rvb_id| ![13 * f, 14 * f, 15 * f].contains(rvb_id)),
    );
    assert_eq!(rvt.get_root_hash_val(), without.get_root_hash_val());
    assert_eq!(rvt.total_nodes(), without.total_nodes());
    assert_eq!(rvt.total_levels(), without.total_levels());
    assert_eq!(rvt.get_direct_parent_hash_val(RvbId::new(13 * f)), None);
}

#[test]
fn root_grows_and_collapses_for_distant_ids() {
    let mut rvt = tree_with_ids(RVT_K, 1, [1]);
    assert_eq!(rvt.total_levels(), 1);

    // Group 0 and group 33 first share an ancestor at level 5.
    add(&mut rvt, 100);
    assert_eq!(rvt.total_levels(), 5);
    assert_eq!(rvt.total_nodes(), 9);
    assert!(rvt.validate_tree().is_ok());

    remove(&mut rvt, 100);
    assert_eq!(rvt.total_levels(), 1);
    assert_eq!(rvt.total_nodes(), 1);
    assert!(rvt.validate_tree().is_ok());
    assert_eq!(rvt.get_root_hash_val(), tree_with_ids(RVT_K, 1, [1]).get_root_hash_val());
}

#[test]
fn min_and_max_track_live_ids() {
    let mut rvt = tree_with_ids(RVT_K, 4, [8, 4, 12]);
    assert_eq!(rvt.get_min_rvb_id(), Some(RvbId::new(4)));
    assert_eq!(rvt.get_max_rvb_id(), Some(RvbId::new(12)));

    remove(&mut rvt, 4);
    assert_eq!(rvt.get_min_rvb_id(), Some(RvbId::new(8)));
    remove(&mut rvt, 12);
    assert_eq!(rvt.get_max_rvb_id(), Some(RvbId::new(8)));
    assert!(rvt.validate_tree().is_ok());
}

#[test]
fn duplicate_add_leaves_tree_unchanged() {
    let mut rvt = tree_with_ids(RVT_K, 4, first_ids(4, 10));
    let root_hash = rvt.get_root_hash_val();
    let total_nodes = rvt.total_nodes();

    let result = rvt.add_node(RvbId::new(20), &Digest::from_slice(b"another digest"));
    assert!(matches!(result, Err(RvtError::DuplicateRvbId { rvb_id }) if rvb_id == RvbId::new(20)));
    assert_eq!(rvt.get_root_hash_val(), root_hash);
    assert_eq!(rvt.total_nodes(), total_nodes);
    assert_eq!(rvt.digest(RvbId::new(20)), Some(&digest_of(20)));
}

#[test]
fn removal_with_wrong_digest_leaves_tree_unchanged() {
    let mut rvt = tree_with_ids(RVT_K, 4, first_ids(4, 10));
    let root_hash = rvt.get_root_hash_val();
    let total_nodes = rvt.total_nodes();

    let result = rvt.remove_node(RvbId::new(40), &digest_of(36));
    assert!(matches!(result, Err(RvtError::DigestMismatch { .. })));
    assert_eq!(rvt.get_root_hash_val(), root_hash);
    assert_eq!(rvt.total_nodes(), total_nodes);
    assert!(rvt.contains(RvbId::new(40)));
    assert!(rvt.validate_tree().is_ok());
}

#[test]
fn invalid_and_unknown_ids_are_rejected() {
    let mut rvt = tree_with_ids(RVT_K, 4, first_ids(4, 3));

    assert!(matches!(
        rvt.add_node(RvbId::new(0), &digest_of(0)),
        Err(RvtError::InvalidRvbId { .. })
    ));
    assert!(matches!(
        rvt.add_node(RvbId::new(6), &digest_of(6)),
        Err(RvtError::InvalidRvbId { .. })
    ));
    assert!(matches!(
        rvt.remove_node(RvbId::new(7), &digest_of(7)),
        Err(RvtError::InvalidRvbId { .. })
    ));
    assert!(matches!(
        rvt.remove_node(RvbId::new(400), &digest_of(400)),
        Err(RvtError::RvbIdNotFound { .. })
    ));
    assert_eq!(rvt.total_nodes(), 1);
    assert!(rvt.validate_tree().is_ok());
}

#[test]
fn malformed_configuration_is_rejected() {
    for (k, f) in [(1, 4), (0, 4), (3, 0)] {
        let config = RvtConfiguration::builder()
            .branching_factor(k)
            .fetch_range_size(f)
            .build();
        assert!(matches!(
            RangeValidationTree::new(config),
            Err(RvtError::MalformedConfiguration { .. })
        ));
    }
}

#[test]
fn events_are_published_and_logged() {
    setup_logger(LevelFilter::Trace);
    let config = RvtConfiguration::builder()
        .branching_factor(RVT_K)
        .fetch_range_size(4)
        .log_events(true)
        .build();
    let mut rvt = RangeValidationTree::new(config).unwrap();
    let (sender, receiver) = mpsc::channel();
    rvt.set_event_publisher(sender);

    for rvb_id in [4, 8, 12, 16] {
        add(&mut rvt, rvb_id);
    }
    remove(&mut rvt, 16);

    let events: Vec<Event> = receiver.try_iter().collect();
    let adds = events.iter().filter(|event| matches!(event, Event::AddRvb(_))).count();
    let grows: Vec<usize> = events
        .iter()
        .filter_map(|event| match event {
            Event::GrowTree(grow) => Some(grow.total_levels),
            _ => None,
        })
        .collect();
    let shrinks: Vec<usize> = events
        .iter()
        .filter_map(|event| match event {
            Event::ShrinkTree(shrink) => Some(shrink.total_levels),
            _ => None,
        })
        .collect();
    assert_eq!(adds, 4);
    assert_eq!(grows, vec![2]);
    assert_eq!(shrinks, vec![1]);
    assert!(matches!(events.last(), Some(Event::ShrinkTree(_))));
}
