//! Branch Target Buffer (BTB) Tests.
//!
//! Verifies the ternary lookup outcome, set aging, LRU eviction order and
//! per-set occupancy tracking.

use bpgauge_core::core::units::policies::{LruPolicy, RandomPolicy};
use bpgauge_core::core::units::{Btb, BtbOutcome};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn lru_btb(ways: usize, sets: usize) -> Btb {
    Btb::new(ways, sets, Box::new(LruPolicy))
}

// ══════════════════════════════════════════════════════════
// 1. Outcomes
// ══════════════════════════════════════════════════════════

#[test]
fn invalid_then_correct_then_mispredict() {
    let mut btb = lru_btb(2, 4);
    assert_eq!(btb.lookup(1, 0xA, 0x10), BtbOutcome::Invalid);
    assert_eq!(btb.lookup(1, 0xA, 0x10), BtbOutcome::Correct);
    assert_eq!(btb.lookup(1, 0xA, 0x20), BtbOutcome::Mispredict);
    // The mispredicting lookup wrote the new destination.
    assert_eq!(btb.lookup(1, 0xA, 0x20), BtbOutcome::Correct);
}

#[test]
fn outcome_encoding() {
    assert_eq!(BtbOutcome::Invalid.as_i8(), -1);
    assert_eq!(BtbOutcome::Mispredict.as_i8(), 0);
    assert_eq!(i8::from(BtbOutcome::Correct), 1);
    assert_eq!(BtbOutcome::Invalid.to_string(), "-1");
    assert!(!BtbOutcome::Invalid.is_tag_hit());
    assert!(BtbOutcome::Mispredict.is_tag_hit());
}

#[test]
fn sets_are_independent() {
    let mut btb = lru_btb(1, 4);
    assert_eq!(btb.lookup(0, 0xA, 1), BtbOutcome::Invalid);
    assert_eq!(btb.lookup(1, 0xA, 1), BtbOutcome::Invalid);
    assert_eq!(btb.lookup(0, 0xA, 1), BtbOutcome::Correct);
    assert_eq!(btb.lookup(1, 0xA, 1), BtbOutcome::Correct);
}

// ══════════════════════════════════════════════════════════
// 2. Aging and eviction
// ══════════════════════════════════════════════════════════

#[test]
fn lookups_age_the_set() {
    let mut btb = lru_btb(2, 1);
    let _ = btb.lookup(0, 0xA, 0);
    assert_eq!(btb.lru_age(0, 0), Some(0));
    assert_eq!(btb.lru_age(0, 1), None);
    let _ = btb.lookup(0, 0xB, 0);
    assert_eq!(btb.lru_age(0, 0), Some(1));
    assert_eq!(btb.lru_age(0, 1), Some(0));
}

#[test]
fn lru_evicts_least_recently_written() {
    let mut btb = lru_btb(2, 1);
    let _ = btb.lookup(0, 0xA, 0);
    let _ = btb.lookup(0, 0xB, 0);
    let _ = btb.lookup(0, 0xA, 0); // A is now the freshest
    assert_eq!(btb.lookup(0, 0xC, 0), BtbOutcome::Invalid);
    assert_eq!(btb.way_of(0, 0xB), None, "B was the oldest way");
    assert!(btb.way_of(0, 0xA).is_some());
    assert!(btb.way_of(0, 0xC).is_some());
}

#[test]
fn random_policy_keeps_set_full() {
    let mut btb = Btb::new(4, 1, Box::new(RandomPolicy::new(7)));
    for tag in 0..32 {
        let _ = btb.lookup(0, tag, tag);
        assert!(btb.occupancy(0) <= 4);
    }
    assert_eq!(btb.occupancy(0), 4);
    assert!(btb.way_of(0, 31).is_some(), "The last allocation is resident");
}

// ══════════════════════════════════════════════════════════
// 3. Maintenance
// ══════════════════════════════════════════════════════════

#[test]
fn update_without_resident_tag_is_noop() {
    let mut btb = lru_btb(2, 2);
    btb.update(0, 0xA, 5);
    assert_eq!(btb.occupancy(0), 0);
}

#[test]
fn flush_and_geometry() {
    let mut btb = lru_btb(2, 8);
    assert_eq!(btb.sets(), 8);
    assert_eq!(btb.ways(), 2);
    assert_eq!(btb.slot(19), 3);
    let _ = btb.lookup(3, 1, 1);
    let _ = btb.lookup(3, 2, 1);
    assert_eq!(btb.occupancy(3), 2);
    btb.flush();
    assert_eq!(btb.occupancy(3), 0);
    assert_eq!(btb.lookup(3, 1, 1), BtbOutcome::Invalid);
}

proptest! {
    #[test]
    fn untouched_way_ages_once_per_set_access(k in 0u64..64, others in 1u64..4) {
        let mut btb = lru_btb(4, 2);
        let _ = btb.lookup(1, 0, 0);
        let way = btb.way_of(1, 0).unwrap();
        for i in 0..k {
            let _ = btb.lookup(1, 1 + i % others, 0);
            // Accesses to another set leave this one alone.
            let _ = btb.lookup(0, i, 0);
        }
        prop_assert_eq!(btb.lru_age(1, way), Some(k));
    }
}
