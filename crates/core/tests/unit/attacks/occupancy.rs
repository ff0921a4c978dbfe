//! Occupancy-Set Construction Tests.

use std::collections::HashSet;

use bpgauge_core::Predictor;
use bpgauge_core::attacks::{
    btb_occupancy, pht_occupancy, verify_btb_occupancy, verify_pht_occupancy,
};
use bpgauge_core::config::PredictorKind;
use pretty_assertions::assert_eq;

use crate::common::harness::{Setup, session};

// ══════════════════════════════════════════════════════════
// 1. PHT
// ══════════════════════════════════════════════════════════

#[test]
fn pht_occupancy_members_use_distinct_counters() {
    let setup = Setup::new().addr_space(12).pht(2, 8, 0);
    for seed in 0..8 {
        let mut bp = setup.build(PredictorKind::Base);
        let mut session = session(seed);
        let probe = pht_occupancy(&mut bp, &mut session, 10_000, 4, 8);
        assert!(!probe.addrs.is_empty());
        let attacker = session.attacker();
        let slots: HashSet<usize> = probe.addrs.iter().map(|&a| bp.pht_set(a, attacker)).collect();
        assert_eq!(slots.len(), probe.addrs.len(), "seed {seed}: members share a counter");
        assert_eq!(verify_pht_occupancy(&mut bp, &session, &probe.addrs), 0);
    }
}

#[test]
fn verify_pht_counts_conflicting_pairs() {
    let mut bp = Setup::new().addr_space(12).pht(2, 8, 0).build(PredictorKind::Base);
    let session = session(1);
    assert_eq!(verify_pht_occupancy(&mut bp, &session, &[0, 1]), 0);
    // 0 and 8 share a counter; both orderings conflict.
    assert_eq!(verify_pht_occupancy(&mut bp, &session, &[0, 8]), 2);
    assert_eq!(verify_pht_occupancy(&mut bp, &session, &[]), 0);
}

// ══════════════════════════════════════════════════════════
// 2. BTB
// ══════════════════════════════════════════════════════════

#[test]
fn btb_occupancy_fits_in_large_buffer() {
    let setup = Setup::new().addr_space(12).btb(4, 1024, 5);
    for seed in 0..8 {
        let mut bp = setup.build(PredictorKind::Base);
        let mut session = session(seed);
        let probe = btb_occupancy(&mut bp, &mut session, 10_000, 5, 8);
        assert!(probe.addrs.len() >= 8, "seed {seed}");
        assert_eq!(verify_btb_occupancy(&mut bp, &session, &probe.addrs), 0);
    }
}

#[test]
fn verify_btb_counts_misses() {
    let mut bp = Setup::new().addr_space(12).btb(1, 4, 5).build(PredictorKind::Base);
    let session = session(1);
    // 0x000 and 0x080 land in set 0 with different tags; one way holds only one.
    assert_eq!(verify_btb_occupancy(&mut bp, &session, &[0x000, 0x080]), 2);
    assert_eq!(verify_btb_occupancy(&mut bp, &session, &[0x000, 0x020]), 0);
}

#[test]
fn occupancy_respects_budget() {
    let mut bp = Setup::new().build(PredictorKind::XorBp);
    let mut session = session(4);
    session.set_max_accesses(Some(0));
    let pht = pht_occupancy(&mut bp, &mut session, 100, 4, 8);
    let btb = btb_occupancy(&mut bp, &mut session, 100, 4, 8);
    assert_eq!((pht.accesses, btb.accesses), (0, 0));
    assert!(pht.addrs.is_empty() && btb.addrs.is_empty());
}
