//! Eviction-Set Construction Tests.

use bpgauge_core::Predictor;
use bpgauge_core::attacks::btb_prune;
use bpgauge_core::config::{PredictorKind, ReplacementPolicy};
use pretty_assertions::assert_eq;

use crate::common::harness::{Setup, session};

const VICTIM_ADDR: u64 = 0x9a4;

#[test]
fn eviction_set_shares_victim_set() {
    let setup = Setup::new()
        .addr_space(12)
        .btb(2, 4, 5)
        .policy(ReplacementPolicy::Lru);
    for seed in 0..16 {
        let mut bp = setup.build(PredictorKind::Base);
        let mut session = session(seed);
        let probe = btb_prune(&mut bp, &mut session, 1_000, VICTIM_ADDR, 6, 1);
        assert!(!probe.addrs.is_empty(), "seed {seed}: no evictor found");
        let victim_set = bp.btb_set(VICTIM_ADDR, session.victim());
        for &addr in &probe.addrs {
            assert_eq!(bp.btb_set(addr, session.attacker()), victim_set, "seed {seed}");
        }
        assert!(probe.loops <= 1_000);
        assert!(probe.accesses > 0);
    }
}

#[test]
fn exhausted_budget_stops_before_first_access() {
    let mut bp = Setup::new().build(PredictorKind::Base);
    let mut session = session(2);
    session.set_max_accesses(Some(0));
    let probe = btb_prune(&mut bp, &mut session, 1_000, VICTIM_ADDR, 8, 1);
    assert!(probe.addrs.is_empty());
    assert_eq!(probe.accesses, 0);
    assert_eq!(probe.loops, 0);
}

#[test]
fn unfilled_prune_set_is_never_probed() {
    let mut bp = Setup::new().build(PredictorKind::Base);
    let probe = btb_prune(&mut bp, &mut session(2), 10, VICTIM_ADDR, 64, 1);
    assert!(probe.addrs.is_empty());
    assert_eq!(probe.accesses, 0);
    assert_eq!(probe.loops, 10);
}
