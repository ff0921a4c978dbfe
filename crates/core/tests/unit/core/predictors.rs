//! Predictor Scheme Tests.
//!
//! Exercises the uniform contract across all seven schemes and the
//! isolation property each scheme adds on top of the baseline.

use bpgauge_core::common::domain::{ATTACKER, Context, VICTIM};
use bpgauge_core::common::{PID_ATTACKER, PID_VICTIM};
use bpgauge_core::config::{KeyMode, PredictorKind, ReplacementPolicy};
use bpgauge_core::core::units::BtbOutcome;
use bpgauge_core::core::{Predictor, PredictorWrapper};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

use crate::common::harness::Setup;

// ══════════════════════════════════════════════════════════
// 1. Uniform contract
// ══════════════════════════════════════════════════════════

#[rstest]
fn pht_first_touch_mispredicts_then_learns(
    #[values(
        PredictorKind::Base,
        PredictorKind::Bsup,
        PredictorKind::XorBp,
        PredictorKind::NoisyXorBp,
        PredictorKind::Lsbp,
        PredictorKind::Stbpu,
        PredictorKind::HyBp
    )]
    kind: PredictorKind,
    #[values(ATTACKER, VICTIM)] ctx: Context,
) {
    let mut bp = Setup::new().build(kind);
    let pc = 0x0040_1a20;
    assert!(!bp.lookup_pht(pc, true, ctx), "{kind}: first touch must mispredict");
    for _ in 0..8 {
        let _ = bp.lookup_pht(pc, true, ctx);
    }
    assert!(bp.lookup_pht(pc, true, ctx), "{kind}: saturated counter must predict taken");
    assert!(!bp.lookup_pht(pc, false, ctx));
}

#[rstest]
fn btb_outcome_sequence(
    #[values(
        PredictorKind::Base,
        PredictorKind::Bsup,
        PredictorKind::XorBp,
        PredictorKind::NoisyXorBp,
        PredictorKind::Lsbp,
        PredictorKind::Stbpu,
        PredictorKind::HyBp
    )]
    kind: PredictorKind,
) {
    let mut bp = Setup::new().build(kind);
    let pc = 0x0012_3440;
    assert_eq!(bp.lookup_btb(pc, 0x100, VICTIM), BtbOutcome::Invalid);
    assert_eq!(bp.lookup_btb(pc, 0x100, VICTIM), BtbOutcome::Correct);
    assert_eq!(bp.lookup_btb(pc, 0x200, VICTIM), BtbOutcome::Mispredict);
    assert_eq!(bp.lookup_btb(pc, 0x200, VICTIM), BtbOutcome::Correct);
}

#[rstest]
fn regenerated_address_maps_back(
    #[values(
        PredictorKind::Base,
        PredictorKind::Bsup,
        PredictorKind::XorBp,
        PredictorKind::NoisyXorBp,
        PredictorKind::Lsbp,
        PredictorKind::Stbpu,
        PredictorKind::HyBp
    )]
    kind: PredictorKind,
    #[values(0x0, 0x0040_1a20, 0xdead_beef, 0xffff_ffff)] pc: u64,
    #[values(ATTACKER, VICTIM)] ctx: Context,
) {
    let bp = Setup::new().build(kind);
    let set = bp.btb_set(pc, ctx);
    let tag = bp.btb_tag(pc, ctx);
    let addr = bp.regenerate_tag_addr(set, tag, ctx);
    assert_eq!(bp.btb_set(addr, ctx), set, "{kind}: set of {addr:#x}");
    assert_eq!(bp.btb_tag(addr, ctx), tag, "{kind}: tag of {addr:#x}");
    assert!(addr <= bp.addr_space().mask());
}

#[rstest]
fn destination_round_trips(
    #[values(
        PredictorKind::Base,
        PredictorKind::Bsup,
        PredictorKind::XorBp,
        PredictorKind::NoisyXorBp,
        PredictorKind::Lsbp,
        PredictorKind::Stbpu,
        PredictorKind::HyBp
    )]
    kind: PredictorKind,
    #[values(ATTACKER, VICTIM)] ctx: Context,
) {
    let bp = Setup::new().build(kind);
    for target in [0, 0x100, 0x7fff_0000] {
        let dest = bp.btb_dest(target, ctx);
        assert_eq!(bp.regenerate_dest_addr(dest, ctx), target);
    }
}

#[rstest]
fn init_btb_installs_new_geometry(
    #[values(
        PredictorKind::Base,
        PredictorKind::Bsup,
        PredictorKind::XorBp,
        PredictorKind::NoisyXorBp,
        PredictorKind::Lsbp,
        PredictorKind::Stbpu,
        PredictorKind::HyBp
    )]
    kind: PredictorKind,
    #[values(ATTACKER, VICTIM)] ctx: Context,
) {
    let mut bp = Setup::new().build(kind);
    let pc = 0x0040_1a20;
    let _ = bp.lookup_btb(pc, 0x100, ctx);

    bp.init_btb(2, 64, 3, ReplacementPolicy::Random);
    assert_eq!(bp.btb_ways(), 2);
    assert_eq!(bp.tables().btb.sets(), 64);

    let set = bp.btb_set(pc, ctx);
    let tag = bp.btb_tag(pc, ctx);
    assert!(set < 64, "{kind}: set {set}");
    let addr = bp.regenerate_tag_addr(set, tag, ctx);
    assert_eq!((bp.btb_set(addr, ctx), bp.btb_tag(addr, ctx)), (set, tag), "{kind}");

    assert_eq!(bp.lookup_btb(pc, 0x100, ctx), BtbOutcome::Invalid, "{kind}: old entry kept");
}

#[rstest]
fn update_btb_rewrites_resident_entries_only(
    #[values(
        PredictorKind::Base,
        PredictorKind::Bsup,
        PredictorKind::XorBp,
        PredictorKind::NoisyXorBp,
        PredictorKind::Lsbp,
        PredictorKind::Stbpu,
        PredictorKind::HyBp
    )]
    kind: PredictorKind,
) {
    let mut bp = Setup::new().build(kind);
    let pc = 0x0012_3440;
    assert_eq!(bp.lookup_btb(pc, 0x100, VICTIM), BtbOutcome::Invalid);
    bp.update_btb(pc, 0x200, VICTIM);
    assert_eq!(bp.lookup_btb(pc, 0x200, VICTIM), BtbOutcome::Correct, "{kind}");

    let slot = (bp.btb_set(pc, VICTIM), bp.btb_tag(pc, VICTIM));
    let other = (1..)
        .map(|i| pc + (i << 12))
        .find(|&a| (bp.btb_set(a, VICTIM), bp.btb_tag(a, VICTIM)) != slot)
        .unwrap();
    let set = bp.btb_set(other, VICTIM);
    let tag = bp.btb_tag(other, VICTIM);
    let ages = |bp: &PredictorWrapper| {
        (0..bp.btb_ways()).map(|w| bp.tables().btb.lru_age(set, w)).collect::<Vec<_>>()
    };
    let before = ages(&bp);

    bp.update_btb(other, 0x300, VICTIM);
    assert_eq!(ages(&bp), before, "{kind}");
    assert_eq!(bp.tables().btb.way_of(set, tag), None);
    assert_eq!(bp.lookup_btb(other, 0x300, VICTIM), BtbOutcome::Invalid);
}

#[test]
fn default_contexts_use_default_pids() {
    assert_eq!(Context::default(), ATTACKER);
    assert_eq!(ATTACKER.pid, PID_ATTACKER);
    assert_eq!(VICTIM, Context::victim(PID_VICTIM));
}

#[test]
fn build_all_follows_reporting_order() {
    let config = Setup::new().config();
    let all = PredictorWrapper::build_all(&config).unwrap();
    let kinds: Vec<PredictorKind> = all.iter().map(Predictor::kind).collect();
    assert_eq!(kinds, PredictorKind::ALL.to_vec());
}

#[test]
fn only_lsbp_is_pid_keyed() {
    for kind in PredictorKind::ALL {
        let bp = Setup::new().build(kind);
        assert_eq!(bp.pid_keyed(), kind == PredictorKind::Lsbp, "{kind}");
    }
}

// ══════════════════════════════════════════════════════════
// 2. Scheme specifics
// ══════════════════════════════════════════════════════════

#[test]
fn bsup_forces_three_bit_counters() {
    let mut bp = Setup::new().pht(2, 64, 0).build(PredictorKind::Bsup);
    assert_eq!(bp.counter_bits(), 3);
    bp.init_pht(5, 32, 0);
    assert_eq!(bp.counter_bits(), 3);
    assert_eq!(bp.tables().pht.len(), 32);
}

#[test]
fn baseline_shares_entries_across_domains() {
    let mut bp = Setup::new().build(PredictorKind::Base);
    let pc = 0x0040_0000;
    assert!(bp.check_pht_set_collision(pc, ATTACKER, pc, VICTIM));
    for _ in 0..4 {
        bp.update_pht(pc, true, ATTACKER);
    }
    assert!(bp.lookup_pht(pc, true, VICTIM), "Victim reads the attacker's counter");
}

#[test]
fn xor_bp_content_key_hides_trained_direction() {
    let mut bp = Setup::new().pht(2, 64, 0).build(PredictorKind::XorBp);
    let pc = 0x0040_0000;
    assert!(bp.check_pht_set_collision(pc, ATTACKER, pc, VICTIM));
    for _ in 0..4 {
        bp.update_pht(pc, true, ATTACKER);
    }
    // Counter 3 under the attacker key decodes to 0 under the victim key.
    assert!(!bp.lookup_pht(pc, true, VICTIM));
}

#[test]
fn xor_bp_rekey() {
    let fixed = Setup::new().build(PredictorKind::XorBp);
    let PredictorWrapper::XorBp(mut fixed) = fixed else {
        panic!("expected XorBp");
    };
    let before = fixed.index_key();
    fixed.rekey();
    assert_eq!(fixed.index_key(), before, "Fixed keys survive a rekey");

    let random = Setup::new().key_mode(KeyMode::Random).build(PredictorKind::XorBp);
    let PredictorWrapper::XorBp(mut random) = random else {
        panic!("expected XorBp");
    };
    let keys: Vec<u64> = (0..4)
        .map(|_| {
            random.rekey();
            random.index_key()
        })
        .collect();
    assert!(keys.windows(2).any(|w| w[0] != w[1]), "Random rekey draws new keys");
}

#[test]
fn noisy_xor_bp_perturbs_access_index() {
    let mut bp = Setup::new().noise(1.0).build(PredictorKind::NoisyXorBp);
    let pc = 0x0040_1a20;
    let clean = bp.pht_set(pc, ATTACKER);
    let moved = (0..64).filter(|_| bp.access_pht_set(pc, ATTACKER) != clean).count();
    assert!(moved > 0);

    let mut quiet = Setup::new().noise(0.0).build(PredictorKind::NoisyXorBp);
    assert!((0..64).all(|_| quiet.access_pht_set(pc, ATTACKER) == clean));
}

#[test]
fn lsbp_index_depends_on_pid() {
    let bp = Setup::new().pht(2, 64, 0).build(PredictorKind::Lsbp);
    let pc = 0x0040_0000;
    let a = bp.pht_set(pc, ATTACKER);
    let b = bp.pht_set(pc, ATTACKER.with_pid(ATTACKER.pid ^ 1));
    assert_ne!(a, b);
}

#[test]
fn hybp_partitions_pht_by_domain() {
    let bp = Setup::new().pht(2, 64, 0).build(PredictorKind::HyBp);
    for pc in (0..4096u64).step_by(7) {
        assert!(bp.pht_set(pc, ATTACKER) < 32);
        assert!(bp.pht_set(pc, VICTIM) >= 32);
        assert!(!bp.check_pht_set_collision(pc, ATTACKER, pc, VICTIM));
    }
}

#[test]
fn stbpu_separates_btb_tags_across_domains() {
    let bp = Setup::new().build(PredictorKind::Stbpu);
    for pc in [0x0, 0x1000, 0x0040_1a20] {
        assert_ne!(bp.btb_tag(pc, ATTACKER), bp.btb_tag(pc, VICTIM));
    }
}

#[test]
fn xor_bp_rekey_moves_entries() {
    let bp = Setup::new().key_mode(KeyMode::Random).build(PredictorKind::XorBp);
    let PredictorWrapper::XorBp(mut bp) = bp else {
        panic!("expected XorBp");
    };
    let addrs: Vec<u64> = (0..64u64).map(|i| i << 5).collect();
    // One index key serves both domains.
    assert!(addrs.iter().all(|&a| bp.btb_set(a, ATTACKER) == bp.btb_set(a, VICTIM)));
    let before: Vec<usize> = addrs.iter().map(|&a| bp.btb_set(a, ATTACKER)).collect();
    let moved = (0..4).any(|_| {
        bp.rekey();
        addrs.iter().zip(&before).any(|(&a, &set)| bp.btb_set(a, ATTACKER) != set)
    });
    assert!(moved);
}

proptest! {
    #[test]
    fn keyed_schemes_round_trip_tags(pc in 0u64..(1 << 32), victim in any::<bool>()) {
        let ctx = if victim { VICTIM } else { ATTACKER };
        for kind in [PredictorKind::XorBp, PredictorKind::Lsbp, PredictorKind::Stbpu] {
            let bp = Setup::new().build(kind);
            let (set, tag) = (bp.btb_set(pc, ctx), bp.btb_tag(pc, ctx));
            let addr = bp.regenerate_tag_addr(set, tag, ctx);
            prop_assert_eq!((bp.btb_set(addr, ctx), bp.btb_tag(addr, ctx)), (set, tag));
        }
    }
}
