//! Occupancy-set construction.
//!
//! An occupancy set is a collection of attacker addresses that can all be
//! resident at once without disturbing one another. Primed and re-probed, it
//! reveals any victim activity that lands on one of its members: the member
//! reads back wrong. Sets are grown in batches; each batch is first pruned of
//! internal conflicts, then admitted member by member if it does not conflict
//! with the set built so far.

use tracing::debug;

use super::{ATTACKER_TARGET, AttackSession, Counted, SetProbe, saturation_steps};
use crate::common::domain::Context;
use crate::core::predictors::Predictor;
use crate::core::units::BtbOutcome;

/// Timing test: does priming `second` disturb `first`'s PHT counter.
///
/// Saturates `first` toward not-taken, `second` toward taken, then probes
/// `first`; a mispredicted probe means the two share a counter.
fn pht_conflict<P: Predictor + ?Sized>(
    probe: &mut Counted<'_, P>,
    first: u64,
    second: u64,
    ctx: Context,
    steps: u64,
) -> bool {
    probe.pht_train(first, false, ctx, steps);
    probe.pht_train(second, true, ctx, steps);
    !probe.pht(first, false, ctx)
}

/// Builds a PHT occupancy set.
///
/// # Arguments
///
/// * `bp` - Predictor under attack.
/// * `session` - Attacker state and access budget.
/// * `num_loops` - Maximum loop iterations.
/// * `prune_size` - Candidates per batch.
/// * `occupancy_size` - Set size at which construction stops.
pub fn pht_occupancy<P: Predictor + ?Sized>(
    bp: &mut P,
    session: &mut AttackSession,
    num_loops: u64,
    prune_size: usize,
    occupancy_size: usize,
) -> SetProbe {
    let steps = saturation_steps(bp);
    let space = bp.addr_space();
    let attacker = session.attacker();
    let mut probe = Counted::new(bp);
    let mut loops = 0;
    let mut prune_set: Vec<u64> = Vec::with_capacity(prune_size);
    let mut occupancy_set: Vec<u64> = Vec::new();

    while loops < num_loops
        && occupancy_set.len() < occupancy_size
        && session.within_budget(probe.accesses)
    {
        let candidate = session.random_addr(space);
        if occupancy_set.contains(&candidate) {
            continue;
        }
        prune_set.push(candidate);
        if prune_set.len() < prune_size {
            loops += 1;
            continue;
        }

        // Pairwise elimination: keep the earlier member of every conflicting pair.
        loop {
            let mut removed = 0;
            let mut i = 0;
            while i < prune_set.len() {
                let mut j = i + 1;
                while j < prune_set.len() {
                    if pht_conflict(&mut probe, prune_set[i], prune_set[j], attacker, steps) {
                        let _ = prune_set.remove(j);
                        removed += 1;
                    } else {
                        j += 1;
                    }
                }
                i += 1;
            }
            if removed == 0 {
                break;
            }
        }

        for &addr in &prune_set {
            probe.pht_train(addr, true, attacker, steps);
        }
        for &addr in &occupancy_set {
            probe.pht_train(addr, false, attacker, steps);
        }
        for addr in prune_set.drain(..) {
            if probe.pht(addr, true, attacker) {
                occupancy_set.push(addr);
            }
        }
        loops += 1;
    }

    debug!(
        attack = "pht_occupancy",
        scheme = %probe.bp.kind(),
        loops,
        accesses = probe.accesses,
        members = occupancy_set.len()
    );
    SetProbe {
        addrs: occupancy_set,
        accesses: probe.accesses,
        loops,
    }
}

/// Builds a BTB occupancy set.
///
/// Each batch is pruned until it can be primed and re-probed without a single
/// miss; the occupancy set is then accessed, and batch members that still
/// predict correctly join it.
///
/// # Arguments
///
/// * `bp` - Predictor under attack.
/// * `session` - Attacker state and access budget.
/// * `num_loops` - Maximum loop iterations.
/// * `prune_size` - Candidates per batch.
/// * `occupancy_size` - Set size at which construction stops.
pub fn btb_occupancy<P: Predictor + ?Sized>(
    bp: &mut P,
    session: &mut AttackSession,
    num_loops: u64,
    prune_size: usize,
    occupancy_size: usize,
) -> SetProbe {
    let space = bp.addr_space();
    let attacker = session.attacker();
    let mut probe = Counted::new(bp);
    let mut loops = 0;
    let mut prune_set: Vec<u64> = Vec::with_capacity(prune_size);
    let mut occupancy_set: Vec<u64> = Vec::new();

    while loops < num_loops
        && occupancy_set.len() < occupancy_size
        && session.within_budget(probe.accesses)
    {
        let candidate = session.random_addr(space);
        if occupancy_set.contains(&candidate) {
            continue;
        }
        prune_set.push(candidate);
        if prune_set.len() < prune_size {
            loops += 1;
            continue;
        }

        loop {
            for &addr in &prune_set {
                let _ = probe.btb(addr, ATTACKER_TARGET, attacker);
            }
            let before = prune_set.len();
            let mut i = 0;
            while i < prune_set.len() {
                if probe.btb(prune_set[i], ATTACKER_TARGET, attacker) == BtbOutcome::Invalid {
                    let _ = prune_set.remove(i);
                } else {
                    i += 1;
                }
            }
            if prune_set.len() == before {
                break;
            }
        }

        for &addr in &occupancy_set {
            let _ = probe.btb(addr, ATTACKER_TARGET, attacker);
        }
        for addr in prune_set.drain(..) {
            if probe.btb(addr, ATTACKER_TARGET, attacker) == BtbOutcome::Correct {
                occupancy_set.push(addr);
            }
        }
        loops += 1;
    }

    debug!(
        attack = "btb_occupancy",
        scheme = %probe.bp.kind(),
        loops,
        accesses = probe.accesses,
        members = occupancy_set.len()
    );
    SetProbe {
        addrs: occupancy_set,
        accesses: probe.accesses,
        loops,
    }
}

/// Re-checks a PHT occupancy set pair by pair through the timing interface.
///
/// # Returns
///
/// The number of ordered member pairs that still conflict. These accesses
/// are verification overhead and are not charged to any attack.
pub fn verify_pht_occupancy<P: Predictor + ?Sized>(
    bp: &mut P,
    session: &AttackSession,
    occupancy_set: &[u64],
) -> usize {
    let steps = saturation_steps(bp);
    let attacker = session.attacker();
    let mut probe = Counted::new(bp);
    let mut violations = 0;
    for (i, &first) in occupancy_set.iter().enumerate() {
        for (j, &second) in occupancy_set.iter().enumerate() {
            if i != j && pht_conflict(&mut probe, first, second, attacker, steps) {
                debug!(first, second, "occupancy member pair conflicts in the PHT");
                violations += 1;
            }
        }
    }
    violations
}

/// Re-checks a BTB occupancy set by priming it and re-probing every member.
///
/// # Returns
///
/// The number of members that miss on the re-probe.
pub fn verify_btb_occupancy<P: Predictor + ?Sized>(
    bp: &mut P,
    session: &AttackSession,
    occupancy_set: &[u64],
) -> usize {
    let attacker = session.attacker();
    let mut probe = Counted::new(bp);
    for &addr in occupancy_set {
        let _ = probe.btb(addr, ATTACKER_TARGET, attacker);
    }
    occupancy_set
        .iter()
        .filter(|&&addr| probe.btb(addr, ATTACKER_TARGET, attacker) == BtbOutcome::Invalid)
        .count()
}
