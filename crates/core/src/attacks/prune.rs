//! Prune-based eviction-set construction against the BTB.
//!
//! The attacker fills a prune set of random addresses, discards members that
//! evict one another until the set fits in the BTB without self-conflicts,
//! lets the victim access its branch once, and re-probes the set. Members
//! that now miss were evicted by the victim and join the eviction set.

use tracing::debug;

use super::{ATTACKER_TARGET, AttackSession, Counted, SetProbe};
use crate::core::predictors::Predictor;
use crate::core::units::BtbOutcome;

/// Builds an eviction set for the victim's BTB entry.
///
/// Each loop iteration draws one random address. Once the prune set holds
/// `prune_size` members it is pruned, probed against the victim and cleared.
/// Self-conflict pruning only removes members while the set is larger than
/// the associativity.
///
/// # Arguments
///
/// * `bp` - Predictor under attack.
/// * `session` - Attacker state and access budget.
/// * `num_loops` - Maximum loop iterations.
/// * `victim_addr` - The victim's branch address.
/// * `prune_size` - Members collected before each prune-and-probe pass.
/// * `eviction_size` - Eviction-set size at which the search stops.
///
/// # Returns
///
/// The eviction set in discovery order and the accesses consumed. The set
/// may exceed `eviction_size` when one pass finds several members.
pub fn btb_prune<P: Predictor + ?Sized>(
    bp: &mut P,
    session: &mut AttackSession,
    num_loops: u64,
    victim_addr: u64,
    prune_size: usize,
    eviction_size: usize,
) -> SetProbe {
    let space = bp.addr_space();
    let ways = bp.btb_ways();
    let attacker = session.attacker();
    let victim = session.victim();
    let mut probe = Counted::new(bp);
    let mut loops = 0;
    let mut prune_set: Vec<u64> = Vec::with_capacity(prune_size);
    let mut eviction_set: Vec<u64> = Vec::new();

    while loops < num_loops
        && eviction_set.len() < eviction_size
        && session.within_budget(probe.accesses)
    {
        let candidate = session.random_addr(space);
        if eviction_set.contains(&candidate) {
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
                let outcome = probe.btb(prune_set[i], ATTACKER_TARGET, attacker);
                if outcome == BtbOutcome::Invalid && prune_set.len() > ways {
                    let _ = prune_set.remove(i);
                } else {
                    i += 1;
                }
            }
            if prune_set.len() == before {
                break;
            }
        }

        let _ = probe.btb(victim_addr, ATTACKER_TARGET, victim);
        for addr in prune_set.drain(..) {
            if probe.btb(addr, ATTACKER_TARGET, attacker) == BtbOutcome::Invalid {
                eviction_set.push(addr);
            }
        }
        loops += 1;
    }

    debug!(
        attack = "btb_prune",
        scheme = %probe.bp.kind(),
        loops,
        accesses = probe.accesses,
        evictors = eviction_set.len()
    );
    SetProbe {
        addrs: eviction_set,
        accesses: probe.accesses,
        loops,
    }
}
