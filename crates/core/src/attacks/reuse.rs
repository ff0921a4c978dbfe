//! Reuse-based attacks.
//!
//! The attacker plants state under a candidate address and watches whether
//! the victim's next access observes it:
//!
//! - **PHT:** prime the victim's counter toward taken, push the candidate's
//!   counter to the opposite side, and re-probe the victim. A flipped
//!   prediction means both addresses share a counter.
//! - **BTB:** let the victim allocate its entry, write a foreign destination
//!   under the candidate, and re-probe the victim. A mispredict means the
//!   candidate shares the victim's set and tag.

use tracing::{Level, debug, enabled, trace};

use super::{ATTACKER_TARGET, AttackSession, CollisionProbe, Counted, saturation_steps};
use crate::common::domain::Context;
use crate::core::predictors::Predictor;
use crate::core::units::BtbOutcome;

/// Searches for an address sharing the victim's PHT counter.
///
/// For each random candidate the attacker runs `2^(counter_bits - 1)` rounds.
/// Round `i` re-primes the victim with taken accesses, saturates the candidate
/// toward taken, walks it back with `i + 1` not-taken accesses, then probes
/// the victim once. A mispredicted probe reports the candidate.
///
/// # Arguments
///
/// * `bp` - Predictor under attack.
/// * `session` - Attacker state and access budget.
/// * `num_loops` - Maximum number of candidates.
/// * `victim_addr` - The victim's branch address.
pub fn pht_timing<P: Predictor + ?Sized>(
    bp: &mut P,
    session: &mut AttackSession,
    num_loops: u64,
    victim_addr: u64,
) -> CollisionProbe {
    let probe = pht_reuse(bp, session, num_loops, victim_addr);
    debug!(
        attack = "pht_timing",
        scheme = %bp.kind(),
        candidates = probe.candidates,
        accesses = probe.accesses,
        found = ?probe.found
    );
    probe
}

/// Speculative variant of [`pht_timing`].
///
/// The victim's probe is a speculatively executed branch whose direction the
/// attacker reads back through a cache side effect instead of timing; the
/// access pattern and the flipped-prediction criterion are the same.
pub fn pht_speculative<P: Predictor + ?Sized>(
    bp: &mut P,
    session: &mut AttackSession,
    num_loops: u64,
    victim_addr: u64,
) -> CollisionProbe {
    let probe = pht_reuse(bp, session, num_loops, victim_addr);
    debug!(
        attack = "pht_speculative",
        scheme = %bp.kind(),
        candidates = probe.candidates,
        accesses = probe.accesses,
        found = ?probe.found
    );
    probe
}

fn pht_reuse<P: Predictor + ?Sized>(
    bp: &mut P,
    session: &mut AttackSession,
    num_loops: u64,
    victim_addr: u64,
) -> CollisionProbe {
    let steps = saturation_steps(bp);
    let space = bp.addr_space();
    let attacker = session.attacker();
    let victim = session.victim();
    let mut probe = Counted::new(bp);
    let mut candidates = 0;

    while candidates < num_loops && session.within_budget(probe.accesses) {
        let candidate = session.random_addr(space);
        candidates += 1;
        for round in 0..steps {
            probe.pht_train(victim_addr, true, victim, steps);
            probe.pht_train(candidate, true, attacker, steps);
            probe.pht_train(candidate, false, attacker, round + 1);
            let hit = probe.pht(victim_addr, true, victim);

            if enabled!(Level::TRACE)
                && probe.bp.check_pht_set_collision(candidate, attacker, victim_addr, victim) {
                trace!(candidate, victim_addr, round, hit, "oracle: PHT entry shared");
            }

            if !hit {
                return CollisionProbe {
                    found: Some(candidate),
                    attacker_pid: attacker.pid,
                    accesses: probe.accesses,
                    candidates,
                };
            }
        }
    }

    CollisionProbe {
        found: None,
        attacker_pid: attacker.pid,
        accesses: probe.accesses,
        candidates,
    }
}

/// Draws the next BTB candidate.
///
/// PID-keyed schemes are attacked at the victim's own address under a random
/// attacker PID; other schemes under a random address. Returns `None` when the
/// drawn PID equals the victim's, which is skipped without counting.
fn next_btb_candidate<P: Predictor + ?Sized>(
    bp: &mut P,
    session: &mut AttackSession,
    victim_addr: u64,
) -> Option<(u64, Context)> {
    let space = bp.addr_space();
    let attacker = session.attacker();
    let candidate = if bp.pid_keyed() {
        let pid = session.random_addr(space);
        if pid == session.victim().pid {
            return None;
        }
        (victim_addr, attacker.with_pid(pid))
    } else {
        (session.random_addr(space), attacker)
    };
    if session.rekey_each_attempt {
        bp.rekey();
    }
    Some(candidate)
}

/// Outcome of one BTB plant-and-reprobe round.
fn btb_round<P: Predictor + ?Sized>(
    probe: &mut Counted<'_, P>,
    victim_addr: u64,
    target_addr: u64,
    victim: Context,
    candidate: u64,
    attacker: Context,
) -> bool {
    let _ = probe.btb(victim_addr, target_addr, victim);
    let _ = probe.btb(candidate, ATTACKER_TARGET, attacker);
    let outcome = probe.btb(victim_addr, target_addr, victim);

    if enabled!(Level::TRACE)
        && probe.bp.btb_set(candidate, attacker) == probe.bp.btb_set(victim_addr, victim)
        && probe.bp.btb_tag(candidate, attacker) == probe.bp.btb_tag(victim_addr, victim)
    {
        trace!(
            candidate,
            pid = attacker.pid,
            victim_addr,
            %outcome,
            "oracle: BTB set and tag shared"
        );
    }

    outcome == BtbOutcome::Mispredict
}

/// Searches for an attacker address (or PID) sharing the victim's BTB entry.
///
/// Each candidate costs three accesses: the victim allocates its entry with
/// `target_addr`, the attacker accesses the candidate with a foreign
/// destination, and the victim re-probes. A mispredicted re-probe reports the
/// candidate.
///
/// # Arguments
///
/// * `bp` - Predictor under attack.
/// * `session` - Attacker state and access budget.
/// * `num_loops` - Maximum number of candidates.
/// * `victim_addr` - The victim's branch address.
/// * `target_addr` - The victim's branch target.
pub fn btb_timing<P: Predictor + ?Sized>(
    bp: &mut P,
    session: &mut AttackSession,
    num_loops: u64,
    victim_addr: u64,
    target_addr: u64,
) -> CollisionProbe {
    let attacker = session.attacker();
    let victim = session.victim();
    let mut candidates = 0;
    let mut probe = Counted::new(bp);
    let mut result = CollisionProbe {
        found: None,
        attacker_pid: attacker.pid,
        accesses: 0,
        candidates: 0,
    };

    while candidates < num_loops && session.within_budget(probe.accesses) {
        let Some((candidate, ctx)) = next_btb_candidate(&mut *probe.bp, session, victim_addr) else {
            continue;
        };
        candidates += 1;
        if btb_round(&mut probe, victim_addr, target_addr, victim, candidate, ctx) {
            result.found = Some(candidate);
            result.attacker_pid = ctx.pid;
            break;
        }
    }

    result.accesses = probe.accesses;
    result.candidates = candidates;
    debug!(
        attack = "btb_timing",
        scheme = %probe.bp.kind(),
        candidates,
        accesses = result.accesses,
        found = ?result.found
    );
    result
}

/// Finds a BTB collision, then uses it as a covert channel.
///
/// After [`btb_timing`]'s search succeeds, the attacker repeatedly writes
/// `covert_channel` as the destination of the colliding entry; the victim
/// decodes that value with its own content key. The channel works when the
/// decoding leaves `covert_channel` unchanged, which any nonzero content key
/// prevents. Each transmission costs two accesses and counts against
/// `num_loops` together with the search candidates.
///
/// # Arguments
///
/// * `bp` - Predictor under attack.
/// * `session` - Attacker state and access budget.
/// * `num_loops` - Maximum number of candidates plus transmissions.
/// * `victim_addr` - The victim's branch address.
/// * `target_addr` - The victim's branch target.
/// * `covert_channel` - Value the attacker tries to transmit.
pub fn btb_speculative<P: Predictor + ?Sized>(
    bp: &mut P,
    session: &mut AttackSession,
    num_loops: u64,
    victim_addr: u64,
    target_addr: u64,
    covert_channel: u64,
) -> CollisionProbe {
    let attacker = session.attacker();
    let victim = session.victim();
    let mut candidates = 0;
    let mut transmissions = 0;
    let mut probe = Counted::new(bp);
    let mut result = CollisionProbe {
        found: None,
        attacker_pid: attacker.pid,
        accesses: 0,
        candidates: 0,
    };

    'search: while candidates + transmissions < num_loops
        && session.within_budget(probe.accesses)
    {
        let Some((candidate, ctx)) = next_btb_candidate(&mut *probe.bp, session, victim_addr) else {
            continue;
        };
        candidates += 1;
        if !btb_round(&mut probe, victim_addr, target_addr, victim, candidate, ctx) {
            continue;
        }
        debug!(candidate, pid = ctx.pid, candidates, "btb_speculative: collision found");

        while candidates + transmissions < num_loops && session.within_budget(probe.accesses) {
            transmissions += 1;
            let _ = probe.btb(candidate, covert_channel, ctx);
            // The victim's speculative fetch through the shared entry.
            probe.accesses += 1;
            if probe.bp.regenerate_dest_addr(covert_channel, victim) == covert_channel {
                result.found = Some(candidate);
                result.attacker_pid = ctx.pid;
                break 'search;
            }
        }
        break;
    }

    result.accesses = probe.accesses;
    result.candidates = candidates;
    debug!(
        attack = "btb_speculative",
        scheme = %probe.bp.kind(),
        candidates,
        transmissions,
        accesses = result.accesses,
        found = ?result.found
    );
    result
}
