//! Side-channel attack algorithms.
//!
//! Every algorithm drives a predictor only through the observable outcomes of
//! [`Predictor::lookup_pht`] and [`Predictor::lookup_btb`] and reports how many
//! accesses it consumed, which is the leakage metric of every experiment.
//! The algorithms share one shape:
//!
//! 1. **Generate:** Draw a candidate address (or PID).
//! 2. **Prune:** Drop candidates that conflict with one another.
//! 3. **Probe:** Let the victim run and re-probe the candidates.
//! 4. **Accumulate:** Keep candidates whose outcome changed.
//! 5. **Terminate:** On success, after `num_loops` candidates, or once the
//!    access budget is spent.
//!
//! Failing to find a collision is an ordinary result, reported as
//! `found == None` or as a short address set.

/// Occupancy-set construction against the PHT and BTB.
pub mod occupancy;

/// Eviction-set construction against the BTB.
pub mod prune;

/// Reuse-based timing and speculative attacks.
pub mod reuse;

pub use occupancy::{btb_occupancy, pht_occupancy, verify_btb_occupancy, verify_pht_occupancy};
pub use prune::btb_prune;
pub use reuse::{btb_speculative, btb_timing, pht_speculative, pht_timing};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::addr::AddrSpace;
use crate::common::domain::Context;
use crate::config::AttackConfig;
use crate::core::predictors::Predictor;
use crate::core::units::BtbOutcome;

/// Destination the attacker plants when it only needs to occupy a BTB way.
pub const ATTACKER_TARGET: u64 = u64::MAX;

/// Attacker-side state threaded through every attack call.
///
/// Holds the attacker's generator, the optional per-call access budget and
/// the attacker and victim identities.
#[derive(Debug)]
pub struct AttackSession {
    rng: StdRng,
    max_accesses: Option<u64>,
    attacker: Context,
    victim: Context,
    rekey_each_attempt: bool,
}

impl AttackSession {
    /// Creates a session from the attack configuration.
    pub fn new(config: &AttackConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let (attacker_pid, victim_pid) = if config.random_pids {
            (rng.random::<u32>() as u64, rng.random::<u32>() as u64)
        } else {
            (config.attacker_pid, config.victim_pid)
        };
        Self {
            rng,
            max_accesses: config.max_accesses,
            attacker: Context::attacker(attacker_pid),
            victim: Context::victim(victim_pid),
            rekey_each_attempt: config.rekey_each_attempt,
        }
    }

    /// A session with default identities, no budget and a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(&AttackConfig {
            max_accesses: None,
            seed: Some(seed),
            ..AttackConfig::default()
        })
    }

    /// Attacker identity.
    pub const fn attacker(&self) -> Context {
        self.attacker
    }

    /// Victim identity.
    pub const fn victim(&self) -> Context {
        self.victim
    }

    /// Per-call access budget.
    pub const fn max_accesses(&self) -> Option<u64> {
        self.max_accesses
    }

    /// Replaces the per-call access budget.
    pub const fn set_max_accesses(&mut self, max_accesses: Option<u64>) {
        self.max_accesses = max_accesses;
    }

    /// Whether BTB attacks redraw scheme keys before every candidate.
    pub const fn set_rekey_each_attempt(&mut self, rekey: bool) {
        self.rekey_each_attempt = rekey;
    }

    /// Draws a uniformly random address.
    pub fn random_addr(&mut self, space: AddrSpace) -> u64 {
        space.random(&mut self.rng)
    }

    /// Whether `accesses` is still below the budget.
    #[inline(always)]
    pub fn within_budget(&self, accesses: u64) -> bool {
        self.max_accesses.is_none_or(|max| accesses < max)
    }
}

/// Result of a timing or speculative collision search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionProbe {
    /// Colliding attacker address, or `None` when the search gave up.
    pub found: Option<u64>,
    /// PID the attacker used for the colliding access.
    pub attacker_pid: u64,
    /// Predictor accesses consumed.
    pub accesses: u64,
    /// Candidates generated.
    pub candidates: u64,
}

impl CollisionProbe {
    /// Whether a collision was found.
    pub const fn is_found(&self) -> bool {
        self.found.is_some()
    }
}

/// Result of an eviction-set or occupancy-set construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SetProbe {
    /// Addresses in the constructed set, in discovery order.
    pub addrs: Vec<u64>,
    /// Predictor accesses consumed.
    pub accesses: u64,
    /// Loop iterations performed.
    pub loops: u64,
}

/// A predictor borrowed for one attack, counting every access made through it.
struct Counted<'p, P: ?Sized> {
    bp: &'p mut P,
    accesses: u64,
}

impl<'p, P: Predictor + ?Sized> Counted<'p, P> {
    const fn new(bp: &'p mut P) -> Self {
        Self { bp, accesses: 0 }
    }

    #[inline(always)]
    fn pht(&mut self, pc: u64, taken: bool, ctx: Context) -> bool {
        self.accesses += 1;
        self.bp.lookup_pht(pc, taken, ctx)
    }

    /// `times` identical PHT accesses, discarding the outcomes.
    #[inline(always)]
    fn pht_train(&mut self, pc: u64, taken: bool, ctx: Context, times: u64) {
        for _ in 0..times {
            let _ = self.pht(pc, taken, ctx);
        }
    }

    #[inline(always)]
    fn btb(&mut self, pc: u64, target: u64, ctx: Context) -> BtbOutcome {
        self.accesses += 1;
        self.bp.lookup_btb(pc, target, ctx)
    }
}

/// Accesses per prime: half the counter range, `2^(counter_bits - 1)`.
fn saturation_steps<P: Predictor + ?Sized>(bp: &P) -> u64 {
    1u64 << (bp.counter_bits().max(1) - 1)
}
