//! Experiment drivers.
//!
//! A [`Bench`] owns the seven predictors, the attacker session and the
//! secrets for the lifetime of a run. Predictor state is never reset between
//! repetitions, so later attacks see the residue of earlier ones, as a real
//! shared predictor would.
//!
//! Sweeps that vary the access budget install it on the session for the
//! duration of the sweep step and restore the configured budget afterwards.

use std::io::Write;

use tracing::{debug, info};

use crate::attacks::{self, AttackSession, SetProbe};
use crate::common::addr::AddrSpace;
use crate::common::domain::Context;
use crate::common::error::{ConfigError, ExperimentError};
use crate::config::{Config, ExperimentConfig};
use crate::core::predictors::{Predictor, PredictorWrapper};
use crate::core::units::BtbOutcome;
use crate::sim::experiment::Experiment;
use crate::stats::{LeakageHistogram, StatRow, mean};

/// Prune-set size and largest budget of `prune-btb-collision`.
const PRUNE_BTB_COLLISION: (usize, u64) = (3800, 300_000);
/// Prune-set size and largest budget of `occupancy-pht-collision`.
const OCCUPANCY_PHT_COLLISION: (usize, u64) = (20, 500_000);
/// Prune-set size and largest budget of `occupancy-btb-collision`.
const OCCUPANCY_BTB_COLLISION: (usize, u64) = (600, 200_000);
/// Prune-set size and largest budget of `leakage-pht`.
const LEAKAGE_PHT: (usize, u64) = (20, 500_000);
/// Prune-set size and largest budget of `leakage-btb`.
const LEAKAGE_BTB: (usize, u64) = (600, 200_000);
/// Evictions per leakage-btb bucket; one BTB set holds this many ways by default.
const BTB_MISSES_PER_SECRET: usize = 4;

/// The seven predictors plus the attacker state shared by every experiment.
#[derive(Debug)]
pub struct Bench {
    predictors: Vec<PredictorWrapper>,
    session: AttackSession,
    secrets: Vec<u64>,
    num_loops: u64,
    max_accesses: Option<u64>,
    sweep: ExperimentConfig,
    space: AddrSpace,
}

impl Bench {
    /// Builds all predictors and draws `config.experiment.secrets` secrets.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let predictors = PredictorWrapper::build_all(&config.predictor)?;
        let mut bench = Self {
            predictors,
            session: AttackSession::new(&config.attack),
            secrets: Vec::new(),
            num_loops: config.attack.num_loops,
            max_accesses: config.attack.max_accesses,
            sweep: config.experiment.clone(),
            space: AddrSpace::new(config.predictor.addr_space),
        };
        bench.draw_secrets(config.experiment.secrets);
        Ok(bench)
    }

    /// Predictors in reporting order.
    pub fn predictors(&self) -> &[PredictorWrapper] {
        &self.predictors
    }

    /// Current secrets; `secrets()[0..3]` are the victim branch, its target and
    /// the covert channel.
    pub fn secrets(&self) -> &[u64] {
        &self.secrets
    }

    /// Attacker session.
    pub const fn session(&self) -> &AttackSession {
        &self.session
    }

    /// Replaces the secrets with `count` fresh random addresses (at least three).
    pub fn draw_secrets(&mut self, count: usize) {
        let space = self.space;
        self.secrets = (0..count.max(3))
            .map(|_| self.session.random_addr(space))
            .collect();
    }

    /// Runs one experiment, writing its rows to `out`.
    ///
    /// # Arguments
    ///
    /// * `experiment` - Experiment to run.
    /// * `size` - Largest prune-set size or secret count, per
    ///   [`Experiment::size_meaning`].
    /// * `repeats` - Repetitions per sweep step.
    /// * `out` - Statistics sink, flushed once the experiment completes.
    pub fn run<W: Write + ?Sized>(
        &mut self,
        experiment: Experiment,
        size: u64,
        repeats: u64,
        out: &mut W,
    ) -> Result<(), ExperimentError> {
        info!(%experiment, size, repeats, "running experiment");
        let result = match experiment {
            Experiment::ReuseAccess => self.reuse_access(repeats, out),
            Experiment::ReuseCollision => self.reuse_collision(repeats, out),
            Experiment::PruneBtbPrune => self.prune_btb_prune(size as usize, repeats, out),
            Experiment::PruneBtbCollision => {
                let (prune_size, max_budget) = PRUNE_BTB_COLLISION;
                self.prune_btb_collision(prune_size, max_budget, repeats, out)
            }
            Experiment::OccupancyPhtPrune => {
                self.occupancy_pht_prune(size as usize, repeats, out)
            }
            Experiment::OccupancyPhtCollision => {
                let (prune_size, max_budget) = OCCUPANCY_PHT_COLLISION;
                self.occupancy_pht_collision(prune_size, max_budget, repeats, out)
            }
            Experiment::OccupancyBtbPrune => {
                self.occupancy_btb_prune(size as usize, repeats, out)
            }
            Experiment::OccupancyBtbCollision => {
                let (prune_size, max_budget) = OCCUPANCY_BTB_COLLISION;
                self.occupancy_btb_collision(prune_size, max_budget, repeats, out)
            }
            Experiment::LeakagePht => {
                self.draw_secrets(size as usize);
                let (prune_size, max_budget) = LEAKAGE_PHT;
                self.leakage_pht(prune_size, max_budget, repeats, out)
            }
            Experiment::LeakageBtb => {
                self.draw_secrets(size as usize);
                let (prune_size, max_budget) = LEAKAGE_BTB;
                self.leakage_btb(prune_size, max_budget, repeats, out)
            }
        };
        result?;
        out.flush()?;
        Ok(())
    }

    // ══════════════════════════════════════════════════════════
    // Reuse
    // ══════════════════════════════════════════════════════════

    /// Per repetition: PHT timing, BTB timing and BTB speculative access
    /// counts for every predictor, 21 values per row.
    pub fn reuse_access<W: Write + ?Sized>(
        &mut self,
        repeats: u64,
        out: &mut W,
    ) -> Result<(), ExperimentError> {
        let (victim_addr, target_addr, covert) = self.reuse_targets();
        let loops = self.num_loops;
        self.session.set_max_accesses(self.max_accesses);
        for repeat in 0..repeats {
            debug!(repeat, "reuse-access");
            let mut row = StatRow::with_capacity(3 * self.predictors.len());
            for bp in &mut self.predictors {
                let probe = attacks::pht_timing(bp, &mut self.session, loops, victim_addr);
                row.push(probe.accesses);
            }
            for bp in &mut self.predictors {
                let probe =
                    attacks::btb_timing(bp, &mut self.session, loops, victim_addr, target_addr);
                row.push(probe.accesses);
            }
            for bp in &mut self.predictors {
                let probe = attacks::btb_speculative(
                    bp,
                    &mut self.session,
                    loops,
                    victim_addr,
                    target_addr,
                    covert,
                );
                row.push(probe.accesses);
            }
            writeln!(out, "{row}")?;
        }
        Ok(())
    }

    /// Per budget: how many of `repeats` attempts of each reuse attack found
    /// a collision within the budget.
    pub fn reuse_collision<W: Write + ?Sized>(
        &mut self,
        repeats: u64,
        out: &mut W,
    ) -> Result<(), ExperimentError> {
        let (victim_addr, target_addr, covert) = self.reuse_targets();
        let loops = self.num_loops;
        let budgets = self.sweep.reuse_budgets.clone();
        for budget in budgets {
            debug!(budget, "reuse-collision");
            self.session.set_max_accesses(Some(budget));
            let n = self.predictors.len();
            let mut pht = vec![0; n];
            let mut timing = vec![0; n];
            let mut speculative = vec![0; n];
            for _ in 0..repeats {
                for (i, bp) in self.predictors.iter_mut().enumerate() {
                    let probe = attacks::pht_timing(bp, &mut self.session, loops, victim_addr);
                    pht[i] += u64::from(probe.is_found() && probe.accesses <= budget);
                }
            }
            for _ in 0..repeats {
                for (i, bp) in self.predictors.iter_mut().enumerate() {
                    let probe =
                        attacks::btb_timing(bp, &mut self.session, loops, victim_addr, target_addr);
                    timing[i] += u64::from(probe.is_found() && probe.accesses <= budget);
                }
            }
            for _ in 0..repeats {
                for (i, bp) in self.predictors.iter_mut().enumerate() {
                    let probe = attacks::btb_speculative(
                        bp,
                        &mut self.session,
                        loops,
                        victim_addr,
                        target_addr,
                        covert,
                    );
                    speculative[i] += u64::from(probe.is_found() && probe.accesses <= budget);
                }
            }
            let row: StatRow = pht.into_iter().chain(timing).chain(speculative).collect();
            writeln!(out, "{row}")?;
        }
        self.session.set_max_accesses(self.max_accesses);
        Ok(())
    }

    // ══════════════════════════════════════════════════════════
    // Eviction sets
    // ══════════════════════════════════════════════════════════

    /// Per prune-set size (one `prune_step` apart up to `max_prune_size`): the
    /// mean cost of finding a single evicting address.
    pub fn prune_btb_prune<W: Write + ?Sized>(
        &mut self,
        max_prune_size: usize,
        repeats: u64,
        out: &mut W,
    ) -> Result<(), ExperimentError> {
        let loops = self.num_loops;
        let victim_addr = self.secrets[0];
        self.session.set_max_accesses(self.max_accesses);
        let step = self.sweep.prune_step.max(1);
        for prune_size in (step..=max_prune_size).step_by(step) {
            debug!(prune_size, "prune-btb-prune");
            let mut totals = vec![0u64; self.predictors.len()];
            for _ in 0..repeats {
                for (i, bp) in self.predictors.iter_mut().enumerate() {
                    let set = attacks::btb_prune(
                        bp,
                        &mut self.session,
                        loops,
                        victim_addr,
                        prune_size,
                        1,
                    );
                    totals[i] += set.accesses;
                }
            }
            let row: StatRow = totals.into_iter().map(|total| mean(total, repeats)).collect();
            writeln!(out, "{row}")?;
        }
        Ok(())
    }

    /// Per budget: how often an eviction set built within the budget detects
    /// the victim's branch.
    pub fn prune_btb_collision<W: Write + ?Sized>(
        &mut self,
        prune_size: usize,
        max_budget: u64,
        repeats: u64,
        out: &mut W,
    ) -> Result<(), ExperimentError> {
        let loops = self.num_loops;
        let victim_addr = self.secrets[0];
        let eviction_size = self.sweep.eviction_size;
        for budget in self.budgets(max_budget) {
            debug!(budget, "prune-btb-collision");
            self.session.set_max_accesses(Some(budget));
            let attacker = self.session.attacker();
            let victim = self.session.victim();
            let mut hits = vec![0u64; self.predictors.len()];
            for _ in 0..repeats {
                for (i, bp) in self.predictors.iter_mut().enumerate() {
                    let set = attacks::btb_prune(
                        bp,
                        &mut self.session,
                        loops,
                        victim_addr,
                        prune_size,
                        eviction_size,
                    );
                    if set.accesses <= budget
                        && evictions(bp, &set, &[victim_addr], attacker, victim) > 0
                    {
                        hits[i] += 1;
                    }
                }
            }
            writeln!(out, "{}", StatRow::from(hits))?;
        }
        self.session.set_max_accesses(self.max_accesses);
        Ok(())
    }

    // ══════════════════════════════════════════════════════════
    // Occupancy sets
    // ══════════════════════════════════════════════════════════

    /// Per prune-set size from 1 to `max_prune_size`: the mean cost of
    /// building a PHT occupancy set.
    pub fn occupancy_pht_prune<W: Write + ?Sized>(
        &mut self,
        max_prune_size: usize,
        repeats: u64,
        out: &mut W,
    ) -> Result<(), ExperimentError> {
        let loops = self.num_loops;
        self.session.set_max_accesses(self.max_accesses);
        let occupancy_size = self.sweep.pht_occupancy_size;
        for prune_size in 1..=max_prune_size {
            debug!(prune_size, "occupancy-pht-prune");
            let mut totals = vec![0u64; self.predictors.len()];
            for _ in 0..repeats {
                for (i, bp) in self.predictors.iter_mut().enumerate() {
                    let set = attacks::pht_occupancy(
                        bp,
                        &mut self.session,
                        loops,
                        prune_size,
                        occupancy_size,
                    );
                    totals[i] += set.accesses;
                }
            }
            let row: StatRow = totals.into_iter().map(|total| mean(total, repeats)).collect();
            writeln!(out, "{row}")?;
        }
        Ok(())
    }

    /// Per budget: how often a PHT occupancy set covers the victim's counter.
    pub fn occupancy_pht_collision<W: Write + ?Sized>(
        &mut self,
        prune_size: usize,
        max_budget: u64,
        repeats: u64,
        out: &mut W,
    ) -> Result<(), ExperimentError> {
        let loops = self.num_loops;
        let victim_addr = self.secrets[0];
        let occupancy_size = self.sweep.pht_occupancy_size;
        for budget in self.budgets(max_budget) {
            debug!(budget, "occupancy-pht-collision");
            self.session.set_max_accesses(Some(budget));
            let attacker = self.session.attacker();
            let victim = self.session.victim();
            let mut hits = vec![0u64; self.predictors.len()];
            for _ in 0..repeats {
                for (i, bp) in self.predictors.iter_mut().enumerate() {
                    let set = attacks::pht_occupancy(
                        bp,
                        &mut self.session,
                        loops,
                        prune_size,
                        occupancy_size,
                    );
                    let covered = set
                        .addrs
                        .iter()
                        .any(|&a| bp.check_pht_set_collision(a, attacker, victim_addr, victim));
                    if covered {
                        hits[i] += 1;
                    }
                }
            }
            writeln!(out, "{}", StatRow::from(hits))?;
        }
        self.session.set_max_accesses(self.max_accesses);
        Ok(())
    }

    /// Per prune-set size (one `prune_step` apart up to `max_prune_size`): the
    /// mean cost of building a BTB occupancy set.
    pub fn occupancy_btb_prune<W: Write + ?Sized>(
        &mut self,
        max_prune_size: usize,
        repeats: u64,
        out: &mut W,
    ) -> Result<(), ExperimentError> {
        let loops = self.num_loops;
        self.session.set_max_accesses(self.max_accesses);
        let occupancy_size = self.sweep.btb_occupancy_size;
        let step = self.sweep.prune_step.max(1);
        for prune_size in (step..=max_prune_size).step_by(step) {
            debug!(prune_size, "occupancy-btb-prune");
            let mut totals = vec![0u64; self.predictors.len()];
            for _ in 0..repeats {
                for (i, bp) in self.predictors.iter_mut().enumerate() {
                    let set = attacks::btb_occupancy(
                        bp,
                        &mut self.session,
                        loops,
                        prune_size,
                        occupancy_size,
                    );
                    totals[i] += set.accesses;
                }
            }
            let row: StatRow = totals.into_iter().map(|total| mean(total, repeats)).collect();
            writeln!(out, "{row}")?;
        }
        Ok(())
    }

    /// Per budget: how often a BTB occupancy set notices the victim's branch.
    pub fn occupancy_btb_collision<W: Write + ?Sized>(
        &mut self,
        prune_size: usize,
        max_budget: u64,
        repeats: u64,
        out: &mut W,
    ) -> Result<(), ExperimentError> {
        let loops = self.num_loops;
        let victim_addr = self.secrets[0];
        let occupancy_size = self.sweep.btb_occupancy_size;
        for budget in self.budgets(max_budget) {
            debug!(budget, "occupancy-btb-collision");
            self.session.set_max_accesses(Some(budget));
            let attacker = self.session.attacker();
            let victim = self.session.victim();
            let mut hits = vec![0u64; self.predictors.len()];
            for _ in 0..repeats {
                for (i, bp) in self.predictors.iter_mut().enumerate() {
                    let set = attacks::btb_occupancy(
                        bp,
                        &mut self.session,
                        loops,
                        prune_size,
                        occupancy_size,
                    );
                    if evictions(bp, &set, &[victim_addr], attacker, victim) > 0 {
                        hits[i] += 1;
                    }
                }
            }
            writeln!(out, "{}", StatRow::from(hits))?;
        }
        self.session.set_max_accesses(self.max_accesses);
        Ok(())
    }

    // ══════════════════════════════════════════════════════════
    // Leakage
    // ══════════════════════════════════════════════════════════

    /// Per budget: histogram of how many PHT occupancy-set members share a
    /// counter with some secret, `leakage_buckets` buckets per predictor.
    pub fn leakage_pht<W: Write + ?Sized>(
        &mut self,
        prune_size: usize,
        max_budget: u64,
        repeats: u64,
        out: &mut W,
    ) -> Result<(), ExperimentError> {
        let loops = self.num_loops;
        let occupancy_size = self.sweep.pht_occupancy_size;
        for budget in self.budgets(max_budget) {
            debug!(budget, "leakage-pht");
            self.session.set_max_accesses(Some(budget));
            let attacker = self.session.attacker();
            let victim = self.session.victim();
            let mut hist =
                LeakageHistogram::new(self.predictors.len(), self.sweep.leakage_buckets);
            for _ in 0..repeats {
                for (i, bp) in self.predictors.iter_mut().enumerate() {
                    let set = attacks::pht_occupancy(
                        bp,
                        &mut self.session,
                        loops,
                        prune_size,
                        occupancy_size,
                    );
                    let leaked = set
                        .addrs
                        .iter()
                        .filter(|&&a| {
                            self.secrets
                                .iter()
                                .any(|&s| bp.check_pht_set_collision(a, attacker, s, victim))
                        })
                        .count();
                    hist.record(i, leaked);
                }
            }
            writeln!(out, "{}", hist.to_row())?;
        }
        self.session.set_max_accesses(self.max_accesses);
        Ok(())
    }

    /// Per budget: histogram of BTB occupancy-set evictions caused by the
    /// victim accessing every secret, bucketed per evicted set's worth of ways.
    pub fn leakage_btb<W: Write + ?Sized>(
        &mut self,
        prune_size: usize,
        max_budget: u64,
        repeats: u64,
        out: &mut W,
    ) -> Result<(), ExperimentError> {
        let loops = self.num_loops;
        let occupancy_size = self.sweep.btb_occupancy_size;
        for budget in self.budgets(max_budget) {
            debug!(budget, "leakage-btb");
            self.session.set_max_accesses(Some(budget));
            let attacker = self.session.attacker();
            let victim = self.session.victim();
            let mut hist =
                LeakageHistogram::new(self.predictors.len(), self.sweep.leakage_buckets);
            for _ in 0..repeats {
                for (i, bp) in self.predictors.iter_mut().enumerate() {
                    let set = attacks::btb_occupancy(
                        bp,
                        &mut self.session,
                        loops,
                        prune_size,
                        occupancy_size,
                    );
                    let misses = evictions(bp, &set, &self.secrets, attacker, victim);
                    hist.record(i, misses / BTB_MISSES_PER_SECRET);
                }
            }
            writeln!(out, "{}", hist.to_row())?;
        }
        self.session.set_max_accesses(self.max_accesses);
        Ok(())
    }

    fn reuse_targets(&self) -> (u64, u64, u64) {
        (self.secrets[0], self.secrets[1], self.secrets[2])
    }

    /// Budgets `budget_step, 2 * budget_step, ...` up to `max_budget`.
    fn budgets(&self, max_budget: u64) -> impl Iterator<Item = u64> + use<> {
        let step = self.sweep.budget_step.max(1);
        (step..=max_budget).step_by(step as usize)
    }
}

/// Primes `set` in the BTB, lets the victim access `victim_addrs`, and counts
/// the members that were evicted.
fn evictions<P: Predictor + ?Sized>(
    bp: &mut P,
    set: &SetProbe,
    victim_addrs: &[u64],
    attacker: Context,
    victim: Context,
) -> usize {
    for &addr in &set.addrs {
        let _ = bp.lookup_btb(addr, addr, attacker);
    }
    for &addr in victim_addrs {
        let _ = bp.lookup_btb(addr, addr, victim);
    }
    set.addrs
        .iter()
        .filter(|&&addr| bp.lookup_btb(addr, addr, attacker) == BtbOutcome::Invalid)
        .count()
}
