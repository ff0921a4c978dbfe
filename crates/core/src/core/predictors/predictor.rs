//! The uniform predictor contract.
//!
//! Every scheme implements the address transforms; the table accesses are
//! provided on top of them. Attacks drive a predictor only through
//! [`lookup_pht`](Predictor::lookup_pht) and
//! [`lookup_btb`](Predictor::lookup_btb). The transform helpers exist for
//! verification and statistics.

use crate::common::addr::AddrSpace;
use crate::common::domain::Context;
use crate::config::{PredictorKind, ReplacementPolicy};
use crate::core::units::BtbOutcome;

use super::tables::Tables;

/// A branch predictor with a PHT and a BTB behind an obfuscation scheme.
pub trait Predictor {
    /// Which scheme this is.
    fn kind(&self) -> PredictorKind;

    /// Shared table state.
    fn tables(&self) -> &Tables;

    /// Mutable shared table state.
    fn tables_mut(&mut self) -> &mut Tables;

    /// PHT entry selected by `pc` under `ctx`.
    fn pht_set(&self, pc: u64, ctx: Context) -> usize;

    /// Key the PHT counter is stored under for `ctx`; 0 stores it in the clear.
    fn pht_key(&self, ctx: Context) -> u64;

    /// BTB set selected by `pc` under `ctx`.
    fn btb_set(&self, pc: u64, ctx: Context) -> usize;

    /// BTB tag stored for `pc` under `ctx`.
    fn btb_tag(&self, pc: u64, ctx: Context) -> u64;

    /// Stored form of the destination `target` under `ctx`.
    fn btb_dest(&self, target: u64, ctx: Context) -> u64;

    /// An address that maps to (`set`, `tag`) under `ctx`.
    fn regenerate_tag_addr(&self, set: usize, tag: u64, ctx: Context) -> u64;

    /// The destination a stored `dest` decodes to under `ctx`.
    fn regenerate_dest_addr(&self, dest: u64, ctx: Context) -> u64;

    /// Address width of this predictor.
    fn addr_space(&self) -> AddrSpace {
        self.tables().space
    }

    /// PHT counter width.
    fn counter_bits(&self) -> u32 {
        self.tables().pht.counter_bits()
    }

    /// BTB associativity.
    fn btb_ways(&self) -> usize {
        self.tables().btb.ways()
    }

    /// Reallocates the PHT.
    ///
    /// # Arguments
    ///
    /// * `counter_bits` - Saturating counter width.
    /// * `counter_nums` - Number of counters.
    /// * `offset` - Low address bits discarded before indexing.
    fn init_pht(&mut self, counter_bits: u32, counter_nums: usize, offset: u32) {
        self.tables_mut().init_pht(counter_bits, counter_nums, offset);
    }

    /// Reallocates the BTB.
    ///
    /// # Arguments
    ///
    /// * `ways` - Associativity.
    /// * `sets` - Number of sets, a power of two.
    /// * `offset` - Low address bits discarded before indexing.
    /// * `policy` - Replacement policy.
    fn init_btb(&mut self, ways: usize, sets: usize, offset: u32, policy: ReplacementPolicy) {
        self.tables_mut().init_btb(ways, sets, offset, policy);
    }

    /// PHT entry used by the next access; schemes with index noise perturb it.
    fn access_pht_set(&mut self, pc: u64, ctx: Context) -> usize {
        self.pht_set(pc, ctx)
    }

    /// BTB set and tag used by the next access; schemes with index noise perturb them.
    fn access_btb_slot(&mut self, pc: u64, ctx: Context) -> (usize, u64) {
        (self.btb_set(pc, ctx), self.btb_tag(pc, ctx))
    }

    /// Predicts `taken` for `pc` and trains the entry.
    ///
    /// # Returns
    ///
    /// Whether the prediction before the update matched `taken`; always
    /// `false` on the first touch of an entry.
    fn lookup_pht(&mut self, pc: u64, taken: bool, ctx: Context) -> bool {
        let index = self.access_pht_set(pc, ctx);
        let key = self.pht_key(ctx);
        self.tables_mut().pht.lookup(index, taken, key)
    }

    /// Trains the PHT entry of `pc` toward `taken`.
    fn update_pht(&mut self, pc: u64, taken: bool, ctx: Context) {
        let index = self.access_pht_set(pc, ctx);
        let key = self.pht_key(ctx);
        self.tables_mut().pht.update(index, taken, key);
    }

    /// Looks up `pc` in the BTB predicting `target`, then writes it.
    fn lookup_btb(&mut self, pc: u64, target: u64, ctx: Context) -> BtbOutcome {
        let (set, tag) = self.access_btb_slot(pc, ctx);
        let dest = self.btb_dest(target, ctx);
        self.tables_mut().btb.lookup(set, tag, dest)
    }

    /// Writes `target` into the way holding `pc`, if any.
    fn update_btb(&mut self, pc: u64, target: u64, ctx: Context) {
        let (set, tag) = self.access_btb_slot(pc, ctx);
        let dest = self.btb_dest(target, ctx);
        self.tables_mut().btb.update(set, tag, dest);
    }

    /// Oracle check: do `a` under `ctx_a` and `b` under `ctx_b` share a PHT entry.
    fn check_pht_set_collision(&self, a: u64, ctx_a: Context, b: u64, ctx_b: Context) -> bool {
        self.pht_set(a, ctx_a) == self.pht_set(b, ctx_b)
    }

    /// Whether the scheme folds the PID into its index.
    ///
    /// An attacker against such a scheme probes the BTB by varying its PID at
    /// the victim's own address instead of varying the address.
    fn pid_keyed(&self) -> bool {
        false
    }

    /// Redraws the scheme's keys; unkeyed schemes ignore this.
    fn rekey(&mut self) {}
}
