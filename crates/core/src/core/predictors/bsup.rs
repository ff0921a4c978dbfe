//! Narrow-counter baseline (BSUP).
//!
//! Uses the baseline transforms unchanged but always builds its PHT with
//! 3-bit counters, whatever width the caller asks for. The wider counter
//! doubles the probes a reuse attack needs per candidate.

use crate::common::domain::Context;
use crate::config::{PredictorConfig, PredictorKind};

use super::predictor::Predictor;
use super::tables::Tables;

/// Counter width the scheme is fixed to.
pub const BSUP_COUNTER_BITS: u32 = 3;

/// Narrow-counter predictor.
#[derive(Debug)]
pub struct Bsup {
    tables: Tables,
}

impl Bsup {
    /// Creates the predictor; `config.pht.counter_bits` is overridden.
    pub fn new(config: &PredictorConfig, seed: u64) -> Self {
        let mut tables = Tables::new(config, seed);
        tables.init_pht(BSUP_COUNTER_BITS, config.pht.counter_nums, config.pht.offset);
        Self { tables }
    }
}

impl Predictor for Bsup {
    fn kind(&self) -> PredictorKind {
        PredictorKind::Bsup
    }

    fn tables(&self) -> &Tables {
        &self.tables
    }

    fn tables_mut(&mut self) -> &mut Tables {
        &mut self.tables
    }

    /// Reallocates the PHT with 3-bit counters, ignoring `counter_bits`.
    fn init_pht(&mut self, _counter_bits: u32, counter_nums: usize, offset: u32) {
        self.tables.init_pht(BSUP_COUNTER_BITS, counter_nums, offset);
    }

    fn pht_set(&self, pc: u64, _ctx: Context) -> usize {
        self.tables.pht_index(self.tables.space.wrap(pc))
    }

    fn pht_key(&self, _ctx: Context) -> u64 {
        0
    }

    fn btb_set(&self, pc: u64, _ctx: Context) -> usize {
        self.tables.btb_index(self.tables.space.wrap(pc))
    }

    fn btb_tag(&self, pc: u64, _ctx: Context) -> u64 {
        self.tables.btb_tag_of(self.tables.space.wrap(pc))
    }

    fn btb_dest(&self, target: u64, _ctx: Context) -> u64 {
        target
    }

    fn regenerate_tag_addr(&self, set: usize, tag: u64, _ctx: Context) -> u64 {
        self.tables.space.wrap(self.tables.join_set_tag(set, tag))
    }

    fn regenerate_dest_addr(&self, dest: u64, _ctx: Context) -> u64 {
        dest
    }
}
