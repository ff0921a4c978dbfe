//! Unprotected baseline predictor.
//!
//! Indices and tags are plain address bit fields and destinations are stored
//! in the clear. The security domain and PID are ignored, so attacker and
//! victim share every entry exactly as on hardware without isolation:
//!
//! - PHT entry: `(pc >> offset) mod counter_nums`
//! - BTB set: `(pc >> offset) mod sets`
//! - BTB tag: `pc >> offset >> log2(sets)`

use crate::common::domain::Context;
use crate::config::{PredictorConfig, PredictorKind};

use super::predictor::Predictor;
use super::tables::Tables;

/// Baseline predictor.
#[derive(Debug)]
pub struct BaseBpu {
    tables: Tables,
}

impl BaseBpu {
    /// Creates a baseline predictor.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated predictor configuration.
    /// * `seed` - Seed for the random replacement policy.
    pub fn new(config: &PredictorConfig, seed: u64) -> Self {
        Self {
            tables: Tables::new(config, seed),
        }
    }
}

impl Predictor for BaseBpu {
    fn kind(&self) -> PredictorKind {
        PredictorKind::Base
    }

    fn tables(&self) -> &Tables {
        &self.tables
    }

    fn tables_mut(&mut self) -> &mut Tables {
        &mut self.tables
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
