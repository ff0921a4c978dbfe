//! Noisy XOR-keyed predictor (NoisyXorBP).
//!
//! Behaves like [`XorBp`] but, on a configurable fraction of accesses, XORs a
//! random address-space value into the obfuscated index before it selects an
//! entry. One perturbation is drawn per access and covers both the lookup and
//! its implicit update. The transform helpers stay noiseless: they report where
//! an address maps in the absence of noise.

use rand::Rng;

use crate::common::domain::Context;
use crate::config::{PredictorConfig, PredictorKind};

use super::predictor::Predictor;
use super::tables::Tables;
use super::xor_bp::XorBp;

/// Noisy XOR-keyed predictor.
#[derive(Debug)]
pub struct NoisyXorBp {
    inner: XorBp,
    noise_rate: f64,
}

impl NoisyXorBp {
    /// Creates the predictor; `config.noise_rate` sets the perturbed fraction.
    pub fn new(config: &PredictorConfig, seed: u64) -> Self {
        Self {
            inner: XorBp::new(config, seed),
            noise_rate: config.noise_rate.clamp(0.0, 1.0),
        }
    }

    /// Fraction of accesses whose index is perturbed.
    pub const fn noise_rate(&self) -> f64 {
        self.noise_rate
    }

    fn noisy_value(&mut self, pc: u64) -> u64 {
        let value = self.inner.index_value(pc);
        let tables = self.inner.tables_mut();
        if tables.rng.random_bool(self.noise_rate) {
            let noise = tables.space.random(&mut tables.rng);
            tables.space.wrap(value ^ noise)
        } else {
            value
        }
    }
}

impl Predictor for NoisyXorBp {
    fn kind(&self) -> PredictorKind {
        PredictorKind::NoisyXorBp
    }

    fn tables(&self) -> &Tables {
        self.inner.tables()
    }

    fn tables_mut(&mut self) -> &mut Tables {
        self.inner.tables_mut()
    }

    fn access_pht_set(&mut self, pc: u64, _ctx: Context) -> usize {
        let value = self.noisy_value(pc);
        self.inner.tables().pht_index(value)
    }

    fn access_btb_slot(&mut self, pc: u64, _ctx: Context) -> (usize, u64) {
        let value = self.noisy_value(pc);
        let tables = self.inner.tables();
        (tables.btb_index(value), tables.btb_tag_of(value))
    }

    fn pht_set(&self, pc: u64, ctx: Context) -> usize {
        self.inner.pht_set(pc, ctx)
    }

    fn pht_key(&self, ctx: Context) -> u64 {
        self.inner.pht_key(ctx)
    }

    fn btb_set(&self, pc: u64, ctx: Context) -> usize {
        self.inner.btb_set(pc, ctx)
    }

    fn btb_tag(&self, pc: u64, ctx: Context) -> u64 {
        self.inner.btb_tag(pc, ctx)
    }

    fn btb_dest(&self, target: u64, ctx: Context) -> u64 {
        self.inner.btb_dest(target, ctx)
    }

    fn regenerate_tag_addr(&self, set: usize, tag: u64, ctx: Context) -> u64 {
        self.inner.regenerate_tag_addr(set, tag, ctx)
    }

    fn regenerate_dest_addr(&self, dest: u64, ctx: Context) -> u64 {
        self.inner.regenerate_dest_addr(dest, ctx)
    }

    fn rekey(&mut self) {
        self.inner.rekey();
    }
}
