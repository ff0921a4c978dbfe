//! Branch predictor schemes.
//!
//! This module contains the uniform predictor contract and its seven
//! implementations, each differing only in how addresses are transformed
//! before indexing, tagging and content comparison:
//!
//! | Scheme | Index | Content |
//! |---|---|---|
//! | [`BaseBpu`] | identity | identity |
//! | [`Bsup`] | identity | identity, 3-bit counters |
//! | [`XorBp`] | XOR, shared key | XOR, per-domain key |
//! | [`NoisyXorBp`] | XOR plus random noise | XOR, per-domain key |
//! | [`Lsbp`] | XOR with PID and per-domain key | XOR, shared key |
//! | [`Stbpu`] | keyed XOR hash, per domain | XOR, per-domain key |
//! | [`HyBp`] | partitioned PHT, cipher-indexed BTB | XOR, per-domain key |

pub use self::predictor::Predictor;

/// Predictor contract.
pub mod predictor;

/// Shared table state.
pub mod tables;

/// Unprotected baseline.
pub mod base;

/// Narrow-counter baseline.
pub mod bsup;

/// Hybrid partitioned/cipher-indexed scheme.
pub mod hybp;

/// PID-keyed scheme.
pub mod lsbp;

/// XOR scheme with index noise.
pub mod noisy_xor_bp;

/// Per-domain hashed scheme.
pub mod stbpu;

/// XOR-keyed scheme.
pub mod xor_bp;

pub use self::{
    base::BaseBpu, bsup::Bsup, hybp::HyBp, lsbp::Lsbp, noisy_xor_bp::NoisyXorBp, stbpu::Stbpu,
    tables::Tables, xor_bp::XorBp,
};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::addr::AddrSpace;
use crate::common::domain::Context;
use crate::common::error::ConfigError;
use crate::config::{PredictorConfig, PredictorKind, ReplacementPolicy};
use crate::core::units::BtbOutcome;

/// Enum wrapper for static dispatch over the seven schemes.
#[derive(Debug)]
pub enum PredictorWrapper {
    /// Unprotected baseline.
    Base(BaseBpu),
    /// Narrow-counter baseline.
    Bsup(Bsup),
    /// XOR-keyed scheme.
    XorBp(XorBp),
    /// XOR scheme with index noise.
    NoisyXorBp(NoisyXorBp),
    /// PID-keyed scheme.
    Lsbp(Lsbp),
    /// Per-domain hashed scheme.
    Stbpu(Stbpu),
    /// Hybrid scheme.
    HyBp(HyBp),
}

macro_rules! dispatch {
    ($self:ident, $bp:ident => $call:expr) => {
        match $self {
            Self::Base($bp) => $call,
            Self::Bsup($bp) => $call,
            Self::XorBp($bp) => $call,
            Self::NoisyXorBp($bp) => $call,
            Self::Lsbp($bp) => $call,
            Self::Stbpu($bp) => $call,
            Self::HyBp($bp) => $call,
        }
    };
}

impl PredictorWrapper {
    /// Builds one scheme.
    ///
    /// # Arguments
    ///
    /// * `kind` - Scheme to build.
    /// * `config` - Predictor configuration; validated before use.
    /// * `seed` - Seed of the scheme's private generator.
    pub fn new(
        kind: PredictorKind,
        config: &PredictorConfig,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(match kind {
            PredictorKind::Base => Self::Base(BaseBpu::new(config, seed)),
            PredictorKind::Bsup => Self::Bsup(Bsup::new(config, seed)),
            PredictorKind::XorBp => Self::XorBp(XorBp::new(config, seed)),
            PredictorKind::NoisyXorBp => Self::NoisyXorBp(NoisyXorBp::new(config, seed)),
            PredictorKind::Lsbp => Self::Lsbp(Lsbp::new(config, seed)),
            PredictorKind::Stbpu => Self::Stbpu(Stbpu::new(config, seed)),
            PredictorKind::HyBp => Self::HyBp(HyBp::new(config, seed)?),
        })
    }

    /// Builds all seven schemes from one configuration, in reporting order.
    ///
    /// Each scheme receives its own seed drawn from `config.seed` (or from
    /// entropy when unset), so schemes never share a generator.
    pub fn build_all(config: &PredictorConfig) -> Result<Vec<Self>, ConfigError> {
        let mut seeds = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        PredictorKind::ALL
            .iter()
            .map(|&kind| Self::new(kind, config, seeds.random()))
            .collect()
    }
}

impl Predictor for PredictorWrapper {
    fn kind(&self) -> PredictorKind {
        dispatch!(self, bp => bp.kind())
    }

    fn tables(&self) -> &Tables {
        dispatch!(self, bp => bp.tables())
    }

    fn tables_mut(&mut self) -> &mut Tables {
        dispatch!(self, bp => bp.tables_mut())
    }

    fn pht_set(&self, pc: u64, ctx: Context) -> usize {
        dispatch!(self, bp => bp.pht_set(pc, ctx))
    }

    fn pht_key(&self, ctx: Context) -> u64 {
        dispatch!(self, bp => bp.pht_key(ctx))
    }

    fn btb_set(&self, pc: u64, ctx: Context) -> usize {
        dispatch!(self, bp => bp.btb_set(pc, ctx))
    }

    fn btb_tag(&self, pc: u64, ctx: Context) -> u64 {
        dispatch!(self, bp => bp.btb_tag(pc, ctx))
    }

    fn btb_dest(&self, target: u64, ctx: Context) -> u64 {
        dispatch!(self, bp => bp.btb_dest(target, ctx))
    }

    fn regenerate_tag_addr(&self, set: usize, tag: u64, ctx: Context) -> u64 {
        dispatch!(self, bp => bp.regenerate_tag_addr(set, tag, ctx))
    }

    fn regenerate_dest_addr(&self, dest: u64, ctx: Context) -> u64 {
        dispatch!(self, bp => bp.regenerate_dest_addr(dest, ctx))
    }

    fn addr_space(&self) -> AddrSpace {
        dispatch!(self, bp => bp.addr_space())
    }

    fn counter_bits(&self) -> u32 {
        dispatch!(self, bp => bp.counter_bits())
    }

    fn btb_ways(&self) -> usize {
        dispatch!(self, bp => bp.btb_ways())
    }

    fn init_pht(&mut self, counter_bits: u32, counter_nums: usize, offset: u32) {
        dispatch!(self, bp => bp.init_pht(counter_bits, counter_nums, offset));
    }

    fn init_btb(&mut self, ways: usize, sets: usize, offset: u32, policy: ReplacementPolicy) {
        dispatch!(self, bp => bp.init_btb(ways, sets, offset, policy));
    }

    #[inline(always)]
    fn access_pht_set(&mut self, pc: u64, ctx: Context) -> usize {
        dispatch!(self, bp => bp.access_pht_set(pc, ctx))
    }

    #[inline(always)]
    fn access_btb_slot(&mut self, pc: u64, ctx: Context) -> (usize, u64) {
        dispatch!(self, bp => bp.access_btb_slot(pc, ctx))
    }

    #[inline(always)]
    fn lookup_pht(&mut self, pc: u64, taken: bool, ctx: Context) -> bool {
        dispatch!(self, bp => bp.lookup_pht(pc, taken, ctx))
    }

    fn update_pht(&mut self, pc: u64, taken: bool, ctx: Context) {
        dispatch!(self, bp => bp.update_pht(pc, taken, ctx));
    }

    #[inline(always)]
    fn lookup_btb(&mut self, pc: u64, target: u64, ctx: Context) -> BtbOutcome {
        dispatch!(self, bp => bp.lookup_btb(pc, target, ctx))
    }

    fn update_btb(&mut self, pc: u64, target: u64, ctx: Context) {
        dispatch!(self, bp => bp.update_btb(pc, target, ctx));
    }

    fn check_pht_set_collision(&self, a: u64, ctx_a: Context, b: u64, ctx_b: Context) -> bool {
        dispatch!(self, bp => bp.check_pht_set_collision(a, ctx_a, b, ctx_b))
    }

    fn pid_keyed(&self) -> bool {
        dispatch!(self, bp => bp.pid_keyed())
    }

    fn rekey(&mut self) {
        dispatch!(self, bp => bp.rekey());
    }
}
