//! Table state shared by every predictor scheme.
//!
//! Each scheme owns one [`Tables`] holding its PHT, its BTB, the geometry
//! needed by the address transforms and the scheme's private generator
//! (replacement seeds, random keys and index noise).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::addr::{AddrSpace, log2, shl, shr};
use crate::config::{KeyMode, PredictorConfig, ReplacementPolicy};
use crate::core::units::policies;
use crate::core::units::{Btb, Pht};

/// PHT, BTB and generator of one predictor instance.
#[derive(Debug)]
pub struct Tables {
    /// Address width the transforms reduce into.
    pub space: AddrSpace,
    /// Counter table.
    pub pht: Pht,
    /// Low bits discarded before PHT indexing.
    pub pht_offset: u32,
    /// Target buffer.
    pub btb: Btb,
    /// Low bits discarded before BTB indexing.
    pub btb_offset: u32,
    /// `log2` of the BTB set count.
    pub set_bits: u32,
    /// Key source for keyed schemes.
    pub key_mode: KeyMode,
    /// Scheme-private generator.
    pub rng: StdRng,
}

impl Tables {
    /// Allocates tables sized by `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated predictor configuration.
    /// * `seed` - Seed of the scheme-private generator.
    pub fn new(config: &PredictorConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let policy_seed = rng.random();
        Self {
            space: AddrSpace::new(config.addr_space),
            pht: Pht::new(config.pht.counter_bits, config.pht.counter_nums),
            pht_offset: config.pht.offset,
            btb: Btb::new(
                config.btb.ways,
                config.btb.sets,
                policies::build(config.btb.policy, policy_seed),
            ),
            btb_offset: config.btb.offset,
            set_bits: log2(config.btb.sets),
            key_mode: config.key_mode,
            rng,
        }
    }

    /// Replaces the PHT with an all-invalid table of the given geometry.
    pub fn init_pht(&mut self, counter_bits: u32, counter_nums: usize, offset: u32) {
        self.pht = Pht::new(counter_bits, counter_nums.max(1));
        self.pht_offset = offset;
    }

    /// Replaces the BTB with an all-invalid buffer of the given geometry.
    pub fn init_btb(&mut self, ways: usize, sets: usize, offset: u32, policy: ReplacementPolicy) {
        let sets = sets.max(1);
        let seed = self.rng.random();
        self.btb = Btb::new(ways.max(1), sets, policies::build(policy, seed));
        self.btb_offset = offset;
        self.set_bits = log2(sets);
    }

    /// Returns the fixed keys, or fresh random keys under [`KeyMode::Random`].
    pub fn keys<const N: usize>(&mut self, fixed: [u64; N]) -> [u64; N] {
        match self.key_mode {
            KeyMode::Fixed => fixed,
            KeyMode::Random => {
                let space = self.space;
                std::array::from_fn(|_| space.random(&mut self.rng))
            }
        }
    }

    /// PHT entry of an already-obfuscated address value.
    #[inline(always)]
    pub fn pht_index(&self, value: u64) -> usize {
        self.pht.slot(shr(value, self.pht_offset))
    }

    /// BTB set of an already-obfuscated address value.
    #[inline(always)]
    pub const fn btb_index(&self, value: u64) -> usize {
        self.btb.slot(shr(value, self.btb_offset))
    }

    /// BTB tag of an already-obfuscated address value.
    #[inline(always)]
    pub const fn btb_tag_of(&self, value: u64) -> u64 {
        shr(shr(value, self.btb_offset), self.set_bits)
    }

    /// Rebuilds the obfuscated address value that [`btb_index`](Self::btb_index)
    /// and [`btb_tag_of`](Self::btb_tag_of) split apart, with the offset bits zeroed.
    #[inline(always)]
    pub const fn join_set_tag(&self, set: usize, tag: u64) -> u64 {
        shl(shl(tag, self.set_bits) | set as u64, self.btb_offset)
    }
}
