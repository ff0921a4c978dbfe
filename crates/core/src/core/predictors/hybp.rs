//! Hybrid predictor (HyBP).
//!
//! Combines two isolation mechanisms, one per structure:
//!
//! 1. **PHT:** Partitioned by domain. Each domain owns half of the counters and
//!    XOR-keys its index within that half, so cross-domain PHT collisions are
//!    impossible.
//! 2. **BTB:** Indexed through the QARMA-64 cipher keyed per domain and tweaked
//!    with the domain tag; set and tag are cut from the ciphertext.
//!
//! Counters and destinations are XOR-masked with a per-domain content key.

use crate::common::addr::{shl, shr};
use crate::common::constants::{KEY_0, KEY_1, KEY_2, KEY_3, KEY_5, KEY_6, KEY_7};
use crate::common::domain::{Context, SecurityDomain};
use crate::common::error::ConfigError;
use crate::config::{PredictorConfig, PredictorKind};
use crate::crypto::{Qarma64, xor_decrypt, xor_encrypt};

use super::predictor::Predictor;
use super::tables::Tables;

/// Hybrid predictor.
#[derive(Debug)]
pub struct HyBp {
    tables: Tables,
    pht_keys: [u64; 2],
    ciphers: [Qarma64; 2],
    content_keys: [u64; 2],
}

impl HyBp {
    /// Creates the predictor.
    ///
    /// # Returns
    ///
    /// An error if `config.cipher_rounds` is outside `1..=8`.
    pub fn new(config: &PredictorConfig, seed: u64) -> Result<Self, ConfigError> {
        let mut tables = Tables::new(config, seed);
        let pht_keys = tables.keys([KEY_1, KEY_2]);
        let cipher = Qarma64::new(KEY_3, 0, config.cipher_rounds)?;
        let [k_attacker, k_victim] = tables.keys([KEY_0, KEY_5]);
        let content_keys = tables.keys([KEY_6, KEY_7]);
        Ok(Self {
            tables,
            pht_keys,
            ciphers: [
                cipher.with_core_key(k_attacker),
                cipher.with_core_key(k_victim),
            ],
            content_keys,
        })
    }

    fn pht_half(&self) -> usize {
        (self.tables.pht.len() / 2).max(1)
    }

    fn cipher_of(&self, pc: u64, ctx: Context) -> u64 {
        let plain = shr(self.tables.space.wrap(pc), self.tables.btb_offset);
        self.ciphers[ctx.domain.index()].encrypt(plain, ctx.domain.tweak())
    }
}

impl Predictor for HyBp {
    fn kind(&self) -> PredictorKind {
        PredictorKind::HyBp
    }

    fn tables(&self) -> &Tables {
        &self.tables
    }

    fn tables_mut(&mut self) -> &mut Tables {
        &mut self.tables
    }

    fn pht_set(&self, pc: u64, ctx: Context) -> usize {
        let half = self.pht_half() as u64;
        let d = ctx.domain.index();
        let index = shr(self.tables.space.wrap(pc), self.tables.pht_offset);
        let local = (index ^ self.pht_keys[d]) % half;
        let partition = match ctx.domain {
            SecurityDomain::Attacker => 0,
            SecurityDomain::Victim => half,
        };
        self.tables.pht.slot(partition + local)
    }

    fn pht_key(&self, ctx: Context) -> u64 {
        self.content_keys[ctx.domain.index()]
    }

    fn btb_set(&self, pc: u64, ctx: Context) -> usize {
        self.tables.btb.slot(self.cipher_of(pc, ctx))
    }

    fn btb_tag(&self, pc: u64, ctx: Context) -> u64 {
        shr(self.cipher_of(pc, ctx), self.tables.set_bits)
    }

    fn btb_dest(&self, target: u64, ctx: Context) -> u64 {
        xor_encrypt(target, self.content_keys[ctx.domain.index()])
    }

    fn regenerate_tag_addr(&self, set: usize, tag: u64, ctx: Context) -> u64 {
        let cipher = shl(tag, self.tables.set_bits) | set as u64;
        let plain = self.ciphers[ctx.domain.index()].decrypt(cipher, ctx.domain.tweak());
        self.tables.space.wrap(shl(plain, self.tables.btb_offset))
    }

    fn regenerate_dest_addr(&self, dest: u64, ctx: Context) -> u64 {
        xor_decrypt(dest, self.content_keys[ctx.domain.index()])
    }

    fn rekey(&mut self) {
        self.pht_keys = self.tables.keys([KEY_1, KEY_2]);
        let [k_attacker, k_victim] = self.tables.keys([KEY_0, KEY_5]);
        self.ciphers = [
            self.ciphers[0].with_core_key(k_attacker),
            self.ciphers[1].with_core_key(k_victim),
        ];
        self.content_keys = self.tables.keys([KEY_6, KEY_7]);
    }
}
