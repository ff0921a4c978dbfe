//! PID-keyed predictor (LS-BP).
//!
//! The index is the address XORed with the issuing process's PID and a
//! per-domain index key, so the same address lands in different entries for
//! different processes. Content is XORed with a single domain-independent key.
//!
//! Because the PID is part of the index, an attacker searching for a BTB
//! collision keeps the victim's address and varies its own PID instead.

use crate::common::constants::{KEY_0, KEY_1, KEY_2};
use crate::common::domain::Context;
use crate::config::{PredictorConfig, PredictorKind};
use crate::crypto::{xor_decrypt, xor_encrypt};

use super::predictor::Predictor;
use super::tables::Tables;

/// PID-keyed predictor.
#[derive(Debug)]
pub struct Lsbp {
    tables: Tables,
    index_keys: [u64; 2],
    content_key: u64,
}

impl Lsbp {
    /// Creates the predictor with fixed or random keys per `config.key_mode`.
    pub fn new(config: &PredictorConfig, seed: u64) -> Self {
        let mut tables = Tables::new(config, seed);
        let index_keys = tables.keys([KEY_0, KEY_1]);
        let [content_key] = tables.keys([KEY_2]);
        Self {
            tables,
            index_keys,
            content_key,
        }
    }

    const fn index_mask(&self, ctx: Context) -> u64 {
        ctx.pid ^ self.index_keys[ctx.domain.index()]
    }

    const fn index_value(&self, pc: u64, ctx: Context) -> u64 {
        self.tables.space.wrap(xor_encrypt(pc, self.index_mask(ctx)))
    }
}

impl Predictor for Lsbp {
    fn kind(&self) -> PredictorKind {
        PredictorKind::Lsbp
    }

    fn tables(&self) -> &Tables {
        &self.tables
    }

    fn tables_mut(&mut self) -> &mut Tables {
        &mut self.tables
    }

    fn pht_set(&self, pc: u64, ctx: Context) -> usize {
        self.tables.pht_index(self.index_value(pc, ctx))
    }

    fn pht_key(&self, _ctx: Context) -> u64 {
        self.content_key
    }

    fn btb_set(&self, pc: u64, ctx: Context) -> usize {
        self.tables.btb_index(self.index_value(pc, ctx))
    }

    fn btb_tag(&self, pc: u64, ctx: Context) -> u64 {
        self.tables.btb_tag_of(self.index_value(pc, ctx))
    }

    fn btb_dest(&self, target: u64, _ctx: Context) -> u64 {
        xor_encrypt(target, self.content_key)
    }

    fn regenerate_tag_addr(&self, set: usize, tag: u64, ctx: Context) -> u64 {
        let value = self.tables.join_set_tag(set, tag);
        self.tables.space.wrap(xor_decrypt(value, self.index_mask(ctx)))
    }

    fn regenerate_dest_addr(&self, dest: u64, _ctx: Context) -> u64 {
        xor_decrypt(dest, self.content_key)
    }

    fn pid_keyed(&self) -> bool {
        true
    }

    /// Resets the index keys: the fixed pair, or a fresh random pair.
    fn rekey(&mut self) {
        self.index_keys = self.tables.keys([KEY_0, KEY_1]);
    }
}
