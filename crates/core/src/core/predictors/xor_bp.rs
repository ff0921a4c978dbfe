//! XOR-keyed predictor (XorBP).
//!
//! The index is the address XORed with one domain-independent key, which
//! permutes entries without separating domains. Content is XORed with a
//! per-domain key, so a counter or destination planted by one domain decodes
//! to garbage in the other.

use crate::common::constants::{KEY_0, KEY_1, KEY_2};
use crate::common::domain::Context;
use crate::config::{PredictorConfig, PredictorKind};
use crate::crypto::{xor_decrypt, xor_encrypt};

use super::predictor::Predictor;
use super::tables::Tables;

/// XOR-keyed predictor.
#[derive(Debug)]
pub struct XorBp {
    tables: Tables,
    index_key: u64,
    content_keys: [u64; 2],
}

impl XorBp {
    /// Creates the predictor with fixed or random keys per `config.key_mode`.
    pub fn new(config: &PredictorConfig, seed: u64) -> Self {
        let mut tables = Tables::new(config, seed);
        let [index_key] = tables.keys([KEY_2]);
        let content_keys = tables.keys([KEY_0, KEY_1]);
        Self {
            tables,
            index_key,
            content_keys,
        }
    }

    /// Obfuscated address value that indices and tags are cut from.
    pub(super) const fn index_value(&self, pc: u64) -> u64 {
        self.tables.space.wrap(xor_encrypt(pc, self.index_key))
    }

    /// Index key in use.
    pub const fn index_key(&self) -> u64 {
        self.index_key
    }
}

impl Predictor for XorBp {
    fn kind(&self) -> PredictorKind {
        PredictorKind::XorBp
    }

    fn tables(&self) -> &Tables {
        &self.tables
    }

    fn tables_mut(&mut self) -> &mut Tables {
        &mut self.tables
    }

    fn pht_set(&self, pc: u64, _ctx: Context) -> usize {
        self.tables.pht_index(self.index_value(pc))
    }

    fn pht_key(&self, ctx: Context) -> u64 {
        self.content_keys[ctx.domain.index()]
    }

    fn btb_set(&self, pc: u64, _ctx: Context) -> usize {
        self.tables.btb_index(self.index_value(pc))
    }

    fn btb_tag(&self, pc: u64, _ctx: Context) -> u64 {
        self.tables.btb_tag_of(self.index_value(pc))
    }

    fn btb_dest(&self, target: u64, ctx: Context) -> u64 {
        xor_encrypt(target, self.content_keys[ctx.domain.index()])
    }

    fn regenerate_tag_addr(&self, set: usize, tag: u64, _ctx: Context) -> u64 {
        let value = self.tables.join_set_tag(set, tag);
        self.tables.space.wrap(xor_decrypt(value, self.index_key))
    }

    fn regenerate_dest_addr(&self, dest: u64, ctx: Context) -> u64 {
        xor_decrypt(dest, self.content_keys[ctx.domain.index()])
    }

    fn rekey(&mut self) {
        self.index_key = self.tables.keys([KEY_2])[0];
        self.content_keys = self.tables.keys([KEY_0, KEY_1]);
    }
}
