//! Secret-token predictor (STBPU).
//!
//! Every domain owns an index key, an index hash and a content key. The
//! domain's index key is placed above the address bits and the result is
//! XOR-hashed, so attacker and victim entries differ in their high tag bits:
//!
//! - `cipher = ((index_key << addr_space) | pc) ^ index_hash`
//! - PHT entry: `cipher mod counter_nums`
//! - BTB set: `cipher mod sets`, BTB tag: `cipher >> log2(sets)`
//!
//! Counters and destinations are XOR-masked with the domain's content key.
//! No index offset is applied.

use crate::common::addr::{shl, shr};
use crate::common::constants::{KEY_2, KEY_3, KEY_4, KEY_5, KEY_6, KEY_7};
use crate::common::domain::Context;
use crate::config::{PredictorConfig, PredictorKind};
use crate::crypto::{xor_decrypt, xor_encrypt};

use super::predictor::Predictor;
use super::tables::Tables;

/// Secret-token predictor.
#[derive(Debug)]
pub struct Stbpu {
    tables: Tables,
    index_keys: [u64; 2],
    index_hashes: [u64; 2],
    content_keys: [u64; 2],
}

impl Stbpu {
    /// Creates the predictor with fixed or random keys per `config.key_mode`.
    pub fn new(config: &PredictorConfig, seed: u64) -> Self {
        let mut tables = Tables::new(config, seed);
        let index_keys = tables.keys([KEY_2, KEY_3]);
        let index_hashes = tables.keys([KEY_4, KEY_5]);
        let content_keys = tables.keys([KEY_6, KEY_7]);
        Self {
            tables,
            index_keys,
            index_hashes,
            content_keys,
        }
    }

    fn cipher(&self, pc: u64, ctx: Context) -> u64 {
        let d = ctx.domain.index();
        let space = self.tables.space;
        let plain = shl(self.index_keys[d], space.bits()) | space.wrap(pc);
        xor_encrypt(plain, self.index_hashes[d])
    }
}

impl Predictor for Stbpu {
    fn kind(&self) -> PredictorKind {
        PredictorKind::Stbpu
    }

    fn tables(&self) -> &Tables {
        &self.tables
    }

    fn tables_mut(&mut self) -> &mut Tables {
        &mut self.tables
    }

    fn pht_set(&self, pc: u64, ctx: Context) -> usize {
        self.tables.pht.slot(self.cipher(pc, ctx))
    }

    fn pht_key(&self, ctx: Context) -> u64 {
        self.content_keys[ctx.domain.index()]
    }

    fn btb_set(&self, pc: u64, ctx: Context) -> usize {
        self.tables.btb.slot(self.cipher(pc, ctx))
    }

    fn btb_tag(&self, pc: u64, ctx: Context) -> u64 {
        shr(self.cipher(pc, ctx), self.tables.set_bits)
    }

    fn btb_dest(&self, target: u64, ctx: Context) -> u64 {
        xor_encrypt(target, self.content_keys[ctx.domain.index()])
    }

    fn regenerate_tag_addr(&self, set: usize, tag: u64, ctx: Context) -> u64 {
        let cipher = shl(tag, self.tables.set_bits) | set as u64;
        let plain = xor_decrypt(cipher, self.index_hashes[ctx.domain.index()]);
        self.tables.space.wrap(plain)
    }

    fn regenerate_dest_addr(&self, dest: u64, ctx: Context) -> u64 {
        xor_decrypt(dest, self.content_keys[ctx.domain.index()])
    }

    fn rekey(&mut self) {
        self.index_keys = self.tables.keys([KEY_2, KEY_3]);
        self.index_hashes = self.tables.keys([KEY_4, KEY_5]);
        self.content_keys = self.tables.keys([KEY_6, KEY_7]);
    }
}
