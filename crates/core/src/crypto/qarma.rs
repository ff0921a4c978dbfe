//! QARMA-64 tweakable block cipher.
//!
//! A reflector-based substitution-permutation network over sixteen 4-bit
//! cells, using the sigma2 S-box and the involutory circulant mixing matrix
//! `circ(0, rho, rho^2, rho)`. The round count selects how many forward and
//! backward rounds surround the central reflector; at most eight are defined.
//!
//! Cells are numbered from the most significant nibble: cell `i` holds bits
//! `60 - 4i ..= 63 - 4i` of the state.

use crate::common::error::ConfigError;

const SBOX: [u8; 16] = [11, 6, 8, 15, 12, 0, 9, 14, 3, 7, 4, 5, 13, 2, 1, 10];
const SBOX_INV: [u8; 16] = [5, 14, 13, 8, 10, 11, 1, 9, 2, 6, 15, 0, 4, 12, 7, 3];

/// Cell shuffle `tau` and its inverse.
const TAU: [usize; 16] = [0, 11, 6, 13, 10, 1, 12, 7, 5, 14, 3, 8, 15, 4, 9, 2];
const TAU_INV: [usize; 16] = [0, 5, 15, 10, 13, 8, 2, 7, 11, 14, 4, 1, 6, 3, 9, 12];

/// Tweak cell permutation `h` and its inverse.
const H: [usize; 16] = [6, 5, 14, 15, 0, 1, 2, 3, 7, 12, 13, 4, 8, 9, 10, 11];
const H_INV: [usize; 16] = [4, 5, 6, 7, 11, 1, 0, 8, 12, 13, 14, 15, 9, 10, 2, 3];

/// Mixing matrix as nibble rotation amounts; 0 marks a zero entry.
const MIX: [u32; 16] = [0, 1, 2, 1, 1, 0, 1, 2, 2, 1, 0, 1, 1, 2, 1, 0];

/// Tweak cells updated by the LFSR.
const LFSR_CELLS: [usize; 7] = [0, 1, 3, 4, 8, 11, 13];

const ALPHA: u64 = 0xC0AC_29B7_C97C_50DD;

const ROUND_CONSTANTS: [u64; 8] = [
    0x0000_0000_0000_0000,
    0x1319_8A2E_0370_7344,
    0xA409_3822_299F_31D0,
    0x082E_FA98_EC4E_6C89,
    0x4528_21E6_38D0_1377,
    0xBE54_66CF_34E9_0C6C,
    0x3F84_D5B5_B547_0917,
    0x9216_D5D9_8979_FB1B,
];

/// Largest supported round count.
pub const MAX_ROUNDS: u32 = 8;

type Cells = [u8; 16];

fn to_cells(x: u64) -> Cells {
    std::array::from_fn(|i| ((x >> (4 * (15 - i))) & 0xF) as u8)
}

fn from_cells(cells: &Cells) -> u64 {
    cells.iter().fold(0, |acc, &c| (acc << 4) | u64::from(c))
}

fn rotate_nibble(x: u8, by: u32) -> u8 {
    ((x << by) | (x >> (4 - by))) & 0xF
}

fn mix_columns(cells: &Cells) -> Cells {
    let mut out = [0u8; 16];
    for row in 0..4 {
        for col in 0..4 {
            out[4 * row + col] = (0..4).fold(0, |acc, j| match MIX[4 * row + j] {
                0 => acc,
                by => acc ^ rotate_nibble(cells[4 * j + col], by),
            });
        }
    }
    out
}

fn shuffle(cells: &Cells, perm: &[usize; 16]) -> Cells {
    std::array::from_fn(|i| cells[perm[i]])
}

fn substitute(cells: &Cells, sbox: &[u8; 16]) -> Cells {
    std::array::from_fn(|i| sbox[cells[i] as usize])
}

fn xor_cells(a: &Cells, b: &Cells) -> Cells {
    std::array::from_fn(|i| a[i] ^ b[i])
}

fn lfsr(x: u8) -> u8 {
    let (b0, b1, b2, b3) = (x & 1, (x >> 1) & 1, (x >> 2) & 1, (x >> 3) & 1);
    ((b0 ^ b1) << 3) | (b3 << 2) | (b2 << 1) | b1
}

fn lfsr_inv(x: u8) -> u8 {
    let (b0, b1, b2, b3) = (x & 1, (x >> 1) & 1, (x >> 2) & 1, (x >> 3) & 1);
    (b0 ^ b3) | (b0 << 1) | (b1 << 2) | (b2 << 3)
}

fn forward_tweak(tweak: u64) -> u64 {
    let mut cells = shuffle(&to_cells(tweak), &H);
    for i in LFSR_CELLS {
        cells[i] = lfsr(cells[i]);
    }
    from_cells(&cells)
}

fn backward_tweak(tweak: u64) -> u64 {
    let mut cells = to_cells(tweak);
    for i in LFSR_CELLS {
        cells[i] = lfsr_inv(cells[i]);
    }
    from_cells(&shuffle(&cells, &H_INV))
}

fn forward_round(state: u64, tweakey: u64, round: usize) -> u64 {
    let mut cells = to_cells(state ^ tweakey);
    if round != 0 {
        cells = mix_columns(&shuffle(&cells, &TAU));
    }
    from_cells(&substitute(&cells, &SBOX))
}

fn backward_round(state: u64, tweakey: u64, round: usize) -> u64 {
    let mut cells = substitute(&to_cells(state), &SBOX_INV);
    if round != 0 {
        cells = shuffle(&mix_columns(&cells), &TAU_INV);
    }
    from_cells(&cells) ^ tweakey
}

fn reflect(state: u64, key: u64) -> u64 {
    let mixed = mix_columns(&shuffle(&to_cells(state), &TAU));
    from_cells(&shuffle(&xor_cells(&mixed, &to_cells(key)), &TAU_INV))
}

fn reflect_inv(state: u64, key: u64) -> u64 {
    let keyed = xor_cells(&shuffle(&to_cells(state), &TAU), &to_cells(key));
    from_cells(&shuffle(&mix_columns(&keyed), &TAU_INV))
}

/// A keyed QARMA-64 instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Qarma64 {
    w0: u64,
    w1: u64,
    k0: u64,
    rounds: usize,
}

impl Qarma64 {
    /// Creates a cipher from the whitening key `w0`, core key `k0` and round count.
    ///
    /// # Arguments
    ///
    /// * `w0` - Whitening key; `w1` is derived from it by the orthomorphism.
    /// * `k0` - Core key; also used as the reflector key `k1`.
    /// * `rounds` - Forward (and backward) round count in `1..=8`.
    pub fn new(w0: u64, k0: u64, rounds: u32) -> Result<Self, ConfigError> {
        if !(1..=MAX_ROUNDS).contains(&rounds) {
            return Err(ConfigError::CipherRounds(rounds));
        }
        Ok(Self {
            w0,
            w1: w0.rotate_right(1) ^ (w0 >> 63),
            k0,
            rounds: rounds as usize,
        })
    }

    /// Returns a copy with a different core key.
    pub const fn with_core_key(self, k0: u64) -> Self {
        Self { k0, ..self }
    }

    /// Encrypts one block under `tweak`.
    pub fn encrypt(&self, plain: u64, tweak: u64) -> u64 {
        let mut tweak = tweak;
        let mut state = plain ^ self.w0;
        for (i, &c) in ROUND_CONSTANTS.iter().enumerate().take(self.rounds) {
            state = forward_round(state, self.k0 ^ tweak ^ c, i);
            tweak = forward_tweak(tweak);
        }
        state = forward_round(state, self.w1 ^ tweak, 1);
        state = reflect(state, self.k0);
        state = backward_round(state, self.w0 ^ tweak, 1);
        for (i, &c) in ROUND_CONSTANTS.iter().enumerate().take(self.rounds).rev() {
            tweak = backward_tweak(tweak);
            state = backward_round(state, self.k0 ^ tweak ^ c ^ ALPHA, i);
        }
        state ^ self.w1
    }

    /// Decrypts one block under `tweak`.
    pub fn decrypt(&self, cipher: u64, tweak: u64) -> u64 {
        let mut tweak = tweak;
        let mut state = cipher ^ self.w1;
        for (i, &c) in ROUND_CONSTANTS.iter().enumerate().take(self.rounds) {
            state = forward_round(state, self.k0 ^ tweak ^ c ^ ALPHA, i);
            tweak = forward_tweak(tweak);
        }
        state = forward_round(state, self.w0 ^ tweak, 1);
        state = reflect_inv(state, self.k0);
        state = backward_round(state, self.w1 ^ tweak, 1);
        for (i, &c) in ROUND_CONSTANTS.iter().enumerate().take(self.rounds).rev() {
            tweak = backward_tweak(tweak);
            state = backward_round(state, self.k0 ^ tweak ^ c, i);
        }
        state ^ self.w0
    }
}
