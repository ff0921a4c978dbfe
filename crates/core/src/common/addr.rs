//! Address-space arithmetic.
//!
//! All simulated addresses are unsigned integers of a configurable bit width.
//! Every address produced by an obfuscation scheme or drawn by an attacker is
//! reduced modulo `2^bits` through [`AddrSpace::wrap`].

use rand::Rng;

/// Width of the simulated address space in bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AddrSpace {
    bits: u32,
}

impl AddrSpace {
    /// Creates an address space of `bits` bits. Widths above 64 saturate at 64.
    pub const fn new(bits: u32) -> Self {
        Self {
            bits: if bits > 64 { 64 } else { bits },
        }
    }

    /// Returns the width in bits.
    pub const fn bits(self) -> u32 {
        self.bits
    }

    /// Returns the all-ones mask `2^bits - 1`.
    #[inline(always)]
    pub const fn mask(self) -> u64 {
        if self.bits >= 64 {
            u64::MAX
        } else {
            (1u64 << self.bits) - 1
        }
    }

    /// Reduces `addr` into the address space.
    #[inline(always)]
    pub const fn wrap(self, addr: u64) -> u64 {
        addr & self.mask()
    }

    /// Draws a uniformly random address.
    pub fn random<R: Rng + ?Sized>(self, rng: &mut R) -> u64 {
        rng.random::<u64>() & self.mask()
    }
}

impl Default for AddrSpace {
    fn default() -> Self {
        Self::new(32)
    }
}

/// Returns `log2(n)` for a power-of-two `n`.
///
/// Table geometries are validated to be powers of two before they reach the
/// tag derivation, so this is simply the trailing-zero count.
#[inline(always)]
pub const fn log2(n: usize) -> u32 {
    n.trailing_zeros()
}

/// Shifts left, yielding 0 once the shift reaches the word width.
#[inline(always)]
pub const fn shl(value: u64, amount: u32) -> u64 {
    match value.checked_shl(amount) {
        Some(v) => v,
        None => 0,
    }
}

/// Shifts right, yielding 0 once the shift reaches the word width.
#[inline(always)]
pub const fn shr(value: u64, amount: u32) -> u64 {
    match value.checked_shr(amount) {
        Some(v) => v,
        None => 0,
    }
}
