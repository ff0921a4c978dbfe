//! Obfuscation primitives used by the keyed predictor schemes.
//!
//! 1. **XOR masking:** Stateless encrypt/decrypt with a single key.
//! 2. **QARMA-64:** A tweakable block cipher used to derive BTB indices.

/// QARMA-64 tweakable block cipher.
pub mod qarma;

pub use qarma::Qarma64;

/// Masks `plain` with `key`.
#[inline(always)]
pub const fn xor_encrypt(plain: u64, key: u64) -> u64 {
    plain ^ key
}

/// Removes the mask applied by [`xor_encrypt`].
#[inline(always)]
pub const fn xor_decrypt(cipher: u64, key: u64) -> u64 {
    cipher ^ key
}
