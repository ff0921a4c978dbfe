//! Fixed key material and identifiers.
//!
//! The keyed schemes draw their index, hash and content keys from this table
//! when running with [`KeyMode::Fixed`](crate::config::KeyMode::Fixed), which
//! makes every experiment reproducible given the same seed.

/// Index offset (low bits discarded before indexing) used by default.
pub const DEFAULT_OFFSET: u32 = 5;

/// Default address-space width in bits.
pub const DEFAULT_ADDR_SPACE: u32 = 32;

/// Key 0.
pub const KEY_0: u64 = 0x06FA_DE60;
/// Key 1.
pub const KEY_1: u64 = 0xCAB4_BEEF;
/// Key 2.
pub const KEY_2: u64 = 0xCAFE_EFAC;
/// Key 3.
pub const KEY_3: u64 = 0x4711_0815;
/// Key 4.
pub const KEY_4: u64 = 0x10FA_DE01;
/// Key 5.
pub const KEY_5: u64 = 0xFE01_23ED;
/// Key 6.
pub const KEY_6: u64 = 0x0486_6840;
/// Key 7.
pub const KEY_7: u64 = 0x8086_6808;

/// Default attacker process identifier.
pub const PID_ATTACKER: u64 = 0x1234;

/// Default victim process identifier.
pub const PID_VICTIM: u64 = 0x5678;
