//! Cipher Tests.
//!
//! Checks QARMA-64 against published test vectors, its invertibility for
//! every round count, and the XOR masking helpers.

use bpgauge_core::common::error::ConfigError;
use bpgauge_core::crypto::qarma::MAX_ROUNDS;
use bpgauge_core::crypto::{Qarma64, xor_decrypt, xor_encrypt};
use proptest::prelude::*;
use rstest::rstest;

const PLAIN: u64 = 0xfb62_3599_da6e_8127;
const TWEAK: u64 = 0x477d_469d_ec0b_8762;
const W0: u64 = 0x84be_85ce_9804_e94b;
const K0: u64 = 0xec28_02d4_e0a4_88e9;

// ══════════════════════════════════════════════════════════
// 1. Test vectors
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(5, 0xc003_b939_99b3_3765)]
#[case(6, 0x270a_7872_75c4_8d10)]
#[case(7, 0x5c06_a750_1b63_b2fd)]
fn encrypts_reference_vector(#[case] rounds: u32, #[case] expected: u64) {
    let cipher = Qarma64::new(W0, K0, rounds).unwrap();
    assert_eq!(cipher.encrypt(PLAIN, TWEAK), expected, "r = {rounds}");
}

#[rstest]
#[case(5, 0xc003_b939_99b3_3765)]
#[case(6, 0x270a_7872_75c4_8d10)]
#[case(7, 0x5c06_a750_1b63_b2fd)]
fn decrypts_reference_vector(#[case] rounds: u32, #[case] cipher_text: u64) {
    let cipher = Qarma64::new(W0, K0, rounds).unwrap();
    assert_eq!(cipher.decrypt(cipher_text, TWEAK), PLAIN, "r = {rounds}");
}

// ══════════════════════════════════════════════════════════
// 2. Parameters
// ══════════════════════════════════════════════════════════

#[test]
fn rejects_round_counts_outside_range() {
    assert!(matches!(Qarma64::new(W0, K0, 0), Err(ConfigError::CipherRounds(0))));
    assert!(matches!(
        Qarma64::new(W0, K0, MAX_ROUNDS + 1),
        Err(ConfigError::CipherRounds(9))
    ));
}

#[test]
fn core_key_changes_output() {
    let cipher = Qarma64::new(W0, K0, 7).unwrap();
    let rekeyed = cipher.with_core_key(K0 ^ 1);
    assert_ne!(cipher.encrypt(PLAIN, TWEAK), rekeyed.encrypt(PLAIN, TWEAK));
}

#[test]
fn tweak_changes_output() {
    let cipher = Qarma64::new(W0, K0, 7).unwrap();
    assert_ne!(cipher.encrypt(PLAIN, 0), cipher.encrypt(PLAIN, 1));
}

// ══════════════════════════════════════════════════════════
// 3. Invertibility
// ══════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn decrypt_inverts_encrypt(
        plain in any::<u64>(),
        tweak in any::<u64>(),
        w0 in any::<u64>(),
        k0 in any::<u64>(),
        rounds in 1u32..=MAX_ROUNDS,
    ) {
        let cipher = Qarma64::new(w0, k0, rounds).unwrap();
        prop_assert_eq!(cipher.decrypt(cipher.encrypt(plain, tweak), tweak), plain);
    }

    #[test]
    fn xor_mask_round_trips(plain in any::<u64>(), key in any::<u64>()) {
        prop_assert_eq!(xor_decrypt(xor_encrypt(plain, key), key), plain);
    }
}
