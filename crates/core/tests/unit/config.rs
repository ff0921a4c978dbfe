//! Configuration Tests.
//!
//! Verifies serde defaults, partial JSON overrides, enum aliases, file
//! loading and every validation rule.

use std::io::Write;

use bpgauge_core::common::error::ConfigError;
use bpgauge_core::config::{
    AttackConfig, Config, ExperimentConfig, KeyMode, PredictorConfig, PredictorKind,
    ReplacementPolicy,
};
use pretty_assertions::assert_eq;

// ══════════════════════════════════════════════════════════
// 1. Defaults
// ══════════════════════════════════════════════════════════

#[test]
fn predictor_defaults_match_reference_geometry() {
    let config = PredictorConfig::default();
    assert_eq!(config.addr_space, 32);
    assert_eq!(config.pht.counter_bits, 2);
    assert_eq!(config.pht.counter_nums, 1024);
    assert_eq!(config.pht.offset, 5);
    assert_eq!(config.btb.ways, 4);
    assert_eq!(config.btb.sets, 1024);
    assert_eq!(config.btb.offset, 5);
    assert_eq!(config.btb.policy, ReplacementPolicy::Lru);
    assert_eq!(config.key_mode, KeyMode::Fixed);
    assert_eq!(config.cipher_rounds, 7);
    assert!(config.validate().is_ok());
}

#[test]
fn attack_defaults() {
    let config = AttackConfig::default();
    assert_eq!(config.num_loops, 1_000_000_000);
    assert_eq!(config.max_accesses, Some(100_000_000));
    assert_eq!(config.attacker_pid, 0x1234);
    assert_eq!(config.victim_pid, 0x5678);
    assert!(!config.random_pids);
    assert!(!config.rekey_each_attempt);
}

#[test]
fn experiment_defaults() {
    let config = ExperimentConfig::default();
    assert_eq!(config.secrets, 16);
    assert_eq!(
        config.reuse_budgets,
        vec![10_000, 50_000, 100_000, 200_000, 500_000, 1_000_000, 10_000_000, 100_000_000]
    );
    assert_eq!(config.budget_step, 1000);
    assert_eq!(config.prune_step, 100);
    assert_eq!(config.eviction_size, 4);
    assert_eq!(config.pht_occupancy_size, 1024);
    assert_eq!(config.btb_occupancy_size, 4096);
    assert_eq!(config.leakage_buckets, 9);
}

// ══════════════════════════════════════════════════════════
// 2. JSON
// ══════════════════════════════════════════════════════════

#[test]
fn empty_document_is_default() {
    assert_eq!(Config::from_json("{}").unwrap(), Config::default());
}

#[test]
fn partial_document_overrides_only_named_fields() {
    let json = r#"{
        "predictor": { "pht": { "counter_bits": 3 }, "key_mode": "Random" },
        "attack": { "num_loops": 10, "random_pids": true },
        "experiment": { "reuse_budgets": [5, 6] }
    }"#;
    let config = Config::from_json(json).unwrap();
    assert_eq!(config.predictor.pht.counter_bits, 3);
    assert_eq!(config.predictor.pht.counter_nums, 1024);
    assert_eq!(config.predictor.key_mode, KeyMode::Random);
    assert_eq!(config.attack.num_loops, 10);
    assert!(config.attack.random_pids);
    assert_eq!(config.attack.max_accesses, Some(100_000_000));
    assert_eq!(config.experiment.reuse_budgets, vec![5, 6]);
    assert_eq!(config.experiment.secrets, 16);
}

#[test]
fn policy_accepts_both_spellings() {
    let upper: ReplacementPolicy = serde_json::from_str("\"RANDOM\"").unwrap();
    let pascal: ReplacementPolicy = serde_json::from_str("\"Random\"").unwrap();
    assert_eq!(upper, ReplacementPolicy::Random);
    assert_eq!(pascal, ReplacementPolicy::Random);
}

#[test]
fn predictor_kind_accepts_scheme_names() {
    for kind in PredictorKind::ALL {
        let json = format!("\"{}\"", kind.name());
        let parsed: PredictorKind = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, kind);
    }
}

#[test]
fn malformed_json_is_a_parse_error() {
    assert!(matches!(Config::from_json("{ predictor"), Err(ConfigError::Parse(_))));
}

#[test]
fn load_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "predictor": {{ "addr_space": 48 }} }}"#).unwrap();
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.predictor.addr_space, 48);
}

#[test]
fn load_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    match Config::load(&path) {
        Err(ConfigError::Read { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected a read error, got {other:?}"),
    }
}

// ══════════════════════════════════════════════════════════
// 3. Validation
// ══════════════════════════════════════════════════════════

fn rejected(edit: impl FnOnce(&mut PredictorConfig)) -> ConfigError {
    let mut config = PredictorConfig::default();
    edit(&mut config);
    config.validate().unwrap_err()
}

#[test]
fn rejects_empty_pht() {
    assert!(matches!(rejected(|c| c.pht.counter_nums = 0), ConfigError::EmptyPht));
}

#[test]
fn rejects_counter_width() {
    assert!(matches!(rejected(|c| c.pht.counter_bits = 0), ConfigError::CounterBits(0)));
    assert!(matches!(rejected(|c| c.pht.counter_bits = 40), ConfigError::CounterBits(40)));
}

#[test]
fn rejects_zero_ways() {
    assert!(matches!(rejected(|c| c.btb.ways = 0), ConfigError::ZeroWays));
}

#[test]
fn rejects_non_power_of_two_sets() {
    assert!(matches!(rejected(|c| c.btb.sets = 1000), ConfigError::SetsNotPowerOfTwo(1000)));
    assert!(matches!(rejected(|c| c.btb.sets = 0), ConfigError::SetsNotPowerOfTwo(0)));
}

#[test]
fn rejects_address_width() {
    assert!(matches!(rejected(|c| c.addr_space = 0), ConfigError::AddrSpace(0)));
    assert!(matches!(rejected(|c| c.addr_space = 65), ConfigError::AddrSpace(65)));
}

#[test]
fn rejects_offset_past_address_width() {
    let err = rejected(|c| {
        c.addr_space = 8;
        c.btb.offset = 8;
    });
    assert!(matches!(err, ConfigError::Offset { offset: 8, addr_space: 8 }));
}

#[test]
fn rejects_noise_rate() {
    assert!(matches!(rejected(|c| c.noise_rate = 1.5), ConfigError::NoiseRate(_)));
}

#[test]
fn rejects_cipher_rounds() {
    assert!(matches!(rejected(|c| c.cipher_rounds = 0), ConfigError::CipherRounds(0)));
    assert!(matches!(rejected(|c| c.cipher_rounds = 9), ConfigError::CipherRounds(9)));
}

#[test]
fn from_json_validates() {
    let err = Config::from_json(r#"{ "predictor": { "btb": { "sets": 3 } } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::SetsNotPowerOfTwo(3)));
}
