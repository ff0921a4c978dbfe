//! Configuration system for the branch predictor security simulator.
//!
//! This module defines every tunable parameter of a run. It provides:
//! 1. **Table Geometry:** PHT counter width and size, BTB ways, sets and replacement policy.
//! 2. **Scheme Parameters:** Address width, key source, noise rate and cipher rounds.
//! 3. **Attack Parameters:** Candidate loop bound, access budget and process identifiers.
//! 4. **Experiment Parameters:** Secret count and sweep geometry for the named experiments.
//!
//! Every field carries a serde default, so a partial JSON document (or an
//! empty object) yields a usable configuration.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::common::constants::{DEFAULT_ADDR_SPACE, DEFAULT_OFFSET, PID_ATTACKER, PID_VICTIM};
use crate::common::error::ConfigError;

/// Default values used when a field is omitted.
mod defaults {
    /// Saturating counter width of the PHT.
    pub const COUNTER_BITS: u32 = 2;

    /// Number of PHT counters.
    pub const COUNTER_NUMS: usize = 1024;

    /// BTB associativity.
    pub const BTB_WAYS: usize = 4;

    /// BTB set count.
    pub const BTB_SETS: usize = 1024;

    /// Probability that the noisy scheme perturbs an index.
    pub const NOISE_RATE: f64 = 0.1;

    /// Rounds of the tweakable block cipher.
    pub const CIPHER_ROUNDS: u32 = 7;

    /// Candidate generations per attack call.
    pub const NUM_LOOPS: u64 = 1_000_000_000;

    /// Predictor accesses one attack call may consume.
    pub const MAX_ACCESSES: u64 = 100_000_000;

    /// Secrets drawn per experiment bench.
    pub const SECRETS: usize = 16;

    /// Access budgets swept by the reuse collision experiment.
    pub const REUSE_BUDGETS: [u64; 8] = [
        10_000,
        50_000,
        100_000,
        200_000,
        500_000,
        1_000_000,
        10_000_000,
        100_000_000,
    ];

    /// Increment between access budgets in the budget sweeps.
    pub const BUDGET_STEP: u64 = 1000;

    /// Increment between prune-set sizes in the BTB pruning sweeps.
    pub const PRUNE_STEP: usize = 100;

    /// Target eviction-set size for the BTB collision experiment.
    pub const EVICTION_SIZE: usize = 4;

    /// Target occupancy-set size against the PHT.
    pub const PHT_OCCUPANCY_SIZE: usize = 1024;

    /// Target occupancy-set size against the BTB.
    pub const BTB_OCCUPANCY_SIZE: usize = 4096;

    /// Buckets per predictor in the leakage histograms.
    pub const LEAKAGE_BUCKETS: usize = 9;
}

/// BTB replacement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Evict the way with the largest age counter (first in way order on ties).
    #[default]
    #[serde(alias = "Lru")]
    Lru,
    /// Evict a uniformly random way.
    #[serde(alias = "Random")]
    Random,
}

/// Source of the key material used by keyed schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum KeyMode {
    /// Use the fixed key table; runs are reproducible.
    #[default]
    Fixed,
    /// Draw keys from the predictor's generator at construction and on rekey.
    Random,
}

/// The seven predictor variants under study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PredictorKind {
    /// Unprotected baseline: identity transforms.
    #[default]
    #[serde(alias = "BaseBPU")]
    Base,
    /// Baseline transforms with a fixed 3-bit PHT counter.
    #[serde(alias = "BSUP")]
    Bsup,
    /// Domain-independent XOR index key, per-domain XOR content key.
    #[serde(alias = "XorBP")]
    XorBp,
    /// XOR scheme with random index perturbation on a fraction of accesses.
    #[serde(alias = "NoisyXorBP")]
    NoisyXorBp,
    /// PID and domain keyed index, domain-independent content key.
    #[serde(alias = "LSBP")]
    Lsbp,
    /// Per-domain index key, index hash and content key.
    #[serde(alias = "STBPU")]
    Stbpu,
    /// Domain-partitioned PHT and cipher-indexed BTB.
    #[serde(alias = "HyBP")]
    HyBp,
}

impl PredictorKind {
    /// All variants in reporting order.
    pub const ALL: [Self; 7] = [
        Self::Base,
        Self::Bsup,
        Self::XorBp,
        Self::NoisyXorBp,
        Self::Lsbp,
        Self::Stbpu,
        Self::HyBp,
    ];

    /// Short display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Base => "BaseBPU",
            Self::Bsup => "BSUP",
            Self::XorBp => "XorBP",
            Self::NoisyXorBp => "NoisyXorBP",
            Self::Lsbp => "LSBP",
            Self::Stbpu => "STBPU",
            Self::HyBp => "HyBP",
        }
    }
}

impl fmt::Display for PredictorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pattern History Table geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PhtConfig {
    /// Width of each saturating counter.
    #[serde(default = "PhtConfig::default_counter_bits")]
    pub counter_bits: u32,

    /// Number of counters.
    #[serde(default = "PhtConfig::default_counter_nums")]
    pub counter_nums: usize,

    /// Low address bits discarded before indexing.
    #[serde(default = "default_offset")]
    pub offset: u32,
}

impl PhtConfig {
    fn default_counter_bits() -> u32 {
        defaults::COUNTER_BITS
    }

    fn default_counter_nums() -> usize {
        defaults::COUNTER_NUMS
    }
}

impl Default for PhtConfig {
    fn default() -> Self {
        Self {
            counter_bits: defaults::COUNTER_BITS,
            counter_nums: defaults::COUNTER_NUMS,
            offset: DEFAULT_OFFSET,
        }
    }
}

/// Branch Target Buffer geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BtbConfig {
    /// Associativity.
    #[serde(default = "BtbConfig::default_ways")]
    pub ways: usize,

    /// Number of sets; must be a power of two.
    #[serde(default = "BtbConfig::default_sets")]
    pub sets: usize,

    /// Low address bits discarded before indexing.
    #[serde(default = "default_offset")]
    pub offset: u32,

    /// Victim selection on allocation into a full set.
    #[serde(default)]
    pub policy: ReplacementPolicy,
}

impl BtbConfig {
    fn default_ways() -> usize {
        defaults::BTB_WAYS
    }

    fn default_sets() -> usize {
        defaults::BTB_SETS
    }
}

impl Default for BtbConfig {
    fn default() -> Self {
        Self {
            ways: defaults::BTB_WAYS,
            sets: defaults::BTB_SETS,
            offset: DEFAULT_OFFSET,
            policy: ReplacementPolicy::Lru,
        }
    }
}

const fn default_offset() -> u32 {
    DEFAULT_OFFSET
}

/// Parameters shared by every predictor variant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictorConfig {
    /// Address width in bits.
    #[serde(default = "PredictorConfig::default_addr_space")]
    pub addr_space: u32,

    /// PHT geometry.
    #[serde(default)]
    pub pht: PhtConfig,

    /// BTB geometry.
    #[serde(default)]
    pub btb: BtbConfig,

    /// Key source for keyed schemes.
    #[serde(default)]
    pub key_mode: KeyMode,

    /// Fraction of accesses the noisy scheme perturbs.
    #[serde(default = "PredictorConfig::default_noise_rate")]
    pub noise_rate: f64,

    /// Rounds of the tweakable block cipher.
    #[serde(default = "PredictorConfig::default_cipher_rounds")]
    pub cipher_rounds: u32,

    /// Seed for replacement, noise and random keys; `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl PredictorConfig {
    fn default_addr_space() -> u32 {
        DEFAULT_ADDR_SPACE
    }

    fn default_noise_rate() -> f64 {
        defaults::NOISE_RATE
    }

    fn default_cipher_rounds() -> u32 {
        defaults::CIPHER_ROUNDS
    }

    /// Checks the table and scheme preconditions.
    ///
    /// # Returns
    ///
    /// `Ok(())` when every predictor variant can be built from this
    /// configuration, otherwise the first violated precondition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=64).contains(&self.addr_space) {
            return Err(ConfigError::AddrSpace(self.addr_space));
        }
        if self.pht.counter_nums == 0 {
            return Err(ConfigError::EmptyPht);
        }
        if !(1..=32).contains(&self.pht.counter_bits) {
            return Err(ConfigError::CounterBits(self.pht.counter_bits));
        }
        if self.btb.ways == 0 {
            return Err(ConfigError::ZeroWays);
        }
        if !self.btb.sets.is_power_of_two() {
            return Err(ConfigError::SetsNotPowerOfTwo(self.btb.sets));
        }
        for offset in [self.pht.offset, self.btb.offset] {
            if offset >= self.addr_space {
                return Err(ConfigError::Offset {
                    offset,
                    addr_space: self.addr_space,
                });
            }
        }
        if !(0.0..=1.0).contains(&self.noise_rate) {
            return Err(ConfigError::NoiseRate(self.noise_rate));
        }
        if !(1..=8).contains(&self.cipher_rounds) {
            return Err(ConfigError::CipherRounds(self.cipher_rounds));
        }
        Ok(())
    }
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            addr_space: DEFAULT_ADDR_SPACE,
            pht: PhtConfig::default(),
            btb: BtbConfig::default(),
            key_mode: KeyMode::Fixed,
            noise_rate: defaults::NOISE_RATE,
            cipher_rounds: defaults::CIPHER_ROUNDS,
            seed: None,
        }
    }
}

/// Parameters of a single attack invocation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttackConfig {
    /// Upper bound on candidate generations.
    #[serde(default = "AttackConfig::default_num_loops")]
    pub num_loops: u64,

    /// Access budget per call; `None` disables the ceiling.
    #[serde(default = "AttackConfig::default_max_accesses")]
    pub max_accesses: Option<u64>,

    /// Attacker process identifier.
    #[serde(default = "AttackConfig::default_attacker_pid")]
    pub attacker_pid: u64,

    /// Victim process identifier.
    #[serde(default = "AttackConfig::default_victim_pid")]
    pub victim_pid: u64,

    /// Draw both PIDs at random when a bench is built.
    #[serde(default)]
    pub random_pids: bool,

    /// Redraw scheme keys before every BTB candidate.
    #[serde(default)]
    pub rekey_each_attempt: bool,

    /// Seed of the attacker's generator; `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl AttackConfig {
    fn default_num_loops() -> u64 {
        defaults::NUM_LOOPS
    }

    fn default_max_accesses() -> Option<u64> {
        Some(defaults::MAX_ACCESSES)
    }

    fn default_attacker_pid() -> u64 {
        PID_ATTACKER
    }

    fn default_victim_pid() -> u64 {
        PID_VICTIM
    }
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            num_loops: defaults::NUM_LOOPS,
            max_accesses: Some(defaults::MAX_ACCESSES),
            attacker_pid: PID_ATTACKER,
            victim_pid: PID_VICTIM,
            random_pids: false,
            rekey_each_attempt: false,
            seed: None,
        }
    }
}

/// Sweep geometry of the named experiments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExperimentConfig {
    /// Secrets drawn when a bench is built.
    #[serde(default = "ExperimentConfig::default_secrets")]
    pub secrets: usize,

    /// Budgets swept by `reuse-collision`.
    #[serde(default = "ExperimentConfig::default_reuse_budgets")]
    pub reuse_budgets: Vec<u64>,

    /// Increment between budgets in the collision and leakage sweeps.
    #[serde(default = "ExperimentConfig::default_budget_step")]
    pub budget_step: u64,

    /// Increment between prune-set sizes in the BTB pruning sweeps.
    #[serde(default = "ExperimentConfig::default_prune_step")]
    pub prune_step: usize,

    /// Eviction-set size targeted by `prune-btb-collision`.
    #[serde(default = "ExperimentConfig::default_eviction_size")]
    pub eviction_size: usize,

    /// Occupancy-set size targeted against the PHT.
    #[serde(default = "ExperimentConfig::default_pht_occupancy_size")]
    pub pht_occupancy_size: usize,

    /// Occupancy-set size targeted against the BTB.
    #[serde(default = "ExperimentConfig::default_btb_occupancy_size")]
    pub btb_occupancy_size: usize,

    /// Histogram buckets per predictor in the leakage experiments.
    #[serde(default = "ExperimentConfig::default_leakage_buckets")]
    pub leakage_buckets: usize,
}

impl ExperimentConfig {
    fn default_secrets() -> usize {
        defaults::SECRETS
    }

    fn default_reuse_budgets() -> Vec<u64> {
        defaults::REUSE_BUDGETS.to_vec()
    }

    fn default_budget_step() -> u64 {
        defaults::BUDGET_STEP
    }

    fn default_prune_step() -> usize {
        defaults::PRUNE_STEP
    }

    fn default_eviction_size() -> usize {
        defaults::EVICTION_SIZE
    }

    fn default_pht_occupancy_size() -> usize {
        defaults::PHT_OCCUPANCY_SIZE
    }

    fn default_btb_occupancy_size() -> usize {
        defaults::BTB_OCCUPANCY_SIZE
    }

    fn default_leakage_buckets() -> usize {
        defaults::LEAKAGE_BUCKETS
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            secrets: defaults::SECRETS,
            reuse_budgets: defaults::REUSE_BUDGETS.to_vec(),
            budget_step: defaults::BUDGET_STEP,
            prune_step: defaults::PRUNE_STEP,
            eviction_size: defaults::EVICTION_SIZE,
            pht_occupancy_size: defaults::PHT_OCCUPANCY_SIZE,
            btb_occupancy_size: defaults::BTB_OCCUPANCY_SIZE,
            leakage_buckets: defaults::LEAKAGE_BUCKETS,
        }
    }
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use bpgauge_core::config::{Config, ReplacementPolicy};
///
/// let json = r#"{
///     "predictor": {
///         "addr_space": 24,
///         "btb": { "ways": 8, "sets": 256, "policy": "RANDOM" }
///     },
///     "attack": { "max_accesses": null, "seed": 7 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.predictor.addr_space, 24);
/// assert_eq!(config.predictor.btb.policy, ReplacementPolicy::Random);
/// assert_eq!(config.predictor.pht.counter_bits, 2);
/// assert_eq!(config.attack.max_accesses, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    /// Predictor construction parameters.
    #[serde(default)]
    pub predictor: PredictorConfig,
    /// Attack invocation parameters.
    #[serde(default)]
    pub attack: AttackConfig,
    /// Experiment sweep parameters.
    #[serde(default)]
    pub experiment: ExperimentConfig,
}

impl Config {
    /// Parses and validates a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.predictor.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}
