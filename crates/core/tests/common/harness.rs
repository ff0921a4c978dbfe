use bpgauge_core::attacks::AttackSession;
use bpgauge_core::config::{KeyMode, PredictorConfig, PredictorKind, ReplacementPolicy};
use bpgauge_core::core::PredictorWrapper;
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fluent builder for predictor configurations.
///
/// Starts from the default geometry with index noise disabled and a fixed
/// predictor seed, so every scheme behaves deterministically.
#[derive(Clone, Debug)]
pub struct Setup {
    config: PredictorConfig,
}

impl Default for Setup {
    fn default() -> Self {
        Self::new()
    }
}

impl Setup {
    pub fn new() -> Self {
        init_tracing();
        Self {
            config: PredictorConfig {
                noise_rate: 0.0,
                seed: Some(1),
                ..PredictorConfig::default()
            },
        }
    }

    pub fn addr_space(mut self, bits: u32) -> Self {
        self.config.addr_space = bits;
        self
    }

    pub fn pht(mut self, counter_bits: u32, counter_nums: usize, offset: u32) -> Self {
        self.config.pht.counter_bits = counter_bits;
        self.config.pht.counter_nums = counter_nums;
        self.config.pht.offset = offset;
        self
    }

    pub fn btb(mut self, ways: usize, sets: usize, offset: u32) -> Self {
        self.config.btb.ways = ways;
        self.config.btb.sets = sets;
        self.config.btb.offset = offset;
        self
    }

    pub fn policy(mut self, policy: ReplacementPolicy) -> Self {
        self.config.btb.policy = policy;
        self
    }

    pub fn noise(mut self, rate: f64) -> Self {
        self.config.noise_rate = rate;
        self
    }

    pub fn key_mode(mut self, mode: KeyMode) -> Self {
        self.config.key_mode = mode;
        self
    }

    pub fn config(&self) -> PredictorConfig {
        self.config.clone()
    }

    /// Builds one scheme, panicking on a rejected configuration.
    pub fn build(&self, kind: PredictorKind) -> PredictorWrapper {
        PredictorWrapper::new(kind, &self.config, 1)
            .unwrap_or_else(|e| panic!("{kind} rejected the test configuration: {e}"))
    }
}

/// Attacker session with default identities, no access budget and a fixed seed.
pub fn session(seed: u64) -> AttackSession {
    AttackSession::seeded(seed)
}
