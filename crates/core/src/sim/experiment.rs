use std::fmt;
use std::str::FromStr;

use crate::common::error::ExperimentError;

/// One of the named experiments the bench can run.
///
/// Each experiment takes a size argument and a repetition count; what the
/// size means depends on the experiment (see [`Experiment::size_meaning`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Experiment {
    /// Access counts of the three reuse attacks, one row per repetition.
    ReuseAccess,
    /// Reuse-attack success counts under increasing access budgets.
    ReuseCollision,
    /// Mean eviction-set construction cost per prune-set size.
    PruneBtbPrune,
    /// Eviction-set success counts under increasing access budgets.
    PruneBtbCollision,
    /// Mean PHT occupancy-set construction cost per prune-set size.
    OccupancyPhtPrune,
    /// PHT occupancy-set coverage of the victim under increasing budgets.
    OccupancyPhtCollision,
    /// Mean BTB occupancy-set construction cost per prune-set size.
    OccupancyBtbPrune,
    /// BTB occupancy-set detection of the victim under increasing budgets.
    OccupancyBtbCollision,
    /// Histogram of secrets leaked through PHT occupancy sets.
    LeakagePht,
    /// Histogram of secrets leaked through BTB occupancy sets.
    LeakageBtb,
}

impl Experiment {
    /// Every experiment, in the order the usage text lists them.
    pub const ALL: [Self; 10] = [
        Self::ReuseAccess,
        Self::ReuseCollision,
        Self::PruneBtbPrune,
        Self::PruneBtbCollision,
        Self::OccupancyPhtPrune,
        Self::OccupancyPhtCollision,
        Self::OccupancyBtbPrune,
        Self::OccupancyBtbCollision,
        Self::LeakagePht,
        Self::LeakageBtb,
    ];

    /// Command-line name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ReuseAccess => "reuse-access",
            Self::ReuseCollision => "reuse-collision",
            Self::PruneBtbPrune => "prune-btb-prune",
            Self::PruneBtbCollision => "prune-btb-collision",
            Self::OccupancyPhtPrune => "occupancy-pht-prune",
            Self::OccupancyPhtCollision => "occupancy-pht-collision",
            Self::OccupancyBtbPrune => "occupancy-btb-prune",
            Self::OccupancyBtbCollision => "occupancy-btb-collision",
            Self::LeakagePht => "leakage-pht",
            Self::LeakageBtb => "leakage-btb",
        }
    }

    /// How the experiment interprets its size argument.
    pub const fn size_meaning(self) -> &'static str {
        match self {
            Self::PruneBtbPrune | Self::OccupancyPhtPrune | Self::OccupancyBtbPrune => {
                "largest prune-set size"
            }
            Self::LeakagePht | Self::LeakageBtb => "number of secrets",
            Self::ReuseAccess
            | Self::ReuseCollision
            | Self::PruneBtbCollision
            | Self::OccupancyPhtCollision
            | Self::OccupancyBtbCollision => "unused",
        }
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Experiment {
    type Err = ExperimentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| ExperimentError::UnknownExperiment(s.to_string()))
    }
}
