//! Branch Target Buffer (BTB).
//!
//! A set-associative buffer of `sets` x `ways` entries, each holding a valid
//! bit, a source tag, a stored destination and an age counter. The unit is
//! scheme-agnostic: callers pass the already-obfuscated set, tag and
//! destination values.
//!
//! Every lookup ages all valid ways of the accessed set by one before it
//! searches, and every lookup ends with a write.

use std::fmt;

use super::policies::ReplacementPolicy;

/// An entry in the Branch Target Buffer.
#[derive(Clone, Copy, Debug, Default)]
struct BtbEntry {
    /// Whether this way holds data.
    valid: bool,
    /// Obfuscated source tag.
    src: u64,
    /// Obfuscated destination.
    dest: u64,
    /// Accesses to the set since this way was last written.
    lru: u64,
}

/// Result of a BTB lookup as observed through timing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BtbOutcome {
    /// No way held the tag; one was allocated or replaced.
    Invalid,
    /// A way held the tag but a different destination.
    Mispredict,
    /// A way held the tag and the same destination.
    Correct,
}

impl BtbOutcome {
    /// Ternary encoding: `-1` invalid, `0` mispredict, `1` correct.
    pub const fn as_i8(self) -> i8 {
        match self {
            Self::Invalid => -1,
            Self::Mispredict => 0,
            Self::Correct => 1,
        }
    }

    /// Whether a way held the tag.
    pub const fn is_tag_hit(self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

impl From<BtbOutcome> for i8 {
    fn from(outcome: BtbOutcome) -> Self {
        outcome.as_i8()
    }
}

impl fmt::Display for BtbOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

/// Branch Target Buffer storage.
pub struct Btb {
    entries: Vec<BtbEntry>,
    sets: usize,
    ways: usize,
    policy: Box<dyn ReplacementPolicy>,
}

impl fmt::Debug for Btb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Btb")
            .field("sets", &self.sets)
            .field("ways", &self.ways)
            .field("policy", &self.policy.name())
            .finish_non_exhaustive()
    }
}

impl Btb {
    /// Creates an all-invalid buffer.
    ///
    /// # Arguments
    ///
    /// * `ways` - Associativity, at least 1.
    /// * `sets` - Number of sets, at least 1.
    /// * `policy` - Victim selection for allocations into a full set.
    pub fn new(ways: usize, sets: usize, policy: Box<dyn ReplacementPolicy>) -> Self {
        Self {
            entries: vec![BtbEntry::default(); ways * sets],
            sets,
            ways,
            policy,
        }
    }

    /// Number of sets.
    pub const fn sets(&self) -> usize {
        self.sets
    }

    /// Associativity.
    pub const fn ways(&self) -> usize {
        self.ways
    }

    /// Reduces a transformed set value to a set index.
    #[inline(always)]
    pub const fn slot(&self, value: u64) -> usize {
        (value % self.sets as u64) as usize
    }

    fn row(&mut self, set: usize) -> &mut [BtbEntry] {
        let start = set * self.ways;
        &mut self.entries[start..start + self.ways]
    }

    fn find(&self, set: usize, tag: u64) -> Option<usize> {
        let start = set * self.ways;
        self.entries[start..start + self.ways]
            .iter()
            .position(|e| e.valid && e.src == tag)
    }

    /// Looks up `tag` in `set`, predicting `dest`, and writes the outcome back.
    ///
    /// # Returns
    ///
    /// [`BtbOutcome::Correct`] or [`BtbOutcome::Mispredict`] on a tag hit,
    /// [`BtbOutcome::Invalid`] when the tag had to be allocated.
    pub fn lookup(&mut self, set: usize, tag: u64, dest: u64) -> BtbOutcome {
        for entry in self.row(set).iter_mut().filter(|e| e.valid) {
            entry.lru = entry.lru.saturating_add(1);
        }

        if let Some(way) = self.find(set, tag) {
            let outcome = if self.entries[set * self.ways + way].dest == dest {
                BtbOutcome::Correct
            } else {
                BtbOutcome::Mispredict
            };
            self.update(set, tag, dest);
            return outcome;
        }

        let way = match self.row(set).iter().position(|e| !e.valid) {
            Some(way) => way,
            None => {
                let ages: Vec<u64> = self.row(set).iter().map(|e| e.lru).collect();
                self.policy.victim(set, &ages) % self.ways
            }
        };
        let entry = &mut self.row(set)[way];
        entry.valid = true;
        entry.src = tag;
        self.update(set, tag, dest);
        BtbOutcome::Invalid
    }

    /// Writes `dest` into the way holding `tag` and resets its age.
    ///
    /// Does nothing when no way of `set` holds `tag`.
    pub fn update(&mut self, set: usize, tag: u64, dest: u64) {
        if let Some(way) = self.find(set, tag) {
            let entry = &mut self.entries[set * self.ways + way];
            entry.dest = dest;
            entry.lru = 0;
        }
    }

    /// Age of `way` in `set`, or `None` while the way is invalid.
    pub fn lru_age(&self, set: usize, way: usize) -> Option<u64> {
        let entry = &self.entries[set * self.ways + way];
        entry.valid.then_some(entry.lru)
    }

    /// Way of `set` currently holding `tag`.
    pub fn way_of(&self, set: usize, tag: u64) -> Option<usize> {
        self.find(set, tag)
    }

    /// Number of valid ways in `set`.
    pub fn occupancy(&self, set: usize) -> usize {
        let start = set * self.ways;
        self.entries[start..start + self.ways]
            .iter()
            .filter(|e| e.valid)
            .count()
    }

    /// Invalidates every entry.
    pub fn flush(&mut self) {
        self.entries.fill(BtbEntry::default());
    }
}
