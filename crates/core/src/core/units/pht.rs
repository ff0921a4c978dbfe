//! Pattern History Table (PHT).
//!
//! A direct-indexed array of saturating counters with a valid bit per entry.
//! Counters may be stored masked with a content key; a key of 0 stores them in
//! the clear. Every lookup performs the matching update, so there is no
//! side-effect-free read.

/// Pattern History Table storage.
#[derive(Clone, Debug)]
pub struct Pht {
    valid: Vec<bool>,
    counters: Vec<u64>,
    counter_bits: u32,
    max: u64,
}

impl Pht {
    /// Creates an all-invalid table.
    ///
    /// # Arguments
    ///
    /// * `counter_bits` - Counter width in bits, at least 1.
    /// * `counter_nums` - Number of entries, at least 1.
    pub fn new(counter_bits: u32, counter_nums: usize) -> Self {
        let counter_bits = counter_bits.clamp(1, 63);
        Self {
            valid: vec![false; counter_nums],
            counters: vec![0; counter_nums],
            counter_bits,
            max: (1u64 << counter_bits) - 1,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Counter width in bits.
    pub const fn counter_bits(&self) -> u32 {
        self.counter_bits
    }

    /// Saturation ceiling `2^counter_bits - 1`.
    pub const fn max_counter(&self) -> u64 {
        self.max
    }

    /// Reduces a transformed index value to a table slot.
    #[inline(always)]
    pub fn slot(&self, value: u64) -> usize {
        (value % self.counters.len() as u64) as usize
    }

    /// Predicts `taken` at `index` and trains the entry.
    ///
    /// # Returns
    ///
    /// Whether the prediction made before the update matched `taken`. An
    /// invalid entry always reports `false` and is initialized instead.
    pub fn lookup(&mut self, index: usize, taken: bool, key: u64) -> bool {
        if !self.valid[index] {
            self.update(index, taken, key);
            return false;
        }
        let counter = self.decode(self.counters[index], key);
        let prediction = (counter >> (self.counter_bits - 1)) & 1 == 1;
        self.update(index, taken, key);
        prediction == taken
    }

    /// Trains the entry at `index` toward `taken`.
    ///
    /// The first touch validates the entry with the counter set to `taken`;
    /// later updates saturate at 0 and at [`max_counter`](Self::max_counter).
    pub fn update(&mut self, index: usize, taken: bool, key: u64) {
        if !self.valid[index] {
            self.valid[index] = true;
            self.counters[index] = self.encode(u64::from(taken), key);
            return;
        }
        let counter = self.decode(self.counters[index], key);
        let counter = if taken {
            (counter + 1).min(self.max)
        } else {
            counter.saturating_sub(1)
        };
        self.counters[index] = self.encode(counter, key);
    }

    /// Returns the decoded counter at `index`, or `None` while invalid.
    pub fn counter(&self, index: usize, key: u64) -> Option<u64> {
        self.valid[index].then(|| self.decode(self.counters[index], key))
    }

    /// Whether the entry at `index` has been touched.
    pub fn is_valid(&self, index: usize) -> bool {
        self.valid[index]
    }

    /// Invalidates every entry.
    pub fn flush(&mut self) {
        self.valid.fill(false);
        self.counters.fill(0);
    }

    #[inline(always)]
    const fn encode(&self, counter: u64, key: u64) -> u64 {
        (counter ^ key) & self.max
    }

    #[inline(always)]
    const fn decode(&self, stored: u64, key: u64) -> u64 {
        (stored ^ key) & self.max
    }
}
