//! Basic block vector (BBV) text format.
//!
//! Each interval of program execution is written as a single line beginning with `T`, followed
//! by whitespace separated `:<block id>:<count>` tokens:
//!
//! ```text
//! T:1:120 :2:4 :7:33
//! T:1:98 :3:60
//! ```
//!
//! Any line that does not start with `T` is ignored, as is any token that does not contain an
//! id/count pair.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::{self, BufRead, BufReader, Write},
    num::NonZero,
    ops::Index,
    path::Path,
};

use tracing::{debug, warn};

use crate::Result;

/// Marker character that begins each interval record.
pub const RECORD_MARKER: char = 'T';

/// Sparse execution frequencies for a single interval, keyed by basic block id.
///
/// Values are normalized to sum to 1.0 unless the interval was degenerate (all counts zero).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntervalVector {
    // Sorted by block id, ids are unique.
    entries: Vec<(u64, f64)>,
    degenerate: bool,
}

impl IntervalVector {
    /// Build a vector directly from `(id, value)` pairs without normalizing.
    ///
    /// If an id appears more than once the last value wins.
    pub fn from_entries(entries: impl IntoIterator<Item = (u64, f64)>) -> Self {
        let entries = entries
            .into_iter()
            .collect::<BTreeMap<_, _>>()
            .into_iter()
            .collect::<Vec<_>>();
        let degenerate = entries.iter().map(|(_, v)| *v).sum::<f64>() <= 0.0;
        Self {
            entries,
            degenerate,
        }
    }

    /// Return true if every count in the source record was zero (or the record was empty), in
    /// which case the vector was not normalized.
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Number of non-zero entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value for block `id`, or 0.0 if the block did not execute in this interval.
    pub fn get(&self, id: u64) -> f64 {
        self.entries
            .binary_search_by_key(&id, |(k, _)| *k)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    /// Iterate over `(id, value)` in ascending id order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (u64, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Largest block id present in this vector.
    pub fn max_id(&self) -> Option<u64> {
        self.entries.last().map(|(id, _)| *id)
    }

    /// Sum of all values; 1.0 for any non-degenerate vector.
    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|(_, v)| *v).sum()
    }
}

/// Accumulates the counts of one record before it is frozen into an [`IntervalVector`].
#[derive(Debug, Default)]
pub struct IntervalAccumulator {
    counts: BTreeMap<u64, f64>,
    sum: f64,
}

impl IntervalAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `count` executions of block `id`.
    ///
    /// A repeated id replaces the stored count but both counts contribute to the total used for
    /// normalization.
    pub fn add(&mut self, id: u64, count: u64) {
        let count = count as f64;
        self.sum += count;
        self.counts.insert(id, count);
    }

    /// Running sum of all counts added so far.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Normalize the accumulated counts into a distribution.
    ///
    /// If the running sum is zero the counts are kept as-is and the result is marked degenerate.
    pub fn finish(self) -> IntervalVector {
        if self.sum > 0.0 {
            IntervalVector {
                entries: self
                    .counts
                    .into_iter()
                    .map(|(id, c)| (id, c / self.sum))
                    .collect(),
                degenerate: false,
            }
        } else {
            IntervalVector {
                entries: self.counts.into_iter().collect(),
                degenerate: true,
            }
        }
    }
}

/// An ordered set of interval vectors along with every block id observed across the set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VectorSet {
    vectors: Vec<IntervalVector>,
    keys: BTreeSet<u64>,
}

impl VectorSet {
    /// Parse records from `reader`. Lines that are not records and tokens that are not id/count
    /// pairs are skipped.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut set = Self::default();
        for line in reader.lines() {
            let line = line?;
            let Some(record) = line.strip_prefix(RECORD_MARKER) else {
                continue;
            };
            let mut accumulator = IntervalAccumulator::new();
            for (id, count) in record.split_whitespace().filter_map(scan_id_count) {
                accumulator.add(id, count);
                set.keys.insert(id);
            }
            let vector = accumulator.finish();
            if vector.is_degenerate() {
                warn!(
                    "interval {} has no block counts; keeping it unnormalized",
                    set.vectors.len()
                );
            }
            set.vectors.push(vector);
        }
        debug!(
            "parsed {} interval vectors with {} unique blocks",
            set.vectors.len(),
            set.keys.len()
        );
        Ok(set)
    }

    /// Open and parse the file at `path`.
    pub fn read_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Build a set from already constructed vectors.
    pub fn from_vectors(vectors: Vec<IntervalVector>) -> Self {
        let keys = vectors
            .iter()
            .flat_map(|v| v.iter().map(|(id, _)| id))
            .collect();
        Self { vectors, keys }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &IntervalVector> {
        self.vectors.iter()
    }

    /// All block ids observed in any vector.
    pub fn keys(&self) -> &BTreeSet<u64> {
        &self.keys
    }

    /// Largest block id observed in any vector.
    pub fn max_id(&self) -> Option<u64> {
        self.keys.last().copied()
    }
}

impl Index<usize> for VectorSet {
    type Output = IntervalVector;

    fn index(&self, index: usize) -> &Self::Output {
        &self.vectors[index]
    }
}

/// Find the first `:<digits>:<digits>` sequence in `token`.
fn scan_id_count(token: &str) -> Option<(u64, u64)> {
    let bytes = token.as_bytes();
    (0..bytes.len())
        .filter(|i| bytes[*i] == b':')
        .find_map(|i| match_id_count(&bytes[i + 1..]))
}

fn match_id_count(bytes: &[u8]) -> Option<(u64, u64)> {
    let id_len = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if id_len == 0 || bytes.get(id_len) != Some(&b':') {
        return None;
    }
    let count = &bytes[id_len + 1..];
    let count_len = count.iter().take_while(|b| b.is_ascii_digit()).count();
    if count_len == 0 {
        return None;
    }
    // Digits are ASCII so these are valid UTF-8.
    let id = std::str::from_utf8(&bytes[..id_len]).ok()?.parse().ok()?;
    let count = std::str::from_utf8(&count[..count_len])
        .ok()?
        .parse()
        .ok()?;
    Some((id, count))
}

/// Records basic block execution counts per fixed-size instruction interval and writes them in
/// the BBV text format.
#[derive(Debug)]
pub struct BbvRecorder {
    interval: NonZero<u64>,
    intervals: Vec<BTreeMap<u64, u64>>,
}

impl BbvRecorder {
    /// Create a recorder that starts a new interval every `interval` instructions.
    pub fn new(interval: NonZero<u64>) -> Self {
        Self {
            interval,
            intervals: vec![],
        }
    }

    /// Record an execution of the block at `target` containing `block_size` instructions.
    pub fn add_sample(&mut self, target: u64, block_size: u64) {
        match self.intervals.last_mut() {
            Some(current) => *current.entry(target).or_default() += block_size,
            None => self.intervals.push(BTreeMap::from([(target, block_size)])),
        }
    }

    /// Begin a new interval if `instruction_count` falls on an interval boundary.
    pub fn next_sample(&mut self, instruction_count: u64) {
        if instruction_count % self.interval.get() != 0 {
            return;
        }
        self.intervals.push(BTreeMap::new());
    }

    /// Number of intervals recorded so far, including the current one.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Write all intervals to `out`.
    ///
    /// Block addresses are remapped to dense ids starting at 1, assigned in order of first
    /// appearance.
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        let mut remap = BTreeMap::new();
        for pc in self.intervals.iter().flat_map(|m| m.keys()) {
            let next = remap.len() as u64 + 1;
            remap.entry(*pc).or_insert(next);
        }

        for interval in self.intervals.iter() {
            write!(out, "{RECORD_MARKER}")?;
            for (pc, count) in interval.iter() {
                write!(out, ":{}:{} ", remap[pc], count)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}
