use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::model::{Label, LabelRecord, LabelTable};
use crate::config::{ErrorPolicy, SamplingConfig};
use crate::error::{DatasetError, Result};

// ---------------------------------------------------------------------------
// ResolvedWindow – where in the store one access reads from
// ---------------------------------------------------------------------------

/// Segment window for one access. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedWindow {
    pub label: Label,
    pub begin: i64,
    pub end: i64,
    pub count: i64,
}

impl From<&LabelRecord> for ResolvedWindow {
    fn from(rec: &LabelRecord) -> Self {
        Self {
            label: rec.label,
            begin: rec.begin,
            end: rec.end,
            count: rec.count,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved – a value that may be a stand-in for a failed step
// ---------------------------------------------------------------------------

/// Outcome of a step that the permissive policy is allowed to paper over.
#[derive(Debug)]
pub enum Resolved<T> {
    Ok(T),
    /// `T` is a placeholder; the error says what it replaced.
    Degraded(T, DatasetError),
}

impl<T> Resolved<T> {
    pub fn value(&self) -> &T {
        match self {
            Resolved::Ok(v) | Resolved::Degraded(v, _) => v,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Resolved::Ok(v) | Resolved::Degraded(v, _) => v,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Resolved::Degraded(..))
    }

    pub fn reason(&self) -> Option<&DatasetError> {
        match self {
            Resolved::Ok(_) => None,
            Resolved::Degraded(_, e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Seed of the truncation draw for one sample.
///
/// Pure in both arguments so a sample's truncated length never depends on
/// access order, on other indices, or on which thread asks.
pub fn derive_seed(base_seed: u64, identity: u64) -> u64 {
    base_seed.wrapping_add(identity)
}

/// Uniform draw from `[floor, count]` on a generator local to this call.
pub fn regularised_length(count: i64, floor: i64, seed: u64) -> i64 {
    let mut rng = StdRng::seed_from_u64(seed);
    rng.gen_range(floor..=count.max(floor))
}

// ---------------------------------------------------------------------------
// SampleResolver
// ---------------------------------------------------------------------------

/// Maps an ordinal of the active split to a window into the store.
#[derive(Debug, Clone, Copy)]
pub struct SampleResolver<'a> {
    labels: &'a LabelTable,
    sampling: &'a SamplingConfig,
}

impl<'a> SampleResolver<'a> {
    pub fn new(labels: &'a LabelTable, sampling: &'a SamplingConfig) -> Self {
        Self { labels, sampling }
    }

    /// Look `index` up through `active` and return the record ordinal too.
    fn lookup(&self, active: &[usize], index: usize) -> Result<(usize, &'a LabelRecord)> {
        let ordinal = *active.get(index).ok_or(DatasetError::IndexOutOfRange {
            index,
            len: active.len(),
        })?;
        let record = self
            .labels
            .get(ordinal)
            .ok_or(DatasetError::IndexOutOfRange {
                index: ordinal,
                len: self.labels.len(),
            })?;
        Ok((ordinal, record))
    }

    /// Dispatch on `policy`. Only the strict policy returns `Err`.
    pub fn resolve(
        &self,
        policy: ErrorPolicy,
        active: &[usize],
        index: usize,
        truncation: bool,
    ) -> Result<Resolved<ResolvedWindow>> {
        match policy {
            ErrorPolicy::Strict => self.resolve_strict(active, index).map(Resolved::Ok),
            ErrorPolicy::Permissive => Ok(self.resolve_permissive(active, index, truncation)),
        }
    }

    /// The record's window verbatim. No clamping, no truncation.
    pub fn resolve_strict(&self, active: &[usize], index: usize) -> Result<ResolvedWindow> {
        let (_, record) = self.lookup(active, index)?;
        Ok(ResolvedWindow::from(record))
    }

    /// Clamped and optionally length-regularised window; never fails.
    pub fn resolve_permissive(
        &self,
        active: &[usize],
        index: usize,
        truncation: bool,
    ) -> Resolved<ResolvedWindow> {
        let (ordinal, record) = match self.lookup(active, index) {
            Ok(found) => found,
            Err(e) => return Resolved::Degraded(self.degraded_window(), e),
        };

        let begin = record.begin.max(0);
        let end = record.end.max(begin.saturating_add(1));
        let mut window = ResolvedWindow {
            label: record.label,
            begin,
            end,
            count: end - begin,
        };

        if truncation
            && window.label == Label::Positive
            && window.count > self.sampling.truncate_above
        {
            let seed = derive_seed(self.sampling.base_seed, ordinal as u64);
            let len = regularised_length(window.count, self.sampling.truncate_floor, seed);
            log::trace!(
                "sample {ordinal}: positive window of {} rows truncated to {len}",
                window.count
            );
            window.count = len;
            window.end = window.begin.saturating_add(len);
        }

        Resolved::Ok(window)
    }

    /// Stand-in window for an index that cannot be resolved.
    pub fn degraded_window(&self) -> ResolvedWindow {
        ResolvedWindow {
            label: Label::Negative,
            begin: 0,
            end: self.sampling.degraded_count,
            count: self.sampling.degraded_count,
        }
    }
}
