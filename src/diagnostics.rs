use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::DatasetError;

/// Counters for samples the permissive policy had to stand in for.
///
/// Shared by every handle cloned from the same dataset.
#[derive(Debug, Default)]
pub struct Diagnostics {
    unresolved: AtomicUsize,
    unmaterialized: AtomicUsize,
}

/// Point-in-time copy of [`Diagnostics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DegradeCounts {
    /// Indices that did not map to a label record.
    pub unresolved: usize,
    /// Windows whose slice could not be read from the store.
    pub unmaterialized: usize,
}

impl DegradeCounts {
    pub fn total(&self) -> usize {
        self.unresolved + self.unmaterialized
    }
}

impl Diagnostics {
    pub fn record_unresolved(&self, index: usize, reason: &DatasetError) {
        self.unresolved.fetch_add(1, Ordering::Relaxed);
        log::warn!("index {index}: substituted degraded sample ({reason})");
    }

    pub fn record_unmaterialized(&self, index: usize, reason: &DatasetError) {
        self.unmaterialized.fetch_add(1, Ordering::Relaxed);
        log::warn!("index {index}: substituted zero tensor ({reason})");
    }

    pub fn snapshot(&self) -> DegradeCounts {
        DegradeCounts {
            unresolved: self.unresolved.load(Ordering::Relaxed),
            unmaterialized: self.unmaterialized.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.unresolved.store(0, Ordering::Relaxed);
        self.unmaterialized.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_resets() {
        let d = Diagnostics::default();
        let err = DatasetError::IndexOutOfRange { index: 1, len: 0 };
        d.record_unresolved(1, &err);
        d.record_unresolved(2, &err);
        d.record_unmaterialized(3, &err);
        assert_eq!(
            d.snapshot(),
            DegradeCounts {
                unresolved: 2,
                unmaterialized: 1
            }
        );
        assert_eq!(d.snapshot().total(), 3);
        d.reset();
        assert_eq!(d.snapshot(), DegradeCounts::default());
    }
}
