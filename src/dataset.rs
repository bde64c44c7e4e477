use std::fmt;
use std::sync::Arc;

use crate::config::{DatasetConfig, ErrorPolicy, Mode, SamplingConfig, DATA_FILE_NAME, LABEL_FILE_NAME};
use crate::data::filter::filter_labels;
use crate::data::loader::load_table;
use crate::data::model::{Label, LabelTable, MeasurementStore, Table};
use crate::data::resolve::{Resolved, SampleResolver};
use crate::data::split::{stratified_split, SplitIndices};
use crate::data::tensor::{degraded_tensor, materialize_permissive, materialize_strict, SampleTensor};
use crate::diagnostics::{DegradeCounts, Diagnostics};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Sample – what one indexed access hands to the training loop
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub label: Label,
    /// Row count of the resolved window (before any padding).
    pub count: i64,
    /// `(rows, width)`; rows is fixed under the permissive policy.
    pub data: SampleTensor,
}

impl Sample {
    /// Binary classification target, 0.0 or 1.0.
    pub fn target(&self) -> f32 {
        self.label.target()
    }
}

// ---------------------------------------------------------------------------
// BciDataset – facade over the shared stores
// ---------------------------------------------------------------------------

/// Everything loaded or computed once at construction. Never mutated.
#[derive(Debug)]
struct Shared {
    measurements: MeasurementStore,
    labels: LabelTable,
    split: SplitIndices,
    policy: ErrorPolicy,
    sampling: SamplingConfig,
    diagnostics: Diagnostics,
}

/// Blood-culture dataset with a stratified train/test split.
///
/// A handle is cheap to clone: clones share the loaded stores and the
/// diagnostic counters but carry their own mode and truncation flags, so a
/// data-loading worker can take a clone, set its flags once, and never race
/// with other handles.
#[derive(Debug, Clone)]
pub struct BciDataset {
    shared: Arc<Shared>,
    mode: Mode,
    truncation: bool,
}

impl BciDataset {
    /// Load both backing tables from the configured paths and build the
    /// dataset. Load failures are fatal under either policy.
    pub fn open(config: &DatasetConfig) -> Result<Self> {
        let measurements = load_table(&config.paths.data_file, DATA_FILE_NAME)?;
        let labels = load_table(&config.paths.label_file, LABEL_FILE_NAME)?;
        Self::from_tables(&measurements, &labels, config)
    }

    /// Build from already-loaded tables.
    pub fn from_tables(measurements: &Table, labels: &Table, config: &DatasetConfig) -> Result<Self> {
        let store = MeasurementStore::from_table(measurements)?;
        let labels = filter_labels(labels)?;
        Self::from_parts(store, labels, config)
    }

    pub fn from_parts(
        measurements: MeasurementStore,
        labels: LabelTable,
        config: &DatasetConfig,
    ) -> Result<Self> {
        config.sampling.validate()?;
        let split = stratified_split(
            &labels.labels(),
            config.split.test_size,
            config.split.shuffle,
            config.split.random_state,
        )?;

        log::info!(
            "dataset ready: {} samples over {} measurement rows, {} train / {} test, {:?} policy",
            labels.len(),
            measurements.rows(),
            split.train.len(),
            split.test.len(),
            config.policy
        );

        Ok(Self {
            truncation: config.sampling.truncation,
            mode: Mode::Train,
            shared: Arc::new(Shared {
                measurements,
                labels,
                split,
                policy: config.policy,
                sampling: config.sampling.clone(),
                diagnostics: Diagnostics::default(),
            }),
        })
    }

    /// Size of the active split.
    pub fn len(&self) -> usize {
        self.active_indices().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample at `index` of the active split.
    ///
    /// Under [`ErrorPolicy::Permissive`] this always returns `Ok`: bad
    /// indices and unreadable windows come back as degraded samples and are
    /// counted in [`diagnostics`](Self::diagnostics).
    pub fn get(&self, index: usize) -> Result<Sample> {
        let shared = &*self.shared;
        let resolver = SampleResolver::new(&shared.labels, &shared.sampling);
        let resolved = resolver.resolve(shared.policy, self.active_indices(), index, self.truncation)?;

        let (window, data) = match (shared.policy, resolved) {
            (ErrorPolicy::Strict, resolved) => {
                let window = resolved.into_value();
                (window, materialize_strict(&shared.measurements, &window)?)
            }
            (ErrorPolicy::Permissive, Resolved::Ok(window)) => {
                let data = match materialize_permissive(
                    &shared.measurements,
                    &window,
                    shared.sampling.target_len,
                ) {
                    Resolved::Ok(data) => data,
                    Resolved::Degraded(data, reason) => {
                        shared.diagnostics.record_unmaterialized(index, &reason);
                        data
                    }
                };
                (window, data)
            }
            (ErrorPolicy::Permissive, Resolved::Degraded(window, reason)) => {
                shared.diagnostics.record_unresolved(index, &reason);
                let data = degraded_tensor(
                    window.count,
                    shared.measurements.width(),
                    shared.sampling.target_len,
                );
                (window, data)
            }
        };

        Ok(Sample {
            label: window.label,
            count: window.count,
            data,
        })
    }

    /// Every sample of the active split, in split order.
    pub fn iter(&self) -> impl Iterator<Item = Result<Sample>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn train(&mut self) {
        self.set_mode(Mode::Train);
    }

    pub fn test(&mut self) {
        self.set_mode(Mode::Test);
    }

    /// Toggle length regularisation. Ignored under the strict policy.
    pub fn set_truncation_policy(&mut self, enabled: bool) {
        self.truncation = enabled;
    }

    pub fn truncation(&self) -> bool {
        self.truncation
    }

    /// New handle on the same stores with `mode` set.
    pub fn with_mode(&self, mode: Mode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    /// New handle on the same stores with truncation set.
    pub fn with_truncation(&self, enabled: bool) -> Self {
        Self {
            truncation: enabled,
            ..self.clone()
        }
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.shared.policy
    }

    pub fn train_indices(&self) -> &[usize] {
        &self.shared.split.train
    }

    pub fn test_indices(&self) -> &[usize] {
        &self.shared.split.test
    }

    fn active_indices(&self) -> &[usize] {
        match self.mode {
            Mode::Train => self.train_indices(),
            Mode::Test => self.test_indices(),
        }
    }

    /// Number of label records after filtering (both splits).
    pub fn num_samples(&self) -> usize {
        self.shared.labels.len()
    }

    pub fn measurement_width(&self) -> usize {
        self.shared.measurements.width()
    }

    pub fn diagnostics(&self) -> DegradeCounts {
        self.shared.diagnostics.snapshot()
    }

    /// Zero the degrade counters, e.g. at the start of an epoch. Affects
    /// every handle sharing these stores.
    pub fn reset_diagnostics(&self) {
        self.shared.diagnostics.reset();
    }
}

impl fmt::Display for BciDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BciDataset(train_size={}, test_size={}, current_mode={})",
            self.train_indices().len(),
            self.test_indices().len(),
            self.mode
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::LabelRecord;

    fn record(code: i64, begin: i64, end: i64) -> LabelRecord {
        LabelRecord {
            label: Label::from_code(code).unwrap(),
            count: end - begin,
            begin,
            end,
        }
    }

    /// Ten samples of 20 rows each, values equal to the row offset.
    fn dataset(policy: ErrorPolicy) -> BciDataset {
        let codes = [2, 2, 2, 3, 3, 3, 2, 2, 3, 3];
        let records = codes
            .iter()
            .enumerate()
            .map(|(i, &c)| record(c, i as i64 * 20, i as i64 * 20 + 20))
            .collect();
        let store = MeasurementStore::from_values("value", (0..200).map(|v| v as f32).collect());
        let config = DatasetConfig {
            policy,
            ..DatasetConfig::default()
        };
        BciDataset::from_parts(store, LabelTable::from_records(records).unwrap(), &config).unwrap()
    }

    #[test]
    fn starts_in_train_mode() {
        let ds = dataset(ErrorPolicy::Permissive);
        assert_eq!(ds.mode(), Mode::Train);
        assert_eq!(ds.len(), 8);
        assert_eq!(
            ds.to_string(),
            "BciDataset(train_size=8, test_size=2, current_mode=train)"
        );
    }

    #[test]
    fn strict_sample_is_the_raw_window() {
        let ds = dataset(ErrorPolicy::Strict);
        let ordinal = ds.train_indices()[0];
        let s = ds.get(0).unwrap();
        assert_eq!(s.count, 20);
        assert_eq!(s.data.shape(), (20, 1));
        assert_eq!(s.data.as_slice()[0], (ordinal * 20) as f32);
    }

    #[test]
    fn permissive_sample_is_padded() {
        let ds = dataset(ErrorPolicy::Permissive);
        for s in ds.iter() {
            let s = s.unwrap();
            assert_eq!(s.data.shape(), (1024, 1));
            assert_eq!(s.count, 20);
        }
        assert_eq!(ds.diagnostics(), DegradeCounts::default());
    }

    #[test]
    fn with_mode_does_not_touch_the_original() {
        let ds = dataset(ErrorPolicy::Permissive);
        let test_view = ds.with_mode(Mode::Test);
        assert_eq!(test_view.len(), 2);
        assert_eq!(ds.len(), 8);
        assert!(!ds.with_truncation(false).truncation());
        assert!(ds.truncation());
    }

    #[test]
    fn dataset_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BciDataset>();
    }
}
