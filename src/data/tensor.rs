use super::model::MeasurementStore;
use super::resolve::{Resolved, ResolvedWindow};
use crate::error::{DatasetError, Result};

/// Dense row-major `f32` tensor of shape `(rows, cols)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTensor {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl SampleTensor {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Wrap row-major values. `data.len()` must be a multiple of `cols`.
    pub fn from_row_major(data: Vec<f32>, cols: usize) -> Option<Self> {
        if cols == 0 || data.len() % cols != 0 {
            return None;
        }
        Some(Self {
            rows: data.len() / cols,
            data,
            cols,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    pub fn row(&self, i: usize) -> Option<&[f32]> {
        (i < self.rows).then(|| &self.data[i * self.cols..(i + 1) * self.cols])
    }

    /// Keep the first `target` rows, right-padding with zero rows if short.
    pub fn fit_rows(mut self, target: usize) -> Self {
        self.data.resize(target * self.cols, 0.0);
        self.rows = target;
        self
    }
}

/// Slice `[begin, end)` out of the store, with `end` clamped to its length.
///
/// Fails when `begin` is negative or when nothing is left to read once `end`
/// is clamped (empty, inverted, or past-the-end windows).
pub fn slice_window(store: &MeasurementStore, window: &ResolvedWindow) -> Result<SampleTensor> {
    let rows = store.rows();
    let fail = |reason: &str| DatasetError::SliceConversion {
        begin: window.begin,
        end: window.end,
        rows,
        reason: reason.to_string(),
    };

    if window.begin < 0 {
        return Err(fail("negative begin"));
    }
    let begin = window.begin as usize;
    let end = window.end.clamp(0, rows as i64) as usize;
    if begin >= end {
        return Err(fail("window is empty after clamping to the store"));
    }

    let values = store
        .rows_slice(begin, end)
        .ok_or_else(|| fail("window outside the store"))?;
    SampleTensor::from_row_major(values.to_vec(), store.width())
        .ok_or_else(|| fail("slice is not a whole number of rows"))
}

/// Variable-length slice; every failure propagates.
pub fn materialize_strict(store: &MeasurementStore, window: &ResolvedWindow) -> Result<SampleTensor> {
    slice_window(store, window)
}

/// Fixed `(target_len, width)` tensor; a failed slice becomes zeros.
pub fn materialize_permissive(
    store: &MeasurementStore,
    window: &ResolvedWindow,
    target_len: usize,
) -> Resolved<SampleTensor> {
    match slice_window(store, window) {
        Ok(tensor) => Resolved::Ok(tensor.fit_rows(target_len)),
        Err(e) => Resolved::Degraded(degraded_tensor(window.count, store.width(), target_len), e),
    }
}

/// Zeros of `count` rows, fitted to `target_len`.
pub fn degraded_tensor(count: i64, cols: usize, target_len: usize) -> SampleTensor {
    // Only the first target_len rows survive fitting.
    let rows = (count.max(0) as usize).min(target_len);
    SampleTensor::zeros(rows, cols).fit_rows(target_len)
}
