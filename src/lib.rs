//! Blood-culture time-series dataset preparation.
//!
//! Loads a flat measurement store and a per-sample label table, splits the
//! samples into stratified train/test sets, and serves each sample as a
//! tensor ready for a classifier. Two error policies are offered: strict,
//! which fails fast, and permissive, which pads to a fixed shape, regularises
//! the length of long positive samples and never fails on access.

pub mod config;
pub mod data;
pub mod dataset;
pub mod diagnostics;
pub mod error;

pub use config::{DatasetConfig, ErrorPolicy, Mode, PathConfig, SamplingConfig, SplitConfig};
pub use data::model::{Label, LabelRecord, LabelTable, MeasurementStore, Table};
pub use data::tensor::SampleTensor;
pub use dataset::{BciDataset, Sample};
pub use diagnostics::DegradeCounts;
pub use error::{DatasetError, Result};
