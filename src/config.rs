use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};

// ---------------------------------------------------------------------------
// Path layout
// ---------------------------------------------------------------------------

/// Directory and file layout of a project checkout.
///
/// ```text
/// <root>/
///   dataset/
///     original_data/      raw CSV exports
///     processed_data/     data.arrow, label.arrow
///   model/
/// ```
///
/// In a config file every field is optional. Missing ones are derived from
/// their parent, so `{"root": "/srv/bci"}` is a complete layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPathConfig")]
pub struct PathConfig {
    pub root: PathBuf,
    pub dataset_dir: PathBuf,
    pub model_dir: PathBuf,
    pub processed_data_dir: PathBuf,
    pub original_data_dir: PathBuf,
    pub data_file: PathBuf,
    pub label_file: PathBuf,
}

pub const DATA_FILE_NAME: &str = "data.arrow";
pub const LABEL_FILE_NAME: &str = "label.arrow";

impl PathConfig {
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let dataset_dir = root.join("dataset");
        let processed_data_dir = dataset_dir.join("processed_data");
        Self {
            model_dir: root.join("model"),
            original_data_dir: dataset_dir.join("original_data"),
            data_file: processed_data_dir.join(DATA_FILE_NAME),
            label_file: processed_data_dir.join(LABEL_FILE_NAME),
            processed_data_dir,
            dataset_dir,
            root,
        }
    }

    /// Named view of every path, keyed the way config files refer to them.
    pub fn entries(&self) -> BTreeMap<&'static str, &Path> {
        BTreeMap::from([
            ("ROOT", self.root.as_path()),
            ("DATASET_DIR", self.dataset_dir.as_path()),
            ("MODEL_DIR", self.model_dir.as_path()),
            ("PROCESSED_DATA_DIR", self.processed_data_dir.as_path()),
            ("ORIGINAL_DATA_DIR", self.original_data_dir.as_path()),
            ("PROCESSED_DATA_FILE", self.data_file.as_path()),
            ("PROCESSED_LABEL_FILE", self.label_file.as_path()),
        ])
    }

    /// Look up a path by key. Unknown keys list the valid ones.
    pub fn get(&self, key: &str) -> Result<&Path> {
        let entries = self.entries();
        entries.get(key).copied().ok_or_else(|| {
            let known: Vec<&str> = entries.keys().copied().collect();
            DatasetError::InvalidConfig(format!(
                "unknown path key '{key}', available keys: {}",
                known.join(", ")
            ))
        })
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self::from_root(".")
    }
}

/// On-disk form of [`PathConfig`].
#[derive(Default, Deserialize)]
#[serde(default)]
struct RawPathConfig {
    root: Option<PathBuf>,
    dataset_dir: Option<PathBuf>,
    model_dir: Option<PathBuf>,
    processed_data_dir: Option<PathBuf>,
    original_data_dir: Option<PathBuf>,
    data_file: Option<PathBuf>,
    label_file: Option<PathBuf>,
}

impl From<RawPathConfig> for PathConfig {
    fn from(raw: RawPathConfig) -> Self {
        let root = raw.root.unwrap_or_else(|| PathBuf::from("."));
        let dataset_dir = raw.dataset_dir.unwrap_or_else(|| root.join("dataset"));
        let processed_data_dir = raw
            .processed_data_dir
            .unwrap_or_else(|| dataset_dir.join("processed_data"));
        Self {
            model_dir: raw.model_dir.unwrap_or_else(|| root.join("model")),
            original_data_dir: raw
                .original_data_dir
                .unwrap_or_else(|| dataset_dir.join("original_data")),
            data_file: raw
                .data_file
                .unwrap_or_else(|| processed_data_dir.join(DATA_FILE_NAME)),
            label_file: raw
                .label_file
                .unwrap_or_else(|| processed_data_dir.join(LABEL_FILE_NAME)),
            processed_data_dir,
            dataset_dir,
            root,
        }
    }
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// How access-time failures are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Propagate every failure, return windows verbatim, no padding.
    Strict,
    /// Clamp, regularise length, pad to a fixed shape, degrade on failure.
    #[default]
    Permissive,
}

/// Which half of the split the dataset indexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Train,
    Test,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Train => write!(f, "train"),
            Mode::Test => write!(f, "test"),
        }
    }
}

// ---------------------------------------------------------------------------
// Split / sampling parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of samples held out for testing, in `(0, 1)`.
    pub test_size: f64,
    pub shuffle: bool,
    pub random_state: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            shuffle: true,
            random_state: 42,
        }
    }
}

/// Parameters of the permissive sampling path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Row count every permissive tensor is padded or truncated to.
    pub target_len: usize,
    /// Initial state of the length-regularisation toggle.
    pub truncation: bool,
    /// Positive samples longer than this are eligible for truncation.
    pub truncate_above: i64,
    /// Lower bound of the truncated length draw.
    pub truncate_floor: i64,
    /// Seed the per-sample truncation generator is derived from.
    pub base_seed: u64,
    /// Row count of the placeholder window used for unresolvable indices.
    pub degraded_count: i64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            target_len: 1024,
            truncation: true,
            truncate_above: 120,
            truncate_floor: 10,
            base_seed: 42,
            degraded_count: 100,
        }
    }
}

impl SamplingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.target_len == 0 {
            return Err(DatasetError::InvalidConfig(
                "target_len must be positive".into(),
            ));
        }
        if self.truncate_floor < 1 {
            return Err(DatasetError::InvalidConfig(format!(
                "truncate_floor must be at least 1, got {}",
                self.truncate_floor
            )));
        }
        if self.truncate_above < self.truncate_floor {
            return Err(DatasetError::InvalidConfig(format!(
                "truncate_above ({}) must not be below truncate_floor ({})",
                self.truncate_above, self.truncate_floor
            )));
        }
        if self.degraded_count < 1 {
            return Err(DatasetError::InvalidConfig(format!(
                "degraded_count must be at least 1, got {}",
                self.degraded_count
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub paths: PathConfig,
    pub split: SplitConfig,
    pub policy: ErrorPolicy,
    pub sampling: SamplingConfig,
}

impl DatasetConfig {
    /// Defaults with every path laid out under `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            paths: PathConfig::from_root(root),
            ..Self::default()
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: DatasetConfig = serde_json::from_str(text)
            .map_err(|e| DatasetError::InvalidConfig(format!("parsing JSON config: {e}")))?;
        config.sampling.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DatasetError::InvalidConfig(format!("reading {}: {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }
}
