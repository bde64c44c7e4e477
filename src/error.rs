use std::path::PathBuf;

use thiserror::Error;

/// Result alias for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Everything that can go wrong while loading, splitting or sampling.
///
/// Construction-time variants (`NotFound`, `LoadFailed`, `DataIntegrity`,
/// `InvalidConfig`, `InvalidSplit`) are always fatal. The two access-time
/// variants are propagated under [`ErrorPolicy::Strict`] and absorbed into a
/// degraded sample under [`ErrorPolicy::Permissive`].
///
/// [`ErrorPolicy::Strict`]: crate::config::ErrorPolicy::Strict
/// [`ErrorPolicy::Permissive`]: crate::config::ErrorPolicy::Permissive
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("{name} does not exist, check the path: {}", path.display())]
    NotFound { name: String, path: PathBuf },

    #[error("failed to load {name} from {}: {reason}", path.display())]
    LoadFailed {
        name: String,
        path: PathBuf,
        reason: String,
    },

    #[error("data integrity: {0}")]
    DataIntegrity(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid split: {0}")]
    InvalidSplit(String),

    #[error("index {index} out of range for split of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot materialise window [{begin}, {end}) from store of {rows} rows: {reason}")]
    SliceConversion {
        begin: i64,
        end: i64,
        rows: usize,
        reason: String,
    },
}

impl DatasetError {
    pub(crate) fn load_failed(name: &str, path: &std::path::Path, reason: impl ToString) -> Self {
        DatasetError::LoadFailed {
            name: name.to_string(),
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error is one the permissive policy may absorb.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DatasetError::IndexOutOfRange { .. } | DatasetError::SliceConversion { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_carries_path_hint() {
        let err = DatasetError::NotFound {
            name: "label.arrow".into(),
            path: PathBuf::from("/tmp/processed_data/label.arrow"),
        };
        let msg = err.to_string();
        assert!(msg.contains("label.arrow"));
        assert!(msg.contains("/tmp/processed_data"));
    }

    #[test]
    fn only_access_errors_are_recoverable() {
        assert!(DatasetError::IndexOutOfRange { index: 3, len: 2 }.is_recoverable());
        assert!(DatasetError::SliceConversion {
            begin: 5,
            end: 4,
            rows: 3,
            reason: "empty".into()
        }
        .is_recoverable());
        assert!(!DatasetError::DataIntegrity("empty".into()).is_recoverable());
        assert!(!DatasetError::InvalidSplit("tiny".into()).is_recoverable());
    }
}
