use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the detector at its public boundary.
///
/// Per-frame inference failures never show up here; the session logs them and
/// reports an empty result instead.
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Failed to load model {path:?}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    #[error("Failed to load labels {path:?}: {source}")]
    LabelLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Model shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Label count mismatch: model declares {expected} classes, label file has {found}")]
    LabelCountMismatch { expected: usize, found: usize },

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Detector session is closed")]
    SessionClosed,
}
