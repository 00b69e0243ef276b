//! Error types for dictionary and configuration loading.
//!
//! Only loading can fail. Every per-query anomaly (no segmentation, unknown
//! selection, too many candidates) degrades to fewer suggestions instead of
//! surfacing an error.

use std::io;
use std::path::{Path, PathBuf};

/// Failure to read a TOML configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    /// Read a config file, tagging I/O failures with its path.
    pub fn read(path: &Path) -> Result<String, ConfigError> {
        std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Failure to build a `DictionaryStore` from a source.
///
/// Construction is all-or-nothing: any of these aborts the load and no partial
/// dictionary is ever served.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<LoadError>,
    },

    #[error("malformed entry: {0}")]
    Malformed(String),

    #[error("empty spelling")]
    EmptySpelling,

    #[error("spelling {0:?} contains non-letter characters")]
    InvalidSpelling(String),

    #[error("empty candidate text for spelling {0:?}")]
    EmptyCandidate(String),

    #[error("missing frequency for {text:?} ({spelling})")]
    MissingFrequency { spelling: String, text: String },

    #[error("invalid frequency {value:?} for {text:?} ({spelling})")]
    InvalidFrequency {
        spelling: String,
        text: String,
        value: String,
    },

    #[error("conflicting frequencies for {text:?} ({spelling}): {first} vs {second}")]
    ConflictingFrequency {
        spelling: String,
        text: String,
        first: f64,
        second: f64,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("fst error: {0}")]
    Fst(#[from] fst::Error),

    #[error("index and payloads disagree: {0}")]
    Inconsistent(String),
}

impl LoadError {
    /// Attach a 1-based source line number to an error.
    pub fn at_line(self, line: usize) -> Self {
        LoadError::AtLine {
            line,
            source: Box::new(self),
        }
    }

    /// Strip any line-number wrappers and return the underlying error.
    pub fn root(&self) -> &LoadError {
        match self {
            LoadError::AtLine { source, .. } => source.root(),
            other => other,
        }
    }
}
