//! Error handling utilities shared across the crate.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenient result type used throughout the crate.
pub type Result<T, E = DictError> = std::result::Result<T, E>;

/// Pipeline stage reported alongside errors and cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Building the k-mer frequency index.
    Indexing,
    /// Extracting and scoring candidate segments.
    Extraction,
    /// Greedy coverage selection.
    Selection,
    /// Serialising the dictionary blob.
    Assembly,
    /// Round-trip validation through an external codec.
    Validation,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Indexing => "indexing",
            Self::Extraction => "extraction",
            Self::Selection => "selection",
            Self::Assembly => "assembly",
            Self::Validation => "validation",
        };
        f.write_str(name)
    }
}

/// Domain-specific error describing failures while training or validating a dictionary.
#[derive(Debug, Error)]
pub enum DictError {
    /// Training configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Fewer than two samples were supplied, so no cross-sample redundancy exists.
    #[error("corpus has {found} sample(s); training needs at least 2")]
    EmptyCorpus {
        /// Number of samples actually supplied.
        found: usize,
    },
    /// The corpus holds no exploitable repeated structure.
    #[error("no segment was worth including ({candidates} candidate(s) considered)")]
    EmptyDictionary {
        /// Number of candidate segments the selector examined.
        candidates: usize,
    },
    /// The external codec reported an encoding or decoding failure.
    #[error("codec failure during {phase} of sample {sample}: {source}")]
    Codec {
        /// Stage that invoked the codec.
        phase: Phase,
        /// Index of the sample being processed.
        sample: usize,
        /// Error returned by the codec.
        source: std::io::Error,
    },
    /// A sample did not survive a compress/decompress round trip unchanged.
    #[error("round trip mismatch for sample {sample}")]
    RoundTripMismatch {
        /// Index of the offending sample.
        sample: usize,
    },
    /// A caller-requested abort was observed at a checkpoint.
    #[error("cancelled during {phase}")]
    Cancelled {
        /// Stage in which the cancellation was observed.
        phase: Phase,
    },
    /// Filesystem IO error with optional context path.
    #[error("io error while processing {path:?}: {source}")]
    Io {
        /// Underlying IO error returned by the standard library.
        source: std::io::Error,
        /// Target path associated with the IO failure if available.
        path: Option<PathBuf>,
    },
    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Catch-all variant for invariants that should not occur.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for DictError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl DictError {
    /// Helper constructor that attaches an optional path when wrapping IO errors.
    pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { source, path }
    }

    /// Returns `true` when training legitimately found nothing worth keeping.
    ///
    /// Callers can treat this as "proceed without a dictionary" rather than a failure.
    #[must_use]
    pub fn is_empty_dictionary(&self) -> bool {
        matches!(self, Self::EmptyDictionary { .. })
    }

    /// Returns the pipeline stage associated with the error, when known.
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Codec { phase, .. } | Self::Cancelled { phase } => Some(*phase),
            Self::EmptyDictionary { .. } => Some(Phase::Selection),
            Self::RoundTripMismatch { .. } => Some(Phase::Validation),
            _ => None,
        }
    }
}
