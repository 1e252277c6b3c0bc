// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for tillscan.

use thiserror::Error;

/// Top-level error type for all tillscan operations.
#[derive(Debug, Error)]
pub enum TillscanError {
    // -- Geometry --
    #[error(
        "could not find receipt outline: none of {candidates} candidate region(s) \
         reduced to a four-sided polygon"
    )]
    BoundaryNotFound { candidates: usize },

    // -- Collaborators --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("region detection failed: {0}")]
    DetectionError(String),

    #[error("OCR failed: {0}")]
    OcrError(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- I/O --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TillscanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_not_found_mentions_candidate_count() {
        let err = TillscanError::BoundaryNotFound { candidates: 3 };
        let msg = err.to_string();
        assert!(msg.contains("could not find receipt outline"), "{msg}");
        assert!(msg.contains('3'), "{msg}");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TillscanError = io.into();
        assert!(matches!(err, TillscanError::Io(_)));
    }
}
