//! Errors raised by the analysis engines.

use thiserror::Error;

/// Broad category of an [`AnalysisError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid arguments, detected before any work is done.
    Configuration,
    /// Degenerate data encountered while computing.
    Numerical,
}

/// Error returned by the phase-averaging and turbulence engines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("number of bins must be at least 1, but is {0}")]
    InvalidBinCount(usize),

    #[error("bin_center_offset must be non-negative, but is {0}")]
    NegativeBinCenterOffset(f64),

    #[error("bin_center_offset must be smaller than the bin width {bin_width}, but is {offset}")]
    BinCenterOffsetTooLarge { offset: f64, bin_width: f64 },

    #[error("array {index} has length {found}, but the time array has length {expected}")]
    LengthMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("at least {needed} samples are required, but only {found} are available")]
    InsufficientSamples { needed: usize, found: usize },

    #[error("velocity component {0} is constant over the analysis window")]
    DegenerateVariance(usize),

    #[error("division by zero in the correlation coefficient at lag {0}")]
    DivisionByZero(i64),
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DegenerateVariance(_) | Self::DivisionByZero(_) => ErrorKind::Numerical,
            _ => ErrorKind::Configuration,
        }
    }
}

pub(crate) fn check_lengths(expected: usize, arrs: &[&[f64]]) -> Result<(), AnalysisError> {
    for (index, arr) in arrs.iter().enumerate() {
        if arr.len() != expected {
            return Err(AnalysisError::LengthMismatch {
                index,
                expected,
                found: arr.len(),
            });
        }
    }
    Ok(())
}
