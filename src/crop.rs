//! Time-window cropping of signal arrays.

use crate::error::{AnalysisError, check_lengths};
use serde::{Deserialize, Serialize};

/// Exclusive `(lower, upper)` bounds of an analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeLimits {
    pub lower: f64,
    pub upper: f64,
}

impl TimeLimits {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Both bounds are excluded.
    pub fn contains(&self, x: f64) -> bool {
        self.lower < x && x < self.upper
    }
}

impl Default for TimeLimits {
    /// Every positive time.
    fn default() -> Self {
        Self::new(0.0, 1e9)
    }
}

/// A reference array and its dependent arrays restricted to a window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CroppedArrays {
    pub x: Vec<f64>,
    pub ys: Vec<Vec<f64>>,
}

impl CroppedArrays {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Restrict `x` and every array in `ys` to the indices where `limits.lower < x < limits.upper`.
///
/// An empty selection is not an error.
///
/// # Errors
/// Returns [`AnalysisError::LengthMismatch`] if an array in `ys` differs in length from `x`.
pub fn crop_arrays<Y: AsRef<[f64]>>(
    x: &[f64],
    ys: &[Y],
    limits: TimeLimits,
) -> Result<CroppedArrays, AnalysisError> {
    let ys: Vec<&[f64]> = ys.iter().map(AsRef::as_ref).collect();
    check_lengths(x.len(), &ys)?;

    let mask: Vec<bool> = x.iter().map(|&val| limits.contains(val)).collect();
    let select = |arr: &[f64]| -> Vec<f64> {
        arr.iter()
            .zip(&mask)
            .filter_map(|(&val, &keep)| keep.then_some(val))
            .collect()
    };

    Ok(CroppedArrays {
        x: select(x),
        ys: ys.into_iter().map(select).collect(),
    })
}

/// Mean of `y` over the samples where `limits.lower < x < limits.upper`.
///
/// Returns `NaN` when no sample is selected.
pub fn cropped_mean(x: &[f64], y: &[f64], limits: TimeLimits) -> Result<f64, AnalysisError> {
    let cropped = crop_arrays(x, &[y], limits)?;
    Ok(mean(&cropped.ys[0]))
}

/// Index and value of the first time nearest to `target`.
pub fn nearest_index(times: &[f64], target: f64) -> Option<(usize, f64)> {
    let mut nearest: Option<(usize, f64)> = None;
    for (idx, &time) in times.iter().enumerate() {
        let diff = (time - target).abs();
        match nearest {
            Some((i_min, _)) if (times[i_min] - target).abs() <= diff => {}
            _ => nearest = Some((idx, time)),
        }
    }
    nearest
}

pub(crate) fn mean(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.iter().sum::<f64>() / vals.len() as f64
}
