//! Phase averaging of periodic signals.
//!
//! Each sample is mapped to a rotor phase angle from its time stamp and the
//! rotation frequency, then assigned to one of `number_of_bins` equal-width
//! angular bins over a full rotation. Bin boundaries can be rotated by a
//! bin-center offset so that a bin midpoint (rather than an edge) sits at 0°.
//! The bin straddling 0°/360° then wraps around the circle.

use crate::error::{AnalysisError, check_lengths};
use crate::spectral::dominant_phase;
use crate::stats::Accumulator;
use serde::{Deserialize, Serialize};

const FULL_TURN: f64 = 360.0;

/// Options of [`phase_average`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseAverageOptions {
    /// Phase at `t = 0` in degrees.
    pub phase_offset: f64,
    pub number_of_bins: usize,
    /// Rotation of the bin boundaries in degrees. Defaults to half a bin width.
    pub bin_center_offset: Option<f64>,
    /// Repeat a 0° bin as a trailing 360° bin.
    pub include_0_and_360: bool,
    /// Detect the phase of every signal instead of using `phase_offset`.
    pub remove_phase_offset: bool,
    /// Keep the raw values of every bin.
    pub keep_values: bool,
}

impl Default for PhaseAverageOptions {
    fn default() -> Self {
        Self {
            phase_offset: 0.0,
            number_of_bins: 45,
            bin_center_offset: None,
            include_0_and_360: true,
            remove_phase_offset: false,
            keep_values: false,
        }
    }
}

/// Angular partition of a full rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseBins {
    number_of_bins: usize,
    bin_width: f64,
    offset: f64,
}

impl PhaseBins {
    /// Validate the bin layout.
    ///
    /// # Errors
    /// Fails if there are no bins, if `bin_center_offset` is negative or
    /// if it is not smaller than one bin width.
    pub fn new(
        number_of_bins: usize,
        bin_center_offset: Option<f64>,
    ) -> Result<Self, AnalysisError> {
        if number_of_bins == 0 {
            return Err(AnalysisError::InvalidBinCount(number_of_bins));
        }
        let bin_width = FULL_TURN / number_of_bins as f64;
        let offset = bin_center_offset.unwrap_or(0.5 * bin_width);

        if offset < 0.0 {
            return Err(AnalysisError::NegativeBinCenterOffset(offset));
        }
        if offset >= bin_width {
            return Err(AnalysisError::BinCenterOffsetTooLarge { offset, bin_width });
        }

        Ok(Self {
            number_of_bins,
            bin_width,
            offset,
        })
    }

    pub fn len(&self) -> usize {
        self.number_of_bins
    }

    pub fn is_empty(&self) -> bool {
        self.number_of_bins == 0
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    /// Bin containing `angle` (degrees, any range).
    ///
    /// Bin `k` covers `[offset + k * width, offset + (k + 1) * width)` taken
    /// modulo 360, so the last bin absorbs the angles below `offset`.
    pub fn index(&self, angle: f64) -> usize {
        let shifted = (angle - self.offset).rem_euclid(FULL_TURN);
        let idx = (shifted / self.bin_width).floor() as usize;
        // rem_euclid may round up to exactly 360 for tiny negative inputs.
        idx.min(self.number_of_bins - 1)
    }

    /// Midpoint of bin `k` in `[0, 360)`.
    ///
    /// Wrapped in bin units so that a bin centered on 0° maps to exactly 0.
    pub fn midpoint(&self, k: usize) -> f64 {
        let pos = (self.offset / self.bin_width + k as f64 + 0.5)
            .rem_euclid(self.number_of_bins as f64);
        pos * self.bin_width
    }
}

/// Phase angle in `[0, 360)` of time `t` for a rotation at `frequency` Hz.
pub fn phase_angle(t: f64, frequency: f64, phase_offset: f64) -> f64 {
    (FULL_TURN * frequency * t + phase_offset).rem_euclid(FULL_TURN)
}

/// Per-bin statistics of one signal, ordered like the bin midpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinnedSignal {
    pub mean: Vec<f64>,
    pub std_dev: Vec<f64>,
    pub count: Vec<usize>,
    pub values: Option<Vec<Vec<f64>>>,
    /// Degrees added to the time-derived phase before binning.
    pub phase_shift: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseAverageResult {
    /// Bin midpoints in degrees, ascending.
    pub bin_midpoints: Vec<f64>,
    pub signals: Vec<BinnedSignal>,
    /// Number of real bins; a trailing 360° duplicate row is not counted.
    pub number_of_bins: usize,
}

impl PhaseAverageResult {
    /// `true` if the last row repeats the 0° bin at 360°.
    pub fn is_closed(&self) -> bool {
        self.bin_midpoints.len() > self.number_of_bins
    }

    /// Number of samples of signal `i_sig` assigned to a bin.
    pub fn sample_count(&self, i_sig: usize) -> usize {
        self.signals[i_sig].count[..self.number_of_bins].iter().sum()
    }
}

/// Phase-average every signal in `y_arrs` over one rotation at `frequency` Hz.
///
/// Empty bins report a mean and standard deviation of zero with a count of zero.
///
/// # Errors
/// Fails on an invalid bin layout (see [`PhaseBins::new`]), on signals whose
/// length differs from `t_arr`, and when phase detection is requested for
/// fewer than two samples.
pub fn phase_average<Y: AsRef<[f64]>>(
    t_arr: &[f64],
    y_arrs: &[Y],
    frequency: f64,
    options: &PhaseAverageOptions,
) -> Result<PhaseAverageResult, AnalysisError> {
    let bins = PhaseBins::new(options.number_of_bins, options.bin_center_offset)?;
    let y_arrs: Vec<&[f64]> = y_arrs.iter().map(AsRef::as_ref).collect();
    check_lengths(t_arr.len(), &y_arrs)?;

    let base_phase: Vec<f64> = t_arr
        .iter()
        .map(|&t| phase_angle(t, frequency, 0.0))
        .collect();

    let mut order: Vec<usize> = (0..bins.len()).collect();
    order.sort_by(|&a, &b| bins.midpoint(a).total_cmp(&bins.midpoint(b)));
    let mut bin_midpoints: Vec<f64> = order.iter().map(|&k| bins.midpoint(k)).collect();

    let mut signals = Vec::with_capacity(y_arrs.len());
    for y_arr in y_arrs {
        let phase_shift = if options.remove_phase_offset {
            dominant_phase(t_arr, y_arr, frequency)?
        } else {
            options.phase_offset
        };
        signals.push(bin_signal(
            &bins,
            &order,
            &base_phase,
            y_arr,
            phase_shift,
            options.keep_values,
        ));
    }

    let closed = options.include_0_and_360 && bin_midpoints.first() == Some(&0.0);
    if closed {
        bin_midpoints.push(FULL_TURN);
        for signal in &mut signals {
            signal.close_loop();
        }
    }

    Ok(PhaseAverageResult {
        bin_midpoints,
        signals,
        number_of_bins: bins.len(),
    })
}

fn bin_signal(
    bins: &PhaseBins,
    order: &[usize],
    base_phase: &[f64],
    y_arr: &[f64],
    phase_shift: f64,
    keep_values: bool,
) -> BinnedSignal {
    let mut acc_vec = vec![Accumulator::new(); bins.len()];
    let mut values = vec![Vec::new(); if keep_values { bins.len() } else { 0 }];

    for (&phase, &val) in base_phase.iter().zip(y_arr) {
        let k = bins.index(phase + phase_shift);
        acc_vec[k].add(val);
        if keep_values {
            values[k].push(val);
        }
    }

    let reports: Vec<_> = order.iter().map(|&k| acc_vec[k].report()).collect();
    BinnedSignal {
        mean: reports.iter().map(|rep| rep.mean).collect(),
        std_dev: reports.iter().map(|rep| rep.std_dev).collect(),
        count: reports.iter().map(|rep| rep.count).collect(),
        values: keep_values.then(|| {
            order
                .iter()
                .map(|&k| std::mem::take(&mut values[k]))
                .collect()
        }),
        phase_shift,
    }
}

impl BinnedSignal {
    fn close_loop(&mut self) {
        if let Some(&mean) = self.mean.first() {
            self.mean.push(mean);
        }
        if let Some(&std_dev) = self.std_dev.first() {
            self.std_dev.push(std_dev);
        }
        if let Some(&count) = self.count.first() {
            self.count.push(count);
        }
        if let Some(values) = &mut self.values {
            if let Some(first) = values.first().cloned() {
                values.push(first);
            }
        }
    }
}
