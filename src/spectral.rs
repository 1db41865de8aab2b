//! FFT helpers for periodic signals.
//!
//! Frequencies follow the usual discrete Fourier transform layout: bin `k` of an
//! `n`-point transform sampled every `dt` seconds sits at `k / (n * dt)` Hz for the
//! non-negative half and at `(k - n) / (n * dt)` Hz for the rest.

use crate::error::{AnalysisError, check_lengths};
use num_complex::Complex64;
use rustfft::FftPlanner;

/// Offset between the FFT angle of a sine and the angle of the sine itself.
const SINE_REFERENCE_DEG: f64 = 90.0;

fn forward_fft(y: &[f64]) -> Vec<Complex64> {
    let mut buffer: Vec<Complex64> = y.iter().map(|&val| Complex64::new(val, 0.0)).collect();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(buffer.len());
    fft.process(&mut buffer);
    buffer
}

fn fft_frequency(k: usize, n: usize, dt: f64) -> f64 {
    let k = if k <= (n - 1) / 2 {
        k as f64
    } else {
        k as f64 - n as f64
    };
    k / (n as f64 * dt)
}

/// FFT bin whose non-negative frequency is nearest to `frequency`.
fn nearest_bin(n: usize, dt: f64, frequency: f64) -> usize {
    let mut best = 0;
    let mut best_diff = f64::INFINITY;
    for k in 0..=(n - 1) / 2 {
        let diff = (fft_frequency(k, n, dt) - frequency).abs();
        if diff < best_diff {
            best = k;
            best_diff = diff;
        }
    }
    best
}

fn spectrum_at(
    t: &[f64],
    y: &[f64],
    frequency: f64,
) -> Result<(Complex64, usize), AnalysisError> {
    check_lengths(t.len(), &[y])?;
    if t.len() < 2 {
        return Err(AnalysisError::InsufficientSamples {
            needed: 2,
            found: t.len(),
        });
    }

    let n = t.len();
    let dt = t[1] - t[0];
    let spectrum = forward_fft(y);
    let k = nearest_bin(n, dt, frequency);
    Ok((spectrum[k], n))
}

/// Phase in degrees of the component of `y` at `frequency`, referenced to a sine.
///
/// The angle is that of the first sample: a signal `sin(2π f t + φ)` sampled
/// from `t[0]` yields `φ + 360 f t[0]` (modulo 360).
pub fn dominant_phase(t: &[f64], y: &[f64], frequency: f64) -> Result<f64, AnalysisError> {
    let (coeff, _) = spectrum_at(t, y, frequency)?;
    Ok(coeff.arg().to_degrees() + SINE_REFERENCE_DEG)
}

/// Peak-to-peak amplitude of the component of `y` at `frequency`.
pub fn peak_to_peak(t: &[f64], y: &[f64], frequency: f64) -> Result<f64, AnalysisError> {
    let (coeff, n) = spectrum_at(t, y, frequency)?;
    Ok(4.0 / n as f64 * coeff.norm())
}

/// Remove every spectral component above `cutoff` Hz.
pub fn low_pass_filter(y: &[f64], cutoff: f64, sample_rate: f64) -> Vec<f64> {
    let n = y.len();
    if n == 0 {
        return Vec::new();
    }
    let dt = 1.0 / sample_rate;

    let mut spectrum = forward_fft(y);
    for (k, coeff) in spectrum.iter_mut().enumerate() {
        if fft_frequency(k, n, dt).abs() > cutoff {
            *coeff = Complex64::new(0.0, 0.0);
        }
    }

    let mut planner = FftPlanner::new();
    let ifft = planner.plan_fft_inverse(n);
    ifft.process(&mut spectrum);

    // rustfft leaves the inverse unnormalized.
    let scale = 1.0 / n as f64;
    spectrum.iter().map(|coeff| coeff.re * scale).collect()
}
