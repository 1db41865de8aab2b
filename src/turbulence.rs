//! Reynolds stresses and integral scales of a velocity time series.

use crate::crop::{TimeLimits, crop_arrays, mean};
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Minimum window length for which the lag sweep is non-empty.
const MIN_SAMPLES: usize = 3;

/// Analysis window used when none is configured.
pub const DEFAULT_T_LIMITS: TimeLimits = TimeLimits {
    lower: 0.0,
    upper: 1000.0,
};

pub type Tensor = [[f64; 3]; 3];

/// Turbulence statistics of a three-component velocity signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurbulenceResult {
    /// Reynolds stress tensor `R[i][j] = <u'_i u'_j>`.
    pub reynolds_stress: Tensor,
    /// Turbulent kinetic energy, half the trace of the Reynolds stress tensor.
    pub k: f64,
    pub mean_velocity: [f64; 3],
    /// Integral time scale of every component pair.
    pub integral_time_scale: Tensor,
    /// Integral time scales converted to lengths with the mean speed.
    pub integral_length_scale: Tensor,
}

/// Lag-correlation coefficients of two fluctuation signals around the middle sample.
///
/// The coefficient at lag `τ` is `<u v_τ> / <u u>`, where both means run over
/// the overlapping part of the two signals. Only the variance of `u` enters
/// the normalization, so the coefficient is not symmetric in `u` and `v`.
#[derive(Debug, Clone, PartialEq)]
pub struct Autocorrelation {
    pub lags: Vec<i64>,
    pub coefficients: Vec<f64>,
    /// Middle sample of the series, used to locate the integration window.
    pub ref_idx: usize,
    n_samples: usize,
}

impl Autocorrelation {
    /// # Errors
    /// Fails if the signals have fewer than three samples or different
    /// lengths, and when a normalizing mean square is zero.
    pub fn compute(u: &[f64], v: &[f64]) -> Result<Self, AnalysisError> {
        let n = u.len();
        if v.len() != n {
            return Err(AnalysisError::LengthMismatch {
                index: 1,
                expected: n,
                found: v.len(),
            });
        }
        if n < MIN_SAMPLES {
            return Err(AnalysisError::InsufficientSamples {
                needed: MIN_SAMPLES,
                found: n,
            });
        }

        let ref_idx = n / 2;
        let (n_i, ref_i) = (n as i64, ref_idx as i64);
        let lags: Vec<i64> = ((ref_i - n_i + 1)..(n_i - ref_i - 1)).collect();

        let mut coefficients = Vec::with_capacity(lags.len());
        for &lag in &lags {
            let (num, den) = if lag >= 0 {
                // Walk backwards from the reference sample.
                let lag = lag as usize;
                (1..=ref_idx)
                    .map(|idx| (u[idx] * v[idx + lag], u[idx] * u[idx]))
                    .fold((0.0, 0.0), |(a, b), (c, d)| (a + c, b + d))
            } else {
                let lag = lag.unsigned_abs() as usize;
                (ref_idx..n)
                    .map(|idx| (u[idx] * v[idx - lag], u[idx] * u[idx]))
                    .fold((0.0, 0.0), |(a, b), (c, d)| (a + c, b + d))
            };
            if den == 0.0 || !den.is_finite() {
                return Err(AnalysisError::DivisionByZero(lag));
            }
            // Both sums run over the same samples, so the means cancel.
            coefficients.push(num / den);
        }

        Ok(Self {
            lags,
            coefficients,
            ref_idx,
            n_samples: n,
        })
    }

    /// Bounds `(lower, upper)` of the integration window as indices into
    /// [`Self::coefficients`].
    ///
    /// The bounds are the sign changes nearest to the reference sample on
    /// either side; the series ends count as sign changes.
    pub fn integration_window(&self) -> (usize, usize) {
        let mut lower = 0;
        let mut upper = self.n_samples;
        for (idx, pair) in self.coefficients.windows(2).enumerate() {
            // NaN never matches, so it counts as a sign change.
            if matches!((sign(pair[0]), sign(pair[1])), (Some(a), Some(b)) if a == b) {
                continue;
            }
            if idx <= self.ref_idx {
                lower = lower.max(idx);
            }
            if idx >= self.ref_idx {
                upper = upper.min(idx);
            }
        }
        (lower, upper)
    }
}

fn sign(val: f64) -> Option<i8> {
    if val.is_nan() {
        None
    } else if val > 0.0 {
        Some(1)
    } else if val < 0.0 {
        Some(-1)
    } else {
        Some(0)
    }
}

/// Integral time scale of `u` against `v`, both sampled at `t_arr`.
///
/// The correlation coefficient is summed over the integration window with the
/// rectangle rule, using the sample spacing at the lower window bound.
pub fn integral_time_scale(u: &[f64], v: &[f64], t_arr: &[f64]) -> Result<f64, AnalysisError> {
    let corr = Autocorrelation::compute(u, v)?;
    if t_arr.len() != u.len() {
        return Err(AnalysisError::LengthMismatch {
            index: 0,
            expected: t_arr.len(),
            found: u.len(),
        });
    }

    let (lower, upper) = corr.integration_window();
    let upper = upper.min(corr.coefficients.len());
    let dt = t_arr[lower + 1] - t_arr[lower];
    Ok(corr.coefficients[lower..upper].iter().map(|rho| rho * dt).sum())
}

/// Compute the turbulence statistics of the velocity components `u_arr`
/// over the window `t_limits`.
///
/// # Errors
/// Fails if the arrays differ in length, if fewer than three samples fall in
/// the window, or if a component is constant over it.
pub fn calculate_turbulence_properties<Y: AsRef<[f64]>>(
    t_arr: &[f64],
    u_arr: &[Y; 3],
    t_limits: TimeLimits,
) -> Result<TurbulenceResult, AnalysisError> {
    let cropped = crop_arrays(t_arr, u_arr, t_limits)?;
    if cropped.len() < MIN_SAMPLES {
        return Err(AnalysisError::InsufficientSamples {
            needed: MIN_SAMPLES,
            found: cropped.len(),
        });
    }
    for (i_cmp, vel) in cropped.ys.iter().enumerate() {
        if vel.iter().all(|&val| val == vel[0]) {
            return Err(AnalysisError::DegenerateVariance(i_cmp));
        }
    }

    let mut mean_velocity = [0.0; 3];
    for (i_cmp, vel) in cropped.ys.iter().enumerate() {
        mean_velocity[i_cmp] = mean(vel);
    }

    let fluc: Vec<Vec<f64>> = cropped
        .ys
        .iter()
        .zip(mean_velocity)
        .map(|(vel, vel_mean)| vel.iter().map(|val| val - vel_mean).collect())
        .collect();

    let mut reynolds_stress = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            let prod: Vec<f64> = fluc[i].iter().zip(&fluc[j]).map(|(a, b)| a * b).collect();
            reynolds_stress[i][j] = mean(&prod);
        }
    }

    let k = 0.5 * (reynolds_stress[0][0] + reynolds_stress[1][1] + reynolds_stress[2][2]);

    let speed = mean_velocity.iter().map(|vel| vel * vel).sum::<f64>().sqrt();
    let mut time_scales = [[0.0; 3]; 3];
    let mut length_scales = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            let time_scale = integral_time_scale(&fluc[i], &fluc[j], &cropped.x)?;
            time_scales[i][j] = time_scale;
            length_scales[i][j] = speed * time_scale;
        }
    }

    Ok(TurbulenceResult {
        reynolds_stress,
        k,
        mean_velocity,
        integral_time_scale: time_scales,
        integral_length_scale: length_scales,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_chacha::ChaCha12Rng;
    use rand_distr::Normal;
    use std::f64::consts::PI;

    const DT: f64 = 0.01;

    /// Times offset by half a step so that the default window keeps every sample.
    fn times(n: usize) -> Vec<f64> {
        (0..n).map(|i| (i as f64 + 0.5) * DT).collect()
    }

    fn sine(t: &[f64], amplitude: f64, period: f64, phase: f64) -> Vec<f64> {
        t.iter()
            .map(|&t| amplitude * (2.0 * PI * t / period + phase).sin())
            .collect()
    }

    #[test]
    fn sine_statistics() {
        let t = times(2000);
        let u = sine(&t, 2.0, 1.0, 0.0);
        let v = sine(&t, 1.0, 0.5, 0.3);
        let w = sine(&t, 0.5, 0.25, 0.7);
        let result = calculate_turbulence_properties(&t, &[&u, &v, &w], DEFAULT_T_LIMITS)
            .unwrap();

        assert!(result.mean_velocity[0].abs() < 1e-12);
        assert!((result.reynolds_stress[0][0] - 2.0).abs() < 1e-9);
        assert!((result.reynolds_stress[1][1] - 0.5).abs() < 1e-9);
        assert!((result.k - 0.5 * (2.0 + 0.5 + 0.125)).abs() < 1e-9);
    }

    #[test]
    fn identical_components_are_symmetric() {
        let mut rng = ChaCha12Rng::seed_from_u64(5);
        let noise = Normal::new(0.0, 0.2).unwrap();
        let t = times(600);
        let u: Vec<f64> = sine(&t, 1.0, 0.7, 0.0)
            .into_iter()
            .map(|val| 10.0 + val + noise.sample(&mut rng))
            .collect();
        let w: Vec<f64> = t.iter().map(|_| noise.sample(&mut rng)).collect();
        let result = calculate_turbulence_properties(&t, &[&u, &u, &w], DEFAULT_T_LIMITS)
            .unwrap();

        let rs = result.reynolds_stress;
        assert_eq!(rs[0][1], rs[1][0]);
        assert_eq!(rs[0][1], rs[0][0]);
        let ts = result.integral_time_scale;
        assert_eq!(ts[0][1], ts[1][0]);
        assert_eq!(ts[0][1], ts[0][0]);
        assert!((result.mean_velocity[0] - 10.0).abs() < 0.1);
    }

    #[test]
    fn sine_decorrelates_after_quarter_period() {
        let period = 1.0;
        let t = times(2000);
        let u = sine(&t, 1.0, period, 0.0);
        let corr = Autocorrelation::compute(&u, &u).unwrap();

        let zero_idx = corr.lags.iter().position(|&lag| lag == 0).unwrap();
        assert!((corr.coefficients[zero_idx] - 1.0).abs() < 1e-12);

        let (lower, upper) = corr.integration_window();
        let upper_lag = corr.lags[upper] as f64 * DT;
        let lower_lag = corr.lags[lower] as f64 * DT;
        assert!((upper_lag - 0.25 * period).abs() <= 2.0 * DT, "{upper_lag}");
        assert!((lower_lag + 0.25 * period).abs() <= 2.0 * DT, "{lower_lag}");

        let time_scale = integral_time_scale(&u, &u, &t).unwrap();
        assert!(time_scale.is_finite());
        assert!((time_scale - period / PI).abs() < 0.05 * period, "{time_scale}");
    }

    #[test]
    fn window_extends_to_series_ends_without_sign_change() {
        let corr = Autocorrelation {
            lags: (-4..4).collect(),
            coefficients: vec![0.2, 0.4, 0.6, 0.8, 1.0, 0.8, 0.6, 0.4],
            ref_idx: 5,
            n_samples: 10,
        };
        assert_eq!(corr.integration_window(), (0, 10));
    }

    #[test]
    fn lag_regimes_cover_expected_range() {
        let u = [1.0, -2.0, 3.0, -1.0, 0.5, 2.0];
        let corr = Autocorrelation::compute(&u, &u).unwrap();
        assert_eq!(corr.ref_idx, 3);
        assert_eq!(corr.lags, vec![-2, -1, 0, 1]);
        // Lag 0 walks back from the reference sample: u[1..=3].
        let expected = (4.0 + 9.0 + 1.0) / (4.0 + 9.0 + 1.0);
        assert_eq!(corr.coefficients[2], expected);
        // Lag -1 pairs u[3..6] with u[2..5].
        let expected = (-1.0 * 3.0 + 0.5 * -1.0 + 2.0 * 0.5) / (1.0 + 0.25 + 4.0);
        assert_eq!(corr.coefficients[1], expected);
    }

    #[test]
    fn window_is_cropped() {
        let t = times(400);
        let mut u = sine(&t, 1.0, 0.5, 0.0);
        u[0] = 1e6;
        let v = sine(&t, 1.0, 0.25, 0.0);
        let w = sine(&t, 1.0, 0.2, 0.0);
        let limits = TimeLimits::new(t[0], 10.0);
        let result = calculate_turbulence_properties(&t, &[&u, &v, &w], limits).unwrap();
        assert!(result.mean_velocity[0].abs() < 1e-3);
    }

    #[test]
    fn constant_component_is_a_numerical_error() {
        let t = times(100);
        let u = sine(&t, 1.0, 0.3, 0.0);
        let v = vec![0.1; t.len()];
        let err = calculate_turbulence_properties(&t, &[&u, &v, &u], DEFAULT_T_LIMITS)
            .unwrap_err();
        assert_eq!(err, AnalysisError::DegenerateVariance(1));
        assert_eq!(err.kind(), crate::error::ErrorKind::Numerical);
    }

    #[test]
    fn zero_fluctuations_divide_by_zero() {
        let u = [0.0, 0.0, 0.0, 0.0, 1.0];
        let err = Autocorrelation::compute(&u, &u).unwrap_err();
        assert!(matches!(err, AnalysisError::DivisionByZero(_)));
    }

    #[test]
    fn short_window_is_rejected() {
        let t = [0.1, 0.2, 0.3, 0.4];
        let u = [1.0, 2.0, 1.0, 2.0];
        let limits = TimeLimits::new(0.15, 0.35);
        let err = calculate_turbulence_properties(&t, &[u, u, u], limits).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InsufficientSamples {
                needed: 3,
                found: 2
            }
        );
    }
}
