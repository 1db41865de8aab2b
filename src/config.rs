use crate::crop::TimeLimits;
use crate::phase::{PhaseAverageOptions, PhaseBins};
use crate::turbulence::DEFAULT_T_LIMITS;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Analysis configuration of a case.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Phase averaging of the signals, if requested.
    pub phase_average: Option<PhaseAverageConfig>,
    /// Turbulence statistics of three velocity components, if requested.
    pub turbulence: Option<TurbulenceConfig>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PhaseAverageConfig {
    /// Rotation frequency in Hz.
    pub frequency: f64,

    #[serde(flatten)]
    pub options: PhaseAverageOptions,

    /// Analysis window `[lower, upper]`, both excluded.
    #[serde(default)]
    pub t_limits: Option<[f64; 2]>,

    /// Cutoff frequency in Hz of the low-pass filter applied before averaging.
    #[serde(default)]
    pub low_pass_cutoff: Option<f64>,

    /// Names of the signals to average. All signals by default.
    #[serde(default)]
    pub signals: Option<Vec<String>>,
}

impl PhaseAverageConfig {
    pub fn t_limits(&self) -> TimeLimits {
        self.t_limits
            .map(|[lower, upper]| TimeLimits::new(lower, upper))
            .unwrap_or_default()
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TurbulenceConfig {
    /// Names of the streamwise, lateral and vertical velocity signals.
    pub components: [String; 3],

    /// Analysis window `[lower, upper]`, both excluded.
    #[serde(default)]
    pub t_limits: Option<[f64; 2]>,
}

impl TurbulenceConfig {
    pub fn t_limits(&self) -> TimeLimits {
        self.t_limits
            .map(|[lower, upper]| TimeLimits::new(lower, upper))
            .unwrap_or(DEFAULT_T_LIMITS)
    }
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.phase_average.is_none() && self.turbulence.is_none() {
            bail!("config must request phase averaging, turbulence statistics or both");
        }

        if let Some(pa) = &self.phase_average {
            check_num(pa.frequency, f64::MIN_POSITIVE..f64::INFINITY)
                .context("invalid rotation frequency")?;
            PhaseBins::new(pa.options.number_of_bins, pa.options.bin_center_offset)
                .context("invalid bin layout")?;
            check_limits(pa.t_limits).context("invalid phase averaging window")?;
            if let Some(cutoff) = pa.low_pass_cutoff {
                check_num(cutoff, f64::MIN_POSITIVE..f64::INFINITY)
                    .context("invalid low-pass cutoff")?;
            }
            if pa.signals.as_ref().is_some_and(Vec::is_empty) {
                bail!("list of signals to phase average is empty");
            }
        }

        if let Some(turb) = &self.turbulence {
            check_limits(turb.t_limits).context("invalid turbulence window")?;
        }

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_limits(limits: Option<[f64; 2]>) -> Result<()> {
    let Some([lower, upper]) = limits else {
        return Ok(());
    };
    if !(lower < upper) {
        bail!("lower limit {lower} must be smaller than upper limit {upper}");
    }
    Ok(())
}
