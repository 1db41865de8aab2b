//! Data exchanged with the file collaborators.

use crate::phase::PhaseAverageResult;
use crate::turbulence::TurbulenceResult;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Named signals sampled at a common time array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSet {
    pub time: Vec<f64>,
    pub names: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl SignalSet {
    pub fn new(time: Vec<f64>, names: Vec<String>, values: Vec<Vec<f64>>) -> Result<Self> {
        let set = Self {
            time,
            names,
            values,
        };
        set.validate()?;
        Ok(set)
    }

    /// Check that every name has a signal and every signal matches the time array.
    pub fn validate(&self) -> Result<()> {
        let n_names = self.names.len();
        let n_vals = self.values.len();
        if n_names != n_vals {
            bail!("signal set has {n_names} names but {n_vals} signals");
        }
        let len = self.time.len();
        for (name, vals) in self.names.iter().zip(&self.values) {
            if vals.len() != len {
                bail!(
                    "signal {name:?} has {} samples, but the time array has {len}",
                    vals.len()
                );
            }
        }
        Ok(())
    }

    pub fn signal(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx].as_slice())
    }
}

/// Phase-averaged signals together with their names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseAverageReport {
    pub names: Vec<String>,
    pub result: PhaseAverageResult,
    /// Peak-to-peak amplitude of every signal at the rotation frequency.
    pub peak_to_peak: Vec<f64>,
}

/// Everything computed from one signal set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResults {
    pub phase_average: Option<PhaseAverageReport>,
    pub turbulence: Option<TurbulenceResult>,
}
