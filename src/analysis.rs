use crate::config::{Config, PhaseAverageConfig, TurbulenceConfig};
use crate::crop::crop_arrays;
use crate::model::{CaseResults, PhaseAverageReport, SignalSet};
use crate::phase::phase_average;
use crate::spectral::{low_pass_filter, peak_to_peak};
use crate::turbulence::{TurbulenceResult, calculate_turbulence_properties};
use anyhow::{Context, Result, bail};
use rmp_serde::{decode, encode};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Runs the configured analyses on signal sets.
pub struct Analyzer {
    cfg: Config,
}

impl Analyzer {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    /// Load a MessagePack-encoded [`SignalSet`] and check its consistency.
    pub fn load_signals<P: AsRef<Path>>(file: P) -> Result<SignalSet> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);

        let signals: SignalSet =
            decode::from_read(&mut reader).context("failed to deserialize signal set")?;
        signals.validate().context("invalid signal set")?;

        Ok(signals)
    }

    pub fn analyze(&self, signals: &SignalSet) -> Result<CaseResults> {
        let phase_average = match &self.cfg.phase_average {
            Some(pa_cfg) => {
                Some(phase_average_signals(pa_cfg, signals).context("failed to phase average")?)
            }
            None => None,
        };

        let turbulence = match &self.cfg.turbulence {
            Some(turb_cfg) => Some(
                turbulence_statistics(turb_cfg, signals)
                    .context("failed to compute turbulence statistics")?,
            ),
            None => None,
        };

        Ok(CaseResults {
            phase_average,
            turbulence,
        })
    }

    pub fn analyze_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        signals_file: P,
        results_file: Q,
    ) -> Result<()> {
        let signals = Self::load_signals(signals_file)?;
        let results = self.analyze(&signals)?;
        save_results(&results, results_file)
    }
}

fn phase_average_signals(
    cfg: &PhaseAverageConfig,
    signals: &SignalSet,
) -> Result<PhaseAverageReport> {
    let names = cfg.signals.clone().unwrap_or_else(|| signals.names.clone());
    let mut y_arrs = Vec::with_capacity(names.len());
    for name in &names {
        let vals = signals
            .signal(name)
            .with_context(|| format!("signal {name:?} not found"))?;
        y_arrs.push(vals);
    }

    let cropped = crop_arrays(&signals.time, &y_arrs, cfg.t_limits())?;
    if cropped.len() < 2 {
        bail!("phase averaging window holds {} samples", cropped.len());
    }
    log::info!(
        "phase averaging {} signals over {} samples",
        names.len(),
        cropped.len()
    );

    let mut y_arrs = cropped.ys;
    if let Some(cutoff) = cfg.low_pass_cutoff {
        let sample_rate = 1.0 / (cropped.x[1] - cropped.x[0]);
        y_arrs = y_arrs
            .iter()
            .map(|y_arr| low_pass_filter(y_arr, cutoff, sample_rate))
            .collect();
    }

    let result = phase_average(&cropped.x, &y_arrs, cfg.frequency, &cfg.options)?;

    let peak_to_peak = y_arrs
        .iter()
        .map(|y_arr| peak_to_peak(&cropped.x, y_arr, cfg.frequency))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PhaseAverageReport {
        names,
        result,
        peak_to_peak,
    })
}

fn turbulence_statistics(
    cfg: &TurbulenceConfig,
    signals: &SignalSet,
) -> Result<TurbulenceResult> {
    let mut u_arr: [&[f64]; 3] = [&[]; 3];
    for (vel, name) in u_arr.iter_mut().zip(&cfg.components) {
        *vel = signals
            .signal(name)
            .with_context(|| format!("velocity component {name:?} not found"))?;
    }

    let result = calculate_turbulence_properties(&signals.time, &u_arr, cfg.t_limits())?;
    log::info!("turbulent kinetic energy {:.6e}", result.k);

    Ok(result)
}

pub fn save_results<P: AsRef<Path>>(results: &CaseResults, file: P) -> Result<()> {
    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file);

    encode::write(&mut writer, results).context("failed to serialize results")?;
    writer.flush().context("failed to flush writer stream")?;

    Ok(())
}

pub fn load_results<P: AsRef<Path>>(file: P) -> Result<CaseResults> {
    let file = file.as_ref();
    let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    let mut reader = BufReader::new(file);
    let results = decode::from_read(&mut reader).context("failed to deserialize results")?;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn rotor_signals() -> SignalSet {
        let time: Vec<f64> = (1..=2000).map(|i| i as f64 * 0.005).collect();
        let thrust = time.iter().map(|&t| 5.0 + (2.0 * PI * t).sin()).collect();
        let ux = time.iter().map(|&t| 8.0 + 0.3 * (2.0 * PI * 3.0 * t).sin()).collect();
        let uy = time.iter().map(|&t| 0.2 * (2.0 * PI * 1.3 * t).cos()).collect();
        let uz = time.iter().map(|&t| 0.1 * (2.0 * PI * 0.7 * t).sin()).collect();
        SignalSet::new(
            time,
            vec!["thrust".into(), "Ux".into(), "Uy".into(), "Uz".into()],
            vec![thrust, ux, uy, uz],
        )
        .unwrap()
    }

    fn config(toml_str: &str) -> Config {
        let cfg: Config = toml::from_str(toml_str).unwrap();
        cfg.validate().unwrap();
        cfg
    }

    #[test]
    fn runs_both_analyses() {
        let analyzer = Analyzer::new(config(
            r#"
[phase_average]
frequency = 1.0
number_of_bins = 20
signals = ["thrust"]
low_pass_cutoff = 10.0

[turbulence]
components = ["Ux", "Uy", "Uz"]
"#,
        ));
        let results = analyzer.analyze(&rotor_signals()).unwrap();

        let pa = results.phase_average.unwrap();
        assert_eq!(pa.names, vec!["thrust".to_string()]);
        assert!((pa.peak_to_peak[0] - 2.0).abs() < 1e-6);
        assert_eq!(pa.result.sample_count(0), 2000);

        let turb = results.turbulence.unwrap();
        assert!((turb.mean_velocity[0] - 8.0).abs() < 1e-3);
        assert!(turb.k > 0.0);
    }

    #[test]
    fn missing_signal_is_reported() {
        let analyzer = Analyzer::new(config(
            r#"
[turbulence]
components = ["Ux", "Uy", "W"]
"#,
        ));
        let err = analyzer.analyze(&rotor_signals()).unwrap_err();
        assert!(format!("{err:#}").contains("\"W\" not found"));
    }
}
