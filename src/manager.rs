use crate::analysis::Analyzer;
use crate::config::Config;
use anyhow::{Context, Result};
use glob::glob;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Analyses the signal files of a case directory.
///
/// The directory holds a `config.toml` and any number of
/// `signals-*.msgpack` files; each of them yields a `results-*.msgpack` file.
pub struct Manager {
    case_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(case_dir: P) -> Result<Self> {
        let case_dir = case_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(case_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { case_dir, cfg })
    }

    pub fn analyze_case(&self) -> Result<()> {
        let signal_files = self
            .case_files("signals-*.msgpack")
            .context("failed to list signal files")?;
        if signal_files.is_empty() {
            log::warn!("no signal files found in {:?}", self.case_dir);
        }

        let analyzer = Analyzer::new(self.cfg.clone());
        for signals_file in signal_files {
            let results_file = results_file(&signals_file)?;
            analyzer
                .analyze_file(&signals_file, &results_file)
                .with_context(|| format!("failed to analyze {signals_file:?}"))?;
            log::info!("wrote {results_file:?}");
        }

        Ok(())
    }

    pub fn clean_case(&self) -> Result<()> {
        let results_files = self
            .case_files("results-*.msgpack")
            .context("failed to list results files")?;
        for file in results_files {
            fs::remove_file(&file).with_context(|| format!("failed to remove {file:?}"))?;
            log::info!("removed {file:?}");
        }
        Ok(())
    }

    fn case_files(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let pattern = self.case_dir.join(pattern);
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let mut files: Vec<_> = glob(pattern)
            .context("failed to glob case files")?
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .collect();
        files.sort();
        Ok(files)
    }
}

fn results_file(signals_file: &Path) -> Result<PathBuf> {
    let name = signals_file
        .file_name()
        .and_then(|name| name.to_str())
        .context("signal file name is not valid UTF-8")?;
    let name = name.replacen("signals-", "results-", 1);
    Ok(signals_file.with_file_name(name))
}
