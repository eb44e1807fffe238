use fragseek::SearchConfig;
use serde::{
    Deserialize,
    Serialize,
};
use std::path::{
    Path,
    PathBuf,
};

use crate::cli::Cli;
use crate::errors::{
    CliError,
    Result,
};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct InputConfig {
    pub fasta: Option<PathBuf>,
    pub spectra: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Spectra searched per progress step.
    pub chunk_size: usize,
    #[serde(flatten)]
    pub search: SearchConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            search: SearchConfig::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

/// Fully resolved run settings, every path present.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub fasta: PathBuf,
    pub spectra: PathBuf,
    pub output: OutputConfig,
    pub analysis: AnalysisConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| CliError::Io {
            msg: e.to_string(),
            path: Some(path.to_string_lossy().to_string()),
        })?;
        serde_json::from_reader(file).map_err(|e| CliError::ParseError { msg: e.to_string() })
    }

    /// Command line values take precedence over the file.
    pub fn with_cli_args(mut self, args: Cli) -> Result<RunConfig> {
        if let Some(fasta) = args.fasta {
            self.input.fasta = Some(fasta);
        }
        if let Some(spectra) = args.spectra {
            self.input.spectra = Some(spectra);
        }
        if let Some(directory) = args.output_dir {
            self.output = Some(OutputConfig { directory });
        }
        if args.decoys {
            self.analysis.search.digestion.build_decoys = true;
        }
        if self.analysis.chunk_size == 0 {
            return Err(CliError::Config {
                reason: "chunk_size must be positive".to_string(),
            });
        }

        let missing = |what: &str, flag: &str| CliError::Config {
            reason: format!(
                "No {what} provided, please provide one in either the config file or with the {flag} flag"
            ),
        };
        Ok(RunConfig {
            fasta: self.input.fasta.ok_or_else(|| missing("fasta file", "--fasta"))?,
            spectra: self
                .input
                .spectra
                .ok_or_else(|| missing("spectra file", "--spectra"))?,
            output: self
                .output
                .ok_or_else(|| missing("output directory", "--output-dir"))?,
            analysis: self.analysis,
        })
    }
}
