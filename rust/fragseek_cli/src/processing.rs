use crate::config::RunConfig;
use crate::errors::{
    CliError,
    Result,
};
use fragseek::data_sources::{
    read_fasta,
    read_spectra,
};
use fragseek::scoring::SearchTimings;
use fragseek::{
    SearchEngine,
    Spectrum,
};
use indicatif::{
    ProgressIterator,
    ProgressStyle,
};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{
    debug,
    info,
};

#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub n_proteins: usize,
    pub n_peptides: usize,
    pub n_fragments: usize,
    pub n_spectra: usize,
    pub n_failed: usize,
    pub n_matches: usize,
    pub n_decoy_matches: usize,
    pub timings: SearchTimings,
}

pub fn main_loop(
    spectra: &[Spectrum],
    engine: &SearchEngine,
    chunk_size: usize,
    out_dir: &Path,
    summary: &mut RunSummary,
) -> Result<()> {
    let out_path = out_dir.join("results.tsv");
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(&out_path)?;
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
    )
    .map_err(|e| CliError::Config {
        reason: e.to_string(),
    })?;

    for chunk in spectra.chunks(chunk_size).progress_with_style(style) {
        // Parallelism happens inside the engine
        let outcome = engine.search(chunk)?;
        summary.n_spectra += outcome.n_searched;
        summary.n_failed += outcome.n_failed;
        summary.timings += outcome.timings;
        if let Some(best) = outcome
            .matches
            .iter()
            .max_by(|a, b| a.hyperscore.total_cmp(&b.hyperscore))
        {
            debug!("Best match in chunk: {:#?}", best);
        }
        for psm in outcome.matches.iter() {
            summary.n_matches += 1;
            summary.n_decoy_matches += psm.is_decoy as usize;
            writer.serialize(psm)?;
        }
    }
    writer.flush().map_err(|e| CliError::Io {
        msg: e.to_string(),
        path: Some(out_path.to_string_lossy().to_string()),
    })?;
    info!("Wrote {} matches to {}", summary.n_matches, out_path.display());
    Ok(())
}

pub fn run(config: &RunConfig) -> Result<RunSummary> {
    let start = Instant::now();
    let mut summary = RunSummary::default();

    let proteins = read_fasta(&config.fasta)?;
    summary.n_proteins = proteins.len();
    let spectra = read_spectra(&config.spectra)?;

    let mut engine = SearchEngine::new(config.analysis.search.clone())?;
    engine.build(proteins)?;
    let index = engine.index()?;
    summary.n_peptides = index.catalog().len();
    summary.n_fragments = index.len();
    info!(
        "Database ready: {} peptides, {} fragments, took {:?}",
        summary.n_peptides,
        summary.n_fragments,
        start.elapsed()
    );

    main_loop(
        &spectra,
        &engine,
        config.analysis.chunk_size,
        &config.output.directory,
        &mut summary,
    )?;

    let summary_path = config.output.directory.join("summary.json");
    let file = std::fs::File::create(&summary_path).map_err(|e| CliError::Io {
        msg: e.to_string(),
        path: Some(summary_path.to_string_lossy().to_string()),
    })?;
    serde_json::to_writer_pretty(file, &summary).map_err(|e| CliError::Io {
        msg: e.to_string(),
        path: Some(summary_path.to_string_lossy().to_string()),
    })?;
    info!(
        "Searched {} spectra ({} failed) in {:?}",
        summary.n_spectra,
        summary.n_failed,
        start.elapsed()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AnalysisConfig,
        OutputConfig,
    };
    use fragseek::SearchConfig;

    #[test]
    fn test_run_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = dir.path().join("db.fasta");
        std::fs::write(&fasta, ">P1\nAAASPPLLRCLVLTGFGGYD\n>P2\nEAHKSEIAHRFKDLGEEHFK\n").unwrap();
        let spectra = dir.path().join("run.json");
        std::fs::write(
            &spectra,
            r#"[{"id": "noise", "precursor_mz": 448.27, "precursor_charge": 2,
                 "mz": [200.0, 300.0, 400.0], "intensity": [1.0, 2.0, 3.0]}]"#,
        )
        .unwrap();
        let config = RunConfig {
            fasta,
            spectra,
            output: OutputConfig {
                directory: dir.path().to_path_buf(),
            },
            analysis: AnalysisConfig {
                chunk_size: 10,
                search: SearchConfig {
                    fixed_modifications: vec![],
                    variable_modifications: vec![],
                    max_variable_mods: 0,
                    ..Default::default()
                },
            },
        };
        let summary = run(&config).unwrap();
        assert_eq!(summary.n_proteins, 2);
        assert!(summary.n_peptides > 0);
        assert_eq!(summary.n_spectra, 1);
        assert_eq!(summary.n_failed, 0);
        assert!(dir.path().join("results.tsv").exists());
        assert!(dir.path().join("summary.json").exists());
    }

    #[test]
    fn test_missing_fasta() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig {
            fasta: dir.path().join("missing.fasta"),
            spectra: dir.path().join("missing.json"),
            output: OutputConfig {
                directory: dir.path().to_path_buf(),
            },
            analysis: AnalysisConfig::default(),
        };
        assert!(matches!(run(&config), Err(CliError::Search(_))));
    }
}
