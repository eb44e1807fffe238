mod cli;
mod config;
mod errors;
mod processing;

use clap::Parser;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::Config;

#[cfg(target_os = "windows")]
use mimalloc::MiMalloc;

#[cfg(target_os = "windows")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> std::result::Result<(), errors::CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        ) // RUST_LOG overrides the default
        .init();

    let args = Cli::parse();
    let config = Config::from_file(&args.config)?;
    let run_config = config.with_cli_args(args)?;
    info!("Parsed configuration: {:#?}", run_config);

    std::fs::create_dir_all(&run_config.output.directory).map_err(|e| errors::CliError::Io {
        msg: e.to_string(),
        path: Some(run_config.output.directory.to_string_lossy().to_string()),
    })?;

    let summary = processing::run(&run_config)?;
    println!(
        "Searched {} spectra, {} failed, wrote {} matches",
        summary.n_spectra, summary.n_failed, summary.n_matches
    );
    Ok(())
}
