use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use log::{LevelFilter, error, info};
use ngbundle::{
    config::{Config, ConfigOverrides},
    minify::OxcMinifier,
    orchestrator, validate,
};

#[derive(Parser, Debug)]
#[command(name = "ngbundle", version, about = "Assemble, version-stamp and minify release bundles")]
struct Cli {
    /// Project config file (defaults to ./ngbundle.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build every configured module and run the projections
    Build {
        /// Output directory
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Version string to stamp into placeholders
        #[arg(long)]
        ng_version: Option<String>,

        /// Release code name
        #[arg(long)]
        code_name: Option<String>,

        /// Build modules one after another instead of concurrently
        #[arg(long)]
        sequential: bool,
    },
    /// Check that the manifest and the source tree agree
    Validate,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Build {
            out_dir,
            ng_version,
            code_name,
            sequential,
        } => {
            let out_dir = match out_dir {
                Some(dir) if dir.is_relative() => Some(
                    std::env::current_dir()
                        .context("Failed to read the working directory")?
                        .join(dir),
                ),
                other => other,
            };
            config.apply_overrides(ConfigOverrides {
                out_dir,
                version: ng_version,
                code_name,
                sequential,
            });

            let report = orchestrator::build(&config, &OxcMinifier)?;
            for module in &report.modules {
                info!("  {} -> {}", module.name, module.full_path.display());
            }
            Ok(())
        }
        Command::Validate => {
            let report = validate::validate(&config)?;
            if !report.is_ok() {
                bail!(
                    "Not all files were properly detected in the local file structure ({} problems)",
                    report.problems.len()
                );
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
