use std::{env, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use log::{LevelFilter, error};

use extract_typings::{
    ExtractOptions,
    config::{Config, ConfigOverrides},
    extract_in,
};

#[derive(Parser, Debug)]
#[command(
    name = "extract-typings",
    author,
    version,
    about = "Flatten a TypeScript project's declarations into a self-contained directory"
)]
struct Cli {
    /// Entry source file
    #[arg(value_name = "ENTRY")]
    entry_positional: Option<PathBuf>,

    /// Entry source file
    #[arg(short, long, conflicts_with = "entry_positional")]
    entry: Option<PathBuf>,

    /// Output directory [default: ./dist/typings]
    #[arg(short, long)]
    outdir: Option<PathBuf>,

    /// Output name of the entry declaration file [default: index]
    #[arg(short, long)]
    file_name: Option<String>,

    /// Delete the output directory before writing
    #[arg(short = 'c', long = "clean", action = ArgAction::SetTrue)]
    clean: bool,

    /// tsconfig.json file or directory to load
    #[arg(short, long)]
    project: Option<PathBuf>,

    /// Tool configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            entry: self.entry.clone().or_else(|| self.entry_positional.clone()),
            outdir: self.outdir.clone(),
            file_name: self.file_name.clone(),
            clean: self.clean.then_some(true),
            project: self.project.clone(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over -v/-q
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .format_target(false)
        .parse_default_env()
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<bool> {
    let cwd = env::current_dir().context("Failed to determine the current directory")?;
    let mut config = Config::load(&cwd, cli.config.as_deref())?;
    config.apply(cli.overrides());

    let Some(entry) = config.entry else {
        bail!("No entry file given; pass --entry <ENTRY> or set `entry` in extract-typings.toml");
    };
    let options = ExtractOptions {
        entry,
        outdir: config.outdir,
        file_name: config.file_name,
        auto_clean: config.clean,
        project: config.project,
        root: cwd.clone(),
    };

    let report = extract_in(&options, &cwd)?;
    Ok(report.is_success())
}
