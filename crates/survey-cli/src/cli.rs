use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cmd::{
    self, check_config::CheckConfigArgs, kinds::KindsArgs, stats::StatsArgs, submit::SubmitArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "survey",
    about = "Inspect question kinds, submit responses and read survey statistics",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Engine settings (TOML). Built-in defaults apply when omitted.
    #[arg(long = "config", value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Log at debug level regardless of RUST_LOG
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the supported question kinds
    Kinds(KindsArgs),
    /// Validate a question configuration and print its normalized form
    CheckConfig(CheckConfigArgs),
    /// Validate and store a response in a snapshot file
    Submit(SubmitArgs),
    /// Print per-question statistics for a survey
    Stats(StatsArgs),
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    let config = cmd::load_engine_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Kinds(args) => cmd::kinds::run(args),
        Commands::CheckConfig(args) => cmd::check_config::run(args),
        Commands::Submit(args) => cmd::submit::run(args, config),
        Commands::Stats(args) => cmd::stats::run(args, config),
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // stdout carries command output, so logs go to stderr.
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("failed to install the tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_submit_with_global_flags() {
        let cli = Cli::try_parse_from([
            "survey",
            "submit",
            "--store",
            "store.json",
            "--survey",
            "s1",
            "--answers",
            "answers.json",
            "--respondent",
            "r-1",
            "--config",
            "engine.toml",
            "-v",
        ])
        .expect("expected CLI to parse");
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("engine.toml")));
        match cli.command {
            Commands::Submit(args) => {
                assert_eq!(args.survey, "s1");
                assert_eq!(args.store, PathBuf::from("store.json"));
                assert_eq!(args.respondent.as_deref(), Some("r-1"));
            }
            other => panic!("expected submit args, got {other:?}"),
        }
    }

    #[test]
    fn check_config_defaults_to_an_empty_object() {
        let cli = Cli::try_parse_from(["survey", "check-config", "--kind", "rating"])
            .expect("expected CLI to parse");
        match cli.command {
            Commands::CheckConfig(args) => {
                assert_eq!(args.kind, "rating");
                assert_eq!(args.config, "{}");
            }
            other => panic!("expected check-config args, got {other:?}"),
        }
    }

    #[test]
    fn stats_requires_a_survey() {
        assert!(Cli::try_parse_from(["survey", "stats", "--store", "store.json"]).is_err());
    }
}
