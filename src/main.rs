use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::GlobalArgs;

mod commands;
mod output;

use commands::{config, which};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the log filter, e.g. `JSMILL_LOG=debug`.
const LOG_ENV: &str = "JSMILL_LOG";

#[derive(Parser)]
#[command(name = "jsmill")]
#[command(version = VERSION)]
#[command(about = "Copy, lint and document JavaScript sources")]
struct Cli {
    /// Config file (defaults to ./jsmill.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Skip a stage (jslint, jshint, jsdoc); repeatable
    #[arg(long, global = true, value_name = "STAGE")]
    skip: Vec<String>,

    /// Enable a stage that is skipped by default; repeatable
    #[arg(long, global = true, value_name = "STAGE")]
    enable: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy main sources to the work directory and lint them
    Compile,
    /// Copy test sources to the test work directory and lint them
    TestCompile,
    /// Generate the JSDoc report from the packaged script
    Jsdoc,
    /// Resolve a tool on PATH the way the pipeline does
    Which(which::WhichArgs),
    /// Inspect the effective configuration
    Config(config::ConfigArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let global = GlobalArgs {
        config: cli.config,
        skip: cli.skip,
        enable: cli.enable,
    };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    if let Err(err) = output::print_json_result(json_result) {
        tracing::error!("{}", err);
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
