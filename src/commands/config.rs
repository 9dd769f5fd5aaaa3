use clap::{Args, Subcommand};
use serde::Serialize;

use jsmill::config::PipelineConfig;
use jsmill::processor::Stage;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Display the effective configuration (file + defaults + --skip/--enable)
    Show,
    /// Show which config file would be loaded
    Path,
}

#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<PipelineConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enabled_stages: Option<Vec<Stage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    jshint_options: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    exists: bool,
}

pub fn run(args: ConfigArgs, global: &GlobalArgs) -> CmdResult<ConfigOutput> {
    match args.command {
        ConfigCommand::Show => show(global),
        ConfigCommand::Path => path(global),
    }
}

fn show(global: &GlobalArgs) -> CmdResult<ConfigOutput> {
    let path = global.config_path()?;
    let config = global.load_config()?;
    let enabled_stages = Stage::ALL
        .into_iter()
        .filter(|stage| config.is_enabled(*stage))
        .collect();

    Ok((
        ConfigOutput {
            command: "config.show".to_string(),
            jshint_options: Some(config.jshint.options.format()),
            enabled_stages: Some(enabled_stages),
            config: Some(config),
            exists: path.is_some(),
            path: path.map(|p| p.display().to_string()),
        },
        0,
    ))
}

fn path(global: &GlobalArgs) -> CmdResult<ConfigOutput> {
    let path = global.config_path()?;
    Ok((
        ConfigOutput {
            command: "config.path".to_string(),
            config: None,
            enabled_stages: None,
            jshint_options: None,
            exists: path.as_ref().is_some_and(|p| p.is_file()),
            path: path.map(|p| p.display().to_string()),
        },
        0,
    ))
}
