use clap::Args;
use serde::Serialize;

use jsmill::executable::{self, ExecutableLocator};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct WhichArgs {
    /// Tool name to look up on PATH (e.g. jsdoc)
    pub tool: String,
}

#[derive(Debug, Serialize)]
pub struct WhichOutput {
    pub tool: String,
    pub path: String,
    pub candidates: Vec<String>,
}

pub fn run(args: WhichArgs, _global: &GlobalArgs) -> CmdResult<WhichOutput> {
    let candidates = executable::candidates(&args.tool);
    let resolved = ExecutableLocator::from_env()
        .resolve(&args.tool)
        .ok_or_else(|| jsmill::Error::executable_not_found(&args.tool, candidates.clone()))?;

    Ok((
        WhichOutput {
            tool: args.tool,
            path: resolved.path().display().to_string(),
            candidates,
        },
        0,
    ))
}
