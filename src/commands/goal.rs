use jsmill::context::BuildContext;
use jsmill::pipeline::{self, Goal, GoalRunResult};

use super::{CmdResult, GlobalArgs};

pub fn run(goal: Goal, global: &GlobalArgs) -> CmdResult<GoalRunResult> {
    let config = global.load_config()?;
    let context = BuildContext::from_project(&config.project, goal.mode());
    let result = pipeline::run(goal, &config, &context)?;
    Ok((result, 0))
}
