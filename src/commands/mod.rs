use std::path::PathBuf;

use jsmill::config::PipelineConfig;
use jsmill::processor::Stage;

pub type CmdResult<T> = jsmill::Result<(T, i32)>;

pub(crate) struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub skip: Vec<String>,
    pub enable: Vec<String>,
}

impl GlobalArgs {
    /// Load the pipeline configuration and apply `--skip` / `--enable` overrides.
    pub fn load_config(&self) -> jsmill::Result<PipelineConfig> {
        let cwd = current_dir()?;
        let mut config = PipelineConfig::discover(self.config.as_deref(), &cwd)?;
        apply_overrides(&mut config, &self.skip, &self.enable)?;
        Ok(config)
    }

    pub fn config_path(&self) -> jsmill::Result<Option<PathBuf>> {
        Ok(PipelineConfig::locate(self.config.as_deref(), &current_dir()?))
    }
}

fn current_dir() -> jsmill::Result<PathBuf> {
    std::env::current_dir().map_err(|e| {
        jsmill::Error::internal_io(e.to_string(), Some("read current directory".to_string()))
    })
}

/// `--enable` wins over `--skip` for the same stage.
pub(crate) fn apply_overrides(
    config: &mut PipelineConfig,
    skip: &[String],
    enable: &[String],
) -> jsmill::Result<()> {
    for name in skip {
        config.set_skip(name.parse::<Stage>()?, true)?;
    }
    for name in enable {
        config.set_skip(name.parse::<Stage>()?, false)?;
    }
    Ok(())
}

pub mod config;
pub mod goal;
pub mod which;

macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (jsmill::Result<serde_json::Value>, i32) {
    use jsmill::pipeline::Goal;

    match command {
        crate::Commands::Compile => dispatch!(Goal::CompileJavascript, global, goal),
        crate::Commands::TestCompile => dispatch!(Goal::TestCompileJavascript, global, goal),
        crate::Commands::Jsdoc => dispatch!(Goal::JsDoc, global, goal),
        crate::Commands::Which(args) => dispatch!(args, global, which),
        crate::Commands::Config(args) => dispatch!(args, global, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsmill::ErrorCode;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn enable_overrides_skip() {
        let mut config = PipelineConfig::default();
        apply_overrides(&mut config, &names(&["jsdoc"]), &names(&["jslint", "jsdoc"])).unwrap();
        assert!(config.is_enabled(Stage::JsLint));
        assert!(config.is_enabled(Stage::JsDoc));
        assert!(!config.is_enabled(Stage::JsHint));
    }

    #[test]
    fn unknown_stage_is_rejected() {
        let mut config = PipelineConfig::default();
        let err = apply_overrides(&mut config, &names(&["jscs"]), &[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationInvalidArgument);
    }
}
