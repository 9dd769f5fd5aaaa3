//! Lints the work directory with an external `jslint` executable.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::{Lifecycle, Processor, ProcessorState, Stage, StageOutcome};
use crate::command::{self, CommandSpec};
use crate::config::PipelineConfig;
use crate::context::BuildContext;
use crate::error::{Error, Result};
use crate::executable::{self, ExecutableLocator};
use crate::utils::io;

struct JsLintSettings {
    work_root: PathBuf,
    base_dir: PathBuf,
    executable: String,
    required: bool,
    flags: Vec<String>,
    locator: ExecutableLocator,
}

pub struct JsLintProcessor {
    lifecycle: Lifecycle,
    settings: Option<JsLintSettings>,
}

impl Default for JsLintProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl JsLintProcessor {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::new(Stage::JsLint),
            settings: None,
        }
    }
}

impl Processor for JsLintProcessor {
    fn stage(&self) -> Stage {
        Stage::JsLint
    }

    fn state(&self) -> ProcessorState {
        self.lifecycle.state()
    }

    fn configure(&mut self, context: &BuildContext, config: &PipelineConfig) -> Result<()> {
        let settings = format_flags(&config.jslint.flags)
            .map(|flags| JsLintSettings {
                work_root: context.work_root().to_path_buf(),
                base_dir: context.base_dir.clone(),
                executable: config.jslint.executable.clone(),
                required: config.jslint.required,
                flags,
                locator: context.locator.clone(),
            })
            .map_err(|e| {
                Error::processor_failed(Stage::JsLint.as_str(), "Invalid jslint configuration", e)
            });
        self.settings = Some(self.lifecycle.configure(settings)?);
        Ok(())
    }

    fn process_all(&mut self) -> Result<StageOutcome> {
        self.lifecycle.run(self.settings.as_ref(), lint)
    }
}

/// Serialize tool options into command-line flags, in key order.
///
/// `true` becomes `--name`, `false` and `null` are dropped, scalars become
/// `--name value` and arrays repeat the flag once per element.
pub fn format_flags(options: &BTreeMap<String, Value>) -> Result<Vec<String>> {
    let mut flags = Vec::new();
    for (name, value) in options {
        let flag = format!("--{}", name);
        match value {
            Value::Bool(true) => flags.push(flag),
            Value::Bool(false) | Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    flags.push(flag.clone());
                    flags.push(scalar(name, item)?);
                }
            }
            other => {
                flags.push(flag);
                flags.push(scalar(name, other)?);
            }
        }
    }
    Ok(flags)
}

fn scalar(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(Error::config_invalid_value(
            format!("jslint.flags.{}", name),
            Some(value.to_string()),
            "expected a string, number, boolean or a list of those",
        )),
    }
}

fn lint(settings: &JsLintSettings) -> Result<StageOutcome> {
    let stage = Stage::JsLint.as_str();

    let files = io::find_files(&settings.work_root, "js")
        .map_err(|e| Error::processor_failed(stage, "Cannot collect JavaScript sources", e))?;
    if files.is_empty() {
        tracing::info!(
            work = %settings.work_root.display(),
            "No JavaScript sources to check with JSLint"
        );
        return Ok(StageOutcome::completed(
            "No JavaScript sources to check",
            json!({ "files": 0 }),
        ));
    }

    let Some(exe) = settings.locator.resolve(&settings.executable) else {
        let err = Error::executable_not_found(
            &settings.executable,
            executable::candidates(&settings.executable),
        );
        if settings.required {
            return Err(Error::processor_failed(
                stage,
                "JSLint is required but not available",
                err,
            ));
        }
        tracing::warn!(
            "Cannot check sources with JSLint - {} not in the system path, the check is skipped",
            settings.executable
        );
        return Ok(StageOutcome::skipped(format!(
            "{} not found in the system path",
            settings.executable
        )));
    };

    tracing::info!(executable = %exe, files = files.len(), "Checking sources with JSLint");

    let spec = CommandSpec::new(&exe, &settings.base_dir)
        .args(settings.flags.iter().cloned())
        .args(files.iter().map(|f| f.display().to_string()));

    match command::invoke(&spec) {
        Ok(result) => Ok(StageOutcome::completed(
            format!("JSLint checked {} file(s)", files.len()),
            json!({ "files": files.len(), "exitCode": result.exit_code }),
        )),
        Err(err) => {
            let text = command::diagnostics(&err);
            if !text.is_empty() {
                tracing::error!("{}", text);
            }
            Err(Error::processor_failed(stage, "JSLint reported errors", err))
        }
    }
}
