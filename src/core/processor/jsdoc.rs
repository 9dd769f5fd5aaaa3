//! API documentation report produced by an external `jsdoc` executable.

use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};

use super::{Lifecycle, Processor, ProcessorState, Stage, StageOutcome};
use crate::command::{self, CommandSpec};
use crate::config::PipelineConfig;
use crate::context::BuildContext;
use crate::error::{Error, Result};
use crate::utils::io;

/// Directory under the reporting root that receives the generated site.
pub const REPORT_DIR: &str = "jsdoc";

/// How the report shows up in a project site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDescriptor {
    pub name: String,
    pub description: String,
    pub output_name: String,
    pub external: bool,
    pub output_dir: PathBuf,
}

impl ReportDescriptor {
    pub fn for_reporting_dir(reporting_dir: &Path) -> Self {
        Self {
            name: "jsdoc".to_string(),
            description: "Generate JSDoc report".to_string(),
            output_name: format!("{}/index", REPORT_DIR),
            external: true,
            output_dir: reporting_dir.join(REPORT_DIR),
        }
    }
}

struct JsDocSettings {
    base_dir: PathBuf,
    artifact: PathBuf,
    executable: String,
    include_private: bool,
    descriptor: ReportDescriptor,
    locator: crate::executable::ExecutableLocator,
}

pub struct JsDocProcessor {
    lifecycle: Lifecycle,
    settings: Option<JsDocSettings>,
}

impl Default for JsDocProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl JsDocProcessor {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::new(Stage::JsDoc),
            settings: None,
        }
    }

    /// Report metadata, available once configured.
    pub fn descriptor(&self) -> Option<&ReportDescriptor> {
        self.settings.as_ref().map(|s| &s.descriptor)
    }
}

impl Processor for JsDocProcessor {
    fn stage(&self) -> Stage {
        Stage::JsDoc
    }

    fn state(&self) -> ProcessorState {
        self.lifecycle.state()
    }

    fn configure(&mut self, context: &BuildContext, config: &PipelineConfig) -> Result<()> {
        let settings = self.lifecycle.configure(Ok(JsDocSettings {
            base_dir: context.base_dir.clone(),
            artifact: context.artifact_path(),
            executable: config.jsdoc.executable.clone(),
            include_private: config.jsdoc.include_private,
            descriptor: ReportDescriptor::for_reporting_dir(&context.reporting_dir),
            locator: context.locator.clone(),
        }))?;
        self.settings = Some(settings);
        Ok(())
    }

    fn process_all(&mut self) -> Result<StageOutcome> {
        self.lifecycle.run(self.settings.as_ref(), generate)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("resolve {}", path.display()))))
}

fn generate(settings: &JsDocSettings) -> Result<StageOutcome> {
    let stage = Stage::JsDoc.as_str();

    if !settings.artifact.is_file() {
        return Err(Error::processor_failed(
            stage,
            "Cannot find the project's artifact",
            Error::precondition_missing_artifact(settings.artifact.display().to_string()),
        ));
    }

    let Some(exe) = settings.locator.resolve(&settings.executable) else {
        tracing::error!(
            "Cannot build jsdoc report - {} not in the system path, the report is ignored.",
            settings.executable
        );
        return Ok(StageOutcome::skipped(format!(
            "{} not found in the system path",
            settings.executable
        )));
    };

    let wrap = |e| Error::processor_failed(stage, "Error during jsdoc report generation", e);
    let output_dir = absolute(&settings.descriptor.output_dir).map_err(wrap)?;
    let artifact = absolute(&settings.artifact).map_err(wrap)?;
    io::ensure_dir(&output_dir, "create jsdoc report directory").map_err(wrap)?;

    let mut spec = CommandSpec::new(&exe, &settings.base_dir)
        .arg("--destination")
        .arg(output_dir.display().to_string());
    if settings.include_private {
        spec = spec.arg("--private");
    }
    let spec = spec.arg(artifact.display().to_string());

    tracing::info!(executable = %exe, destination = %output_dir.display(), "Generating JSDoc report");

    match command::invoke(&spec) {
        Ok(_) => Ok(StageOutcome::completed(
            format!("JSDoc report written to {}", output_dir.display()),
            json!({ "report": settings.descriptor }),
        )),
        Err(err) => {
            let text = command::diagnostics(&err);
            if !text.is_empty() {
                tracing::error!("{}", text);
            }
            Err(wrap(err))
        }
    }
}
