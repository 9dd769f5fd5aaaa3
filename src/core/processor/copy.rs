//! Copies JavaScript sources into the work directory.

use serde_json::json;
use std::path::PathBuf;

use super::{Lifecycle, Processor, ProcessorState, Stage, StageOutcome};
use crate::config::PipelineConfig;
use crate::context::BuildContext;
use crate::error::{Error, Result};
use crate::utils::io;

struct CopySettings {
    source_root: PathBuf,
    work_root: PathBuf,
    test: bool,
}

pub struct CopyProcessor {
    lifecycle: Lifecycle,
    settings: Option<CopySettings>,
}

impl Default for CopyProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CopyProcessor {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::new(Stage::Copy),
            settings: None,
        }
    }
}

impl Processor for CopyProcessor {
    fn stage(&self) -> Stage {
        Stage::Copy
    }

    fn state(&self) -> ProcessorState {
        self.lifecycle.state()
    }

    fn configure(&mut self, context: &BuildContext, _config: &PipelineConfig) -> Result<()> {
        let settings = self.lifecycle.configure(Ok(CopySettings {
            source_root: context.source_root().to_path_buf(),
            work_root: context.work_root().to_path_buf(),
            test: context.is_test(),
        }))?;
        self.settings = Some(settings);
        Ok(())
    }

    fn process_all(&mut self) -> Result<StageOutcome> {
        self.lifecycle.run(self.settings.as_ref(), copy_sources)
    }
}

fn copy_sources(settings: &CopySettings) -> Result<StageOutcome> {
    let kind = if settings.test { "test" } else { "main" };

    if !settings.source_root.is_dir() {
        tracing::info!(
            source = %settings.source_root.display(),
            "The javascript {} directory does not exist, nothing to copy",
            kind
        );
        return Ok(StageOutcome::completed(
            format!("No {} JavaScript sources", kind),
            json!({ "copied": 0 }),
        ));
    }

    let wrap = |e| Error::processor_failed(Stage::Copy.as_str(), "Cannot copy JavaScript files", e);
    if settings.source_root.starts_with(&settings.work_root) {
        return Err(wrap(Error::config_invalid_value(
            if settings.test { "project.test_work_dir" } else { "project.work_dir" },
            Some(settings.work_root.display().to_string()),
            "must not contain the JavaScript source directory",
        )));
    }

    // The work root mirrors the sources exactly; files deleted upstream must not linger.
    io::remove_dir(&settings.work_root, "clean javascript work directory").map_err(wrap)?;
    let files = io::find_files(&settings.source_root, "js").map_err(wrap)?;

    for file in &files {
        let relative = file
            .strip_prefix(&settings.source_root)
            .map_err(|e| wrap(Error::internal_unexpected(e.to_string())))?;
        io::copy_file(file, &settings.work_root.join(relative), "copy javascript").map_err(wrap)?;
    }

    tracing::info!(
        count = files.len(),
        destination = %settings.work_root.display(),
        "Copied {} JavaScript sources",
        kind
    );

    Ok(StageOutcome::completed(
        format!("Copied {} {} JavaScript file(s)", files.len(), kind),
        json!({
            "copied": files.len(),
            "destination": settings.work_root.display().to_string(),
        }),
    ))
}
