use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;
use crate::executable::ExecutableLocator;

/// Whether a goal works on production or test sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    Main,
    Test,
}

/// Everything a processor needs to know about the goal it runs in.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub base_dir: PathBuf,
    pub source_dir: PathBuf,
    pub test_source_dir: PathBuf,
    pub work_dir: PathBuf,
    pub test_work_dir: PathBuf,
    pub build_dir: PathBuf,
    pub final_name: String,
    pub reporting_dir: PathBuf,
    pub mode: BuildMode,
    pub locator: ExecutableLocator,
}

impl BuildContext {
    pub fn from_project(project: &ProjectConfig, mode: BuildMode) -> Self {
        Self {
            base_dir: project.base_dir.clone(),
            source_dir: project.source_dir.clone(),
            test_source_dir: project.test_source_dir.clone(),
            work_dir: project.work_dir.clone(),
            test_work_dir: project.test_work_dir.clone(),
            build_dir: project.build_dir.clone(),
            final_name: project.final_name.clone(),
            reporting_dir: project.reporting_dir.clone(),
            mode,
            locator: ExecutableLocator::from_env(),
        }
    }

    pub fn with_mode(&self, mode: BuildMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    pub fn with_locator(mut self, locator: ExecutableLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn is_test(&self) -> bool {
        self.mode == BuildMode::Test
    }

    /// Source root for the current mode.
    pub fn source_root(&self) -> &Path {
        match self.mode {
            BuildMode::Main => &self.source_dir,
            BuildMode::Test => &self.test_source_dir,
        }
    }

    /// Work root for the current mode.
    pub fn work_root(&self) -> &Path {
        match self.mode {
            BuildMode::Main => &self.work_dir,
            BuildMode::Test => &self.test_work_dir,
        }
    }

    /// The packaged script the documentation generator reads.
    pub fn artifact_path(&self) -> PathBuf {
        self.build_dir.join(format!("{}.js", self.final_name))
    }
}
