//! Pipeline configuration: project layout plus one typed section per stage.
//!
//! Loaded from `jsmill.toml` or `jsmill.json`. Every field has a default, so an
//! empty file (or no file at all) is a valid configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::processor::jshint::JsHintOptions;
use crate::processor::Stage;
use crate::utils::io;

pub const DEFAULT_CONFIG_FILE: &str = "jsmill.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub jslint: JsLintConfig,

    #[serde(default)]
    pub jshint: JsHintConfig,

    #[serde(default)]
    pub jsdoc: JsDocConfig,
}

/// Filesystem layout of the project being built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    #[serde(default = "default_test_source_dir")]
    pub test_source_dir: PathBuf,

    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    #[serde(default = "default_test_work_dir")]
    pub test_work_dir: PathBuf,

    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,

    #[serde(default = "default_final_name")]
    pub final_name: String,

    #[serde(default = "default_reporting_dir")]
    pub reporting_dir: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            source_dir: default_source_dir(),
            test_source_dir: default_test_source_dir(),
            work_dir: default_work_dir(),
            test_work_dir: default_test_work_dir(),
            build_dir: default_build_dir(),
            final_name: default_final_name(),
            reporting_dir: default_reporting_dir(),
        }
    }
}

/// External linter. `flags` is passed through to the tool as command-line flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JsLintConfig {
    #[serde(default = "default_true")]
    pub skip: bool,

    /// Fail the stage instead of skipping it when the executable is missing.
    #[serde(default)]
    pub required: bool,

    #[serde(default = "default_jslint_executable")]
    pub executable: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: BTreeMap<String, serde_json::Value>,
}

impl Default for JsLintConfig {
    fn default() -> Self {
        Self {
            skip: true,
            required: false,
            executable: default_jslint_executable(),
            flags: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JsHintConfig {
    #[serde(default = "default_true")]
    pub skip: bool,

    #[serde(default)]
    pub options: JsHintOptions,
}

impl Default for JsHintConfig {
    fn default() -> Self {
        Self {
            skip: true,
            options: JsHintOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JsDocConfig {
    #[serde(default)]
    pub skip: bool,

    /// Document symbols tagged `@private`.
    #[serde(default)]
    pub include_private: bool,

    #[serde(default = "default_jsdoc_executable")]
    pub executable: String,
}

impl Default for JsDocConfig {
    fn default() -> Self {
        Self {
            skip: false,
            include_private: false,
            executable: default_jsdoc_executable(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("src/main/js")
}

fn default_test_source_dir() -> PathBuf {
    PathBuf::from("src/test/js")
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("target/web")
}

fn default_test_work_dir() -> PathBuf {
    PathBuf::from("target/web-test")
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("target")
}

fn default_final_name() -> String {
    "app".to_string()
}

fn default_reporting_dir() -> PathBuf {
    PathBuf::from("target/site")
}

fn default_jslint_executable() -> String {
    "jslint".to_string()
}

fn default_jsdoc_executable() -> String {
    "jsdoc".to_string()
}

// =============================================================================
// Loading
// =============================================================================

impl PipelineConfig {
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config_invalid_toml(origin, e.to_string()))
    }

    pub fn from_json_str(content: &str, origin: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::config_invalid_json(origin, e.to_string()))
    }

    /// Load a config file. Relative project paths resolve against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = io::read_file(path, "read config")?;
        let origin = path.display().to_string();

        let mut config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content, &origin)?,
            _ => Self::from_toml_str(&content, &origin)?,
        };

        let root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        config.project.resolve_paths(root)?;
        Ok(config)
    }

    /// The file `discover` would load: `explicit`, else `jsmill.toml` in `cwd` if present.
    pub fn locate(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        let candidate = cwd.join(DEFAULT_CONFIG_FILE);
        candidate.is_file().then_some(candidate)
    }

    /// Load `explicit` if given, else `jsmill.toml` in `cwd` if present, else defaults.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = Self::locate(explicit, cwd) {
            return Self::load(&path);
        }

        let mut config = Self::default();
        config.project.resolve_paths(cwd)?;
        Ok(config)
    }

    pub fn is_enabled(&self, stage: Stage) -> bool {
        match stage {
            Stage::Copy => true,
            Stage::JsLint => !self.jslint.skip,
            Stage::JsHint => !self.jshint.skip,
            Stage::JsDoc => !self.jsdoc.skip,
        }
    }

    /// Override a stage's skip flag. `copy` is a prerequisite and cannot be skipped.
    pub fn set_skip(&mut self, stage: Stage, skip: bool) -> Result<()> {
        match stage {
            Stage::Copy if skip => {
                return Err(Error::validation_invalid_argument(
                    "skip",
                    "The copy stage cannot be skipped",
                    Some(stage.to_string()),
                    None,
                ))
            }
            Stage::Copy => {}
            Stage::JsLint => self.jslint.skip = skip,
            Stage::JsHint => self.jshint.skip = skip,
            Stage::JsDoc => self.jsdoc.skip = skip,
        }
        Ok(())
    }
}

impl ProjectConfig {
    /// Expand `~`/`$VAR` and anchor relative paths at `root`.
    pub fn resolve_paths(&mut self, root: &Path) -> Result<()> {
        for (key, path) in [
            ("project.base_dir", &mut self.base_dir),
            ("project.source_dir", &mut self.source_dir),
            ("project.test_source_dir", &mut self.test_source_dir),
            ("project.work_dir", &mut self.work_dir),
            ("project.test_work_dir", &mut self.test_work_dir),
            ("project.build_dir", &mut self.build_dir),
            ("project.reporting_dir", &mut self.reporting_dir),
        ] {
            *path = resolve_path(key, path, root)?;
        }
        Ok(())
    }
}

fn resolve_path(key: &str, path: &Path, root: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw).map_err(|e| {
        Error::config_invalid_value(key, Some(raw.to_string()), e.to_string())
    })?;
    let expanded = PathBuf::from(expanded.as_ref());

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(root.join(expanded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn empty_config_uses_defaults() {
        let config = PipelineConfig::from_toml_str("", "inline").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert!(config.is_enabled(Stage::Copy));
        assert!(!config.is_enabled(Stage::JsLint));
        assert!(!config.is_enabled(Stage::JsHint));
        assert!(config.is_enabled(Stage::JsDoc));
    }

    #[test]
    fn toml_sections_map_to_stages() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [project]
            final_name = "widgets-1.0"

            [jslint]
            skip = false
            required = true
            [jslint.flags]
            maxlen = 100
            browser = true

            [jshint]
            skip = false
            [jshint.options]
            eqeqeq = true

            [jsdoc]
            include_private = true
            "#,
            "inline",
        )
        .unwrap();

        assert_eq!(config.project.final_name, "widgets-1.0");
        assert!(config.jslint.required);
        assert_eq!(config.jslint.flags["maxlen"], 100);
        assert!(config.jshint.options.eqeqeq);
        assert!(config.jsdoc.include_private);
        assert!(config.is_enabled(Stage::JsLint));
        assert!(config.is_enabled(Stage::JsHint));
    }

    #[test]
    fn invalid_toml_reports_origin() {
        let err = PipelineConfig::from_toml_str("[jslint\nskip = ", "jsmill.toml").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidToml);
        assert_eq!(err.details["path"], "jsmill.toml");
    }

    #[test]
    fn unknown_sections_and_keys_are_rejected() {
        let err = PipelineConfig::from_toml_str("[copy]\nskip = true\n", "jsmill.toml").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidToml);

        let err = PipelineConfig::from_toml_str("[jshint]\nskp = false\n", "jsmill.toml").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidToml);

        let err = PipelineConfig::from_toml_str("[jshint.options]\neqeq = true\n", "jsmill.toml")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidToml);
    }

    #[test]
    fn load_anchors_relative_paths_at_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jsmill.json");
        fs::write(&path, r#"{"project": {"source_dir": "js", "build_dir": "/abs/out"}}"#).unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.project.source_dir, dir.path().join("js"));
        assert_eq!(config.project.build_dir, PathBuf::from("/abs/out"));
        assert_eq!(config.project.base_dir, dir.path().join("."));
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config.project.work_dir, dir.path().join("target/web"));
    }

    #[test]
    fn discover_prefers_file_in_cwd() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[jsdoc]\nskip = true\n").unwrap();

        let config = PipelineConfig::discover(None, dir.path()).unwrap();
        assert!(!config.is_enabled(Stage::JsDoc));
    }

    #[test]
    fn copy_stage_cannot_be_skipped() {
        let mut config = PipelineConfig::default();
        let err = config.set_skip(Stage::Copy, true).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationInvalidArgument);

        config.set_skip(Stage::JsHint, false).unwrap();
        assert!(config.is_enabled(Stage::JsHint));
    }
}
