//! Pipeline stages.
//!
//! Every stage implements [`Processor`]: it is configured exactly once with the
//! goal's [`BuildContext`] and the pipeline configuration, then processed once.
//! The set of stages is closed; [`StageProcessor`] holds one of each variant.

pub mod copy;
pub mod jsdoc;
pub mod jshint;
pub mod jslint;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::PipelineConfig;
use crate::context::BuildContext;
use crate::error::{Error, Result};

pub use copy::CopyProcessor;
pub use jsdoc::JsDocProcessor;
pub use jshint::JsHintProcessor;
pub use jslint::JsLintProcessor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Copy,
    #[serde(rename = "jslint")]
    JsLint,
    #[serde(rename = "jshint")]
    JsHint,
    #[serde(rename = "jsdoc")]
    JsDoc,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Copy, Stage::JsLint, Stage::JsHint, Stage::JsDoc];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Copy => "copy",
            Stage::JsLint => "jslint",
            Stage::JsHint => "jshint",
            Stage::JsDoc => "jsdoc",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Stage::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| {
                Error::validation_invalid_argument(
                    "stage",
                    format!("Unknown stage '{}'", s),
                    Some(s.to_string()),
                    Some(Stage::ALL.iter().map(|st| st.as_str().to_string()).collect()),
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorState {
    Unconfigured,
    Configured,
    Completed,
    Failed,
    Skipped,
}

/// How a stage ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome {
    Completed {
        message: String,
        #[serde(skip_serializing_if = "Value::is_null")]
        data: Value,
    },
    Skipped {
        reason: String,
    },
}

impl StageOutcome {
    pub fn completed(message: impl Into<String>, data: Value) -> Self {
        StageOutcome::Completed {
            message: message.into(),
            data,
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        StageOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StageOutcome::Skipped { .. })
    }
}

pub trait Processor {
    fn stage(&self) -> Stage;

    fn state(&self) -> ProcessorState;

    /// Store the goal context and this stage's options. Must be called exactly once.
    fn configure(&mut self, context: &BuildContext, config: &PipelineConfig) -> Result<()>;

    /// Perform the stage's work. Failures come back as `processor.failed`.
    fn process_all(&mut self) -> Result<StageOutcome>;
}

/// Tracks `Unconfigured -> Configured -> {Completed | Failed | Skipped}`.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    stage: Stage,
    state: ProcessorState,
}

impl Lifecycle {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            state: ProcessorState::Unconfigured,
        }
    }

    pub fn state(&self) -> ProcessorState {
        self.state
    }

    /// Move to `Configured` once `settings` were built, or to `Failed` otherwise.
    pub fn configure<S>(&mut self, settings: Result<S>) -> Result<S> {
        if self.state != ProcessorState::Unconfigured {
            return Err(Error::processor_invalid_state(
                self.stage.as_str(),
                "was already configured",
            ));
        }
        match settings {
            Ok(settings) => {
                self.state = ProcessorState::Configured;
                Ok(settings)
            }
            Err(err) => {
                self.state = ProcessorState::Failed;
                Err(err)
            }
        }
    }

    /// Run `work` if configured, then record the terminal state.
    pub fn run<S>(
        &mut self,
        settings: Option<&S>,
        work: impl FnOnce(&S) -> Result<StageOutcome>,
    ) -> Result<StageOutcome> {
        let settings = match (self.state, settings) {
            (ProcessorState::Configured, Some(settings)) => settings,
            (ProcessorState::Unconfigured, _) => {
                return Err(Error::processor_invalid_state(
                    self.stage.as_str(),
                    "was processed before being configured",
                ))
            }
            _ => {
                return Err(Error::processor_invalid_state(
                    self.stage.as_str(),
                    "has already run",
                ))
            }
        };

        let result = work(settings);
        self.state = match &result {
            Ok(StageOutcome::Completed { .. }) => ProcessorState::Completed,
            Ok(StageOutcome::Skipped { .. }) => ProcessorState::Skipped,
            Err(_) => ProcessorState::Failed,
        };
        result
    }
}

/// The closed set of stage implementations.
pub enum StageProcessor {
    Copy(CopyProcessor),
    JsLint(JsLintProcessor),
    JsHint(JsHintProcessor),
    JsDoc(JsDocProcessor),
}

impl StageProcessor {
    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Copy => StageProcessor::Copy(CopyProcessor::new()),
            Stage::JsLint => StageProcessor::JsLint(JsLintProcessor::new()),
            Stage::JsHint => StageProcessor::JsHint(JsHintProcessor::new()),
            Stage::JsDoc => StageProcessor::JsDoc(JsDocProcessor::new()),
        }
    }

    fn inner(&self) -> &dyn Processor {
        match self {
            StageProcessor::Copy(p) => p,
            StageProcessor::JsLint(p) => p,
            StageProcessor::JsHint(p) => p,
            StageProcessor::JsDoc(p) => p,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Processor {
        match self {
            StageProcessor::Copy(p) => p,
            StageProcessor::JsLint(p) => p,
            StageProcessor::JsHint(p) => p,
            StageProcessor::JsDoc(p) => p,
        }
    }
}

impl Processor for StageProcessor {
    fn stage(&self) -> Stage {
        self.inner().stage()
    }

    fn state(&self) -> ProcessorState {
        self.inner().state()
    }

    fn configure(&mut self, context: &BuildContext, config: &PipelineConfig) -> Result<()> {
        self.inner_mut().configure(context, config)
    }

    fn process_all(&mut self) -> Result<StageOutcome> {
        self.inner_mut().process_all()
    }
}
