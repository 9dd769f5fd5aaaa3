//! Goal orchestration.
//!
//! A goal is a fixed, ordered list of stages run in one build mode. Stages
//! disabled by configuration are recorded without creating a processor, and
//! when the copy stage finds no source root the checks after it are skipped.
//! The first failing stage aborts the goal. Nothing is rolled back.

use serde::Serialize;
use serde_json::Value;

use crate::config::PipelineConfig;
use crate::context::{BuildContext, BuildMode};
use crate::error::{Error, Result};
use crate::processor::{Processor, Stage, StageOutcome, StageProcessor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Goal {
    CompileJavascript,
    TestCompileJavascript,
    #[serde(rename = "jsdoc")]
    JsDoc,
}

impl Goal {
    pub const ALL: [Goal; 3] = [Goal::CompileJavascript, Goal::TestCompileJavascript, Goal::JsDoc];

    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::CompileJavascript => "compile-javascript",
            Goal::TestCompileJavascript => "test-compile-javascript",
            Goal::JsDoc => "jsdoc",
        }
    }

    pub fn mode(&self) -> BuildMode {
        match self {
            Goal::TestCompileJavascript => BuildMode::Test,
            Goal::CompileJavascript | Goal::JsDoc => BuildMode::Main,
        }
    }

    pub fn stages(&self) -> &'static [Stage] {
        match self {
            Goal::CompileJavascript | Goal::TestCompileJavascript => {
                &[Stage::Copy, Stage::JsLint, Stage::JsHint]
            }
            Goal::JsDoc => &[Stage::JsDoc],
        }
    }
}

impl std::fmt::Display for Goal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Goal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Goal::ALL
            .iter()
            .copied()
            .find(|goal| goal.as_str() == s)
            .ok_or_else(|| {
                Error::validation_invalid_argument(
                    "goal",
                    format!("Unknown goal '{}'", s),
                    Some(s.to_string()),
                    Some(Goal::ALL.iter().map(|g| g.as_str().to_string()).collect()),
                )
            })
    }
}

/// Creates the processor for a stage. Tests substitute recording processors.
pub trait ProcessorFactory {
    fn create(&self, stage: Stage) -> Box<dyn Processor>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProcessorFactory;

impl ProcessorFactory for DefaultProcessorFactory {
    fn create(&self, stage: Stage) -> Box<dyn Processor> {
        Box::new(StageProcessor::for_stage(stage))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    Skipped,
    Disabled,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageResult {
    pub stage: Stage,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl StageResult {
    fn disabled(stage: Stage) -> Self {
        Self {
            stage,
            status: StageStatus::Disabled,
            message: Some("Disabled by configuration".to_string()),
            data: None,
        }
    }

    fn no_sources(stage: Stage, mode: BuildMode) -> Self {
        let kind = match mode {
            BuildMode::Main => "main",
            BuildMode::Test => "test",
        };
        Self {
            stage,
            status: StageStatus::Skipped,
            message: Some(format!("No {} JavaScript sources", kind)),
            data: None,
        }
    }

    fn from_outcome(stage: Stage, outcome: StageOutcome) -> Self {
        match outcome {
            StageOutcome::Completed { message, data } => Self {
                stage,
                status: StageStatus::Completed,
                message: Some(message),
                data: (!data.is_null()).then_some(data),
            },
            StageOutcome::Skipped { reason } => Self {
                stage,
                status: StageStatus::Skipped,
                message: Some(reason),
                data: None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalRunStatus {
    Success,
    /// Every stage ran without failing, but a processor skipped its work.
    PartialSuccess,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRunSummary {
    pub total_stages: usize,
    pub completed: usize,
    pub skipped: usize,
    pub disabled: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalRunResult {
    pub goal: Goal,
    pub mode: BuildMode,
    pub status: GoalRunStatus,
    pub stages: Vec<StageResult>,
    pub summary: GoalRunSummary,
}

impl GoalRunResult {
    pub fn stage(&self, stage: Stage) -> Option<&StageResult> {
        self.stages.iter().find(|r| r.stage == stage)
    }
}

/// Run `goal` with the built-in processors.
pub fn run(goal: Goal, config: &PipelineConfig, context: &BuildContext) -> Result<GoalRunResult> {
    run_goal(goal, config, context, &DefaultProcessorFactory)
}

pub fn run_goal(
    goal: Goal,
    config: &PipelineConfig,
    context: &BuildContext,
    factory: &dyn ProcessorFactory,
) -> Result<GoalRunResult> {
    let context = context.with_mode(goal.mode());
    let mut results: Vec<StageResult> = Vec::with_capacity(goal.stages().len());

    let mut degraded = false;
    let mut no_sources = false;

    tracing::info!(goal = %goal, "Running goal");

    for &stage in goal.stages() {
        if !config.is_enabled(stage) {
            tracing::info!(stage = %stage, "Stage disabled by configuration");
            results.push(StageResult::disabled(stage));
            continue;
        }

        if no_sources {
            tracing::info!(stage = %stage, "No JavaScript sources, stage skipped");
            results.push(StageResult::no_sources(stage, context.mode));
            continue;
        }

        tracing::info!(stage = %stage, "Running stage");
        let mut processor = factory.create(stage);
        let outcome = processor
            .configure(&context, config)
            .and_then(|_| processor.process_all());

        match outcome {
            Ok(outcome) => {
                degraded |= outcome.is_skipped();
                // Without a source root the work root may only hold files from an
                // earlier run, so nothing after the copy has anything to check.
                if stage == Stage::Copy {
                    no_sources = !context.source_root().is_dir();
                }
                results.push(StageResult::from_outcome(stage, outcome));
            }
            Err(err) => {
                let completed = results
                    .iter()
                    .filter(|r| r.status == StageStatus::Completed)
                    .map(|r| r.stage.to_string())
                    .collect();
                tracing::error!(goal = %goal, stage = %stage, "{}", err.message);
                return Err(Error::pipeline_stage_failed(
                    goal.as_str(),
                    stage.as_str(),
                    completed,
                    err,
                ));
            }
        }
    }

    let summary = build_summary(&results);
    let status = if degraded {
        GoalRunStatus::PartialSuccess
    } else {
        GoalRunStatus::Success
    };

    Ok(GoalRunResult {
        goal,
        mode: goal.mode(),
        status,
        stages: results,
        summary,
    })
}

fn build_summary(results: &[StageResult]) -> GoalRunSummary {
    let count = |status: StageStatus| results.iter().filter(|r| r.status == status).count();
    GoalRunSummary {
        total_stages: results.len(),
        completed: count(StageStatus::Completed),
        skipped: count(StageStatus::Skipped),
        disabled: count(StageStatus::Disabled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;
    use crate::error::ErrorCode;
    use crate::processor::ProcessorState;
    use serde_json::json;
    use std::cell::RefCell;
    use std::fs;
    use std::collections::HashMap;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[derive(Clone, Copy)]
    enum Behavior {
        Complete,
        Skip,
        Fail,
    }

    type CallLog = Rc<RefCell<Vec<(Stage, &'static str, BuildMode)>>>;

    struct Recording {
        stage: Stage,
        behavior: Behavior,
        calls: CallLog,
        mode: BuildMode,
    }

    impl Processor for Recording {
        fn stage(&self) -> Stage {
            self.stage
        }

        fn state(&self) -> ProcessorState {
            ProcessorState::Unconfigured
        }

        fn configure(&mut self, context: &BuildContext, _config: &PipelineConfig) -> Result<()> {
            self.mode = context.mode;
            self.calls.borrow_mut().push((self.stage, "configure", context.mode));
            Ok(())
        }

        fn process_all(&mut self) -> Result<StageOutcome> {
            self.calls.borrow_mut().push((self.stage, "process", self.mode));
            match self.behavior {
                Behavior::Complete => Ok(StageOutcome::completed("done", json!({ "ok": true }))),
                Behavior::Skip => Ok(StageOutcome::skipped("tool not found")),
                Behavior::Fail => Err(Error::processor_failed(
                    self.stage.as_str(),
                    "boom",
                    Error::internal_unexpected("scripted failure"),
                )),
            }
        }
    }

    #[derive(Default)]
    struct RecordingFactory {
        behaviors: HashMap<Stage, Behavior>,
        calls: CallLog,
    }

    impl RecordingFactory {
        fn with(mut self, stage: Stage, behavior: Behavior) -> Self {
            self.behaviors.insert(stage, behavior);
            self
        }

        fn calls(&self) -> Vec<(Stage, &'static str, BuildMode)> {
            self.calls.borrow().clone()
        }

        fn processed(&self) -> Vec<Stage> {
            self.calls()
                .into_iter()
                .filter(|(_, call, _)| *call == "process")
                .map(|(stage, _, _)| stage)
                .collect()
        }
    }

    impl ProcessorFactory for RecordingFactory {
        fn create(&self, stage: Stage) -> Box<dyn Processor> {
            Box::new(Recording {
                stage,
                behavior: self.behaviors.get(&stage).copied().unwrap_or(Behavior::Complete),
                calls: Rc::clone(&self.calls),
                mode: BuildMode::Main,
            })
        }
    }

    fn project() -> (TempDir, BuildContext) {
        let dir = TempDir::new().unwrap();
        let mut project = ProjectConfig::default();
        project.resolve_paths(dir.path()).unwrap();
        fs::create_dir_all(&project.source_dir).unwrap();
        fs::create_dir_all(&project.test_source_dir).unwrap();
        let ctx = BuildContext::from_project(&project, BuildMode::Main);
        (dir, ctx)
    }

    fn all_enabled() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.jslint.skip = false;
        config.jshint.skip = false;
        config
    }

    #[test]
    fn default_compile_runs_only_copy() {
        let (_dir, ctx) = project();
        let factory = RecordingFactory::default();
        let result =
            run_goal(Goal::CompileJavascript, &PipelineConfig::default(), &ctx, &factory)
                .unwrap();

        assert_eq!(
            factory.calls(),
            vec![
                (Stage::Copy, "configure", BuildMode::Main),
                (Stage::Copy, "process", BuildMode::Main),
            ]
        );
        let statuses: Vec<_> = result.stages.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![StageStatus::Completed, StageStatus::Disabled, StageStatus::Disabled]
        );
        assert_eq!(result.status, GoalRunStatus::Success);
        assert_eq!(result.summary.disabled, 2);
    }

    #[test]
    fn enabled_stages_run_in_order() {
        let (_dir, ctx) = project();
        let factory = RecordingFactory::default();
        run_goal(Goal::CompileJavascript, &all_enabled(), &ctx, &factory).unwrap();
        assert_eq!(factory.processed(), vec![Stage::Copy, Stage::JsLint, Stage::JsHint]);
    }

    #[test]
    fn test_goal_runs_in_test_mode() {
        let (_dir, ctx) = project();
        let factory = RecordingFactory::default();
        let result =
            run_goal(Goal::TestCompileJavascript, &all_enabled(), &ctx, &factory).unwrap();

        assert_eq!(result.mode, BuildMode::Test);
        assert!(factory.calls().iter().all(|(_, _, mode)| *mode == BuildMode::Test));
    }

    #[test]
    fn failure_aborts_later_stages() {
        let (_dir, ctx) = project();
        let factory = RecordingFactory::default().with(Stage::Copy, Behavior::Fail);
        let err =
            run_goal(Goal::CompileJavascript, &all_enabled(), &ctx, &factory).unwrap_err();

        assert_eq!(factory.processed(), vec![Stage::Copy]);
        assert_eq!(err.code, ErrorCode::PipelineStageFailed);
        assert_eq!(err.details["goal"], "compile-javascript");
        assert_eq!(err.details["stage"], "copy");
        assert_eq!(err.details["completed"], json!([]));
        assert_eq!(err.details["causeCode"], "internal.unexpected");
    }

    #[test]
    fn failure_lists_completed_stages() {
        let (_dir, ctx) = project();
        let factory = RecordingFactory::default().with(Stage::JsHint, Behavior::Fail);
        let err =
            run_goal(Goal::CompileJavascript, &all_enabled(), &ctx, &factory).unwrap_err();

        assert_eq!(err.details["completed"], json!(["copy", "jslint"]));
        assert!(err.message.starts_with("Goal 'compile-javascript' failed at stage 'jshint'"));
        assert_eq!(err.cause.as_ref().unwrap().code, ErrorCode::ProcessorFailed);
    }

    #[test]
    fn skipped_linter_does_not_stop_the_next_one() {
        let (_dir, ctx) = project();
        let factory = RecordingFactory::default().with(Stage::JsLint, Behavior::Skip);
        let result =
            run_goal(Goal::CompileJavascript, &all_enabled(), &ctx, &factory).unwrap();

        assert_eq!(factory.processed(), vec![Stage::Copy, Stage::JsLint, Stage::JsHint]);
        assert_eq!(result.stage(Stage::JsLint).unwrap().status, StageStatus::Skipped);
        assert_eq!(result.status, GoalRunStatus::PartialSuccess);
        assert_eq!(result.summary.skipped, 1);
    }

    #[test]
    fn missing_source_root_skips_checks_after_copy() {
        let (_dir, ctx) = project();
        fs::remove_dir_all(&ctx.test_source_dir).unwrap();
        let factory = RecordingFactory::default();

        let result =
            run_goal(Goal::TestCompileJavascript, &all_enabled(), &ctx, &factory).unwrap();

        assert_eq!(factory.processed(), vec![Stage::Copy]);
        let jshint = result.stage(Stage::JsHint).unwrap();
        assert_eq!(jshint.status, StageStatus::Skipped);
        assert_eq!(jshint.message.as_deref(), Some("No test JavaScript sources"));
        assert_eq!(result.status, GoalRunStatus::Success);
    }

    #[test]
    fn skipped_jsdoc_goal_creates_no_processor() {
        let (_dir, ctx) = project();
        let factory = RecordingFactory::default();
        let mut config = PipelineConfig::default();
        config.jsdoc.skip = true;

        let result = run_goal(Goal::JsDoc, &config, &ctx, &factory).unwrap();
        assert!(factory.calls().is_empty());
        assert_eq!(result.stages[0].status, StageStatus::Disabled);
    }

    #[test]
    fn goal_names_parse() {
        assert_eq!("jsdoc".parse::<Goal>().unwrap(), Goal::JsDoc);
        assert_eq!(
            "test-compile-javascript".parse::<Goal>().unwrap(),
            Goal::TestCompileJavascript
        );
        assert_eq!(
            "package".parse::<Goal>().unwrap_err().code,
            ErrorCode::ValidationInvalidArgument
        );
    }
}
