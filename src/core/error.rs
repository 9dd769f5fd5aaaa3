use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigInvalidToml,
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationInvalidArgument,

    ExecutableNotFound,

    InvocationExitCodeMismatch,
    InvocationSpawnFailed,

    PreconditionMissingArtifact,

    ProcessorFailed,
    ProcessorInvalidState,

    PipelineStageFailed,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalidToml => "config.invalid_toml",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::ExecutableNotFound => "executable.not_found",

            ErrorCode::InvocationExitCodeMismatch => "invocation.exit_code_mismatch",
            ErrorCode::InvocationSpawnFailed => "invocation.spawn_failed",

            ErrorCode::PreconditionMissingArtifact => "precondition.missing_artifact",

            ErrorCode::ProcessorFailed => "processor.failed",
            ErrorCode::ProcessorInvalidState => "processor.invalid_state",

            ErrorCode::PipelineStageFailed => "pipeline.stage_failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub cause: Option<Box<Error>>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigParseDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutableNotFoundDetails {
    pub tool: String,
    pub candidates: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitCodeMismatchDetails {
    pub command: String,
    pub expected: i32,
    pub observed: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnFailedDetails {
    pub command: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingArtifactDetails {
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorFailedDetails {
    pub stage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageFailedDetails {
    pub goal: String,
    pub stage: String,
    pub completed: Vec<String>,
    pub cause_code: String,
    pub cause: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            cause: None,
        }
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let key = key.into();
        let problem = problem.into();
        let message = format!("Invalid value for '{}': {}", key, problem);
        Self::new(
            ErrorCode::ConfigInvalidValue,
            message,
            to_details(ConfigInvalidValueDetails {
                key,
                value,
                problem,
            }),
        )
    }

    pub fn config_invalid_toml(path: impl Into<String>, error: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::ConfigInvalidToml,
            format!("Invalid TOML in {}", path),
            to_details(ConfigParseDetails {
                path,
                error: error.into(),
            }),
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, error: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::ConfigInvalidJson,
            format!("Invalid JSON in {}", path),
            to_details(ConfigParseDetails {
                path,
                error: error.into(),
            }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let problem = problem.into();
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            format!("Invalid argument: {}", problem),
            to_details(InvalidArgumentDetails {
                field: field.into(),
                problem,
                id,
                tried,
            }),
        )
    }

    pub fn executable_not_found(tool: impl Into<String>, candidates: Vec<String>) -> Self {
        let tool = tool.into();
        Self::new(
            ErrorCode::ExecutableNotFound,
            format!("'{}' was not found in the system path", tool),
            to_details(ExecutableNotFoundDetails {
                tool: tool.clone(),
                candidates,
            }),
        )
        .with_hint(format!("Install '{}' and make sure it is on PATH", tool))
    }

    pub fn invocation_exit_code_mismatch(details: ExitCodeMismatchDetails) -> Self {
        let message = match details.observed {
            Some(code) => format!(
                "'{}' exited with code {} (expected {})",
                details.command, code, details.expected
            ),
            None => format!("'{}' was terminated by a signal", details.command),
        };
        Self::new(
            ErrorCode::InvocationExitCodeMismatch,
            message,
            to_details(details),
        )
    }

    pub fn invocation_spawn_failed(command: impl Into<String>, error: &std::io::Error) -> Self {
        let command = command.into();
        Self::new(
            ErrorCode::InvocationSpawnFailed,
            format!("Failed to start '{}': {}", command, error),
            to_details(SpawnFailedDetails {
                command,
                error: error.to_string(),
            }),
        )
    }

    pub fn precondition_missing_artifact(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::PreconditionMissingArtifact,
            format!("Cannot find the project's artifact: {}", path),
            to_details(MissingArtifactDetails { path }),
        )
        .with_hint("Build the project artifact before generating the report")
    }

    /// Wrap a lower-level failure as a stage failure, keeping it as the cause.
    pub fn processor_failed(stage: impl Into<String>, message: impl Into<String>, cause: Error) -> Self {
        let stage = stage.into();
        let details = to_details(ProcessorFailedDetails {
            stage,
            cause: Some(cause.code.as_str().to_string()),
            data: Value::Null,
        });
        let mut err = Self::new(ErrorCode::ProcessorFailed, message, details);
        err.hints = cause.hints.clone();
        err.with_cause(cause)
    }

    /// A stage failure that is not caused by another error, e.g. lint violations.
    pub fn processor_rejected(stage: impl Into<String>, message: impl Into<String>, data: Value) -> Self {
        Self::new(
            ErrorCode::ProcessorFailed,
            message,
            to_details(ProcessorFailedDetails {
                stage: stage.into(),
                cause: None,
                data,
            }),
        )
    }

    pub fn processor_invalid_state(stage: impl Into<String>, problem: impl Into<String>) -> Self {
        let stage = stage.into();
        let problem = problem.into();
        Self::new(
            ErrorCode::ProcessorInvalidState,
            format!("Processor '{}' {}", stage, problem),
            serde_json::json!({ "stage": stage, "problem": problem }),
        )
    }

    pub fn pipeline_stage_failed(
        goal: impl Into<String>,
        stage: impl Into<String>,
        completed: Vec<String>,
        cause: Error,
    ) -> Self {
        let goal = goal.into();
        let stage = stage.into();
        let message = format!(
            "Goal '{}' failed at stage '{}': {}",
            goal, stage, cause.message
        );
        let details = to_details(StageFailedDetails {
            goal,
            stage,
            completed,
            cause_code: cause.root_cause().code.as_str().to_string(),
            cause: cause.message.clone(),
        });
        let mut err = Self::new(ErrorCode::PipelineStageFailed, message, details);
        err.hints = cause.hints.clone();
        err.with_cause(cause)
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let error = error.into();
        let message = match &context {
            Some(ctx) => format!("IO error ({}): {}", ctx, error),
            None => format!("IO error: {}", error),
        };
        Self::new(
            ErrorCode::InternalIoError,
            message,
            to_details(InternalIoErrorDetails { error, context }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            serde_json::json!({ "error": error.into(), "context": context }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        let error = error.into();
        Self::new(
            ErrorCode::InternalUnexpected,
            format!("Unexpected error: {}", error),
            serde_json::json!({ "error": error }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }

    pub fn with_cause(mut self, cause: Error) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Innermost error of the cause chain.
    pub fn root_cause(&self) -> &Error {
        let mut current = self;
        while let Some(next) = current.cause.as_deref() {
            current = next;
        }
        current
    }

    /// Whether this error or any of its causes carries `code`.
    pub fn has_code(&self, code: ErrorCode) -> bool {
        let mut current = Some(self);
        while let Some(err) = current {
            if err.code == code {
                return true;
            }
            current = err.cause.as_deref();
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn processor_failed_keeps_cause_chain() {
        let spawn = Error::invocation_spawn_failed(
            "jsdoc",
            &std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let err = Error::processor_failed("jsdoc", "Error during jsdoc report generation", spawn);

        assert_eq!(err.code, ErrorCode::ProcessorFailed);
        assert_eq!(err.root_cause().code, ErrorCode::InvocationSpawnFailed);
        assert!(err.has_code(ErrorCode::InvocationSpawnFailed));
        assert!(err.source().is_some());
        assert_eq!(err.details["cause"], "invocation.spawn_failed");
    }

    #[test]
    fn stage_failed_names_goal_and_stage() {
        let cause = Error::precondition_missing_artifact("/tmp/target/app.js");
        let err = Error::pipeline_stage_failed("jsdoc", "jsdoc", Vec::new(), cause);

        assert!(err.message.contains("'jsdoc'"));
        assert!(err.message.contains("/tmp/target/app.js"));
        assert_eq!(err.details["causeCode"], "precondition.missing_artifact");
        assert_eq!(err.hints.len(), 1);
    }

    #[test]
    fn exit_code_mismatch_without_code_reports_signal() {
        let err = Error::invocation_exit_code_mismatch(ExitCodeMismatchDetails {
            command: "jslint a.js".to_string(),
            expected: 0,
            observed: None,
            stdout: String::new(),
            stderr: String::new(),
        });

        assert!(err.message.contains("signal"));
        assert!(err.details["observed"].is_null());
    }
}
