//! CLI response formatting and output.
//!
//! Provides JSON envelope, printing, and exit code mapping.

use jsmill::error::Hint;
use jsmill::{Error, ErrorCode, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CliResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CliError>,
}

#[derive(Debug, Serialize)]
pub struct CliError {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<Hint>>,
    /// Codes of the wrapped errors, outermost first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl<T: Serialize> CliResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            Error::internal_json(e.to_string(), Some("serialize response".to_string()))
        })
    }
}

impl CliResponse<()> {
    pub fn from_error(err: &Error) -> Self {
        let mut causes = Vec::new();
        let mut next = err.cause.as_deref();
        while let Some(cause) = next {
            causes.push(cause.code.as_str().to_string());
            next = cause.cause.as_deref();
        }

        Self {
            success: false,
            data: None,
            error: Some(CliError {
                code: err.code.as_str().to_string(),
                message: err.message.clone(),
                details: err.details.clone(),
                hints: if err.hints.is_empty() {
                    None
                } else {
                    Some(err.hints.clone())
                },
                causes,
            }),
        }
    }
}

fn print_response<T: Serialize>(response: &CliResponse<T>) -> Result<()> {
    println!("{}", response.to_json()?);
    Ok(())
}

pub fn map_cmd_result_to_json<T: Serialize>(
    result: Result<(T, i32)>,
) -> (Result<serde_json::Value>, i32) {
    match result {
        Ok((data, exit_code)) => match serde_json::to_value(data) {
            Ok(value) => (Ok(value), exit_code),
            Err(err) => (
                Err(Error::internal_json(
                    err.to_string(),
                    Some("serialize response".to_string()),
                )),
                1,
            ),
        },
        Err(err) => {
            let exit_code = exit_code_for(&err);
            (Err(err), exit_code)
        }
    }
}

/// Stage failures report the more specific exit code of a config, precondition
/// or lookup problem underneath them.
pub fn exit_code_for(err: &Error) -> i32 {
    match err.code {
        ErrorCode::PipelineStageFailed | ErrorCode::ProcessorFailed => {
            match exit_code_for_error(err.root_cause().code) {
                code @ (2..=4) => code,
                _ => 20,
            }
        }
        code => exit_code_for_error(code),
    }
}

fn exit_code_for_error(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::ConfigInvalidToml
        | ErrorCode::ConfigInvalidJson
        | ErrorCode::ConfigInvalidValue
        | ErrorCode::ValidationInvalidArgument => 2,

        ErrorCode::PreconditionMissingArtifact => 3,

        ErrorCode::ExecutableNotFound => 4,

        ErrorCode::InvocationExitCodeMismatch
        | ErrorCode::InvocationSpawnFailed
        | ErrorCode::ProcessorFailed
        | ErrorCode::PipelineStageFailed => 20,

        ErrorCode::ProcessorInvalidState
        | ErrorCode::InternalIoError
        | ErrorCode::InternalJsonError
        | ErrorCode::InternalUnexpected => 1,
    }
}

pub fn print_json_result(result: Result<serde_json::Value>) -> Result<()> {
    match result {
        Ok(data) => print_response(&CliResponse::success(data)),
        Err(err) => print_response(&CliResponse::<()>::from_error(&err)),
    }
}
