//! Command execution primitives with consistent error handling.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde::Serialize;

use crate::error::{Error, ExitCodeMismatchDetails, Result};
use crate::executable::ResolvedExecutable;

/// A fully described process invocation.
///
/// Arguments are literal tokens handed to the OS as-is; nothing is re-split
/// or shell-interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
    expected_exit_code: i32,
}

impl CommandSpec {
    pub fn new(executable: &ResolvedExecutable, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: executable.path().to_path_buf(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            expected_exit_code: 0,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn expect_exit_code(mut self, code: i32) -> Self {
        self.expected_exit_code = code;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn expected_exit_code(&self) -> i32 {
        self.expected_exit_code
    }

    /// Human-readable command line, for logs and error details only.
    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Captured output from command execution.
/// Reusable primitive for any command that executes external processes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CapturedOutput {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl CapturedOutput {
    pub fn new(stdout: String, stderr: String) -> Self {
        Self { stdout, stderr }
    }

    pub fn from_output(output: &Output) -> Self {
        Self::new(
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub exit_code: i32,
    #[serde(flatten)]
    pub output: CapturedOutput,
}

/// Run `spec` to completion and classify the exit code.
///
/// Blocks the calling thread until the process exits.
pub fn invoke(spec: &CommandSpec) -> Result<InvocationResult> {
    let command_line = spec.display();
    tracing::debug!(command = %command_line, cwd = %spec.working_dir.display(), "Executing");

    let output = Command::new(&spec.program)
        .args(&spec.args)
        .current_dir(&spec.working_dir)
        .output()
        .map_err(|e| Error::invocation_spawn_failed(command_line.clone(), &e))?;

    let captured = CapturedOutput::from_output(&output);
    if !captured.stdout.trim().is_empty() {
        tracing::debug!(stdout = %captured.stdout.trim_end(), "Command output");
    }
    if !captured.stderr.trim().is_empty() {
        tracing::debug!(stderr = %captured.stderr.trim_end(), "Command diagnostics");
    }

    match output.status.code() {
        Some(code) if code == spec.expected_exit_code => Ok(InvocationResult {
            exit_code: code,
            output: captured,
        }),
        observed => Err(Error::invocation_exit_code_mismatch(ExitCodeMismatchDetails {
            command: command_line,
            expected: spec.expected_exit_code,
            observed,
            stdout: captured.stdout,
            stderr: captured.stderr,
        })),
    }
}

/// Extract error text from command output.
///
/// Prefers stderr, falls back to stdout if stderr is empty.
pub fn error_text(output: &CapturedOutput) -> String {
    if !output.stderr.trim().is_empty() {
        output.stderr.trim().to_string()
    } else {
        output.stdout.trim().to_string()
    }
}

/// Tool output carried by an exit-code mismatch error, stderr preferred.
pub fn diagnostics(err: &Error) -> String {
    let field = |name: &str| {
        err.details
            .get(name)
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    error_text(&CapturedOutput::new(field("stdout"), field("stderr")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::executable::find_in_search_path;
    use std::fs;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn script(dir: &Path, name: &str, body: &str) -> ResolvedExecutable {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        find_in_search_path(name, Some(dir.as_os_str())).unwrap()
    }

    #[cfg(unix)]
    #[test]
    fn arguments_are_passed_as_literal_tokens() {
        let dir = TempDir::new().unwrap();
        let exe = script(dir.path(), "echo-args", r#"for a in "$@"; do echo "[$a]"; done"#);

        let spec = CommandSpec::new(&exe, dir.path()).args(["a b", "$HOME", "c"]);
        let result = invoke(&spec).unwrap();

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output.stdout, "[a b]\n[$HOME]\n[c]\n");
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_working_directory() {
        let dir = TempDir::new().unwrap();
        let work = dir.path().join("work");
        fs::create_dir(&work).unwrap();
        let exe = script(dir.path(), "where", "pwd");

        let result = invoke(&CommandSpec::new(&exe, &work)).unwrap();
        let reported = PathBuf::from(result.output.stdout.trim());
        assert_eq!(reported.canonicalize().unwrap(), work.canonicalize().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn unexpected_exit_code_is_a_mismatch() {
        let dir = TempDir::new().unwrap();
        let exe = script(dir.path(), "fails", "echo broken >&2; exit 3");

        let err = invoke(&CommandSpec::new(&exe, dir.path())).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvocationExitCodeMismatch);
        assert_eq!(err.details["observed"], 3);
        assert_eq!(err.details["expected"], 0);
        assert_eq!(err.details["stderr"], "broken\n");
    }

    #[cfg(unix)]
    #[test]
    fn overridden_exit_code_counts_as_success() {
        let dir = TempDir::new().unwrap();
        let exe = script(dir.path(), "exits-two", "exit 2");

        let result = invoke(&CommandSpec::new(&exe, dir.path()).expect_exit_code(2)).unwrap();
        assert_eq!(result.exit_code, 2);
    }

    #[cfg(unix)]
    #[test]
    fn vanished_executable_is_a_spawn_failure() {
        let dir = TempDir::new().unwrap();
        let exe = script(dir.path(), "gone", "exit 0");
        fs::remove_file(exe.path()).unwrap();

        let err = invoke(&CommandSpec::new(&exe, dir.path())).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvocationSpawnFailed);
    }

    #[test]
    fn display_joins_program_and_args() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("tool"), "").unwrap();
        let exe = find_in_search_path("tool", Some(dir.path().as_os_str())).unwrap();

        let spec = CommandSpec::new(&exe, dir.path()).arg("--private").arg("app.js");
        assert_eq!(spec.get_args(), ["--private", "app.js"]);
        assert!(spec.display().ends_with("tool --private app.js"));
        assert_eq!(spec.expected_exit_code(), 0);
    }

    #[test]
    fn error_text_prefers_stderr() {
        let output = CapturedOutput::new("stdout content".to_string(), "stderr content".to_string());
        assert_eq!(error_text(&output), "stderr content");
    }

    #[cfg(unix)]
    #[test]
    fn diagnostics_come_from_mismatch_details() {
        let dir = TempDir::new().unwrap();
        let exe = script(dir.path(), "noisy", "echo 'only stdout'; exit 1");

        let err = invoke(&CommandSpec::new(&exe, dir.path())).unwrap_err();
        assert_eq!(diagnostics(&err), "only stdout");
    }

    #[test]
    fn error_text_falls_back_to_stdout() {
        let output = CapturedOutput::new("stdout content".to_string(), String::new());
        assert_eq!(error_text(&output), "stdout content");
    }
}
