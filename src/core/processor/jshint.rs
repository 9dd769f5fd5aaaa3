//! In-process JavaScript checks using JSHint option names.
//!
//! Rules run over source text with string, regex and comment contents blanked
//! out, so operators inside literals never trigger them. This is a line-based
//! checker, not a parser.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};

use super::{Lifecycle, Processor, ProcessorState, Stage, StageOutcome};
use crate::config::PipelineConfig;
use crate::context::BuildContext;
use crate::error::{Error, Result};
use crate::utils::io;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct JsHintOptions {
    /// Prohibit bitwise operators.
    pub bitwise: bool,
    /// Require `===` and `!==`.
    pub eqeqeq: bool,
    /// Tolerate `eval`.
    pub evil: bool,
    /// Tolerate `debugger` statements.
    pub debug: bool,
    /// Prohibit `++` and `--`.
    pub plusplus: bool,
    /// Prohibit trailing whitespace.
    pub trailing: bool,
    /// Tolerate indentation mixing tabs and spaces.
    pub smarttabs: bool,
    /// Require a `"use strict"` directive.
    pub strict: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxlen: Option<usize>,
    /// `single` or `double`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quotmark: Option<String>,
}

impl JsHintOptions {
    /// Options in JSHint directive form, e.g. `bitwise:true,eqeqeq:true,maxlen:80`.
    pub fn format(&self) -> String {
        let flags = [
            ("bitwise", self.bitwise),
            ("eqeqeq", self.eqeqeq),
            ("evil", self.evil),
            ("debug", self.debug),
            ("plusplus", self.plusplus),
            ("trailing", self.trailing),
            ("smarttabs", self.smarttabs),
            ("strict", self.strict),
        ];
        let mut parts: Vec<String> = flags
            .iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(name, _)| format!("{}:true", name))
            .collect();
        if let Some(maxlen) = self.maxlen {
            parts.push(format!("maxlen:{}", maxlen));
        }
        if let Some(quotmark) = &self.quotmark {
            parts.push(format!("quotmark:{}", quotmark));
        }
        parts.join(",")
    }

    pub fn validate(&self) -> Result<()> {
        if self.maxlen == Some(0) {
            return Err(Error::config_invalid_value(
                "jshint.options.maxlen",
                Some("0".to_string()),
                "must be greater than zero",
            ));
        }
        if let Some(quotmark) = &self.quotmark {
            if quotmark != "single" && quotmark != "double" {
                return Err(Error::config_invalid_value(
                    "jshint.options.quotmark",
                    Some(quotmark.clone()),
                    "expected 'single' or 'double'",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub rule: &'static str,
    pub message: String,
}

struct Rules {
    options: JsHintOptions,
    eval: Regex,
    debugger: Regex,
    use_strict: Regex,
}

impl Rules {
    fn new(options: JsHintOptions) -> Result<Self> {
        Ok(Self {
            options,
            eval: compile(r"\beval\s*\(")?,
            debugger: compile(r"\bdebugger\b")?,
            use_strict: compile(r#"^\s*(?:"use strict"|'use strict')"#)?,
        })
    }

    fn check(&self, file: &str, source: &str) -> Vec<Violation> {
        let opts = &self.options;
        let masked = mask(source);
        let mut found = Vec::new();
        let mut push = |line: usize, column: usize, rule: &'static str, message: String| {
            found.push(Violation {
                file: file.to_string(),
                line,
                column,
                rule,
                message,
            });
        };

        if opts.strict && !source.lines().any(|l| self.use_strict.is_match(l)) {
            push(1, 1, "strict", "Missing \"use strict\" statement.".to_string());
        }

        for (idx, (raw, code)) in source.lines().zip(masked.lines.iter()).enumerate() {
            let line = idx + 1;

            if let Some(maxlen) = opts.maxlen {
                if raw.chars().count() > maxlen {
                    push(line, maxlen + 1, "maxlen", "Line is too long.".to_string());
                }
            }

            if opts.trailing && raw.ends_with([' ', '\t']) {
                let column = raw.trim_end().chars().count() + 1;
                push(line, column, "trailing", "Trailing whitespace.".to_string());
            }

            if !opts.smarttabs {
                let indent: String = raw.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
                if indent.contains(' ') && indent.contains('\t') {
                    push(line, 1, "smarttabs", "Mixed spaces and tabs.".to_string());
                }
            }

            if opts.eqeqeq {
                for (offset, op) in loose_equality(code) {
                    let strict = if op == "==" { "===" } else { "!==" };
                    push(
                        line,
                        column_of(code, offset),
                        "eqeqeq",
                        format!("Expected '{}' and instead saw '{}'.", strict, op),
                    );
                }
            }

            if !opts.evil {
                for m in self.eval.find_iter(code) {
                    push(line, column_of(code, m.start()), "evil", "eval can be harmful.".to_string());
                }
            }

            if !opts.debug {
                for m in self.debugger.find_iter(code) {
                    push(
                        line,
                        column_of(code, m.start()),
                        "debug",
                        "Forgotten 'debugger' statement?".to_string(),
                    );
                }
            }

            if opts.bitwise {
                for (offset, op) in bitwise_operators(code) {
                    push(
                        line,
                        column_of(code, offset),
                        "bitwise",
                        format!("Unexpected use of '{}'.", op),
                    );
                }
            }

            if opts.plusplus {
                for (offset, op) in [("++", code.match_indices("++")), ("--", code.match_indices("--"))]
                    .into_iter()
                    .flat_map(|(op, hits)| hits.map(move |(offset, _)| (offset, op)))
                {
                    push(
                        line,
                        column_of(code, offset),
                        "plusplus",
                        format!("Unexpected use of '{}'.", op),
                    );
                }
            }
        }

        if let Some(quotmark) = &opts.quotmark {
            let (wanted, name) = if quotmark == "single" {
                ('\'', "singlequote")
            } else {
                ('"', "doublequote")
            };
            for quote in masked.quotes.iter().filter(|q| q.mark != '`' && q.mark != wanted) {
                push(
                    quote.line,
                    quote.column,
                    "quotmark",
                    format!("Strings must use {}.", name),
                );
            }
        }

        found.sort_by_key(|v| (v.line, v.column));
        found
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::internal_unexpected(format!("Invalid rule pattern: {}", e)))
}

fn column_of(line: &str, byte_offset: usize) -> usize {
    line[..byte_offset].chars().count() + 1
}

/// Byte offsets of `==` and `!=`, reading each run of `=` as one operator.
fn loose_equality(code: &str) -> Vec<(usize, &'static str)> {
    let bytes = code.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let run = bytes[i + 1..].iter().take_while(|b| **b == b'=').count();
        match bytes[i] {
            b'=' => {
                if run == 1 {
                    found.push((i, "=="));
                }
                i += run + 1;
            }
            b'!' => {
                if run == 1 {
                    found.push((i, "!="));
                }
                i += run + 1;
            }
            b'<' | b'>' => i += run + 1,
            _ => i += 1,
        }
    }
    found
}

/// Byte offsets of bitwise operators, skipping `&&`, `||`, `=>`, `>=` and friends.
fn bitwise_operators(code: &str) -> Vec<(usize, String)> {
    let bytes = code.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let next = bytes.get(i + 1).copied();
        match bytes[i] {
            b'&' | b'|' if next == Some(bytes[i]) => i += 2,
            b'&' | b'|' | b'^' | b'~' => {
                found.push((i, (bytes[i] as char).to_string()));
                i += 1;
            }
            b'<' if next == Some(b'<') => {
                found.push((i, "<<".to_string()));
                i += 2;
            }
            b'>' if next == Some(b'>') => {
                let len = if bytes.get(i + 2) == Some(&b'>') { 3 } else { 2 };
                found.push((i, ">".repeat(len)));
                i += len;
            }
            _ => i += 1,
        }
    }
    found
}

struct Quote {
    line: usize,
    column: usize,
    mark: char,
}

struct Masked {
    lines: Vec<String>,
    quotes: Vec<Quote>,
}

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Code,
    LineComment,
    BlockComment,
    Str(char),
    Regex,
}

/// Whether a `/` after `prev` starts a regex literal rather than a division.
/// `before` is the code character preceding `prev`; `++`/`--` end an operand.
fn regex_allowed(prev: Option<char>, before: Option<char>) -> bool {
    match prev {
        None => true,
        Some(c @ ('+' | '-')) => before != Some(c),
        Some(c) => "(,=:[!&|?{};*%<>~^".contains(c),
    }
}

/// Blank out comments and the contents of string and regex literals, keeping columns.
fn mask(source: &str) -> Masked {
    let mut mode = Mode::Code;
    let mut in_class = false;
    let mut prev: Option<char> = None;
    let mut before: Option<char> = None;
    let mut lines = Vec::new();
    let mut quotes = Vec::new();

    for (idx, raw) in source.lines().enumerate() {
        // Only block comments and template literals span lines.
        mode = match mode {
            Mode::BlockComment | Mode::Str('`') => mode,
            _ => Mode::Code,
        };
        let chars: Vec<char> = raw.chars().collect();
        let mut out = String::with_capacity(raw.len());
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();
            match mode {
                Mode::Code => {
                    if c == '/' && next == Some('/') {
                        mode = Mode::LineComment;
                        out.push_str("  ");
                        i += 2;
                        continue;
                    }
                    if c == '/' && next == Some('*') {
                        mode = Mode::BlockComment;
                        out.push_str("  ");
                        i += 2;
                        continue;
                    }
                    if c == '\'' || c == '"' || c == '`' {
                        quotes.push(Quote {
                            line: idx + 1,
                            column: i + 1,
                            mark: c,
                        });
                        mode = Mode::Str(c);
                    } else if c == '/' && regex_allowed(prev, before) {
                        mode = Mode::Regex;
                        in_class = false;
                    }
                    out.push(c);
                    if !c.is_whitespace() {
                        before = prev;
                        prev = Some(c);
                    }
                }
                Mode::LineComment => out.push(' '),
                Mode::BlockComment => {
                    if c == '*' && next == Some('/') {
                        mode = Mode::Code;
                        out.push_str("  ");
                        i += 2;
                        continue;
                    }
                    out.push(' ');
                }
                Mode::Str(quote) => {
                    if c == '\\' {
                        out.push(' ');
                        if next.is_some() {
                            out.push(' ');
                        }
                        i += 2;
                        continue;
                    }
                    if c == quote {
                        mode = Mode::Code;
                        out.push(c);
                        before = prev;
                        prev = Some(c);
                    } else {
                        out.push(' ');
                    }
                }
                Mode::Regex => {
                    if c == '\\' {
                        out.push(' ');
                        if next.is_some() {
                            out.push(' ');
                        }
                        i += 2;
                        continue;
                    }
                    match c {
                        '[' => in_class = true,
                        ']' => in_class = false,
                        '/' if !in_class => {
                            mode = Mode::Code;
                            out.push(c);
                            before = prev;
                            prev = Some(c);
                            i += 1;
                            continue;
                        }
                        _ => {}
                    }
                    out.push(' ');
                }
            }
            i += 1;
        }
        lines.push(out);
    }

    Masked { lines, quotes }
}

struct JsHintSettings {
    work_root: PathBuf,
    rules: Rules,
}

pub struct JsHintProcessor {
    lifecycle: Lifecycle,
    settings: Option<JsHintSettings>,
}

impl Default for JsHintProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl JsHintProcessor {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::new(Stage::JsHint),
            settings: None,
        }
    }
}

impl Processor for JsHintProcessor {
    fn stage(&self) -> Stage {
        Stage::JsHint
    }

    fn state(&self) -> ProcessorState {
        self.lifecycle.state()
    }

    fn configure(&mut self, context: &BuildContext, config: &PipelineConfig) -> Result<()> {
        let options = config.jshint.options.clone();
        let settings = options
            .validate()
            .and_then(|_| Rules::new(options))
            .map(|rules| JsHintSettings {
                work_root: context.work_root().to_path_buf(),
                rules,
            })
            .map_err(|e| {
                Error::processor_failed(Stage::JsHint.as_str(), "Invalid jshint configuration", e)
            });
        self.settings = Some(self.lifecycle.configure(settings)?);
        Ok(())
    }

    fn process_all(&mut self) -> Result<StageOutcome> {
        self.lifecycle.run(self.settings.as_ref(), hint)
    }
}

fn relative_name(root: &Path, file: &Path) -> String {
    file.strip_prefix(root).unwrap_or(file).display().to_string()
}

fn hint(settings: &JsHintSettings) -> Result<StageOutcome> {
    let stage = Stage::JsHint.as_str();
    let files = io::find_files(&settings.work_root, "js")
        .map_err(|e| Error::processor_failed(stage, "Cannot collect JavaScript sources", e))?;

    tracing::debug!(options = %settings.rules.options.format(), "JSHint options");

    let mut violations = Vec::new();
    for file in &files {
        let source = io::read_file(file, "read javascript")
            .map_err(|e| Error::processor_failed(stage, "Cannot read JavaScript source", e))?;
        violations.extend(settings.rules.check(&relative_name(&settings.work_root, file), &source));
    }

    if violations.is_empty() {
        tracing::info!(files = files.len(), "JSHint found no problems");
        return Ok(StageOutcome::completed(
            format!("JSHint checked {} file(s)", files.len()),
            json!({ "files": files.len() }),
        ));
    }

    for v in &violations {
        tracing::error!("{}:{}:{} {} ({})", v.file, v.line, v.column, v.message, v.rule);
    }
    Err(Error::processor_rejected(
        stage,
        format!("JSHint found {} problem(s)", violations.len()),
        json!({ "files": files.len(), "violations": violations }),
    ))
}
