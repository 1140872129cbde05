//! Code executor — extracts generated Python and runs it in a sandbox.
//!
//! Extraction is best-effort text surgery on model output, not parsing:
//! cut at the first `---` or triple newline, prefer a fenced `python` block,
//! then make sure the last line evaluates to the answer. When the model ran
//! several assignments together on one line, [`reflow`] splits them with the
//! same pattern rules the code loop has always used. Those rules are known to
//! mis-split lines with `=` inside strings or comparisons.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use hoploop_core::sandbox::{ActionSpace, CodeSandbox};
use hoploop_core::values::{FieldValue, Values};
use regex::Regex;
use tracing::{debug, warn};

use crate::action::{ActionInterpreter, ActionOutcome, Interpretation};
use crate::schema::GENERATED_CODE;

static FENCED_PYTHON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```python[ \n](.*?)[ \n]```?").expect("valid fenced-code pattern")
});

static TRAILING_ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*=").expect("valid assignment pattern"));

pub const EMPTY_CODE: &str = "Error: Empty code after parsing.";
pub const MALFORMED_CODE: &str = "Error: Code format is not correct.";

/// Code that could not be extracted, with the text it was extracted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeParseError {
    pub code: String,
    pub message: String,
}

/// Extract runnable code from a `generated_code` completion.
///
/// The result always ends in a line whose value is the answer when the last
/// line is an assignment: `x = 1 + 1` becomes `x = 1 + 1\nx`.
pub fn parse_code(generated: &str) -> Result<String, CodeParseError> {
    let code = generated.split("---").next().unwrap_or_default();
    let code = code.split("\n\n\n").next().unwrap_or_default();

    let block = match FENCED_PYTHON.captures(code) {
        Some(captures) => captures.get(1).map_or("", |m| m.as_str()),
        None => code,
    };
    let mut block = block.replace("\\n", "\n");

    let fail = |message: &str| CodeParseError {
        code: code.to_string(),
        message: message.to_string(),
    };

    if block.is_empty() {
        return Err(fail(EMPTY_CODE));
    }
    if !block.contains('\n') && block.matches('=').count() > 1 {
        return Err(fail(MALFORMED_CODE));
    }

    let last_line = block.rsplit('\n').next().unwrap_or_default().trim();
    let trailing_name = TRAILING_ASSIGNMENT
        .captures(last_line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    match trailing_name {
        Some(name) => {
            block.push('\n');
            block.push_str(&name);
        }
        None => block = reflow(&block),
    }

    Ok(block)
}

// ── Reflow ────────────────────────────────────────────────────────────────

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// If `name *=` (identifier, optional spaces, `=`) starts at `pos`, the index
/// just past the `=`.
fn assignment_at(chars: &[char], pos: usize) -> Option<usize> {
    if !chars.get(pos).is_some_and(|&c| is_ident_start(c)) {
        return None;
    }
    let mut i = pos + 1;
    while chars.get(i).is_some_and(|&c| is_word(c)) {
        i += 1;
    }
    while chars.get(i) == Some(&' ') {
        i += 1;
    }
    (chars.get(i) == Some(&'=')).then_some(i + 1)
}

/// Whether an identifier starting at `pos` runs to the end of the text (or
/// to a single trailing newline).
fn identifier_ends_text(chars: &[char], pos: usize) -> bool {
    if !chars.get(pos).is_some_and(|&c| is_ident_start(c)) {
        return false;
    }
    let mut i = pos + 1;
    while chars.get(i).is_some_and(|&c| is_word(c)) {
        i += 1;
    }
    i == chars.len() || (i + 1 == chars.len() && chars[i] == '\n')
}

/// Earliest position at or after `from`, on the same line, where `matches`
/// holds.
fn scan_line(chars: &[char], from: usize, matches: impl Fn(usize) -> bool) -> Option<usize> {
    let mut pos = from;
    loop {
        if matches(pos) {
            return Some(pos);
        }
        if pos >= chars.len() || chars[pos] == '\n' {
            return None;
        }
        pos += 1;
    }
}

/// Put every run-together assignment on its own line, then split a trailing
/// bare name off the last assignment: `a = 1 b = 2 b` becomes
/// `a = 1 \nb = 2 \nb`.
pub fn reflow(code: &str) -> String {
    let split = split_assignments(code);
    split_trailing_name(&split)
}

/// A newline before each assignment that follows another on the same line.
fn split_assignments(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    let mut out = String::with_capacity(code.len());
    let mut copied = 0;
    let mut pos = 0;

    while pos < chars.len() {
        let next = assignment_at(&chars, pos)
            .and_then(|after_eq| scan_line(&chars, after_eq, |p| assignment_at(&chars, p).is_some()));
        match next {
            Some(split_at) => {
                out.extend(&chars[copied..split_at]);
                out.push('\n');
                copied = split_at;
                pos = split_at;
            }
            None => pos += 1,
        }
    }

    out.extend(&chars[copied..]);
    out
}

/// A newline before a bare name that ends the text after an assignment.
fn split_trailing_name(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();

    for pos in 0..chars.len() {
        let split_at = assignment_at(&chars, pos)
            .and_then(|after_eq| scan_line(&chars, after_eq, |p| identifier_ends_text(&chars, p)));
        if let Some(split_at) = split_at {
            let mut out: String = chars[..split_at].iter().collect();
            out.push('\n');
            out.extend(&chars[split_at..]);
            return out;
        }
    }

    code.to_string()
}

// ── Execution ─────────────────────────────────────────────────────────────

/// Runs `generated_code` completions in a [`CodeSandbox`].
pub struct CodeExecutor {
    sandbox: Arc<dyn CodeSandbox>,
    import_whitelist: Vec<String>,
    action_space: ActionSpace,
}

impl CodeExecutor {
    pub fn new(sandbox: Arc<dyn CodeSandbox>) -> Self {
        Self {
            sandbox,
            import_whitelist: Vec::new(),
            action_space: ActionSpace::default(),
        }
    }

    pub fn with_import_whitelist(mut self, modules: Vec<String>) -> Self {
        self.import_whitelist = modules;
        self
    }

    pub fn import_whitelist(&self) -> &[String] {
        &self.import_whitelist
    }

    /// Extract and run the code in `generated`. Code that fails to extract
    /// is not run.
    pub async fn run(&self, generated: &str) -> Interpretation {
        let code = match parse_code(generated) {
            Ok(code) => code,
            Err(CodeParseError { code, message }) => {
                return Interpretation {
                    action: code,
                    outcome: ActionOutcome::ExecutionFailure(message),
                };
            }
        };

        debug!(lines = code.lines().count(), "Running generated code");
        let outcome = match self
            .sandbox
            .execute(&code, &self.import_whitelist, &self.action_space)
            .await
        {
            Ok(output) => ActionOutcome::Observation(FieldValue::Text(output)),
            Err(e) => ActionOutcome::ExecutionFailure(e.to_string()),
        };

        Interpretation {
            action: code,
            outcome,
        }
    }
}

#[async_trait]
impl ActionInterpreter for CodeExecutor {
    async fn interpret(&self, output: &Values, hop: usize) -> Interpretation {
        let generated = output
            .get(GENERATED_CODE)
            .map(ToString::to_string)
            .unwrap_or_default();
        let interpretation = self.run(&generated).await;
        if let ActionOutcome::ExecutionFailure(error) = &interpretation.outcome {
            warn!(hop, error = %error, "Generated code failed");
        }
        interpretation
    }
}
