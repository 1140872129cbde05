//! Python sandbox — runs generated code in a child interpreter.
//!
//! The child runs an embedded driver that reads one JSON request from stdin,
//! checks the code's imports against the whitelist, executes it with a
//! reduced builtins table, and writes one JSON reply to stdout. The value of
//! a trailing expression statement is the output.
//!
//! This is a containment layer for model-written code, not a security
//! boundary: it blocks imports outside the whitelist, dunder attribute
//! access, and builtins such as `open`, `eval` and `getattr`.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use hoploop_core::error::SandboxError;
use hoploop_core::sandbox::{ActionSpace, CodeSandbox};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

const DRIVER: &str = r##"
import ast, builtins, contextlib, io, json, sys

PURE_BUILTINS = [
    "abs", "all", "any", "bool", "dict", "divmod", "enumerate", "filter",
    "float", "int", "isinstance", "len", "list", "map", "max", "min", "pow",
    "range", "reversed", "round", "set", "sorted", "str", "sum", "tuple", "zip",
    "Exception", "ValueError", "TypeError", "ZeroDivisionError",
]

def reply(payload):
    sys.__stdout__.write(json.dumps(payload) + "\n")
    sys.__stdout__.flush()

def main():
    request = json.loads(sys.stdin.read())
    whitelist = set(request["imports"])
    real_import = builtins.__import__

    def guarded_import(name, globals=None, locals=None, fromlist=(), level=0):
        if level != 0 or name.split(".")[0] not in whitelist:
            raise ImportError("Import of module `%s` is not allowed" % name)
        return real_import(name, globals, locals, fromlist, level)

    names = PURE_BUILTINS + list(request["builtins"])
    safe = {n: getattr(builtins, n) for n in names if hasattr(builtins, n)}
    safe["__import__"] = guarded_import

    try:
        tree = ast.parse(request["code"], mode="exec")
    except SyntaxError as e:
        reply({"ok": False, "error": "SyntaxError: %s" % e})
        return

    for node in ast.walk(tree):
        modules = []
        if isinstance(node, ast.Import):
            modules = [alias.name for alias in node.names]
        elif isinstance(node, ast.ImportFrom):
            modules = ["." * node.level + (node.module or "")]
        for module in modules:
            if module.split(".")[0] not in whitelist:
                reply({"ok": False, "error": "Import of module `%s` is not allowed" % module, "module": module})
                return
        if isinstance(node, ast.Attribute) and node.attr.startswith("__"):
            reply({"ok": False, "error": "Access to attribute `%s` is not allowed" % node.attr})
            return

    last = None
    if tree.body and isinstance(tree.body[-1], ast.Expr):
        last = ast.Expression(tree.body.pop().value)

    env = {"__builtins__": safe, "__name__": "__sandbox__"}
    captured = io.StringIO()
    try:
        with contextlib.redirect_stdout(captured):
            exec(compile(tree, "<code>", "exec"), env)
            value = eval(compile(last, "<code>", "eval"), env) if last is not None else None
    except Exception as e:
        reply({"ok": False, "error": "%s: %s" % (type(e).__name__, e), "stdout": captured.getvalue()})
        return
    reply({"ok": True, "output": str(value), "stdout": captured.getvalue()})

main()
"##;

/// Executes code with a child Python interpreter.
pub struct PythonSandbox {
    /// Interpreter command, e.g. `["python3"]` or `["uv", "run", "python"]`.
    command: Vec<String>,
    timeout: Option<Duration>,
}

impl PythonSandbox {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.split_whitespace().map(String::from).collect(),
            timeout: None,
        }
    }

    /// Kill the interpreter if it runs longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }
}

impl Default for PythonSandbox {
    fn default() -> Self {
        Self::new("python3")
    }
}

#[derive(Debug, Deserialize)]
struct DriverReply {
    ok: bool,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    stdout: String,
}

/// Interpret the driver's stdout. The reply is the last non-empty line.
fn parse_reply(stdout: &[u8], stderr: &[u8]) -> Result<String, SandboxError> {
    let text = String::from_utf8_lossy(stdout);
    let Some(line) = text.lines().rev().find(|l| !l.trim().is_empty()) else {
        let stderr = String::from_utf8_lossy(stderr);
        return Err(SandboxError::Execution(format!(
            "interpreter produced no result: {}",
            stderr.trim()
        )));
    };

    let reply: DriverReply = serde_json::from_str(line)
        .map_err(|e| SandboxError::Execution(format!("invalid interpreter reply: {e}")))?;

    if !reply.stdout.is_empty() {
        debug!(stdout = %reply.stdout.trim_end(), "Sandboxed code printed");
    }

    match reply {
        DriverReply {
            ok: true, output, ..
        } => Ok(output.unwrap_or_default()),
        DriverReply {
            module: Some(module),
            ..
        } => Err(SandboxError::ImportNotAllowed { module }),
        DriverReply { error, .. } => Err(SandboxError::Execution(
            error.unwrap_or_else(|| "unknown interpreter error".into()),
        )),
    }
}

#[async_trait]
impl CodeSandbox for PythonSandbox {
    async fn execute(
        &self,
        code: &str,
        import_whitelist: &[String],
        action_space: &ActionSpace,
    ) -> Result<String, SandboxError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| SandboxError::Spawn("empty interpreter command".into()))?;

        let request = serde_json::json!({
            "code": code,
            "imports": import_whitelist,
            "builtins": action_space.names(),
        });

        debug!(interpreter = %program, lines = code.lines().count(), "Executing code");

        let mut child = Command::new(program)
            .args(args)
            .arg("-c")
            .arg(DRIVER)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SandboxError::Spawn(format!("{program}: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.to_string().as_bytes())
                .await
                .map_err(|e| SandboxError::Spawn(format!("failed to write to interpreter: {e}")))?;
        }

        let wait = child.wait_with_output();
        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(secs = limit.as_secs(), "Sandboxed code timed out");
                    return Err(SandboxError::Timeout {
                        secs: limit.as_secs(),
                    });
                }
            },
            None => wait.await,
        }
        .map_err(|e| SandboxError::Spawn(e.to_string()))?;

        parse_reply(&output.stdout, &output.stderr)
    }
}
