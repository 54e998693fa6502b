//! `execute_javascript`: run model-written JavaScript in a sandboxed
//! interpreter process.
//!
//! Execution is off unless `[sandbox] enabled = true`. When on, each call
//! spawns the configured interpreter (`node`, version 20 or newer) with:
//! - Node's permission model switched on and read access granted to the
//!   harness file only; no writes, child processes or workers
//! - a cleared environment (only `PATH` is kept) and a fresh temporary
//!   working directory
//! - a V8 heap cap (`--max-old-space-size`)
//! - a wall-clock timeout; the child is killed when it expires
//! - a cap on stdout, enforced while reading
//!
//! Inside the process the code runs in a new `vm` context. Its `console`
//! and `demoFunctions` are built inside that context, so no host-realm
//! function is reachable from the code. The harness prints one JSON line
//! describing the outcome.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use agentflow_config::SandboxConfig;
use agentflow_core::error::ToolError;
use agentflow_core::tool::Tool;
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

const TOOL_NAME: &str = "execute_javascript";
const HARNESS_FILE: &str = "harness.js";

/// Extra wall-clock time over the in-VM timeout for process start-up.
const SPAWN_GRACE: Duration = Duration::from_millis(2000);

/// Only the tail of stderr is ever shown.
const STDERR_LIMIT: u64 = 64 * 1024;

const HARNESS: &str = r#"'use strict';
const vm = require('vm');
const timeout = Number(process.argv[2]) || 5000;

const PRELUDE = `(() => {
  const logs = [];
  const show = (a) => (typeof a === 'object' && a !== null) ? JSON.stringify(a) : String(a);
  const capture = (...args) => { logs.push(args.map(show).join(' ')); };
  globalThis.console = { log: capture, info: capture, warn: capture, error: capture };
  const demoFunctions = {
    fibonacci(n) { return n <= 1 ? n : demoFunctions.fibonacci(n - 1) + demoFunctions.fibonacci(n - 2); },
    isPrime(n) {
      if (n < 2) return false;
      for (let i = 2; i * i <= n; i++) { if (n % i === 0) return false; }
      return true;
    },
    generateRandomData(count) { return Array.from({ length: count }, () => Math.floor(Math.random() * 100)); },
  };
  globalThis.demoFunctions = demoFunctions;
  return () => JSON.stringify(logs);
})()`;

const toJson = (v) => {
  if (v === undefined) return null;
  try {
    const s = JSON.stringify(v);
    return s === undefined ? String(v) : JSON.parse(s);
  } catch (_) {
    return String(v);
  }
};

let src = '';
process.stdin.setEncoding('utf8');
process.stdin.on('data', chunk => { src += chunk; });
process.stdin.on('end', () => {
  let out;
  try {
    const context = vm.createContext(Object.create(null));
    const readLogs = vm.runInContext(PRELUDE, context);
    const result = vm.runInContext(src, context, { timeout, filename: 'agent.js' });
    out = { result: toJson(result), logs: JSON.parse(readLogs()), success: true };
  } catch (e) {
    out = { error: (e && typeof e.message === 'string') ? e.message : String(e), success: false };
  }
  process.stdout.write(JSON.stringify(out) + '\n');
});
"#;

/// The flag that turns on Node's permission model, by interpreter version.
///
/// `None` when the version predates the permission model or is unreadable.
fn permission_flag_for(version: &str) -> Option<&'static str> {
    let mut parts = version.trim().trim_start_matches('v').split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = parts.next().and_then(|m| m.parse().ok()).unwrap_or(0);
    match (major, minor) {
        (0..=19, _) => None,
        (20 | 21, _) | (22, 0..=12) | (23, 0..=4) => Some("--experimental-permission"),
        _ => Some("--permission"),
    }
}

async fn detect_permission_flag(interpreter: &str) -> Option<&'static str> {
    let output = Command::new(interpreter)
        .arg("--version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .ok()?;
    permission_flag_for(&String::from_utf8_lossy(&output.stdout))
}

async fn read_capped<R: AsyncRead + Unpin>(reader: Option<R>, limit: u64) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(reader) = reader {
        reader.take(limit).read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

enum Collected {
    Done {
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        status: ExitStatus,
    },
    OverLimit,
}

/// Read the child's output, stopping as soon as stdout passes `cap`.
async fn collect(child: &mut Child, cap: usize) -> std::io::Result<Collected> {
    let stderr_task = tokio::spawn(read_capped(child.stderr.take(), STDERR_LIMIT));
    let stdout = read_capped(child.stdout.take(), cap as u64 + 1).await?;
    if stdout.len() > cap {
        stderr_task.abort();
        return Ok(Collected::OverLimit);
    }
    let status = child.wait().await?;
    let stderr = stderr_task.await.map_err(std::io::Error::other)??;
    Ok(Collected::Done {
        stdout,
        stderr,
        status,
    })
}

pub struct JavaScriptTool {
    config: SandboxConfig,
    permission_flag: OnceCell<Option<&'static str>>,
}

impl JavaScriptTool {
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            config,
            permission_flag: OnceCell::new(),
        }
    }

    fn failed(code: &str, error: impl Into<String>) -> Value {
        json!({ "code": code, "error": error.into(), "success": false })
    }

    fn execution_failed(reason: impl Into<String>) -> ToolError {
        ToolError::ExecutionFailed {
            tool_name: TOOL_NAME.into(),
            reason: reason.into(),
        }
    }

    /// Detected once per tool; refuses to run without a permission model.
    async fn permission_flag(&self) -> std::result::Result<&'static str, ToolError> {
        self.permission_flag
            .get_or_init(|| detect_permission_flag(&self.config.interpreter))
            .await
            .ok_or_else(|| {
                Self::execution_failed(format!(
                    "cannot sandbox with '{}': Node.js 20 or newer is required",
                    self.config.interpreter
                ))
            })
    }

    fn command(&self, permission_flag: &str, workdir: &Path) -> Command {
        let mut command = Command::new(&self.config.interpreter);
        command
            .arg(permission_flag)
            .arg(format!("--allow-fs-read={}", workdir.join(HARNESS_FILE).display()))
            .arg(format!("--max-old-space-size={}", self.config.max_memory_mb))
            .arg(HARNESS_FILE)
            .arg(self.config.timeout_ms.to_string())
            .current_dir(workdir)
            .env_clear()
            .env("PATH", std::env::var_os("PATH").unwrap_or_default())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    async fn run(&self, code: &str) -> std::result::Result<Value, ToolError> {
        let permission_flag = self.permission_flag().await?;

        let workdir = tempfile::tempdir()
            .map_err(|e| Self::execution_failed(format!("cannot create sandbox directory: {e}")))?;
        tokio::fs::write(workdir.path().join(HARNESS_FILE), HARNESS)
            .await
            .map_err(|e| Self::execution_failed(format!("cannot write sandbox harness: {e}")))?;

        debug!(
            interpreter = %self.config.interpreter,
            timeout_ms = self.config.timeout_ms,
            bytes = code.len(),
            "Spawning JavaScript sandbox"
        );

        let mut child = self
            .command(permission_flag, workdir.path())
            .spawn()
            .map_err(|e| {
                Self::execution_failed(format!("cannot start '{}': {e}", self.config.interpreter))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(code.as_bytes()).await {
                warn!(error = %e, "Failed to send code to sandbox");
            }
            // Closing stdin lets the harness start
            drop(stdin);
        }

        let limit = Duration::from_millis(self.config.timeout_ms) + SPAWN_GRACE;
        let collected = tokio::time::timeout(limit, collect(&mut child, self.config.max_output_bytes)).await;
        let (stdout, stderr, status) = match collected {
            Ok(Ok(Collected::Done {
                stdout,
                stderr,
                status,
            })) => (stdout, stderr, status),
            Ok(Ok(Collected::OverLimit)) => {
                let _ = child.kill().await;
                warn!(limit = self.config.max_output_bytes, "JavaScript sandbox output over limit");
                return Ok(Self::failed(
                    code,
                    format!("Output exceeded {} bytes", self.config.max_output_bytes),
                ));
            }
            Ok(Err(e)) => return Err(Self::execution_failed(e.to_string())),
            Err(_) => {
                let _ = child.kill().await;
                warn!(timeout_ms = self.config.timeout_ms, "JavaScript sandbox timed out");
                return Ok(Self::failed(
                    code,
                    format!("Execution timed out after {} ms", self.config.timeout_ms),
                ));
            }
        };

        let stdout = String::from_utf8_lossy(&stdout);
        let report = stdout
            .lines()
            .rev()
            .find_map(|line| serde_json::from_str::<Value>(line).ok())
            .filter(Value::is_object);

        match report {
            Some(mut report) => {
                if let Some(obj) = report.as_object_mut() {
                    obj.insert("code".into(), Value::String(code.to_string()));
                    if obj.get("success") == Some(&Value::Bool(false)) {
                        obj.remove("logs");
                        obj.remove("result");
                    }
                }
                Ok(report)
            }
            None => {
                let stderr = String::from_utf8_lossy(&stderr);
                let detail = stderr
                    .lines()
                    .rev()
                    .find(|l| !l.trim().is_empty())
                    .map(str::trim)
                    .map(String::from)
                    .unwrap_or_else(|| format!("interpreter exited with {status}"));
                warn!(status = %status, "JavaScript sandbox produced no report");
                Ok(Self::failed(code, detail))
            }
        }
    }
}

#[async_trait]
impl Tool for JavaScriptTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Execute JavaScript code in an isolated sandbox and return the result and console output"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "The JavaScript code to execute"
                }
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, arguments: Value) -> std::result::Result<Value, ToolError> {
        let code = arguments["code"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'code' argument".into()))?;

        if !self.config.enabled {
            return Err(ToolError::PermissionDenied {
                tool_name: TOOL_NAME.into(),
                reason: "code execution is disabled; set [sandbox] enabled = true".into(),
            });
        }

        self.run(code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> SandboxConfig {
        SandboxConfig {
            enabled: true,
            timeout_ms: 1000,
            ..Default::default()
        }
    }

    /// A `node` on PATH that supports the permission model.
    fn sandbox_available() -> bool {
        std::process::Command::new("node")
            .arg("--version")
            .stderr(Stdio::null())
            .output()
            .ok()
            .filter(|o| o.status.success())
            .and_then(|o| permission_flag_for(&String::from_utf8_lossy(&o.stdout)))
            .is_some()
    }

    #[test]
    fn permission_flag_by_version() {
        assert_eq!(permission_flag_for("v18.19.0\n"), None);
        assert_eq!(permission_flag_for("v20.11.1"), Some("--experimental-permission"));
        assert_eq!(permission_flag_for("v22.12.0"), Some("--experimental-permission"));
        assert_eq!(permission_flag_for("v22.13.0"), Some("--permission"));
        assert_eq!(permission_flag_for("v23.4.0"), Some("--experimental-permission"));
        assert_eq!(permission_flag_for("v24.1.0"), Some("--permission"));
        assert_eq!(permission_flag_for("not a version"), None);
    }

    #[test]
    fn command_grants_only_harness_read() {
        let tool = JavaScriptTool::new(enabled());
        let dir = Path::new("/tmp/agentflow-sandbox");
        let command = tool.command("--permission", dir);
        let args: Vec<String> = command
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(args[0], "--permission");
        assert_eq!(args[1], "--allow-fs-read=/tmp/agentflow-sandbox/harness.js");
        assert!(!args.iter().any(|a| a.starts_with("--allow-fs-write")));
        assert!(!args.iter().any(|a| a.starts_with("--allow-child-process")));
        assert_eq!(args[2], "--max-old-space-size=64");
        assert_eq!(args[3], HARNESS_FILE);
    }

    #[tokio::test]
    async fn disabled_sandbox_refuses() {
        let tool = JavaScriptTool::new(SandboxConfig::default());
        let err = tool.execute(json!({"code": "1 + 1"})).await.unwrap_err();
        assert!(matches!(err, ToolError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn missing_code_is_rejected() {
        let tool = JavaScriptTool::new(enabled());
        assert!(matches!(
            tool.execute(json!({})).await,
            Err(ToolError::InvalidArguments(_))
        ));
    }

    #[tokio::test]
    async fn missing_interpreter_is_an_execution_failure() {
        let tool = JavaScriptTool::new(SandboxConfig {
            interpreter: "agentflow-no-such-interpreter".into(),
            ..enabled()
        });
        let err = tool.execute(json!({"code": "1"})).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }

    #[tokio::test]
    async fn captures_console_and_result() {
        if !sandbox_available() {
            return;
        }
        let tool = JavaScriptTool::new(enabled());
        let out = tool
            .execute(json!({"code": "console.log('sum', {a: 1}); demoFunctions.fibonacci(10)"}))
            .await
            .unwrap();

        assert_eq!(out["success"], true);
        assert_eq!(out["result"], 55);
        assert_eq!(out["logs"], json!(["sum {\"a\":1}"]));
        assert!(out["code"].as_str().unwrap().contains("fibonacci"));
    }

    #[tokio::test]
    async fn script_errors_are_reported_not_raised() {
        if !sandbox_available() {
            return;
        }
        let tool = JavaScriptTool::new(enabled());
        let out = tool.execute(json!({"code": "throw new Error('boom')"})).await.unwrap();
        assert_eq!(out["success"], false);
        assert_eq!(out["error"], "boom");
    }

    #[tokio::test]
    async fn host_capabilities_are_not_exposed() {
        if !sandbox_available() {
            return;
        }
        let tool = JavaScriptTool::new(enabled());
        let out = tool.execute(json!({"code": "require('fs')"})).await.unwrap();
        assert_eq!(out["success"], false);
        assert!(out["error"].as_str().unwrap().contains("require"));

        let out = tool.execute(json!({"code": "typeof process"})).await.unwrap();
        assert_eq!(out["result"], "undefined");

        // Function constructors reachable from the context stay in its realm
        for code in [
            "console.log.constructor('return process')().mainModule.require('fs').readFileSync('/etc/hostname', 'utf8')",
            "demoFunctions.isPrime.constructor('return process')().mainModule.require('fs').readFileSync('/etc/hostname', 'utf8')",
            "this.constructor.constructor('return process')().mainModule.require('fs').readFileSync('/etc/hostname', 'utf8')",
        ] {
            let out = tool.execute(json!({ "code": code })).await.unwrap();
            assert_eq!(out["success"], false, "escaped with: {code}");
            assert!(out.get("result").is_none());
        }
    }

    #[tokio::test]
    async fn interpreter_cannot_read_host_files() {
        if !sandbox_available() {
            return;
        }
        // Even host-realm code is bound by the permission model
        let tool = JavaScriptTool::new(enabled());
        let workdir = tempfile::tempdir().unwrap();
        let script = workdir.path().join(HARNESS_FILE);
        std::fs::write(
            &script,
            "try { require('fs').readFileSync('/etc/hostname'); console.log('read'); } \
             catch (e) { console.log(e.code); }",
        )
        .unwrap();

        let flag = tool.permission_flag().await.unwrap();
        let output = tool
            .command(flag, workdir.path())
            .stdin(Stdio::null())
            .output()
            .await
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "ERR_ACCESS_DENIED");
    }

    #[tokio::test]
    async fn output_cap_is_enforced() {
        if !sandbox_available() {
            return;
        }
        let tool = JavaScriptTool::new(SandboxConfig {
            max_output_bytes: 256,
            ..enabled()
        });
        let out = tool
            .execute(json!({"code": "console.log('x'.repeat(100000)); 1"}))
            .await
            .unwrap();
        assert_eq!(out["success"], false);
        assert_eq!(out["error"], "Output exceeded 256 bytes");
    }

    #[tokio::test]
    async fn runaway_loops_are_stopped() {
        if !sandbox_available() {
            return;
        }
        let tool = JavaScriptTool::new(SandboxConfig {
            timeout_ms: 200,
            ..enabled()
        });
        let out = tool.execute(json!({"code": "while (true) {}"})).await.unwrap();
        assert_eq!(out["success"], false);
    }
}
