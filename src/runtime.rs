//! Candidate loading and invocation
//!
//! The orchestrator never touches generated code directly; it goes through
//! the [`CandidateRuntime`] seam so the execution mechanism stays swappable
//! (and so the loop is testable without a live interpreter). The production
//! implementation writes the candidate to disk and drives a Python subprocess
//! per invocation, each under a wall-clock timeout.

use crate::util::{self, run_with_timeout};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Fixed file name the candidate source is persisted to before loading.
pub const CANDIDATE_FILE: &str = "generated_code.py";

/// A loaded candidate, ready for invocation.
#[derive(Debug, Clone)]
pub struct ModuleHandle {
    path: PathBuf,
}

impl ModuleHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The candidate failed to parse, compile, or load.
#[derive(Debug, Clone)]
pub struct LoadFault {
    pub message: String,
}

/// Outcome of a single candidate invocation.
#[derive(Debug, Clone)]
pub enum Invocation {
    /// The call returned a value
    Returned(Value),
    /// The call failed with an exception
    Raised { kind: String, message: String },
    /// The invocation itself broke down (timeout, I/O trouble, garbled output)
    Fault(String),
}

/// Narrow interface between the loop and whatever executes candidates.
pub trait CandidateRuntime {
    /// Persist and load candidate source, or explain why it cannot be loaded.
    fn load(&self, source: &str) -> Result<ModuleHandle, LoadFault>;

    /// Call `function(args...)` against a loaded candidate.
    ///
    /// Must never panic on candidate misbehavior; anything that goes wrong
    /// comes back as `Raised` or `Fault`.
    fn invoke(&self, handle: &ModuleHandle, function: &str, args: &[Value]) -> Invocation;
}

/// Driver executed per invocation. Loads the candidate file, calls the named
/// function with JSON-decoded args, and prints a one-line JSON envelope:
/// `{"ok": value}` or `{"raised": kind, "message": text}`.
const INVOKE_DRIVER: &str = r#"
import importlib.util, json, sys

def main():
    path, name, raw_args = sys.argv[1], sys.argv[2], sys.argv[3]
    spec = importlib.util.spec_from_file_location("generated_code", path)
    module = importlib.util.module_from_spec(spec)
    try:
        spec.loader.exec_module(module)
        func = getattr(module, name)
        result = func(*json.loads(raw_args))
    except Exception as exc:
        print(json.dumps({"raised": type(exc).__name__, "message": str(exc)}))
        return
    try:
        payload = json.dumps({"ok": result})
    except (TypeError, ValueError):
        payload = json.dumps({"ok": repr(result)})
    print(payload)

main()
"#;

/// Runs candidates as Python subprocesses.
pub struct PythonRuntime {
    work_dir: PathBuf,
    python: String,
    case_timeout: Duration,
}

impl PythonRuntime {
    pub fn new(work_dir: impl Into<PathBuf>, python: impl Into<String>, case_timeout: Duration) -> Self {
        Self {
            work_dir: work_dir.into(),
            python: python.into(),
            case_timeout,
        }
    }

    fn candidate_path(&self) -> PathBuf {
        self.work_dir.join(CANDIDATE_FILE)
    }
}

impl CandidateRuntime for PythonRuntime {
    fn load(&self, source: &str) -> Result<ModuleHandle, LoadFault> {
        if let Err(e) = std::fs::create_dir_all(&self.work_dir) {
            return Err(LoadFault {
                message: format!("Failed to create work dir: {}", e),
            });
        }
        let path = self.candidate_path();
        if let Err(e) = std::fs::write(&path, source) {
            return Err(LoadFault {
                message: format!("Failed to write candidate: {}", e),
            });
        }

        // Syntax gate before any invocation; a candidate that does not
        // compile is a load fault, not a per-case failure.
        let mut cmd = Command::new(&self.python);
        cmd.args(["-m", "py_compile"]).arg(&path);
        match run_with_timeout(&mut cmd, self.case_timeout) {
            Ok(output) if output.success() => Ok(ModuleHandle::new(path)),
            Ok(output) if output.timed_out => Err(LoadFault {
                message: "Compile check timed out".to_string(),
            }),
            Ok(output) => Err(LoadFault {
                message: util::truncate(output.stderr.trim(), 500),
            }),
            Err(e) => Err(LoadFault { message: e }),
        }
    }

    fn invoke(&self, handle: &ModuleHandle, function: &str, args: &[Value]) -> Invocation {
        let raw_args = match serde_json::to_string(args) {
            Ok(s) => s,
            Err(e) => return Invocation::Fault(format!("Failed to encode args: {}", e)),
        };

        let mut cmd = Command::new(&self.python);
        cmd.arg("-c")
            .arg(INVOKE_DRIVER)
            .arg(handle.path())
            .arg(function)
            .arg(raw_args);

        let output = match run_with_timeout(&mut cmd, self.case_timeout) {
            Ok(output) => output,
            Err(e) => return Invocation::Fault(e),
        };

        if output.timed_out {
            return Invocation::Fault(format!(
                "execution timed out after {}s",
                self.case_timeout.as_secs()
            ));
        }

        // The envelope is the last stdout line; candidates are free to print
        // their own noise above it.
        let envelope = output.stdout.lines().rev().find(|l| !l.trim().is_empty());
        let Some(line) = envelope else {
            return Invocation::Fault(format!(
                "no result from interpreter: {}",
                util::truncate(output.stderr.trim(), 300)
            ));
        };

        match serde_json::from_str::<Value>(line.trim()) {
            Ok(Value::Object(map)) => {
                if let Some(value) = map.get("ok") {
                    Invocation::Returned(value.clone())
                } else if let Some(kind) = map.get("raised").and_then(Value::as_str) {
                    Invocation::Raised {
                        kind: kind.to_string(),
                        message: map
                            .get("message")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                    }
                } else {
                    Invocation::Fault(format!("unexpected envelope: {}", util::truncate(line, 200)))
                }
            }
            _ => Invocation::Fault(format!(
                "unparsable interpreter output: {}",
                util::truncate(line, 200)
            )),
        }
    }
}
