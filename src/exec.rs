//! Code execution bridge - evaluate expressions, run programs, harvest bindings
//!
//! Every call runs in a fresh namespace that is dropped afterwards. The
//! plain forms report failures to the diagnostic channel and hand back an
//! empty result, so "failed" and "bound nothing" look alike. The `try_`
//! forms return the failure instead.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use pyobj_runtime::{api, ExcKind, RuntimeError};
use tracing::debug;

use crate::config;
use crate::core::Handle;
use crate::infrastructure::diagnostics;
use crate::views::Dict;

/// Namespace metadata never returned as a binding
pub const RESERVED_NAMES: [&str; 7] = [
    "__builtins__",
    "__name__",
    "__doc__",
    "__file__",
    "__package__",
    "__loader__",
    "__spec__",
];

/// Why an execution produced no result
#[derive(Debug, Clone, PartialEq)]
pub enum ExecError {
    /// `pyobj::init` has not run
    NotInitialized,
    /// The program file could not be read
    Io { path: PathBuf, message: String },
    /// Compilation or execution raised
    Runtime(RuntimeError),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "runtime is not initialized"),
            Self::Io { path, message } => write!(f, "cannot read {}: {}", path.display(), message),
            Self::Runtime(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ExecError {}

impl From<RuntimeError> for ExecError {
    fn from(err: RuntimeError) -> Self {
        ExecError::Runtime(err)
    }
}

/// Whether `name` is stripped from execution results
pub fn is_reserved(name: &str) -> bool {
    name.is_empty()
        || RESERVED_NAMES.contains(&name)
        || config::current()
            .exec
            .extra_reserved_names
            .iter()
            .any(|extra| extra == name)
}

fn ensure_initialized() -> Result<(), ExecError> {
    if pyobj_runtime::is_initialized() {
        Ok(())
    } else {
        Err(ExecError::NotInitialized)
    }
}

/// Evaluate one expression
pub fn try_eval(expr: &str) -> Result<Handle, ExecError> {
    ensure_initialized()?;
    Ok(Handle::from_owned(api::eval(expr)?))
}

/// Run `program` and return its top-level bindings
pub fn try_exec_result(program: &str) -> Result<Dict, ExecError> {
    ensure_initialized()?;
    let filename = config::current().exec.filename.clone();
    run_program(program, &filename)
}

/// Read and run the program at `path`, returning its top-level bindings
pub fn try_run_file_result(path: impl AsRef<Path>) -> Result<Dict, ExecError> {
    ensure_initialized()?;
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|e| ExecError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    run_program(&source, &path.to_string_lossy())
}

fn run_program(source: &str, filename: &str) -> Result<Dict, ExecError> {
    debug!(filename, bytes = source.len(), "executing program");
    let namespace = Handle::from_owned(api::exec(source, filename)?);
    Ok(harvest(&namespace))
}

/// Copy the non-reserved text-keyed bindings of `namespace` into a new dict
fn harvest(namespace: &Handle) -> Dict {
    let bindings = Dict::new();
    let entries = namespace.query("exec.harvest", Vec::new(), api::dict_items);
    for (key, value) in entries {
        let (key, value) = (Handle::from_owned(key), Handle::from_owned(value));
        match key.as_string() {
            Some(name) if !is_reserved(&name) => {
                bindings.add(key, value);
            }
            _ => {}
        }
    }
    bindings
}

fn soft<T>(op: &'static str, result: Result<T, ExecError>, default: impl FnOnce() -> T) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            diagnostics::report(op, err);
            default()
        }
    }
}

/// Evaluate one expression in a fresh namespace; empty on failure
pub fn eval(expr: &str) -> Handle {
    soft("eval", try_eval(expr), Handle::empty)
}

/// Run `program` for its effects; returns whether it completed
pub fn exec(program: &str) -> bool {
    soft("exec", try_exec_result(program).map(|_| true), || false)
}

/// Run `program`; bindings it created, or an empty dict on failure
pub fn exec_result(program: &str) -> Dict {
    soft("exec", try_exec_result(program), Dict::new)
}

/// Run the program at `path` for its effects; returns whether it completed
pub fn run_file(path: impl AsRef<Path>) -> bool {
    soft("run_file", try_run_file_result(path).map(|_| true), || false)
}

/// Run the program at `path`; its bindings, or an empty dict on failure
pub fn run_file_result(path: impl AsRef<Path>) -> Dict {
    soft("run_file", try_run_file_result(path), Dict::new)
}

impl ExecError {
    /// Runtime exception class, for `Runtime` failures
    pub fn exception_kind(&self) -> Option<ExcKind> {
        match self {
            Self::Runtime(err) => Some(err.kind()),
            _ => None,
        }
    }
}
