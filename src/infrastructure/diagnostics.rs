//! Diagnostic channel - out-of-band reports of soft failures
//!
//! Nothing in the bridge returns a failure to the host; instead every
//! swallowed error is reported here. Reports go to `tracing` on the
//! `pyobj::diagnostics` target, bump a process-wide counter and land in a
//! bounded history that tests and embedders can inspect.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Reports kept in the history
pub const HISTORY_CAPACITY: usize = 64;

static COUNT: AtomicU64 = AtomicU64::new(0);
static HISTORY: Lazy<Mutex<VecDeque<Diagnostic>>> =
    Lazy::new(|| Mutex::new(VecDeque::with_capacity(HISTORY_CAPACITY)));

/// One reported failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Bridge operation that failed (`"call"`, `"json.decode"`, ...)
    pub operation: &'static str,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.operation, self.message)
    }
}

/// Report a swallowed failure
pub fn report(operation: &'static str, message: impl fmt::Display) {
    let message = message.to_string();
    tracing::error!(target: "pyobj::diagnostics", operation, %message);

    COUNT.fetch_add(1, Ordering::Relaxed);
    let mut history = HISTORY.lock();
    if history.len() == HISTORY_CAPACITY {
        history.pop_front();
    }
    history.push_back(Diagnostic { operation, message });
}

/// Reports made since process start
pub fn count() -> u64 {
    COUNT.load(Ordering::Relaxed)
}

/// The most recent reports, oldest first
pub fn recent() -> Vec<Diagnostic> {
    HISTORY.lock().iter().cloned().collect()
}

/// Most recent report, if any
pub fn last() -> Option<Diagnostic> {
    HISTORY.lock().back().cloned()
}

/// Forget the history; the counter keeps running
pub fn clear() {
    HISTORY.lock().clear();
}
