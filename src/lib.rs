//! pyobj - safe host-side handles over a dynamically typed object runtime
//!
//! A [`Handle`] owns exactly one reference to a runtime object and releases
//! it on drop. Typed views ([`Text`], [`List`], [`Tuple`], [`Dict`], [`Set`])
//! wrap a handle with the operations of one kind; calls, execution, JSON and
//! formatting sit on top.
//!
//! Design:
//! 1. Operations never panic on runtime failure; they report to
//!    [`infrastructure::diagnostics`] and return an empty or default value
//! 2. `Kind` is resolved in one place ([`Kind::of`]) and drives every
//!    kind-gated conversion
//! 3. The runtime is started and stopped explicitly by the host
//!
//! ```ignore
//! pyobj::init();
//! let xs = pyobj::list![3, 1, 2];
//! xs.sort();
//! assert_eq!(xs.to_string(), "[1, 2, 3]");
//! pyobj::shutdown();
//! ```

pub mod call;
pub mod config;
pub mod core;
pub mod exec;
pub mod format;
pub mod infrastructure;
pub mod json;
pub mod present;
pub mod views;

pub use crate::call::{all, any, builtin, call, map, Arg, Kwargs};
pub use crate::config::Config;
pub use crate::core::{Handle, Kind};
pub use crate::exec::ExecError;
pub use crate::format::{farg, format, FormatArg};
pub use crate::present::{pretty_print, pretty_print_indent, type_name};
pub use crate::views::{Dict, List, Set, Text, Tuple, View};

use tracing_appender::non_blocking::WorkerGuard;

use crate::infrastructure::{diagnostics, init_logging, LogConfig};

/// Start the runtime; returns whether it is running afterwards
pub fn init() -> bool {
    match pyobj_runtime::init() {
        Ok(epoch) => {
            tracing::debug!(epoch, "runtime ready");
            true
        }
        Err(err) => {
            diagnostics::report("init", err);
            false
        }
    }
}

/// Install `config` process-wide, set up logging from its `[logging]`
/// section, then start the runtime
///
/// Keep the returned guard alive while logging to a file; dropping it
/// flushes and stops the background writer. Whether the runtime came up
/// is available from [`is_initialized`].
pub fn init_with_config(config: &Config) -> Option<WorkerGuard> {
    config::set(config.clone());
    let guard = init_logging(LogConfig::from_settings(&config.logging));
    init();
    guard
}

/// Stop the runtime; handles still alive become inert
pub fn shutdown() {
    pyobj_runtime::shutdown();
}

pub fn is_initialized() -> bool {
    pyobj_runtime::is_initialized()
}
