//! Runtime lifecycle - the process-wide interpreter and its execution lock
//!
//! Design:
//! 1. One interpreter per process, behind a reentrant global lock
//! 2. `init`/`shutdown` are idempotent; each `init` after a shutdown starts
//!    a new epoch, so references from an older runtime are rejected
//! 3. Cycle collection runs when an api call completes, never mid-evaluation

use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicU32, Ordering};

use once_cell::sync::Lazy;
use parking_lot::ReentrantMutex;

use crate::error::{ExcKind, RtResult, RuntimeError};
use crate::file;
use crate::interp::Interpreter;
use crate::logging::{log_runtime_init, log_runtime_shutdown, warn};

static RUNTIME: Lazy<ReentrantMutex<RefCell<Option<Interpreter>>>> =
    Lazy::new(|| ReentrantMutex::new(RefCell::new(None)));

/// Epoch handed to the next runtime created by `init`
static NEXT_EPOCH: AtomicU32 = AtomicU32::new(1);

thread_local! {
    /// Api calls made from this thread, across every epoch
    static THREAD_CALLS: Cell<u64> = Cell::new(0);
}

/// Counters describing the current runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuntimeStats {
    /// Calls into runtime callables (all threads)
    pub calls: u64,
    /// Api calls made from the calling thread
    pub thread_calls: u64,
    /// Objects allocated since init
    pub allocations: u64,
    pub live_objects: usize,
    /// Open file objects, across every epoch
    pub open_files: usize,
    /// Cycle collections run since init
    pub collections: u64,
    pub epoch: u32,
}

/// Start the runtime; does nothing when it is already running
pub fn init() -> RtResult<u32> {
    let guard = RUNTIME.lock();
    let mut slot = guard
        .try_borrow_mut()
        .map_err(|_| RuntimeError::new(ExcKind::SystemError, "runtime is busy"))?;
    if let Some(interp) = slot.as_ref() {
        return Ok(interp.epoch());
    }
    let epoch = NEXT_EPOCH.fetch_add(1, Ordering::Relaxed);
    log_runtime_init(epoch);
    *slot = Some(Interpreter::new(epoch)?);
    Ok(epoch)
}

/// Stop the runtime and free every object it owns
pub fn shutdown() {
    let guard = RUNTIME.lock();
    let Ok(mut slot) = guard.try_borrow_mut() else {
        warn!("shutdown requested while the runtime is executing; ignored");
        return;
    };
    if let Some(interp) = slot.take() {
        log_runtime_shutdown(interp.epoch(), interp.heap.live());
        drop(interp);
        let open = file::open_files();
        if open > 0 {
            warn!(open_files = open, "file objects still open after shutdown");
        }
    }
}

pub fn is_initialized() -> bool {
    let guard = RUNTIME.lock();
    // Borrowed mutably means a call is in flight on this thread
    let running = guard.try_borrow().map_or(true, |slot| slot.is_some());
    running
}

/// Epoch of the running runtime
pub fn epoch() -> Option<u32> {
    let guard = RUNTIME.lock();
    let epoch = guard
        .try_borrow()
        .ok()
        .and_then(|slot| slot.as_ref().map(Interpreter::epoch));
    epoch
}

/// Run `f` against the interpreter under the execution lock
pub(crate) fn with<R>(f: impl FnOnce(&mut Interpreter) -> RtResult<R>) -> RtResult<R> {
    THREAD_CALLS.with(|calls| calls.set(calls.get() + 1));
    let guard = RUNTIME.lock();
    let mut slot = guard
        .try_borrow_mut()
        .map_err(|_| RuntimeError::new(ExcKind::SystemError, "runtime re-entered during a call"))?;
    let interp = slot.as_mut().ok_or_else(RuntimeError::not_initialized)?;
    let result = f(interp);
    interp.maybe_collect();
    result
}

pub(crate) fn stats() -> RtResult<RuntimeStats> {
    let thread_calls = THREAD_CALLS.with(Cell::get);
    with(|interp| {
        Ok(RuntimeStats {
            calls: interp.calls,
            thread_calls,
            allocations: interp.heap.allocations(),
            live_objects: interp.heap.live(),
            open_files: file::open_files(),
            collections: interp.collections,
            epoch: interp.epoch(),
        })
    })
}
