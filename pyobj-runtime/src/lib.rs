//! pyobj runtime - dynamically typed, reference-counted object runtime
//!
//! This crate is the foreign side of the `pyobj` handle layer. It owns a
//! process-wide object heap guarded by a global execution lock, and exposes
//! a narrow, C-API-like surface in [`api`] that works on raw [`ObjRef`]s.
//!
//! Design:
//! 1. Objects live in an index-based heap with explicit refcounts
//! 2. Every `api` function returning an `ObjRef` hands out a new reference
//! 3. Failures are values ([`RuntimeError`]), never panics
//! 4. A Python-subset evaluator backs `eval`/`exec`

pub mod api;
pub mod logging;

mod builtins;
mod error;
mod eval;
mod file;
mod heap;
mod interp;
mod json;
mod methods;
mod object;
mod ops;
mod state;
mod strings;
mod table;

pub use error::{ExcKind, RtResult, RuntimeError};
pub use heap::ObjRef;
pub use object::ObjectType;
pub use ops::{BinaryOp, CompareOp};
pub use state::{epoch, init, is_initialized, shutdown, RuntimeStats};
