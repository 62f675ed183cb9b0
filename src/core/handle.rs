//! Object handle - owns exactly one reference to one runtime object
//!
//! Design:
//! 1. `Handle` is the only type in this crate that increments or decrements
//!    runtime refcounts on behalf of host code
//! 2. Clone increments, Drop decrements, a Rust move transfers
//! 3. An empty handle is a valid inert value; every operation accepts it
//! 4. Runtime failures become a diagnostic plus a default result

use std::cmp::Ordering;
use std::fmt;

use pyobj_runtime::{api, CompareOp, ExcKind, ObjRef, RtResult, RuntimeError};
use smallvec::SmallVec;

use super::kind::Kind;
use crate::infrastructure::diagnostics;

pub struct Handle {
    raw: Option<ObjRef>,
}

impl Handle {
    /// Take a counted share of `raw`, which stays owned by its current holder
    pub fn acquire(raw: Option<ObjRef>) -> Self {
        let Some(raw) = raw else {
            return Self::empty();
        };
        match api::incref(raw) {
            Ok(()) => Self { raw: Some(raw) },
            Err(err) => {
                diagnostics::report("acquire", err);
                Self::empty()
            }
        }
    }

    /// Adopt a new reference returned by the runtime, without incrementing
    pub fn from_owned(raw: ObjRef) -> Self {
        Self { raw: Some(raw) }
    }

    pub const fn empty() -> Self {
        Self { raw: None }
    }

    /// The runtime's `None`
    pub fn none() -> Self {
        Self::from_result("none", api::new_none())
    }

    /// Move the reference out, leaving `self` empty
    pub fn take(&mut self) -> Self {
        Self { raw: self.raw.take() }
    }

    pub(crate) fn raw(&self) -> Option<ObjRef> {
        self.raw
    }

    /// The raw reference, or an error naming the empty handle
    pub(crate) fn require(&self) -> RtResult<ObjRef> {
        self.raw
            .ok_or_else(|| RuntimeError::new(ExcKind::ValueError, "empty handle"))
    }

    /// Adopt a runtime result, reporting a failure under `op`
    pub(crate) fn from_result(op: &'static str, result: RtResult<ObjRef>) -> Self {
        match result {
            Ok(raw) => Self::from_owned(raw),
            Err(err) => {
                diagnostics::report(op, err);
                Self::empty()
            }
        }
    }

    /// Run `f` on the raw reference; empty handles yield `default` quietly
    pub(crate) fn query<R>(
        &self,
        op: &'static str,
        default: R,
        f: impl FnOnce(ObjRef) -> RtResult<R>,
    ) -> R {
        let Some(raw) = self.raw else {
            return default;
        };
        match f(raw) {
            Ok(value) => value,
            Err(err) => {
                diagnostics::report(op, err);
                default
            }
        }
    }

    /// Like `query`, for operations producing a new object
    pub(crate) fn produce(&self, op: &'static str, f: impl FnOnce(ObjRef) -> RtResult<ObjRef>) -> Handle {
        match self.raw {
            Some(raw) => Self::from_result(op, f(raw)),
            None => Self::empty(),
        }
    }

    /// Call a runtime method with handle arguments
    pub(crate) fn invoke(&self, op: &'static str, name: &str, args: &[&Handle]) -> Handle {
        self.produce(op, |raw| {
            let packed = Packed::new(args.iter().copied())?;
            api::call_method(raw, name, packed.as_slice(), &[])
        })
    }

    /// Call a runtime method for its side effect; returns whether it succeeded
    pub(crate) fn invoke_discard(&self, op: &'static str, name: &str, args: &[&Handle]) -> bool {
        !self.invoke(op, name, args).is_null()
    }

    /// No reference held
    pub fn is_null(&self) -> bool {
        self.raw.is_none()
    }

    /// Null, or text/list/dict/set of length zero
    pub fn is_empty(&self) -> bool {
        if self.is_null() {
            return true;
        }
        self.kind().is_sized() && self.len() == 0
    }

    pub fn kind(&self) -> Kind {
        Kind::of(self)
    }

    /// Runtime refcount of the object, 0 for an empty handle
    pub fn refcount(&self) -> usize {
        self.query("refcount", 0, api::refcount)
    }

    /// Both handles refer to the same object (`is`)
    pub fn is_same(&self, other: &Handle) -> bool {
        self.raw.is_some() && self.raw == other.raw
    }

    pub fn is_callable(&self) -> bool {
        self.query("is_callable", false, api::is_callable)
    }

    /// Runtime length; 0 for objects without one
    pub fn len(&self) -> usize {
        match self.kind() {
            Kind::Text | Kind::List | Kind::Tuple | Kind::Dict | Kind::Set => {
                self.query("len", 0, api::len)
            }
            _ => 0,
        }
    }

    /// Runtime truthiness; an empty handle is false
    pub fn is_truthy(&self) -> bool {
        self.query("is_truthy", false, api::is_truthy)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.kind() {
            Kind::Int | Kind::Bool => self.query("as_i64", None, |raw| api::as_int(raw).map(Some)),
            _ => None,
        }
    }

    /// Float value; ints widen
    pub fn as_f64(&self) -> Option<f64> {
        match self.kind() {
            Kind::Int | Kind::Bool | Kind::Float => {
                self.query("as_f64", None, |raw| api::as_float(raw).map(Some))
            }
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind() {
            Kind::Bool => self.query("as_bool", None, |raw| api::as_bool(raw).map(Some)),
            _ => None,
        }
    }

    /// Text payload; `None` unless the object is text
    pub fn as_string(&self) -> Option<String> {
        match self.kind() {
            Kind::Text => self.query("as_string", None, |raw| api::as_str(raw).map(Some)),
            _ => None,
        }
    }

    /// Runtime `str()`
    pub fn to_text(&self) -> String {
        if self.is_null() {
            return "None".to_string();
        }
        self.query("str", String::new(), api::str)
    }

    /// Runtime `repr()`
    pub fn repr(&self) -> String {
        if self.is_null() {
            return "None".to_string();
        }
        self.query("repr", String::new(), api::repr)
    }

    /// Attribute lookup; methods come back bound to this object
    pub fn getattr(&self, name: &str) -> Handle {
        self.produce("getattr", |raw| api::getattr(raw, name))
    }

    fn compare(&self, other: &Handle, op: CompareOp) -> bool {
        match (self.raw, other.raw) {
            (None, None) => matches!(op, CompareOp::Eq | CompareOp::Le | CompareOp::Ge),
            (None, _) | (_, None) => op == CompareOp::Ne,
            (Some(a), Some(b)) => match api::compare(a, b, op) {
                Ok(result) => result,
                Err(err) => {
                    diagnostics::report("compare", err);
                    false
                }
            },
        }
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::empty()
    }
}

impl Clone for Handle {
    fn clone(&self) -> Self {
        Self::acquire(self.raw)
    }

    fn clone_from(&mut self, source: &Self) {
        // Increment before the old reference is released; assigning a handle
        // to itself must not drop the object in between
        let fresh = source.clone();
        *self = fresh;
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        let Some(raw) = self.raw.take() else {
            return;
        };
        // A reference from a runtime that has shut down is inert
        if pyobj_runtime::epoch() != Some(raw.epoch()) {
            return;
        }
        if let Err(err) = api::decref(raw) {
            diagnostics::report("release", err);
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.raw {
            None => f.write_str("Handle(null)"),
            Some(_) => write!(f, "Handle({})", self.repr()),
        }
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other, CompareOp::Eq)
    }

    #[allow(clippy::partialeq_ne_impl)]
    fn ne(&self, other: &Self) -> bool {
        self.compare(other, CompareOp::Ne)
    }
}

impl PartialOrd for Handle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.compare(other, CompareOp::Eq) {
            Some(Ordering::Equal)
        } else if self.compare(other, CompareOp::Lt) {
            Some(Ordering::Less)
        } else if self.compare(other, CompareOp::Gt) {
            Some(Ordering::Greater)
        } else {
            None
        }
    }

    fn lt(&self, other: &Self) -> bool {
        self.compare(other, CompareOp::Lt)
    }

    fn le(&self, other: &Self) -> bool {
        self.compare(other, CompareOp::Le)
    }

    fn gt(&self, other: &Self) -> bool {
        self.compare(other, CompareOp::Gt)
    }

    fn ge(&self, other: &Self) -> bool {
        self.compare(other, CompareOp::Ge)
    }
}

/// Raw references for a batch of handles, valid while the handles live
///
/// Empty handles stand in as the runtime's `None`.
pub(crate) struct Packed {
    raws: SmallVec<[ObjRef; 8]>,
    _none: Option<Handle>,
}

impl Packed {
    pub(crate) fn new<'h>(handles: impl IntoIterator<Item = &'h Handle>) -> RtResult<Self> {
        let mut raws = SmallVec::new();
        let mut none: Option<Handle> = None;
        for handle in handles {
            let raw = match (handle.raw, none.as_ref().and_then(Handle::raw)) {
                (Some(raw), _) => raw,
                (None, Some(raw)) => raw,
                (None, None) => {
                    let raw = api::new_none()?;
                    none = Some(Handle::from_owned(raw));
                    raw
                }
            };
            raws.push(raw);
        }
        Ok(Self { raws, _none: none })
    }

    pub(crate) fn as_slice(&self) -> &[ObjRef] {
        &self.raws
    }
}
