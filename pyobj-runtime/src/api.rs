//! Narrow runtime interface - C-API-like functions over raw references
//!
//! Conventions:
//! - Every `ObjRef` argument is borrowed
//! - Every returned `ObjRef` is a new reference the caller must `decref`
//! - Container snapshots (`dict_keys`, `iterate`, ...) return owned references
//! - Failures come back as `RuntimeError`; nothing here panics

use crate::error::{ExcKind, RtResult, RuntimeError};
use crate::heap::ObjRef;
use crate::interp::Interpreter;
use crate::logging::log_runtime_error;
use crate::object::{Object, ObjectType};
use crate::ops::{BinaryOp, CompareOp};
use crate::state::{self, RuntimeStats};

/// Run against the interpreter, logging failures at the boundary
fn run<R>(op: &'static str, f: impl FnOnce(&mut Interpreter) -> RtResult<R>) -> RtResult<R> {
    let result = state::with(f);
    if let Err(err) = &result {
        log_runtime_error(op, &err.to_string());
    }
    result
}

// ----------------------------------------------------------------------
// Construction
// ----------------------------------------------------------------------

pub fn new_none() -> RtResult<ObjRef> {
    run("new_none", |interp| Ok(interp.new_none()))
}

pub fn new_bool(value: bool) -> RtResult<ObjRef> {
    run("new_bool", |interp| Ok(interp.new_bool(value)))
}

pub fn new_int(value: i64) -> RtResult<ObjRef> {
    run("new_int", |interp| Ok(interp.new_int(value)))
}

pub fn new_float(value: f64) -> RtResult<ObjRef> {
    run("new_float", |interp| Ok(interp.new_float(value)))
}

pub fn new_str(value: &str) -> RtResult<ObjRef> {
    run("new_str", |interp| Ok(interp.new_str(value)))
}

/// New list holding (counted) references to `items`
pub fn new_list(items: &[ObjRef]) -> RtResult<ObjRef> {
    run("new_list", |interp| interp.adopt(Object::List(items.to_vec())))
}

pub fn new_tuple(items: &[ObjRef]) -> RtResult<ObjRef> {
    run("new_tuple", |interp| interp.adopt(Object::Tuple(items.to_vec())))
}

pub fn new_dict() -> RtResult<ObjRef> {
    run("new_dict", |interp| Ok(interp.new_dict()))
}

pub fn new_set() -> RtResult<ObjRef> {
    run("new_set", |interp| Ok(interp.new_set()))
}

// ----------------------------------------------------------------------
// Reference counting and identity
// ----------------------------------------------------------------------

pub fn incref(r: ObjRef) -> RtResult<()> {
    run("incref", |interp| interp.heap.incref(r))
}

pub fn decref(r: ObjRef) -> RtResult<()> {
    run("decref", |interp| interp.heap.decref(r))
}

/// Current count, 0 for a stale or freed reference
pub fn refcount(r: ObjRef) -> RtResult<usize> {
    run("refcount", |interp| Ok(interp.heap.refcount(r)))
}

pub fn type_of(r: ObjRef) -> RtResult<ObjectType> {
    run("type_of", |interp| Ok(interp.get(r)?.object_type()))
}

pub fn type_name(r: ObjRef) -> RtResult<String> {
    run("type_name", |interp| interp.type_name(r).map(str::to_string))
}

// ----------------------------------------------------------------------
// Protocols
// ----------------------------------------------------------------------

pub fn len(r: ObjRef) -> RtResult<usize> {
    run("len", |interp| interp.length(r))
}

pub fn is_truthy(r: ObjRef) -> RtResult<bool> {
    run("is_truthy", |interp| interp.truthy(r))
}

pub fn is_callable(r: ObjRef) -> RtResult<bool> {
    run("is_callable", |interp| Ok(interp.get(r)?.is_callable()))
}

/// `str(r)`
pub fn str(r: ObjRef) -> RtResult<String> {
    run("str", |interp| interp.str(r))
}

pub fn repr(r: ObjRef) -> RtResult<String> {
    run("repr", |interp| interp.repr(r))
}

pub fn compare(a: ObjRef, b: ObjRef, op: CompareOp) -> RtResult<bool> {
    run("compare", |interp| interp.compare(a, b, op))
}

pub fn hash(r: ObjRef) -> RtResult<u64> {
    run("hash", |interp| interp.hash(r))
}

pub fn binary_op(op: BinaryOp, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
    run("binary_op", |interp| interp.binary_op(op, a, b))
}

// ----------------------------------------------------------------------
// Host extraction
// ----------------------------------------------------------------------

/// Integer payload of an `int` or `bool`
pub fn as_int(r: ObjRef) -> RtResult<i64> {
    run("as_int", |interp| match interp.get(r)? {
        Object::Int(i) => Ok(*i),
        Object::Bool(b) => Ok(*b as i64),
        other => Err(RuntimeError::type_error(format!(
            "expected int, got {}",
            other.object_type().name()
        ))),
    })
}

/// Float payload; ints widen
pub fn as_float(r: ObjRef) -> RtResult<f64> {
    run("as_float", |interp| interp.to_float(r))
}

pub fn as_bool(r: ObjRef) -> RtResult<bool> {
    run("as_bool", |interp| match interp.get(r)? {
        Object::Bool(b) => Ok(*b),
        other => Err(RuntimeError::type_error(format!(
            "expected bool, got {}",
            other.object_type().name()
        ))),
    })
}

/// Text payload of a `str`
pub fn as_str(r: ObjRef) -> RtResult<String> {
    run("as_str", |interp| interp.to_str(r).map(str::to_string))
}

// ----------------------------------------------------------------------
// Calls and attributes
// ----------------------------------------------------------------------

pub fn call(callable: ObjRef, args: &[ObjRef], kwargs: &[(String, ObjRef)]) -> RtResult<ObjRef> {
    run("call", |interp| interp.call(callable, args, kwargs))
}

/// Call with packed arguments: a tuple of positionals and an optional dict of keywords
pub fn call_object(callable: ObjRef, args: ObjRef, kwargs: Option<ObjRef>) -> RtResult<ObjRef> {
    run("call_object", |interp| {
        let positional = match interp.get(args)? {
            Object::Tuple(items) => items.clone(),
            other => {
                return Err(RuntimeError::type_error(format!(
                    "argument list must be a tuple, not {}",
                    other.object_type().name()
                )))
            }
        };
        let mut keywords = Vec::new();
        if let Some(kwargs) = kwargs {
            for (key, value) in interp.dict_entries(kwargs)? {
                let name = interp
                    .get(key)?
                    .as_str()
                    .ok_or_else(|| RuntimeError::type_error("keywords must be strings"))?;
                keywords.push((name.to_string(), value));
            }
        }
        // The packed containers keep every argument alive for the call
        interp.heap.incref(args)?;
        if let Some(kwargs) = kwargs {
            interp.heap.incref(kwargs)?;
        }
        let result = interp.call(callable, &positional, &keywords);
        interp.release(args);
        if let Some(kwargs) = kwargs {
            interp.release(kwargs);
        }
        result
    })
}

pub fn call_method(
    receiver: ObjRef,
    name: &str,
    args: &[ObjRef],
    kwargs: &[(String, ObjRef)],
) -> RtResult<ObjRef> {
    run("call_method", |interp| interp.call_method(receiver, name, args, kwargs))
}

pub fn getattr(r: ObjRef, name: &str) -> RtResult<ObjRef> {
    run("getattr", |interp| interp.getattr(r, name))
}

/// Look up a name in the builtins namespace
pub fn builtin(name: &str) -> RtResult<ObjRef> {
    run("builtin", |interp| {
        let builtins = interp.builtins();
        match interp.dict_lookup_str(builtins, name)? {
            Some(value) => interp.incref(value),
            None => Err(RuntimeError::new(
                ExcKind::NameError,
                format!("name '{}' is not defined", name),
            )),
        }
    })
}

// ----------------------------------------------------------------------
// Items and containers
// ----------------------------------------------------------------------

/// `container[key]`
pub fn get_item(container: ObjRef, key: ObjRef) -> RtResult<ObjRef> {
    run("get_item", |interp| interp.getitem(container, key))
}

pub fn set_item(container: ObjRef, key: ObjRef, value: ObjRef) -> RtResult<()> {
    run("set_item", |interp| interp.setitem(container, key, value))
}

pub fn del_item(container: ObjRef, key: ObjRef) -> RtResult<()> {
    run("del_item", |interp| interp.delitem(container, key))
}

/// Dict lookup that reports absence instead of raising
pub fn dict_get(dict: ObjRef, key: ObjRef) -> RtResult<Option<ObjRef>> {
    run("dict_get", |interp| match interp.dict_lookup(dict, key)? {
        Some(value) => interp.incref(value).map(Some),
        None => Ok(None),
    })
}

pub fn dict_set(dict: ObjRef, key: ObjRef, value: ObjRef) -> RtResult<()> {
    run("dict_set", |interp| interp.dict_set(dict, key, value))
}

/// Remove `key` from a dict or set; returns whether it was present
pub fn discard(owner: ObjRef, key: ObjRef) -> RtResult<bool> {
    run("discard", |interp| match interp.table_remove(owner, key)? {
        Some(removed) => {
            interp.release(removed);
            Ok(true)
        }
        None => Ok(false),
    })
}

/// Remove `key`, handing the value to the caller
pub fn dict_pop(dict: ObjRef, key: ObjRef) -> RtResult<Option<ObjRef>> {
    run("dict_pop", |interp| {
        if !matches!(interp.get(dict)?, Object::Dict(_)) {
            return Err(RuntimeError::type_error("dict_pop requires a dict"));
        }
        interp.table_remove(dict, key)
    })
}

pub fn dict_keys(dict: ObjRef) -> RtResult<Vec<ObjRef>> {
    run("dict_keys", |interp| {
        let keys = interp.table_keys(dict)?;
        for key in &keys {
            interp.heap.incref(*key)?;
        }
        Ok(keys)
    })
}

pub fn dict_items(dict: ObjRef) -> RtResult<Vec<(ObjRef, ObjRef)>> {
    run("dict_items", |interp| {
        let entries = interp.dict_entries(dict)?;
        for (key, value) in &entries {
            interp.heap.incref(*key)?;
            interp.heap.incref(*value)?;
        }
        Ok(entries)
    })
}

/// Add to a set; returns whether the member was new
pub fn set_add(set: ObjRef, key: ObjRef) -> RtResult<bool> {
    run("set_add", |interp| interp.set_add(set, key))
}

/// `item in container`
pub fn contains(container: ObjRef, item: ObjRef) -> RtResult<bool> {
    run("contains", |interp| interp.contains(container, item))
}

/// Snapshot of the elements of any iterable
pub fn iterate(r: ObjRef) -> RtResult<Vec<ObjRef>> {
    run("iterate", |interp| interp.iterate(r))
}

// ----------------------------------------------------------------------
// Code execution
// ----------------------------------------------------------------------

/// Evaluate an expression in a fresh namespace
pub fn eval(source: &str) -> RtResult<ObjRef> {
    run("eval", |interp| {
        let namespace = interp.new_namespace(None)?;
        let result = interp.eval_source(source, "<string>", namespace);
        interp.release(namespace);
        result
    })
}

/// Execute a program in a fresh namespace, returning that namespace
pub fn exec(source: &str, filename: &str) -> RtResult<ObjRef> {
    run("exec", |interp| {
        let namespace = interp.new_namespace(Some(filename))?;
        match interp.exec_source(source, filename, namespace) {
            Ok(()) => Ok(namespace),
            Err(err) => {
                interp.release(namespace);
                Err(err)
            }
        }
    })
}

// ----------------------------------------------------------------------
// JSON
// ----------------------------------------------------------------------

/// `json.dumps(value, indent=indent)`
pub fn json_dumps(value: ObjRef, indent: Option<usize>) -> RtResult<String> {
    run("json_dumps", |interp| interp.json_dumps(value, indent))
}

/// `json.loads(text)`
pub fn json_loads(text: &str) -> RtResult<ObjRef> {
    run("json_loads", |interp| interp.json_loads(text))
}

// ----------------------------------------------------------------------
// Files
// ----------------------------------------------------------------------

/// `open(path, mode)` in text mode
pub fn open(path: &str, mode: &str) -> RtResult<ObjRef> {
    run("open", |interp| {
        let path = interp.new_str(path);
        let mode = interp.new_str(mode);
        let builtins = interp.builtins();
        let result = match interp.dict_lookup_str(builtins, "open")? {
            Some(open) => interp.call(open, &[path, mode], &[]),
            None => Err(RuntimeError::unsupported("file access")),
        };
        interp.release(path);
        interp.release(mode);
        result
    })
}

pub fn file_read(file: ObjRef) -> RtResult<String> {
    run("file_read", |interp| {
        let text = interp.call_method(file, "read", &[], &[])?;
        let result = interp.to_str(text).map(str::to_string);
        interp.release(text);
        result
    })
}

/// Write text, returning the number of characters written
pub fn file_write(file: ObjRef, text: &str) -> RtResult<usize> {
    run("file_write", |interp| {
        let text = interp.new_str(text);
        let written = interp.call_method(file, "write", &[text], &[]);
        interp.release(text);
        let written = written?;
        let count = interp.to_int(written);
        interp.release(written);
        Ok(count?.max(0) as usize)
    })
}

pub fn file_close(file: ObjRef) -> RtResult<()> {
    run("file_close", |interp| {
        let none = interp.call_method(file, "close", &[], &[])?;
        interp.release(none);
        Ok(())
    })
}

/// File objects currently open, across every runtime epoch
pub fn open_files() -> usize {
    crate::file::open_files()
}

// ----------------------------------------------------------------------
// Runtime control
// ----------------------------------------------------------------------

/// Run the cycle collector now, returning the number of objects freed
pub fn collect() -> RtResult<usize> {
    run("collect", |interp| Ok(interp.collect()))
}

pub fn stats() -> RtResult<RuntimeStats> {
    state::stats()
}
