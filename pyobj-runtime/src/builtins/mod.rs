//! Built-in functions - the runtime's `builtins` namespace
//!
//! Design: one closed enum names every builtin, so lookup, repr and
//! dispatch work on a `Copy` tag. Implementations live in focused modules:
//! - `convert.rs` - type constructors (`int`, `str`, `list`, ...)
//! - `iter.rs` - iteration helpers (`range`, `zip`, `sorted`, `min`, ...)
//!
//! Range, zip, map and friends produce lists rather than lazy iterators.

mod convert;
mod iter;


use std::io::Write;

use crate::error::{ExcKind, RtResult, RuntimeError};
use crate::file::{FileMode, FileObject};
use crate::heap::ObjRef;
use crate::interp::Interpreter;
use crate::logging::trace;
use crate::methods::CallArgs;
use crate::object::{ExceptionObject, Object, ObjectType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Builtin {
    Len,
    Str,
    Repr,
    Int,
    Float,
    Bool,
    List,
    Tuple,
    Dict,
    Set,
    Abs,
    Min,
    Max,
    Sum,
    Range,
    Sorted,
    Reversed,
    Print,
    Round,
    Enumerate,
    Zip,
    All,
    Any,
    Map,
    Filter,
    Open,
    Callable,
    Isinstance,
    Type,
    Hash,
    /// Exception class, callable to construct an instance
    Exception(ExcKind),
}

const FUNCTIONS: [Builtin; 30] = [
    Builtin::Len,
    Builtin::Str,
    Builtin::Repr,
    Builtin::Int,
    Builtin::Float,
    Builtin::Bool,
    Builtin::List,
    Builtin::Tuple,
    Builtin::Dict,
    Builtin::Set,
    Builtin::Abs,
    Builtin::Min,
    Builtin::Max,
    Builtin::Sum,
    Builtin::Range,
    Builtin::Sorted,
    Builtin::Reversed,
    Builtin::Print,
    Builtin::Round,
    Builtin::Enumerate,
    Builtin::Zip,
    Builtin::All,
    Builtin::Any,
    Builtin::Map,
    Builtin::Filter,
    Builtin::Open,
    Builtin::Callable,
    Builtin::Isinstance,
    Builtin::Type,
    Builtin::Hash,
];

impl Builtin {
    /// Every builtin, functions first, then exception classes
    pub fn all() -> impl Iterator<Item = Builtin> {
        FUNCTIONS
            .into_iter()
            .chain(ExcKind::RAISABLE.into_iter().map(Builtin::Exception))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Len => "len",
            Self::Str => "str",
            Self::Repr => "repr",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Dict => "dict",
            Self::Set => "set",
            Self::Abs => "abs",
            Self::Min => "min",
            Self::Max => "max",
            Self::Sum => "sum",
            Self::Range => "range",
            Self::Sorted => "sorted",
            Self::Reversed => "reversed",
            Self::Print => "print",
            Self::Round => "round",
            Self::Enumerate => "enumerate",
            Self::Zip => "zip",
            Self::All => "all",
            Self::Any => "any",
            Self::Map => "map",
            Self::Filter => "filter",
            Self::Open => "open",
            Self::Callable => "callable",
            Self::Isinstance => "isinstance",
            Self::Type => "type",
            Self::Hash => "hash",
            Self::Exception(kind) => kind.name(),
        }
    }

    /// Object type constructed by a type builtin
    pub fn constructs(self) -> Option<ObjectType> {
        match self {
            Self::Str => Some(ObjectType::Str),
            Self::Int => Some(ObjectType::Int),
            Self::Float => Some(ObjectType::Float),
            Self::Bool => Some(ObjectType::Bool),
            Self::List => Some(ObjectType::List),
            Self::Tuple => Some(ObjectType::Tuple),
            Self::Dict => Some(ObjectType::Dict),
            Self::Set => Some(ObjectType::Set),
            Self::Exception(kind) => Some(ObjectType::Exception(kind)),
            _ => None,
        }
    }

    /// Type builtin for an object type, if it has one
    pub fn for_type(kind: ObjectType) -> Option<Builtin> {
        FUNCTIONS
            .into_iter()
            .chain(ExcKind::RAISABLE.into_iter().map(Builtin::Exception))
            .find(|b| b.constructs() == Some(kind))
    }

    pub fn write_repr(self, out: &mut String) {
        if self.constructs().is_some() {
            out.push_str(&format!("<class '{}'>", self.name()));
        } else {
            out.push_str(&format!("<built-in function {}>", self.name()));
        }
    }
}

impl Interpreter {
    pub(crate) fn call_builtin(
        &mut self,
        builtin: Builtin,
        positional: &[ObjRef],
        keywords: &[(String, ObjRef)],
    ) -> RtResult<ObjRef> {
        trace!(event = "builtin_call", function = builtin.name());
        let args = CallArgs::new(builtin.name(), positional, keywords);
        match builtin {
            Builtin::Len => {
                args.simple(1, 1)?;
                let len = self.length(args.required(0)?)?;
                Ok(self.new_int(len as i64))
            }
            Builtin::Repr => {
                args.simple(1, 1)?;
                let text = self.repr(args.required(0)?)?;
                Ok(self.new_str(text))
            }
            Builtin::Callable => {
                args.simple(1, 1)?;
                let callable = self.get(args.required(0)?)?.is_callable();
                Ok(self.new_bool(callable))
            }
            Builtin::Hash => {
                args.simple(1, 1)?;
                // Fold into the non-negative i64 range
                let hash = self.hash(args.required(0)?)? >> 1;
                Ok(self.new_int(hash as i64))
            }
            Builtin::Abs => {
                args.simple(1, 1)?;
                let value = args.required(0)?;
                match self.get(value)? {
                    Object::Int(i) => {
                        let abs = i.checked_abs().ok_or_else(|| {
                            RuntimeError::new(ExcKind::OverflowError, "integer result out of range")
                        })?;
                        Ok(self.new_int(abs))
                    }
                    Object::Bool(b) => {
                        let abs = *b as i64;
                        Ok(self.new_int(abs))
                    }
                    Object::Float(f) => {
                        let abs = f.abs();
                        Ok(self.new_float(abs))
                    }
                    other => Err(RuntimeError::type_error(format!(
                        "bad operand type for abs(): '{}'",
                        other.object_type().name()
                    ))),
                }
            }
            Builtin::Print => self.print(args),
            Builtin::Open => {
                args.keywords_only(&["mode", "encoding"])?;
                args.arity(1, 2)?;
                let path = self.to_str(args.required(0)?)?.to_string();
                let mode = match args.get(1).or_else(|| args.keyword("mode")) {
                    Some(mode) => FileMode::parse(self.to_str(mode)?)?,
                    None => FileMode::Read,
                };
                let file = FileObject::open(&path, mode)?;
                Ok(self.alloc(Object::File(file)))
            }
            Builtin::Isinstance => {
                args.simple(2, 2)?;
                let kind = self.get(args.required(0)?)?.object_type();
                let matches = self.isinstance(kind, args.required(1)?)?;
                Ok(self.new_bool(matches))
            }
            Builtin::Type => {
                args.simple(1, 1)?;
                let kind = self.get(args.required(0)?)?.object_type();
                match Builtin::for_type(kind) {
                    Some(builtin) => Ok(self.alloc(Object::Builtin(builtin))),
                    None => {
                        let name = kind.name();
                        Ok(self.new_str(name))
                    }
                }
            }
            Builtin::Exception(kind) => self.new_exception(kind, args),
            Builtin::Str
            | Builtin::Int
            | Builtin::Float
            | Builtin::Bool
            | Builtin::List
            | Builtin::Tuple
            | Builtin::Dict
            | Builtin::Set
            | Builtin::Round => self.construct(builtin, args),
            _ => self.iteration_builtin(builtin, args),
        }
    }

    fn print(&mut self, args: CallArgs<'_>) -> RtResult<ObjRef> {
        args.keywords_only(&["sep", "end"])?;
        let sep = match args.keyword("sep") {
            Some(sep) if !self.is_none(sep) => self.to_str(sep)?.to_string(),
            _ => " ".to_string(),
        };
        let end = match args.keyword("end") {
            Some(end) if !self.is_none(end) => self.to_str(end)?.to_string(),
            _ => "\n".to_string(),
        };
        let mut parts = Vec::with_capacity(args.len());
        for value in args.positional() {
            parts.push(self.str(*value)?);
        }
        let line = format!("{}{}", parts.join(&sep), end);
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(line.as_bytes())
            .map_err(|err| RuntimeError::new(ExcKind::OSError, err.to_string()))?;
        Ok(self.new_none())
    }

    fn isinstance(&self, kind: ObjectType, classes: ObjRef) -> RtResult<bool> {
        match self.get(classes)? {
            Object::Builtin(Builtin::Exception(ExcKind::Exception)) => {
                Ok(matches!(kind, ObjectType::Exception(_)))
            }
            // bool is a subclass of int
            Object::Builtin(Builtin::Int) if kind == ObjectType::Bool => Ok(true),
            Object::Builtin(builtin) if builtin.constructs().is_some() => {
                Ok(builtin.constructs() == Some(kind))
            }
            Object::Tuple(items) => {
                for item in items {
                    if self.isinstance(kind, *item)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            _ => Err(RuntimeError::type_error(
                "isinstance() arg 2 must be a type or tuple of types",
            )),
        }
    }

    fn new_exception(&mut self, kind: ExcKind, args: CallArgs<'_>) -> RtResult<ObjRef> {
        args.simple(0, 1)?;
        let message = match args.get(0) {
            Some(value) if kind == ExcKind::KeyError => self.repr(value)?,
            Some(value) => self.str(value)?,
            None => String::new(),
        };
        Ok(self.alloc(Object::Exception(ExceptionObject { kind, message })))
    }
}
