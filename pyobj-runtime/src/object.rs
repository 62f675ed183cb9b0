//! Object system - unified representation for all runtime values
//!
//! Design: one enum per heap slot, children referenced by `ObjRef`:
//! - Scalars (None, bool, int, float, str) carry their payload inline
//! - Containers hold counted references to their elements
//! - Callables (functions, builtins, bound methods) hold their captures

use std::sync::Arc;

use rustpython_parser::ast::{Expr, Stmt};

use crate::builtins::Builtin;
use crate::error::ExcKind;
use crate::file::FileObject;
use crate::heap::ObjRef;
use crate::table::Table;

/// Heap-allocated runtime object
pub(crate) enum Object {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ObjRef>),
    Tuple(Vec<ObjRef>),
    Dict(Table),
    Set(Table),
    Function(Function),
    Builtin(Builtin),
    Method(BoundMethod),
    File(FileObject),
    Exception(ExceptionObject),
}

/// User-defined function or lambda
#[derive(Clone)]
pub(crate) struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub vararg: Option<String>,
    pub kwarg: Option<String>,
    pub body: Body,
    /// Namespace the function was defined in (counted)
    pub globals: ObjRef,
    /// Enclosing local scopes, innermost first (counted)
    pub closure: Vec<ObjRef>,
    pub scope: Arc<ScopeDecls>,
}

#[derive(Clone)]
pub(crate) struct Param {
    pub name: String,
    /// Default value evaluated at definition time (counted)
    pub default: Option<ObjRef>,
    /// Declared after `*` or `*args`: bound by keyword only
    pub kw_only: bool,
}

/// Names a function body declares `global` or `nonlocal`
#[derive(Debug, Clone, Default)]
pub(crate) struct ScopeDecls {
    pub globals: Vec<String>,
    pub nonlocals: Vec<String>,
}

#[derive(Clone)]
pub(crate) enum Body {
    Block(Arc<Vec<Stmt>>),
    Expr(Arc<Expr>),
}

/// Built-in method bound to its receiver
pub(crate) struct BoundMethod {
    pub receiver: ObjRef,
    pub name: String,
}

/// Raised or constructed exception instance
pub(crate) struct ExceptionObject {
    pub kind: ExcKind,
    pub message: String,
}

/// Object types for dispatch and introspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    None,
    Bool,
    Int,
    Float,
    Str,
    List,
    Tuple,
    Dict,
    Set,
    Function,
    Builtin,
    Method,
    File,
    Exception(ExcKind),
}

impl ObjectType {
    /// Runtime type name, as `type(x).__name__` would report it
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Dict => "dict",
            Self::Set => "set",
            Self::Function => "function",
            Self::Builtin => "builtin_function_or_method",
            Self::Method => "method",
            Self::File => "TextIOWrapper",
            Self::Exception(kind) => kind.name(),
        }
    }

    pub const fn is_container(self) -> bool {
        matches!(
            self,
            Self::List | Self::Tuple | Self::Dict | Self::Set
        )
    }
}

impl Object {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::None => ObjectType::None,
            Self::Bool(_) => ObjectType::Bool,
            Self::Int(_) => ObjectType::Int,
            Self::Float(_) => ObjectType::Float,
            Self::Str(_) => ObjectType::Str,
            Self::List(_) => ObjectType::List,
            Self::Tuple(_) => ObjectType::Tuple,
            Self::Dict(_) => ObjectType::Dict,
            Self::Set(_) => ObjectType::Set,
            Self::Function(_) => ObjectType::Function,
            Self::Builtin(_) => ObjectType::Builtin,
            Self::Method(_) => ObjectType::Method,
            Self::File(_) => ObjectType::File,
            Self::Exception(exc) => ObjectType::Exception(exc.kind),
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_) | Self::Builtin(_) | Self::Method(_))
    }

    /// Visit every counted reference this object holds
    pub fn for_each_child(&self, mut visit: impl FnMut(ObjRef)) {
        match self {
            Self::List(items) | Self::Tuple(items) => items.iter().copied().for_each(visit),
            Self::Dict(table) | Self::Set(table) => {
                for entry in table.iter() {
                    visit(entry.key);
                    if let Some(value) = entry.value {
                        visit(value);
                    }
                }
            }
            Self::Function(func) => {
                visit(func.globals);
                func.closure.iter().copied().for_each(&mut visit);
                for param in &func.params {
                    if let Some(default) = param.default {
                        visit(default);
                    }
                }
            }
            Self::Method(method) => visit(method.receiver),
            _ => {}
        }
    }

    /// Consume the object, returning the references it owned
    pub fn into_children(self) -> Vec<ObjRef> {
        let mut children = Vec::new();
        self.for_each_child(|child| children.push(child));
        children
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(ObjectType::None.name(), "NoneType");
        assert_eq!(ObjectType::Str.name(), "str");
        assert_eq!(ObjectType::Exception(ExcKind::KeyError).name(), "KeyError");
    }

    #[test]
    fn test_scalars_have_no_children() {
        assert!(Object::Int(3).into_children().is_empty());
        assert!(Object::Str("x".into()).into_children().is_empty());
    }
}
