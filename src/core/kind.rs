//! Kind resolution - the one place a runtime object's type is inspected

use std::fmt;

use pyobj_runtime::{api, ObjectType};

use super::handle::Handle;
use crate::infrastructure::diagnostics;

/// Closed set of tags the bridge distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The handle holds no reference
    Null,
    None,
    Bool,
    Int,
    Float,
    Text,
    List,
    Tuple,
    Dict,
    Set,
    /// Functions, builtins and bound methods
    Callable,
    /// Anything else (files, exceptions)
    Other,
}

impl Kind {
    /// Resolve the tag of the object behind `handle`
    pub fn of(handle: &Handle) -> Kind {
        let Some(raw) = handle.raw() else {
            return Kind::Null;
        };
        match api::type_of(raw) {
            Ok(object_type) => Kind::from(object_type),
            Err(err) => {
                diagnostics::report("kind", err);
                Kind::Null
            }
        }
    }

    pub const fn is_scalar(self) -> bool {
        matches!(self, Self::None | Self::Bool | Self::Int | Self::Float)
    }

    pub const fn is_number(self) -> bool {
        matches!(self, Self::Bool | Self::Int | Self::Float)
    }

    pub const fn is_container(self) -> bool {
        matches!(self, Self::List | Self::Tuple | Self::Dict | Self::Set)
    }

    /// Kinds whose zero length makes a handle count as empty
    pub const fn is_sized(self) -> bool {
        matches!(self, Self::Text | Self::List | Self::Dict | Self::Set)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::None => "none",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Dict => "dict",
            Self::Set => "set",
            Self::Callable => "callable",
            Self::Other => "other",
        }
    }
}

impl From<ObjectType> for Kind {
    fn from(object_type: ObjectType) -> Self {
        match object_type {
            ObjectType::None => Kind::None,
            ObjectType::Bool => Kind::Bool,
            ObjectType::Int => Kind::Int,
            ObjectType::Float => Kind::Float,
            ObjectType::Str => Kind::Text,
            ObjectType::List => Kind::List,
            ObjectType::Tuple => Kind::Tuple,
            ObjectType::Dict => Kind::Dict,
            ObjectType::Set => Kind::Set,
            ObjectType::Function | ObjectType::Builtin | ObjectType::Method => Kind::Callable,
            ObjectType::File | ObjectType::Exception(_) => Kind::Other,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyobj_runtime::ExcKind;

    #[test]
    fn test_object_type_mapping() {
        assert_eq!(Kind::from(ObjectType::Str), Kind::Text);
        assert_eq!(Kind::from(ObjectType::Builtin), Kind::Callable);
        assert_eq!(Kind::from(ObjectType::Exception(ExcKind::KeyError)), Kind::Other);
    }

    #[test]
    fn test_null_handle() {
        assert_eq!(Kind::of(&Handle::empty()), Kind::Null);
    }

    #[test]
    fn test_predicates() {
        assert!(Kind::Int.is_scalar());
        assert!(!Kind::Tuple.is_sized());
        assert!(Kind::Set.is_container());
        assert!(!Kind::None.is_number());
    }
}
