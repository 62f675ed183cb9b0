//! Call arguments - the closed set of host values a call accepts
//!
//! `Arg` has a `From` impl for each supported host type and for handles and
//! views, so an unsupported argument type is a compile error. Conversion
//! precedence follows the variant order: bool, then int, then float, then
//! text, then pass-through of an existing handle.

use crate::core::Handle;
use crate::views::{Dict, List, Set, Text, Tuple};

/// One positional or keyword argument
#[derive(Debug, Clone)]
pub enum Arg {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Object(Handle),
}

impl Arg {
    /// Runtime object for this argument; an empty handle becomes `None`
    pub(crate) fn to_handle(&self) -> Handle {
        match self {
            Arg::Bool(value) => Handle::from(*value),
            Arg::Int(value) => Handle::from(*value),
            Arg::Float(value) => Handle::from(*value),
            Arg::Text(value) => Handle::from(value.as_str()),
            Arg::Object(handle) if handle.is_null() => Handle::none(),
            Arg::Object(handle) => handle.clone(),
        }
    }
}

macro_rules! arg_from {
    ($variant:ident: $($ty:ty),+ => $convert:expr) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    let convert: fn($ty) -> _ = $convert;
                    Arg::$variant(convert(value))
                }
            }
        )+
    };
}

arg_from!(Bool: bool => |v| v);
arg_from!(Int: i8, i16, i32, i64, u8, u16, u32 => i64::from);
arg_from!(Float: f32, f64 => f64::from);
arg_from!(Text: &str, &String, String, char => |v| v.to_string());

impl From<Handle> for Arg {
    fn from(handle: Handle) -> Self {
        Arg::Object(handle)
    }
}

impl From<&Handle> for Arg {
    fn from(handle: &Handle) -> Self {
        Arg::Object(handle.clone())
    }
}

macro_rules! arg_from_view {
    ($($view:ty),+) => {
        $(
            impl From<$view> for Arg {
                fn from(view: $view) -> Self {
                    Arg::Object(Handle::from(view))
                }
            }

            impl From<&$view> for Arg {
                fn from(view: &$view) -> Self {
                    Arg::Object(Handle::from(view))
                }
            }
        )+
    };
}

arg_from_view!(Text, List, Tuple, Dict, Set);

/// Keyword arguments, in the order they were added
#[derive(Debug, Clone, Default)]
pub struct Kwargs {
    entries: Vec<(String, Arg)>,
}

impl Kwargs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name=value`; a repeated name replaces the earlier value
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<Arg>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arg)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Collect call arguments into a `Vec<Arg>`
///
/// ```ignore
/// let result = call(&func, &args![1, 2.5, "x", &handle], None);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::call::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        vec![$($crate::call::Arg::from($arg)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_picks_variant() {
        assert!(matches!(Arg::from(true), Arg::Bool(true)));
        assert!(matches!(Arg::from(7u8), Arg::Int(7)));
        assert!(matches!(Arg::from(-3i32), Arg::Int(-3)));
        assert!(matches!(Arg::from(1.5f32), Arg::Float(f) if f == 1.5));
        assert!(matches!(Arg::from('x'), Arg::Text(ref s) if s == "x"));
        assert!(matches!(Arg::from(Handle::empty()), Arg::Object(_)));
    }

    #[test]
    fn test_args_macro() {
        let args = args![true, 2, 3.0, "four"];
        assert_eq!(args.len(), 4);
        assert!(matches!(args[0], Arg::Bool(true)));
        assert!(matches!(args[3], Arg::Text(ref s) if s == "four"));
        assert!(args![].is_empty());
    }

    #[test]
    fn test_kwargs_replace_repeated_name() {
        let kwargs = Kwargs::new().arg("reverse", false).arg("key", 1).arg("reverse", true);
        assert_eq!(kwargs.len(), 2);
        let names: Vec<&str> = kwargs.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["reverse", "key"]);
        assert!(matches!(kwargs.iter().next(), Some((_, Arg::Bool(true)))));
    }
}
