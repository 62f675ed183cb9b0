//! Formatting engine - `{}` / `{name}` templates rendered on the host side
//!
//! Rules, applied in a single left-to-right scan:
//! - `{{` and `}}` are literal braces; a lone `}` is emitted as is
//! - `{}` takes the next positional argument
//! - `{name}` looks `name` up among the named arguments (surrounding
//!   whitespace inside the braces is ignored)
//! - a reference with no matching argument is copied out braces and all
//! - a `{` that is never closed is literal

use std::collections::HashMap;
use std::fmt;

use crate::core::Handle;
use crate::views::{Dict, List, Set, Text, Tuple};

/// One pre-stringified argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatArg {
    Positional(String),
    Named(String, String),
}

impl FormatArg {
    pub fn positional(value: impl FormatValue) -> Self {
        FormatArg::Positional(value.format_value())
    }
}

/// `name=value` argument
pub fn farg(name: &str, value: impl FormatValue) -> FormatArg {
    FormatArg::Named(name.to_string(), value.format_value())
}

/// Host text for a template argument
///
/// Plain host values use their `Display`; handles and views use the
/// runtime's `str()`.
pub trait FormatValue {
    fn format_value(&self) -> String;
}

impl<T: FormatValue + ?Sized> FormatValue for &T {
    fn format_value(&self) -> String {
        (**self).format_value()
    }
}

macro_rules! format_by_display {
    ($($ty:ty),+) => {
        $(
            impl FormatValue for $ty {
                fn format_value(&self) -> String {
                    self.to_string()
                }
            }
        )+
    };
}

format_by_display!(
    str, String, char, bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32,
    f64
);

impl FormatValue for fmt::Arguments<'_> {
    fn format_value(&self) -> String {
        self.to_string()
    }
}

impl FormatValue for Handle {
    fn format_value(&self) -> String {
        self.to_text()
    }
}

macro_rules! format_by_runtime_str {
    ($($view:ty),+) => {
        $(
            impl FormatValue for $view {
                fn format_value(&self) -> String {
                    self.to_text()
                }
            }
        )+
    };
}

format_by_runtime_str!(Text, List, Tuple, Dict, Set);

/// Render `template` against `args`
pub fn format(template: &str, args: &[FormatArg]) -> String {
    let mut positional = Vec::new();
    let mut named = HashMap::new();
    for arg in args {
        match arg {
            FormatArg::Positional(value) => positional.push(value.as_str()),
            FormatArg::Named(name, value) => {
                named.insert(name.as_str(), value.as_str());
            }
        }
    }

    let mut out = String::with_capacity(template.len());
    let mut next_positional = 0;
    let mut rest = template;

    while let Some(at) = rest.find(['{', '}']) {
        out.push_str(&rest[..at]);
        let tail = &rest[at..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
        } else {
            let Some(close) = tail.find('}') else {
                // Unclosed: the rest of the template is literal
                out.push_str(tail);
                rest = "";
                break;
            };
            let reference = &tail[..=close];
            let name = tail[1..close].trim();
            let value = if name.is_empty() {
                let value = positional.get(next_positional).copied();
                next_positional += 1;
                value
            } else {
                named.get(name).copied()
            };
            out.push_str(value.unwrap_or(reference));
            rest = &tail[close + 1..];
        }
    }
    out.push_str(rest);
    out
}

/// Render a template with positional and `name = value` arguments
///
/// ```ignore
/// assert_eq!(pyformat!("{a}-{}", a = "X", 1), "X-1");
/// ```
#[macro_export]
macro_rules! pyformat {
    ($template:expr $(,)?) => {
        $crate::format::format($template, &[])
    };
    ($template:expr, $($rest:tt)+) => {{
        let mut args: ::std::vec::Vec<$crate::format::FormatArg> = ::std::vec::Vec::new();
        $crate::__pyformat_args!(args; $($rest)+);
        $crate::format::format($template, &args)
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __pyformat_args {
    ($args:ident;) => {};
    ($args:ident; $name:ident = $value:expr $(, $($rest:tt)*)?) => {
        $args.push($crate::format::farg(stringify!($name), &$value));
        $( $crate::__pyformat_args!($args; $($rest)*); )?
    };
    ($args:ident; $value:expr $(, $($rest:tt)*)?) => {
        $args.push($crate::format::FormatArg::positional(&$value));
        $( $crate::__pyformat_args!($args; $($rest)*); )?
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(value: &str) -> FormatArg {
        FormatArg::positional(value)
    }

    #[test]
    fn test_positional_and_named() {
        assert_eq!(format("{a}-{}", &[farg("a", "X"), FormatArg::positional(1)]), "X-1");
        assert_eq!(format("{} + {} = {}", &[pos("1"), pos("2"), pos("3")]), "1 + 2 = 3");
    }

    #[test]
    fn test_brace_escapes() {
        assert_eq!(format("{{}}", &[]), "{}");
        assert_eq!(format("{{{}}}", &[pos("x")]), "{x}");
        assert_eq!(format("a }} b", &[]), "a } b");
    }

    #[test]
    fn test_missing_references_stay_visible() {
        assert_eq!(format("{missing}", &[]), "{missing}");
        assert_eq!(format("{} {}", &[pos("only")]), "only {}");
        assert_eq!(format("{ spaced }", &[]), "{ spaced }");
    }

    #[test]
    fn test_named_lookup_trims_whitespace() {
        assert_eq!(format("<{ name }>", &[farg("name", "v")]), "<v>");
    }

    #[test]
    fn test_unclosed_and_stray_braces() {
        assert_eq!(format("open { never", &[pos("x")]), "open { never");
        assert_eq!(format("stray } here", &[]), "stray } here");
        assert_eq!(format("{", &[]), "{");
    }

    #[test]
    fn test_named_does_not_consume_positional() {
        let args = [pos("p"), farg("k", "n")];
        assert_eq!(format("{k}{}", &args), "np");
    }

    #[test]
    fn test_non_ascii_template() {
        assert_eq!(format("é{}ü", &[pos("ß")]), "éßü");
    }

    #[test]
    fn test_macro_mixes_named_and_positional() {
        let count = 3;
        assert_eq!(pyformat!("{a}-{}", a = "X", 1), "X-1");
        assert_eq!(pyformat!("{} items", count), "3 items");
        assert_eq!(pyformat!("{x}{y}", x = 1.5, y = true,), "1.5true");
        assert_eq!(pyformat!("plain"), "plain");
    }
}
