//! Pretty printer - one element per line, nested containers indented
//!
//! ```text
//! {
//!     "x": 10,
//!     "y": "s"
//! }
//! ```

use pyobj_runtime::api;

use super::Visit;
use crate::config;
use crate::core::{Handle, Kind};
use crate::views::list::snapshot;

/// Render with the configured indent width, starting at column 0
pub fn pretty_print(handle: &Handle) -> String {
    pretty_print_indent(handle, 0)
}

/// Render as if the value starts `indent` columns in
///
/// Only continuation lines are indented; the first line is not.
pub fn pretty_print_indent(handle: &Handle, indent: usize) -> String {
    let mut printer = Printer {
        out: String::new(),
        width: config::current().pretty.indent_width,
    };
    printer.value(handle, indent);
    printer.out
}

struct Printer {
    out: String,
    width: usize,
}

impl Printer {
    fn value(&mut self, handle: &Handle, indent: usize) {
        let kind = handle.kind();
        match kind {
            Kind::Null | Kind::None => self.out.push_str("None"),
            Kind::Text => {
                self.out.push('"');
                self.out.push_str(&handle.as_string().unwrap_or_default());
                self.out.push('"');
            }
            Kind::Bool | Kind::Int | Kind::Float => self.out.push_str(&handle.to_text()),
            Kind::List | Kind::Tuple | Kind::Set | Kind::Dict => {
                let Some(_visit) = Visit::enter(handle) else {
                    self.out.push_str("...");
                    return;
                };
                self.container(handle, kind, indent);
            }
            Kind::Callable | Kind::Other => self.out.push_str(&handle.repr()),
        }
    }

    fn container(&mut self, handle: &Handle, kind: Kind, indent: usize) {
        let (open, close, empty) = match kind {
            Kind::List => ("[", "]", "[]"),
            Kind::Tuple => ("(", ")", "()"),
            Kind::Set => ("{", "}", "set()"),
            _ => ("{", "}", "{}"),
        };

        let inner = indent + self.width;
        if kind == Kind::Dict {
            let entries = handle.query("pretty_print", Vec::new(), api::dict_items);
            if entries.is_empty() {
                self.out.push_str(empty);
                return;
            }
            self.out.push_str(open);
            let last = entries.len() - 1;
            for (i, (key, value)) in entries.into_iter().enumerate() {
                let (key, value) = (Handle::from_owned(key), Handle::from_owned(value));
                self.line_start(inner);
                self.value(&key, inner);
                self.out.push_str(": ");
                self.value(&value, inner);
                if i < last {
                    self.out.push(',');
                }
            }
        } else {
            let items = snapshot(handle, "pretty_print");
            if items.is_empty() {
                self.out.push_str(empty);
                return;
            }
            self.out.push_str(open);
            let last = items.len() - 1;
            for (i, item) in items.iter().enumerate() {
                self.line_start(inner);
                self.value(item, inner);
                if i < last {
                    self.out.push(',');
                }
            }
        }
        self.line_start(indent);
        self.out.push_str(close);
    }

    fn line_start(&mut self, indent: usize) {
        self.out.push('\n');
        self.out.extend(std::iter::repeat(' ').take(indent));
    }
}
