//! Introspection and presentation - type names, `Display`, pretty printing

mod pretty;

pub use pretty::{pretty_print, pretty_print_indent};

use std::cell::RefCell;
use std::fmt;

use pyobj_runtime::{api, ObjRef};

use crate::core::{Handle, Kind};
use crate::views::list::snapshot;

/// Runtime type name; `"NoneType"` for an empty handle
pub fn type_name(handle: &Handle) -> String {
    if handle.is_null() {
        return "NoneType".to_string();
    }
    handle.query("type_name", "<unknown>".to_string(), api::type_name)
}

impl Handle {
    pub fn type_name(&self) -> String {
        type_name(self)
    }
}

/// Containers nested deeper than this render as `...`
const MAX_DEPTH: usize = 128;

thread_local! {
    /// Containers being rendered on this thread, outermost first
    static ACTIVE: RefCell<Vec<ObjRef>> = RefCell::new(Vec::new());
}

/// Marks a container as being rendered until dropped
pub(crate) struct Visit;

impl Visit {
    /// `None` when `handle` is already being rendered further up (a cycle)
    /// or the nesting is past `MAX_DEPTH`
    pub(crate) fn enter(handle: &Handle) -> Option<Visit> {
        let raw = handle.raw()?;
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if active.len() >= MAX_DEPTH || active.contains(&raw) {
                return None;
            }
            active.push(raw);
            Some(Visit)
        })
    }
}

impl Drop for Visit {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            active.borrow_mut().pop();
        });
    }
}

/// Inline rendering: quoted text, bare numbers, bracketed containers
impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind();
        if kind.is_container() {
            let Some(_visit) = Visit::enter(self) else {
                return f.write_str("...");
            };
            return write_container(self, kind, f);
        }
        match kind {
            Kind::Null => f.write_str("None"),
            Kind::Text => write!(f, "\"{}\"", self.as_string().unwrap_or_default()),
            _ => f.write_str(&self.to_text()),
        }
    }
}

fn write_container(handle: &Handle, kind: Kind, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match kind {
        Kind::List => write_items(f, "[", &snapshot(handle, "display"), "]"),
        Kind::Tuple => write_items(f, "(", &snapshot(handle, "display"), ")"),
        Kind::Set => write_items(f, "{", &snapshot(handle, "display"), "}"),
        _ => {
            f.write_str("{")?;
            let entries = handle.query("display", Vec::new(), api::dict_items);
            for (i, (key, value)) in entries.into_iter().enumerate() {
                let (key, value) = (Handle::from_owned(key), Handle::from_owned(value));
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}: {}", key, value)?;
            }
            f.write_str("}")
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, open: &str, items: &[Handle], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str(close)
}
