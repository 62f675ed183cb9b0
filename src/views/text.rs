//! Text - runtime `str`

use pyobj_runtime::api;

use super::{normalize_index, View};
use crate::core::{Handle, Kind};

#[derive(Clone)]
pub struct Text {
    handle: Handle,
}

impl_view!(Text, Kind::Text);

impl Text {
    /// `""`
    pub fn new() -> Self {
        Self::from_str_value("")
    }

    fn from_str_value(value: &str) -> Self {
        Self {
            handle: Handle::from(value),
        }
    }

    /// Wrap the result of a method that returns text
    fn method(&self, name: &str, args: &[&Handle]) -> Text {
        Text::from_handle(self.handle.invoke("text", name, args))
    }

    fn predicate(&self, name: &str, args: &[&Handle]) -> bool {
        self.handle.invoke("text", name, args).as_bool().unwrap_or(false)
    }

    pub fn capitalize(&self) -> Text {
        self.method("capitalize", &[])
    }

    pub fn upper(&self) -> Text {
        self.method("upper", &[])
    }

    pub fn lower(&self) -> Text {
        self.method("lower", &[])
    }

    pub fn title(&self) -> Text {
        self.method("title", &[])
    }

    pub fn strip(&self) -> Text {
        self.method("strip", &[])
    }

    pub fn lstrip(&self) -> Text {
        self.method("lstrip", &[])
    }

    pub fn rstrip(&self) -> Text {
        self.method("rstrip", &[])
    }

    pub fn replace(&self, old: &str, new: &str) -> Text {
        self.method("replace", &[&Handle::from(old), &Handle::from(new)])
    }

    /// Split on `sep`, or on runs of whitespace when `sep` is `None`
    pub fn split(&self, sep: Option<&str>) -> Vec<Text> {
        let parts = match sep {
            Some(sep) => self.handle.invoke("text", "split", &[&Handle::from(sep)]),
            None => self.handle.invoke("text", "split", &[]),
        };
        parts
            .query("text", Vec::new(), api::iterate)
            .into_iter()
            .map(|raw| Text::from_handle(Handle::from_owned(raw)))
            .collect()
    }

    /// Concatenate `parts` with `self` between them
    pub fn join(&self, parts: &[Text]) -> Text {
        let list = super::List::from_handles(parts.iter().map(Handle::from).collect());
        self.method("join", &[list.handle()])
    }

    pub fn startswith(&self, prefix: &str) -> bool {
        self.predicate("startswith", &[&Handle::from(prefix)])
    }

    pub fn endswith(&self, suffix: &str) -> bool {
        self.predicate("endswith", &[&Handle::from(suffix)])
    }

    /// Code-point offset of `needle`, -1 when absent
    pub fn find(&self, needle: &str) -> i64 {
        self.handle
            .invoke("text", "find", &[&Handle::from(needle)])
            .as_i64()
            .unwrap_or(-1)
    }

    /// Non-overlapping occurrences of `needle`
    pub fn count(&self, needle: &str) -> usize {
        let count = self.handle.invoke("text", "count", &[&Handle::from(needle)]);
        count.as_i64().and_then(|n| usize::try_from(n).ok()).unwrap_or(0)
    }

    pub fn isdigit(&self) -> bool {
        self.predicate("isdigit", &[])
    }

    pub fn isalpha(&self) -> bool {
        self.predicate("isalpha", &[])
    }

    pub fn isalnum(&self) -> bool {
        self.predicate("isalnum", &[])
    }

    pub fn isspace(&self) -> bool {
        self.predicate("isspace", &[])
    }

    pub fn isupper(&self) -> bool {
        self.predicate("isupper", &[])
    }

    pub fn islower(&self) -> bool {
        self.predicate("islower", &[])
    }

    /// One-character text at `index`; empty when out of range
    pub fn char_at(&self, index: i64) -> Text {
        let Some(index) = normalize_index(index, self.len()) else {
            return Text::new();
        };
        let key = Handle::from(index);
        let item = self
            .handle
            .produce("text", |raw| api::get_item(raw, key.require()?));
        Text::from_handle(item)
    }

    /// Host copy of the text; empty if unavailable
    pub fn as_str_lossy(&self) -> String {
        self.handle.as_string().unwrap_or_default()
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Self::from_str_value(value)
    }
}

impl From<String> for Text {
    fn from(value: String) -> Self {
        Self::from_str_value(&value)
    }
}

impl From<&String> for Text {
    fn from(value: &String) -> Self {
        Self::from_str_value(value)
    }
}
