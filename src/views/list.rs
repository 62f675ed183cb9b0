//! List - runtime `list`

use pyobj_runtime::api;

use super::{normalize_index, View};
use crate::core::handle::Packed;
use crate::core::{Handle, Kind};

#[derive(Clone)]
pub struct List {
    handle: Handle,
}

impl_view!(List, Kind::List);

impl List {
    /// `[]`
    pub fn new() -> Self {
        Self::from_handles(Vec::new())
    }

    /// List holding a share of every handle, in order
    pub fn from_handles(items: Vec<Handle>) -> Self {
        let handle = Handle::from_result("list", {
            Packed::new(&items).and_then(|packed| api::new_list(packed.as_slice()))
        });
        Self { handle }
    }

    fn position(&self, index: i64) -> Option<usize> {
        normalize_index(index, self.len())
    }

    /// Element at `index`; empty when out of range
    pub fn get(&self, index: i64) -> Handle {
        let Some(index) = self.position(index) else {
            return Handle::empty();
        };
        let key = Handle::from(index);
        self.handle
            .produce("list.get", |raw| api::get_item(raw, key.require()?))
    }

    /// Replace the element at `index`; false when out of range
    pub fn set(&self, index: i64, value: impl Into<Handle>) -> bool {
        let Some(index) = self.position(index) else {
            return false;
        };
        let key = Handle::from(index);
        let value = value.into();
        self.handle.query("list.set", false, |raw| {
            let packed = Packed::new([&value])?;
            api::set_item(raw, key.require()?, packed.as_slice()[0])?;
            Ok(true)
        })
    }

    pub fn append(&self, value: impl Into<Handle>) {
        let value = value.into();
        self.handle.invoke_discard("list.append", "append", &[&value]);
    }

    /// Insert before `index`; the runtime clamps out-of-range positions
    pub fn insert(&self, index: i64, value: impl Into<Handle>) {
        let value = value.into();
        self.handle
            .invoke_discard("list.insert", "insert", &[&Handle::from(index), &value]);
    }

    pub fn extend(&self, other: &List) {
        self.handle.invoke_discard("list.extend", "extend", &[other.handle()]);
    }

    /// Remove the first element equal to `value`; false when there is none
    pub fn remove(&self, value: impl Into<Handle>) -> bool {
        let value = value.into();
        if !self.contains(&value) {
            return false;
        }
        self.handle.invoke_discard("list.remove", "remove", &[&value])
    }

    /// Remove and return the element at `index`; empty when out of range
    pub fn pop(&self, index: i64) -> Handle {
        let Some(index) = self.position(index) else {
            return Handle::empty();
        };
        self.handle.invoke("list.pop", "pop", &[&Handle::from(index)])
    }

    pub fn pop_last(&self) -> Handle {
        self.pop(-1)
    }

    /// Position of the first element equal to `value`
    pub fn index_of(&self, value: impl Into<Handle>) -> Option<usize> {
        let value = value.into();
        if !self.contains(&value) {
            return None;
        }
        let index = self.handle.invoke("list.index_of", "index", &[&value]);
        index.as_i64().and_then(|i| usize::try_from(i).ok())
    }

    pub fn count(&self, value: impl Into<Handle>) -> usize {
        let value = value.into();
        let count = self.handle.invoke("list.count", "count", &[&value]);
        count.as_i64().and_then(|n| usize::try_from(n).ok()).unwrap_or(0)
    }

    pub fn contains(&self, value: impl Into<Handle>) -> bool {
        let value = value.into();
        self.handle.query("list.contains", false, |raw| {
            let packed = Packed::new([&value])?;
            api::contains(raw, packed.as_slice()[0])
        })
    }

    /// Sort in place with the runtime's ordering
    pub fn sort(&self) {
        self.handle.invoke_discard("list.sort", "sort", &[]);
    }

    pub fn reverse(&self) {
        self.handle.invoke_discard("list.reverse", "reverse", &[]);
    }

    pub fn clear(&self) {
        self.handle.invoke_discard("list.clear", "clear", &[]);
    }

    /// Iterate over a snapshot of the elements
    pub fn iter(&self) -> std::vec::IntoIter<Handle> {
        self.to_vec().into_iter()
    }

    pub fn to_vec(&self) -> Vec<Handle> {
        snapshot(&self.handle, "list.iter")
    }
}

/// Owned handles for every element of an iterable
pub(crate) fn snapshot(handle: &Handle, op: &'static str) -> Vec<Handle> {
    handle
        .query(op, Vec::new(), api::iterate)
        .into_iter()
        .map(Handle::from_owned)
        .collect()
}

impl IntoIterator for &List {
    type Item = Handle;
    type IntoIter = std::vec::IntoIter<Handle>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Handle> for List {
    fn from_iter<I: IntoIterator<Item = Handle>>(iter: I) -> Self {
        Self::from_handles(iter.into_iter().collect())
    }
}

/// Build a [`List`] from values convertible into handles
///
/// ```ignore
/// let numbers = list![1, 2.5, "three"];
/// ```
#[macro_export]
macro_rules! list {
    () => {
        $crate::views::List::new()
    };
    ($($item:expr),+ $(,)?) => {
        $crate::views::List::from_handles(vec![$($crate::core::Handle::from($item)),+])
    };
}
