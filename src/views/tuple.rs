//! Tuple - runtime `tuple`, fixed after construction

use pyobj_runtime::api;

use super::list::snapshot;
use super::normalize_index;
use crate::core::handle::Packed;
use crate::core::{Handle, Kind};

#[derive(Clone)]
pub struct Tuple {
    handle: Handle,
}

impl_view!(Tuple, Kind::Tuple);

impl Tuple {
    /// `()`
    pub fn new() -> Self {
        Self::from_handles(Vec::new())
    }

    pub fn from_handles(items: Vec<Handle>) -> Self {
        let handle = Handle::from_result("tuple", {
            Packed::new(&items).and_then(|packed| api::new_tuple(packed.as_slice()))
        });
        Self { handle }
    }

    /// Element at `index`; empty when out of range
    pub fn get(&self, index: i64) -> Handle {
        let Some(index) = normalize_index(index, self.len()) else {
            return Handle::empty();
        };
        let key = Handle::from(index);
        self.handle
            .produce("tuple.get", |raw| api::get_item(raw, key.require()?))
    }

    pub fn contains(&self, value: impl Into<Handle>) -> bool {
        let value = value.into();
        self.handle.query("tuple.contains", false, |raw| {
            let packed = Packed::new([&value])?;
            api::contains(raw, packed.as_slice()[0])
        })
    }

    pub fn iter(&self) -> std::vec::IntoIter<Handle> {
        self.to_vec().into_iter()
    }

    pub fn to_vec(&self) -> Vec<Handle> {
        snapshot(&self.handle, "tuple.iter")
    }
}

impl IntoIterator for &Tuple {
    type Item = Handle;
    type IntoIter = std::vec::IntoIter<Handle>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Handle> for Tuple {
    fn from_iter<I: IntoIterator<Item = Handle>>(iter: I) -> Self {
        Self::from_handles(iter.into_iter().collect())
    }
}

/// Build a [`Tuple`] from values convertible into handles
#[macro_export]
macro_rules! tuple {
    () => {
        $crate::views::Tuple::new()
    };
    ($($item:expr),+ $(,)?) => {
        $crate::views::Tuple::from_handles(vec![$($crate::core::Handle::from($item)),+])
    };
}
