//! Dict - runtime `dict`, insertion ordered
//!
//! Keys are any hashable handle; text keys can be passed as `&str`. Lookups
//! and pops of absent keys give an empty handle and leave the dict untouched.

use pyobj_runtime::api;

use super::{List, View};
use crate::core::handle::Packed;
use crate::core::{Handle, Kind};

#[derive(Clone)]
pub struct Dict {
    handle: Handle,
}

impl_view!(Dict, Kind::Dict);

impl Dict {
    /// `{}`
    pub fn new() -> Self {
        Self {
            handle: Handle::from_result("dict", api::new_dict()),
        }
    }

    /// Insert or overwrite; false if the runtime refused (unhashable key)
    pub fn add(&self, key: impl Into<Handle>, value: impl Into<Handle>) -> bool {
        let (key, value) = (key.into(), value.into());
        self.handle.query("dict.add", false, |raw| {
            let packed = Packed::new([&key, &value])?;
            let [key, value] = [packed.as_slice()[0], packed.as_slice()[1]];
            api::dict_set(raw, key, value)?;
            Ok(true)
        })
    }

    /// Value for `key`; empty when absent
    pub fn get(&self, key: impl Into<Handle>) -> Handle {
        let key = key.into();
        let found = self.handle.query("dict.get", None, |raw| {
            let packed = Packed::new([&key])?;
            api::dict_get(raw, packed.as_slice()[0])
        });
        found.map(Handle::from_owned).unwrap_or_default()
    }

    pub fn get_or(&self, key: impl Into<Handle>, default: impl Into<Handle>) -> Handle {
        let found = self.get(key);
        if found.is_null() {
            default.into()
        } else {
            found
        }
    }

    /// Remove `key` and hand back its value; empty (and no change) when absent
    pub fn pop(&self, key: impl Into<Handle>) -> Handle {
        let key = key.into();
        let removed = self.handle.query("dict.pop", None, |raw| {
            let packed = Packed::new([&key])?;
            api::dict_pop(raw, packed.as_slice()[0])
        });
        removed.map(Handle::from_owned).unwrap_or_default()
    }

    pub fn contains(&self, key: impl Into<Handle>) -> bool {
        let key = key.into();
        self.handle.query("dict.contains", false, |raw| {
            let packed = Packed::new([&key])?;
            api::contains(raw, packed.as_slice()[0])
        })
    }

    /// Remove `key`; false when it was absent
    pub fn remove(&self, key: impl Into<Handle>) -> bool {
        let key = key.into();
        self.handle.query("dict.remove", false, |raw| {
            let packed = Packed::new([&key])?;
            api::discard(raw, packed.as_slice()[0])
        })
    }

    pub fn keys(&self) -> List {
        let keys = self.handle.query("dict.keys", Vec::new(), api::dict_keys);
        List::from_handles(keys.into_iter().map(Handle::from_owned).collect())
    }

    pub fn values(&self) -> List {
        List::from_handles(self.items().into_iter().map(|(_, value)| value).collect())
    }

    /// `(key, value)` pairs in insertion order
    pub fn items(&self) -> Vec<(Handle, Handle)> {
        self.handle
            .query("dict.items", Vec::new(), api::dict_items)
            .into_iter()
            .map(|(key, value)| (Handle::from_owned(key), Handle::from_owned(value)))
            .collect()
    }

    /// Copy every entry of `other` into `self`
    pub fn update(&self, other: &Dict) {
        self.handle.invoke_discard("dict.update", "update", &[other.handle()]);
    }

    pub fn clear(&self) {
        self.handle.invoke_discard("dict.clear", "clear", &[]);
    }
}

impl<K: Into<Handle>, V: Into<Handle>> FromIterator<(K, V)> for Dict {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let dict = Dict::new();
        for (key, value) in iter {
            dict.add(key, value);
        }
        dict
    }
}

/// Build a [`Dict`] from `key => value` pairs
///
/// ```ignore
/// let point = dict! { "x" => 10, "y" => "s" };
/// ```
#[macro_export]
macro_rules! dict {
    () => {
        $crate::views::Dict::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let dict = $crate::views::Dict::new();
        $( dict.add($key, $value); )+
        dict
    }};
}
