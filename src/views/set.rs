//! Set - runtime `set`; algebra goes through the runtime's set operators

use pyobj_runtime::{api, BinaryOp, CompareOp};

use super::list::snapshot;
use super::View;
use crate::core::handle::Packed;
use crate::core::{Handle, Kind};
use crate::infrastructure::diagnostics;

#[derive(Clone)]
pub struct Set {
    handle: Handle,
}

impl_view!(Set, Kind::Set);

impl Set {
    /// `set()`
    pub fn new() -> Self {
        Self {
            handle: Handle::from_result("set", api::new_set()),
        }
    }

    /// Insert `value`; true if it was not already a member
    pub fn add(&self, value: impl Into<Handle>) -> bool {
        let value = value.into();
        self.handle.query("set.add", false, |raw| {
            let packed = Packed::new([&value])?;
            api::set_add(raw, packed.as_slice()[0])
        })
    }

    /// Remove `value` if present
    pub fn discard(&self, value: impl Into<Handle>) {
        self.remove(value);
    }

    /// Remove `value`; false when it was not a member
    pub fn remove(&self, value: impl Into<Handle>) -> bool {
        let value = value.into();
        self.handle.query("set.remove", false, |raw| {
            let packed = Packed::new([&value])?;
            api::discard(raw, packed.as_slice()[0])
        })
    }

    /// Remove and return an arbitrary member; empty when the set is empty
    pub fn pop(&self) -> Handle {
        if self.len() == 0 {
            return Handle::empty();
        }
        self.handle.invoke("set.pop", "pop", &[])
    }

    pub fn contains(&self, value: impl Into<Handle>) -> bool {
        let value = value.into();
        self.handle.query("set.contains", false, |raw| {
            let packed = Packed::new([&value])?;
            api::contains(raw, packed.as_slice()[0])
        })
    }

    pub fn clear(&self) {
        self.handle.invoke_discard("set.clear", "clear", &[]);
    }

    fn operator(&self, op: BinaryOp, other: &Set) -> Set {
        let (Some(a), Some(b)) = (self.handle.raw(), other.handle.raw()) else {
            return Set::new();
        };
        match api::binary_op(op, a, b) {
            Ok(raw) => Set::from_handle(Handle::from_owned(raw)),
            Err(err) => {
                diagnostics::report("set.algebra", err);
                Set::new()
            }
        }
    }

    /// `self | other`
    pub fn union(&self, other: &Set) -> Set {
        self.operator(BinaryOp::BitOr, other)
    }

    /// `self & other`
    pub fn intersection(&self, other: &Set) -> Set {
        self.operator(BinaryOp::BitAnd, other)
    }

    /// `self - other`
    pub fn difference(&self, other: &Set) -> Set {
        self.operator(BinaryOp::Sub, other)
    }

    /// `self ^ other`
    pub fn symmetric_difference(&self, other: &Set) -> Set {
        self.operator(BinaryOp::BitXor, other)
    }

    fn relation(&self, op: CompareOp, other: &Set) -> bool {
        let (Some(a), Some(b)) = (self.handle.raw(), other.handle.raw()) else {
            return false;
        };
        match api::compare(a, b, op) {
            Ok(holds) => holds,
            Err(err) => {
                diagnostics::report("set.compare", err);
                false
            }
        }
    }

    /// `self <= other`
    pub fn is_subset(&self, other: &Set) -> bool {
        self.relation(CompareOp::Le, other)
    }

    /// `self >= other`
    pub fn is_superset(&self, other: &Set) -> bool {
        self.relation(CompareOp::Ge, other)
    }

    pub fn is_disjoint(&self, other: &Set) -> bool {
        self.intersection(other).len() == 0
    }

    pub fn to_vec(&self) -> Vec<Handle> {
        snapshot(&self.handle, "set.iter")
    }

    pub fn iter(&self) -> std::vec::IntoIter<Handle> {
        self.to_vec().into_iter()
    }
}

impl IntoIterator for &Set {
    type Item = Handle;
    type IntoIter = std::vec::IntoIter<Handle>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Into<Handle>> FromIterator<T> for Set {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let set = Set::new();
        for value in iter {
            set.add(value);
        }
        set
    }
}

/// Build a [`Set`] from values convertible into handles
#[macro_export]
macro_rules! set {
    () => {
        $crate::views::Set::new()
    };
    ($($item:expr),+ $(,)?) => {{
        let set = $crate::views::Set::new();
        $( set.add($item); )+
        set
    }};
}
