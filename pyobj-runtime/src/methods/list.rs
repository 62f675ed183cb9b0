//! `list` methods

use super::CallArgs;
use crate::error::{ExcKind, RtResult, RuntimeError};
use crate::heap::ObjRef;
use crate::interp::Interpreter;
use crate::object::Object;
use crate::ops::CompareOp;

pub(super) const METHODS: &[&str] = &[
    "append", "insert", "extend", "remove", "pop", "sort", "reverse", "index", "count", "clear",
    "copy",
];

/// Stable merge sort with a fallible comparison
///
/// `less(a, b)` must report whether `a` sorts strictly before `b`.
pub(crate) fn merge_sort<T: Copy>(
    items: &mut [T],
    less: &mut impl FnMut(T, T) -> RtResult<bool>,
) -> RtResult<()> {
    if items.len() < 2 {
        return Ok(());
    }
    let mid = items.len() / 2;
    merge_sort(&mut items[..mid], less)?;
    merge_sort(&mut items[mid..], less)?;

    let mut merged = Vec::with_capacity(items.len());
    let (mut i, mut j) = (0, mid);
    while i < mid && j < items.len() {
        // Take from the right run only when strictly smaller
        if less(items[j], items[i])? {
            merged.push(items[j]);
            j += 1;
        } else {
            merged.push(items[i]);
            i += 1;
        }
    }
    merged.extend_from_slice(&items[i..mid]);
    merged.extend_from_slice(&items[j..]);
    items.copy_from_slice(&merged);
    Ok(())
}

impl Interpreter {
    fn list_items(&self, list: ObjRef) -> RtResult<&Vec<ObjRef>> {
        match self.get(list)? {
            Object::List(items) | Object::Tuple(items) => Ok(items),
            other => Err(RuntimeError::type_error(format!(
                "expected list, got {}",
                other.object_type().name()
            ))),
        }
    }

    fn list_items_mut(&mut self, list: ObjRef) -> RtResult<&mut Vec<ObjRef>> {
        match self.get_mut(list)? {
            Object::List(items) => Ok(items),
            other => Err(RuntimeError::type_error(format!(
                "expected list, got {}",
                other.object_type().name()
            ))),
        }
    }

    /// Position of the first element equal to `value`
    pub(crate) fn position_of(&self, sequence: ObjRef, value: ObjRef) -> RtResult<Option<usize>> {
        for (pos, item) in self.list_items(sequence)?.iter().enumerate() {
            if self.equal(*item, value)? {
                return Ok(Some(pos));
            }
        }
        Ok(None)
    }

    pub(crate) fn count_of(&self, sequence: ObjRef, value: ObjRef) -> RtResult<usize> {
        let mut count = 0;
        for item in self.list_items(sequence)? {
            if self.equal(*item, value)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Append a borrowed reference to a list
    pub(crate) fn list_append(&mut self, list: ObjRef, value: ObjRef) -> RtResult<()> {
        self.heap.incref(value)?;
        self.list_items_mut(list)?.push(value);
        Ok(())
    }

    /// Append every element of `iterable`
    pub(crate) fn list_extend(&mut self, list: ObjRef, iterable: ObjRef) -> RtResult<()> {
        let items = self.iterate(iterable)?;
        match self.list_items_mut(list) {
            Ok(target) => {
                target.extend(items);
                Ok(())
            }
            Err(err) => {
                self.release_all(items);
                Err(err)
            }
        }
    }

    /// Sort `items` in place, optionally by a key callable
    pub(crate) fn sort_refs(
        &mut self,
        items: &mut Vec<ObjRef>,
        key: Option<ObjRef>,
        reverse: bool,
    ) -> RtResult<()> {
        let Some(key) = key else {
            let mut less = |a: ObjRef, b: ObjRef| {
                if reverse {
                    self.compare(b, a, CompareOp::Lt)
                } else {
                    self.compare(a, b, CompareOp::Lt)
                }
            };
            return merge_sort(items, &mut less);
        };

        let mut keyed = Vec::with_capacity(items.len());
        for item in items.iter() {
            match self.call(key, &[*item], &[]) {
                Ok(k) => keyed.push((k, *item)),
                Err(err) => {
                    self.release_all(keyed.into_iter().map(|(k, _)| k));
                    return Err(err);
                }
            }
        }
        let outcome = {
            let mut less = |a: (ObjRef, ObjRef), b: (ObjRef, ObjRef)| {
                if reverse {
                    self.compare(b.0, a.0, CompareOp::Lt)
                } else {
                    self.compare(a.0, b.0, CompareOp::Lt)
                }
            };
            merge_sort(&mut keyed, &mut less)
        };
        if outcome.is_ok() {
            for (slot, (_, item)) in items.iter_mut().zip(&keyed) {
                *slot = *item;
            }
        }
        self.release_all(keyed.into_iter().map(|(k, _)| k));
        outcome
    }

    pub(super) fn list_method(
        &mut self,
        receiver: ObjRef,
        name: &str,
        args: CallArgs<'_>,
    ) -> RtResult<ObjRef> {
        match name {
            "append" => {
                args.simple(1, 1)?;
                self.list_append(receiver, args.required(0)?)?;
            }
            "insert" => {
                args.simple(2, 2)?;
                let len = self.list_items(receiver)?.len();
                let pos = self.clamp_index(args.required(0)?, len)?;
                let value = self.incref(args.required(1)?)?;
                self.list_items_mut(receiver)?.insert(pos, value);
            }
            "extend" => {
                args.simple(1, 1)?;
                self.list_extend(receiver, args.required(0)?)?;
            }
            "remove" => {
                args.simple(1, 1)?;
                let Some(pos) = self.position_of(receiver, args.required(0)?)? else {
                    return Err(RuntimeError::value_error("list.remove(x): x not in list"));
                };
                let removed = self.list_items_mut(receiver)?.remove(pos);
                self.release(removed);
            }
            "pop" => {
                args.simple(0, 1)?;
                let len = self.list_items(receiver)?.len();
                if len == 0 {
                    return Err(RuntimeError::new(ExcKind::IndexError, "pop from empty list"));
                }
                let raw = match args.get(0) {
                    Some(index) => self.to_int(index)?,
                    None => -1,
                };
                let pos = if raw < 0 { raw + len as i64 } else { raw };
                if pos < 0 || pos >= len as i64 {
                    return Err(RuntimeError::new(ExcKind::IndexError, "pop index out of range"));
                }
                // Ownership of the removed element moves to the caller
                return Ok(self.list_items_mut(receiver)?.remove(pos as usize));
            }
            "sort" => {
                args.keywords_only(&["key", "reverse"])?;
                args.arity(0, 0)?;
                let key = args.keyword("key").filter(|k| !self.is_none(*k));
                let reverse = match args.keyword("reverse") {
                    Some(flag) => self.truthy(flag)?,
                    None => false,
                };
                let mut items = self.list_items(receiver)?.clone();
                self.sort_refs(&mut items, key, reverse)?;
                *self.list_items_mut(receiver)? = items;
            }
            "reverse" => {
                args.simple(0, 0)?;
                self.list_items_mut(receiver)?.reverse();
            }
            "index" => {
                args.simple(1, 1)?;
                let value = args.required(0)?;
                return match self.position_of(receiver, value)? {
                    Some(pos) => Ok(self.new_int(pos as i64)),
                    None => Err(RuntimeError::value_error(format!(
                        "{} is not in list",
                        self.repr(value)?
                    ))),
                };
            }
            "count" => {
                args.simple(1, 1)?;
                let count = self.count_of(receiver, args.required(0)?)?;
                return Ok(self.new_int(count as i64));
            }
            "clear" => {
                args.simple(0, 0)?;
                let items = std::mem::take(self.list_items_mut(receiver)?);
                self.release_all(items);
            }
            _ => {
                args.simple(0, 0)?;
                let items = self.list_items(receiver)?.clone();
                return self.adopt(Object::List(items));
            }
        }
        Ok(self.new_none())
    }
}
