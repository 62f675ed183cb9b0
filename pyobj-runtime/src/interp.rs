//! Interpreter state - heap, singletons and builtins namespace
//!
//! Ownership convention for every `Interpreter` method:
//! - `ObjRef` arguments are borrowed (the caller keeps its reference)
//! - A returned `ObjRef` is a new reference owned by the caller

use crate::builtins::Builtin;
use crate::error::{RtResult, RuntimeError};
use crate::heap::{Heap, ObjRef};
use crate::object::Object;
use crate::table::Table;

/// Python call depth at which `RecursionError` is raised
pub(crate) const MAX_CALL_DEPTH: usize = 64;

pub(crate) struct Interpreter {
    pub heap: Heap,
    none: ObjRef,
    true_: ObjRef,
    false_: ObjRef,
    /// Name -> builtin callable
    builtins: ObjRef,
    pub depth: usize,
    /// Exceptions being handled by enclosing `except` blocks, innermost last
    pub handling: Vec<RuntimeError>,
    pub calls: u64,
    pub collections: u64,
    pub collected: u64,
}

impl Interpreter {
    pub fn new(epoch: u32) -> RtResult<Self> {
        let mut heap = Heap::new(epoch);
        let none = heap.alloc(Object::None);
        let true_ = heap.alloc(Object::Bool(true));
        let false_ = heap.alloc(Object::Bool(false));
        let builtins = heap.alloc(Object::Dict(Table::new()));

        let mut interp = Self {
            heap,
            none,
            true_,
            false_,
            builtins,
            depth: 0,
            handling: Vec::new(),
            calls: 0,
            collections: 0,
            collected: 0,
        };
        for builtin in Builtin::all() {
            let key = interp.new_str(builtin.name());
            let value = interp.alloc(Object::Builtin(builtin));
            let result = interp.dict_set(builtins, key, value);
            interp.release(key);
            interp.release(value);
            result?;
        }
        Ok(interp)
    }

    pub fn epoch(&self) -> u32 {
        self.heap.epoch()
    }

    // ------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------

    /// Allocate an object that already owns the references it contains
    pub fn alloc(&mut self, object: Object) -> ObjRef {
        self.heap.alloc(object)
    }

    /// Allocate an object built from borrowed references, taking a count on each
    pub fn adopt(&mut self, object: Object) -> RtResult<ObjRef> {
        let mut children = Vec::new();
        object.for_each_child(|child| children.push(child));
        for child in &children {
            self.heap.incref(*child)?;
        }
        Ok(self.heap.alloc(object))
    }

    pub fn new_none(&mut self) -> ObjRef {
        self.share(self.none)
    }

    pub fn new_bool(&mut self, value: bool) -> ObjRef {
        let r = if value { self.true_ } else { self.false_ };
        self.share(r)
    }

    pub fn new_int(&mut self, value: i64) -> ObjRef {
        self.alloc(Object::Int(value))
    }

    pub fn new_float(&mut self, value: f64) -> ObjRef {
        self.alloc(Object::Float(value))
    }

    pub fn new_str(&mut self, value: impl Into<String>) -> ObjRef {
        self.alloc(Object::Str(value.into()))
    }

    /// New list owning `items`
    pub fn new_list(&mut self, items: Vec<ObjRef>) -> ObjRef {
        self.alloc(Object::List(items))
    }

    /// New tuple owning `items`
    pub fn new_tuple(&mut self, items: Vec<ObjRef>) -> ObjRef {
        self.alloc(Object::Tuple(items))
    }

    pub fn new_dict(&mut self) -> ObjRef {
        self.alloc(Object::Dict(Table::new()))
    }

    pub fn new_set(&mut self) -> ObjRef {
        self.alloc(Object::Set(Table::new()))
    }

    pub fn is_none(&self, r: ObjRef) -> bool {
        r == self.none
    }

    pub fn builtins(&self) -> ObjRef {
        self.builtins
    }

    // ------------------------------------------------------------------
    // Reference counting
    // ------------------------------------------------------------------

    /// New reference to a live singleton or borrowed object
    pub fn share(&mut self, r: ObjRef) -> ObjRef {
        // Singletons are never freed while the interpreter is alive
        let _ = self.heap.incref(r);
        r
    }

    pub fn incref(&mut self, r: ObjRef) -> RtResult<ObjRef> {
        self.heap.incref(r)?;
        Ok(r)
    }

    /// Drop a reference this code owns
    pub fn release(&mut self, r: ObjRef) {
        let _ = self.heap.decref(r);
    }

    pub fn release_all(&mut self, refs: impl IntoIterator<Item = ObjRef>) {
        for r in refs {
            self.release(r);
        }
    }

    pub fn get(&self, r: ObjRef) -> RtResult<&Object> {
        self.heap.get(r)
    }

    pub fn get_mut(&mut self, r: ObjRef) -> RtResult<&mut Object> {
        self.heap.get_mut(r)
    }

    /// Run the cycle collector, returning the number of objects reclaimed
    pub fn collect(&mut self) -> usize {
        let freed = self.heap.collect_cycles();
        self.collections += 1;
        self.collected += freed as u64;
        freed
    }

    /// Collect if enough allocations happened since the last pass
    pub fn maybe_collect(&mut self) {
        if self.heap.collection_due() {
            self.collect();
        }
    }

    // ------------------------------------------------------------------
    // Hash tables (dict and set)
    // ------------------------------------------------------------------

    fn table(&self, r: ObjRef) -> RtResult<&Table> {
        match self.get(r)? {
            Object::Dict(table) | Object::Set(table) => Ok(table),
            other => Err(RuntimeError::type_error(format!(
                "'{}' object is not a mapping or set",
                other.object_type().name()
            ))),
        }
    }

    fn table_mut(&mut self, r: ObjRef) -> RtResult<&mut Table> {
        match self.get_mut(r)? {
            Object::Dict(table) | Object::Set(table) => Ok(table),
            other => Err(RuntimeError::type_error(format!(
                "'{}' object is not a mapping or set",
                other.object_type().name()
            ))),
        }
    }

    /// Locate `key` in the table of `owner`, returning its hash and position
    pub fn table_find(&self, owner: ObjRef, key: ObjRef) -> RtResult<(u64, Option<usize>)> {
        let hash = self.hash(key)?;
        let table = self.table(owner)?;
        let pos = table.find(hash, |candidate| self.equal(candidate, key))?;
        Ok((hash, pos))
    }

    /// Snapshot of the keys, borrowed
    pub fn table_keys(&self, owner: ObjRef) -> RtResult<Vec<ObjRef>> {
        Ok(self.table(owner)?.keys())
    }

    /// Snapshot of `(key, value)` pairs, borrowed
    pub fn dict_entries(&self, dict: ObjRef) -> RtResult<Vec<(ObjRef, ObjRef)>> {
        Ok(self
            .table(dict)?
            .iter()
            .filter_map(|entry| entry.value.map(|value| (entry.key, value)))
            .collect())
    }

    /// Insert or replace `key -> value`
    pub fn dict_set(&mut self, dict: ObjRef, key: ObjRef, value: ObjRef) -> RtResult<()> {
        let (hash, pos) = self.table_find(dict, key)?;
        self.heap.incref(value)?;
        match pos {
            Some(pos) => {
                let old = self.table_mut(dict)?.replace_value(pos, value);
                if let Some(old) = old {
                    self.release(old);
                }
            }
            None => {
                self.heap.incref(key)?;
                self.table_mut(dict)?.push(hash, key, Some(value));
            }
        }
        Ok(())
    }

    /// Borrowed value for `key`
    pub fn dict_lookup(&self, dict: ObjRef, key: ObjRef) -> RtResult<Option<ObjRef>> {
        let (_, pos) = self.table_find(dict, key)?;
        Ok(pos
            .and_then(|pos| self.table(dict).ok()?.entry(pos))
            .and_then(|entry| entry.value))
    }

    /// Borrowed value for a text key
    pub fn dict_lookup_str(&self, dict: ObjRef, name: &str) -> RtResult<Option<ObjRef>> {
        let table = self.table(dict)?;
        for entry in table.iter() {
            if self.get(entry.key)?.as_str() == Some(name) {
                return Ok(entry.value);
            }
        }
        Ok(None)
    }

    pub fn dict_set_str(&mut self, dict: ObjRef, name: &str, value: ObjRef) -> RtResult<()> {
        let key = self.new_str(name);
        let result = self.dict_set(dict, key, value);
        self.release(key);
        result
    }

    /// Remove `key`, returning the owned value (or the owned key for sets)
    pub fn table_remove(&mut self, owner: ObjRef, key: ObjRef) -> RtResult<Option<ObjRef>> {
        let (_, pos) = self.table_find(owner, key)?;
        let Some(pos) = pos else {
            return Ok(None);
        };
        let entry = self.table_mut(owner)?.remove(pos);
        Ok(entry.map(|entry| match entry.value {
            Some(value) => {
                self.release(entry.key);
                value
            }
            None => entry.key,
        }))
    }

    /// Add a member to a set; returns whether it was inserted
    pub fn set_add(&mut self, set: ObjRef, key: ObjRef) -> RtResult<bool> {
        let (hash, pos) = self.table_find(set, key)?;
        if pos.is_some() {
            return Ok(false);
        }
        self.heap.incref(key)?;
        self.table_mut(set)?.push(hash, key, None);
        Ok(true)
    }

    pub fn table_contains(&self, owner: ObjRef, key: ObjRef) -> RtResult<bool> {
        Ok(self.table_find(owner, key)?.1.is_some())
    }

    /// Remove the most recent entry, returning owned `(key, value)`
    pub fn table_pop_last(&mut self, owner: ObjRef) -> RtResult<Option<(ObjRef, Option<ObjRef>)>> {
        Ok(self
            .table_mut(owner)?
            .pop_last()
            .map(|entry| (entry.key, entry.value)))
    }

    pub fn table_clear(&mut self, owner: ObjRef) -> RtResult<()> {
        let entries = self.table_mut(owner)?.drain();
        for entry in entries {
            self.release(entry.key);
            if let Some(value) = entry.value {
                self.release(value);
            }
        }
        Ok(())
    }

    /// Convert an owned list of text into a counted list object
    pub fn str_list(&mut self, items: Vec<String>) -> ObjRef {
        let refs = items.into_iter().map(|s| self.new_str(s)).collect();
        self.new_list(refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singletons_are_shared() {
        let mut interp = Interpreter::new(1).unwrap();
        let a = interp.new_none();
        let b = interp.new_none();
        assert_eq!(a, b);
        assert!(interp.is_none(a));
        interp.release(a);
        interp.release(b);
        assert!(interp.get(interp.none).is_ok());
    }

    #[test]
    fn test_builtins_registered() {
        let interp = Interpreter::new(1).unwrap();
        let len = interp.dict_lookup_str(interp.builtins(), "len").unwrap();
        assert!(len.is_some());
        assert!(interp.get(len.unwrap()).unwrap().is_callable());
    }

    #[test]
    fn test_dict_set_replaces_value() {
        let mut interp = Interpreter::new(1).unwrap();
        let dict = interp.new_dict();
        let one = interp.new_int(1);
        let two = interp.new_int(2);
        interp.dict_set_str(dict, "k", one).unwrap();
        interp.dict_set_str(dict, "k", two).unwrap();

        assert_eq!(interp.table(dict).unwrap().len(), 1);
        assert_eq!(interp.heap.refcount(one), 1);
        assert_eq!(interp.dict_lookup_str(dict, "k").unwrap(), Some(two));
    }

    #[test]
    fn test_adopt_counts_children() {
        let mut interp = Interpreter::new(1).unwrap();
        let item = interp.new_int(3);
        let list = interp.adopt(Object::List(vec![item])).unwrap();
        assert_eq!(interp.heap.refcount(item), 2);
        interp.release(list);
        assert_eq!(interp.heap.refcount(item), 1);
    }

    #[test]
    fn test_set_add_deduplicates() {
        let mut interp = Interpreter::new(1).unwrap();
        let set = interp.new_set();
        let a = interp.new_int(1);
        let b = interp.new_float(1.0);
        assert!(interp.set_add(set, a).unwrap());
        assert!(!interp.set_add(set, b).unwrap());
        assert_eq!(interp.table(set).unwrap().len(), 1);
    }
}
