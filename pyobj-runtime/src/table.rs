//! Insertion-ordered hash table backing dicts and sets
//!
//! Keys are heap objects, so key equality needs the heap. The table only
//! stores precomputed hashes and asks the caller to compare candidates.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::error::RtResult;
use crate::heap::ObjRef;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Entry {
    pub hash: u64,
    pub key: ObjRef,
    /// `None` for set members
    pub value: Option<ObjRef>,
}

#[derive(Debug, Default)]
pub(crate) struct Table {
    entries: Vec<Option<Entry>>,
    index: HashMap<u64, SmallVec<[usize; 2]>>,
    len: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Position of the entry whose key matches, comparing same-hash candidates with `eq`
    pub fn find(
        &self,
        hash: u64,
        mut eq: impl FnMut(ObjRef) -> RtResult<bool>,
    ) -> RtResult<Option<usize>> {
        let Some(positions) = self.index.get(&hash) else {
            return Ok(None);
        };
        for &pos in positions {
            if let Some(entry) = &self.entries[pos] {
                if eq(entry.key)? {
                    return Ok(Some(pos));
                }
            }
        }
        Ok(None)
    }

    pub fn entry(&self, pos: usize) -> Option<&Entry> {
        self.entries.get(pos).and_then(Option::as_ref)
    }

    /// Append a new entry; the caller has checked the key is absent
    pub fn push(&mut self, hash: u64, key: ObjRef, value: Option<ObjRef>) {
        let pos = self.entries.len();
        self.entries.push(Some(Entry { hash, key, value }));
        self.index.entry(hash).or_default().push(pos);
        self.len += 1;
    }

    /// Swap in a new value, returning the one it replaced
    pub fn replace_value(&mut self, pos: usize, value: ObjRef) -> Option<ObjRef> {
        self.entries
            .get_mut(pos)
            .and_then(Option::as_mut)
            .and_then(|entry| entry.value.replace(value))
    }

    pub fn remove(&mut self, pos: usize) -> Option<Entry> {
        let entry = self.entries.get_mut(pos)?.take()?;
        if let Some(positions) = self.index.get_mut(&entry.hash) {
            positions.retain(|p| *p != pos);
            if positions.is_empty() {
                self.index.remove(&entry.hash);
            }
        }
        self.len -= 1;
        if self.entries.len() > 8 && self.len * 2 < self.entries.len() {
            self.compact();
        }
        Some(entry)
    }

    /// Remove the most recently inserted entry
    pub fn pop_last(&mut self) -> Option<Entry> {
        let pos = self.entries.iter().rposition(Option::is_some)?;
        self.remove(pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().flatten()
    }

    pub fn keys(&self) -> Vec<ObjRef> {
        self.iter().map(|entry| entry.key).collect()
    }

    /// Remove every entry, handing them back for release
    pub fn drain(&mut self) -> Vec<Entry> {
        self.index.clear();
        self.len = 0;
        self.entries.drain(..).flatten().collect()
    }

    fn compact(&mut self) {
        let live: Vec<Entry> = self.entries.drain(..).flatten().collect();
        self.index.clear();
        self.len = 0;
        for entry in live {
            self.push(entry.hash, entry.key, entry.value);
        }
    }
}
