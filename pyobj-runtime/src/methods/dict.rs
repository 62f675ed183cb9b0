//! `dict` methods
//!
//! `keys()`, `values()` and `items()` return list snapshots rather than
//! live views.

use super::CallArgs;
use crate::error::{ExcKind, RtResult, RuntimeError};
use crate::heap::ObjRef;
use crate::interp::Interpreter;
use crate::object::Object;

pub(super) const METHODS: &[&str] = &[
    "keys",
    "values",
    "items",
    "get",
    "pop",
    "popitem",
    "clear",
    "update",
    "setdefault",
    "copy",
];

impl Interpreter {
    /// Merge `source` (a dict, or an iterable of pairs) into `dict`
    pub(crate) fn dict_update(&mut self, dict: ObjRef, source: ObjRef) -> RtResult<()> {
        if let Object::Dict(_) = self.get(source)? {
            for (key, value) in self.dict_entries(source)? {
                self.dict_set(dict, key, value)?;
            }
            return Ok(());
        }

        let pairs = self.iterate(source)?;
        let mut outcome = Ok(());
        for pair in &pairs {
            if outcome.is_err() {
                break;
            }
            outcome = match self.get(*pair)? {
                Object::List(items) | Object::Tuple(items) if items.len() == 2 => {
                    let (key, value) = (items[0], items[1]);
                    self.dict_set(dict, key, value)
                }
                _ => Err(RuntimeError::value_error(
                    "dictionary update sequence element has wrong length; 2 is required",
                )),
            };
        }
        self.release_all(pairs);
        outcome
    }

    pub(super) fn dict_method(
        &mut self,
        receiver: ObjRef,
        name: &str,
        args: CallArgs<'_>,
    ) -> RtResult<ObjRef> {
        match name {
            "keys" | "values" | "items" => {
                args.simple(0, 0)?;
                let entries = self.dict_entries(receiver)?;
                let mut items = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let item = match name {
                        "keys" => self.incref(key)?,
                        "values" => self.incref(value)?,
                        _ => self.adopt(Object::Tuple(vec![key, value]))?,
                    };
                    items.push(item);
                }
                Ok(self.new_list(items))
            }
            "get" => {
                args.simple(1, 2)?;
                match self.dict_lookup(receiver, args.required(0)?)? {
                    Some(value) => self.incref(value),
                    None => match args.get(1) {
                        Some(default) => self.incref(default),
                        None => Ok(self.new_none()),
                    },
                }
            }
            "pop" => {
                args.simple(1, 2)?;
                let key = args.required(0)?;
                match self.table_remove(receiver, key)? {
                    Some(value) => Ok(value),
                    None => match args.get(1) {
                        Some(default) => self.incref(default),
                        None => Err(RuntimeError::new(ExcKind::KeyError, self.repr(key)?)),
                    },
                }
            }
            "popitem" => {
                args.simple(0, 0)?;
                match self.table_pop_last(receiver)? {
                    Some((key, Some(value))) => Ok(self.new_tuple(vec![key, value])),
                    _ => Err(RuntimeError::new(
                        ExcKind::KeyError,
                        "'popitem(): dictionary is empty'",
                    )),
                }
            }
            "clear" => {
                args.simple(0, 0)?;
                self.table_clear(receiver)?;
                Ok(self.new_none())
            }
            "update" => {
                args.arity(0, 1)?;
                if let Some(source) = args.get(0) {
                    self.dict_update(receiver, source)?;
                }
                for (key, value) in args.keywords() {
                    self.dict_set_str(receiver, key, *value)?;
                }
                Ok(self.new_none())
            }
            "setdefault" => {
                args.simple(1, 2)?;
                let key = args.required(0)?;
                if let Some(value) = self.dict_lookup(receiver, key)? {
                    return self.incref(value);
                }
                let default = match args.get(1) {
                    Some(default) => self.incref(default)?,
                    None => self.new_none(),
                };
                let outcome = self.dict_set(receiver, key, default);
                match outcome {
                    Ok(()) => Ok(default),
                    Err(err) => {
                        self.release(default);
                        Err(err)
                    }
                }
            }
            _ => {
                args.simple(0, 0)?;
                let copy = self.new_dict();
                match self.dict_update(copy, receiver) {
                    Ok(()) => Ok(copy),
                    Err(err) => {
                        self.release(copy);
                        Err(err)
                    }
                }
            }
        }
    }
}
