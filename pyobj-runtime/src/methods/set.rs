//! `set` methods
//!
//! Algebra methods accept any iterable and reuse the binary operators.

use super::CallArgs;
use crate::error::{ExcKind, RtResult, RuntimeError};
use crate::heap::ObjRef;
use crate::interp::Interpreter;
use crate::object::Object;
use crate::ops::{BinaryOp, CompareOp};

pub(super) const METHODS: &[&str] = &[
    "add",
    "discard",
    "remove",
    "pop",
    "clear",
    "update",
    "union",
    "intersection",
    "difference",
    "symmetric_difference",
    "issubset",
    "issuperset",
    "isdisjoint",
    "copy",
];

impl Interpreter {
    /// New reference to `value` as a set (the same object when it already is one)
    fn as_set(&mut self, value: ObjRef) -> RtResult<ObjRef> {
        match self.get(value)? {
            Object::Set(_) => self.incref(value),
            _ => self.set_from(value),
        }
    }

    pub(super) fn set_method(
        &mut self,
        receiver: ObjRef,
        name: &str,
        args: CallArgs<'_>,
    ) -> RtResult<ObjRef> {
        match name {
            "add" => {
                args.simple(1, 1)?;
                self.set_add(receiver, args.required(0)?)?;
            }
            "discard" | "remove" => {
                args.simple(1, 1)?;
                let key = args.required(0)?;
                match self.table_remove(receiver, key)? {
                    Some(removed) => self.release(removed),
                    None if name == "remove" => {
                        return Err(RuntimeError::new(ExcKind::KeyError, self.repr(key)?))
                    }
                    None => {}
                }
            }
            "pop" => {
                args.simple(0, 0)?;
                return match self.table_pop_last(receiver)? {
                    Some((key, _)) => Ok(key),
                    None => Err(RuntimeError::new(ExcKind::KeyError, "'pop from an empty set'")),
                };
            }
            "clear" => {
                args.simple(0, 0)?;
                self.table_clear(receiver)?;
            }
            "update" => {
                args.keywords_only(&[])?;
                for other in args.positional() {
                    let items = self.iterate(*other)?;
                    let mut outcome = Ok(false);
                    for item in &items {
                        if outcome.is_ok() {
                            outcome = self.set_add(receiver, *item);
                        }
                    }
                    self.release_all(items);
                    outcome?;
                }
            }
            "union" | "intersection" | "difference" | "symmetric_difference" => {
                args.keywords_only(&[])?;
                let op = match name {
                    "union" => BinaryOp::BitOr,
                    "intersection" => BinaryOp::BitAnd,
                    "difference" => BinaryOp::Sub,
                    _ => BinaryOp::BitXor,
                };
                if name == "symmetric_difference" {
                    args.arity(1, 1)?;
                }
                let mut acc = self.as_set(receiver)?;
                for other in args.positional() {
                    let step = self
                        .as_set(*other)
                        .and_then(|other_set| {
                            let result = self.binary_op(op, acc, other_set);
                            self.release(other_set);
                            result
                        });
                    self.release(acc);
                    acc = step?;
                }
                if acc == receiver {
                    // Always hand back a fresh set
                    let copy = self.set_from(acc);
                    self.release(acc);
                    return copy;
                }
                return Ok(acc);
            }
            "issubset" | "issuperset" | "isdisjoint" => {
                args.simple(1, 1)?;
                let other = self.as_set(args.required(0)?)?;
                let result = match name {
                    "issubset" => self.compare(receiver, other, CompareOp::Le),
                    "issuperset" => self.compare(receiver, other, CompareOp::Ge),
                    _ => self
                        .binary_op(BinaryOp::BitAnd, receiver, other)
                        .and_then(|common| {
                            let empty = self.length(common).map(|n| n == 0);
                            self.release(common);
                            empty
                        }),
                };
                self.release(other);
                let result = result?;
                return Ok(self.new_bool(result));
            }
            _ => {
                args.simple(0, 0)?;
                return self.set_from(receiver);
            }
        }
        Ok(self.new_none())
    }
}
