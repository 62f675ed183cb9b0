//! Iteration builtins
//!
//! Every helper takes a snapshot of its input with `iterate`, so the
//! elements it works on are owned until the helper releases them.

use super::Builtin;
use crate::error::{RtResult, RuntimeError};
use crate::heap::ObjRef;
use crate::interp::Interpreter;
use crate::methods::CallArgs;
use crate::object::Object;
use crate::ops::{BinaryOp, CompareOp};

/// Largest list `range()` will materialize
const MAX_RANGE: i64 = 10_000_000;

/// Values produced by `range(start, stop, step)`
pub(crate) fn range_values(start: i64, stop: i64, step: i64) -> RtResult<Vec<i64>> {
    if step == 0 {
        return Err(RuntimeError::value_error("range() arg 3 must not be zero"));
    }
    let span = if step > 0 {
        (stop - start).max(0)
    } else {
        (start - stop).max(0)
    };
    let count = (span + step.abs() - 1) / step.abs();
    if count > MAX_RANGE {
        return Err(RuntimeError::value_error("range() too large to materialize"));
    }
    Ok((0..count).map(|i| start + i * step).collect())
}

impl Interpreter {
    pub(super) fn iteration_builtin(
        &mut self,
        builtin: Builtin,
        args: CallArgs<'_>,
    ) -> RtResult<ObjRef> {
        match builtin {
            Builtin::Range => {
                args.simple(1, 3)?;
                let mut bounds = Vec::with_capacity(3);
                for value in args.positional() {
                    bounds.push(self.to_int(*value)?);
                }
                let (start, stop, step) = match bounds.as_slice() {
                    [stop] => (0, *stop, 1),
                    [start, stop] => (*start, *stop, 1),
                    [start, stop, step, ..] => (*start, *stop, *step),
                    [] => (0, 0, 1),
                };
                let values = range_values(start, stop, step)?;
                let items = values.into_iter().map(|v| self.new_int(v)).collect();
                Ok(self.new_list(items))
            }
            Builtin::Sorted => {
                args.keywords_only(&["key", "reverse"])?;
                args.arity(1, 1)?;
                let mut items = self.iterate(args.required(0)?)?;
                let key = args.keyword("key").filter(|k| !self.is_none(*k));
                let reverse = match args.keyword("reverse") {
                    Some(flag) => self.truthy(flag)?,
                    None => false,
                };
                match self.sort_refs(&mut items, key, reverse) {
                    Ok(()) => Ok(self.new_list(items)),
                    Err(err) => {
                        self.release_all(items);
                        Err(err)
                    }
                }
            }
            Builtin::Reversed => {
                args.simple(1, 1)?;
                let mut items = self.iterate(args.required(0)?)?;
                items.reverse();
                Ok(self.new_list(items))
            }
            Builtin::Enumerate => {
                args.keywords_only(&["start"])?;
                args.arity(1, 2)?;
                let start = match args.get(1).or_else(|| args.keyword("start")) {
                    Some(start) => self.to_int(start)?,
                    None => 0,
                };
                let items = self.iterate(args.required(0)?)?;
                let pairs = items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let index = self.new_int(start + i as i64);
                        self.new_tuple(vec![index, item])
                    })
                    .collect();
                Ok(self.new_list(pairs))
            }
            Builtin::Zip => {
                args.simple(0, usize::MAX)?;
                let mut columns = Vec::with_capacity(args.len());
                for iterable in args.positional() {
                    match self.iterate(*iterable) {
                        Ok(items) => columns.push(items),
                        Err(err) => {
                            self.release_all(columns.into_iter().flatten());
                            return Err(err);
                        }
                    }
                }
                let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
                let mut tuples = Vec::with_capacity(rows);
                for row in 0..rows {
                    let items: Vec<ObjRef> = columns.iter().map(|column| column[row]).collect();
                    tuples.push(self.adopt(Object::Tuple(items))?);
                }
                self.release_all(columns.into_iter().flatten());
                Ok(self.new_list(tuples))
            }
            Builtin::All | Builtin::Any => {
                args.simple(1, 1)?;
                let items = self.iterate(args.required(0)?)?;
                let want = builtin == Builtin::Any;
                let mut outcome = Ok(!want);
                for item in &items {
                    match self.truthy(*item) {
                        Ok(truth) if truth == want => {
                            outcome = Ok(want);
                            break;
                        }
                        Ok(_) => {}
                        Err(err) => {
                            outcome = Err(err);
                            break;
                        }
                    }
                }
                self.release_all(items);
                let result = outcome?;
                Ok(self.new_bool(result))
            }
            Builtin::Map => {
                args.simple(2, 2)?;
                let func = args.required(0)?;
                let items = self.iterate(args.required(1)?)?;
                let mut results = Vec::with_capacity(items.len());
                let mut failure = None;
                for item in &items {
                    match self.call(func, &[*item], &[]) {
                        Ok(result) => results.push(result),
                        Err(err) => {
                            failure = Some(err);
                            break;
                        }
                    }
                }
                self.release_all(items);
                match failure {
                    Some(err) => {
                        self.release_all(results);
                        Err(err)
                    }
                    None => Ok(self.new_list(results)),
                }
            }
            Builtin::Filter => {
                args.simple(2, 2)?;
                let func = args.required(0)?;
                let items = self.iterate(args.required(1)?)?;
                let mut kept = Vec::new();
                let mut failure = None;
                for item in items {
                    if failure.is_some() {
                        self.release(item);
                        continue;
                    }
                    let keep = if self.is_none(func) {
                        self.truthy(item)
                    } else {
                        self.call(func, &[item], &[]).and_then(|result| {
                            let truth = self.truthy(result);
                            self.release(result);
                            truth
                        })
                    };
                    match keep {
                        Ok(true) => kept.push(item),
                        Ok(false) => self.release(item),
                        Err(err) => {
                            self.release(item);
                            failure = Some(err);
                        }
                    }
                }
                match failure {
                    Some(err) => {
                        self.release_all(kept);
                        Err(err)
                    }
                    None => Ok(self.new_list(kept)),
                }
            }
            Builtin::Sum => {
                args.keywords_only(&["start"])?;
                args.arity(1, 2)?;
                let items = self.iterate(args.required(0)?)?;
                let mut total = match args.get(1).or_else(|| args.keyword("start")) {
                    Some(start) => self.incref(start)?,
                    None => self.new_int(0),
                };
                let mut failure = None;
                for item in &items {
                    match self.binary_op(BinaryOp::Add, total, *item) {
                        Ok(next) => {
                            self.release(total);
                            total = next;
                        }
                        Err(err) => {
                            failure = Some(err);
                            break;
                        }
                    }
                }
                self.release_all(items);
                match failure {
                    Some(err) => {
                        self.release(total);
                        Err(err)
                    }
                    None => Ok(total),
                }
            }
            _ => self.min_max(builtin == Builtin::Max, args),
        }
    }

    fn min_max(&mut self, max: bool, args: CallArgs<'_>) -> RtResult<ObjRef> {
        args.keywords_only(&["key", "default"])?;
        let name = if max { "max" } else { "min" };
        let items = match args.positional() {
            [] => {
                return Err(RuntimeError::type_error(format!(
                    "{} expected at least 1 argument, got 0",
                    name
                )))
            }
            [iterable] => self.iterate(*iterable)?,
            many => {
                for item in many {
                    self.heap.incref(*item)?;
                }
                many.to_vec()
            }
        };
        if items.is_empty() {
            return match args.keyword("default") {
                Some(default) => self.incref(default),
                None => Err(RuntimeError::value_error(format!(
                    "{}() arg is an empty sequence",
                    name
                ))),
            };
        }

        let key = args.keyword("key").filter(|k| !self.is_none(*k));
        let op = if max { CompareOp::Gt } else { CompareOp::Lt };
        let outcome = (|| -> RtResult<usize> {
            let mut best = 0;
            let mut best_key = match key {
                Some(key) => Some(self.call(key, &[items[0]], &[])?),
                None => None,
            };
            for (pos, item) in items.iter().enumerate().skip(1) {
                let candidate_key = match key {
                    Some(key) => match self.call(key, &[*item], &[]) {
                        Ok(k) => Some(k),
                        Err(err) => {
                            self.release_all(best_key);
                            return Err(err);
                        }
                    },
                    None => None,
                };
                let left = candidate_key.unwrap_or(*item);
                let right = best_key.unwrap_or(items[best]);
                let better = self.compare(left, right, op);
                match better {
                    Ok(true) => {
                        best = pos;
                        self.release_all(best_key);
                        best_key = candidate_key;
                    }
                    Ok(false) => self.release_all(candidate_key),
                    Err(err) => {
                        self.release_all(candidate_key);
                        self.release_all(best_key);
                        return Err(err);
                    }
                }
            }
            self.release_all(best_key);
            Ok(best)
        })();

        let result = outcome.and_then(|best| self.incref(items[best]));
        self.release_all(items);
        result
    }
}
