//! Object protocol - equality, hashing, ordering, arithmetic, items
//!
//! Read-only protocols (`equal`, `hash`, `repr`, ...) borrow the heap;
//! anything that produces a value allocates and returns a new reference.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use num_traits::ToPrimitive;

use crate::error::{ExcKind, RtResult, RuntimeError};
use crate::heap::ObjRef;
use crate::interp::Interpreter;
use crate::object::Object;
use crate::strings::{char_len, float_repr, str_repr};
use crate::table::Table;

/// Nesting depth for structural comparison and printing
pub(crate) const MAX_NESTING: usize = 200;

/// Rich comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            Self::Eq => ordering == Equal,
            Self::Ne => ordering != Equal,
            Self::Lt => ordering == Less,
            Self::Le => ordering != Greater,
            Self::Gt => ordering == Greater,
            Self::Ge => ordering != Less,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    TrueDiv,
    FloorDiv,
    Mod,
    Pow,
    LShift,
    RShift,
    BitAnd,
    BitOr,
    BitXor,
}

impl BinaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::TrueDiv => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::LShift => "<<",
            Self::RShift => ">>",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Pos,
    Not,
    Invert,
}

/// Numeric view of an object, `None` for non-numbers
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

fn num_of(object: &Object) -> Option<Num> {
    match object {
        Object::Bool(b) => Some(Num::Int(*b as i64)),
        Object::Int(i) => Some(Num::Int(*i)),
        Object::Float(f) => Some(Num::Float(*f)),
        _ => None,
    }
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

fn overflow() -> RuntimeError {
    RuntimeError::new(ExcKind::OverflowError, "integer result out of range")
}

fn zero_division(message: &str) -> RuntimeError {
    RuntimeError::new(ExcKind::ZeroDivisionError, message)
}

/// Python floor division on integers
fn floor_div(a: i64, b: i64) -> RtResult<i64> {
    if b == 0 {
        return Err(zero_division("integer division or modulo by zero"));
    }
    let q = a.checked_div(b).ok_or_else(overflow)?;
    if (a % b != 0) && ((a < 0) != (b < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

/// Python modulo on integers (result takes the divisor's sign)
fn floor_mod(a: i64, b: i64) -> RtResult<i64> {
    if b == 0 {
        return Err(zero_division("integer division or modulo by zero"));
    }
    let r = a.checked_rem(b).unwrap_or(0);
    if r != 0 && ((r < 0) != (b < 0)) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

fn float_mod(a: f64, b: f64) -> RtResult<f64> {
    if b == 0.0 {
        return Err(zero_division("float modulo"));
    }
    let r = a % b;
    if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

/// Integer value of a float that is exactly integral and in range
pub(crate) fn exact_int(value: f64) -> Option<i64> {
    if value.fract() == 0.0 {
        value.to_i64()
    } else {
        None
    }
}

fn hash_value<T: Hash>(value: T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl Interpreter {
    pub fn type_name(&self, r: ObjRef) -> RtResult<&'static str> {
        Ok(self.get(r)?.object_type().name())
    }

    // ------------------------------------------------------------------
    // Equality, hashing, ordering
    // ------------------------------------------------------------------

    pub fn equal(&self, a: ObjRef, b: ObjRef) -> RtResult<bool> {
        self.equal_at(a, b, 0)
    }

    fn equal_at(&self, a: ObjRef, b: ObjRef, depth: usize) -> RtResult<bool> {
        if depth > MAX_NESTING {
            return Err(RuntimeError::new(
                ExcKind::RecursionError,
                "maximum recursion depth exceeded in comparison",
            ));
        }
        let (left, right) = (self.get(a)?, self.get(b)?);
        if a == b && !matches!(left, Object::Float(_)) {
            return Ok(true);
        }
        if let (Some(x), Some(y)) = (num_of(left), num_of(right)) {
            return Ok(match (x, y) {
                (Num::Int(x), Num::Int(y)) => x == y,
                (x, y) => x.as_f64() == y.as_f64(),
            });
        }
        match (left, right) {
            (Object::None, Object::None) => Ok(true),
            (Object::Str(x), Object::Str(y)) => Ok(x == y),
            (Object::List(x), Object::List(y)) | (Object::Tuple(x), Object::Tuple(y)) => {
                if x.len() != y.len() {
                    return Ok(false);
                }
                for (p, q) in x.iter().zip(y) {
                    if !self.equal_at(*p, *q, depth + 1)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Object::Dict(x), Object::Dict(y)) => {
                if x.len() != y.len() {
                    return Ok(false);
                }
                for entry in x.iter() {
                    let pos = y.find(entry.hash, |k| self.equal_at(k, entry.key, depth + 1))?;
                    let other = pos.and_then(|pos| y.entry(pos)).and_then(|e| e.value);
                    match (entry.value, other) {
                        (Some(v), Some(w)) if self.equal_at(v, w, depth + 1)? => {}
                        _ => return Ok(false),
                    }
                }
                Ok(true)
            }
            (Object::Set(x), Object::Set(y)) => {
                Ok(x.len() == y.len() && self.table_subset(x, y, depth)?)
            }
            (Object::Exception(x), Object::Exception(y)) => {
                Ok(x.kind == y.kind && x.message == y.message)
            }
            (Object::Builtin(x), Object::Builtin(y)) => Ok(x == y),
            _ => Ok(false),
        }
    }

    fn table_subset(&self, small: &Table, big: &Table, depth: usize) -> RtResult<bool> {
        for entry in small.iter() {
            if big
                .find(entry.hash, |k| self.equal_at(k, entry.key, depth + 1))?
                .is_none()
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn hash(&self, r: ObjRef) -> RtResult<u64> {
        match self.get(r)? {
            Object::None => Ok(hash_value("None")),
            Object::Bool(b) => Ok(hash_value(*b as i64)),
            Object::Int(i) => Ok(hash_value(*i)),
            Object::Float(f) => Ok(match exact_int(*f) {
                Some(i) => hash_value(i),
                None => hash_value(f.to_bits()),
            }),
            Object::Str(s) => Ok(hash_value(s.as_str())),
            Object::Tuple(items) => {
                let mut hasher = DefaultHasher::new();
                "tuple".hash(&mut hasher);
                for item in items {
                    self.hash(*item)?.hash(&mut hasher);
                }
                Ok(hasher.finish())
            }
            Object::Builtin(b) => Ok(hash_value(b.name())),
            Object::List(_) | Object::Dict(_) | Object::Set(_) => {
                Err(RuntimeError::type_error(format!(
                    "unhashable type: '{}'",
                    self.type_name(r)?
                )))
            }
            _ => Ok(hash_value((r.index(), r.epoch()))),
        }
    }

    pub fn compare(&self, a: ObjRef, b: ObjRef, op: CompareOp) -> RtResult<bool> {
        match op {
            CompareOp::Eq => return self.equal(a, b),
            CompareOp::Ne => return Ok(!self.equal(a, b)?),
            _ => {}
        }
        let (left, right) = (self.get(a)?, self.get(b)?);
        if let (Some(x), Some(y)) = (num_of(left), num_of(right)) {
            let ordering = match (x, y) {
                (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
                (x, y) => x.as_f64().partial_cmp(&y.as_f64()),
            };
            // NaN compares false for every ordering
            return Ok(ordering.map_or(false, |o| op.holds(o)));
        }
        match (left, right) {
            (Object::Str(x), Object::Str(y)) => Ok(op.holds(x.cmp(y))),
            (Object::List(x), Object::List(y)) | (Object::Tuple(x), Object::Tuple(y)) => {
                for (p, q) in x.iter().zip(y) {
                    if !self.equal(*p, *q)? {
                        return self.compare(*p, *q, op);
                    }
                }
                Ok(op.holds(x.len().cmp(&y.len())))
            }
            (Object::Set(x), Object::Set(y)) => Ok(match op {
                CompareOp::Le => self.table_subset(x, y, 0)?,
                CompareOp::Ge => self.table_subset(y, x, 0)?,
                CompareOp::Lt => x.len() < y.len() && self.table_subset(x, y, 0)?,
                CompareOp::Gt => x.len() > y.len() && self.table_subset(y, x, 0)?,
                CompareOp::Eq | CompareOp::Ne => false,
            }),
            _ => Err(RuntimeError::type_error(format!(
                "'{}' not supported between instances of '{}' and '{}'",
                op.symbol(),
                left.object_type().name(),
                right.object_type().name()
            ))),
        }
    }

    // ------------------------------------------------------------------
    // Truthiness, length, conversion
    // ------------------------------------------------------------------

    pub fn truthy(&self, r: ObjRef) -> RtResult<bool> {
        Ok(match self.get(r)? {
            Object::None => false,
            Object::Bool(b) => *b,
            Object::Int(i) => *i != 0,
            Object::Float(f) => *f != 0.0,
            Object::Str(s) => !s.is_empty(),
            Object::List(items) | Object::Tuple(items) => !items.is_empty(),
            Object::Dict(table) | Object::Set(table) => !table.is_empty(),
            _ => true,
        })
    }

    pub fn length(&self, r: ObjRef) -> RtResult<usize> {
        match self.get(r)? {
            Object::Str(s) => Ok(char_len(s)),
            Object::List(items) | Object::Tuple(items) => Ok(items.len()),
            Object::Dict(table) | Object::Set(table) => Ok(table.len()),
            other => Err(RuntimeError::type_error(format!(
                "object of type '{}' has no len()",
                other.object_type().name()
            ))),
        }
    }

    pub fn to_int(&self, r: ObjRef) -> RtResult<i64> {
        match self.get(r)? {
            Object::Bool(b) => Ok(*b as i64),
            Object::Int(i) => Ok(*i),
            other => Err(RuntimeError::type_error(format!(
                "'{}' object cannot be interpreted as an integer",
                other.object_type().name()
            ))),
        }
    }

    pub fn to_float(&self, r: ObjRef) -> RtResult<f64> {
        match num_of(self.get(r)?) {
            Some(n) => Ok(n.as_f64()),
            None => Err(RuntimeError::type_error(format!(
                "must be real number, not {}",
                self.type_name(r)?
            ))),
        }
    }

    pub fn to_str(&self, r: ObjRef) -> RtResult<&str> {
        match self.get(r)? {
            Object::Str(s) => Ok(s),
            other => Err(RuntimeError::type_error(format!(
                "expected str, got {}",
                other.object_type().name()
            ))),
        }
    }

    // ------------------------------------------------------------------
    // Text conversion
    // ------------------------------------------------------------------

    pub fn repr(&self, r: ObjRef) -> RtResult<String> {
        let mut out = String::new();
        self.write_repr(r, &mut out, &mut Vec::new())?;
        Ok(out)
    }

    /// `str()`: unquoted for text, `repr()` for everything else
    pub fn str(&self, r: ObjRef) -> RtResult<String> {
        match self.get(r)? {
            Object::Str(s) => Ok(s.clone()),
            Object::Exception(exc) => Ok(exc.message.clone()),
            _ => self.repr(r),
        }
    }

    fn write_repr(&self, r: ObjRef, out: &mut String, seen: &mut Vec<ObjRef>) -> RtResult<()> {
        let object = self.get(r)?;
        if object.object_type().is_container() {
            if seen.contains(&r) {
                out.push_str(match object {
                    Object::Dict(_) => "{...}",
                    Object::Tuple(_) => "(...)",
                    _ => "[...]",
                });
                return Ok(());
            }
            if seen.len() > MAX_NESTING {
                return Err(RuntimeError::new(
                    ExcKind::RecursionError,
                    "maximum recursion depth exceeded while getting the repr of an object",
                ));
            }
        }

        match object {
            Object::None => out.push_str("None"),
            Object::Bool(true) => out.push_str("True"),
            Object::Bool(false) => out.push_str("False"),
            Object::Int(i) => out.push_str(&i.to_string()),
            Object::Float(f) => out.push_str(&float_repr(*f)),
            Object::Str(s) => out.push_str(&str_repr(s)),
            Object::List(items) => {
                seen.push(r);
                self.write_items(items, "[", "]", out, seen)?;
                seen.pop();
            }
            Object::Tuple(items) => {
                seen.push(r);
                if items.len() == 1 {
                    out.push('(');
                    self.write_repr(items[0], out, seen)?;
                    out.push_str(",)");
                } else {
                    self.write_items(items, "(", ")", out, seen)?;
                }
                seen.pop();
            }
            Object::Set(table) => {
                if table.is_empty() {
                    out.push_str("set()");
                } else {
                    seen.push(r);
                    self.write_items(&table.keys(), "{", "}", out, seen)?;
                    seen.pop();
                }
            }
            Object::Dict(table) => {
                seen.push(r);
                out.push('{');
                for (i, entry) in table.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_repr(entry.key, out, seen)?;
                    out.push_str(": ");
                    if let Some(value) = entry.value {
                        self.write_repr(value, out, seen)?;
                    }
                }
                out.push('}');
                seen.pop();
            }
            Object::Function(func) => {
                out.push_str(&format!("<function {} at {:#x}>", func.name, r.index()))
            }
            Object::Builtin(b) => b.write_repr(out),
            Object::Method(method) => out.push_str(&format!(
                "<built-in method {} of {} object at {:#x}>",
                method.name,
                self.type_name(method.receiver)?,
                method.receiver.index()
            )),
            Object::File(file) => out.push_str(&format!(
                "<_io.TextIOWrapper name={} mode='{}' encoding='UTF-8'>",
                str_repr(file.path()),
                file.mode().as_str()
            )),
            Object::Exception(exc) => {
                out.push_str(exc.kind.name());
                out.push('(');
                if !exc.message.is_empty() {
                    out.push_str(&str_repr(&exc.message));
                }
                out.push(')');
            }
        }
        Ok(())
    }

    fn write_items(
        &self,
        items: &[ObjRef],
        open: &str,
        close: &str,
        out: &mut String,
        seen: &mut Vec<ObjRef>,
    ) -> RtResult<()> {
        out.push_str(open);
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_repr(*item, out, seen)?;
        }
        out.push_str(close);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Arithmetic
    // ------------------------------------------------------------------

    pub fn binary_op(&mut self, op: BinaryOp, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
        let (left, right) = (self.get(a)?, self.get(b)?);

        if let (Object::Bool(x), Object::Bool(y)) = (left, right) {
            let (x, y) = (*x, *y);
            match op {
                BinaryOp::BitAnd => return Ok(self.new_bool(x & y)),
                BinaryOp::BitOr => return Ok(self.new_bool(x | y)),
                BinaryOp::BitXor => return Ok(self.new_bool(x ^ y)),
                _ => {}
            }
        }
        if let (Some(x), Some(y)) = (num_of(left), num_of(right)) {
            return self.numeric_op(op, x, y);
        }

        match (op, left, right) {
            (BinaryOp::Add, Object::Str(x), Object::Str(y)) => {
                let joined = format!("{}{}", x, y);
                Ok(self.new_str(joined))
            }
            (BinaryOp::Mul, Object::Str(s), Object::Int(n))
            | (BinaryOp::Mul, Object::Int(n), Object::Str(s)) => {
                let repeated = s.repeat(repeat_count(s.len(), *n)?);
                Ok(self.new_str(repeated))
            }
            (BinaryOp::Add, Object::List(x), Object::List(y)) => {
                let items = x.iter().chain(y).copied().collect();
                self.adopt(Object::List(items))
            }
            (BinaryOp::Add, Object::Tuple(x), Object::Tuple(y)) => {
                let items = x.iter().chain(y).copied().collect();
                self.adopt(Object::Tuple(items))
            }
            (BinaryOp::Mul, Object::List(items), Object::Int(n))
            | (BinaryOp::Mul, Object::Int(n), Object::List(items)) => {
                let items = repeat_items(items, *n)?;
                self.adopt(Object::List(items))
            }
            (BinaryOp::Mul, Object::Tuple(items), Object::Int(n))
            | (BinaryOp::Mul, Object::Int(n), Object::Tuple(items)) => {
                let items = repeat_items(items, *n)?;
                self.adopt(Object::Tuple(items))
            }
            (
                BinaryOp::BitOr | BinaryOp::BitAnd | BinaryOp::Sub | BinaryOp::BitXor,
                Object::Set(_),
                Object::Set(_),
            ) => self.set_op(op, a, b),
            (BinaryOp::BitOr, Object::Dict(_), Object::Dict(_)) => {
                let merged = self.new_dict();
                for source in [a, b] {
                    for (key, value) in self.dict_entries(source)? {
                        if let Err(err) = self.dict_set(merged, key, value) {
                            self.release(merged);
                            return Err(err);
                        }
                    }
                }
                Ok(merged)
            }
            _ => Err(RuntimeError::type_error(format!(
                "unsupported operand type(s) for {}: '{}' and '{}'",
                op.symbol(),
                left.object_type().name(),
                right.object_type().name()
            ))),
        }
    }

    fn numeric_op(&mut self, op: BinaryOp, x: Num, y: Num) -> RtResult<ObjRef> {
        if let (Num::Int(x), Num::Int(y)) = (x, y) {
            let value = match op {
                BinaryOp::Add => x.checked_add(y).ok_or_else(overflow)?,
                BinaryOp::Sub => x.checked_sub(y).ok_or_else(overflow)?,
                BinaryOp::Mul => x.checked_mul(y).ok_or_else(overflow)?,
                BinaryOp::TrueDiv => {
                    if y == 0 {
                        return Err(zero_division("division by zero"));
                    }
                    return Ok(self.new_float(x as f64 / y as f64));
                }
                BinaryOp::FloorDiv => floor_div(x, y)?,
                BinaryOp::Mod => floor_mod(x, y)?,
                BinaryOp::Pow => {
                    if y < 0 {
                        if x == 0 {
                            return Err(zero_division(
                                "0.0 cannot be raised to a negative power",
                            ));
                        }
                        return Ok(self.new_float((x as f64).powf(y as f64)));
                    }
                    let exp = u32::try_from(y).map_err(|_| overflow())?;
                    x.checked_pow(exp).ok_or_else(overflow)?
                }
                BinaryOp::LShift | BinaryOp::RShift => {
                    if y < 0 {
                        return Err(RuntimeError::value_error("negative shift count"));
                    }
                    if op == BinaryOp::RShift {
                        if y >= 64 {
                            if x < 0 { -1 } else { 0 }
                        } else {
                            x >> y
                        }
                    } else {
                        let shifted = if y >= 64 { None } else { x.checked_shl(y as u32) };
                        match shifted {
                            Some(v) if v >> y == x => v,
                            _ if x == 0 => 0,
                            _ => return Err(overflow()),
                        }
                    }
                }
                BinaryOp::BitAnd => x & y,
                BinaryOp::BitOr => x | y,
                BinaryOp::BitXor => x ^ y,
            };
            return Ok(self.new_int(value));
        }

        let (x, y) = (x.as_f64(), y.as_f64());
        let value = match op {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            BinaryOp::Mul => x * y,
            BinaryOp::TrueDiv => {
                if y == 0.0 {
                    return Err(zero_division("float division by zero"));
                }
                x / y
            }
            BinaryOp::FloorDiv => {
                if y == 0.0 {
                    return Err(zero_division("float floor division by zero"));
                }
                (x / y).floor()
            }
            BinaryOp::Mod => float_mod(x, y)?,
            BinaryOp::Pow => {
                if x == 0.0 && y < 0.0 {
                    return Err(zero_division("0.0 cannot be raised to a negative power"));
                }
                if x < 0.0 && y.fract() != 0.0 {
                    return Err(RuntimeError::value_error(
                        "negative number cannot be raised to a fractional power",
                    ));
                }
                x.powf(y)
            }
            _ => {
                return Err(RuntimeError::type_error(format!(
                    "unsupported operand type(s) for {}: 'float' and 'float'",
                    op.symbol()
                )))
            }
        };
        Ok(self.new_float(value))
    }

    fn set_op(&mut self, op: BinaryOp, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
        let left = self.table_keys(a)?;
        let right = self.table_keys(b)?;
        let result = self.new_set();
        let outcome = (|| -> RtResult<()> {
            match op {
                BinaryOp::BitOr => {
                    for key in left.iter().chain(&right) {
                        self.set_add(result, *key)?;
                    }
                }
                BinaryOp::BitAnd => {
                    for key in &left {
                        if self.table_contains(b, *key)? {
                            self.set_add(result, *key)?;
                        }
                    }
                }
                BinaryOp::Sub => {
                    for key in &left {
                        if !self.table_contains(b, *key)? {
                            self.set_add(result, *key)?;
                        }
                    }
                }
                _ => {
                    for key in &left {
                        if !self.table_contains(b, *key)? {
                            self.set_add(result, *key)?;
                        }
                    }
                    for key in &right {
                        if !self.table_contains(a, *key)? {
                            self.set_add(result, *key)?;
                        }
                    }
                }
            }
            Ok(())
        })();
        match outcome {
            Ok(()) => Ok(result),
            Err(err) => {
                self.release(result);
                Err(err)
            }
        }
    }

    pub fn unary_op(&mut self, op: UnaryOp, r: ObjRef) -> RtResult<ObjRef> {
        if op == UnaryOp::Not {
            let value = !self.truthy(r)?;
            return Ok(self.new_bool(value));
        }
        let object = self.get(r)?;
        match (op, num_of(object)) {
            (UnaryOp::Neg, Some(Num::Int(i))) => {
                let value = i.checked_neg().ok_or_else(overflow)?;
                Ok(self.new_int(value))
            }
            (UnaryOp::Neg, Some(Num::Float(f))) => Ok(self.new_float(-f)),
            (UnaryOp::Pos, Some(Num::Int(i))) => Ok(self.new_int(i)),
            (UnaryOp::Pos, Some(Num::Float(f))) => Ok(self.new_float(f)),
            (UnaryOp::Invert, Some(Num::Int(i))) => Ok(self.new_int(!i)),
            _ => {
                let symbol = match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Pos => "+",
                    _ => "~",
                };
                Err(RuntimeError::type_error(format!(
                    "bad operand type for unary {}: '{}'",
                    symbol,
                    object.object_type().name()
                )))
            }
        }
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    /// Resolve a possibly negative index against `len`
    fn index_of(&self, index: ObjRef, len: usize, what: &str) -> RtResult<usize> {
        let raw = match self.get(index)? {
            Object::Bool(b) => *b as i64,
            Object::Int(i) => *i,
            other => {
                return Err(RuntimeError::type_error(format!(
                    "{} indices must be integers, not {}",
                    what,
                    other.object_type().name()
                )))
            }
        };
        let adjusted = if raw < 0 { raw + len as i64 } else { raw };
        if adjusted < 0 || adjusted >= len as i64 {
            return Err(RuntimeError::new(
                ExcKind::IndexError,
                format!("{} index out of range", what),
            ));
        }
        Ok(adjusted as usize)
    }

    pub fn getitem(&mut self, container: ObjRef, key: ObjRef) -> RtResult<ObjRef> {
        match self.get(container)? {
            Object::List(items) => {
                let item = items[self.index_of(key, items.len(), "list")?];
                self.incref(item)
            }
            Object::Tuple(items) => {
                let item = items[self.index_of(key, items.len(), "tuple")?];
                self.incref(item)
            }
            Object::Str(s) => {
                let pos = self.index_of(key, char_len(s), "string")?;
                let c: String = s.chars().skip(pos).take(1).collect();
                Ok(self.new_str(c))
            }
            Object::Dict(_) => match self.dict_lookup(container, key)? {
                Some(value) => self.incref(value),
                None => Err(RuntimeError::new(ExcKind::KeyError, self.repr(key)?)),
            },
            other => Err(RuntimeError::type_error(format!(
                "'{}' object is not subscriptable",
                other.object_type().name()
            ))),
        }
    }

    pub fn setitem(&mut self, container: ObjRef, key: ObjRef, value: ObjRef) -> RtResult<()> {
        match self.get(container)? {
            Object::List(items) => {
                let pos = self.index_of(key, items.len(), "list assignment")?;
                self.heap.incref(value)?;
                let old = match self.get_mut(container)? {
                    Object::List(items) => std::mem::replace(&mut items[pos], value),
                    _ => value,
                };
                self.release(old);
                Ok(())
            }
            Object::Dict(_) => self.dict_set(container, key, value),
            other => Err(RuntimeError::type_error(format!(
                "'{}' object does not support item assignment",
                other.object_type().name()
            ))),
        }
    }

    pub fn delitem(&mut self, container: ObjRef, key: ObjRef) -> RtResult<()> {
        match self.get(container)? {
            Object::List(items) => {
                let pos = self.index_of(key, items.len(), "list assignment")?;
                let removed = match self.get_mut(container)? {
                    Object::List(items) => Some(items.remove(pos)),
                    _ => None,
                };
                self.release_all(removed);
                Ok(())
            }
            Object::Dict(_) => match self.table_remove(container, key)? {
                Some(value) => {
                    self.release(value);
                    Ok(())
                }
                None => Err(RuntimeError::new(ExcKind::KeyError, self.repr(key)?)),
            },
            other => Err(RuntimeError::type_error(format!(
                "'{}' object doesn't support item deletion",
                other.object_type().name()
            ))),
        }
    }

    /// `container[start:stop:step]` as a new object of the same type
    pub fn slice(
        &mut self,
        container: ObjRef,
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    ) -> RtResult<ObjRef> {
        let step = step.unwrap_or(1);
        if step == 0 {
            return Err(RuntimeError::value_error("slice step cannot be zero"));
        }
        let len = self.length(container)?;
        let positions = slice_positions(len, start, stop, step);
        match self.get(container)? {
            Object::List(items) => {
                let picked = positions.iter().map(|&i| items[i]).collect();
                self.adopt(Object::List(picked))
            }
            Object::Tuple(items) => {
                let picked = positions.iter().map(|&i| items[i]).collect();
                self.adopt(Object::Tuple(picked))
            }
            Object::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let picked: String = positions.iter().map(|&i| chars[i]).collect();
                Ok(self.new_str(picked))
            }
            other => Err(RuntimeError::type_error(format!(
                "'{}' object is not subscriptable",
                other.object_type().name()
            ))),
        }
    }

    pub fn contains(&self, container: ObjRef, item: ObjRef) -> RtResult<bool> {
        match self.get(container)? {
            Object::List(items) | Object::Tuple(items) => {
                for candidate in items {
                    if self.equal(*candidate, item)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Object::Str(s) => match self.get(item)? {
                Object::Str(needle) => Ok(s.contains(needle.as_str())),
                other => Err(RuntimeError::type_error(format!(
                    "'in <string>' requires string as left operand, not {}",
                    other.object_type().name()
                ))),
            },
            Object::Dict(_) | Object::Set(_) => self.table_contains(container, item),
            other => Err(RuntimeError::type_error(format!(
                "argument of type '{}' is not iterable",
                other.object_type().name()
            ))),
        }
    }

    /// Snapshot of the elements, each a new reference
    pub fn iterate(&mut self, r: ObjRef) -> RtResult<Vec<ObjRef>> {
        let items = match self.get(r)? {
            Object::List(items) | Object::Tuple(items) => items.clone(),
            Object::Dict(table) | Object::Set(table) => table.keys(),
            Object::Str(s) => {
                let chars: Vec<String> = s.chars().map(String::from).collect();
                return Ok(chars.into_iter().map(|c| self.new_str(c)).collect());
            }
            other => {
                return Err(RuntimeError::type_error(format!(
                    "'{}' object is not iterable",
                    other.object_type().name()
                )))
            }
        };
        for item in &items {
            self.heap.incref(*item)?;
        }
        Ok(items)
    }

    /// Build a new set from the elements of any iterable
    pub fn set_from(&mut self, iterable: ObjRef) -> RtResult<ObjRef> {
        let items = self.iterate(iterable)?;
        let set = self.new_set();
        let mut outcome = Ok(());
        for item in &items {
            if outcome.is_ok() {
                outcome = self.set_add(set, *item).map(|_| ());
            }
        }
        self.release_all(items);
        match outcome {
            Ok(()) => Ok(set),
            Err(err) => {
                self.release(set);
                Err(err)
            }
        }
    }
}

/// Repeat count for a sequence of `len` elements whose result stays allocatable
fn repeat_count(len: usize, times: i64) -> RtResult<usize> {
    let times = usize::try_from(times.max(0)).map_err(|_| repeat_overflow())?;
    match len.checked_mul(times) {
        Some(total) if total <= isize::MAX as usize / std::mem::size_of::<ObjRef>() => Ok(times),
        _ => Err(repeat_overflow()),
    }
}

fn repeat_overflow() -> RuntimeError {
    RuntimeError::new(ExcKind::OverflowError, "repeated sequence is too long")
}

fn repeat_items(items: &[ObjRef], times: i64) -> RtResult<Vec<ObjRef>> {
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let times = repeat_count(items.len(), times)?;
    let mut out = Vec::with_capacity(items.len() * times);
    for _ in 0..times {
        out.extend_from_slice(items);
    }
    Ok(out)
}

/// Element positions selected by a slice, after clamping
pub(crate) fn slice_positions(
    len: usize,
    start: Option<i64>,
    stop: Option<i64>,
    step: i64,
) -> Vec<usize> {
    let len = len as i64;
    let clamp = |value: i64, low: i64, high: i64| value.max(low).min(high);
    let resolve = |value: i64| if value < 0 { value + len } else { value };

    let mut out = Vec::new();
    if step > 0 {
        let start = start.map_or(0, |v| clamp(resolve(v), 0, len));
        let stop = stop.map_or(len, |v| clamp(resolve(v), 0, len));
        let mut i = start;
        while i < stop {
            out.push(i as usize);
            i += step;
        }
    } else {
        let start = start.map_or(len - 1, |v| clamp(resolve(v), -1, len - 1));
        let stop = stop.map_or(-1, |v| clamp(resolve(v), -1, len - 1));
        let mut i = start;
        while i > stop {
            out.push(i as usize);
            i += step;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interp() -> Interpreter {
        Interpreter::new(1).unwrap()
    }

    #[test]
    fn test_numeric_equality_crosses_types() {
        let mut it = interp();
        let i = it.new_int(1);
        let f = it.new_float(1.0);
        let t = it.new_bool(true);
        assert!(it.equal(i, f).unwrap());
        assert!(it.equal(i, t).unwrap());
        assert_eq!(it.hash(i).unwrap(), it.hash(f).unwrap());
    }

    #[test]
    fn test_nan_is_not_equal_to_itself() {
        let mut it = interp();
        let nan = it.new_float(f64::NAN);
        assert!(!it.equal(nan, nan).unwrap());
        assert!(!it.compare(nan, nan, CompareOp::Lt).unwrap());
    }

    #[test]
    fn test_ordering_errors_across_types() {
        let mut it = interp();
        let i = it.new_int(1);
        let s = it.new_str("a");
        let err = it.compare(i, s, CompareOp::Lt).unwrap_err();
        assert_eq!(err.kind(), ExcKind::TypeError);
        assert!(err.message().contains("'<' not supported"));
    }

    #[test]
    fn test_floor_semantics() {
        assert_eq!(floor_div(-7, 2).unwrap(), -4);
        assert_eq!(floor_mod(-7, 2).unwrap(), 1);
        assert_eq!(floor_mod(7, -2).unwrap(), -1);
        assert!(floor_div(1, 0).is_err());
        assert_eq!(float_mod(-1.0, 3.0).unwrap(), 2.0);
    }

    #[test]
    fn test_overflow_is_reported() {
        let mut it = interp();
        let big = it.new_int(i64::MAX);
        let one = it.new_int(1);
        let err = it.binary_op(BinaryOp::Add, big, one).unwrap_err();
        assert_eq!(err.kind(), ExcKind::OverflowError);
    }

    #[test]
    fn test_repr_forms() {
        let mut it = interp();
        let one = it.new_int(1);
        let s = it.new_str("x");
        let tuple = it.adopt(Object::Tuple(vec![one])).unwrap();
        let list = it.adopt(Object::List(vec![one, s])).unwrap();
        let set = it.new_set();
        assert_eq!(it.repr(tuple).unwrap(), "(1,)");
        assert_eq!(it.repr(list).unwrap(), "[1, 'x']");
        assert_eq!(it.repr(set).unwrap(), "set()");
        assert_eq!(it.str(s).unwrap(), "x");
    }

    #[test]
    fn test_self_referencing_repr() {
        let mut it = interp();
        let list = it.new_list(Vec::new());
        it.heap.incref(list).unwrap();
        if let Ok(Object::List(items)) = it.get_mut(list) {
            items.push(list);
        }
        assert_eq!(it.repr(list).unwrap(), "[[...]]");
    }

    #[test]
    fn test_set_algebra() {
        let mut it = interp();
        let a = it.new_set();
        let b = it.new_set();
        for v in [1, 2, 3] {
            let r = it.new_int(v);
            it.set_add(a, r).unwrap();
            it.release(r);
        }
        for v in [2, 3, 4] {
            let r = it.new_int(v);
            it.set_add(b, r).unwrap();
            it.release(r);
        }
        let union = it.binary_op(BinaryOp::BitOr, a, b).unwrap();
        let inter = it.binary_op(BinaryOp::BitAnd, a, b).unwrap();
        let diff = it.binary_op(BinaryOp::Sub, a, b).unwrap();
        let sym = it.binary_op(BinaryOp::BitXor, a, b).unwrap();
        assert_eq!(it.length(union).unwrap(), 4);
        assert_eq!(it.length(inter).unwrap(), 2);
        assert_eq!(it.repr(diff).unwrap(), "{1}");
        assert_eq!(it.repr(sym).unwrap(), "{1, 4}");
        assert!(it.compare(inter, a, CompareOp::Le).unwrap());
        assert!(!it.compare(a, b, CompareOp::Le).unwrap());
    }

    #[test]
    fn test_index_rules() {
        let mut it = interp();
        let items = (0..3).map(|i| it.new_int(i)).collect();
        let list = it.new_list(items);
        let minus_one = it.new_int(-1);
        let three = it.new_int(3);
        let last = it.getitem(list, minus_one).unwrap();
        assert_eq!(it.to_int(last).unwrap(), 2);
        assert_eq!(
            it.getitem(list, three).unwrap_err().kind(),
            ExcKind::IndexError
        );
    }

    #[test]
    fn test_slice_positions() {
        assert_eq!(slice_positions(5, Some(1), Some(4), 1), vec![1, 2, 3]);
        assert_eq!(slice_positions(5, None, None, -1), vec![4, 3, 2, 1, 0]);
        assert_eq!(slice_positions(5, Some(-2), None, 1), vec![3, 4]);
        assert_eq!(slice_positions(5, None, None, 2), vec![0, 2, 4]);
        assert!(slice_positions(3, Some(5), None, 1).is_empty());
    }

    #[test]
    fn test_unhashable_containers() {
        let mut it = interp();
        let list = it.new_list(Vec::new());
        assert!(it.hash(list).is_err());
        let dict = it.new_dict();
        assert_eq!(
            it.dict_set(dict, list, list).unwrap_err().kind(),
            ExcKind::TypeError
        );
    }
}
