//! Expression evaluation
//!
//! `eval_expr` keeps each arm a single call so deep nesting costs little
//! native stack per level.

use std::sync::Arc;

use rustpython_parser::ast::{self, Constant, Expr};

use super::stmt::binary_operator;
use super::Frame;
use crate::error::{ExcKind, RtResult, RuntimeError};
use crate::heap::ObjRef;
use crate::interp::Interpreter;
use crate::object::{Body, Object, ScopeDecls};
use crate::ops::{CompareOp, UnaryOp};
use crate::strings::FormatSpec;

/// What a comprehension accumulates into
enum Produce<'e> {
    List(&'e Expr),
    Set(&'e Expr),
    Dict(&'e Expr, &'e Expr),
}

impl Interpreter {
    /// Evaluate `expr`, returning a new reference
    pub(super) fn eval_expr(&mut self, frame: &Frame<'_>, expr: &Expr) -> RtResult<ObjRef> {
        match expr {
            Expr::Constant(c) => self.constant(&c.value),
            Expr::Name(name) => self.load_name(frame, name.id.as_str()),
            Expr::BinOp(b) => self.eval_binop(frame, b),
            Expr::UnaryOp(u) => self.eval_unary(frame, u),
            Expr::BoolOp(b) => self.eval_boolop(frame, b),
            Expr::Compare(c) => self.eval_compare(frame, c),
            Expr::Call(c) => self.eval_call(frame, c),
            Expr::Attribute(a) => self.eval_attribute(frame, a),
            Expr::Subscript(s) => self.eval_subscript(frame, s),
            Expr::List(l) => {
                let items = self.eval_elements(frame, &l.elts)?;
                Ok(self.new_list(items))
            }
            Expr::Tuple(t) => {
                let items = self.eval_elements(frame, &t.elts)?;
                Ok(self.new_tuple(items))
            }
            Expr::Set(s) => self.eval_set(frame, &s.elts),
            Expr::Dict(d) => self.eval_dict(frame, d),
            Expr::IfExp(e) => {
                let branch = if self.eval_truth(frame, &e.test)? {
                    &e.body
                } else {
                    &e.orelse
                };
                self.eval_expr(frame, branch)
            }
            Expr::Lambda(l) => {
                let body = Body::Expr(Arc::new((*l.body).clone()));
                self.make_function(frame, "<lambda>", &l.args, body, ScopeDecls::default())
            }
            Expr::NamedExpr(n) => self.eval_named(frame, n),
            Expr::ListComp(c) => self.comprehension(frame, Produce::List(&c.elt), &c.generators),
            Expr::GeneratorExp(c) => {
                self.comprehension(frame, Produce::List(&c.elt), &c.generators)
            }
            Expr::SetComp(c) => self.comprehension(frame, Produce::Set(&c.elt), &c.generators),
            Expr::DictComp(c) => {
                self.comprehension(frame, Produce::Dict(&c.key, &c.value), &c.generators)
            }
            Expr::JoinedStr(j) => {
                let text = self.eval_joined(frame, &j.values)?;
                Ok(self.new_str(text))
            }
            Expr::FormattedValue(f) => {
                let text = self.eval_formatted(frame, f)?;
                Ok(self.new_str(text))
            }
            Expr::Starred(_) => Err(RuntimeError::new(
                ExcKind::SyntaxError,
                "can't use starred expression here",
            )),
            Expr::Slice(_) => Err(RuntimeError::unsupported("slice outside subscript")),
            _ => Err(RuntimeError::unsupported("expression")),
        }
    }

    fn constant(&mut self, value: &Constant) -> RtResult<ObjRef> {
        match value {
            Constant::None => Ok(self.new_none()),
            Constant::Bool(b) => Ok(self.new_bool(*b)),
            Constant::Str(s) => Ok(self.new_str(s.as_str())),
            Constant::Int(i) => {
                let value = i.to_string().parse::<i64>().map_err(|_| {
                    RuntimeError::new(ExcKind::OverflowError, "integer literal too large")
                })?;
                Ok(self.new_int(value))
            }
            Constant::Float(f) => Ok(self.new_float(*f)),
            Constant::Tuple(items) => {
                let mut refs = Vec::with_capacity(items.len());
                for item in items {
                    match self.constant(item) {
                        Ok(r) => refs.push(r),
                        Err(err) => {
                            self.release_all(refs);
                            return Err(err);
                        }
                    }
                }
                Ok(self.new_tuple(refs))
            }
            _ => Err(RuntimeError::unsupported("literal")),
        }
    }

    fn eval_binop(&mut self, frame: &Frame<'_>, b: &ast::ExprBinOp) -> RtResult<ObjRef> {
        let op = binary_operator(b.op)?;
        let left = self.eval_expr(frame, &b.left)?;
        let result = self.eval_expr(frame, &b.right).and_then(|right| {
            let result = self.binary_op(op, left, right);
            self.release(right);
            result
        });
        self.release(left);
        result
    }

    fn eval_unary(&mut self, frame: &Frame<'_>, u: &ast::ExprUnaryOp) -> RtResult<ObjRef> {
        let op = match u.op {
            ast::UnaryOp::Not => UnaryOp::Not,
            ast::UnaryOp::USub => UnaryOp::Neg,
            ast::UnaryOp::UAdd => UnaryOp::Pos,
            ast::UnaryOp::Invert => UnaryOp::Invert,
        };
        let operand = self.eval_expr(frame, &u.operand)?;
        let result = self.unary_op(op, operand);
        self.release(operand);
        result
    }

    /// `and`/`or` yield the deciding operand itself
    fn eval_boolop(&mut self, frame: &Frame<'_>, b: &ast::ExprBoolOp) -> RtResult<ObjRef> {
        let stop_on = matches!(b.op, ast::BoolOp::Or);
        let Some((last, init)) = b.values.split_last() else {
            return Ok(self.new_none());
        };
        for operand in init {
            let value = self.eval_expr(frame, operand)?;
            match self.truthy(value) {
                Ok(truth) if truth == stop_on => return Ok(value),
                Ok(_) => self.release(value),
                Err(err) => {
                    self.release(value);
                    return Err(err);
                }
            }
        }
        self.eval_expr(frame, last)
    }

    fn eval_compare(&mut self, frame: &Frame<'_>, c: &ast::ExprCompare) -> RtResult<ObjRef> {
        let mut left = self.eval_expr(frame, &c.left)?;
        for (op, comparator) in c.ops.iter().zip(&c.comparators) {
            let right = match self.eval_expr(frame, comparator) {
                Ok(right) => right,
                Err(err) => {
                    self.release(left);
                    return Err(err);
                }
            };
            let holds = self.compare_op(*op, left, right);
            self.release(left);
            match holds {
                Ok(true) => left = right,
                Ok(false) => {
                    self.release(right);
                    return Ok(self.new_bool(false));
                }
                Err(err) => {
                    self.release(right);
                    return Err(err);
                }
            }
        }
        self.release(left);
        Ok(self.new_bool(true))
    }

    fn compare_op(&self, op: ast::CmpOp, left: ObjRef, right: ObjRef) -> RtResult<bool> {
        let op = match op {
            ast::CmpOp::Eq => CompareOp::Eq,
            ast::CmpOp::NotEq => CompareOp::Ne,
            ast::CmpOp::Lt => CompareOp::Lt,
            ast::CmpOp::LtE => CompareOp::Le,
            ast::CmpOp::Gt => CompareOp::Gt,
            ast::CmpOp::GtE => CompareOp::Ge,
            ast::CmpOp::Is => return Ok(left == right),
            ast::CmpOp::IsNot => return Ok(left != right),
            ast::CmpOp::In => return self.contains(right, left),
            ast::CmpOp::NotIn => return self.contains(right, left).map(|found| !found),
        };
        self.compare(left, right, op)
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    fn eval_call(&mut self, frame: &Frame<'_>, c: &ast::ExprCall) -> RtResult<ObjRef> {
        // `obj.method(...)` dispatches without allocating a bound method
        if let Expr::Attribute(attr) = &*c.func {
            let receiver = self.eval_expr(frame, &attr.value)?;
            let result = match self.has_method(receiver, attr.attr.as_str()) {
                Ok(true) => self.eval_args(frame, &c.args, &c.keywords).and_then(|(args, kwargs)| {
                    let result = self.call_method(receiver, attr.attr.as_str(), &args, &kwargs);
                    self.release_arguments(args, kwargs);
                    result
                }),
                Ok(false) => self
                    .getattr(receiver, attr.attr.as_str())
                    .and_then(|func| {
                        let result = self.call_evaluated(frame, func, c);
                        self.release(func);
                        result
                    }),
                Err(err) => Err(err),
            };
            self.release(receiver);
            return result;
        }
        let func = self.eval_expr(frame, &c.func)?;
        let result = self.call_evaluated(frame, func, c);
        self.release(func);
        result
    }

    fn call_evaluated(&mut self, frame: &Frame<'_>, func: ObjRef, c: &ast::ExprCall) -> RtResult<ObjRef> {
        let (args, kwargs) = self.eval_args(frame, &c.args, &c.keywords)?;
        let result = self.call(func, &args, &kwargs);
        self.release_arguments(args, kwargs);
        result
    }

    fn release_arguments(&mut self, args: Vec<ObjRef>, kwargs: Vec<(String, ObjRef)>) {
        self.release_all(args);
        self.release_all(kwargs.into_iter().map(|(_, value)| value));
    }

    /// Owned positional and keyword arguments, with `*` and `**` expanded
    fn eval_args(
        &mut self,
        frame: &Frame<'_>,
        args: &[Expr],
        keywords: &[ast::Keyword],
    ) -> RtResult<(Vec<ObjRef>, Vec<(String, ObjRef)>)> {
        let positional = self.eval_elements(frame, args)?;
        let mut named: Vec<(String, ObjRef)> = Vec::with_capacity(keywords.len());
        let outcome = (|| -> RtResult<()> {
            for keyword in keywords {
                let value = self.eval_expr(frame, &keyword.value)?;
                match &keyword.arg {
                    Some(name) => named.push((name.as_str().to_string(), value)),
                    None => {
                        let expanded = self.expand_kwargs(value);
                        self.release(value);
                        named.extend(expanded?);
                    }
                }
            }
            Ok(())
        })();
        match outcome {
            Ok(()) => Ok((positional, named)),
            Err(err) => {
                self.release_arguments(positional, named);
                Err(err)
            }
        }
    }

    fn expand_kwargs(&mut self, mapping: ObjRef) -> RtResult<Vec<(String, ObjRef)>> {
        if !matches!(self.get(mapping)?, Object::Dict(_)) {
            return Err(RuntimeError::type_error(format!(
                "argument after ** must be a mapping, not {}",
                self.type_name(mapping)?
            )));
        }
        let mut out = Vec::new();
        for (key, value) in self.dict_entries(mapping)? {
            let name = match self.get(key)?.as_str() {
                Some(name) => name.to_string(),
                None => {
                    self.release_all(out.into_iter().map(|(_, v)| v));
                    return Err(RuntimeError::type_error("keywords must be strings"));
                }
            };
            out.push((name, self.incref(value)?));
        }
        Ok(out)
    }

    fn eval_attribute(&mut self, frame: &Frame<'_>, a: &ast::ExprAttribute) -> RtResult<ObjRef> {
        let receiver = self.eval_expr(frame, &a.value)?;
        let result = self.getattr(receiver, a.attr.as_str());
        self.release(receiver);
        result
    }

    // ------------------------------------------------------------------
    // Subscripts and displays
    // ------------------------------------------------------------------

    fn eval_subscript(&mut self, frame: &Frame<'_>, s: &ast::ExprSubscript) -> RtResult<ObjRef> {
        let container = self.eval_expr(frame, &s.value)?;
        let result = match &*s.slice {
            Expr::Slice(slice) => self.eval_slice(frame, container, slice),
            key => self.eval_expr(frame, key).and_then(|key| {
                let item = self.getitem(container, key);
                self.release(key);
                item
            }),
        };
        self.release(container);
        result
    }

    fn eval_slice(
        &mut self,
        frame: &Frame<'_>,
        container: ObjRef,
        slice: &ast::ExprSlice,
    ) -> RtResult<ObjRef> {
        let lower = self.slice_bound(frame, slice.lower.as_deref())?;
        let upper = self.slice_bound(frame, slice.upper.as_deref())?;
        let step = self.slice_bound(frame, slice.step.as_deref())?;
        self.slice(container, lower, upper, step)
    }

    fn slice_bound(&mut self, frame: &Frame<'_>, bound: Option<&Expr>) -> RtResult<Option<i64>> {
        let Some(bound) = bound else {
            return Ok(None);
        };
        let value = self.eval_expr(frame, bound)?;
        let resolved = if self.is_none(value) {
            Ok(None)
        } else {
            self.to_int(value).map(Some)
        };
        self.release(value);
        resolved
    }

    /// Owned element values of a display, with `*iterable` expanded
    fn eval_elements(&mut self, frame: &Frame<'_>, elts: &[Expr]) -> RtResult<Vec<ObjRef>> {
        let mut items = Vec::with_capacity(elts.len());
        for elt in elts {
            let evaluated = match elt {
                Expr::Starred(starred) => self.eval_expr(frame, &starred.value).and_then(|iterable| {
                    let expanded = self.iterate(iterable);
                    self.release(iterable);
                    expanded
                }),
                other => self.eval_expr(frame, other).map(|value| vec![value]),
            };
            match evaluated {
                Ok(values) => items.extend(values),
                Err(err) => {
                    self.release_all(items);
                    return Err(err);
                }
            }
        }
        Ok(items)
    }

    fn eval_set(&mut self, frame: &Frame<'_>, elts: &[Expr]) -> RtResult<ObjRef> {
        let items = self.eval_elements(frame, elts)?;
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

    fn eval_dict(&mut self, frame: &Frame<'_>, d: &ast::ExprDict) -> RtResult<ObjRef> {
        let dict = self.new_dict();
        let outcome = (|| -> RtResult<()> {
            for (key, value) in d.keys.iter().zip(&d.values) {
                let value = self.eval_expr(frame, value)?;
                let stored = match key {
                    Some(key) => self.eval_expr(frame, key).and_then(|key| {
                        let stored = self.dict_set(dict, key, value);
                        self.release(key);
                        stored
                    }),
                    // `**mapping`
                    None => self.dict_update(dict, value),
                };
                self.release(value);
                stored?;
            }
            Ok(())
        })();
        match outcome {
            Ok(()) => Ok(dict),
            Err(err) => {
                self.release(dict);
                Err(err)
            }
        }
    }

    fn eval_named(&mut self, frame: &Frame<'_>, n: &ast::ExprNamedExpr) -> RtResult<ObjRef> {
        let value = self.eval_expr(frame, &n.value)?;
        match self.assign(frame, &n.target, value) {
            Ok(()) => Ok(value),
            Err(err) => {
                self.release(value);
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Comprehensions
    // ------------------------------------------------------------------

    /// Run a comprehension in its own scope
    ///
    /// The outermost iterable is evaluated in the enclosing scope.
    fn comprehension(
        &mut self,
        frame: &Frame<'_>,
        produce: Produce<'_>,
        generators: &[ast::Comprehension],
    ) -> RtResult<ObjRef> {
        let Some(first) = generators.first() else {
            return Err(RuntimeError::new(ExcKind::SyntaxError, "empty comprehension"));
        };
        let iterable = self.eval_expr(frame, &first.iter)?;
        let items = self.iterate(iterable);
        self.release(iterable);
        let items = items?;

        let result = match produce {
            Produce::List(_) => self.new_list(Vec::new()),
            Produce::Set(_) => self.new_set(),
            Produce::Dict(..) => self.new_dict(),
        };
        let locals = self.new_dict();
        let mut closure = Vec::with_capacity(frame.closure.len() + 1);
        closure.extend(frame.locals);
        closure.extend_from_slice(frame.closure);
        let inner = Frame {
            globals: frame.globals,
            locals: Some(locals),
            closure: &closure,
            scope: frame.scope,
        };

        let mut outcome = Ok(());
        for item in &items {
            outcome = self
                .assign(&inner, &first.target, *item)
                .and_then(|_| self.comprehension_step(&inner, &produce, first, &generators[1..], result));
            if outcome.is_err() {
                break;
            }
        }
        self.release_all(items);
        self.release(locals);
        match outcome {
            Ok(()) => Ok(result),
            Err(err) => {
                self.release(result);
                Err(err)
            }
        }
    }

    /// Apply the filters of `current`, then descend into the next generator
    fn comprehension_step(
        &mut self,
        frame: &Frame<'_>,
        produce: &Produce<'_>,
        current: &ast::Comprehension,
        rest: &[ast::Comprehension],
        result: ObjRef,
    ) -> RtResult<()> {
        for condition in &current.ifs {
            if !self.eval_truth(frame, condition)? {
                return Ok(());
            }
        }
        let Some((next, rest)) = rest.split_first() else {
            return self.produce(frame, produce, result);
        };
        let iterable = self.eval_expr(frame, &next.iter)?;
        let items = self.iterate(iterable);
        self.release(iterable);
        let items = items?;
        let mut outcome = Ok(());
        for item in &items {
            outcome = self
                .assign(frame, &next.target, *item)
                .and_then(|_| self.comprehension_step(frame, produce, next, rest, result));
            if outcome.is_err() {
                break;
            }
        }
        self.release_all(items);
        outcome
    }

    fn produce(&mut self, frame: &Frame<'_>, produce: &Produce<'_>, result: ObjRef) -> RtResult<()> {
        match produce {
            Produce::List(elt) => {
                let value = self.eval_expr(frame, elt)?;
                let appended = self.list_append(result, value);
                self.release(value);
                appended
            }
            Produce::Set(elt) => {
                let value = self.eval_expr(frame, elt)?;
                let added = self.set_add(result, value).map(|_| ());
                self.release(value);
                added
            }
            Produce::Dict(key, value) => {
                let key = self.eval_expr(frame, key)?;
                let stored = self.eval_expr(frame, value).and_then(|value| {
                    let stored = self.dict_set(result, key, value);
                    self.release(value);
                    stored
                });
                self.release(key);
                stored
            }
        }
    }

    // ------------------------------------------------------------------
    // f-strings
    // ------------------------------------------------------------------

    fn eval_joined(&mut self, frame: &Frame<'_>, values: &[Expr]) -> RtResult<String> {
        let mut out = String::new();
        for value in values {
            match value {
                Expr::Constant(c) => match &c.value {
                    Constant::Str(s) => out.push_str(s),
                    other => {
                        let r = self.constant(other)?;
                        let text = self.str(r);
                        self.release(r);
                        out.push_str(&text?);
                    }
                },
                Expr::FormattedValue(f) => out.push_str(&self.eval_formatted(frame, f)?),
                other => {
                    let r = self.eval_expr(frame, other)?;
                    let text = self.str(r);
                    self.release(r);
                    out.push_str(&text?);
                }
            }
        }
        Ok(out)
    }

    fn eval_formatted(&mut self, frame: &Frame<'_>, f: &ast::ExprFormattedValue) -> RtResult<String> {
        let spec = match &f.format_spec {
            Some(spec) => match &**spec {
                Expr::JoinedStr(j) => self.eval_joined(frame, &j.values)?,
                other => {
                    let r = self.eval_expr(frame, other)?;
                    let text = self.str(r);
                    self.release(r);
                    text?
                }
            },
            None => String::new(),
        };
        let value = self.eval_expr(frame, &f.value)?;
        let text = match f.conversion {
            ast::ConversionFlag::Repr | ast::ConversionFlag::Ascii => self
                .repr(value)
                .and_then(|text| FormatSpec::parse(&spec)?.format_str(&text)),
            ast::ConversionFlag::Str => self
                .str(value)
                .and_then(|text| FormatSpec::parse(&spec)?.format_str(&text)),
            _ => self.format_object(value, &spec),
        };
        self.release(value);
        text
    }

    /// `format(value, spec)` for the builtin scalar types
    pub(crate) fn format_object(&self, value: ObjRef, spec: &str) -> RtResult<String> {
        if spec.is_empty() {
            return self.str(value);
        }
        let parsed = FormatSpec::parse(spec)?;
        match self.get(value)? {
            Object::Bool(b) if parsed.kind.is_none() => parsed.format_str(if *b { "True" } else { "False" }),
            Object::Int(i) => parsed.format_int(*i),
            Object::Bool(b) => parsed.format_int(*b as i64),
            Object::Float(f) => parsed.format_float(*f),
            Object::Str(s) => parsed.format_str(s),
            other => Err(RuntimeError::type_error(format!(
                "unsupported format string passed to {}.__format__",
                other.object_type().name()
            ))),
        }
    }
}
