//! Statement execution

use std::sync::Arc;

use rustpython_parser::ast::{self, Expr, Stmt};

use super::{Flow, Frame};
use crate::builtins::Builtin;
use crate::error::{ExcKind, RtResult, RuntimeError};
use crate::heap::ObjRef;
use crate::interp::Interpreter;
use crate::object::{Body, ExceptionObject, Object, ScopeDecls};
use crate::ops::BinaryOp;

/// Map an AST operator onto the runtime's binary operators
pub(super) fn binary_operator(op: ast::Operator) -> RtResult<BinaryOp> {
    Ok(match op {
        ast::Operator::Add => BinaryOp::Add,
        ast::Operator::Sub => BinaryOp::Sub,
        ast::Operator::Mult => BinaryOp::Mul,
        ast::Operator::Div => BinaryOp::TrueDiv,
        ast::Operator::FloorDiv => BinaryOp::FloorDiv,
        ast::Operator::Mod => BinaryOp::Mod,
        ast::Operator::Pow => BinaryOp::Pow,
        ast::Operator::LShift => BinaryOp::LShift,
        ast::Operator::RShift => BinaryOp::RShift,
        ast::Operator::BitAnd => BinaryOp::BitAnd,
        ast::Operator::BitOr => BinaryOp::BitOr,
        ast::Operator::BitXor => BinaryOp::BitXor,
        _ => return Err(RuntimeError::unsupported("operator '@'")),
    })
}

/// `global` and `nonlocal` declarations of a function body
///
/// Nested function bodies keep their own declarations.
pub(super) fn scope_decls(body: &[Stmt]) -> ScopeDecls {
    let mut decls = ScopeDecls::default();
    collect_decls(body, &mut decls);
    decls
}

fn collect_decls(body: &[Stmt], decls: &mut ScopeDecls) {
    for stmt in body {
        match stmt {
            Stmt::Global(s) => decls
                .globals
                .extend(s.names.iter().map(|n| n.as_str().to_string())),
            Stmt::Nonlocal(s) => decls
                .nonlocals
                .extend(s.names.iter().map(|n| n.as_str().to_string())),
            Stmt::If(s) => {
                collect_decls(&s.body, decls);
                collect_decls(&s.orelse, decls);
            }
            Stmt::While(s) => {
                collect_decls(&s.body, decls);
                collect_decls(&s.orelse, decls);
            }
            Stmt::For(s) => {
                collect_decls(&s.body, decls);
                collect_decls(&s.orelse, decls);
            }
            Stmt::With(s) => collect_decls(&s.body, decls),
            Stmt::Try(s) => {
                collect_decls(&s.body, decls);
                for ast::ExceptHandler::ExceptHandler(handler) in &s.handlers {
                    collect_decls(&handler.body, decls);
                }
                collect_decls(&s.orelse, decls);
                collect_decls(&s.finalbody, decls);
            }
            _ => {}
        }
    }
}

impl Interpreter {
    pub(super) fn exec_block(&mut self, frame: &Frame<'_>, body: &[Stmt]) -> RtResult<Flow> {
        for stmt in body {
            match self.exec_stmt(frame, stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, frame: &Frame<'_>, stmt: &Stmt) -> RtResult<Flow> {
        match stmt {
            Stmt::Expr(s) => {
                let value = self.eval_expr(frame, &s.value)?;
                self.release(value);
            }
            Stmt::Assign(s) => {
                let value = self.eval_expr(frame, &s.value)?;
                let mut outcome = Ok(());
                for target in &s.targets {
                    outcome = self.assign(frame, target, value);
                    if outcome.is_err() {
                        break;
                    }
                }
                self.release(value);
                outcome?;
            }
            Stmt::AugAssign(s) => self.exec_aug_assign(frame, s)?,
            Stmt::AnnAssign(s) => {
                if let Some(value) = &s.value {
                    let value = self.eval_expr(frame, value)?;
                    let outcome = self.assign(frame, &s.target, value);
                    self.release(value);
                    outcome?;
                }
            }
            Stmt::If(s) => {
                let branch = if self.eval_truth(frame, &s.test)? {
                    &s.body
                } else {
                    &s.orelse
                };
                return self.exec_block(frame, branch);
            }
            Stmt::While(s) => return self.exec_while(frame, s),
            Stmt::For(s) => return self.exec_for(frame, s),
            Stmt::Break(_) => return Ok(Flow::Break),
            Stmt::Continue(_) => return Ok(Flow::Continue),
            Stmt::Pass(_) | Stmt::Global(_) | Stmt::Nonlocal(_) => {}
            Stmt::Return(s) => {
                let value = match &s.value {
                    Some(value) => self.eval_expr(frame, value)?,
                    None => self.new_none(),
                };
                return Ok(Flow::Return(value));
            }
            Stmt::FunctionDef(s) => self.exec_function_def(frame, s)?,
            Stmt::Delete(s) => {
                for target in &s.targets {
                    self.delete(frame, target)?;
                }
            }
            Stmt::Assert(s) => {
                if !self.eval_truth(frame, &s.test)? {
                    let message = match &s.msg {
                        Some(msg) => {
                            let value = self.eval_expr(frame, msg)?;
                            let text = self.str(value);
                            self.release(value);
                            text?
                        }
                        None => String::new(),
                    };
                    return Err(RuntimeError::new(ExcKind::AssertionError, message));
                }
            }
            Stmt::Raise(s) => return Err(self.exec_raise(frame, s.exc.as_deref())),
            Stmt::Try(s) => return self.exec_try(frame, s),
            Stmt::With(s) => return self.exec_with(frame, &s.items, &s.body),
            Stmt::Import(_) | Stmt::ImportFrom(_) => {
                return Err(RuntimeError::new(
                    ExcKind::ImportError,
                    "module imports are not available",
                ))
            }
            Stmt::ClassDef(_) => return Err(RuntimeError::unsupported("class definitions")),
            _ => return Err(RuntimeError::unsupported("statement")),
        }
        Ok(Flow::Normal)
    }

    pub(super) fn eval_truth(&mut self, frame: &Frame<'_>, expr: &Expr) -> RtResult<bool> {
        let value = self.eval_expr(frame, expr)?;
        let truth = self.truthy(value);
        self.release(value);
        truth
    }

    // ------------------------------------------------------------------
    // Assignment targets
    // ------------------------------------------------------------------

    /// Bind the borrowed `value` to an assignment target
    pub(super) fn assign(&mut self, frame: &Frame<'_>, target: &Expr, value: ObjRef) -> RtResult<()> {
        match target {
            Expr::Name(name) => self.store_name(frame, name.id.as_str(), value),
            Expr::Tuple(ast::ExprTuple { elts, .. }) | Expr::List(ast::ExprList { elts, .. }) => {
                self.assign_unpack(frame, elts, value)
            }
            Expr::Subscript(s) => {
                let container = self.eval_expr(frame, &s.value)?;
                let outcome = self.eval_expr(frame, &s.slice).and_then(|key| {
                    let set = self.setitem(container, key, value);
                    self.release(key);
                    set
                });
                self.release(container);
                outcome
            }
            Expr::Attribute(a) => Err(RuntimeError::new(
                ExcKind::AttributeError,
                format!("attribute '{}' is read-only", a.attr.as_str()),
            )),
            _ => Err(RuntimeError::new(
                ExcKind::SyntaxError,
                "cannot assign to expression",
            )),
        }
    }

    fn assign_unpack(&mut self, frame: &Frame<'_>, targets: &[Expr], value: ObjRef) -> RtResult<()> {
        let items = self.iterate(value)?;
        let starred = targets.iter().position(|t| matches!(t, Expr::Starred(_)));
        let outcome = match starred {
            None if items.len() != targets.len() => Err(unpack_error(targets.len(), items.len())),
            None => targets
                .iter()
                .zip(&items)
                .try_for_each(|(target, item)| self.assign(frame, target, *item)),
            Some(star) => {
                let after = targets.len() - star - 1;
                if items.len() < star + after {
                    Err(unpack_error(targets.len() - 1, items.len()))
                } else {
                    self.assign_starred(frame, targets, &items, star, after)
                }
            }
        };
        self.release_all(items);
        outcome
    }

    fn assign_starred(
        &mut self,
        frame: &Frame<'_>,
        targets: &[Expr],
        items: &[ObjRef],
        star: usize,
        after: usize,
    ) -> RtResult<()> {
        for (target, item) in targets[..star].iter().zip(items) {
            self.assign(frame, target, *item)?;
        }
        let rest_end = items.len() - after;
        let rest = self.adopt(Object::List(items[star..rest_end].to_vec()))?;
        let inner = match &targets[star] {
            Expr::Starred(s) => &*s.value,
            other => other,
        };
        let outcome = self.assign(frame, inner, rest);
        self.release(rest);
        outcome?;
        for (target, item) in targets[star + 1..].iter().zip(&items[rest_end..]) {
            self.assign(frame, target, *item)?;
        }
        Ok(())
    }

    fn delete(&mut self, frame: &Frame<'_>, target: &Expr) -> RtResult<()> {
        match target {
            Expr::Name(name) => self.delete_name(frame, name.id.as_str()),
            Expr::Tuple(ast::ExprTuple { elts, .. }) | Expr::List(ast::ExprList { elts, .. }) => {
                elts.iter().try_for_each(|t| self.delete(frame, t))
            }
            Expr::Subscript(s) => {
                let container = self.eval_expr(frame, &s.value)?;
                let outcome = self.eval_expr(frame, &s.slice).and_then(|key| {
                    let deleted = self.delitem(container, key);
                    self.release(key);
                    deleted
                });
                self.release(container);
                outcome
            }
            _ => Err(RuntimeError::new(ExcKind::SyntaxError, "cannot delete expression")),
        }
    }

    fn exec_aug_assign(&mut self, frame: &Frame<'_>, s: &ast::StmtAugAssign) -> RtResult<()> {
        let op = binary_operator(s.op)?;
        match &*s.target {
            Expr::Name(name) => {
                let current = self.load_name(frame, name.id.as_str())?;
                let outcome = self.eval_expr(frame, &s.value).and_then(|rhs| {
                    let updated = self.inplace_op(op, current, rhs);
                    self.release(rhs);
                    updated
                });
                self.release(current);
                let updated = outcome?;
                let stored = self.store_name(frame, name.id.as_str(), updated);
                self.release(updated);
                stored
            }
            Expr::Subscript(sub) => {
                let container = self.eval_expr(frame, &sub.value)?;
                let outcome = self.eval_expr(frame, &sub.slice).and_then(|key| {
                    let result = self.aug_assign_item(frame, container, key, op, &s.value);
                    self.release(key);
                    result
                });
                self.release(container);
                outcome
            }
            _ => Err(RuntimeError::new(
                ExcKind::SyntaxError,
                "illegal expression for augmented assignment",
            )),
        }
    }

    fn aug_assign_item(
        &mut self,
        frame: &Frame<'_>,
        container: ObjRef,
        key: ObjRef,
        op: BinaryOp,
        value: &Expr,
    ) -> RtResult<()> {
        let current = self.getitem(container, key)?;
        let outcome = self.eval_expr(frame, value).and_then(|rhs| {
            let updated = self.inplace_op(op, current, rhs);
            self.release(rhs);
            updated
        });
        self.release(current);
        let updated = outcome?;
        let stored = self.setitem(container, key, updated);
        self.release(updated);
        stored
    }

    /// `a op= b`: lists extend in place, everything else rebinds
    fn inplace_op(&mut self, op: BinaryOp, current: ObjRef, rhs: ObjRef) -> RtResult<ObjRef> {
        if op == BinaryOp::Add && matches!(self.get(current)?, Object::List(_)) {
            self.list_extend(current, rhs)?;
            return self.incref(current);
        }
        self.binary_op(op, current, rhs)
    }

    // ------------------------------------------------------------------
    // Loops
    // ------------------------------------------------------------------

    fn exec_while(&mut self, frame: &Frame<'_>, s: &ast::StmtWhile) -> RtResult<Flow> {
        while self.eval_truth(frame, &s.test)? {
            match self.exec_block(frame, &s.body)? {
                Flow::Break => return Ok(Flow::Normal),
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal | Flow::Continue => {}
            }
        }
        self.exec_block(frame, &s.orelse)
    }

    fn exec_for(&mut self, frame: &Frame<'_>, s: &ast::StmtFor) -> RtResult<Flow> {
        let iterable = self.eval_expr(frame, &s.iter)?;
        let items = self.iterate(iterable);
        self.release(iterable);
        let mut items = items?.into_iter();

        let mut outcome = Ok(None);
        for item in items.by_ref() {
            let step = self
                .assign(frame, &s.target, item)
                .and_then(|_| self.exec_block(frame, &s.body));
            self.release(item);
            match step {
                Ok(Flow::Normal | Flow::Continue) => {}
                Ok(Flow::Break) => {
                    outcome = Ok(Some(Flow::Normal));
                    break;
                }
                Ok(flow) => {
                    outcome = Ok(Some(flow));
                    break;
                }
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }
        self.release_all(items);
        match outcome? {
            Some(flow) => Ok(flow),
            None => self.exec_block(frame, &s.orelse),
        }
    }

    /// `with` over file objects: the file is closed however the body exits
    fn exec_with(
        &mut self,
        frame: &Frame<'_>,
        items: &[ast::WithItem],
        body: &[Stmt],
    ) -> RtResult<Flow> {
        let Some((item, rest)) = items.split_first() else {
            return self.exec_block(frame, body);
        };
        let resource = self.eval_expr(frame, &item.context_expr)?;
        if !matches!(self.get(resource)?, Object::File(_)) {
            let kind = self.type_name(resource)?;
            self.release(resource);
            return Err(RuntimeError::type_error(format!(
                "'{}' object does not support the context manager protocol",
                kind
            )));
        }
        let flow = match &item.optional_vars {
            Some(target) => self
                .assign(frame, target, resource)
                .and_then(|_| self.exec_with(frame, rest, body)),
            None => self.exec_with(frame, rest, body),
        };
        let closed = match self.get_mut(resource) {
            Ok(Object::File(file)) => file.close(),
            _ => Ok(()),
        };
        self.release(resource);
        match (flow, closed) {
            (Ok(flow), Ok(())) => Ok(flow),
            (Ok(flow), Err(err)) => {
                if let Flow::Return(value) = flow {
                    self.release(value);
                }
                Err(err)
            }
            (Err(err), _) => Err(err),
        }
    }

    // ------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------

    fn exec_function_def(&mut self, frame: &Frame<'_>, s: &ast::StmtFunctionDef) -> RtResult<()> {
        let mut decorators = Vec::with_capacity(s.decorator_list.len());
        for decorator in &s.decorator_list {
            match self.eval_expr(frame, decorator) {
                Ok(value) => decorators.push(value),
                Err(err) => {
                    self.release_all(decorators);
                    return Err(err);
                }
            }
        }

        let body = Body::Block(Arc::new(s.body.clone()));
        let scope = scope_decls(&s.body);
        let mut func = match self.make_function(frame, s.name.as_str(), &s.args, body, scope) {
            Ok(func) => func,
            Err(err) => {
                self.release_all(decorators);
                return Err(err);
            }
        };
        // Decorators apply bottom-up
        while let Some(decorator) = decorators.pop() {
            let wrapped = self.call(decorator, &[func], &[]);
            self.release(decorator);
            self.release(func);
            match wrapped {
                Ok(wrapped) => func = wrapped,
                Err(err) => {
                    self.release_all(decorators);
                    return Err(err);
                }
            }
        }
        let stored = self.store_name(frame, s.name.as_str(), func);
        self.release(func);
        stored
    }

    // ------------------------------------------------------------------
    // Exceptions
    // ------------------------------------------------------------------

    /// Error raised by `raise exc`; a bare `raise` re-raises the active one
    fn exec_raise(&mut self, frame: &Frame<'_>, exc: Option<&Expr>) -> RuntimeError {
        let Some(exc) = exc else {
            return match self.handling.last() {
                Some(active) => active.clone(),
                None => RuntimeError::new(ExcKind::RuntimeError, "No active exception to reraise"),
            };
        };
        let value = match self.eval_expr(frame, exc) {
            Ok(value) => value,
            Err(err) => return err,
        };
        let raised = match self.get(value) {
            Ok(Object::Exception(ExceptionObject { kind, message })) => {
                RuntimeError::new(*kind, message.clone())
            }
            Ok(Object::Builtin(Builtin::Exception(kind))) => RuntimeError::new(*kind, ""),
            Ok(_) => RuntimeError::type_error("exceptions must derive from BaseException"),
            Err(err) => err,
        };
        self.release(value);
        raised
    }

    fn exec_try(&mut self, frame: &Frame<'_>, s: &ast::StmtTry) -> RtResult<Flow> {
        let outcome = match self.exec_block(frame, &s.body) {
            Ok(Flow::Normal) => self.exec_block(frame, &s.orelse),
            Ok(flow) => Ok(flow),
            Err(err) => self.handle_exception(frame, &s.handlers, err),
        };
        if s.finalbody.is_empty() {
            return outcome;
        }
        match self.exec_block(frame, &s.finalbody) {
            Ok(Flow::Normal) => outcome,
            // Control flow leaving `finally` replaces the pending outcome
            Ok(flow) => {
                if let Ok(Flow::Return(value)) = outcome {
                    self.release(value);
                }
                Ok(flow)
            }
            Err(err) => {
                if let Ok(Flow::Return(value)) = outcome {
                    self.release(value);
                }
                Err(err)
            }
        }
    }

    fn handle_exception(
        &mut self,
        frame: &Frame<'_>,
        handlers: &[ast::ExceptHandler],
        err: RuntimeError,
    ) -> RtResult<Flow> {
        for ast::ExceptHandler::ExceptHandler(handler) in handlers {
            let matched = match &handler.type_ {
                None => true,
                Some(class) => {
                    let class = self.eval_expr(frame, class)?;
                    let matched = self.exception_matches(err.kind(), class);
                    self.release(class);
                    matched?
                }
            };
            if !matched {
                continue;
            }
            if let Some(name) = &handler.name {
                let exc = self.alloc(Object::Exception(ExceptionObject {
                    kind: err.kind(),
                    message: err.message().to_string(),
                }));
                let stored = self.store_name(frame, name.as_str(), exc);
                self.release(exc);
                stored?;
            }
            self.handling.push(err);
            let flow = self.exec_block(frame, &handler.body);
            self.handling.pop();
            return flow;
        }
        Err(err)
    }

    fn exception_matches(&self, kind: ExcKind, class: ObjRef) -> RtResult<bool> {
        match self.get(class)? {
            Object::Builtin(Builtin::Exception(base)) => Ok(kind.is_subclass_of(*base)),
            Object::Tuple(classes) => {
                for class in classes {
                    if self.exception_matches(kind, *class)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            _ => Err(RuntimeError::type_error(
                "catching classes that do not inherit from BaseException is not allowed",
            )),
        }
    }
}

fn unpack_error(expected: usize, got: usize) -> RuntimeError {
    if got > expected {
        RuntimeError::value_error(format!("too many values to unpack (expected {})", expected))
    } else {
        RuntimeError::value_error(format!(
            "not enough values to unpack (expected {}, got {})",
            expected, got
        ))
    }
}
