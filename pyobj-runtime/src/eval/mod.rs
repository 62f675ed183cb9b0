//! Evaluator - tree-walking execution of a Python subset
//!
//! Design: source is parsed with `rustpython-parser` and the AST is walked
//! directly, without a bytecode stage:
//! - `stmt.rs` - statements, assignment targets and control flow
//! - `expr.rs` - expressions, comprehensions and f-strings
//!
//! Namespaces are ordinary dict objects. A function call gets a fresh locals
//! dict; nested functions capture their enclosing locals dicts, so closures
//! and the cycle collector see the same object graph.

mod expr;
mod stmt;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use rustpython_parser::{ast, parse, Mode};

use crate::error::{ExcKind, RtResult, RuntimeError};
use crate::heap::ObjRef;
use crate::interp::{Interpreter, MAX_CALL_DEPTH};
use crate::logging::log_call;
use crate::object::{Body, Function, Object, ScopeDecls};

/// Name lookup context of the code being executed
pub(crate) struct Frame<'a> {
    globals: ObjRef,
    /// `None` at module level, where locals are the globals
    locals: Option<ObjRef>,
    closure: &'a [ObjRef],
    scope: &'a ScopeDecls,
}

/// How a statement finished
pub(crate) enum Flow {
    Normal,
    /// Carries an owned reference to the returned value
    Return(ObjRef),
    Break,
    Continue,
}

fn syntax_error(err: impl ToString) -> RuntimeError {
    RuntimeError::new(ExcKind::SyntaxError, err.to_string())
}

impl Interpreter {
    /// Fresh module namespace with the standard metadata bindings
    pub fn new_namespace(&mut self, filename: Option<&str>) -> RtResult<ObjRef> {
        let namespace = self.new_dict();
        let builtins = self.builtins();
        let name = self.new_str("__main__");
        let mut outcome = self
            .dict_set_str(namespace, "__builtins__", builtins)
            .and_then(|_| self.dict_set_str(namespace, "__name__", name));
        if let (Ok(()), Some(filename)) = (&outcome, filename) {
            let file = self.new_str(filename);
            outcome = self.dict_set_str(namespace, "__file__", file);
            self.release(file);
        }
        self.release(name);
        match outcome {
            Ok(()) => Ok(namespace),
            Err(err) => {
                self.release(namespace);
                Err(err)
            }
        }
    }

    /// Execute a module body in `namespace`
    pub fn exec_source(&mut self, source: &str, filename: &str, namespace: ObjRef) -> RtResult<()> {
        let module = parse(source, Mode::Module, filename).map_err(syntax_error)?;
        let ast::Mod::Module(module) = module else {
            return Err(syntax_error("expected a module"));
        };
        let scope = ScopeDecls::default();
        let frame = Frame {
            globals: namespace,
            locals: None,
            closure: &[],
            scope: &scope,
        };
        match self.exec_block(&frame, &module.body)? {
            Flow::Normal => Ok(()),
            Flow::Return(value) => {
                self.release(value);
                Err(syntax_error("'return' outside function"))
            }
            Flow::Break | Flow::Continue => Err(syntax_error("'break' or 'continue' outside loop")),
        }
    }

    /// Evaluate a single expression in `namespace`
    pub fn eval_source(&mut self, source: &str, filename: &str, namespace: ObjRef) -> RtResult<ObjRef> {
        let parsed = parse(source.trim(), Mode::Expression, filename).map_err(syntax_error)?;
        let ast::Mod::Expression(expression) = parsed else {
            return Err(syntax_error("expected an expression"));
        };
        let scope = ScopeDecls::default();
        let frame = Frame {
            globals: namespace,
            locals: None,
            closure: &[],
            scope: &scope,
        };
        self.eval_expr(&frame, &expression.body)
    }

    /// Call any callable object
    pub fn call(
        &mut self,
        callable: ObjRef,
        args: &[ObjRef],
        kwargs: &[(String, ObjRef)],
    ) -> RtResult<ObjRef> {
        self.calls += 1;
        match self.get(callable)? {
            Object::Builtin(builtin) => {
                let builtin = *builtin;
                self.call_builtin(builtin, args, kwargs)
            }
            Object::Method(method) => {
                let (receiver, name) = (method.receiver, method.name.clone());
                self.call_method(receiver, &name, args, kwargs)
            }
            Object::Function(func) => {
                let func = func.clone();
                // Keep the function (and its captures) alive for the call
                self.heap.incref(callable)?;
                let result = self.call_function(&func, args, kwargs);
                self.release(callable);
                result
            }
            other => Err(RuntimeError::type_error(format!(
                "'{}' object is not callable",
                other.object_type().name()
            ))),
        }
    }

    fn call_function(
        &mut self,
        func: &Function,
        args: &[ObjRef],
        kwargs: &[(String, ObjRef)],
    ) -> RtResult<ObjRef> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::new(
                ExcKind::RecursionError,
                "maximum recursion depth exceeded",
            ));
        }
        log_call(&func.name, args.len());

        let locals = self.new_dict();
        if let Err(err) = self.bind_arguments(func, locals, args, kwargs) {
            self.release(locals);
            return Err(err);
        }

        self.depth += 1;
        let frame = Frame {
            globals: func.globals,
            locals: Some(locals),
            closure: &func.closure,
            scope: &func.scope,
        };
        let result = match &func.body {
            Body::Expr(body) => self.eval_expr(&frame, body),
            Body::Block(body) => match self.exec_block(&frame, body) {
                Ok(Flow::Return(value)) => Ok(value),
                Ok(Flow::Normal) => Ok(self.new_none()),
                Ok(Flow::Break | Flow::Continue) => {
                    Err(syntax_error("'break' or 'continue' outside loop"))
                }
                Err(err) => Err(err),
            },
        };
        self.depth -= 1;
        self.release(locals);
        result
    }

    fn bind_arguments(
        &mut self,
        func: &Function,
        locals: ObjRef,
        args: &[ObjRef],
        kwargs: &[(String, ObjRef)],
    ) -> RtResult<()> {
        let positional: Vec<&str> = func
            .params
            .iter()
            .filter(|p| !p.kw_only)
            .map(|p| p.name.as_str())
            .collect();

        if args.len() > positional.len() && func.vararg.is_none() {
            return Err(RuntimeError::type_error(format!(
                "{}() takes {} positional argument{} but {} {} given",
                func.name,
                positional.len(),
                if positional.len() == 1 { "" } else { "s" },
                args.len(),
                if args.len() == 1 { "was" } else { "were" }
            )));
        }
        for (name, value) in positional.iter().zip(args) {
            self.dict_set_str(locals, name, *value)?;
        }
        if let Some(vararg) = &func.vararg {
            let extra: Vec<ObjRef> = args.iter().skip(positional.len()).copied().collect();
            let tuple = self.adopt(Object::Tuple(extra))?;
            let outcome = self.dict_set_str(locals, vararg, tuple);
            self.release(tuple);
            outcome?;
        }

        let extra_kwargs = match &func.kwarg {
            Some(_) => Some(self.new_dict()),
            None => None,
        };
        let mut outcome = Ok(());
        for (name, value) in kwargs {
            if outcome.is_err() {
                break;
            }
            let known = func.params.iter().any(|p| &p.name == name);
            outcome = if known {
                if self.dict_lookup_str(locals, name)?.is_some() {
                    Err(RuntimeError::type_error(format!(
                        "{}() got multiple values for argument '{}'",
                        func.name, name
                    )))
                } else {
                    self.dict_set_str(locals, name, *value)
                }
            } else if let Some(extra) = extra_kwargs {
                self.dict_set_str(extra, name, *value)
            } else {
                Err(RuntimeError::type_error(format!(
                    "{}() got an unexpected keyword argument '{}'",
                    func.name, name
                )))
            };
        }
        if let (Some(kwarg), Some(extra)) = (&func.kwarg, extra_kwargs) {
            if outcome.is_ok() {
                outcome = self.dict_set_str(locals, kwarg, extra);
            }
            self.release(extra);
        }
        outcome?;

        let mut missing = Vec::new();
        for param in &func.params {
            if self.dict_lookup_str(locals, &param.name)?.is_some() {
                continue;
            }
            match param.default {
                Some(default) => self.dict_set_str(locals, &param.name, default)?,
                None => missing.push(format!("'{}'", param.name)),
            }
        }
        if !missing.is_empty() {
            return Err(RuntimeError::type_error(format!(
                "{}() missing {} required argument{}: {}",
                func.name,
                missing.len(),
                if missing.len() == 1 { "" } else { "s" },
                missing.join(", ")
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Names
    // ------------------------------------------------------------------

    fn is_global_name(frame: &Frame<'_>, name: &str) -> bool {
        frame.scope.globals.iter().any(|g| g == name)
    }

    /// New reference to the value bound to `name`
    fn load_name(&mut self, frame: &Frame<'_>, name: &str) -> RtResult<ObjRef> {
        if let Some(locals) = frame.locals {
            if !Self::is_global_name(frame, name) {
                if let Some(value) = self.dict_lookup_str(locals, name)? {
                    return self.incref(value);
                }
            }
        }
        for scope in frame.closure {
            if let Some(value) = self.dict_lookup_str(*scope, name)? {
                return self.incref(value);
            }
        }
        if let Some(value) = self.dict_lookup_str(frame.globals, name)? {
            return self.incref(value);
        }
        if let Some(value) = self.dict_lookup_str(self.builtins(), name)? {
            return self.incref(value);
        }
        Err(RuntimeError::new(
            ExcKind::NameError,
            format!("name '{}' is not defined", name),
        ))
    }

    /// Namespace dict an assignment to `name` writes into
    fn store_scope(&self, frame: &Frame<'_>, name: &str) -> RtResult<ObjRef> {
        if frame.scope.nonlocals.iter().any(|n| n == name) {
            for scope in frame.closure {
                if self.dict_lookup_str(*scope, name)?.is_some() {
                    return Ok(*scope);
                }
            }
            return Err(syntax_error(format!(
                "no binding for nonlocal '{}' found",
                name
            )));
        }
        match frame.locals {
            Some(locals) if !Self::is_global_name(frame, name) => Ok(locals),
            _ => Ok(frame.globals),
        }
    }

    fn store_name(&mut self, frame: &Frame<'_>, name: &str, value: ObjRef) -> RtResult<()> {
        let scope = self.store_scope(frame, name)?;
        self.dict_set_str(scope, name, value)
    }

    fn delete_name(&mut self, frame: &Frame<'_>, name: &str) -> RtResult<()> {
        let scope = self.store_scope(frame, name)?;
        let key = self.new_str(name);
        let removed = self.table_remove(scope, key);
        self.release(key);
        match removed? {
            Some(value) => {
                self.release(value);
                Ok(())
            }
            None => Err(RuntimeError::new(
                ExcKind::NameError,
                format!("name '{}' is not defined", name),
            )),
        }
    }

    /// Build a function object from parsed parameters and a body
    fn make_function(
        &mut self,
        frame: &Frame<'_>,
        name: &str,
        args: &ast::Arguments,
        body: Body,
        scope: ScopeDecls,
    ) -> RtResult<ObjRef> {
        let mut params = Vec::new();
        let mut defaults = Vec::new();
        let positional = args.posonlyargs.iter().chain(&args.args).map(|a| (a, false));
        let keyword = args.kwonlyargs.iter().map(|a| (a, true));
        for (arg, kw_only) in positional.chain(keyword) {
            let default = match &arg.default {
                Some(expr) => match self.eval_expr(frame, expr) {
                    Ok(value) => {
                        defaults.push(value);
                        Some(value)
                    }
                    Err(err) => {
                        self.release_all(defaults);
                        return Err(err);
                    }
                },
                None => None,
            };
            params.push(crate::object::Param {
                name: arg.def.arg.as_str().to_string(),
                default,
                kw_only,
            });
        }

        let mut closure = Vec::with_capacity(frame.closure.len() + 1);
        closure.extend(frame.locals);
        closure.extend_from_slice(frame.closure);
        for scope in &closure {
            self.heap.incref(*scope)?;
        }
        self.heap.incref(frame.globals)?;

        // Defaults are already owned; closure and globals were counted above
        Ok(self.alloc(Object::Function(Function {
            name: name.to_string(),
            params,
            vararg: args.vararg.as_ref().map(|a| a.arg.as_str().to_string()),
            kwarg: args.kwarg.as_ref().map(|a| a.arg.as_str().to_string()),
            body,
            globals: frame.globals,
            closure,
            scope: Arc::new(scope),
        })))
    }
}
