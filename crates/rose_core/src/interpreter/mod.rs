//! Tree-walking evaluator for Rose programs.
//!
//! # Overview
//!
//! [`Interpreter`] owns the global scope and an interpreter [`Context`]
//! (state shared with native built-ins).  [`Interpreter::evaluate`] runs a
//! parsed [`Program`] in the global scope and returns the value of the last
//! statement; globals survive between calls, so a REPL can feed one chunk at
//! a time.
//!
//! # Control flow
//!
//! Statements produce a completion: a normal value, or an abrupt
//! `return` / `break` / `continue` that unwinds to the enclosing function or
//! loop.  Runtime errors and `throw` travel on the `Err` side of the internal
//! result type so `?` propagates them through expression evaluation until a
//! `try` statement (or the top level) handles them.
//!
//! # Scopes
//!
//! Each block, `for` loop, `switch` and call gets a fresh child
//! [`Scope`](env::Scope).  Function declarations are bound at the start of
//! the block that contains them; `var` names are bound to `undefined` at the
//! start of the enclosing function (or program) body.

pub mod env;
pub mod math;

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use rug::rand::RandState;
use rug::{Float, Integer};

use crate::error::{Diagnostic, RoseError, RoseResult};
use crate::number;
use crate::objects::function::Function;
use crate::objects::object::Object;
use crate::objects::value::{ArrayRef, ObjectRef, Value};
use crate::parser::ast::{
    AssignExpr, AssignOp, BinaryOp, BlockStmt, CallExpr, ExportDecl, Expr, ForInit, ForStmt,
    FunctionNode, Program, SourceLocation, Stmt, SwitchStmt, TryStmt, UnaryExpr, UnaryOp,
    UpdateOp, VarDecl, VarKind,
};
use crate::stack::ensure_sufficient_stack;
use env::{Env, Scope, ScopeError};

/// Nested calls allowed before evaluation fails with a stack overflow error.
const MAX_CALL_DEPTH: usize = 1024;

/// Largest index an assignment may grow an array to.
const MAX_ARRAY_LENGTH: usize = 1 << 24;

// ─────────────────────────────────────────────────────────────────────────────
// Context
// ─────────────────────────────────────────────────────────────────────────────

/// Interpreter state visible to native built-ins.
#[derive(Default)]
pub struct Context {
    rng: Option<RandState<'static>>,
}

impl Context {
    /// Returns a uniformly distributed number in `[0, 1)`.
    ///
    /// The generator is seeded from the system clock on first use.
    pub fn random(&mut self) -> Float {
        let rng = self.rng.get_or_insert_with(|| {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_nanos());
            let mut rng = RandState::new();
            rng.seed(&Integer::from(nanos));
            tracing::trace!("seeded random number generator");
            rng
        });
        number::from(Float::random_bits(rng))
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("rng_seeded", &self.rng.is_some())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal control flow
// ─────────────────────────────────────────────────────────────────────────────

/// Why evaluation left the normal path.
#[derive(Debug)]
enum Interrupt {
    /// A runtime error.
    Error(RoseError),
    /// A value raised by `throw`, with the location of the statement.
    Throw(Value, SourceLocation),
}

impl From<RoseError> for Interrupt {
    fn from(err: RoseError) -> Self {
        Self::Error(err)
    }
}

impl Interrupt {
    /// The value a `catch` clause binds.
    fn into_value(self) -> Value {
        match self {
            Self::Error(err) => Value::string(err.message()),
            Self::Throw(value, _) => value,
        }
    }

    fn into_error(self) -> RoseError {
        match self {
            Self::Error(err) => err,
            Self::Throw(value, loc) => RoseError::Runtime(Diagnostic::new(
                loc,
                format!("Uncaught exception: {}", value.to_display_string()),
            )),
        }
    }
}

type Eval<T> = Result<T, Interrupt>;

/// The outcome of executing a statement.
#[derive(Debug)]
enum Completion {
    Normal(Value),
    Return(Value),
    Break(Option<String>),
    Continue(Option<String>),
}

/// What a loop does after running its body once.
enum LoopStep {
    Next(Value),
    Exit,
    Propagate(Completion),
}

fn loop_step(completion: Completion, labels: &[String]) -> LoopStep {
    match completion {
        Completion::Normal(value) => LoopStep::Next(value),
        Completion::Continue(None) => LoopStep::Next(Value::Undefined),
        Completion::Continue(Some(l)) if labels.contains(&l) => LoopStep::Next(Value::Undefined),
        Completion::Break(None) => LoopStep::Exit,
        Completion::Break(Some(l)) if labels.contains(&l) => LoopStep::Exit,
        other => LoopStep::Propagate(other),
    }
}

fn runtime(loc: &SourceLocation, message: impl Into<String>) -> Interrupt {
    Interrupt::Error(RoseError::Runtime(Diagnostic::new(loc.clone(), message)))
}

/// An assignable location.
enum Place {
    Variable(String),
    Property(ObjectRef, Rc<str>),
    Element(ArrayRef, usize),
}

// ─────────────────────────────────────────────────────────────────────────────
// Interpreter
// ─────────────────────────────────────────────────────────────────────────────

/// Evaluates programs against a persistent global scope.
#[derive(Debug)]
pub struct Interpreter {
    ctx: Context,
    globals: Env,
    exports: Object,
    depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        // Top-level closures reference the global scope that stores them.
        self.globals.clear();
    }
}

impl Interpreter {
    /// Creates an interpreter whose global scope contains `Math`.
    pub fn new() -> Self {
        let globals = Scope::global();
        math::install(&globals);
        Self {
            ctx: Context::default(),
            globals,
            exports: Object::new(),
            depth: 0,
        }
    }

    /// The global scope.
    pub fn globals(&self) -> &Env {
        &self.globals
    }

    /// Names recorded by `export` statements, in export order.
    pub fn exports(&self) -> &Object {
        &self.exports
    }

    /// Runs `program` in the global scope and returns the value of its last
    /// statement.
    ///
    /// # Errors
    ///
    /// Returns [`RoseError::Runtime`] for any runtime failure, including an
    /// uncaught `throw`.  Bindings made before the failure are kept.
    pub fn evaluate(&mut self, program: &Program) -> RoseResult<Value> {
        tracing::debug!(statements = program.body.len(), "evaluating program");
        let globals = Rc::clone(&self.globals);
        self.depth = 0;
        self.hoist_vars(&program.body, &globals);
        let completion = self
            .exec_statements(&program.body, &globals)
            .map_err(Interrupt::into_error)?;
        Ok(match completion {
            Completion::Normal(value) | Completion::Return(value) => value,
            Completion::Break(_) | Completion::Continue(_) => Value::Undefined,
        })
    }

    // ── Hoisting ─────────────────────────────────────────────────────────────

    /// Binds every `var` name declared in `stmts` (outside nested functions)
    /// to `undefined` in `scope`, keeping existing bindings.
    fn hoist_vars(&self, stmts: &[Stmt], scope: &Env) {
        let mut names = Vec::new();
        for stmt in stmts {
            collect_var_names(stmt, &mut names);
        }
        for name in names {
            if !scope.has_own(&name) {
                scope.set(&name, Value::Undefined);
            }
        }
    }

    /// Binds the function declarations directly inside `stmts`, including
    /// labeled ones.
    fn hoist_functions(&self, stmts: &[Stmt], scope: &Env) {
        for stmt in stmts {
            let mut stmt = stmt;
            while let Stmt::Label(labeled) = stmt {
                stmt = labeled.body.as_ref();
            }
            let node = match stmt {
                Stmt::Function(node) => node,
                Stmt::Export(ExportDecl::Declaration { body, .. } | ExportDecl::Default { body, .. }) => {
                    match body.as_ref() {
                        Stmt::Function(node) => node,
                        _ => continue,
                    }
                }
                _ => continue,
            };
            if let Some(name) = &node.name {
                scope.set(&name.name, closure(node, scope));
            }
        }
    }

    // ── Statements ───────────────────────────────────────────────────────────

    fn exec_statements(&mut self, stmts: &[Stmt], env: &Env) -> Eval<Completion> {
        self.hoist_functions(stmts, env);
        let mut last = Value::Undefined;
        for stmt in stmts {
            match self.exec_stmt(stmt, env)? {
                Completion::Normal(value) => last = value,
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Completion::Normal(last))
    }

    fn exec_block(&mut self, block: &BlockStmt, env: &Env) -> Eval<Completion> {
        let scope = Scope::child(env);
        tracing::trace!(statements = block.body.len(), "enter block scope");
        self.exec_statements(&block.body, &scope)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Env) -> Eval<Completion> {
        ensure_sufficient_stack(|| self.exec_stmt_inner(stmt, env))
    }

    fn exec_stmt_inner(&mut self, stmt: &Stmt, env: &Env) -> Eval<Completion> {
        match stmt {
            Stmt::Empty(_) | Stmt::Function(_) => Ok(Completion::Normal(Value::Undefined)),
            Stmt::Block(block) => self.exec_block(block, env),
            Stmt::Expr(s) => Ok(Completion::Normal(self.eval(&s.expr, env)?)),
            Stmt::Declaration(decl) => {
                self.exec_declaration(decl, env)?;
                Ok(Completion::Normal(Value::Undefined))
            }
            Stmt::If(s) => {
                if self.eval(&s.test, env)?.is_truthy() {
                    self.exec_block(&s.consequent, env)
                } else if let Some(alternate) = &s.alternate {
                    self.exec_stmt(alternate, env)
                } else {
                    Ok(Completion::Normal(Value::Undefined))
                }
            }
            Stmt::While(_) | Stmt::DoWhile(_) | Stmt::For(_) => self.exec_loop(stmt, env, &[]),
            Stmt::Switch(s) => self.exec_switch(s, env),
            Stmt::Label(s) => {
                let mut labels = vec![s.label.name.clone()];
                let mut body = s.body.as_ref();
                while let Stmt::Label(inner) = body {
                    labels.push(inner.label.name.clone());
                    body = inner.body.as_ref();
                }
                if body.is_loop() {
                    return self.exec_loop(body, env, &labels);
                }
                match self.exec_stmt(body, env)? {
                    Completion::Break(Some(l)) if labels.contains(&l) => {
                        Ok(Completion::Normal(Value::Undefined))
                    }
                    other => Ok(other),
                }
            }
            Stmt::Break(s) => Ok(Completion::Break(s.label.as_ref().map(|l| l.name.clone()))),
            Stmt::Continue(s) => Ok(Completion::Continue(
                s.label.as_ref().map(|l| l.name.clone()),
            )),
            Stmt::Return(s) => {
                let value = match &s.argument {
                    Some(arg) => self.eval(arg, env)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Stmt::Throw(s) => {
                let value = self.eval(&s.argument, env)?;
                Err(Interrupt::Throw(value, s.loc.clone()))
            }
            Stmt::Try(s) => self.exec_try(s, env),
            Stmt::Import(s) => Err(runtime(
                &s.loc,
                format!("Cannot import '{}': module loading is not supported", s.module),
            )),
            Stmt::Export(decl) => {
                self.exec_export(decl, env)?;
                Ok(Completion::Normal(Value::Undefined))
            }
            Stmt::Debugger(s) => {
                tracing::debug!(location = %s.loc, "debugger statement");
                Ok(Completion::Normal(Value::Undefined))
            }
        }
    }

    fn exec_declaration(&mut self, decl: &VarDecl, env: &Env) -> Eval<()> {
        for declarator in &decl.declarators {
            let name = &declarator.name.name;
            match decl.kind {
                VarKind::Var => {
                    let Some(init) = &declarator.init else {
                        if env.get(name).is_none() {
                            env.set(name, Value::Undefined);
                        }
                        continue;
                    };
                    let value = self.eval(init, env)?;
                    match env.assign(name, value.clone()) {
                        Ok(()) => {}
                        Err(ScopeError::NotFound(_)) => env.set(name, value),
                        Err(err) => return Err(runtime(&declarator.name.loc, err.to_string())),
                    }
                }
                VarKind::Let | VarKind::Const => {
                    let value = match &declarator.init {
                        Some(init) => self.eval(init, env)?,
                        None => Value::Undefined,
                    };
                    env.declare(name, value, decl.kind == VarKind::Const);
                }
            }
        }
        Ok(())
    }

    fn exec_loop(&mut self, stmt: &Stmt, env: &Env, labels: &[String]) -> Eval<Completion> {
        let mut last = Value::Undefined;
        match stmt {
            Stmt::While(s) => {
                while self.eval(&s.test, env)?.is_truthy() {
                    match loop_step(self.exec_block(&s.body, env)?, labels) {
                        LoopStep::Next(value) => last = value,
                        LoopStep::Exit => break,
                        LoopStep::Propagate(c) => return Ok(c),
                    }
                }
            }
            Stmt::DoWhile(s) => loop {
                match loop_step(self.exec_block(&s.body, env)?, labels) {
                    LoopStep::Next(value) => last = value,
                    LoopStep::Exit => break,
                    LoopStep::Propagate(c) => return Ok(c),
                }
                if !self.eval(&s.test, env)?.is_truthy() {
                    break;
                }
            },
            Stmt::For(s) => return self.exec_for(s, env, labels),
            _ => return self.exec_stmt(stmt, env),
        }
        Ok(Completion::Normal(last))
    }

    fn exec_for(&mut self, s: &ForStmt, env: &Env, labels: &[String]) -> Eval<Completion> {
        let scope = Scope::child(env);
        match &s.init {
            Some(ForInit::Declaration(decl)) => self.exec_declaration(decl, &scope)?,
            Some(ForInit::Expr(expr)) => {
                self.eval(expr, &scope)?;
            }
            None => {}
        }
        let mut last = Value::Undefined;
        loop {
            if let Some(test) = &s.test
                && !self.eval(test, &scope)?.is_truthy()
            {
                break;
            }
            match loop_step(self.exec_block(&s.body, &scope)?, labels) {
                LoopStep::Next(value) => last = value,
                LoopStep::Exit => break,
                LoopStep::Propagate(c) => return Ok(c),
            }
            if let Some(update) = &s.update {
                self.eval(update, &scope)?;
            }
        }
        Ok(Completion::Normal(last))
    }

    fn exec_switch(&mut self, s: &SwitchStmt, env: &Env) -> Eval<Completion> {
        let discriminant = self.eval(&s.discriminant, env)?;
        let scope = Scope::child(env);
        for case in &s.cases {
            self.hoist_functions(&case.body.body, &scope);
        }

        let mut start = None;
        'cases: for (i, case) in s.cases.iter().enumerate() {
            for test in &case.tests {
                if self.eval(test, &scope)?.strict_equals(&discriminant) {
                    start = Some(i);
                    break 'cases;
                }
            }
        }
        let Some(start) = start.or_else(|| s.cases.iter().position(|c| c.is_default)) else {
            return Ok(Completion::Normal(Value::Undefined));
        };

        let mut last = Value::Undefined;
        for case in &s.cases[start..] {
            for stmt in &case.body.body {
                match self.exec_stmt(stmt, &scope)? {
                    Completion::Normal(value) => last = value,
                    Completion::Break(None) => return Ok(Completion::Normal(last)),
                    abrupt => return Ok(abrupt),
                }
            }
        }
        Ok(Completion::Normal(last))
    }

    fn exec_try(&mut self, s: &TryStmt, env: &Env) -> Eval<Completion> {
        let result = match (self.exec_block(&s.block, env), &s.handler) {
            (Err(interrupt), Some(handler)) => {
                let scope = Scope::child(env);
                let value = interrupt.into_value();
                tracing::trace!(exception = %value, "caught exception");
                if let Some(param) = &handler.param {
                    scope.set(&param.name, value);
                }
                self.exec_block(&handler.body, &scope)
            }
            (result, _) => result,
        };
        if let Some(finalizer) = &s.finalizer {
            match self.exec_block(finalizer, env)? {
                Completion::Normal(_) => {}
                abrupt => return Ok(abrupt),
            }
        }
        result
    }

    fn exec_export(&mut self, decl: &ExportDecl, env: &Env) -> Eval<()> {
        match decl {
            ExportDecl::Default { body, .. } => {
                let value = match body.as_ref() {
                    Stmt::Expr(s) => self.eval(&s.expr, env)?,
                    Stmt::Function(node) => match &node.name {
                        Some(name) => env.get(&name.name).unwrap_or(Value::Undefined),
                        None => closure(node, env),
                    },
                    other => match self.exec_stmt(other, env)? {
                        Completion::Normal(value) => value,
                        _ => Value::Undefined,
                    },
                };
                self.exports.set("default", value);
            }
            ExportDecl::Declaration { body, .. } => {
                self.exec_stmt(body, env)?;
                let names: Vec<&str> = match body.as_ref() {
                    Stmt::Declaration(d) => {
                        d.declarators.iter().map(|d| d.name.name.as_str()).collect()
                    }
                    Stmt::Function(node) => node.name.iter().map(|n| n.name.as_str()).collect(),
                    _ => Vec::new(),
                };
                for name in names {
                    let value = env.get(name).unwrap_or(Value::Undefined);
                    self.exports.set(name, value);
                }
            }
            ExportDecl::Named { names, .. } => {
                for name in names {
                    let value = env.get(&name.name).ok_or_else(|| {
                        runtime(&name.loc, format!("Identifier '{}' not found", name.name))
                    })?;
                    self.exports.set(name.name.as_str(), value);
                }
            }
        }
        Ok(())
    }

    // ── Expressions ──────────────────────────────────────────────────────────

    fn eval(&mut self, expr: &Expr, env: &Env) -> Eval<Value> {
        ensure_sufficient_stack(|| self.eval_expr(expr, env))
    }

    fn eval_expr(&mut self, expr: &Expr, env: &Env) -> Eval<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(n.value.clone())),
            Expr::String(s) => Ok(Value::string(s.value.as_str())),
            Expr::Bool(b) => Ok(Value::Bool(b.value)),
            Expr::Null(_) => Ok(Value::Null),
            Expr::Undefined(_) => Ok(Value::Undefined),
            Expr::Identifier(id) => env
                .get(&id.name)
                .ok_or_else(|| runtime(&id.loc, format!("Identifier '{}' not found", id.name))),
            Expr::This(_) => Ok(env.get("this").unwrap_or(Value::Undefined)),
            Expr::Array(a) => {
                let elements = self.eval_list(&a.elements, env)?;
                Ok(Value::array(elements))
            }
            Expr::Object(o) => {
                let mut object = Object::new();
                for prop in &o.properties {
                    let value = self.eval(&prop.value, env)?;
                    match &prop.key {
                        Some(key) => object.set(key.as_str(), value),
                        None => spread_into_object(&mut object, &value, prop.value.loc())?,
                    }
                }
                Ok(Value::object(object))
            }
            Expr::Spread(s) => Err(runtime(&s.loc, "Spread syntax is not allowed here")),
            Expr::Function(node) => Ok(closure(node, env)),
            Expr::Binary(b) => match b.op {
                BinaryOp::LogicalAnd => {
                    let left = self.eval(&b.left, env)?;
                    if left.is_truthy() {
                        self.eval(&b.right, env)
                    } else {
                        Ok(left)
                    }
                }
                BinaryOp::LogicalOr => {
                    let left = self.eval(&b.left, env)?;
                    if left.is_truthy() {
                        Ok(left)
                    } else {
                        self.eval(&b.right, env)
                    }
                }
                BinaryOp::Comma => {
                    self.eval(&b.left, env)?;
                    self.eval(&b.right, env)
                }
                op => {
                    let left = self.eval(&b.left, env)?;
                    let right = self.eval(&b.right, env)?;
                    binary(op, &left, &right).map_err(|msg| runtime(&b.loc, msg))
                }
            },
            Expr::Unary(u) => self.eval_unary(u, env),
            Expr::Assignment(a) => self.eval_assignment(a, env),
            Expr::Ternary(t) => {
                if self.eval(&t.test, env)?.is_truthy() {
                    self.eval(&t.consequent, env)
                } else {
                    self.eval(&t.alternate, env)
                }
            }
            Expr::Call(call) => self.eval_call(call, env),
            Expr::New(call) => self.eval_new(call, env),
            Expr::Index(i) => {
                let object = self.eval(&i.object, env)?;
                let index = self.eval(&i.index, env)?;
                get_index(&object, &index).map_err(|msg| runtime(&i.loc, msg))
            }
            Expr::Member(m) => {
                let object = self.eval(&m.object, env)?;
                get_member(&object, &m.property.name).map_err(|msg| runtime(&m.loc, msg))
            }
            Expr::Postfix(p) => {
                let place = self.place(&p.argument, env)?;
                let old = self.read(&place, env, &p.loc)?;
                let Value::Number(n) = &old else {
                    let message = format!("Unsupported '{}' for {}", p.op.as_str(), old.type_name());
                    return Err(runtime(&p.loc, message));
                };
                let new = match p.op {
                    UpdateOp::Increment => number::from(n + 1u32),
                    UpdateOp::Decrement => number::from(n - 1u32),
                };
                self.write(place, Value::Number(new), env, &p.loc)?;
                Ok(old)
            }
            Expr::Await(a) => self.eval(&a.argument, env),
        }
    }

    /// Evaluates a list of expressions, expanding `...spread` entries.
    fn eval_list(&mut self, exprs: &[Expr], env: &Env) -> Eval<Vec<Value>> {
        let mut values = Vec::with_capacity(exprs.len());
        for expr in exprs {
            match expr {
                Expr::Spread(s) => {
                    let value = self.eval(&s.argument, env)?;
                    match value {
                        Value::Array(items) => values.extend(items.borrow().iter().cloned()),
                        Value::String(text) => {
                            values.extend(text.chars().map(|c| Value::string(c.to_string())));
                        }
                        other => {
                            let message = format!("Cannot spread a value of type {}", other.type_name());
                            return Err(runtime(&s.loc, message));
                        }
                    }
                }
                other => values.push(self.eval(other, env)?),
            }
        }
        Ok(values)
    }

    fn eval_unary(&mut self, u: &UnaryExpr, env: &Env) -> Eval<Value> {
        match u.op {
            UnaryOp::Typeof => {
                if let Expr::Identifier(id) = u.argument.as_ref() {
                    let value = env.get(&id.name).unwrap_or(Value::Undefined);
                    return Ok(Value::string(value.type_of()));
                }
                let value = self.eval(&u.argument, env)?;
                Ok(Value::string(value.type_of()))
            }
            UnaryOp::Void => {
                self.eval(&u.argument, env)?;
                Ok(Value::Undefined)
            }
            UnaryOp::Delete => match u.argument.as_ref() {
                Expr::Member(_) | Expr::Index(_) => {
                    match self.place(&u.argument, env)? {
                        Place::Property(object, key) => {
                            object.borrow_mut().remove(&key);
                        }
                        Place::Element(array, index) => {
                            if let Some(slot) = array.borrow_mut().get_mut(index) {
                                *slot = Value::Undefined;
                            }
                        }
                        Place::Variable(_) => return Ok(Value::Bool(false)),
                    }
                    Ok(Value::Bool(true))
                }
                Expr::Identifier(_) => Ok(Value::Bool(false)),
                other => {
                    self.eval(other, env)?;
                    Ok(Value::Bool(true))
                }
            },
            UnaryOp::Increment | UnaryOp::Decrement => {
                let place = self.place(&u.argument, env)?;
                let old = self.read(&place, env, &u.loc)?;
                let Value::Number(n) = &old else {
                    let message = format!("Unsupported '{}' for {}", u.op.as_str(), old.type_name());
                    return Err(runtime(&u.loc, message));
                };
                let new = Value::Number(if u.op == UnaryOp::Increment {
                    number::from(n + 1u32)
                } else {
                    number::from(n - 1u32)
                });
                self.write(place, new.clone(), env, &u.loc)?;
                Ok(new)
            }
            op => {
                let value = self.eval(&u.argument, env)?;
                unary(op, &value).map_err(|msg| runtime(&u.loc, msg))
            }
        }
    }

    fn eval_assignment(&mut self, a: &AssignExpr, env: &Env) -> Eval<Value> {
        let place = self.place(&a.target, env)?;
        let value = match a.op {
            AssignOp::Assign => self.eval(&a.value, env)?,
            AssignOp::LogicalAnd | AssignOp::LogicalOr => {
                let current = self.read(&place, env, &a.loc)?;
                if current.is_truthy() == (a.op == AssignOp::LogicalOr) {
                    return Ok(current);
                }
                self.eval(&a.value, env)?
            }
            op => {
                let current = self.read(&place, env, &a.loc)?;
                let rhs = self.eval(&a.value, env)?;
                let Some(bin) = op.binary_op() else {
                    return Err(runtime(&a.loc, "Invalid assignment operator"));
                };
                binary(bin, &current, &rhs).map_err(|msg| runtime(&a.loc, msg))?
            }
        };
        self.write(place, value.clone(), env, &a.loc)?;
        Ok(value)
    }

    // ── Places ───────────────────────────────────────────────────────────────

    fn place(&mut self, target: &Expr, env: &Env) -> Eval<Place> {
        match target {
            Expr::Identifier(id) => Ok(Place::Variable(id.name.clone())),
            Expr::Member(m) => match self.eval(&m.object, env)? {
                Value::Object(object) => Ok(Place::Property(object, m.property.name.as_str().into())),
                _ => Err(runtime(&m.loc, "Trying to access member of a non-object")),
            },
            Expr::Index(i) => {
                let object = self.eval(&i.object, env)?;
                let index = self.eval(&i.index, env)?;
                match (object, index) {
                    (Value::Array(array), Value::Number(n)) => match number::to_index(&n) {
                        Some(idx) if idx < MAX_ARRAY_LENGTH => Ok(Place::Element(array, idx)),
                        _ => Err(runtime(&i.loc, format!("Invalid array index {}", number::format(&n)))),
                    },
                    (Value::Object(object), key) => Ok(Place::Property(object, property_key(&key).into())),
                    (object, _) => Err(runtime(
                        &i.loc,
                        format!("Cannot assign to an index of {}", object.type_name()),
                    )),
                }
            }
            other => Err(runtime(other.loc(), "Invalid assignment target")),
        }
    }

    fn read(&self, place: &Place, env: &Env, loc: &SourceLocation) -> Eval<Value> {
        match place {
            Place::Variable(name) => env
                .get(name)
                .ok_or_else(|| runtime(loc, format!("Identifier '{name}' not found"))),
            Place::Property(object, key) => object
                .borrow()
                .get(key)
                .cloned()
                .ok_or_else(|| runtime(loc, format!("Object has no member '{key}'"))),
            Place::Element(array, index) => {
                Ok(array.borrow().get(*index).cloned().unwrap_or(Value::Undefined))
            }
        }
    }

    fn write(&self, place: Place, value: Value, env: &Env, loc: &SourceLocation) -> Eval<()> {
        match place {
            Place::Variable(name) => env
                .assign(&name, value)
                .map_err(|err| runtime(loc, err.to_string())),
            Place::Property(object, key) => {
                object.borrow_mut().set(key, value);
                Ok(())
            }
            Place::Element(array, index) => {
                let mut items = array.borrow_mut();
                if index >= items.len() {
                    items.resize(index + 1, Value::Undefined);
                }
                items[index] = value;
                Ok(())
            }
        }
    }

    // ── Calls ────────────────────────────────────────────────────────────────

    fn eval_call(&mut self, call: &CallExpr, env: &Env) -> Eval<Value> {
        let (callee, this) = match call.callee.as_ref() {
            Expr::Member(m) => {
                let object = self.eval(&m.object, env)?;
                let method = get_member(&object, &m.property.name).map_err(|msg| runtime(&m.loc, msg))?;
                (method, object)
            }
            Expr::Index(i) => {
                let object = self.eval(&i.object, env)?;
                let index = self.eval(&i.index, env)?;
                let method = get_index(&object, &index).map_err(|msg| runtime(&i.loc, msg))?;
                (method, object)
            }
            other => (self.eval(other, env)?, Value::Undefined),
        };
        let args = self.eval_list(&call.arguments, env)?;
        self.call_value(&callee, this, args, &call.loc)
    }

    fn eval_new(&mut self, call: &CallExpr, env: &Env) -> Eval<Value> {
        let callee = self.eval(&call.callee, env)?;
        let args = self.eval_list(&call.arguments, env)?;
        let this = Value::object(Object::new());
        match self.call_value(&callee, this.clone(), args, &call.loc)? {
            result @ (Value::Object(_) | Value::Array(_)) => Ok(result),
            _ => Ok(this),
        }
    }

    fn call_value(
        &mut self,
        callee: &Value,
        this: Value,
        args: Vec<Value>,
        loc: &SourceLocation,
    ) -> Eval<Value> {
        let Value::Function(function) = callee else {
            return Err(runtime(loc, "Trying to call a non-function"));
        };
        tracing::trace!(function = function.name(), args = args.len(), "call");
        match function.as_ref() {
            Function::Native { func, .. } => func(&mut self.ctx, &args).map_err(|err| match err {
                RoseError::Native(message) => runtime(loc, message),
                other => Interrupt::Error(other),
            }),
            Function::Closure { node, scope } => {
                if self.depth >= MAX_CALL_DEPTH {
                    return Err(runtime(loc, "Maximum call stack size exceeded"));
                }
                self.depth += 1;
                let result = self.call_closure(node, scope, callee, this, args);
                self.depth -= 1;
                result
            }
        }
    }

    fn call_closure(
        &mut self,
        node: &FunctionNode,
        captured: &Env,
        callee: &Value,
        this: Value,
        mut args: Vec<Value>,
    ) -> Eval<Value> {
        let scope = Scope::child(captured);
        if let Some(name) = &node.name {
            scope.set(&name.name, callee.clone());
        }
        scope.set("this", this);

        for (i, param) in node.params.iter().enumerate() {
            let value = if param.is_rest {
                let rest = if i < args.len() { args.split_off(i) } else { Vec::new() };
                Value::array(rest)
            } else {
                match args.get(i) {
                    Some(arg) if !arg.is_undefined() => arg.clone(),
                    _ => match &param.default {
                        Some(default) => self.eval(default, &scope)?,
                        None => Value::Undefined,
                    },
                }
            };
            scope.set(&param.name, value);
        }

        self.hoist_vars(&node.body.body, &scope);
        match self.exec_statements(&node.body.body, &scope)? {
            Completion::Return(value) => Ok(value),
            _ => Ok(Value::Undefined),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn closure(node: &Rc<FunctionNode>, scope: &Env) -> Value {
    Value::Function(Rc::new(Function::Closure {
        node: Rc::clone(node),
        scope: Rc::clone(scope),
    }))
}

fn collect_var_names(stmt: &Stmt, names: &mut Vec<String>) {
    fn visit_block(block: &BlockStmt, names: &mut Vec<String>) {
        for stmt in &block.body {
            collect_var_names(stmt, names);
        }
    }

    match stmt {
        Stmt::Declaration(decl) if decl.kind == VarKind::Var => {
            names.extend(decl.declarators.iter().map(|d| d.name.name.clone()));
        }
        Stmt::Block(block) => visit_block(block, names),
        Stmt::If(s) => {
            visit_block(&s.consequent, names);
            if let Some(alt) = &s.alternate {
                collect_var_names(alt, names);
            }
        }
        Stmt::While(s) => visit_block(&s.body, names),
        Stmt::DoWhile(s) => visit_block(&s.body, names),
        Stmt::For(s) => {
            if let Some(ForInit::Declaration(decl)) = &s.init
                && decl.kind == VarKind::Var
            {
                names.extend(decl.declarators.iter().map(|d| d.name.name.clone()));
            }
            visit_block(&s.body, names);
        }
        Stmt::Switch(s) => {
            for case in &s.cases {
                visit_block(&case.body, names);
            }
        }
        Stmt::Label(s) => collect_var_names(&s.body, names),
        Stmt::Try(s) => {
            visit_block(&s.block, names);
            if let Some(handler) = &s.handler {
                visit_block(&handler.body, names);
            }
            if let Some(finalizer) = &s.finalizer {
                visit_block(finalizer, names);
            }
        }
        Stmt::Export(ExportDecl::Declaration { body, .. } | ExportDecl::Default { body, .. }) => {
            collect_var_names(body, names);
        }
        _ => {}
    }
}

/// The key an index expression names on an object.
fn property_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.to_string(),
        other => other.to_display_string(),
    }
}

fn spread_into_object(object: &mut Object, value: &Value, loc: &SourceLocation) -> Eval<()> {
    match value {
        Value::Object(source) => {
            for (key, value) in source.borrow().iter() {
                object.set(Rc::clone(key), value.clone());
            }
        }
        Value::Array(items) => {
            for (i, item) in items.borrow().iter().enumerate() {
                object.set(i.to_string(), item.clone());
            }
        }
        Value::Null | Value::Undefined => {}
        other => {
            let message = format!("Cannot spread a value of type {}", other.type_name());
            return Err(runtime(loc, message));
        }
    }
    Ok(())
}

fn get_member(object: &Value, name: &str) -> Result<Value, String> {
    match object {
        Value::Object(obj) => obj
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| format!("Object has no member '{name}'")),
        Value::Array(items) if name == "length" => Ok(Value::number(items.borrow().len() as u64)),
        Value::String(s) if name == "length" => Ok(Value::number(s.chars().count() as u64)),
        _ => Err("Trying to access member of a non-object".to_owned()),
    }
}

fn get_index(object: &Value, index: &Value) -> Result<Value, String> {
    match (object, index) {
        (Value::Array(items), Value::Number(n)) => Ok(number::to_index(n)
            .and_then(|i| items.borrow().get(i).cloned())
            .unwrap_or(Value::Undefined)),
        (Value::String(s), Value::Number(n)) => Ok(number::to_index(n)
            .and_then(|i| s.chars().nth(i))
            .map_or(Value::Undefined, |c| Value::string(c.to_string()))),
        (Value::Object(_), key) => get_member(object, &property_key(key)),
        (Value::Array(_) | Value::String(_), Value::String(key)) => get_member(object, key),
        (Value::Array(_) | Value::String(_), other) => {
            Err(format!("Cannot index with a value of type {}", other.type_name()))
        }
        (other, _) => Err(format!("Cannot index a value of type {}", other.type_name())),
    }
}

fn type_error(op: &str, left: &Value, right: &Value) -> String {
    format!("Unsupported '{op}' for {}, {}", left.type_name(), right.type_name())
}

/// Applies a non-short-circuiting binary operator.
fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, String> {
    match op {
        BinaryOp::Eq => return Ok(Value::Bool(left.loose_equals(right))),
        BinaryOp::NotEq => return Ok(Value::Bool(!left.loose_equals(right))),
        BinaryOp::Add if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) => {
            let mut text = left.to_display_string();
            text.push_str(&right.to_display_string());
            return Ok(Value::string(text));
        }
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let ordering = match (left, right) {
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => return Err(type_error(op.as_str(), left, right)),
            };
            let result = ordering.is_some_and(|o| match op {
                BinaryOp::Lt => o == Ordering::Less,
                BinaryOp::LtEq => o != Ordering::Greater,
                BinaryOp::Gt => o == Ordering::Greater,
                _ => o != Ordering::Less,
            });
            return Ok(Value::Bool(result));
        }
        _ => {}
    }

    let (Value::Number(a), Value::Number(b)) = (left, right) else {
        return Err(type_error(op.as_str(), left, right));
    };
    let result = match op {
        BinaryOp::Add => number::from(a + b),
        BinaryOp::Sub => number::from(a - b),
        BinaryOp::Mul => number::from(a * b),
        BinaryOp::Div => {
            if b.is_zero() {
                return Err("Division by zero".to_owned());
            }
            number::from(a / b)
        }
        BinaryOp::Rem => {
            if b.is_zero() {
                return Err("Modulo by zero".to_owned());
            }
            number::fmod(a, b)
        }
        BinaryOp::Exp => number::pow(a, b),
        BinaryOp::BitAnd => number::from(number::to_int32(a) & number::to_int32(b)),
        BinaryOp::BitOr => number::from(number::to_int32(a) | number::to_int32(b)),
        BinaryOp::BitXor => number::from(number::to_int32(a) ^ number::to_int32(b)),
        BinaryOp::Shl => {
            number::from(number::to_int32(a).wrapping_shl(number::to_int32(b) as u32))
        }
        BinaryOp::Shr => {
            number::from(number::to_int32(a).wrapping_shr(number::to_int32(b) as u32))
        }
        _ => return Err(type_error(op.as_str(), left, right)),
    };
    Ok(Value::Number(result))
}

/// Applies a value-level prefix operator.
fn unary(op: UnaryOp, value: &Value) -> Result<Value, String> {
    if op == UnaryOp::Not {
        return Ok(Value::Bool(!value.is_truthy()));
    }
    let Value::Number(n) = value else {
        return Err(format!("Unsupported '{}' for {}", op.as_str(), value.type_name()));
    };
    let result = match op {
        UnaryOp::Plus => n.clone(),
        UnaryOp::Minus => number::from(-n),
        UnaryOp::BitNot => number::from(!number::to_int32(n)),
        _ => return Err(format!("Unsupported '{}' for {}", op.as_str(), value.type_name())),
    };
    Ok(Value::Number(result))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::parse_source;

    fn run(src: &str) -> RoseResult<Value> {
        let program = parse_source(src, "test.rose")?;
        Interpreter::new().evaluate(&program)
    }

    /// Evaluates `src` and renders the result in inspection form.
    fn show(src: &str) -> String {
        match run(src) {
            Ok(value) => value.to_string(),
            Err(err) => panic!("evaluation failed: {err}"),
        }
    }

    fn error(src: &str) -> String {
        match run(src) {
            Ok(value) => panic!("expected an error, got {value}"),
            Err(err) => err.to_string(),
        }
    }

    // ── Arithmetic ───────────────────────────────────────────────────────────

    #[test]
    fn test_arithmetic() {
        assert_eq!(show("1 + 2;"), "3");
        assert_eq!(show("10 % 3;"), "1");
        assert_eq!(show("2 ** 10;"), "1024");
        assert_eq!(show("-7 % 3;"), "-1");
        assert_eq!(show("1 / 4;"), "0.25");
        assert_eq!(show("2 ** 3 ** 2;"), "512");
        assert_eq!(show("(1 + 2) * 3 - 4 / 2;"), "7");
    }

    #[test]
    fn test_division_and_modulo_by_zero() {
        assert_eq!(error("5 / 0;"), "[ERROR] [test.rose:1:3]: Division by zero");
        assert_eq!(error("5 % 0;"), "[ERROR] [test.rose:1:3]: Modulo by zero");
    }

    #[test]
    fn test_precision_is_arbitrary() {
        assert_eq!(show("0.1 + 0.2;"), "0.3");
        assert_eq!(show("2 ** 100;"), "1267650600228229401496703205376");
    }

    #[test]
    fn test_type_mismatch() {
        assert_eq!(
            error("true - 1;"),
            "[ERROR] [test.rose:1:6]: Unsupported '-' for boolean, number"
        );
        assert_eq!(error("-null;"), "[ERROR] [test.rose:1:1]: Unsupported '-' for null");
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(show(r#""a" + 1;"#), r#""a1""#);
        assert_eq!(show(r#"[1, 2] + "!";"#), r#""1,2!""#);
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(show("6 & 3;"), "2");
        assert_eq!(show("6 | 3;"), "7");
        assert_eq!(show("6 ^ 3;"), "5");
        assert_eq!(show("~0;"), "-1");
        assert_eq!(show("1 << 4;"), "16");
        assert_eq!(show("-16 >> 2;"), "-4");
    }

    #[test]
    fn test_comparison_and_equality() {
        assert_eq!(show("1 < 2;"), "true");
        assert_eq!(show(r#""b" > "a";"#), "true");
        assert_eq!(show("NaN == NaN;"), "false");
        assert_eq!(show("null == undefined;"), "true");
        assert_eq!(show(r#"1 == "1";"#), "false");
        assert_eq!(show("let a = [1]; a == a;"), "true");
        assert_eq!(show("[1] == [1];"), "false");
    }

    #[test]
    fn test_logical_operators_short_circuit() {
        assert_eq!(show("0 || 5;"), "5");
        assert_eq!(show("0 && missing();"), "0");
        assert_eq!(show("1 && 2;"), "2");
        assert_eq!(show("let x = 0; x ||= 4; x;"), "4");
        assert_eq!(show("let y = 1; y &&= 9; y;"), "9");
    }

    // ── Scoping ──────────────────────────────────────────────────────────────

    #[test]
    fn test_declarations_and_exponent() {
        assert_eq!(show("let x = 2; let y = 3; x ** y;"), "8");
    }

    #[test]
    fn test_block_shadowing() {
        assert_eq!(show("let x = 1; let inner; { let x = 2; inner = x; } [inner, x];"), "[2, 1]");
    }

    #[test]
    fn test_assignment_writes_through() {
        assert_eq!(show("let x = 1; { x = 5; } x;"), "5");
        assert_eq!(show("let n = 0; function bump() { n += 1; } bump(); bump(); n;"), "2");
    }

    #[test]
    fn test_assignment_errors() {
        assert_eq!(
            error("const c = 1;\nc = 2;"),
            "[ERROR] [test.rose:2:3]: Assignment to constant variable 'c'"
        );
        assert_eq!(
            error("nope = 2;"),
            "[ERROR] [test.rose:1:6]: Identifier 'nope' not found"
        );
        assert_eq!(error("missing;"), "[ERROR] [test.rose:1:1]: Identifier 'missing' not found");
    }

    #[test]
    fn test_function_hoisting() {
        assert_eq!(show("twice(4); function twice(n) { return n * 2; }"), "8");
    }

    #[test]
    fn test_labeled_function_declaration_is_bound() {
        assert_eq!(show("outer: inner: function f() { return 7; } f();"), "7");
    }

    #[test]
    fn test_var_cannot_redeclare_const() {
        assert_eq!(
            error("const c = 1; var c = 2; c;"),
            "[ERROR] [test.rose:1:18]: Assignment to constant variable 'c'"
        );
        assert_eq!(
            error("var Math = 5;"),
            "[ERROR] [test.rose:1:5]: Assignment to constant variable 'Math'"
        );
        assert_eq!(show("var fresh = 1; var fresh = 2; fresh;"), "2");
    }

    #[test]
    fn test_var_hoisting() {
        assert_eq!(show("let seen = typeof v; { var v = 1; } [seen, v];"), r#"["undefined", 1]"#);
        assert_eq!(
            show("function f() { if (true) { var inner = 3; } return inner; } f();"),
            "3"
        );
    }

    // ── Objects and arrays ───────────────────────────────────────────────────

    #[test]
    fn test_member_access() {
        assert_eq!(show("Math.PI;"), "3.1415926535897932");
        assert_eq!(show(r#"let o = {a: 1, "b": 2}; o.a + o["b"];"#), "3");
        assert_eq!(
            error("let o = {a: 1};\no.missing;"),
            "[ERROR] [test.rose:2:2]: Object has no member 'missing'"
        );
        assert_eq!(
            error("let n = 1; n.x;"),
            "[ERROR] [test.rose:1:13]: Trying to access member of a non-object"
        );
    }

    #[test]
    fn test_arrays() {
        assert_eq!(show("let a = [1, 2, 3]; a[1];"), "2");
        assert_eq!(show("let a = [1]; a[5];"), "undefined");
        assert_eq!(show("let a = []; a[2] = 1; a;"), "[undefined, undefined, 1]");
        assert_eq!(show("[1, 2, 3].length;"), "3");
        assert_eq!(show(r#""hello"[1];"#), r#""e""#);
        assert_eq!(show("let a = [2, 3]; [1, ...a, 4];"), "[1, 2, 3, 4]");
    }

    #[test]
    fn test_objects() {
        assert_eq!(
            show("let a = 1; let o = {a, b: 2}; o.c = 3; o;"),
            r#"{"a": 1, "b": 2, "c": 3}"#
        );
        assert_eq!(
            show("let base = {x: 1, y: 2}; ({...base, y: 5});"),
            r#"{"x": 1, "y": 5}"#
        );
        assert_eq!(show("let o = {a: 1, b: 2}; delete o.a; o;"), r#"{"b": 2}"#);
    }

    #[test]
    fn test_update_operators() {
        assert_eq!(show("let i = 1; let j = i++; [i, j];"), "[2, 1]");
        assert_eq!(show("let i = 1; let j = --i; [i, j];"), "[0, 0]");
        assert_eq!(show("let o = {n: 1}; o.n++; o.n;"), "2");
        assert_eq!(show("let a = [5]; a[0] *= 3; a;"), "[15]");
    }

    #[test]
    fn test_typeof_and_void() {
        assert_eq!(
            show("[typeof 1, typeof \"s\", typeof null, typeof Math.sin, typeof nothing];"),
            r#"["number", "string", "object", "function", "undefined"]"#
        );
        assert_eq!(show("void 1;"), "undefined");
    }

    // ── Functions ────────────────────────────────────────────────────────────

    #[test]
    fn test_closures_capture_scope() {
        let src = "
            function counter() {
                let n = 0;
                return function () { n = n + 1; return n; };
            }
            let c = counter();
            c(); c();
            c();
        ";
        assert_eq!(show(src), "3");
    }

    #[test]
    fn test_defaults_and_rest_parameters() {
        assert_eq!(show("function f(a, b = a + 1) { return [a, b]; } f(1);"), "[1, 2]");
        assert_eq!(show("function f(a, b = 10) { return b; } f(1, undefined);"), "10");
        assert_eq!(show("function f(a, ...rest) { return rest; } f(1, 2, 3);"), "[2, 3]");
        assert_eq!(show("function f(...rest) { return rest; } f();"), "[]");
        assert_eq!(show("function f(a, b) { return b; } f(1);"), "undefined");
    }

    #[test]
    fn test_recursion_and_named_function_expression() {
        assert_eq!(
            show("function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); } fib(15);"),
            "610"
        );
        assert_eq!(
            show("let f = function fact(n) { return n <= 1 ? 1 : n * fact(n - 1); }; f(5);"),
            "120"
        );
    }

    #[test]
    fn test_this_and_new() {
        assert_eq!(
            show("let o = {v: 4, get: function () { return this.v; }}; o.get();"),
            "4"
        );
        assert_eq!(
            show("function Point(x, y) { this.x = x; this.y = y; } let p = new Point(1, 2); p;"),
            r#"{"x": 1, "y": 2}"#
        );
    }

    #[test]
    fn test_calling_a_non_function() {
        assert_eq!(
            error("let x = 1; x();"),
            "[ERROR] [test.rose:1:13]: Trying to call a non-function"
        );
    }

    #[test]
    fn test_runaway_recursion_is_an_error() {
        let message = error("function f() { return f(); } f();");
        assert!(message.ends_with("Maximum call stack size exceeded"), "{message}");
    }

    #[test]
    fn test_native_errors_carry_call_site() {
        assert_eq!(
            error("let r = 1;\nMath.sqrt(-1);"),
            "[ERROR] [test.rose:2:10]: Math.sqrt cannot take negative numbers"
        );
    }

    #[test]
    fn test_async_and_await_run_eagerly() {
        assert_eq!(show("async function f() { return await 7; } f();"), "7");
    }

    // ── Control flow ─────────────────────────────────────────────────────────

    #[test]
    fn test_loops() {
        assert_eq!(show("let s = 0; for (let i = 1; i <= 10; i++) { s += i; } s;"), "55");
        assert_eq!(show("let i = 0; while (true) { i++; if (i == 3) break; } i;"), "3");
        assert_eq!(show("let i = 0; do { i++; } while (i < 5); i;"), "5");
        assert_eq!(
            show("let s = 0; for (let i = 0; i < 5; i++) { if (i == 2) continue; s += i; } s;"),
            "8"
        );
        assert_eq!(show("while (true) { break; }"), "undefined");
    }

    #[test]
    fn test_labeled_break_and_continue() {
        let src = "
            let hits = 0;
            outer: for (let i = 0; i < 3; i++) {
                for (let j = 0; j < 3; j++) {
                    if (j == 1) continue outer;
                    if (i == 2) break outer;
                    hits++;
                }
            }
            hits;
        ";
        assert_eq!(show(src), "2");
        assert_eq!(show("let x = 0; block: { x = 1; break block; x = 2; } x;"), "1");
    }

    #[test]
    fn test_switch() {
        let src = "
            function name(n) {
                let out = \"\";
                switch (n) {
                    case 1: out += \"one\";
                    case 2: out += \"two\"; break;
                    default: out = \"many\";
                }
                return out;
            }
            [name(1), name(2), name(9)];
        ";
        assert_eq!(show(src), r#"["onetwo", "two", "many"]"#);
    }

    #[test]
    fn test_try_catch_finally() {
        assert_eq!(show("let r; try { throw 5; } catch (e) { r = e; } r;"), "5");
        assert_eq!(
            show("let r; try { 1 / 0; } catch (e) { r = e; } r;"),
            r#""Division by zero""#
        );
        assert_eq!(
            show("let log = []; try { log[0] = 1; } finally { log[1] = 2; } log;"),
            "[1, 2]"
        );
        assert_eq!(
            show("function f() { try { return 1; } finally { return 2; } } f();"),
            "2"
        );
        assert_eq!(
            show("let r = 0; try { try { throw 1; } finally { r = 7; } } catch (e) { r += e; } r;"),
            "8"
        );
    }

    #[test]
    fn test_uncaught_throw() {
        assert_eq!(
            error("let a = 1;\n  throw \"boom\";"),
            "[ERROR] [test.rose:2:3]: Uncaught exception: boom"
        );
    }

    // ── Modules and session state ────────────────────────────────────────────

    #[test]
    fn test_import_is_rejected() {
        let message = error("import { a } from \"./lib\";");
        assert!(
            message.ends_with("Cannot import './lib': module loading is not supported"),
            "{message}"
        );
    }

    #[test]
    fn test_exports_are_recorded() {
        let program = parse_source(
            "export const answer = 42; export function f() {} let z = 1; export { z }; export default 3;",
            "mod.rose",
        )
        .unwrap();
        let mut interp = Interpreter::new();
        interp.evaluate(&program).unwrap();
        let names: Vec<&str> = interp.exports().iter().map(|(k, _)| k.as_ref()).collect();
        assert_eq!(names, vec!["answer", "f", "z", "default"]);
        assert_eq!(interp.exports().get("answer").unwrap().to_string(), "42");
    }

    #[test]
    fn test_globals_persist_across_evaluations() {
        let mut interp = Interpreter::new();
        let first = parse_source("let total = 10;", "repl").unwrap();
        interp.evaluate(&first).unwrap();
        let failing = parse_source("total = total + 1; missing;", "repl").unwrap();
        assert!(interp.evaluate(&failing).is_err());
        let last = parse_source("total;", "repl").unwrap();
        assert_eq!(interp.evaluate(&last).unwrap().to_string(), "11");
    }

    #[test]
    fn test_random_through_the_evaluator() {
        assert_eq!(show("let r = Math.random(); r >= 0 && r < 1;"), "true");
    }
}
