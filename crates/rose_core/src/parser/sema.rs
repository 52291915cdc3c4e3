//! Semantic analysis for Rose programs.
//!
//! # Overview
//!
//! Call [`analyze`] on a parsed [`Program`] to collect every static rule
//! violation in a single traversal.  Unlike the parser, analysis never stops
//! early: the whole tree is visited and all diagnostics are returned.
//!
//! # Rules
//!
//! - **`break`**: only inside a loop, a `switch` or a labeled statement.
//! - **`continue`**: only inside a loop.
//! - **Labels**: `break l` / `continue l` must name an enclosing label, and
//!   `continue l` must name a loop.
//! - **`await`**: only inside an `async function`.
//!
//! Loop depth and the label stack do not cross function boundaries.

use crate::error::Diagnostic;
use crate::parser::ast::{
    BlockStmt, ExportDecl, Expr, ForInit, FunctionNode, Ident, Program, SourceLocation, Stmt,
    VarDecl,
};
use crate::stack::ensure_sufficient_stack;

// ─────────────────────────────────────────────────────────────────────────────
// Public entry point
// ─────────────────────────────────────────────────────────────────────────────

/// Analyse `program` and return every diagnostic found, in source order.
///
/// An empty vector means the program passed all checks.
pub fn analyze(program: &Program) -> Vec<Diagnostic> {
    let mut analyzer = Analyzer::default();
    for stmt in &program.body {
        analyzer.visit_stmt(stmt);
    }
    tracing::debug!(diagnostics = analyzer.errors.len(), "semantic analysis done");
    analyzer.errors
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal analyser
// ─────────────────────────────────────────────────────────────────────────────

/// An enclosing label and whether it names a loop.
#[derive(Debug, Clone)]
struct Label {
    name: String,
    is_loop: bool,
}

/// Context that is reset when entering a function body.
#[derive(Debug, Default)]
struct FunctionContext {
    loop_depth: usize,
    switch_depth: usize,
    labels: Vec<Label>,
    in_async_function: bool,
}

#[derive(Debug, Default)]
struct Analyzer {
    ctx: FunctionContext,
    errors: Vec<Diagnostic>,
}

impl Analyzer {
    fn error(&mut self, loc: &SourceLocation, message: impl Into<String>) {
        self.errors.push(Diagnostic::new(loc.clone(), message));
    }

    fn find_label(&self, name: &str) -> Option<&Label> {
        self.ctx.labels.iter().rev().find(|l| l.name == name)
    }

    // ── Statements ───────────────────────────────────────────────────────────

    fn visit_block(&mut self, block: &BlockStmt) {
        for stmt in &block.body {
            self.visit_stmt(stmt);
        }
    }

    fn visit_loop_body(&mut self, block: &BlockStmt) {
        self.ctx.loop_depth += 1;
        self.visit_block(block);
        self.ctx.loop_depth -= 1;
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        ensure_sufficient_stack(|| self.visit_stmt_inner(stmt));
    }

    fn visit_stmt_inner(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Empty(_) | Stmt::Import(_) | Stmt::Debugger(_) => {}
            Stmt::Block(b) => self.visit_block(b),
            Stmt::Expr(s) => self.visit_expr(&s.expr),
            Stmt::Declaration(d) => self.visit_var_decl(d),
            Stmt::Function(f) => self.visit_function(f),
            Stmt::If(s) => {
                self.visit_expr(&s.test);
                self.visit_block(&s.consequent);
                if let Some(alt) = &s.alternate {
                    self.visit_stmt(alt);
                }
            }
            Stmt::While(s) => {
                self.visit_expr(&s.test);
                self.visit_loop_body(&s.body);
            }
            Stmt::DoWhile(s) => {
                self.visit_loop_body(&s.body);
                self.visit_expr(&s.test);
            }
            Stmt::For(s) => {
                match &s.init {
                    Some(ForInit::Declaration(d)) => self.visit_var_decl(d),
                    Some(ForInit::Expr(e)) => self.visit_expr(e),
                    None => {}
                }
                if let Some(test) = &s.test {
                    self.visit_expr(test);
                }
                if let Some(update) = &s.update {
                    self.visit_expr(update);
                }
                self.visit_loop_body(&s.body);
            }
            Stmt::Switch(s) => {
                self.visit_expr(&s.discriminant);
                self.ctx.switch_depth += 1;
                for case in &s.cases {
                    for test in &case.tests {
                        self.visit_expr(test);
                    }
                    self.visit_block(&case.body);
                }
                self.ctx.switch_depth -= 1;
            }
            Stmt::Label(s) => {
                self.ctx.labels.push(Label {
                    name: s.label.name.clone(),
                    is_loop: s.body.is_loop(),
                });
                self.visit_stmt(&s.body);
                self.ctx.labels.pop();
            }
            Stmt::Break(s) => self.visit_break(&s.loc, s.label.as_ref()),
            Stmt::Continue(s) => self.visit_continue(&s.loc, s.label.as_ref()),
            Stmt::Return(s) => {
                if let Some(arg) = &s.argument {
                    self.visit_expr(arg);
                }
            }
            Stmt::Throw(s) => self.visit_expr(&s.argument),
            Stmt::Try(s) => {
                self.visit_block(&s.block);
                if let Some(handler) = &s.handler {
                    self.visit_block(&handler.body);
                }
                if let Some(finalizer) = &s.finalizer {
                    self.visit_block(finalizer);
                }
            }
            Stmt::Export(ExportDecl::Default { body, .. })
            | Stmt::Export(ExportDecl::Declaration { body, .. }) => self.visit_stmt(body),
            Stmt::Export(ExportDecl::Named { .. }) => {}
        }
    }

    fn visit_break(&mut self, loc: &SourceLocation, label: Option<&Ident>) {
        match label {
            Some(label) => {
                if self.find_label(&label.name).is_none() {
                    self.error(&label.loc, format!("Undefined label '{}'", label.name));
                }
            }
            None => {
                if self.ctx.loop_depth == 0 && self.ctx.switch_depth == 0 {
                    self.error(loc, "break not in loop");
                }
            }
        }
    }

    fn visit_continue(&mut self, loc: &SourceLocation, label: Option<&Ident>) {
        if self.ctx.loop_depth == 0 {
            self.error(loc, "continue not in loop");
            return;
        }
        if let Some(label) = label {
            match self.find_label(&label.name) {
                None => self.error(&label.loc, format!("Undefined label '{}'", label.name)),
                Some(l) if !l.is_loop => {
                    let message = format!("Label '{}' does not denote a loop", label.name);
                    self.error(&label.loc, message);
                }
                Some(_) => {}
            }
        }
    }

    fn visit_var_decl(&mut self, decl: &VarDecl) {
        for declarator in &decl.declarators {
            if let Some(init) = &declarator.init {
                self.visit_expr(init);
            }
        }
    }

    fn visit_function(&mut self, f: &FunctionNode) {
        let outer = std::mem::replace(
            &mut self.ctx,
            FunctionContext {
                in_async_function: f.is_async,
                ..FunctionContext::default()
            },
        );
        for param in &f.params {
            if let Some(default) = &param.default {
                self.visit_expr(default);
            }
        }
        self.visit_block(&f.body);
        self.ctx = outer;
    }

    // ── Expressions ──────────────────────────────────────────────────────────

    fn visit_expr(&mut self, expr: &Expr) {
        ensure_sufficient_stack(|| self.visit_expr_inner(expr));
    }

    fn visit_expr_inner(&mut self, expr: &Expr) {
        match expr {
            Expr::Number(_)
            | Expr::String(_)
            | Expr::Bool(_)
            | Expr::Null(_)
            | Expr::Undefined(_)
            | Expr::Identifier(_)
            | Expr::This(_) => {}
            Expr::Array(a) => {
                for element in &a.elements {
                    self.visit_expr(element);
                }
            }
            Expr::Object(o) => {
                for prop in &o.properties {
                    self.visit_expr(&prop.value);
                }
            }
            Expr::Spread(s) => self.visit_expr(&s.argument),
            Expr::Function(f) => self.visit_function(f),
            Expr::Binary(b) => {
                self.visit_expr(&b.left);
                self.visit_expr(&b.right);
            }
            Expr::Unary(u) => self.visit_expr(&u.argument),
            Expr::Assignment(a) => {
                self.visit_expr(&a.target);
                self.visit_expr(&a.value);
            }
            Expr::Ternary(t) => {
                self.visit_expr(&t.test);
                self.visit_expr(&t.consequent);
                self.visit_expr(&t.alternate);
            }
            Expr::Call(c) | Expr::New(c) => {
                self.visit_expr(&c.callee);
                for arg in &c.arguments {
                    self.visit_expr(arg);
                }
            }
            Expr::Index(i) => {
                self.visit_expr(&i.object);
                self.visit_expr(&i.index);
            }
            Expr::Member(m) => self.visit_expr(&m.object),
            Expr::Postfix(p) => self.visit_expr(&p.argument),
            Expr::Await(a) => {
                if !self.ctx.in_async_function {
                    self.error(&a.loc, "'await' can only be used inside async functions");
                }
                self.visit_expr(&a.argument);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::parse_source;

    fn messages(src: &str) -> Vec<String> {
        let program = parse_source(src, "sema.rose").unwrap();
        analyze(&program).into_iter().map(|d| d.message).collect()
    }

    #[test]
    fn test_clean_program_has_no_diagnostics() {
        assert!(messages("let x = 2; let y = 3; x ** y;").is_empty());
    }

    #[test]
    fn test_top_level_break_and_continue_are_flagged() {
        assert_eq!(
            messages("break; continue;"),
            vec!["break not in loop", "continue not in loop"]
        );
    }

    #[test]
    fn test_break_and_continue_inside_loops_are_allowed() {
        assert!(messages("while (true) { break; }").is_empty());
        assert!(messages("for (;;) { if (x) continue; else break; }").is_empty());
        assert!(messages("do { continue; } while (x);").is_empty());
    }

    #[test]
    fn test_break_inside_switch_is_allowed_but_continue_is_not() {
        assert!(messages("switch (x) { case 1: break; }").is_empty());
        assert_eq!(
            messages("switch (x) { case 1: continue; }"),
            vec!["continue not in loop"]
        );
    }

    #[test]
    fn test_loop_depth_resets_inside_functions() {
        assert_eq!(
            messages("while (true) { function f() { break; } }"),
            vec!["break not in loop"]
        );
    }

    #[test]
    fn test_await_outside_async_function() {
        assert_eq!(
            messages("await x; function f() { await y; }"),
            vec![
                "'await' can only be used inside async functions",
                "'await' can only be used inside async functions"
            ]
        );
    }

    #[test]
    fn test_await_inside_async_function_is_allowed() {
        assert!(messages("async function f() { await g(); }").is_empty());
        assert!(messages("let f = async function () { return await 1; };").is_empty());
    }

    #[test]
    fn test_async_flag_restored_after_nested_function() {
        let found = messages("async function f() { function g() {} await g(); }");
        assert!(found.is_empty());
        let found = messages("async function f() { function g() { await 1; } }");
        assert_eq!(found, vec!["'await' can only be used inside async functions"]);
    }

    #[test]
    fn test_labels() {
        assert!(messages("outer: while (a) { while (b) { continue outer; } }").is_empty());
        assert!(messages("block: { break block; }").is_empty());
        assert_eq!(messages("while (a) { break nowhere; }"), vec!["Undefined label 'nowhere'"]);
        assert_eq!(
            messages("block: { while (a) { continue block; } }"),
            vec!["Label 'block' does not denote a loop"]
        );
    }

    #[test]
    fn test_labels_do_not_cross_function_boundaries() {
        assert_eq!(
            messages("outer: while (a) { function f() { while (b) { break outer; } } }"),
            vec!["Undefined label 'outer'"]
        );
    }

    #[test]
    fn test_reports_every_violation_with_location() {
        let program = parse_source("break;\nwhile (x) {}\n  continue;", "m.rose").unwrap();
        let rendered: Vec<String> = analyze(&program).iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "[ERROR] [m.rose:1:1]: break not in loop",
                "[ERROR] [m.rose:3:3]: continue not in loop"
            ]
        );
    }
}
