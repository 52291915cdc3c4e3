//! Source printer and AST dump.
//!
//! [`to_source`] regenerates Rose source text from a [`Program`].  Every
//! compound expression is wrapped in parentheses, so re-parsing the output
//! yields a tree of the same shape regardless of operator precedence.
//!
//! [`dump`] renders the tree one node per line, two spaces per nesting
//! level; the driver prints it for `--dump-ast`.

use crate::number;
use crate::parser::ast::*;
use crate::stack::ensure_sufficient_stack;

/// Regenerates parseable source text for `program`.
pub fn to_source(program: &Program) -> String {
    let mut printer = SourcePrinter::new();
    for stmt in &program.body {
        printer.stmt(stmt);
        printer.newline();
    }
    printer.output
}

/// Renders `program` as an indented tree, one node per line.
pub fn dump(program: &Program) -> String {
    let mut dumper = Dumper::default();
    dumper.line(format!("Program ({} statements)", program.body.len()));
    dumper.nested(|d| {
        for stmt in &program.body {
            d.stmt(stmt);
        }
    });
    dumper.output
}

/// Writes `value` as a double-quoted string literal the scanner accepts.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{b}' => out.push_str("\\v"),
            '\0' => out.push_str("\\0"),
            ' '..='~' => out.push(c),
            // Characters outside the BMP cannot be written as a single
            // four-digit escape.
            _ => match u16::try_from(u32::from(c)) {
                Ok(unit) => out.push_str(&format!("\\u{unit:04x}")),
                Err(_) => out.push_str("\\ufffd"),
            },
        }
    }
    out.push('"');
    out
}

/// Whether `expr` reparses unchanged as a `new` callee: an operand followed
/// only by `.name` and `[index]` accesses, with no call in between.
fn is_member_chain(expr: &Expr) -> bool {
    match expr {
        Expr::Member(m) => is_member_chain(&m.object),
        Expr::Index(i) => is_member_chain(&i.object),
        Expr::Call(_) => false,
        _ => true,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Source printer
// ─────────────────────────────────────────────────────────────────────────────

struct SourcePrinter {
    output: String,
    indent: usize,
}

impl SourcePrinter {
    fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn newline(&mut self) {
        self.output.push('\n');
        for _ in 0..self.indent {
            self.output.push_str("  ");
        }
    }

    fn comma_separated<T>(&mut self, items: &[T], mut each: impl FnMut(&mut Self, &T)) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            each(self, item);
        }
    }

    fn block(&mut self, block: &BlockStmt) {
        if block.body.is_empty() {
            self.write("{}");
            return;
        }
        self.write("{");
        self.indent += 1;
        for stmt in &block.body {
            self.newline();
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.newline();
        self.write("}");
    }

    fn stmt(&mut self, stmt: &Stmt) {
        ensure_sufficient_stack(|| self.stmt_inner(stmt));
    }

    fn stmt_inner(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Empty(_) => self.write(";"),
            Stmt::Block(b) => self.block(b),
            Stmt::Expr(s) => {
                self.expr(&s.expr);
                self.write(";");
            }
            Stmt::Declaration(d) => {
                self.declaration(d);
                self.write(";");
            }
            Stmt::Function(f) => self.function(f),
            Stmt::If(s) => self.if_stmt(s),
            Stmt::While(s) => {
                self.write("while (");
                self.expr(&s.test);
                self.write(") ");
                self.block(&s.body);
            }
            Stmt::DoWhile(s) => {
                self.write("do ");
                self.block(&s.body);
                self.write(" while (");
                self.expr(&s.test);
                self.write(");");
            }
            Stmt::For(s) => {
                self.write("for (");
                match &s.init {
                    Some(ForInit::Declaration(d)) => self.declaration(d),
                    Some(ForInit::Expr(e)) => self.expr(e),
                    None => {}
                }
                self.write(";");
                if let Some(test) = &s.test {
                    self.write(" ");
                    self.expr(test);
                }
                self.write(";");
                if let Some(update) = &s.update {
                    self.write(" ");
                    self.expr(update);
                }
                self.write(") ");
                self.block(&s.body);
            }
            Stmt::Switch(s) => self.switch(s),
            Stmt::Label(s) => {
                self.write(&s.label.name);
                self.write(": ");
                self.stmt(&s.body);
            }
            Stmt::Break(s) => self.jump("break", s.label.as_ref()),
            Stmt::Continue(s) => self.jump("continue", s.label.as_ref()),
            Stmt::Return(s) => {
                self.write("return");
                if let Some(arg) = &s.argument {
                    self.write(" ");
                    self.expr(arg);
                }
                self.write(";");
            }
            Stmt::Throw(s) => {
                self.write("throw ");
                self.expr(&s.argument);
                self.write(";");
            }
            Stmt::Try(s) => {
                self.write("try ");
                self.block(&s.block);
                if let Some(handler) = &s.handler {
                    self.write(" catch ");
                    if let Some(param) = &handler.param {
                        self.write("(");
                        self.write(&param.name);
                        self.write(") ");
                    }
                    self.block(&handler.body);
                }
                if let Some(finalizer) = &s.finalizer {
                    self.write(" finally ");
                    self.block(finalizer);
                }
            }
            Stmt::Import(s) => self.import(s),
            Stmt::Export(ExportDecl::Default { body, .. }) => {
                self.write("export default ");
                self.stmt(body);
            }
            Stmt::Export(ExportDecl::Named { names, .. }) => {
                self.write("export { ");
                self.comma_separated(names, |p, n| p.write(&n.name));
                self.write(" };");
            }
            Stmt::Export(ExportDecl::Declaration { body, .. }) => {
                self.write("export ");
                self.stmt(body);
            }
            Stmt::Debugger(_) => self.write("debugger;"),
        }
    }

    fn declaration(&mut self, decl: &VarDecl) {
        self.write(decl.kind.as_str());
        self.write(" ");
        self.comma_separated(&decl.declarators, |p, d| {
            p.write(&d.name.name);
            if let Some(init) = &d.init {
                p.write(" = ");
                p.expr(init);
            }
        });
    }

    fn function(&mut self, f: &FunctionNode) {
        if f.is_async {
            self.write("async ");
        }
        self.write("function");
        if let Some(name) = &f.name {
            self.write(" ");
            self.write(&name.name);
        }
        self.write("(");
        self.comma_separated(&f.params, |p, param| {
            if param.is_rest {
                p.write("...");
            }
            p.write(&param.name);
            if let Some(default) = &param.default {
                p.write(" = ");
                p.expr(default);
            }
        });
        self.write(") ");
        self.block(&f.body);
    }

    fn if_stmt(&mut self, s: &IfStmt) {
        self.write("if (");
        self.expr(&s.test);
        self.write(") ");
        self.block(&s.consequent);
        if let Some(alt) = &s.alternate {
            self.write(" else ");
            self.stmt(alt);
        }
    }

    fn switch(&mut self, s: &SwitchStmt) {
        self.write("switch (");
        self.expr(&s.discriminant);
        self.write(") {");
        self.indent += 1;
        for case in &s.cases {
            if case.is_default {
                self.newline();
                self.write("default:");
            }
            for test in &case.tests {
                self.newline();
                self.write("case ");
                self.expr(test);
                self.write(":");
            }
            self.indent += 1;
            for stmt in &case.body.body {
                self.newline();
                self.stmt(stmt);
            }
            self.indent -= 1;
        }
        self.indent -= 1;
        self.newline();
        self.write("}");
    }

    fn jump(&mut self, keyword: &str, label: Option<&Ident>) {
        self.write(keyword);
        if let Some(label) = label {
            self.write(" ");
            self.write(&label.name);
        }
        self.write(";");
    }

    fn import(&mut self, s: &ImportDecl) {
        self.write("import ");
        if let Some(default) = &s.default {
            self.write(&default.name);
            self.write(if s.named.is_empty() { " " } else { ", " });
        }
        if !s.named.is_empty() {
            self.write("{ ");
            self.comma_separated(&s.named, |p, n| p.write(&n.name));
            self.write(" } ");
        }
        if s.default.is_some() || !s.named.is_empty() {
            self.write("from ");
        }
        self.write(&quote(&s.module));
        self.write(";");
    }

    fn expr(&mut self, expr: &Expr) {
        ensure_sufficient_stack(|| self.expr_inner(expr));
    }

    fn expr_inner(&mut self, expr: &Expr) {
        match expr {
            Expr::Number(n) => self.write(&number::format(&n.value)),
            Expr::String(s) => self.write(&quote(&s.value)),
            Expr::Bool(b) => self.write(if b.value { "true" } else { "false" }),
            Expr::Null(_) => self.write("null"),
            Expr::Undefined(_) => self.write("undefined"),
            Expr::Identifier(i) => self.write(&i.name),
            Expr::This(_) => self.write("this"),
            Expr::Array(a) => {
                self.write("[");
                self.comma_separated(&a.elements, |p, e| p.expr(e));
                self.write("]");
            }
            Expr::Object(o) => {
                self.write("({");
                self.comma_separated(&o.properties, |p, prop| {
                    if let Some(key) = &prop.key {
                        p.write(&quote(key));
                        p.write(": ");
                    }
                    p.expr(&prop.value);
                });
                self.write("})");
            }
            Expr::Spread(s) => {
                self.write("...");
                self.expr(&s.argument);
            }
            Expr::Function(f) => {
                self.write("(");
                self.function(f);
                self.write(")");
            }
            Expr::Binary(b) => {
                self.write("(");
                self.expr(&b.left);
                if b.op == BinaryOp::Comma {
                    self.write(", ");
                } else {
                    self.write(" ");
                    self.write(b.op.as_str());
                    self.write(" ");
                }
                self.expr(&b.right);
                self.write(")");
            }
            Expr::Unary(u) => {
                self.write("(");
                self.write(u.op.as_str());
                if matches!(u.op, UnaryOp::Typeof | UnaryOp::Delete | UnaryOp::Void) {
                    self.write(" ");
                }
                self.expr(&u.argument);
                self.write(")");
            }
            Expr::Assignment(a) => {
                self.write("(");
                self.expr(&a.target);
                self.write(" ");
                self.write(a.op.as_str());
                self.write(" ");
                self.expr(&a.value);
                self.write(")");
            }
            Expr::Ternary(t) => {
                self.write("(");
                self.expr(&t.test);
                self.write(" ? ");
                self.expr(&t.consequent);
                self.write(" : ");
                self.expr(&t.alternate);
                self.write(")");
            }
            Expr::Call(c) => {
                self.expr(&c.callee);
                self.arguments(&c.arguments);
            }
            Expr::New(c) => {
                self.write("(new ");
                if is_member_chain(&c.callee) {
                    self.expr(&c.callee);
                } else {
                    self.write("(");
                    self.expr(&c.callee);
                    self.write(")");
                }
                self.arguments(&c.arguments);
                self.write(")");
            }
            Expr::Index(i) => {
                self.expr(&i.object);
                self.write("[");
                self.expr(&i.index);
                self.write("]");
            }
            Expr::Member(m) => {
                self.expr(&m.object);
                self.write(".");
                self.write(&m.property.name);
            }
            Expr::Postfix(p) => {
                self.write("(");
                self.expr(&p.argument);
                self.write(p.op.as_str());
                self.write(")");
            }
            Expr::Await(a) => {
                self.write("(await ");
                self.expr(&a.argument);
                self.write(")");
            }
        }
    }

    fn arguments(&mut self, args: &[Expr]) {
        self.write("(");
        self.comma_separated(args, |p, a| p.expr(a));
        self.write(")");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tree dump
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Dumper {
    output: String,
    depth: usize,
}

impl Dumper {
    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.output.push_str("  ");
        }
        self.output.push_str(text.as_ref());
        self.output.push('\n');
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    /// A labelled child line with the node nested under it.
    fn field(&mut self, label: &str, f: impl FnOnce(&mut Self)) {
        self.line(label);
        self.nested(f);
    }

    fn block(&mut self, label: &str, block: &BlockStmt) {
        self.line(format!("{label} ({} statements)", block.body.len()));
        self.nested(|d| {
            for stmt in &block.body {
                d.stmt(stmt);
            }
        });
    }

    fn stmt(&mut self, stmt: &Stmt) {
        ensure_sufficient_stack(|| self.stmt_inner(stmt));
    }

    fn stmt_inner(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Empty(_) => self.line("Empty"),
            Stmt::Block(b) => self.block("Block", b),
            Stmt::Expr(s) => {
                self.line("ExprStmt");
                self.nested(|d| d.expr(&s.expr));
            }
            Stmt::Declaration(decl) => self.declaration(decl),
            Stmt::Function(f) => self.function(f),
            Stmt::If(s) => {
                self.line("If");
                self.nested(|d| {
                    d.field("Test", |d| d.expr(&s.test));
                    d.block("Then", &s.consequent);
                    if let Some(alt) = &s.alternate {
                        d.field("Else", |d| d.stmt(alt));
                    }
                });
            }
            Stmt::While(s) => {
                self.line("While");
                self.nested(|d| {
                    d.field("Test", |d| d.expr(&s.test));
                    d.block("Body", &s.body);
                });
            }
            Stmt::DoWhile(s) => {
                self.line("DoWhile");
                self.nested(|d| {
                    d.block("Body", &s.body);
                    d.field("Test", |d| d.expr(&s.test));
                });
            }
            Stmt::For(s) => {
                self.line("For");
                self.nested(|d| {
                    match &s.init {
                        Some(ForInit::Declaration(decl)) => d.field("Init", |d| d.declaration(decl)),
                        Some(ForInit::Expr(e)) => d.field("Init", |d| d.expr(e)),
                        None => {}
                    }
                    if let Some(test) = &s.test {
                        d.field("Test", |d| d.expr(test));
                    }
                    if let Some(update) = &s.update {
                        d.field("Update", |d| d.expr(update));
                    }
                    d.block("Body", &s.body);
                });
            }
            Stmt::Switch(s) => {
                self.line(format!("Switch ({} cases)", s.cases.len()));
                self.nested(|d| {
                    d.field("Discriminant", |d| d.expr(&s.discriminant));
                    for case in &s.cases {
                        if case.is_default {
                            d.block("Default", &case.body);
                        } else {
                            d.line(format!("Case ({} labels)", case.tests.len()));
                            d.nested(|d| {
                                for test in &case.tests {
                                    d.expr(test);
                                }
                                d.block("Body", &case.body);
                            });
                        }
                    }
                });
            }
            Stmt::Label(s) => {
                self.line(format!("Label {}", s.label.name));
                self.nested(|d| d.stmt(&s.body));
            }
            Stmt::Break(s) => self.jump("Break", s.label.as_ref()),
            Stmt::Continue(s) => self.jump("Continue", s.label.as_ref()),
            Stmt::Return(s) => {
                self.line("Return");
                if let Some(arg) = &s.argument {
                    self.nested(|d| d.expr(arg));
                }
            }
            Stmt::Throw(s) => {
                self.line("Throw");
                self.nested(|d| d.expr(&s.argument));
            }
            Stmt::Try(s) => {
                self.line("Try");
                self.nested(|d| {
                    d.block("Block", &s.block);
                    if let Some(handler) = &s.handler {
                        let label = match &handler.param {
                            Some(p) => format!("Catch {}", p.name),
                            None => "Catch".to_owned(),
                        };
                        d.block(&label, &handler.body);
                    }
                    if let Some(finalizer) = &s.finalizer {
                        d.block("Finally", finalizer);
                    }
                });
            }
            Stmt::Import(s) => {
                let mut text = format!("Import {}", quote(&s.module));
                if let Some(default) = &s.default {
                    text.push_str(&format!(" default {}", default.name));
                }
                if !s.named.is_empty() {
                    let names: Vec<&str> = s.named.iter().map(|n| n.name.as_str()).collect();
                    text.push_str(&format!(" named [{}]", names.join(", ")));
                }
                self.line(text);
            }
            Stmt::Export(ExportDecl::Default { body, .. }) => {
                self.line("Export default");
                self.nested(|d| d.stmt(body));
            }
            Stmt::Export(ExportDecl::Named { names, .. }) => {
                let names: Vec<&str> = names.iter().map(|n| n.name.as_str()).collect();
                self.line(format!("Export {{{}}}", names.join(", ")));
            }
            Stmt::Export(ExportDecl::Declaration { body, .. }) => {
                self.line("Export");
                self.nested(|d| d.stmt(body));
            }
            Stmt::Debugger(_) => self.line("Debugger"),
        }
    }

    fn declaration(&mut self, decl: &VarDecl) {
        self.line(format!("Declaration {}", decl.kind.as_str()));
        self.nested(|d| {
            for declarator in &decl.declarators {
                d.line(&declarator.name.name);
                if let Some(init) = &declarator.init {
                    d.nested(|d| d.expr(init));
                }
            }
        });
    }

    fn function(&mut self, f: &FunctionNode) {
        let name = f.name.as_ref().map_or("<anonymous>", |n| n.name.as_str());
        let prefix = if f.is_async { "async " } else { "" };
        self.line(format!("Function {prefix}{name}"));
        self.nested(|d| {
            for param in &f.params {
                let rest = if param.is_rest { "..." } else { "" };
                d.line(format!("Param {rest}{}", param.name));
                if let Some(default) = &param.default {
                    d.nested(|d| d.expr(default));
                }
            }
            d.block("Body", &f.body);
        });
    }

    fn jump(&mut self, keyword: &str, label: Option<&Ident>) {
        match label {
            Some(label) => self.line(format!("{keyword} {}", label.name)),
            None => self.line(keyword),
        }
    }

    fn expr(&mut self, expr: &Expr) {
        ensure_sufficient_stack(|| self.expr_inner(expr));
    }

    fn expr_inner(&mut self, expr: &Expr) {
        match expr {
            Expr::Number(n) => self.line(format!("Number {}", number::format(&n.value))),
            Expr::String(s) => self.line(format!("String {}", quote(&s.value))),
            Expr::Bool(b) => self.line(format!("Bool {}", b.value)),
            Expr::Null(_) => self.line("Null"),
            Expr::Undefined(_) => self.line("Undefined"),
            Expr::Identifier(i) => self.line(format!("Identifier {}", i.name)),
            Expr::This(_) => self.line("This"),
            Expr::Array(a) => {
                self.line(format!("Array ({} elements)", a.elements.len()));
                self.nested(|d| a.elements.iter().for_each(|e| d.expr(e)));
            }
            Expr::Object(o) => {
                self.line(format!("Object ({} properties)", o.properties.len()));
                self.nested(|d| {
                    for prop in &o.properties {
                        match &prop.key {
                            Some(key) => d.field(&format!("Property {}", quote(key)), |d| {
                                d.expr(&prop.value)
                            }),
                            None => d.expr(&prop.value),
                        }
                    }
                });
            }
            Expr::Spread(s) => {
                self.line("Spread");
                self.nested(|d| d.expr(&s.argument));
            }
            Expr::Function(f) => self.function(f),
            Expr::Binary(b) => {
                self.line(format!("Binary {}", b.op.as_str()));
                self.nested(|d| {
                    d.expr(&b.left);
                    d.expr(&b.right);
                });
            }
            Expr::Unary(u) => {
                self.line(format!("Unary {}", u.op.as_str()));
                self.nested(|d| d.expr(&u.argument));
            }
            Expr::Assignment(a) => {
                self.line(format!("Assignment {}", a.op.as_str()));
                self.nested(|d| {
                    d.expr(&a.target);
                    d.expr(&a.value);
                });
            }
            Expr::Ternary(t) => {
                self.line("Ternary");
                self.nested(|d| {
                    d.expr(&t.test);
                    d.expr(&t.consequent);
                    d.expr(&t.alternate);
                });
            }
            Expr::Call(c) => self.call("Call", c),
            Expr::New(c) => self.call("New", c),
            Expr::Index(i) => {
                self.line("Index");
                self.nested(|d| {
                    d.expr(&i.object);
                    d.expr(&i.index);
                });
            }
            Expr::Member(m) => {
                self.line(format!("Member .{}", m.property.name));
                self.nested(|d| d.expr(&m.object));
            }
            Expr::Postfix(p) => {
                self.line(format!("Postfix {}", p.op.as_str()));
                self.nested(|d| d.expr(&p.argument));
            }
            Expr::Await(a) => {
                self.line("Await");
                self.nested(|d| d.expr(&a.argument));
            }
        }
    }

    fn call(&mut self, label: &str, c: &CallExpr) {
        self.line(format!("{label} ({} args)", c.arguments.len()));
        self.nested(|d| {
            d.expr(&c.callee);
            c.arguments.iter().for_each(|a| d.expr(a));
        });
    }
}
