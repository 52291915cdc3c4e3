//! Rose Abstract Syntax Tree node definitions.
//!
//! Every node struct carries a [`SourceLocation`] field (`loc`) that pinpoints
//! where it starts in the source text.
//!
//! # Structure
//!
//! - [`Program`]: root node.
//! - [`Stmt`]: statement nodes.
//! - [`Expr`]: expression nodes.
//! - [`FunctionNode`]: shared payload of function declarations and
//!   expressions.
//!
//! Children are owned through `Box`/`Vec`, so dropping the root releases the
//! whole tree.  Function nodes are the exception: they sit behind an [`Rc`]
//! so that a closure created from them can outlive the tree it came from.

use std::rc::Rc;

use rug::Float;

use crate::parser::scanner::Location;

// ─────────────────────────────────────────────────────────────────────────────
// Source location
// ─────────────────────────────────────────────────────────────────────────────

/// Source location attached to every AST node.
pub type SourceLocation = Location;

// ─────────────────────────────────────────────────────────────────────────────
// Program
// ─────────────────────────────────────────────────────────────────────────────

/// The root node of a parsed source file.
#[derive(Debug, Clone)]
pub struct Program {
    /// Source location of the entire program.
    pub loc: SourceLocation,
    /// Top-level statements, in source order.
    pub body: Vec<Stmt>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Common helpers
// ─────────────────────────────────────────────────────────────────────────────

/// A name: binding, label, property or reference.
#[derive(Debug, Clone)]
pub struct Ident {
    /// Source location.
    pub loc: SourceLocation,
    /// The identifier text.
    pub name: String,
}

/// A formal parameter of a function.
#[derive(Debug, Clone)]
pub struct Param {
    /// Source location.
    pub loc: SourceLocation,
    /// Parameter name.
    pub name: String,
    /// Default value (`= expr`), if present.  Never set on a rest parameter.
    pub default: Option<Expr>,
    /// `true` for `...name`; only the last parameter may be a rest parameter.
    pub is_rest: bool,
}

/// A function declaration or expression.
#[derive(Debug, Clone)]
pub struct FunctionNode {
    /// Source location of `function` (or `async`).
    pub loc: SourceLocation,
    /// Function name, absent for anonymous function expressions.
    pub name: Option<Ident>,
    /// Formal parameters.
    pub params: Vec<Param>,
    /// `true` for `async function`.
    pub is_async: bool,
    /// Function body.
    pub body: BlockStmt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Statements
// ─────────────────────────────────────────────────────────────────────────────

/// A statement.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// `;`
    Empty(EmptyStmt),
    /// `{ … }` block statement.
    Block(BlockStmt),
    /// Expression statement (`expr ;`).
    Expr(ExprStmt),
    /// `let / const / var` declaration.
    Declaration(VarDecl),
    /// `function` declaration.
    Function(Rc<FunctionNode>),
    /// `if (test) consequent else alternate`
    If(IfStmt),
    /// `while (test) body`
    While(WhileStmt),
    /// `do body while (test);`
    DoWhile(DoWhileStmt),
    /// `for (init; test; update) body`
    For(ForStmt),
    /// `switch (discriminant) { cases }`
    Switch(SwitchStmt),
    /// `label: body`
    Label(LabeledStmt),
    /// `break [label];`
    Break(BreakStmt),
    /// `continue [label];`
    Continue(ContinueStmt),
    /// `return [argument];`
    Return(ReturnStmt),
    /// `throw argument;`
    Throw(ThrowStmt),
    /// `try block [catch] [finally]`
    Try(TryStmt),
    /// `import … from "module";`
    Import(ImportDecl),
    /// `export …`
    Export(ExportDecl),
    /// `debugger;`
    Debugger(DebuggerStmt),
}

impl Stmt {
    /// Returns the source location of this statement.
    pub fn loc(&self) -> &SourceLocation {
        match self {
            Self::Empty(s) => &s.loc,
            Self::Block(s) => &s.loc,
            Self::Expr(s) => &s.loc,
            Self::Declaration(s) => &s.loc,
            Self::Function(f) => &f.loc,
            Self::If(s) => &s.loc,
            Self::While(s) => &s.loc,
            Self::DoWhile(s) => &s.loc,
            Self::For(s) => &s.loc,
            Self::Switch(s) => &s.loc,
            Self::Label(s) => &s.loc,
            Self::Break(s) => &s.loc,
            Self::Continue(s) => &s.loc,
            Self::Return(s) => &s.loc,
            Self::Throw(s) => &s.loc,
            Self::Try(s) => &s.loc,
            Self::Import(s) => &s.loc,
            Self::Export(s) => s.loc(),
            Self::Debugger(s) => &s.loc,
        }
    }

    /// Returns `true` for the loop statements.
    pub fn is_loop(&self) -> bool {
        matches!(self, Self::While(_) | Self::DoWhile(_) | Self::For(_))
    }
}

/// `;`
#[derive(Debug, Clone)]
pub struct EmptyStmt {
    /// Source location.
    pub loc: SourceLocation,
}

/// `{ stmts }`, or a single statement used as a body.
#[derive(Debug, Clone)]
pub struct BlockStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Statements in source order.
    pub body: Vec<Stmt>,
}

/// An expression evaluated for its value or side effects.
#[derive(Debug, Clone)]
pub struct ExprStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// The expression.
    pub expr: Expr,
}

/// Declaration keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    /// `var`: hoisted to the enclosing function.
    Var,
    /// `let`: block scoped.
    Let,
    /// `const`: block scoped, not reassignable.
    Const,
}

impl VarKind {
    /// The keyword as written in source.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Var => "var",
            Self::Let => "let",
            Self::Const => "const",
        }
    }
}

/// `let a = 1, b;`
#[derive(Debug, Clone)]
pub struct VarDecl {
    /// Source location.
    pub loc: SourceLocation,
    /// `var`, `let` or `const`.
    pub kind: VarKind,
    /// One entry per declared name.
    pub declarators: Vec<VarDeclarator>,
}

/// A single `name [= init]` inside a [`VarDecl`].
#[derive(Debug, Clone)]
pub struct VarDeclarator {
    /// The bound name.
    pub name: Ident,
    /// Initializer, if present.
    pub init: Option<Expr>,
}

/// `if (test) consequent [else alternate]`
#[derive(Debug, Clone)]
pub struct IfStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Condition.
    pub test: Expr,
    /// Taken when `test` is truthy.
    pub consequent: BlockStmt,
    /// `else` branch: a block, or a nested `if` for `else if`.
    pub alternate: Option<Box<Stmt>>,
}

/// `while (test) body`
#[derive(Debug, Clone)]
pub struct WhileStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Loop condition.
    pub test: Expr,
    /// Loop body.
    pub body: BlockStmt,
}

/// `do body while (test);`
#[derive(Debug, Clone)]
pub struct DoWhileStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Loop body.
    pub body: BlockStmt,
    /// Loop condition, checked after each iteration.
    pub test: Expr,
}

/// Initializer clause of a `for` loop.
#[derive(Debug, Clone)]
pub enum ForInit {
    /// `for (let i = 0; …)`
    Declaration(VarDecl),
    /// `for (i = 0; …)`
    Expr(Expr),
}

/// `for (init; test; update) body`
#[derive(Debug, Clone)]
pub struct ForStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Initializer.
    pub init: Option<ForInit>,
    /// Condition; absent means "always".
    pub test: Option<Expr>,
    /// Update expression.
    pub update: Option<Expr>,
    /// Loop body.
    pub body: BlockStmt,
}

/// `switch (discriminant) { … }`
#[derive(Debug, Clone)]
pub struct SwitchStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// The value compared against each case label.
    pub discriminant: Expr,
    /// Case clauses in source order.
    pub cases: Vec<SwitchCase>,
}

/// One clause of a `switch`: `case a: case b: body` or `default: body`.
#[derive(Debug, Clone)]
pub struct SwitchCase {
    /// Source location.
    pub loc: SourceLocation,
    /// Case labels sharing this body; empty for `default`.
    pub tests: Vec<Expr>,
    /// `true` for the `default:` clause.
    pub is_default: bool,
    /// Statements up to the next clause.
    pub body: BlockStmt,
}

/// `label: body`
#[derive(Debug, Clone)]
pub struct LabeledStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// The label.
    pub label: Ident,
    /// The labelled statement.
    pub body: Box<Stmt>,
}

/// `break [label];`
#[derive(Debug, Clone)]
pub struct BreakStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Target label, if any.
    pub label: Option<Ident>,
}

/// `continue [label];`
#[derive(Debug, Clone)]
pub struct ContinueStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Target label, if any.
    pub label: Option<Ident>,
}

/// `return [argument];`
#[derive(Debug, Clone)]
pub struct ReturnStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Returned value.
    pub argument: Option<Expr>,
}

/// `throw argument;`
#[derive(Debug, Clone)]
pub struct ThrowStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Thrown value.
    pub argument: Expr,
}

/// `try { } [catch [(param)] { }] [finally { }]`
#[derive(Debug, Clone)]
pub struct TryStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Protected block.
    pub block: BlockStmt,
    /// `catch` clause.
    pub handler: Option<CatchClause>,
    /// `finally` block.
    pub finalizer: Option<BlockStmt>,
}

/// `catch [(param)] { body }`
#[derive(Debug, Clone)]
pub struct CatchClause {
    /// Source location.
    pub loc: SourceLocation,
    /// Name bound to the caught value, if any.
    pub param: Option<Ident>,
    /// Handler body.
    pub body: BlockStmt,
}

/// `import "m";` / `import D, { a, b } from "m";`
#[derive(Debug, Clone)]
pub struct ImportDecl {
    /// Source location.
    pub loc: SourceLocation,
    /// Default import binding.
    pub default: Option<Ident>,
    /// Named imports.
    pub named: Vec<Ident>,
    /// Module specifier string.
    pub module: String,
}

/// The three forms of `export`.
#[derive(Debug, Clone)]
pub enum ExportDecl {
    /// `export default <stmt>`
    Default {
        /// Source location.
        loc: SourceLocation,
        /// The exported statement.
        body: Box<Stmt>,
    },
    /// `export { a, b };`
    Named {
        /// Source location.
        loc: SourceLocation,
        /// Exported names.
        names: Vec<Ident>,
    },
    /// `export <stmt>`
    Declaration {
        /// Source location.
        loc: SourceLocation,
        /// The exported declaration.
        body: Box<Stmt>,
    },
}

impl ExportDecl {
    /// Returns the source location of this export.
    pub fn loc(&self) -> &SourceLocation {
        match self {
            Self::Default { loc, .. } | Self::Named { loc, .. } | Self::Declaration { loc, .. } => {
                loc
            }
        }
    }
}

/// `debugger;`
#[derive(Debug, Clone)]
pub struct DebuggerStmt {
    /// Source location.
    pub loc: SourceLocation,
}

// ─────────────────────────────────────────────────────────────────────────────
// Literals
// ─────────────────────────────────────────────────────────────────────────────

/// Numeric literal, already converted to the working precision.
#[derive(Debug, Clone)]
pub struct NumLit {
    /// Source location.
    pub loc: SourceLocation,
    /// The value.
    pub value: Float,
}

/// String literal (escapes already decoded).
#[derive(Debug, Clone)]
pub struct StringLit {
    /// Source location.
    pub loc: SourceLocation,
    /// The decoded value.
    pub value: String,
}

/// `true` / `false`.
#[derive(Debug, Clone)]
pub struct BoolLit {
    /// Source location.
    pub loc: SourceLocation,
    /// The value.
    pub value: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────────────

/// An expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Numeric literal; also produced for `Infinity` and `NaN`.
    Number(NumLit),
    /// String literal.
    String(StringLit),
    /// Boolean literal.
    Bool(BoolLit),
    /// `null`
    Null(SourceLocation),
    /// `undefined`, also used for array holes.
    Undefined(SourceLocation),
    /// Identifier reference.
    Identifier(Ident),
    /// `[a, , ...b]`
    Array(ArrayExpr),
    /// `{ k: v, s, ...o }`
    Object(ObjectExpr),
    /// `...argument`
    Spread(SpreadElement),
    /// `function [name](params) { body }`
    Function(Rc<FunctionNode>),
    /// `this`
    This(SourceLocation),
    /// Binary, logical or comma expression.
    Binary(BinaryExpr),
    /// Prefix unary or prefix update expression.
    Unary(UnaryExpr),
    /// `target op= value`
    Assignment(AssignExpr),
    /// `test ? consequent : alternate`
    Ternary(TernaryExpr),
    /// `callee(args)`
    Call(CallExpr),
    /// `new callee(args)`
    New(CallExpr),
    /// `object[index]`
    Index(IndexExpr),
    /// `object.property`
    Member(MemberExpr),
    /// `argument++` / `argument--`
    Postfix(PostfixExpr),
    /// `await argument`
    Await(AwaitExpr),
}

impl Expr {
    /// Returns the source location of this expression.
    pub fn loc(&self) -> &SourceLocation {
        match self {
            Self::Number(e) => &e.loc,
            Self::String(e) => &e.loc,
            Self::Bool(e) => &e.loc,
            Self::Null(loc) | Self::Undefined(loc) | Self::This(loc) => loc,
            Self::Identifier(e) => &e.loc,
            Self::Array(e) => &e.loc,
            Self::Object(e) => &e.loc,
            Self::Spread(e) => &e.loc,
            Self::Function(f) => &f.loc,
            Self::Binary(e) => &e.loc,
            Self::Unary(e) => &e.loc,
            Self::Assignment(e) => &e.loc,
            Self::Ternary(e) => &e.loc,
            Self::Call(e) | Self::New(e) => &e.loc,
            Self::Index(e) => &e.loc,
            Self::Member(e) => &e.loc,
            Self::Postfix(e) => &e.loc,
            Self::Await(e) => &e.loc,
        }
    }
}

/// `[elements]`
#[derive(Debug, Clone)]
pub struct ArrayExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Elements; holes are [`Expr::Undefined`], spreads are [`Expr::Spread`].
    pub elements: Vec<Expr>,
}

/// `{ properties }`
#[derive(Debug, Clone)]
pub struct ObjectExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Properties in source order.
    pub properties: Vec<Property>,
}

/// One entry of an object literal.
#[derive(Debug, Clone)]
pub struct Property {
    /// Key; `None` for a `...spread` entry.
    pub key: Option<String>,
    /// Value expression (an [`Expr::Spread`] when `key` is `None`).
    pub value: Expr,
}

/// `...argument`
#[derive(Debug, Clone)]
pub struct SpreadElement {
    /// Source location.
    pub loc: SourceLocation,
    /// The spread operand.
    pub argument: Box<Expr>,
}

/// Binary operators, including the logical and comma operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `,`
    Comma,
    /// `||`
    LogicalOr,
    /// `&&`
    LogicalAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `&`
    BitAnd,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `**`
    Exp,
}

impl BinaryOp {
    /// The operator as written in source.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Comma => ",",
            Self::LogicalOr => "||",
            Self::LogicalAnd => "&&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::BitAnd => "&",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Exp => "**",
        }
    }
}

/// `left op right`
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    /// Source location of the operator.
    pub loc: SourceLocation,
    /// The operator.
    pub op: BinaryOp,
    /// Left operand.
    pub left: Box<Expr>,
    /// Right operand.
    pub right: Box<Expr>,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `~`
    BitNot,
    /// `++x`
    Increment,
    /// `--x`
    Decrement,
    /// `typeof`
    Typeof,
    /// `delete`
    Delete,
    /// `void`
    Void,
}

impl UnaryOp {
    /// The operator as written in source.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::BitNot => "~",
            Self::Increment => "++",
            Self::Decrement => "--",
            Self::Typeof => "typeof",
            Self::Delete => "delete",
            Self::Void => "void",
        }
    }
}

/// `op argument`
#[derive(Debug, Clone)]
pub struct UnaryExpr {
    /// Source location of the operator.
    pub loc: SourceLocation,
    /// The operator.
    pub op: UnaryOp,
    /// The operand.
    pub argument: Box<Expr>,
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    Add,
    /// `-=`
    Sub,
    /// `*=`
    Mul,
    /// `/=`
    Div,
    /// `%=`
    Rem,
    /// `**=`
    Exp,
    /// `&=`
    BitAnd,
    /// `|=`
    BitOr,
    /// `^=`
    BitXor,
    /// `<<=`
    Shl,
    /// `>>=`
    Shr,
    /// `&&=`
    LogicalAnd,
    /// `||=`
    LogicalOr,
}

impl AssignOp {
    /// The operator as written in source.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Add => "+=",
            Self::Sub => "-=",
            Self::Mul => "*=",
            Self::Div => "/=",
            Self::Rem => "%=",
            Self::Exp => "**=",
            Self::BitAnd => "&=",
            Self::BitOr => "|=",
            Self::BitXor => "^=",
            Self::Shl => "<<=",
            Self::Shr => ">>=",
            Self::LogicalAnd => "&&=",
            Self::LogicalOr => "||=",
        }
    }

    /// The binary operator a compound assignment applies, if any.
    pub fn binary_op(self) -> Option<BinaryOp> {
        let op = match self {
            Self::Assign => return None,
            Self::Add => BinaryOp::Add,
            Self::Sub => BinaryOp::Sub,
            Self::Mul => BinaryOp::Mul,
            Self::Div => BinaryOp::Div,
            Self::Rem => BinaryOp::Rem,
            Self::Exp => BinaryOp::Exp,
            Self::BitAnd => BinaryOp::BitAnd,
            Self::BitOr => BinaryOp::BitOr,
            Self::BitXor => BinaryOp::BitXor,
            Self::Shl => BinaryOp::Shl,
            Self::Shr => BinaryOp::Shr,
            Self::LogicalAnd => BinaryOp::LogicalAnd,
            Self::LogicalOr => BinaryOp::LogicalOr,
        };
        Some(op)
    }
}

/// `target op value`
#[derive(Debug, Clone)]
pub struct AssignExpr {
    /// Source location of the operator.
    pub loc: SourceLocation,
    /// The operator.
    pub op: AssignOp,
    /// Assigned place; validity is checked at evaluation time.
    pub target: Box<Expr>,
    /// Right-hand side.
    pub value: Box<Expr>,
}

/// `test ? consequent : alternate`
#[derive(Debug, Clone)]
pub struct TernaryExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Condition.
    pub test: Box<Expr>,
    /// Value when truthy.
    pub consequent: Box<Expr>,
    /// Value when falsy.
    pub alternate: Box<Expr>,
}

/// `callee(arguments)`, also used for `new callee(arguments)`.
#[derive(Debug, Clone)]
pub struct CallExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The called expression.
    pub callee: Box<Expr>,
    /// Arguments; may contain [`Expr::Spread`].
    pub arguments: Vec<Expr>,
}

/// `object[index]`
#[derive(Debug, Clone)]
pub struct IndexExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Indexed value.
    pub object: Box<Expr>,
    /// Index expression.
    pub index: Box<Expr>,
}

/// `object.property`
#[derive(Debug, Clone)]
pub struct MemberExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Accessed value.
    pub object: Box<Expr>,
    /// Property name.
    pub property: Ident,
}

/// Postfix update operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    /// `++`
    Increment,
    /// `--`
    Decrement,
}

impl UpdateOp {
    /// The operator as written in source.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Increment => "++",
            Self::Decrement => "--",
        }
    }
}

/// `argument++` / `argument--`
#[derive(Debug, Clone)]
pub struct PostfixExpr {
    /// Source location of the operator.
    pub loc: SourceLocation,
    /// The operator.
    pub op: UpdateOp,
    /// The updated place.
    pub argument: Box<Expr>,
}

/// `await argument`
#[derive(Debug, Clone)]
pub struct AwaitExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Awaited expression.
    pub argument: Box<Expr>,
}
