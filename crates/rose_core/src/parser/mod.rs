//! Rose parser infrastructure.
//!
//! - [`scanner`]: lexer that converts raw source text into a stream of
//!   [`scanner::Token`]s.
//! - [`ast`]: Abstract Syntax Tree node definitions.
//! - [`printer`]: source regeneration and indented tree dumps.
//! - [`sema`]: static checks over a parsed [`ast::Program`].
//!
//! The parser itself lives in this module: a recursive-descent statement
//! parser with one function per precedence level for expressions.  It stops
//! at the first syntax error.

/// Rose Abstract Syntax Tree node types.
pub mod ast;
/// Source printer and AST dump.
pub mod printer;
/// Rose lexer.
pub mod scanner;
/// Semantic analysis.
pub mod sema;

use std::rc::Rc;
use std::sync::Arc;

use crate::error::{Diagnostic, RoseError, RoseResult};
use crate::number;
use crate::stack::ensure_sufficient_stack;
use ast::*;
use scanner::{Location, Scanner, Token, TokenKind};

// ─────────────────────────────────────────────────────────────────────────────
// Entry points
// ─────────────────────────────────────────────────────────────────────────────

/// Parses a complete token stream (as returned by
/// [`Scanner::tokenize_all`]) into a [`Program`].
///
/// # Example
///
/// ```
/// use rose_core::parser::{parse, scanner::Scanner};
///
/// let tokens = Scanner::tokenize_all("let x = 1 + 2;", "<input>").unwrap();
/// let program = parse(tokens).unwrap();
/// assert_eq!(program.body.len(), 1);
/// ```
pub fn parse(tokens: Vec<Token>) -> RoseResult<Program> {
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program()?;
    tracing::debug!(statements = program.body.len(), "parsed program");
    Ok(program)
}

/// Lexes and parses `source` in one step.
pub fn parse_source(source: &str, file: impl Into<Arc<str>>) -> RoseResult<Program> {
    parse(Scanner::tokenize_all(source, file)?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Parser state
// ─────────────────────────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Binary operator table for one precedence level.
type BinaryLevel = &'static [(TokenKind, BinaryOp)];

const LOGICAL_OR: BinaryLevel = &[(TokenKind::LogicalOr, BinaryOp::LogicalOr)];
const LOGICAL_AND: BinaryLevel = &[(TokenKind::LogicalAnd, BinaryOp::LogicalAnd)];
const BIT_OR: BinaryLevel = &[(TokenKind::Pipe, BinaryOp::BitOr)];
const BIT_XOR: BinaryLevel = &[(TokenKind::Caret, BinaryOp::BitXor)];
const BIT_AND: BinaryLevel = &[(TokenKind::Ampersand, BinaryOp::BitAnd)];
const EQUALITY: BinaryLevel = &[
    (TokenKind::EqualEqual, BinaryOp::Eq),
    (TokenKind::BangEqual, BinaryOp::NotEq),
];
const RELATIONAL: BinaryLevel = &[
    (TokenKind::Less, BinaryOp::Lt),
    (TokenKind::LessEqual, BinaryOp::LtEq),
    (TokenKind::Greater, BinaryOp::Gt),
    (TokenKind::GreaterEqual, BinaryOp::GtEq),
];
const SHIFT: BinaryLevel = &[
    (TokenKind::LeftShift, BinaryOp::Shl),
    (TokenKind::RightShift, BinaryOp::Shr),
];
const ADDITIVE: BinaryLevel = &[
    (TokenKind::Plus, BinaryOp::Add),
    (TokenKind::Minus, BinaryOp::Sub),
];
const MULTIPLICATIVE: BinaryLevel = &[
    (TokenKind::Star, BinaryOp::Mul),
    (TokenKind::Slash, BinaryOp::Div),
    (TokenKind::Percent, BinaryOp::Rem),
];

impl Parser {
    fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let loc = tokens.last().map(|t| t.loc.clone()).unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: "EOF".to_owned(),
                loc,
            });
        }
        Self { tokens, pos: 0 }
    }

    // ── Token helpers ────────────────────────────────────────────────────────

    /// The current token.  The stream always ends in `Eof`, which is never
    /// consumed, so this cannot run past the end.
    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    /// Kind of the token `n` positions after the current one.
    fn peek_kind(&self, n: usize) -> TokenKind {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        self.tokens[idx].kind
    }

    fn loc(&self) -> Location {
        self.current().loc.clone()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    /// Consumes the current token if it has the given kind.
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes a token of kind `kind` or fails with
    /// `Expected <what>, got '<text>'`.
    fn expect(&mut self, kind: TokenKind, what: &str) -> RoseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn error(&self, message: impl Into<String>) -> RoseError {
        RoseError::Syntax(Diagnostic::new(self.loc(), message))
    }

    fn unexpected(&self, what: &str) -> RoseError {
        self.error(format!("Expected {what}, got '{}'", self.current().text))
    }

    fn identifier(&mut self, what: &str) -> RoseResult<Ident> {
        let tok = self.expect(TokenKind::Identifier, what)?;
        Ok(Ident {
            loc: tok.loc,
            name: tok.text,
        })
    }

    // ── Statements ───────────────────────────────────────────────────────────

    fn parse_program(&mut self) -> RoseResult<Program> {
        let loc = self.loc();
        let mut body = Vec::new();
        while !self.check(TokenKind::Eof) {
            body.push(self.parse_statement()?);
        }
        Ok(Program { loc, body })
    }

    fn parse_statement(&mut self) -> RoseResult<Stmt> {
        ensure_sufficient_stack(|| self.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> RoseResult<Stmt> {
        let loc = self.loc();
        if self.eat(TokenKind::Semicolon) {
            return Ok(Stmt::Empty(EmptyStmt { loc }));
        }
        if self.check(TokenKind::Identifier) && self.peek_kind(1) == TokenKind::Colon {
            return self.parse_label();
        }
        match self.kind() {
            TokenKind::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::If => Ok(Stmt::If(self.parse_if()?)),
            TokenKind::Async | TokenKind::Function => Ok(Stmt::Function(self.parse_function()?)),
            TokenKind::Let | TokenKind::Const | TokenKind::Var => {
                Ok(Stmt::Declaration(self.parse_declaration()?))
            }
            TokenKind::Import => self.parse_import(),
            TokenKind::Export => self.parse_export(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => self.parse_break(),
            TokenKind::Continue => self.parse_continue(),
            TokenKind::Throw => self.parse_throw(),
            TokenKind::Debugger => {
                self.advance();
                self.expect(TokenKind::Semicolon, "';' after 'debugger'")?;
                Ok(Stmt::Debugger(DebuggerStmt { loc }))
            }
            _ => {
                let expr = self.parse_comma()?;
                self.expect(TokenKind::Semicolon, "';' after expression")?;
                Ok(Stmt::Expr(ExprStmt { loc, expr }))
            }
        }
    }

    /// `{ stmt* }`, or a single statement wrapped in a block.
    fn parse_block(&mut self) -> RoseResult<BlockStmt> {
        let loc = self.loc();
        if !self.eat(TokenKind::LeftBrace) {
            let stmt = self.parse_statement()?;
            return Ok(BlockStmt {
                loc,
                body: vec![stmt],
            });
        }
        let mut body = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            body.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RightBrace, "'}' to end block")?;
        Ok(BlockStmt { loc, body })
    }

    fn parse_label(&mut self) -> RoseResult<Stmt> {
        let label = self.identifier("label")?;
        self.advance(); // :
        let body = self.parse_statement()?;
        Ok(Stmt::Label(LabeledStmt {
            loc: label.loc.clone(),
            label,
            body: Box::new(body),
        }))
    }

    /// `( expr )` following a keyword.
    fn parse_condition(&mut self, keyword: &str) -> RoseResult<Expr> {
        self.expect(TokenKind::LeftParen, &format!("'(' after '{keyword}'"))?;
        let test = self.parse_comma()?;
        self.expect(TokenKind::RightParen, &format!("')' after '{keyword}' condition"))?;
        Ok(test)
    }

    fn parse_if(&mut self) -> RoseResult<IfStmt> {
        let loc = self.expect(TokenKind::If, "'if'")?.loc;
        let test = self.parse_condition("if")?;
        let consequent = self.parse_block()?;
        let alternate = if self.eat(TokenKind::Else) {
            let stmt = if self.check(TokenKind::If) {
                Stmt::If(self.parse_if()?)
            } else {
                Stmt::Block(self.parse_block()?)
            };
            Some(Box::new(stmt))
        } else {
            None
        };
        Ok(IfStmt {
            loc,
            test,
            consequent,
            alternate,
        })
    }

    fn parse_while(&mut self) -> RoseResult<Stmt> {
        let loc = self.advance().loc;
        let test = self.parse_condition("while")?;
        let body = self.parse_block()?;
        Ok(Stmt::While(WhileStmt { loc, test, body }))
    }

    fn parse_do_while(&mut self) -> RoseResult<Stmt> {
        let loc = self.advance().loc;
        let body = self.parse_block()?;
        self.expect(TokenKind::While, "'while' after 'do' block")?;
        let test = self.parse_condition("while")?;
        self.expect(TokenKind::Semicolon, "';' after 'do-while'")?;
        Ok(Stmt::DoWhile(DoWhileStmt { loc, body, test }))
    }

    fn parse_for(&mut self) -> RoseResult<Stmt> {
        let loc = self.advance().loc;
        self.expect(TokenKind::LeftParen, "'(' after 'for'")?;

        let init = match self.kind() {
            // The declaration consumes its own `;`.
            TokenKind::Let | TokenKind::Const | TokenKind::Var => {
                Some(ForInit::Declaration(self.parse_declaration()?))
            }
            TokenKind::Semicolon => {
                self.advance();
                None
            }
            _ => {
                let expr = self.parse_comma()?;
                self.expect(TokenKind::Semicolon, "';' after for-loop initializer")?;
                Some(ForInit::Expr(expr))
            }
        };

        let test = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_comma()?)
        };
        self.expect(TokenKind::Semicolon, "';' after for-loop condition")?;

        let update = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_comma()?)
        };
        self.expect(TokenKind::RightParen, "')' after for-loop")?;

        let body = self.parse_block()?;
        Ok(Stmt::For(ForStmt {
            loc,
            init,
            test,
            update,
            body,
        }))
    }

    fn parse_switch(&mut self) -> RoseResult<Stmt> {
        let loc = self.advance().loc;
        self.expect(TokenKind::LeftParen, "'(' after 'switch'")?;
        let discriminant = self.parse_comma()?;
        self.expect(TokenKind::RightParen, "')' after switch expression")?;
        self.expect(TokenKind::LeftBrace, "'{' after switch expression")?;

        let mut cases = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            let case_loc = self.loc();
            let mut tests = Vec::new();
            let is_default = match self.kind() {
                TokenKind::Case => {
                    while self.eat(TokenKind::Case) {
                        tests.push(self.parse_comma()?);
                        self.expect(TokenKind::Colon, "':' after case expression")?;
                    }
                    false
                }
                TokenKind::Default => {
                    self.advance();
                    self.expect(TokenKind::Colon, "':' after 'default'")?;
                    true
                }
                _ => return Err(self.unexpected("'case' or 'default'")),
            };

            let body_loc = self.loc();
            let mut body = Vec::new();
            while !matches!(
                self.kind(),
                TokenKind::Case | TokenKind::Default | TokenKind::RightBrace | TokenKind::Eof
            ) {
                body.push(self.parse_statement()?);
            }
            cases.push(SwitchCase {
                loc: case_loc,
                tests,
                is_default,
                body: BlockStmt {
                    loc: body_loc,
                    body,
                },
            });
        }
        self.expect(TokenKind::RightBrace, "'}' to close switch")?;

        Ok(Stmt::Switch(SwitchStmt {
            loc,
            discriminant,
            cases,
        }))
    }

    fn parse_function(&mut self) -> RoseResult<Rc<FunctionNode>> {
        let loc = self.loc();
        let is_async = self.eat(TokenKind::Async);
        self.expect(TokenKind::Function, "'function'")?;

        let name = if self.check(TokenKind::Identifier) {
            Some(self.identifier("function name")?)
        } else {
            None
        };

        self.expect(TokenKind::LeftParen, "'(' after function name")?;
        let params = self.parse_params()?;
        self.expect(TokenKind::RightParen, "')' after parameters")?;

        let body = self.parse_block()?;
        Ok(Rc::new(FunctionNode {
            loc,
            name,
            params,
            is_async,
            body,
        }))
    }

    fn parse_params(&mut self) -> RoseResult<Vec<Param>> {
        let mut params: Vec<Param> = Vec::new();
        if self.check(TokenKind::RightParen) {
            return Ok(params);
        }
        loop {
            if params.last().is_some_and(|p| p.is_rest) {
                return Err(self.error("Rest parameter must be last formal parameter"));
            }
            let is_rest = self.eat(TokenKind::Ellipsis);
            let name = self.identifier("parameter name")?;
            let default = if self.check(TokenKind::Equal) {
                if is_rest {
                    return Err(self.error("Rest parameter cannot have a default value."));
                }
                self.advance();
                Some(self.parse_assignment()?)
            } else {
                None
            };
            params.push(Param {
                loc: name.loc,
                name: name.name,
                default,
                is_rest,
            });
            if !self.eat(TokenKind::Comma) {
                return Ok(params);
            }
        }
    }

    fn parse_declaration(&mut self) -> RoseResult<VarDecl> {
        let tok = self.advance();
        let kind = match tok.kind {
            TokenKind::Let => VarKind::Let,
            TokenKind::Const => VarKind::Const,
            TokenKind::Var => VarKind::Var,
            _ => {
                return Err(RoseError::Syntax(Diagnostic::new(
                    tok.loc,
                    format!("Expected 'let', 'const' or 'var', got '{}'", tok.text),
                )));
            }
        };

        let mut declarators = Vec::new();
        loop {
            let name = self.identifier(&format!("identifier after '{}'", tok.text))?;
            let init = if self.eat(TokenKind::Equal) {
                Some(self.parse_assignment()?)
            } else if kind == VarKind::Const {
                return Err(self.error(format!(
                    "Missing initializer in const declaration '{}'",
                    name.name
                )));
            } else {
                None
            };
            declarators.push(VarDeclarator { name, init });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Semicolon, "';' or ',' after variable declaration")?;

        Ok(VarDecl {
            loc: tok.loc,
            kind,
            declarators,
        })
    }

    fn parse_import(&mut self) -> RoseResult<Stmt> {
        let loc = self.advance().loc;
        let mut default = None;
        let mut named = Vec::new();

        if !self.check(TokenKind::StringLiteral) {
            if self.check(TokenKind::Identifier) {
                default = Some(self.identifier("import name")?);
                if self.eat(TokenKind::Comma) && !self.check(TokenKind::LeftBrace) {
                    return Err(self.unexpected("'{' after ',' in import statement"));
                }
            }
            if self.eat(TokenKind::LeftBrace) {
                while !self.check(TokenKind::RightBrace) {
                    named.push(self.identifier("identifier in named imports")?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RightBrace, "'}' after named imports")?;
            }
            if default.is_none() && named.is_empty() {
                return Err(self.unexpected("module name, import name or '{'"));
            }
            self.expect(TokenKind::From, "'from' keyword in import statement")?;
        }

        let module = self
            .expect(TokenKind::StringLiteral, "module string")?
            .text;
        self.eat(TokenKind::Semicolon);

        Ok(Stmt::Import(ImportDecl {
            loc,
            default,
            named,
            module,
        }))
    }

    fn parse_export(&mut self) -> RoseResult<Stmt> {
        let loc = self.advance().loc;
        let decl = if self.eat(TokenKind::Default) {
            ExportDecl::Default {
                loc,
                body: Box::new(self.parse_statement()?),
            }
        } else if self.eat(TokenKind::LeftBrace) {
            let mut names = Vec::new();
            while !self.check(TokenKind::RightBrace) {
                names.push(self.identifier("identifier in export list")?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RightBrace, "'}' after export list")?;
            self.expect(TokenKind::Semicolon, "';' after export list")?;
            ExportDecl::Named { loc, names }
        } else {
            ExportDecl::Declaration {
                loc,
                body: Box::new(self.parse_statement()?),
            }
        };
        Ok(Stmt::Export(decl))
    }

    fn parse_try(&mut self) -> RoseResult<Stmt> {
        let loc = self.advance().loc;
        if !self.check(TokenKind::LeftBrace) {
            return Err(self.unexpected("'{' after 'try'"));
        }
        let block = self.parse_block()?;

        let handler = if self.check(TokenKind::Catch) {
            let catch_loc = self.advance().loc;
            let param = if self.eat(TokenKind::LeftParen) {
                let name = self.identifier("identifier after 'catch('")?;
                self.expect(TokenKind::RightParen, "')' after catch parameter")?;
                Some(name)
            } else {
                None
            };
            if !self.check(TokenKind::LeftBrace) {
                return Err(self.unexpected("'{' after 'catch'"));
            }
            Some(CatchClause {
                loc: catch_loc,
                param,
                body: self.parse_block()?,
            })
        } else {
            None
        };

        let finalizer = if self.eat(TokenKind::Finally) {
            if !self.check(TokenKind::LeftBrace) {
                return Err(self.unexpected("'{' after 'finally'"));
            }
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("'try' must have at least a 'catch' or 'finally'"));
        }
        Ok(Stmt::Try(TryStmt {
            loc,
            block,
            handler,
            finalizer,
        }))
    }

    fn parse_return(&mut self) -> RoseResult<Stmt> {
        let loc = self.advance().loc;
        let argument = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_comma()?)
        };
        self.expect(TokenKind::Semicolon, "';' after return value")?;
        Ok(Stmt::Return(ReturnStmt { loc, argument }))
    }

    fn optional_label(&mut self) -> RoseResult<Option<Ident>> {
        if self.check(TokenKind::Identifier) {
            Ok(Some(self.identifier("label")?))
        } else {
            Ok(None)
        }
    }

    fn parse_break(&mut self) -> RoseResult<Stmt> {
        let loc = self.advance().loc;
        let label = self.optional_label()?;
        self.expect(TokenKind::Semicolon, "';' after break")?;
        Ok(Stmt::Break(BreakStmt { loc, label }))
    }

    fn parse_continue(&mut self) -> RoseResult<Stmt> {
        let loc = self.advance().loc;
        let label = self.optional_label()?;
        self.expect(TokenKind::Semicolon, "';' after continue")?;
        Ok(Stmt::Continue(ContinueStmt { loc, label }))
    }

    fn parse_throw(&mut self) -> RoseResult<Stmt> {
        let loc = self.advance().loc;
        if self.check(TokenKind::Semicolon) {
            return Err(self.error("'throw' must have an expression"));
        }
        let argument = self.parse_comma()?;
        self.expect(TokenKind::Semicolon, "';' after throw expression")?;
        Ok(Stmt::Throw(ThrowStmt { loc, argument }))
    }

    // ── Expressions ──────────────────────────────────────────────────────────

    /// `expr (, expr)*`
    fn parse_comma(&mut self) -> RoseResult<Expr> {
        let mut left = self.parse_assignment()?;
        while self.check(TokenKind::Comma) {
            let loc = self.advance().loc;
            let right = self.parse_assignment()?;
            left = binary(loc, BinaryOp::Comma, left, right);
        }
        Ok(left)
    }

    /// Right-associative assignment.  Any expression is accepted as the
    /// target; invalid targets are rejected during evaluation.
    fn parse_assignment(&mut self) -> RoseResult<Expr> {
        ensure_sufficient_stack(|| self.parse_assignment_inner())
    }

    fn parse_assignment_inner(&mut self) -> RoseResult<Expr> {
        let target = self.parse_ternary()?;
        let Some(op) = assign_op(self.kind()) else {
            return Ok(target);
        };
        let loc = self.advance().loc;
        let value = self.parse_assignment()?;
        Ok(Expr::Assignment(AssignExpr {
            loc,
            op,
            target: Box::new(target),
            value: Box::new(value),
        }))
    }

    fn parse_ternary(&mut self) -> RoseResult<Expr> {
        let test = self.parse_binary(0)?;
        if !self.check(TokenKind::Question) {
            return Ok(test);
        }
        let loc = self.advance().loc;
        let consequent = self.parse_assignment()?;
        self.expect(TokenKind::Colon, "':' in ternary expression")?;
        let alternate = self.parse_assignment()?;
        Ok(Expr::Ternary(TernaryExpr {
            loc,
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }))
    }

    /// Left-associative binary levels, from `||` (level 0) down to the
    /// multiplicative operators.
    fn parse_binary(&mut self, level: usize) -> RoseResult<Expr> {
        const LEVELS: [BinaryLevel; 10] = [
            LOGICAL_OR,
            LOGICAL_AND,
            BIT_OR,
            BIT_XOR,
            BIT_AND,
            EQUALITY,
            RELATIONAL,
            SHIFT,
            ADDITIVE,
            MULTIPLICATIVE,
        ];
        let Some(ops) = LEVELS.get(level) else {
            return self.parse_exponent();
        };

        let mut left = self.parse_binary(level + 1)?;
        while let Some(&(_, op)) = ops.iter().find(|(kind, _)| *kind == self.kind()) {
            let loc = self.advance().loc;
            let right = self.parse_binary(level + 1)?;
            left = binary(loc, op, left, right);
        }
        Ok(left)
    }

    /// `**` is right-associative.
    fn parse_exponent(&mut self) -> RoseResult<Expr> {
        let left = self.parse_unary()?;
        if !self.check(TokenKind::StarStar) {
            return Ok(left);
        }
        let loc = self.advance().loc;
        let right = self.parse_exponent()?;
        Ok(binary(loc, BinaryOp::Exp, left, right))
    }

    fn parse_unary(&mut self) -> RoseResult<Expr> {
        ensure_sufficient_stack(|| self.parse_unary_inner())
    }

    fn parse_unary_inner(&mut self) -> RoseResult<Expr> {
        if self.check(TokenKind::Await) {
            let loc = self.advance().loc;
            let argument = self.parse_unary()?;
            return Ok(Expr::Await(AwaitExpr {
                loc,
                argument: Box::new(argument),
            }));
        }

        let op = match self.kind() {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Minus,
            TokenKind::Tilde => UnaryOp::BitNot,
            TokenKind::PlusPlus => UnaryOp::Increment,
            TokenKind::MinusMinus => UnaryOp::Decrement,
            TokenKind::Typeof => UnaryOp::Typeof,
            TokenKind::Delete => UnaryOp::Delete,
            TokenKind::Void => UnaryOp::Void,
            _ => return self.parse_postfix(),
        };
        let loc = self.advance().loc;
        let argument = self.parse_unary()?;
        Ok(Expr::Unary(UnaryExpr {
            loc,
            op,
            argument: Box::new(argument),
        }))
    }

    /// Calls, indexing, member access and postfix `++`/`--`.
    fn parse_postfix(&mut self) -> RoseResult<Expr> {
        let mut expr = if self.check(TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        loop {
            expr = match self.kind() {
                TokenKind::LeftParen => {
                    let loc = self.advance().loc;
                    let arguments = self.parse_arguments()?;
                    Expr::Call(CallExpr {
                        loc,
                        callee: Box::new(expr),
                        arguments,
                    })
                }
                TokenKind::LeftBracket | TokenKind::Dot => self.parse_access(expr)?,
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let tok = self.advance();
                    let op = if tok.kind == TokenKind::PlusPlus {
                        UpdateOp::Increment
                    } else {
                        UpdateOp::Decrement
                    };
                    Expr::Postfix(PostfixExpr {
                        loc: tok.loc,
                        op,
                        argument: Box::new(expr),
                    })
                }
                _ => return Ok(expr),
            };
        }
    }

    /// `[index]` or `.name` applied to `object`.
    fn parse_access(&mut self, object: Expr) -> RoseResult<Expr> {
        let tok = self.advance();
        if tok.kind == TokenKind::LeftBracket {
            let index = self.parse_comma()?;
            self.expect(TokenKind::RightBracket, "']' after array index")?;
            return Ok(Expr::Index(IndexExpr {
                loc: tok.loc,
                object: Box::new(object),
                index: Box::new(index),
            }));
        }

        // Keywords are valid property names after `.`.
        let kind = self.kind();
        if kind != TokenKind::Identifier && !kind.is_keyword() {
            return Err(self.unexpected("identifier after '.'"));
        }
        let name = self.advance();
        Ok(Expr::Member(MemberExpr {
            loc: tok.loc,
            object: Box::new(object),
            property: Ident {
                loc: name.loc,
                name: name.text,
            },
        }))
    }

    /// `new Callee[.member|[index]]* [(args)]`
    fn parse_new(&mut self) -> RoseResult<Expr> {
        let loc = self.advance().loc;
        let mut callee = if self.check(TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        while matches!(self.kind(), TokenKind::LeftBracket | TokenKind::Dot) {
            callee = self.parse_access(callee)?;
        }
        let arguments = if self.eat(TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expr::New(CallExpr {
            loc,
            callee: Box::new(callee),
            arguments,
        }))
    }

    /// Argument list after `(`, including the closing `)`.
    fn parse_arguments(&mut self) -> RoseResult<Vec<Expr>> {
        let mut arguments = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                arguments.push(self.parse_element()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, "',' or ')' after function argument")?;
        Ok(arguments)
    }

    /// An assignment expression, or `...expr` in array and argument lists.
    fn parse_element(&mut self) -> RoseResult<Expr> {
        if self.check(TokenKind::Ellipsis) {
            self.parse_spread()
        } else {
            self.parse_assignment()
        }
    }

    fn parse_spread(&mut self) -> RoseResult<Expr> {
        let loc = self.advance().loc;
        let argument = self.parse_assignment()?;
        Ok(Expr::Spread(SpreadElement {
            loc,
            argument: Box::new(argument),
        }))
    }

    fn parse_primary(&mut self) -> RoseResult<Expr> {
        let loc = self.loc();
        match self.kind() {
            TokenKind::NumberLiteral => {
                let tok = self.advance();
                let value = number::parse_literal(&tok.text).ok_or_else(|| {
                    RoseError::Syntax(Diagnostic::new(
                        tok.loc.clone(),
                        format!("Invalid number literal '{}'", tok.text),
                    ))
                })?;
                Ok(Expr::Number(NumLit { loc, value }))
            }
            TokenKind::StringLiteral => Ok(Expr::String(StringLit {
                loc,
                value: self.advance().text,
            })),
            TokenKind::BoolLiteral => Ok(Expr::Bool(BoolLit {
                loc,
                value: self.advance().text == "true",
            })),
            TokenKind::Identifier => {
                let name = self.advance().text;
                Ok(match name.as_str() {
                    "Infinity" => Expr::Number(NumLit {
                        loc,
                        value: number::infinity(),
                    }),
                    "NaN" => Expr::Number(NumLit {
                        loc,
                        value: number::nan(),
                    }),
                    _ => Expr::Identifier(Ident { loc, name }),
                })
            }
            TokenKind::Async | TokenKind::Function => Ok(Expr::Function(self.parse_function()?)),
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Null(loc))
            }
            TokenKind::Undefined => {
                self.advance();
                Ok(Expr::Undefined(loc))
            }
            TokenKind::This => {
                self.advance();
                Ok(Expr::This(loc))
            }
            TokenKind::Ellipsis => self.parse_spread(),
            TokenKind::LeftBracket => self.parse_array(),
            TokenKind::LeftBrace => self.parse_object(),
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_comma()?;
                self.expect(TokenKind::RightParen, "')' after expression")?;
                Ok(expr)
            }
            _ => Err(self.unexpected("primary expression")),
        }
    }

    /// `[a, , ...b,]`: holes become `undefined`, a trailing comma is
    /// allowed.
    fn parse_array(&mut self) -> RoseResult<Expr> {
        let loc = self.advance().loc;
        let mut elements = Vec::new();
        while !self.check(TokenKind::RightBracket) {
            if self.check(TokenKind::Comma) {
                elements.push(Expr::Undefined(self.loc()));
            } else {
                elements.push(self.parse_element()?);
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightBracket, "',' or ']' after array element")?;
        Ok(Expr::Array(ArrayExpr { loc, elements }))
    }

    /// `{ key: value, shorthand, "string": value, ...spread }`
    fn parse_object(&mut self) -> RoseResult<Expr> {
        let loc = self.advance().loc;
        let mut properties = Vec::new();
        while !self.check(TokenKind::RightBrace) {
            if self.check(TokenKind::Ellipsis) {
                properties.push(Property {
                    key: None,
                    value: self.parse_spread()?,
                });
            } else {
                let kind = self.kind();
                if !matches!(kind, TokenKind::Identifier | TokenKind::StringLiteral)
                    && !kind.is_keyword()
                {
                    return Err(self.unexpected("identifier or string literal for object key"));
                }
                let key = self.advance();
                let value = if self.eat(TokenKind::Colon) {
                    self.parse_assignment()?
                } else if key.kind == TokenKind::Identifier
                    && matches!(self.kind(), TokenKind::Comma | TokenKind::RightBrace)
                {
                    Expr::Identifier(Ident {
                        loc: key.loc,
                        name: key.text.clone(),
                    })
                } else {
                    return Err(self.unexpected("':' after object key"));
                };
                properties.push(Property {
                    key: Some(key.text),
                    value,
                });
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightBrace, "',' or '}' after object entry")?;
        Ok(Expr::Object(ObjectExpr { loc, properties }))
    }
}

fn binary(loc: Location, op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary(BinaryExpr {
        loc,
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Equal => AssignOp::Assign,
        TokenKind::PlusEqual => AssignOp::Add,
        TokenKind::MinusEqual => AssignOp::Sub,
        TokenKind::StarEqual => AssignOp::Mul,
        TokenKind::SlashEqual => AssignOp::Div,
        TokenKind::PercentEqual => AssignOp::Rem,
        TokenKind::StarStarEqual => AssignOp::Exp,
        TokenKind::AmpersandEqual => AssignOp::BitAnd,
        TokenKind::PipeEqual => AssignOp::BitOr,
        TokenKind::CaretEqual => AssignOp::BitXor,
        TokenKind::LeftShiftEqual => AssignOp::Shl,
        TokenKind::RightShiftEqual => AssignOp::Shr,
        TokenKind::LogicalAndEqual => AssignOp::LogicalAnd,
        TokenKind::LogicalOrEqual => AssignOp::LogicalOr,
        _ => return None,
    };
    Some(op)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Program {
        parse_source(src, "test.rose").unwrap()
    }

    fn parse_err(src: &str) -> String {
        match parse_source(src, "test.rose") {
            Err(RoseError::Syntax(d)) => d.message,
            other => panic!("expected a syntax error, got {other:?}"),
        }
    }

    fn expr_of(src: &str) -> Expr {
        let program = parse_ok(src);
        match program.body.into_iter().next() {
            Some(Stmt::Expr(s)) => s.expr,
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    fn binary_op(expr: &Expr) -> BinaryOp {
        match expr {
            Expr::Binary(b) => b.op,
            other => panic!("expected a binary expression, got {other:?}"),
        }
    }

    #[test]
    fn test_declarations_and_exponent_program() {
        let program = parse_ok("let x = 2; let y = 3; x ** y;");
        assert_eq!(program.body.len(), 3);
        assert!(matches!(program.body[0], Stmt::Declaration(ref d) if d.kind == VarKind::Let));
        assert!(matches!(program.body[1], Stmt::Declaration(_)));
        match &program.body[2] {
            Stmt::Expr(s) => assert_eq!(binary_op(&s.expr), BinaryOp::Exp),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_while_with_break() {
        let program = parse_ok("while (true) { break; }");
        let Stmt::While(w) = &program.body[0] else {
            panic!("expected while");
        };
        assert!(matches!(w.test, Expr::Bool(BoolLit { value: true, .. })));
        assert_eq!(w.body.body.len(), 1);
        assert!(matches!(w.body.body[0], Stmt::Break(BreakStmt { label: None, .. })));
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        let expr = expr_of("1 + 2 * 3;");
        let Expr::Binary(add) = expr else {
            panic!("expected binary")
        };
        assert_eq!(add.op, BinaryOp::Add);
        assert_eq!(binary_op(&add.right), BinaryOp::Mul);
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        let Expr::Binary(outer) = expr_of("a - b - c;") else {
            panic!("expected binary")
        };
        assert_eq!(binary_op(&outer.left), BinaryOp::Sub);
        assert!(matches!(*outer.right, Expr::Identifier(ref i) if i.name == "c"));
    }

    #[test]
    fn test_exponent_is_right_associative() {
        let Expr::Binary(outer) = expr_of("2 ** 3 ** 2;") else {
            panic!("expected binary")
        };
        assert!(matches!(*outer.left, Expr::Number(_)));
        assert_eq!(binary_op(&outer.right), BinaryOp::Exp);
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let Expr::Assignment(outer) = expr_of("a = b += 1;") else {
            panic!("expected assignment")
        };
        assert_eq!(outer.op, AssignOp::Assign);
        assert!(matches!(*outer.value, Expr::Assignment(ref a) if a.op == AssignOp::Add));
    }

    #[test]
    fn test_comma_and_ternary() {
        assert_eq!(binary_op(&expr_of("a, b, c;")), BinaryOp::Comma);
        let Expr::Ternary(t) = expr_of("a ? b : c ? d : e;") else {
            panic!("expected ternary")
        };
        assert!(matches!(*t.alternate, Expr::Ternary(_)));
    }

    #[test]
    fn test_logical_precedence() {
        let Expr::Binary(or) = expr_of("a || b && c;") else {
            panic!("expected binary")
        };
        assert_eq!(or.op, BinaryOp::LogicalOr);
        assert_eq!(binary_op(&or.right), BinaryOp::LogicalAnd);
    }

    #[test]
    fn test_unary_and_postfix() {
        let Expr::Unary(u) = expr_of("typeof -x;") else {
            panic!("expected unary")
        };
        assert_eq!(u.op, UnaryOp::Typeof);
        assert!(matches!(*u.argument, Expr::Unary(ref m) if m.op == UnaryOp::Minus));

        let Expr::Postfix(p) = expr_of("a.b++;") else {
            panic!("expected postfix")
        };
        assert_eq!(p.op, UpdateOp::Increment);
        assert!(matches!(*p.argument, Expr::Member(_)));

        assert!(matches!(expr_of("++i;"), Expr::Unary(ref u) if u.op == UnaryOp::Increment));
    }

    #[test]
    fn test_call_member_index_chain() {
        let Expr::Call(call) = expr_of("obj.list[0](1, ...rest);") else {
            panic!("expected call")
        };
        assert_eq!(call.arguments.len(), 2);
        assert!(matches!(call.arguments[1], Expr::Spread(_)));
        let Expr::Index(index) = *call.callee else {
            panic!("expected index")
        };
        assert!(matches!(*index.object, Expr::Member(ref m) if m.property.name == "list"));
    }

    #[test]
    fn test_keyword_member_name() {
        let Expr::Member(m) = expr_of("module.default;") else {
            panic!("expected member")
        };
        assert_eq!(m.property.name, "default");
    }

    #[test]
    fn test_new_expression() {
        let Expr::Member(m) = expr_of("new Point(1, 2).x;") else {
            panic!("expected member")
        };
        let Expr::New(n) = *m.object else {
            panic!("expected new")
        };
        assert_eq!(n.arguments.len(), 2);
        assert!(matches!(*n.callee, Expr::Identifier(ref i) if i.name == "Point"));

        let Expr::New(bare) = expr_of("new ns.Thing;") else {
            panic!("expected new")
        };
        assert!(bare.arguments.is_empty());
        assert!(matches!(*bare.callee, Expr::Member(_)));
    }

    #[test]
    fn test_infinity_and_nan_become_numbers() {
        let Expr::Number(inf) = expr_of("Infinity;") else {
            panic!("expected number")
        };
        assert!(inf.value.is_infinite());
        let Expr::Number(nan) = expr_of("NaN;") else {
            panic!("expected number")
        };
        assert!(nan.value.is_nan());
    }

    #[test]
    fn test_number_literal_value() {
        let Expr::Number(n) = expr_of("1_000.25;") else {
            panic!("expected number")
        };
        assert_eq!(number::format(&n.value), "1000.25");
    }

    #[test]
    fn test_invalid_number_literal() {
        let loc = Location::new("t.rose", 0, 1, 1);
        let tokens = vec![
            Token {
                kind: TokenKind::NumberLiteral,
                text: "1e5".into(),
                loc: loc.clone(),
            },
            Token {
                kind: TokenKind::Semicolon,
                text: ";".into(),
                loc,
            },
        ];
        match parse(tokens) {
            Err(RoseError::Syntax(d)) => assert_eq!(d.message, "Invalid number literal '1e5'"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_array_literal_holes_spread_and_trailing_comma() {
        let Expr::Array(arr) = expr_of("[1, , ...xs, 4,];") else {
            panic!("expected array")
        };
        assert_eq!(arr.elements.len(), 4);
        assert!(matches!(arr.elements[1], Expr::Undefined(_)));
        assert!(matches!(arr.elements[2], Expr::Spread(_)));
    }

    #[test]
    fn test_object_literal_forms() {
        let Expr::Object(obj) = expr_of(r#"({a: 1, "b c": 2, d, ...e});"#) else {
            panic!("expected object")
        };
        let keys: Vec<_> = obj.properties.iter().map(|p| p.key.clone()).collect();
        assert_eq!(
            keys,
            vec![
                Some("a".to_owned()),
                Some("b c".to_owned()),
                Some("d".to_owned()),
                None
            ]
        );
        assert!(matches!(obj.properties[2].value, Expr::Identifier(ref i) if i.name == "d"));
    }

    #[test]
    fn test_function_declaration_with_params() {
        let program = parse_ok("async function f(a, b = 2, ...rest) { return a; }");
        let Stmt::Function(f) = &program.body[0] else {
            panic!("expected function")
        };
        assert!(f.is_async);
        assert_eq!(f.name.as_ref().map(|n| n.name.as_str()), Some("f"));
        assert_eq!(f.params.len(), 3);
        assert!(f.params[1].default.is_some());
        assert!(f.params[2].is_rest);
    }

    #[test]
    fn test_rest_parameter_errors() {
        assert_eq!(
            parse_err("function f(...a = 1) {}"),
            "Rest parameter cannot have a default value."
        );
        assert_eq!(
            parse_err("function f(...a, b) {}"),
            "Rest parameter must be last formal parameter"
        );
    }

    #[test]
    fn test_if_else_chain_and_single_statement_bodies() {
        let program = parse_ok("if (a) x = 1; else if (b) { x = 2; } else x = 3;");
        let Stmt::If(outer) = &program.body[0] else {
            panic!("expected if")
        };
        assert_eq!(outer.consequent.body.len(), 1);
        let Some(alt) = &outer.alternate else {
            panic!("expected else")
        };
        let Stmt::If(inner) = alt.as_ref() else {
            panic!("expected else-if")
        };
        assert!(matches!(inner.alternate.as_deref(), Some(Stmt::Block(_))));
    }

    #[test]
    fn test_for_loop_clauses() {
        let program = parse_ok("for (let i = 0; i < 3; i++) {} for (;;) break;");
        let Stmt::For(full) = &program.body[0] else {
            panic!("expected for")
        };
        assert!(matches!(full.init, Some(ForInit::Declaration(_))));
        assert!(full.test.is_some() && full.update.is_some());
        let Stmt::For(empty) = &program.body[1] else {
            panic!("expected for")
        };
        assert!(empty.init.is_none() && empty.test.is_none() && empty.update.is_none());
    }

    #[test]
    fn test_do_while_and_labels() {
        let program = parse_ok("outer: do { continue outer; } while (x);");
        let Stmt::Label(l) = &program.body[0] else {
            panic!("expected label")
        };
        assert_eq!(l.label.name, "outer");
        let Stmt::DoWhile(d) = l.body.as_ref() else {
            panic!("expected do-while")
        };
        assert!(matches!(
            d.body.body[0],
            Stmt::Continue(ContinueStmt { label: Some(ref i), .. }) if i.name == "outer"
        ));
    }

    #[test]
    fn test_switch_groups_case_labels() {
        let program =
            parse_ok("switch (x) { case 1: case 2: a; break; default: b; case 3: c; }");
        let Stmt::Switch(s) = &program.body[0] else {
            panic!("expected switch")
        };
        assert_eq!(s.cases.len(), 3);
        assert_eq!(s.cases[0].tests.len(), 2);
        assert_eq!(s.cases[0].body.body.len(), 2);
        assert!(s.cases[1].is_default && s.cases[1].tests.is_empty());
        assert_eq!(s.cases[2].tests.len(), 1);
    }

    #[test]
    fn test_import_forms() {
        let program = parse_ok(
            r#"import "side"; import D, { a, b } from "m"; import { c } from "n";"#,
        );
        assert_eq!(program.body.len(), 3);
        let Stmt::Import(full) = &program.body[1] else {
            panic!("expected import")
        };
        assert_eq!(full.module, "m");
        assert_eq!(full.default.as_ref().map(|d| d.name.as_str()), Some("D"));
        assert_eq!(full.named.len(), 2);
        assert_eq!(parse_err(r#"import D, c from "m";"#), "Expected '{' after ',' in import statement, got 'c'");
    }

    #[test]
    fn test_export_forms() {
        let program = parse_ok("export default 1; export { a, b }; export let c = 3;");
        assert!(matches!(program.body[0], Stmt::Export(ExportDecl::Default { .. })));
        assert!(
            matches!(program.body[1], Stmt::Export(ExportDecl::Named { ref names, .. }) if names.len() == 2)
        );
        assert!(matches!(program.body[2], Stmt::Export(ExportDecl::Declaration { .. })));
    }

    #[test]
    fn test_try_forms_and_errors() {
        let program = parse_ok("try { a; } catch (e) { b; } finally { c; } try {} catch {}");
        let Stmt::Try(t) = &program.body[0] else {
            panic!("expected try")
        };
        assert!(t.handler.as_ref().is_some_and(|h| h.param.is_some()));
        assert!(t.finalizer.is_some());
        assert_eq!(
            parse_err("try { a; }"),
            "'try' must have at least a 'catch' or 'finally'"
        );
    }

    #[test]
    fn test_statement_errors() {
        assert_eq!(parse_err("throw;"), "'throw' must have an expression");
        assert_eq!(parse_err("x = 1"), "Expected ';' after expression, got 'EOF'");
        assert_eq!(parse_err("let 5 = x;"), "Expected identifier after 'let', got '5'");
        assert_eq!(
            parse_err("const c;"),
            "Missing initializer in const declaration 'c'"
        );
        assert_eq!(parse_err("{ a;"), "Expected '}' to end block, got 'EOF'");
        assert_eq!(parse_err("(1 + );"), "Expected primary expression, got ')'");
        assert_eq!(parse_err("f(1 2);"), "Expected ',' or ')' after function argument, got '2'");
    }

    #[test]
    fn test_error_location_points_at_offending_token() {
        let Err(RoseError::Syntax(d)) = parse_source("let a = 1;\nlet = 2;", "m.rose") else {
            panic!("expected syntax error")
        };
        assert_eq!(d.to_string(), "[ERROR] [m.rose:2:5]: Expected identifier after 'let', got '='");
    }

    #[test]
    fn test_debugger_and_empty_statements() {
        let program = parse_ok("debugger; ;");
        assert!(matches!(program.body[0], Stmt::Debugger(_)));
        assert!(matches!(program.body[1], Stmt::Empty(_)));
    }

    #[test]
    fn test_await_expression() {
        let program = parse_ok("async function f() { await g(); }");
        let Stmt::Function(f) = &program.body[0] else {
            panic!("expected function")
        };
        let Stmt::Expr(s) = &f.body.body[0] else {
            panic!("expected expression statement")
        };
        assert!(matches!(s.expr, Expr::Await(_)));
    }

    #[test]
    fn test_empty_token_stream() {
        let program = parse(Vec::new()).unwrap();
        assert!(program.body.is_empty());
    }
}
