//! `rose_core`: the front-end and evaluator for the Rose scripting language.
//!
//! Source text flows through four stages:
//!
//! 1. [`lex`] turns text into a token stream (fail fast).
//! 2. [`parse`] builds a [`Program`](parser::ast::Program) (fail fast).
//! 3. [`analyze`] checks static rules and returns every violation.
//! 4. [`Interpreter::evaluate`] walks the tree and produces a [`Value`].
//!
//! [`run`] chains all four for one-shot execution.
//!
//! # Crate layout
//!
//! - [`parser`]: scanner, AST, parser, printer and semantic analysis.
//! - [`interpreter`]: scopes, the `Math` built-in and the evaluator.
//! - [`objects`]: runtime values.
//! - [`number`]: arbitrary-precision numeric helpers.
//! - [`error`]: diagnostics and the crate error type.

use std::sync::Arc;

/// Diagnostics and the pipeline error type.
pub mod error;
/// Tree-walking evaluator, scopes and built-ins.
pub mod interpreter;
/// Arbitrary-precision number helpers.
pub mod number;
/// Runtime value representation.
pub mod objects;
/// Scanner, AST, parser, printer and semantic analyzer.
pub mod parser;
/// Stack growth for recursive tree walks.
pub mod stack;

pub use error::{Diagnostic, RoseError, RoseResult};
pub use interpreter::Interpreter;
pub use objects::value::Value;
pub use parser::parse;
pub use parser::scanner::lex_file;
pub use parser::sema::analyze;

use parser::ast::Program;
use parser::scanner::{Scanner, Token};

/// Tokenizes `source`, attributing locations to `file`.
///
/// # Errors
///
/// Returns [`RoseError::Lex`] for the first malformed token.
pub fn lex(source: &str, file: impl Into<Arc<str>>) -> RoseResult<Vec<Token>> {
    Scanner::tokenize_all(source, file)
}

/// Lexes, parses and analyzes `source`.
///
/// # Errors
///
/// Returns the first lexical or syntax error, or [`RoseError::Semantic`]
/// with every rule violation.
pub fn check(source: &str, file: impl Into<Arc<str>>) -> RoseResult<Program> {
    let program = parse(lex(source, file)?)?;
    let diagnostics = analyze(&program);
    if !diagnostics.is_empty() {
        return Err(RoseError::Semantic(diagnostics));
    }
    Ok(program)
}

/// Runs `source` in a fresh interpreter and returns the value of its last
/// statement.
///
/// # Errors
///
/// Returns the first failure of any stage.
pub fn run(source: &str, file: impl Into<Arc<str>>) -> RoseResult<Value> {
    let program = check(source, file)?;
    Interpreter::new().evaluate(&program)
}
