//! Error types for the Rose front-end and evaluator.
//!
//! Every stage reports through [`RoseError`].  Errors that point at source
//! text carry a [`Diagnostic`], whose `Display` form is the
//! `[ERROR] [file:line:column]: message` line printed by the driver.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::parser::scanner::Location;

/// A located message produced by any stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Where in the source the problem was detected.
    pub loc: Location,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic at `loc`.
    pub fn new(loc: Location, message: impl Into<String>) -> Self {
        Self {
            loc,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] [{}]: {}", self.loc, self.message)
    }
}

impl std::error::Error for Diagnostic {}

/// All errors that can be produced by the Rose pipeline.
#[derive(Debug, Error)]
pub enum RoseError {
    /// The scanner met input it cannot tokenize.
    #[error("{0}")]
    Lex(Diagnostic),

    /// The parser met a token sequence outside the grammar.
    #[error("{0}")]
    Syntax(Diagnostic),

    /// Semantic analysis found one or more rule violations.
    #[error("{}", join_lines(.0))]
    Semantic(Vec<Diagnostic>),

    /// Evaluation failed at a known source location.
    #[error("{0}")]
    Runtime(Diagnostic),

    /// A built-in failed; the evaluator attaches the call site and turns
    /// this into [`RoseError::Runtime`].
    #[error("{0}")]
    Native(String),

    /// A source file could not be read.
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        /// The file that failed to load.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl RoseError {
    /// Returns the diagnostics carried by this error, if it has any.
    pub fn diagnostics(&self) -> Vec<&Diagnostic> {
        match self {
            Self::Lex(d) | Self::Syntax(d) | Self::Runtime(d) => vec![d],
            Self::Semantic(ds) => ds.iter().collect(),
            Self::Native(_) | Self::Io { .. } => Vec::new(),
        }
    }

    /// Returns the bare message of a single-diagnostic error without the
    /// location prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Lex(d) | Self::Syntax(d) | Self::Runtime(d) => d.message.clone(),
            Self::Native(m) => m.clone(),
            other => other.to_string(),
        }
    }
}

fn join_lines(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convenient `Result` alias for fallible pipeline operations.
pub type RoseResult<T> = Result<T, RoseError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(line: u32, column: u32) -> Location {
        Location::new("main.rose", 0, line, column)
    }

    #[test]
    fn test_diagnostic_format() {
        let d = Diagnostic::new(loc(3, 7), "break not in loop");
        assert_eq!(d.to_string(), "[ERROR] [main.rose:3:7]: break not in loop");
    }

    #[test]
    fn test_semantic_error_lists_every_diagnostic() {
        let err = RoseError::Semantic(vec![
            Diagnostic::new(loc(1, 1), "break not in loop"),
            Diagnostic::new(loc(2, 5), "continue not in loop"),
        ]);
        assert_eq!(
            err.to_string(),
            "[ERROR] [main.rose:1:1]: break not in loop\n\
             [ERROR] [main.rose:2:5]: continue not in loop"
        );
        assert_eq!(err.diagnostics().len(), 2);
    }

    #[test]
    fn test_message_strips_location() {
        let err = RoseError::Runtime(Diagnostic::new(loc(1, 3), "Division by zero"));
        assert_eq!(err.message(), "Division by zero");
        assert_eq!(RoseError::Native("boom".into()).message(), "boom");
    }
}
