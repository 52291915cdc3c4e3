//! Rose lexer (scanner).
//!
//! See [`Scanner`] for the main entry point.  Scanning is eager: the whole
//! source is turned into a token vector terminated by [`TokenKind::Eof`],
//! and the first invalid character aborts the scan.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Diagnostic, RoseError, RoseResult};

/// File name reported for sources that did not come from disk.
pub const INLINE_SOURCE_NAME: &str = "<input>";

// ─────────────────────────────────────────────────────────────────────────────
// Location
// ─────────────────────────────────────────────────────────────────────────────

/// A position in a named source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Name of the file the source came from.
    pub file: Arc<str>,
    /// Byte offset from the beginning of the source string.
    pub offset: usize,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number, in bytes.
    pub column: u32,
}

impl Location {
    /// Creates a location in `file`.
    pub fn new(file: impl Into<Arc<str>>, offset: usize, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            offset,
            line,
            column,
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(INLINE_SOURCE_NAME, 0, 1, 1)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────────────

/// The syntactic category of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // ── Keywords ──────────────────────────────────────────────────────────
    /// `if`
    If,
    /// `else`
    Else,
    /// `while`
    While,
    /// `do`
    Do,
    /// `for`
    For,
    /// `function`
    Function,
    /// `switch`
    Switch,
    /// `case`
    Case,
    /// `default`
    Default,
    /// `let`
    Let,
    /// `const`
    Const,
    /// `var`
    Var,
    /// `null`
    Null,
    /// `undefined`
    Undefined,
    /// `return`
    Return,
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `import`
    Import,
    /// `export`
    Export,
    /// `try`
    Try,
    /// `catch`
    Catch,
    /// `finally`
    Finally,
    /// `throw`
    Throw,
    /// `typeof`
    Typeof,
    /// `async`
    Async,
    /// `await`
    Await,
    /// `from`
    From,
    /// `delete`
    Delete,
    /// `this`
    This,
    /// `void`
    Void,
    /// `new`
    New,
    /// `debugger`
    Debugger,

    // ── Literals and names ────────────────────────────────────────────────
    /// A name that is not a keyword.
    Identifier,
    /// `true` or `false`; the token text says which.
    BoolLiteral,
    /// String literal enclosed in `"` or `'`; the text is the decoded value.
    StringLiteral,
    /// Decimal numeric literal with optional `_` separators.
    NumberLiteral,

    // ── Arithmetic / bitwise operators ────────────────────────────────────
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `&`
    Ampersand,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `<<`
    LeftShift,
    /// `>>`
    RightShift,
    /// `**`
    StarStar,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,

    // ── Assignment operators ──────────────────────────────────────────────
    /// `=`
    Equal,
    /// `+=`
    PlusEqual,
    /// `-=`
    MinusEqual,
    /// `*=`
    StarEqual,
    /// `/=`
    SlashEqual,
    /// `%=`
    PercentEqual,
    /// `**=`
    StarStarEqual,
    /// `&=`
    AmpersandEqual,
    /// `|=`
    PipeEqual,
    /// `^=`
    CaretEqual,
    /// `<<=`
    LeftShiftEqual,
    /// `>>=`
    RightShiftEqual,
    /// `&&=`
    LogicalAndEqual,
    /// `||=`
    LogicalOrEqual,

    // ── Comparison ────────────────────────────────────────────────────────
    /// `==`
    EqualEqual,
    /// `!=`
    BangEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,

    // ── Logical ───────────────────────────────────────────────────────────
    /// `&&`
    LogicalAnd,
    /// `||`
    LogicalOr,
    /// `!`
    Bang,

    // ── Grouping ──────────────────────────────────────────────────────────
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,

    // ── Punctuation ───────────────────────────────────────────────────────
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `?`
    Question,
    /// `=>`
    Arrow,
    /// `...`
    Ellipsis,

    // ── Special ───────────────────────────────────────────────────────────
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Returns `true` for the keywords of the fixed keyword table.
    pub fn is_keyword(self) -> bool {
        (self as u8) <= (Self::Debugger as u8)
    }

    /// Returns `true` for the compound and plain assignment operators.
    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::PlusEqual
                | Self::MinusEqual
                | Self::StarEqual
                | Self::SlashEqual
                | Self::PercentEqual
                | Self::StarStarEqual
                | Self::AmpersandEqual
                | Self::PipeEqual
                | Self::CaretEqual
                | Self::LeftShiftEqual
                | Self::RightShiftEqual
                | Self::LogicalAndEqual
                | Self::LogicalOrEqual
        )
    }

    /// A printable name for diagnostics: the fixed lexeme for keywords and
    /// punctuators, a category name for everything else.
    pub fn describe(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Else => "else",
            Self::While => "while",
            Self::Do => "do",
            Self::For => "for",
            Self::Function => "function",
            Self::Switch => "switch",
            Self::Case => "case",
            Self::Default => "default",
            Self::Let => "let",
            Self::Const => "const",
            Self::Var => "var",
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Return => "return",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Import => "import",
            Self::Export => "export",
            Self::Try => "try",
            Self::Catch => "catch",
            Self::Finally => "finally",
            Self::Throw => "throw",
            Self::Typeof => "typeof",
            Self::Async => "async",
            Self::Await => "await",
            Self::From => "from",
            Self::Delete => "delete",
            Self::This => "this",
            Self::Void => "void",
            Self::New => "new",
            Self::Debugger => "debugger",
            Self::Identifier => "identifier",
            Self::BoolLiteral => "boolean literal",
            Self::StringLiteral => "string literal",
            Self::NumberLiteral => "number literal",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Ampersand => "&",
            Self::Pipe => "|",
            Self::Caret => "^",
            Self::Tilde => "~",
            Self::LeftShift => "<<",
            Self::RightShift => ">>",
            Self::StarStar => "**",
            Self::PlusPlus => "++",
            Self::MinusMinus => "--",
            Self::Equal => "=",
            Self::PlusEqual => "+=",
            Self::MinusEqual => "-=",
            Self::StarEqual => "*=",
            Self::SlashEqual => "/=",
            Self::PercentEqual => "%=",
            Self::StarStarEqual => "**=",
            Self::AmpersandEqual => "&=",
            Self::PipeEqual => "|=",
            Self::CaretEqual => "^=",
            Self::LeftShiftEqual => "<<=",
            Self::RightShiftEqual => ">>=",
            Self::LogicalAndEqual => "&&=",
            Self::LogicalOrEqual => "||=",
            Self::EqualEqual => "==",
            Self::BangEqual => "!=",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::LogicalAnd => "&&",
            Self::LogicalOr => "||",
            Self::Bang => "!",
            Self::LeftParen => "(",
            Self::RightParen => ")",
            Self::LeftBracket => "[",
            Self::RightBracket => "]",
            Self::LeftBrace => "{",
            Self::RightBrace => "}",
            Self::Dot => ".",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Colon => ":",
            Self::Question => "?",
            Self::Arrow => "=>",
            Self::Ellipsis => "...",
            Self::Eof => "end of input",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────────────

/// A single lexical token produced by the [`Scanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The syntactic category.
    pub kind: TokenKind,
    /// The lexeme: source text for names, numbers and operators, the decoded
    /// value for string literals and `EOF` for the end marker.
    pub text: String,
    /// Where the token starts.
    pub loc: Location,
}

// ─────────────────────────────────────────────────────────────────────────────
// Character-classification helpers
// ─────────────────────────────────────────────────────────────────────────────

fn is_id_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$'
}

fn is_id_continue(c: u8) -> bool {
    is_id_start(c) || c.is_ascii_digit()
}

/// Maps a reserved word to its [`TokenKind`], or `None` for ordinary names.
fn keyword_kind(s: &str) -> Option<TokenKind> {
    let kind = match s {
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "do" => TokenKind::Do,
        "for" => TokenKind::For,
        "function" => TokenKind::Function,
        "switch" => TokenKind::Switch,
        "case" => TokenKind::Case,
        "default" => TokenKind::Default,
        "let" => TokenKind::Let,
        "const" => TokenKind::Const,
        "var" => TokenKind::Var,
        "null" => TokenKind::Null,
        "undefined" => TokenKind::Undefined,
        "return" => TokenKind::Return,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "import" => TokenKind::Import,
        "export" => TokenKind::Export,
        "try" => TokenKind::Try,
        "catch" => TokenKind::Catch,
        "finally" => TokenKind::Finally,
        "throw" => TokenKind::Throw,
        "typeof" => TokenKind::Typeof,
        "async" => TokenKind::Async,
        "await" => TokenKind::Await,
        "from" => TokenKind::From,
        "delete" => TokenKind::Delete,
        "this" => TokenKind::This,
        "void" => TokenKind::Void,
        "new" => TokenKind::New,
        "debugger" => TokenKind::Debugger,
        "true" | "false" => TokenKind::BoolLiteral,
        _ => return None,
    };
    Some(kind)
}

/// Appends `code` to `out` as UTF-8.
///
/// Four hex digits never exceed `0xFFFF`, so at most three bytes are used.
/// Lone surrogates are not valid scalar values and are rejected.
fn push_code_unit(out: &mut String, code: u32) -> bool {
    match char::from_u32(code) {
        Some(ch) => {
            out.push(ch);
            true
        }
        None => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scanner
// ─────────────────────────────────────────────────────────────────────────────

/// Converts Rose source text into [`Token`]s.
///
/// The scanner works on bytes: every accepted character is 7-bit ASCII, and
/// anything else is rejected with `Non-ASCII character encountered`.
pub struct Scanner<'src> {
    /// The complete source string.
    source: &'src [u8],
    /// Name reported in every [`Location`].
    file: Arc<str>,
    /// Current byte position within `source`.
    pos: usize,
    /// Current 1-based line number.
    line: u32,
    /// Current 1-based column number.
    column: u32,
}

impl<'src> Scanner<'src> {
    /// Create a new scanner for `source`, reporting locations in `file`.
    pub fn new(source: &'src str, file: impl Into<Arc<str>>) -> Self {
        Self {
            source: source.as_bytes(),
            file: file.into(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Returns `true` when all input has been consumed.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    // ── Low-level character helpers ─────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.source.get(self.pos + 1).copied()
    }

    fn peek3(&self) -> Option<u8> {
        self.source.get(self.pos + 2).copied()
    }

    /// Advance past the current byte and update line/column tracking.
    fn advance(&mut self) -> u8 {
        let ch = self.source[self.pos];
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        ch
    }

    /// Consumes the next byte if it equals `expected`.
    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn current_loc(&self) -> Location {
        Location {
            file: Arc::clone(&self.file),
            offset: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    fn error(&self, loc: Location, message: impl Into<String>) -> RoseError {
        RoseError::Lex(Diagnostic::new(loc, message))
    }

    fn text_since(&self, start: usize) -> String {
        String::from_utf8_lossy(&self.source[start..self.pos]).into_owned()
    }

    // ── Whitespace and comments ─────────────────────────────────────────────

    /// Skips whitespace, `// …` and `/* … */` comments.
    fn skip_trivia(&mut self) -> RoseResult<()> {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n' | 0x0B | 0x0C) => {
                    self.advance();
                }
                Some(b'/') if self.peek2() == Some(b'/') => {
                    while let Some(c) = self.peek() {
                        if c == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(b'/') if self.peek2() == Some(b'*') => {
                    let start = self.current_loc();
                    self.advance(); // /
                    self.advance(); // *
                    loop {
                        match self.peek() {
                            None => {
                                return Err(
                                    self.error(start, "Unterminated multi-line comment")
                                );
                            }
                            Some(b'*') if self.peek2() == Some(b'/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(_) => {
                                self.advance();
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    // ── Literals ────────────────────────────────────────────────────────────

    fn scan_digits(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == b'_') {
            self.advance();
        }
    }

    /// `digits (. digits)?` with `_` separators anywhere after the first digit.
    fn scan_number(&mut self, start: Location) -> Token {
        let begin = self.pos - 1;
        self.scan_digits();
        if self.peek() == Some(b'.') && matches!(self.peek2(), Some(c) if c.is_ascii_digit()) {
            self.advance(); // .
            self.scan_digits();
        }
        Token {
            kind: TokenKind::NumberLiteral,
            text: self.text_since(begin),
            loc: start,
        }
    }

    fn scan_identifier(&mut self, start: Location) -> Token {
        let begin = self.pos - 1;
        while matches!(self.peek(), Some(c) if is_id_continue(c)) {
            self.advance();
        }
        let text = self.text_since(begin);
        let kind = keyword_kind(&text).unwrap_or(TokenKind::Identifier);
        Token {
            kind,
            text,
            loc: start,
        }
    }

    /// Reads the four hex digits of a `\uXXXX` escape.
    fn scan_unicode_escape(&mut self, out: &mut String) -> RoseResult<()> {
        let mut code = 0u32;
        for _ in 0..4 {
            let loc = self.current_loc();
            let Some(c) = self.peek() else {
                return Err(self.error(loc, "Incomplete Unicode escape sequence"));
            };
            let Some(digit) = char::from(c).to_digit(16) else {
                return Err(self.error(loc, "Invalid Unicode escape sequence"));
            };
            self.advance();
            code = code * 16 + digit;
        }
        if push_code_unit(out, code) {
            Ok(())
        } else {
            Err(self.error(self.current_loc(), "Invalid Unicode escape sequence"))
        }
    }

    fn scan_string(&mut self, quote: u8, start: Location) -> RoseResult<Token> {
        let mut value = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(self.error(start, "Unterminated string literal"));
            };
            if c == quote {
                self.advance();
                break;
            }
            if !c.is_ascii() {
                return Err(self.error(self.current_loc(), "Non-ASCII character encountered"));
            }
            self.advance();
            if c != b'\\' {
                value.push(char::from(c));
                continue;
            }

            let Some(esc) = self.peek() else {
                return Err(self.error(start, "Unterminated string literal"));
            };
            let esc_loc = Location {
                column: self.column - 1,
                ..self.current_loc()
            };
            self.advance();
            match esc {
                b'n' => value.push('\n'),
                b'r' => value.push('\r'),
                b't' => value.push('\t'),
                b'b' => value.push('\u{8}'),
                b'f' => value.push('\u{c}'),
                b'v' => value.push('\u{b}'),
                b'0' => value.push('\0'),
                b'\\' => value.push('\\'),
                b'\'' => value.push('\''),
                b'"' => value.push('"'),
                b'u' => self.scan_unicode_escape(&mut value)?,
                other => {
                    return Err(self.error(
                        esc_loc,
                        format!("Unknown escape sequence '\\{}'", char::from(other)),
                    ));
                }
            }
        }
        Ok(Token {
            kind: TokenKind::StringLiteral,
            text: value,
            loc: start,
        })
    }

    // ── Operators ───────────────────────────────────────────────────────────

    /// Maximal-munch operator recognition; `c` has already been consumed.
    fn scan_operator(&mut self, c: u8) -> Option<TokenKind> {
        use TokenKind as K;
        let kind = match c {
            b'+' => {
                if self.eat(b'+') {
                    K::PlusPlus
                } else if self.eat(b'=') {
                    K::PlusEqual
                } else {
                    K::Plus
                }
            }
            b'-' => {
                if self.eat(b'-') {
                    K::MinusMinus
                } else if self.eat(b'=') {
                    K::MinusEqual
                } else {
                    K::Minus
                }
            }
            b'*' => {
                if self.eat(b'*') {
                    if self.eat(b'=') { K::StarStarEqual } else { K::StarStar }
                } else if self.eat(b'=') {
                    K::StarEqual
                } else {
                    K::Star
                }
            }
            b'/' => {
                if self.eat(b'=') { K::SlashEqual } else { K::Slash }
            }
            b'%' => {
                if self.eat(b'=') { K::PercentEqual } else { K::Percent }
            }
            b'&' => {
                if self.eat(b'&') {
                    if self.eat(b'=') { K::LogicalAndEqual } else { K::LogicalAnd }
                } else if self.eat(b'=') {
                    K::AmpersandEqual
                } else {
                    K::Ampersand
                }
            }
            b'|' => {
                if self.eat(b'|') {
                    if self.eat(b'=') { K::LogicalOrEqual } else { K::LogicalOr }
                } else if self.eat(b'=') {
                    K::PipeEqual
                } else {
                    K::Pipe
                }
            }
            b'^' => {
                if self.eat(b'=') { K::CaretEqual } else { K::Caret }
            }
            b'~' => K::Tilde,
            b'!' => {
                if self.eat(b'=') { K::BangEqual } else { K::Bang }
            }
            b'=' => {
                if self.eat(b'=') {
                    K::EqualEqual
                } else if self.eat(b'>') {
                    K::Arrow
                } else {
                    K::Equal
                }
            }
            b'<' => {
                if self.eat(b'<') {
                    if self.eat(b'=') { K::LeftShiftEqual } else { K::LeftShift }
                } else if self.eat(b'=') {
                    K::LessEqual
                } else {
                    K::Less
                }
            }
            b'>' => {
                if self.eat(b'>') {
                    if self.eat(b'=') { K::RightShiftEqual } else { K::RightShift }
                } else if self.eat(b'=') {
                    K::GreaterEqual
                } else {
                    K::Greater
                }
            }
            b'(' => K::LeftParen,
            b')' => K::RightParen,
            b'[' => K::LeftBracket,
            b']' => K::RightBracket,
            b'{' => K::LeftBrace,
            b'}' => K::RightBrace,
            b'.' => {
                if self.peek() == Some(b'.') && self.peek2() == Some(b'.') {
                    self.advance();
                    self.advance();
                    K::Ellipsis
                } else {
                    K::Dot
                }
            }
            b',' => K::Comma,
            b';' => K::Semicolon,
            b':' => K::Colon,
            b'?' => K::Question,
            _ => return None,
        };
        Some(kind)
    }

    // ── Main entry ──────────────────────────────────────────────────────────

    /// Scans and returns the next token.
    ///
    /// # Errors
    ///
    /// Returns [`RoseError::Lex`] for non-ASCII input, unknown characters,
    /// unterminated comments or strings, and malformed escapes.
    pub fn next_token(&mut self) -> RoseResult<Token> {
        self.skip_trivia()?;

        let start = self.current_loc();
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                text: "EOF".to_owned(),
                loc: start,
            });
        };

        if !c.is_ascii() {
            return Err(self.error(start, "Non-ASCII character encountered"));
        }

        let begin = self.pos;
        self.advance();

        if c.is_ascii_digit() {
            return Ok(self.scan_number(start));
        }
        if is_id_start(c) {
            return Ok(self.scan_identifier(start));
        }
        if c == b'"' || c == b'\'' {
            return self.scan_string(c, start);
        }

        match self.scan_operator(c) {
            Some(kind) => Ok(Token {
                kind,
                text: self.text_since(begin),
                loc: start,
            }),
            None => Err(self.error(
                start,
                format!("Unexpected character '{}'", char::from(c)),
            )),
        }
    }

    /// Tokenizes all of `source`; the last token is always
    /// [`TokenKind::Eof`].
    ///
    /// # Errors
    ///
    /// Returns the first [`RoseError::Lex`] encountered; no partial token
    /// list escapes.
    pub fn tokenize_all(source: &'src str, file: impl Into<Arc<str>>) -> RoseResult<Vec<Token>> {
        let mut scanner = Scanner::new(source, file);
        let mut tokens = Vec::new();
        loop {
            let tok = scanner.next_token()?;
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        tracing::debug!(file = %scanner.file, count = tokens.len(), "scanned tokens");
        Ok(tokens)
    }
}

/// Reads `path` and tokenizes its contents, reporting locations against
/// the path as given.
///
/// # Errors
///
/// Returns [`RoseError::Io`] when the file cannot be read, otherwise the
/// result of [`Scanner::tokenize_all`].
pub fn lex_file(path: &Path) -> RoseResult<Vec<Token>> {
    let source = std::fs::read_to_string(path).map_err(|source| RoseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Scanner::tokenize_all(&source, path.display().to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Tokenise `src` and return the token kinds, without the final `Eof`.
    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut toks: Vec<TokenKind> = Scanner::tokenize_all(src, "test")
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect();
        assert_eq!(toks.pop(), Some(TokenKind::Eof));
        toks
    }

    fn tokens(src: &str) -> Vec<Token> {
        Scanner::tokenize_all(src, "test").unwrap()
    }

    fn lex_error(src: &str) -> Diagnostic {
        match Scanner::tokenize_all(src, "test") {
            Err(RoseError::Lex(d)) => d,
            other => panic!("expected a lex error, got {other:?}"),
        }
    }

    // ── Keywords ─────────────────────────────────────────────────────────────

    #[test]
    fn test_keywords() {
        let src = "if else while do for function switch case default let const var \
                   null undefined return break continue import export try catch \
                   finally throw typeof async await from delete this void new debugger";
        let toks = kinds(src);
        assert_eq!(toks.len(), 32);
        assert!(toks.iter().all(|k| k.is_keyword()));
        assert_eq!(toks[0], TokenKind::If);
        assert_eq!(toks[13], TokenKind::Undefined);
        assert_eq!(toks[31], TokenKind::Debugger);
    }

    #[test]
    fn test_bool_literals_keep_text() {
        let toks = tokens("true false");
        assert_eq!(toks[0].kind, TokenKind::BoolLiteral);
        assert_eq!(toks[0].text, "true");
        assert_eq!(toks[1].kind, TokenKind::BoolLiteral);
        assert_eq!(toks[1].text, "false");
    }

    #[test]
    fn test_identifiers() {
        let toks = tokens("foo _bar $baz a1 iff");
        assert!(toks[..5].iter().all(|t| t.kind == TokenKind::Identifier));
        assert_eq!(toks[4].text, "iff");
    }

    // ── Numbers ──────────────────────────────────────────────────────────────

    #[test]
    fn test_numbers() {
        let toks = tokens("0 42 3.25 1_000_000 1_0.5_0");
        let texts: Vec<&str> = toks[..5].iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["0", "42", "3.25", "1_000_000", "1_0.5_0"]);
        assert!(toks[..5].iter().all(|t| t.kind == TokenKind::NumberLiteral));
    }

    #[test]
    fn test_number_followed_by_member_dot() {
        assert_eq!(
            kinds("1.x"),
            vec![TokenKind::NumberLiteral, TokenKind::Dot, TokenKind::Identifier]
        );
    }

    // ── Strings ──────────────────────────────────────────────────────────────

    #[test]
    fn test_string_quotes() {
        let toks = tokens(r#""double" 'single'"#);
        assert_eq!(toks[0].text, "double");
        assert_eq!(toks[1].text, "single");
    }

    #[test]
    fn test_string_escapes() {
        let toks = tokens(r#""a\nb\t\\\'\"\0""#);
        assert_eq!(toks[0].text, "a\nb\t\\'\"\0");
    }

    #[test]
    fn test_string_unicode_escapes() {
        let toks = tokens(r#""\u0041\u00e9\u20ac""#);
        assert_eq!(toks[0].text, "Aé€");
        assert_eq!(toks[0].text.len(), 1 + 2 + 3);
    }

    #[test]
    fn test_unterminated_string_reports_start() {
        let d = lex_error("let s = \"abc");
        assert_eq!(d.message, "Unterminated string literal");
        assert_eq!((d.loc.line, d.loc.column), (1, 9));
    }

    #[test]
    fn test_unknown_escape() {
        let d = lex_error(r#""a\qb""#);
        assert_eq!(d.message, "Unknown escape sequence '\\q'");
        assert_eq!(d.loc.column, 3);
    }

    #[test]
    fn test_incomplete_unicode_escape() {
        assert_eq!(
            lex_error(r#""\u12"#).message,
            "Incomplete Unicode escape sequence"
        );
        assert_eq!(
            lex_error(r#""\uD800""#).message,
            "Invalid Unicode escape sequence"
        );
    }

    #[test]
    fn test_non_hex_unicode_escape_is_invalid() {
        let d = lex_error(r#""\u12zz""#);
        assert_eq!(d.message, "Invalid Unicode escape sequence");
        assert_eq!(d.loc.column, 6);
    }

    #[test]
    fn test_string_may_span_lines() {
        let toks = tokens("\"a\nb\" x");
        assert_eq!(toks[0].kind, TokenKind::StringLiteral);
        assert_eq!(toks[0].text, "a\nb");
        assert_eq!((toks[1].loc.line, toks[1].loc.column), (2, 4));
    }

    // ── Operators ────────────────────────────────────────────────────────────

    #[test]
    fn test_maximal_munch() {
        use TokenKind as K;
        assert_eq!(kinds("+ ++ +="), vec![K::Plus, K::PlusPlus, K::PlusEqual]);
        assert_eq!(
            kinds("* ** *= **="),
            vec![K::Star, K::StarStar, K::StarEqual, K::StarStarEqual]
        );
        assert_eq!(
            kinds("& && &= &&="),
            vec![K::Ampersand, K::LogicalAnd, K::AmpersandEqual, K::LogicalAndEqual]
        );
        assert_eq!(
            kinds("< << <<= <="),
            vec![K::Less, K::LeftShift, K::LeftShiftEqual, K::LessEqual]
        );
        assert_eq!(kinds(". ..."), vec![K::Dot, K::Ellipsis]);
        assert_eq!(kinds("= == =>"), vec![K::Equal, K::EqualEqual, K::Arrow]);
    }

    #[test]
    fn test_two_dots_are_two_member_dots() {
        assert_eq!(kinds(".."), vec![TokenKind::Dot, TokenKind::Dot]);
    }

    // ── Trivia ───────────────────────────────────────────────────────────────

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("a // line\n/* block\n */ b"),
            vec![TokenKind::Identifier, TokenKind::Identifier]
        );
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert_eq!(
            lex_error("a /* never closed").message,
            "Unterminated multi-line comment"
        );
    }

    #[test]
    fn test_locations_track_lines() {
        let toks = tokens("a\n  b");
        assert_eq!((toks[0].loc.line, toks[0].loc.column), (1, 1));
        assert_eq!((toks[1].loc.line, toks[1].loc.column), (2, 3));
        assert_eq!(toks[1].loc.offset, 4);
        assert_eq!(&*toks[1].loc.file, "test");
    }

    #[test]
    fn test_eof_is_always_last() {
        let toks = tokens("");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::Eof);
    }

    // ── Errors ───────────────────────────────────────────────────────────────

    #[test]
    fn test_non_ascii_rejected() {
        let d = lex_error("let é = 1;");
        assert_eq!(d.message, "Non-ASCII character encountered");
        assert_eq!(d.loc.column, 5);
    }

    #[test]
    fn test_unexpected_character() {
        let d = lex_error("a # b");
        assert_eq!(d.message, "Unexpected character '#'");
        assert_eq!(d.to_string(), "[ERROR] [test:1:3]: Unexpected character '#'");
    }

    #[test]
    fn test_lexeme_round_trip() {
        let src = "let x = (a + b) * 3.5; x **= 2;";
        let joined: String = tokens(src)
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| t.text.as_str())
            .collect();
        let expected: String = src.chars().filter(|c| !c.is_whitespace()).collect();
        assert_eq!(joined, expected);
    }

    #[test]
    fn test_lex_file_missing() {
        let err = lex_file(Path::new("/definitely/not/here.rose")).unwrap_err();
        assert!(matches!(err, RoseError::Io { .. }));
    }
}
