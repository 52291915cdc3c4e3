//! Interactive read-eval-print loop.
//!
//! Lines are collected until every bracket is closed and no string literal
//! is open, then the chunk is lexed, parsed, analyzed and evaluated against
//! one long-lived [`Interpreter`].  A failing chunk prints its diagnostics
//! and is discarded; bindings made by earlier chunks stay available.

use std::io::{self, BufRead, Write};

use rose_core::{Interpreter, RoseResult, Value, check};

const PROMPT: &str = "> ";
const CONTINUATION_PROMPT: &str = "... ";
const SOURCE_NAME: &str = "<repl>";

/// Returns `true` when `source` has no unclosed bracket, string or block
/// comment.  Brackets and quotes inside comments are ignored.
pub fn is_input_complete(source: &str) -> bool {
    let mut depth: i64 = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '/' if chars.peek() == Some(&'/') => {
                while chars.next_if(|&n| n != '\n').is_some() {}
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut closed = false;
                while let Some(n) = chars.next() {
                    if n == '*' && chars.next_if_eq(&'/').is_some() {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return false;
                }
            }
            '"' | '\'' => quote = Some(c),
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth -= 1,
            _ => {}
        }
    }
    depth <= 0 && quote.is_none()
}

/// What feeding one line produced.
#[derive(Debug)]
pub enum Feed {
    /// The chunk is still open; keep reading.
    NeedMore,
    /// The chunk was run.
    Done(RoseResult<Value>),
}

/// A REPL session: the pending chunk and the interpreter it runs in.
#[derive(Debug, Default)]
pub struct Repl {
    buffer: String,
    interpreter: Interpreter,
}

impl Repl {
    /// Creates a session with a fresh interpreter.
    pub fn new() -> Self {
        Self::default()
    }

    /// The prompt to show before the next line.
    pub fn prompt(&self) -> &'static str {
        if self.buffer.is_empty() {
            PROMPT
        } else {
            CONTINUATION_PROMPT
        }
    }

    /// Appends `line` and runs the chunk once it is complete.
    pub fn feed(&mut self, line: &str) -> Feed {
        self.buffer.push_str(line);
        self.buffer.push('\n');
        if !is_input_complete(&self.buffer) {
            return Feed::NeedMore;
        }
        let chunk = std::mem::take(&mut self.buffer);
        let result = check(&chunk, SOURCE_NAME).and_then(|program| self.interpreter.evaluate(&program));
        if let Err(err) = &result {
            tracing::debug!(error = %err, "discarding failed chunk");
        }
        Feed::Done(result)
    }
}

/// Runs the REPL on stdin/stdout until `exit` or end of input.
pub fn run() -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut repl = Repl::new();
    let mut line = String::new();

    writeln!(stdout, "Rose REPL (type 'exit' to quit)")?;
    loop {
        write!(stdout, "{}", repl.prompt())?;
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim_end_matches(['\n', '\r']);
        if input.trim() == "exit" {
            break;
        }
        match repl.feed(input) {
            Feed::NeedMore => {}
            Feed::Done(Ok(value)) => writeln!(stdout, "{value}")?,
            Feed::Done(Err(err)) => eprintln!("{err}"),
        }
    }
    writeln!(stdout, "Bye!")?;
    Ok(())
}
