//! Error types for the prompt compiler.

use std::fmt;

/// An error that occurred while parsing or building a prompt.
///
/// Parse errors carry a 1-based source position. Build-time errors
/// (unbound symbol, arity, eval) have none; `line` stays 0 and the
/// position is left out of the rendered message.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub message: String,
    pub line: usize,
    pub col: usize,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    SyntaxError,
    UnboundSymbol,
    ArityError,
    EvalError,
}

impl CompileError {
    pub fn syntax(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::SyntaxError,
        }
    }

    pub fn unbound(symbol: &str, line: usize, col: usize) -> Self {
        Self {
            message: format!("undefined symbol '${}'", symbol),
            line,
            col,
            kind: ErrorKind::UnboundSymbol,
        }
    }

    pub fn arity(symbol: &str, expected: usize, got: usize, line: usize, col: usize) -> Self {
        Self {
            message: format!(
                "'${}' takes {} argument(s), got {}",
                symbol, expected, got
            ),
            line,
            col,
            kind: ErrorKind::ArityError,
        }
    }

    pub fn eval(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::EvalError,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(f, "[{}:{}] ", self.line, self.col)?;
        }
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for CompileError {}
