//! Centralised error hierarchy for the **Rox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants of [`LoxError`].  This
//! enables a uniform `Result<T>` alias throughout the crate and ergonomic
//! inter‑operation with `anyhow`, while still preserving rich diagnostic
//! detail.
//!
//! The evaluator works with its own [`RuntimeError`], which may carry a thrown
//! script [`Value`] and is therefore not `Send`.  It is flattened into
//! [`LoxError::Runtime`] once it escapes [`Interpreter::interpret`].
//!
//! The module **does not** print diagnostics itself.
//!
//! [`Interpreter::interpret`]: crate::interpreter::Interpreter::interpret

use std::io;
use thiserror::Error;

use log::info;

use crate::token::Token;
use crate::value::Value;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.  `location` is `" at end"` or `" at 'x'"`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// Static‑analysis or resolution failure (e.g. early‑binding errors).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error that reached the top level.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

fn location(token: &Token) -> String {
    if token.is_eof() {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            location: location(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            location: location(token),
            line: token.line,
        }
    }

    /// Source line the diagnostic points at, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoxError::Lex { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Resolve { line, .. }
            | LoxError::Runtime { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Process exit code the CLI uses for this error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoxError::Runtime { .. } => 70,
            LoxError::Io(_) | LoxError::Utf8(_) => 74,
            _ => 65,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Error raised while evaluating a program.
///
/// Both variants are catchable by `try/catch`.  `Thrown` carries the value of
/// a `throw` statement; `Error` is raised by the interpreter itself.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{message}\n[line {line}]")]
    Error { message: String, line: usize },

    #[error("Uncaught exception: {value}\n[line {line}]")]
    Thrown { value: Value, line: usize },
}

impl RuntimeError {
    /// Error located at `token`.
    pub fn new<S: Into<String>>(token: &Token, msg: S) -> Self {
        Self::at_line(token.line, msg)
    }

    pub fn at_line<S: Into<String>>(line: usize, msg: S) -> Self {
        RuntimeError::Error {
            message: msg.into(),
            line,
        }
    }

    pub fn thrown(value: Value, line: usize) -> Self {
        RuntimeError::Thrown { value, line }
    }

    pub fn line(&self) -> usize {
        match self {
            RuntimeError::Error { line, .. } | RuntimeError::Thrown { line, .. } => *line,
        }
    }

    /// The value a `catch` clause binds: the thrown value itself, or the
    /// message of an interpreter error as a string.
    pub fn into_value(self) -> Value {
        match self {
            RuntimeError::Error { message, .. } => Value::from(message),
            RuntimeError::Thrown { value, .. } => value,
        }
    }
}

impl From<RuntimeError> for LoxError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Error { message, line } => LoxError::Runtime { message, line },
            RuntimeError::Thrown { value, line } => LoxError::Runtime {
                message: format!("Uncaught exception: {}", value),
                line,
            },
        }
    }
}

/// Result alias used by the evaluator.
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;
