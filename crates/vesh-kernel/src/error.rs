//! Compile-time and run-time errors.
//!
//! - `CompileError` aborts compilation of a whole unit; it carries the
//!   offending node's span and a rendered `name:line:col` position.
//! - `ErrorKind` enumerates every run-time failure.
//! - `Exception` is an `ErrorKind` plus the span of the innermost operation
//!   that raised it. It is what operations return on failure and what
//!   exception capture turns into a value.

use thiserror::Error;

use crate::ast::{Source, Span};

/// Every way evaluation can fail at run time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("unsupported concat: {lhs} and {rhs}")]
    UnsupportedConcat { lhs: &'static str, rhs: &'static str },

    #[error("a {0} not indexable")]
    NotIndexable(&'static str),

    #[error("bad index: {0}")]
    BadIndex(String),

    #[error("index out of range")]
    IndexOutOfRange,

    #[error("no such key: {0}")]
    NoSuchKey(String),

    #[error("variable ${0} not found")]
    VariableNotFound(String),

    #[error("variable ${name} (kind {kind}) cannot be exploded")]
    CannotExplode { name: String, kind: &'static str },

    #[error("variable ${0} is read-only")]
    ReadOnlyVariable(String),

    #[error("{keys} keys but {values} values")]
    MapCountMismatch { keys: usize, values: usize },

    #[error("modifier must be string")]
    ModifierMustBeString,

    #[error("unknown modifier {0:?}")]
    UnknownModifier(String),

    #[error("bad range modifier: {0:?}")]
    BadRangeModifier(String),

    #[error("must follow wildcard")]
    MustFollowWildcard,

    #[error("bad glob pattern")]
    BadGlobPattern,

    #[error("cannot determine user name")]
    CannotDetermineUserName,

    #[error("tilde doesn't work on value of type {0}")]
    TildeOnValue(&'static str),

    #[error("cannot determine home directory")]
    NoCurrentHome,

    #[error("cannot get home directory of user {0}")]
    NoUserHome(String),

    #[error("wildcard has no match")]
    WildcardNoMatch,

    #[error("interrupted")]
    Interrupted,

    #[error("bad range")]
    BadRange,

    #[error("arity mismatch: need {need} arguments, got {got}")]
    ArityMismatch { need: usize, got: usize },

    #[error("arity mismatch: need {need} or more arguments, got {got}")]
    ArityAtLeast { need: usize, got: usize },

    #[error("{what} must be exactly one value, got {got}")]
    NotOneValue { what: &'static str, got: usize },

    #[error("unknown option {0}")]
    UnknownOption(String),

    #[error("option name must be string, got {0}")]
    OptionNotString(&'static str),

    #[error("a {0} is not callable")]
    NotCallable(&'static str),

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("output port closed")]
    PortClosed,

    #[error("io error: {0}")]
    Io(String),

    /// Raised by user code (`fail`).
    #[error("{0}")]
    Failure(String),
}

/// A run-time failure, located at the innermost operation that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct Exception {
    pub kind: ErrorKind,
    pub span: Option<Span>,
}

impl Exception {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, span: None }
    }

    /// Attach `span` unless an inner operation already did.
    pub fn with_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    /// Render with a source position when one is known.
    pub fn describe(&self, source: &Source) -> String {
        match self.span {
            Some(span) => format!("{}: {}", source.describe(span), self.kind),
            None => self.kind.to_string(),
        }
    }
}

impl From<ErrorKind> for Exception {
    fn from(kind: ErrorKind) -> Self {
        Exception::new(kind)
    }
}

impl From<std::io::Error> for ErrorKind {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::BrokenPipe => ErrorKind::PortClosed,
            _ => ErrorKind::Io(err.to_string()),
        }
    }
}

/// A diagnostic that aborts compilation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{position}: compile error: {message}")]
pub struct CompileError {
    pub message: String,
    pub span: Span,
    /// `name:line:col` of `span.begin`.
    pub position: String,
}

impl CompileError {
    pub fn new(source: &Source, span: Span, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span,
            position: source.describe(span),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn innermost_span_wins() {
        let exc = Exception::new(ErrorKind::BadRange)
            .with_span(Span::new(3, 4))
            .with_span(Span::new(0, 10));
        assert_eq!(exc.span, Some(Span::new(3, 4)));
    }

    #[test]
    fn messages_name_kinds_and_counts() {
        let concat = ErrorKind::UnsupportedConcat { lhs: "string", rhs: "list" };
        assert_eq!(concat.to_string(), "unsupported concat: string and list");
        let counts = ErrorKind::MapCountMismatch { keys: 2, values: 3 };
        assert_eq!(counts.to_string(), "2 keys but 3 values");
    }

    #[test]
    fn compile_error_renders_position() {
        let src = Source::new("t", "a\n  $x");
        let err = CompileError::new(&src, Span::new(4, 6), "variable $x not found");
        assert_eq!(err.to_string(), "t:2:3: compile error: variable $x not found");
    }
}
