//! AST type definitions.

use std::fmt;

/// Byte range of a node in its source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
}

impl Span {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    /// An empty span at `pos`.
    pub fn at(pos: usize) -> Self {
        Self { begin: pos, end: pos }
    }
}

/// A named piece of source text. Diagnostics render positions in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub text: String,
}

impl Source {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// 1-based line and column of a byte offset (clamped to the text).
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let mut line = 1;
        let mut col = 1;
        for (i, c) in self.text.char_indices() {
            if i >= offset {
                break;
            }
            if c == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    /// `name:line:col` for the start of `span`.
    pub fn describe(&self, span: Span) -> String {
        let (line, col) = self.position(span.begin);
        format!("{}:{}:{}", self.name, line, col)
    }
}

/// A sequence of statements, e.g. a lambda body or a capture body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    pub span: Span,
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Command invocation: `head arg1 arg2 &opt=value`
    Form(Form),
    /// Variable assignment: `name = value`
    Assignment(Assignment),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub span: Span,
    pub head: Compound,
    pub args: Vec<Compound>,
    pub opts: Vec<MapPair>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub span: Span,
    pub name: String,
    pub value: Compound,
}

/// Juxtaposed indexings, combined by outer product: `a{b,c}*`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    pub span: Span,
    pub indexings: Vec<Indexing>,
}

/// A primary followed by zero or more `[...]` index operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Indexing {
    pub span: Span,
    pub head: Primary,
    pub indices: Vec<Array>,
}

/// Whitespace-separated compounds, e.g. the inside of `[a b c]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Array {
    pub span: Span,
    pub compounds: Vec<Compound>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Primary {
    pub span: Span,
    pub kind: PrimaryKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrimaryKind {
    Bareword(String),
    SingleQuoted(String),
    DoubleQuoted(String),
    /// Variable text without the `$`: `[@][ns:]name`.
    Variable(String),
    /// Wildcard source text: `*`, `**` or `?`.
    Wildcard(String),
    /// A leading `~`.
    Tilde,
    /// `?(chunk)`
    ExceptionCapture(Chunk),
    /// `(chunk)`
    OutputCapture(Chunk),
    /// `[a b c]`
    List(Vec<Compound>),
    /// `[args &opt=default]{ body }`
    Lambda(Lambda),
    /// `[&k=v &flag]`
    Map(Vec<MapPair>),
    /// `{a,b}` or `{1..3}` when `is_range`.
    Braced { elements: Vec<Compound>, is_range: bool },
}

impl PrimaryKind {
    /// Short name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            PrimaryKind::Bareword(_) => "bareword",
            PrimaryKind::SingleQuoted(_) => "single-quoted",
            PrimaryKind::DoubleQuoted(_) => "double-quoted",
            PrimaryKind::Variable(_) => "variable",
            PrimaryKind::Wildcard(_) => "wildcard",
            PrimaryKind::Tilde => "tilde",
            PrimaryKind::ExceptionCapture(_) => "exception capture",
            PrimaryKind::OutputCapture(_) => "output capture",
            PrimaryKind::List(_) => "list",
            PrimaryKind::Lambda(_) => "lambda",
            PrimaryKind::Map(_) => "map",
            PrimaryKind::Braced { .. } => "braced",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    /// Argument names; each must be a literal string. The last may start with `@`.
    pub args: Vec<Compound>,
    /// Options with their default values.
    pub opts: Vec<MapPair>,
    pub body: Chunk,
}

/// `&key=value`, or `&key` with no value.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPair {
    pub span: Span,
    pub key: Compound,
    pub value: Option<Compound>,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.begin, self.end)
    }
}
