//! Constructors for assembling syntax trees without a parser.
//!
//! All spans are empty; set them afterwards when a diagnostic position
//! matters.
//!
//! ```
//! use vesh_kernel::ast::build::*;
//!
//! // put a{b,c}
//! let stmt = form(word("put"), vec![compound(vec![
//!     bareword("a").into(),
//!     braced(vec![word("b"), word("c")]).into(),
//! ])]);
//! let body = chunk(vec![stmt]);
//! assert_eq!(body.stmts.len(), 1);
//! ```

use super::types::*;

fn primary(kind: PrimaryKind) -> Primary {
    Primary {
        span: Span::default(),
        kind,
    }
}

pub fn bareword(text: &str) -> Primary {
    primary(PrimaryKind::Bareword(text.to_string()))
}

pub fn quoted(text: &str) -> Primary {
    primary(PrimaryKind::SingleQuoted(text.to_string()))
}

/// `$text`; `text` may carry `@` and a namespace.
pub fn variable(text: &str) -> Primary {
    primary(PrimaryKind::Variable(text.to_string()))
}

pub fn wildcard(text: &str) -> Primary {
    primary(PrimaryKind::Wildcard(text.to_string()))
}

pub fn tilde() -> Primary {
    primary(PrimaryKind::Tilde)
}

pub fn list(elements: Vec<Compound>) -> Primary {
    primary(PrimaryKind::List(elements))
}

pub fn map(pairs: Vec<MapPair>) -> Primary {
    primary(PrimaryKind::Map(pairs))
}

pub fn braced(elements: Vec<Compound>) -> Primary {
    primary(PrimaryKind::Braced {
        elements,
        is_range: false,
    })
}

/// `{from..to}`
pub fn range(from: Compound, to: Compound) -> Primary {
    primary(PrimaryKind::Braced {
        elements: vec![from, to],
        is_range: true,
    })
}

pub fn lambda(args: Vec<Compound>, opts: Vec<MapPair>, body: Chunk) -> Primary {
    primary(PrimaryKind::Lambda(Lambda { args, opts, body }))
}

pub fn output_capture(body: Chunk) -> Primary {
    primary(PrimaryKind::OutputCapture(body))
}

pub fn exception_capture(body: Chunk) -> Primary {
    primary(PrimaryKind::ExceptionCapture(body))
}

/// `head[i1][i2]...`, one array per index operand.
pub fn index(head: Primary, indices: Vec<Vec<Compound>>) -> Indexing {
    Indexing {
        span: head.span,
        head,
        indices: indices
            .into_iter()
            .map(|compounds| Array {
                span: Span::default(),
                compounds,
            })
            .collect(),
    }
}

pub fn compound(indexings: Vec<Indexing>) -> Compound {
    Compound {
        span: Span::default(),
        indexings,
    }
}

/// A compound of a single bareword.
pub fn word(text: &str) -> Compound {
    compound(vec![bareword(text).into()])
}

/// A compound of a single variable reference.
pub fn var(text: &str) -> Compound {
    compound(vec![variable(text).into()])
}

pub fn pair(key: Compound, value: Option<Compound>) -> MapPair {
    MapPair {
        span: Span::default(),
        key,
        value,
    }
}

pub fn form(head: Compound, args: Vec<Compound>) -> Stmt {
    form_with_opts(head, args, Vec::new())
}

pub fn form_with_opts(head: Compound, args: Vec<Compound>, opts: Vec<MapPair>) -> Stmt {
    Stmt::Form(Form {
        span: Span::default(),
        head,
        args,
        opts,
    })
}

pub fn assign(name: &str, value: Compound) -> Stmt {
    Stmt::Assignment(Assignment {
        span: Span::default(),
        name: name.to_string(),
        value,
    })
}

pub fn chunk(stmts: Vec<Stmt>) -> Chunk {
    Chunk {
        span: Span::default(),
        stmts,
    }
}

impl From<Primary> for Indexing {
    fn from(head: Primary) -> Self {
        index(head, Vec::new())
    }
}

impl From<Primary> for Compound {
    fn from(head: Primary) -> Self {
        compound(vec![head.into()])
    }
}
