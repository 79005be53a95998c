//! Compiler: syntax tree to operation tree.
//!
//! Compilation resolves everything that can be known statically:
//!
//! - variable references are checked against the lexical scope stack
//! - names a lambda body reads from enclosing scopes become its capture set
//! - literals and wildcards become constant values
//!
//! The scope stack holds one name set per lambda nesting level. Level 0 is
//! seeded with the evaler's global names. A failure anywhere aborts the
//! whole unit with a `CompileError` pointing at the offending node.

mod chunk;
mod value;

use std::collections::HashSet;
use std::sync::Arc;

use crate::ast::{Chunk, Compound, Source, Span};
use crate::error::CompileError;
use crate::op::{Op, ValuesOp};
use crate::scope::Namespace;

pub type CompileResult<T> = Result<T, CompileError>;

pub struct Compiler {
    source: Arc<Source>,
    scopes: Vec<HashSet<String>>,
    builtin: HashSet<String>,
    /// Names the innermost lambda being compiled reads from enclosing scopes.
    capture: HashSet<String>,
}

impl Compiler {
    pub fn new(
        source: Arc<Source>,
        global_names: impl IntoIterator<Item = String>,
        builtin_names: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            source,
            scopes: vec![global_names.into_iter().collect()],
            builtin: builtin_names.into_iter().collect(),
            capture: HashSet::new(),
        }
    }

    pub fn compile_chunk(&mut self, chunk: &Chunk) -> CompileResult<Op> {
        self.chunk(chunk)
    }

    pub fn compile_compound(&mut self, compound: &Compound) -> CompileResult<ValuesOp> {
        self.compound(compound)
    }

    /// Names declared at the outermost level, including any added by
    /// assignments compiled so far.
    pub fn global_names(&self) -> impl Iterator<Item = &str> {
        self.scopes[0].iter().map(String::as_str)
    }

    fn error(&self, span: Span, message: impl Into<String>) -> CompileError {
        CompileError::new(&self.source, span, message)
    }

    fn this_scope(&mut self) -> &mut HashSet<String> {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    fn in_this_scope(&self, name: &str) -> bool {
        self.scopes.last().is_some_and(|scope| scope.contains(name))
    }

    /// True if an enclosing (not innermost) scope declares `name`; records
    /// it as captured.
    fn capture_from_upper(&mut self, name: &str) -> bool {
        let upper = &self.scopes[..self.scopes.len() - 1];
        if upper.iter().any(|scope| scope.contains(name)) {
            self.capture.insert(name.to_string());
            true
        } else {
            false
        }
    }

    /// Check that a read of `ns:name` can resolve.
    fn register_variable_get(&mut self, ns: Namespace, name: &str) -> bool {
        match ns {
            Namespace::Local => self.in_this_scope(name),
            Namespace::Up => self.capture_from_upper(name),
            Namespace::Builtin => self.builtin.contains(name),
            Namespace::Env => true,
            Namespace::Any => {
                self.in_this_scope(name) || self.capture_from_upper(name) || self.builtin.contains(name)
            }
        }
    }

    /// Pick the scope an assignment writes to, declaring `name` locally
    /// when no scope has it yet.
    fn register_variable_set(&mut self, name: &str) -> Namespace {
        if self.in_this_scope(name) {
            Namespace::Local
        } else if self.capture_from_upper(name) {
            Namespace::Up
        } else {
            self.this_scope().insert(name.to_string());
            Namespace::Local
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;

    fn compiler(globals: &[&str]) -> Compiler {
        Compiler::new(
            Arc::new(Source::new("test", "")),
            globals.iter().map(|s| s.to_string()),
            ["true".to_string()],
        )
    }

    #[test]
    fn unknown_variable_is_a_compile_error() {
        let err = compiler(&[]).compile_compound(&var("nope")).unwrap_err();
        assert_eq!(err.message, "variable $nope not found");
    }

    #[test]
    fn known_names_compile() {
        let mut c = compiler(&["x"]);
        assert!(c.compile_compound(&var("x")).is_ok());
        assert!(c.compile_compound(&var("local:x")).is_ok());
        assert!(c.compile_compound(&var("true")).is_ok());
        assert!(c.compile_compound(&var("builtin:true")).is_ok());
        assert!(c.compile_compound(&var("E:PATH")).is_ok());
    }

    #[test]
    fn up_at_top_level_is_not_found() {
        let err = compiler(&["x"]).compile_compound(&var("up:x")).unwrap_err();
        assert_eq!(err.message, "variable $up:x not found");
    }

    #[test]
    fn unknown_namespace() {
        let err = compiler(&["x"]).compile_compound(&var("mod:x")).unwrap_err();
        assert_eq!(err.message, "variable $mod:x not found");
    }

    #[test]
    fn assignment_declares_in_current_scope() {
        let mut c = compiler(&[]);
        c.compile_chunk(&chunk(vec![assign("y", word("1")), form(word("put"), vec![var("y")])]))
            .unwrap();
        assert!(c.global_names().any(|n| n == "y"));
    }
}
