//! Variables and namespaces.
//!
//! A `Variable` is a shared cell: cloning it clones the handle, not the
//! value, so a closure that captured a variable sees later writes made
//! through the defining scope.
//!
//! Variable references are written `[@][ns:]name`:
//!
//! | namespace  | resolves in                                 |
//! |------------|---------------------------------------------|
//! | (none)     | local, then enclosing (`up`), then builtin  |
//! | `local:`   | the innermost scope only                    |
//! | `up:`      | captured / enclosing scopes only            |
//! | `builtin:` | the builtin namespace                       |
//! | `E:`       | the process environment                     |

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::ErrorKind;
use crate::value::Value;

/// A storage location for one value.
#[derive(Debug, Clone)]
pub enum Variable {
    Cell(Arc<RwLock<Value>>),
    /// Reads the named environment variable; empty string when unset.
    Env(String),
}

impl Variable {
    pub fn new(value: Value) -> Self {
        Variable::Cell(Arc::new(RwLock::new(value)))
    }

    pub fn get(&self) -> Value {
        match self {
            Variable::Cell(cell) => cell.read().unwrap_or_else(|e| e.into_inner()).clone(),
            Variable::Env(name) => Value::String(std::env::var(name).unwrap_or_default()),
        }
    }

    pub fn set(&self, value: Value) -> Result<(), ErrorKind> {
        match self {
            Variable::Cell(cell) => {
                *cell.write().unwrap_or_else(|e| e.into_inner()) = value;
                Ok(())
            }
            Variable::Env(name) => Err(ErrorKind::ReadOnlyVariable(format!("E:{name}"))),
        }
    }

    /// True if both handles refer to the same storage.
    pub fn same_cell(&self, other: &Variable) -> bool {
        match (self, other) {
            (Variable::Cell(a), Variable::Cell(b)) => Arc::ptr_eq(a, b),
            (Variable::Env(a), Variable::Env(b)) => a == b,
            _ => false,
        }
    }
}

/// A run-time namespace: name to variable. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct Ns {
    vars: Arc<RwLock<HashMap<String, Variable>>>,
}

impl Ns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Variable> {
        self.vars.read().unwrap_or_else(|e| e.into_inner()).get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.vars.read().unwrap_or_else(|e| e.into_inner()).contains_key(name)
    }

    /// Bind `name` to `variable`, replacing any previous binding.
    pub fn set(&self, name: impl Into<String>, variable: Variable) {
        self.vars
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.into(), variable);
    }

    /// The cell bound to `name`, binding a fresh one holding `initial` when
    /// there is none.
    pub fn cell(&self, name: &str, initial: Value) -> Variable {
        self.vars
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(name.to_string())
            .or_insert_with(|| Variable::new(initial))
            .clone()
    }

    /// Write `value` into the existing cell for `name`, or bind a new cell.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), ErrorKind> {
        match self.get(name) {
            Some(variable) => variable.set(value),
            None => {
                self.set(name, Variable::new(value));
                Ok(())
            }
        }
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .vars
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

/// The namespace part of a variable reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Unqualified: local, then up, then builtin.
    Any,
    Local,
    Up,
    Builtin,
    Env,
}

impl Namespace {
    /// Look up a namespace prefix (without the colon).
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        let ns = match prefix {
            "" => Namespace::Any,
            "local" => Namespace::Local,
            "up" => Namespace::Up,
            "builtin" => Namespace::Builtin,
            "E" => Namespace::Env,
            _ => return None,
        };
        Some(ns)
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::Any => "",
            Namespace::Local => "local:",
            Namespace::Up => "up:",
            Namespace::Builtin => "builtin:",
            Namespace::Env => "E:",
        }
    }
}

/// A parsed variable reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRef<'a> {
    pub explode: bool,
    /// Namespace prefix without the colon; empty when unqualified.
    pub ns: &'a str,
    pub name: &'a str,
}

/// Split `[@][ns:]name`. The namespace ends at the last colon.
///
/// ```
/// use vesh_kernel::scope::parse_variable;
///
/// let v = parse_variable("@up:xs");
/// assert!(v.explode);
/// assert_eq!((v.ns, v.name), ("up", "xs"));
/// ```
pub fn parse_variable(text: &str) -> VarRef<'_> {
    let (explode, rest) = match text.strip_prefix('@') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (ns, name) = match rest.rfind(':') {
        Some(i) => (&rest[..i], &rest[i + 1..]),
        None => ("", rest),
    };
    VarRef { explode, ns, name }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn set_and_get_variable() {
        let ns = Ns::new();
        ns.set("x", Variable::new("a".into()));
        assert_eq!(ns.get("x").unwrap().get(), Value::from("a"));
        assert!(ns.get("y").is_none());
    }

    #[test]
    fn clones_share_cells() {
        let ns = Ns::new();
        ns.assign("x", "a".into()).unwrap();
        let held = ns.get("x").unwrap();
        ns.assign("x", "b".into()).unwrap();
        assert_eq!(held.get(), Value::from("b"));
        assert!(held.same_cell(&ns.get("x").unwrap()));
    }

    #[test]
    fn cell_binds_once() {
        let ns = Ns::new();
        let first = ns.cell("x", Value::Ok);
        first.set("a".into()).unwrap();
        let second = ns.cell("x", Value::Ok);
        assert!(first.same_cell(&second));
        assert_eq!(second.get(), Value::from("a"));
    }

    #[test]
    fn env_variables_are_read_only() {
        let var = Variable::Env("VESH_TEST_SURELY_UNSET".into());
        assert_eq!(var.get(), Value::from(""));
        assert!(matches!(var.set("x".into()), Err(ErrorKind::ReadOnlyVariable(_))));
    }

    #[rstest]
    #[case("x", false, "", "x")]
    #[case("@x", true, "", "x")]
    #[case("local:x", false, "local", "x")]
    #[case("@E:PATH", true, "E", "PATH")]
    #[case("a:b:c", false, "a:b", "c")]
    #[case("", false, "", "")]
    fn variable_parsing(#[case] text: &str, #[case] explode: bool, #[case] ns: &str, #[case] name: &str) {
        assert_eq!(parse_variable(text), VarRef { explode, ns, name });
    }

    #[test]
    fn namespace_prefixes() {
        assert_eq!(Namespace::from_prefix("up"), Some(Namespace::Up));
        assert_eq!(Namespace::from_prefix("mod"), None);
        assert_eq!(Namespace::Env.prefix(), "E:");
    }
}
