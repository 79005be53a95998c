//! Runtime values.
//!
//! `Value` is a closed union. Behavior that only some kinds support is
//! expressed as capability traits and reached through `as_indexable` /
//! `as_iterable`; a value without the capability is an error at the point of
//! use, never a silent fallback.
//!
//! Values are immutable. Lists and maps are shared behind `Arc`; glob
//! patterns are plain data and are copied before being modified.

mod glob;
mod index;
mod json;

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::closure::Closure;
use crate::error::Exception;

pub use glob::{GlobFlags, GlobPattern};
pub use index::{Indexable, Iterable};
pub use json::value_to_json;

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Bool(bool),
    List(Arc<Vec<Value>>),
    /// Keys are compared by value equality; order is irrelevant.
    Map(Arc<HashMap<Value, Value>>),
    Glob(GlobPattern),
    /// Compared by identity.
    Closure(Arc<Closure>),
    /// An error turned into a value by exception capture. Compared by identity.
    Exception(Arc<Exception>),
    /// The success sentinel produced by exception capture.
    Ok,
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }

    pub fn map(entries: HashMap<Value, Value>) -> Self {
        Value::Map(Arc::new(entries))
    }

    /// The kind name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Glob(_) => "glob-pattern",
            Value::Closure(_) => "fn",
            Value::Exception(_) | Value::Ok => "exception",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_glob(&self) -> bool {
        matches!(self, Value::Glob(_))
    }

    pub fn as_indexable(&self) -> Option<&dyn Indexable> {
        match self {
            Value::String(s) => Some(s),
            Value::List(items) => Some(&**items),
            Value::Map(entries) => Some(&**entries),
            Value::Glob(pattern) => Some(pattern),
            _ => None,
        }
    }

    pub fn as_iterable(&self) -> Option<&dyn Iterable> {
        match self {
            Value::String(s) => Some(s),
            Value::List(items) => Some(&**items),
            Value::Map(entries) => Some(&**entries),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Glob(a), Value::Glob(b)) => a == b,
            (Value::Closure(a), Value::Closure(b)) => Arc::ptr_eq(a, b),
            (Value::Exception(a), Value::Exception(b)) => Arc::ptr_eq(a, b),
            (Value::Ok, Value::Ok) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Bool(b) => b.hash(state),
            Value::List(items) => items.hash(state),
            // Equal maps have equal sizes; entry order is unspecified.
            Value::Map(entries) => entries.len().hash(state),
            Value::Glob(pattern) => pattern.hash(state),
            Value::Closure(c) => (Arc::as_ptr(c) as usize).hash(state),
            Value::Exception(e) => (Arc::as_ptr(e) as usize).hash(state),
            Value::Ok => {}
        }
    }
}

/// Map entries ordered by their keys' text, for stable output.
pub(crate) fn sorted_entries(entries: &HashMap<Value, Value>) -> Vec<(&Value, &Value)> {
    let mut sorted: Vec<_> = entries.iter().collect();
    sorted.sort_by_cached_key(|(k, _)| k.to_string());
    sorted
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Bool(true) => write!(f, "$true"),
            Value::Bool(false) => write!(f, "$false"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) if entries.is_empty() => write!(f, "[&]"),
            Value::Map(entries) => {
                write!(f, "[")?;
                for (i, (k, v)) in sorted_entries(entries).into_iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "&{k}={v}")?;
                }
                write!(f, "]")
            }
            Value::Glob(pattern) => write!(f, "{pattern}"),
            Value::Closure(_) => write!(f, "<closure>"),
            Value::Exception(e) => write!(f, "<exception: {}>", e.kind),
            Value::Ok => write!(f, "$ok"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn kinds() {
        assert_eq!(Value::from("a").kind(), "string");
        assert_eq!(Value::Bool(true).kind(), "bool");
        assert_eq!(Value::list(vec![]).kind(), "list");
        assert_eq!(Value::map(HashMap::new()).kind(), "map");
        assert_eq!(Value::Ok.kind(), "exception");
    }

    #[test]
    fn display_nests() {
        let v = Value::list(vec!["a".into(), Value::list(vec!["b".into()]), Value::Bool(true)]);
        assert_eq!(v.to_string(), "[a [b] $true]");

        let mut m = HashMap::new();
        m.insert(Value::from("k2"), Value::from("v2"));
        m.insert(Value::from("k1"), Value::from("v1"));
        assert_eq!(Value::map(m).to_string(), "[&k1=v1 &k2=v2]");
        assert_eq!(Value::map(HashMap::new()).to_string(), "[&]");
    }

    #[test]
    fn lists_compare_by_value() {
        let a = Value::list(vec!["x".into()]);
        let b = Value::list(vec!["x".into()]);
        assert_eq!(a, b);
    }

    #[test]
    fn exceptions_compare_by_identity() {
        let e = Arc::new(Exception::new(ErrorKind::BadRange));
        let a = Value::Exception(e.clone());
        let b = Value::Exception(Arc::new(Exception::new(ErrorKind::BadRange)));
        assert_eq!(a, Value::Exception(e));
        assert_ne!(a, b);
    }

    #[test]
    fn capabilities() {
        assert!(Value::from("s").as_indexable().is_some());
        assert!(Value::Bool(true).as_indexable().is_none());
        assert!(Value::Ok.as_iterable().is_none());
        assert!(Value::map(HashMap::new()).as_iterable().is_some());
    }
}
