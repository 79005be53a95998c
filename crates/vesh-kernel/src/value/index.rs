//! Indexing and explosion capabilities.
//!
//! Index syntax for strings and lists:
//! - `i`: one element; negative counts from the end
//! - `i:j`: a slice; either bound may be omitted
//!
//! String offsets are byte offsets and must fall on character boundaries.

use std::collections::HashMap;

use super::{Value, sorted_entries};
use crate::error::ErrorKind;

/// A value that can be indexed by another value.
pub trait Indexable {
    fn index(&self, index: &Value) -> Result<Value, ErrorKind>;
}

/// A value that can be exploded into a sequence (`$@x`).
pub trait Iterable {
    fn explode(&self) -> Vec<Value>;
}

#[derive(Debug, PartialEq, Eq)]
enum IndexSpec {
    One(usize),
    Slice(usize, usize),
}

fn parse_int(text: &str, whole: &str) -> Result<i64, ErrorKind> {
    text.parse::<i64>().map_err(|_| ErrorKind::BadIndex(whole.to_string()))
}

/// Resolve a possibly negative position against `len`. `end_ok` admits
/// `len` itself, which is a valid slice bound but not a valid element.
fn resolve(i: i64, len: usize, end_ok: bool) -> Result<usize, ErrorKind> {
    let len = len as i64;
    let i = if i < 0 { i + len } else { i };
    let limit = if end_ok { len } else { len - 1 };
    if i < 0 || i > limit {
        return Err(ErrorKind::IndexOutOfRange);
    }
    Ok(i as usize)
}

fn parse_index(index: &Value, len: usize) -> Result<IndexSpec, ErrorKind> {
    let Value::String(text) = index else {
        return Err(ErrorKind::BadIndex(index.to_string()));
    };
    match text.split_once(':') {
        Some((from, to)) => {
            let from = if from.is_empty() {
                0
            } else {
                resolve(parse_int(from, text)?, len, true)?
            };
            let to = if to.is_empty() {
                len
            } else {
                resolve(parse_int(to, text)?, len, true)?
            };
            if from > to {
                return Err(ErrorKind::IndexOutOfRange);
            }
            Ok(IndexSpec::Slice(from, to))
        }
        None => Ok(IndexSpec::One(resolve(parse_int(text, text)?, len, false)?)),
    }
}

impl Indexable for String {
    fn index(&self, index: &Value) -> Result<Value, ErrorKind> {
        let boundary = |i: usize| {
            if self.is_char_boundary(i) {
                Ok(i)
            } else {
                Err(ErrorKind::BadIndex(index.to_string()))
            }
        };
        match parse_index(index, self.len())? {
            IndexSpec::One(i) => {
                let i = boundary(i)?;
                let c = self[i..].chars().next().ok_or(ErrorKind::IndexOutOfRange)?;
                Ok(Value::String(c.to_string()))
            }
            IndexSpec::Slice(from, to) => {
                let (from, to) = (boundary(from)?, boundary(to)?);
                Ok(Value::String(self[from..to].to_string()))
            }
        }
    }
}

impl Indexable for Vec<Value> {
    fn index(&self, index: &Value) -> Result<Value, ErrorKind> {
        match parse_index(index, self.len())? {
            IndexSpec::One(i) => Ok(self[i].clone()),
            IndexSpec::Slice(from, to) => Ok(Value::list(self[from..to].to_vec())),
        }
    }
}

impl Indexable for HashMap<Value, Value> {
    fn index(&self, index: &Value) -> Result<Value, ErrorKind> {
        self.get(index)
            .cloned()
            .ok_or_else(|| ErrorKind::NoSuchKey(index.to_string()))
    }
}

impl Iterable for String {
    fn explode(&self) -> Vec<Value> {
        self.chars().map(|c| Value::String(c.to_string())).collect()
    }
}

impl Iterable for Vec<Value> {
    fn explode(&self) -> Vec<Value> {
        self.clone()
    }
}

/// Maps explode into their keys, ordered by key text.
impl Iterable for HashMap<Value, Value> {
    fn explode(&self) -> Vec<Value> {
        sorted_entries(self).into_iter().map(|(k, _)| k.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn letters() -> Vec<Value> {
        ["a", "b", "c", "d"].into_iter().map(Value::from).collect()
    }

    #[rstest]
    #[case::first("0", "a")]
    #[case::last_negative("-1", "d")]
    #[case::middle("2", "c")]
    fn list_element(#[case] index: &str, #[case] expected: &str) {
        assert_eq!(letters().index(&index.into()).unwrap(), Value::from(expected));
    }

    #[rstest]
    #[case::both("1:3", &["b", "c"])]
    #[case::open_end("2:", &["c", "d"])]
    #[case::open_start(":1", &["a"])]
    #[case::negative("-2:", &["c", "d"])]
    #[case::empty("2:2", &[])]
    fn list_slice(#[case] index: &str, #[case] expected: &[&str]) {
        let expected = Value::list(expected.iter().map(|s| Value::from(*s)).collect());
        assert_eq!(letters().index(&index.into()).unwrap(), expected);
    }

    #[rstest]
    #[case("4")]
    #[case("-5")]
    #[case("3:1")]
    #[case("0:9")]
    fn list_out_of_range(#[case] index: &str) {
        assert_eq!(letters().index(&index.into()), Err(ErrorKind::IndexOutOfRange));
    }

    #[test]
    fn list_bad_index() {
        assert_eq!(
            letters().index(&"x".into()),
            Err(ErrorKind::BadIndex("x".into()))
        );
        assert!(matches!(letters().index(&Value::Bool(true)), Err(ErrorKind::BadIndex(_))));
    }

    #[test]
    fn string_index_and_slice() {
        let s = "héllo".to_string();
        assert_eq!(s.index(&"0".into()).unwrap(), Value::from("h"));
        assert_eq!(s.index(&"1".into()).unwrap(), Value::from("é"));
        assert_eq!(s.index(&"3:".into()).unwrap(), Value::from("llo"));
        assert!(matches!(s.index(&"2".into()), Err(ErrorKind::BadIndex(_))));
    }

    #[test]
    fn map_lookup() {
        let mut m = HashMap::new();
        m.insert(Value::from("k"), Value::from("v"));
        assert_eq!(m.index(&"k".into()).unwrap(), Value::from("v"));
        assert_eq!(m.index(&"z".into()), Err(ErrorKind::NoSuchKey("z".into())));
    }

    #[test]
    fn explosion() {
        assert_eq!("ab".to_string().explode(), vec![Value::from("a"), Value::from("b")]);
        assert_eq!(letters().explode().len(), 4);
        let mut m = HashMap::new();
        m.insert(Value::from("y"), Value::Bool(true));
        m.insert(Value::from("x"), Value::Bool(true));
        assert_eq!(m.explode(), vec![Value::from("x"), Value::from("y")]);
    }
}
