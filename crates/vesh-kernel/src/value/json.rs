//! JSON rendering of values.

use serde::{Serialize, Serializer};
use serde_json::{Map as JsonMap, Value as Json, json};

use super::{Value, sorted_entries};

/// Convert a value into JSON.
///
/// Map keys use their display form. Values with no JSON counterpart render
/// as text (`<closure>`), an object (`{"exception": message}`) or `null`
/// for the OK sentinel.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::String(s) => Json::String(s.clone()),
        Value::Bool(b) => Json::Bool(*b),
        Value::List(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Map(entries) => {
            let mut obj = JsonMap::new();
            for (k, v) in sorted_entries(entries) {
                obj.insert(k.to_string(), value_to_json(v));
            }
            Json::Object(obj)
        }
        Value::Glob(pattern) => Json::String(pattern.to_string()),
        Value::Closure(_) => Json::String("<closure>".to_string()),
        Value::Exception(e) => json!({ "exception": e.kind.to_string() }),
        Value::Ok => Json::Null,
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        value_to_json(self).serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Exception};
    use std::collections::HashMap;
    use std::sync::Arc;

    #[test]
    fn nested_structures() {
        let mut m = HashMap::new();
        m.insert(Value::from("xs"), Value::list(vec!["a".into(), Value::Bool(false)]));
        let json = value_to_json(&Value::map(m));
        assert_eq!(json, json!({ "xs": ["a", false] }));
    }

    #[test]
    fn exception_and_ok() {
        let exc = Value::Exception(Arc::new(Exception::new(ErrorKind::Failure("boom".into()))));
        assert_eq!(value_to_json(&exc), json!({ "exception": "boom" }));
        assert_eq!(value_to_json(&Value::Ok), Json::Null);
    }

    #[test]
    fn serialize_goes_through_json() {
        let text = serde_json::to_string(&Value::list(vec!["a".into()])).unwrap();
        assert_eq!(text, r#"["a"]"#);
    }
}
