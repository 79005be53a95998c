//! Outer-product concatenation.
//!
//! Juxtaposed fragments combine pairwise: `{a,b}{x,y}` is
//! `outer_product([a b], [x y], cat)` = `[ax ay bx by]`. `cat` is defined
//! for strings and glob patterns only:
//!
//! | lhs     | rhs     | result                                            |
//! |---------|---------|---------------------------------------------------|
//! | string  | string  | concatenated string                               |
//! | string  | pattern | `[Literal(lhs), rhs segment]`, rhs flags and buts  |
//! | pattern | string  | lhs with `Literal(rhs)` appended                  |
//! | pattern | pattern | lhs + rhs segment, flags unioned, buts appended    |

use vesh_glob::{Pattern, Segment};

use crate::error::ErrorKind;
use crate::value::{GlobPattern, Value};

/// Concatenate two values. Never modifies its inputs.
pub fn cat(lhs: &Value, rhs: &Value) -> Result<Value, ErrorKind> {
    match (lhs, rhs) {
        (Value::String(l), Value::String(r)) => Ok(Value::String(format!("{l}{r}"))),
        (Value::String(l), Value::Glob(r)) => {
            let mut segments = literal(l);
            segments.extend(r.segments().first().cloned());
            Ok(Value::Glob(GlobPattern {
                pattern: Pattern::new(segments),
                flags: r.flags,
                buts: r.buts.clone(),
            }))
        }
        (Value::Glob(l), Value::String(r)) => {
            let mut gp = l.clone();
            gp.pattern.append(literal(r));
            Ok(Value::Glob(gp))
        }
        (Value::Glob(l), Value::Glob(r)) => {
            let mut gp = l.clone();
            gp.pattern.append(r.segments().first().cloned());
            gp.flags = gp.flags.union(r.flags);
            gp.buts.extend(r.buts.iter().cloned());
            Ok(Value::Glob(gp))
        }
        _ => Err(ErrorKind::UnsupportedConcat {
            lhs: lhs.kind(),
            rhs: rhs.kind(),
        }),
    }
}

/// The empty string contributes no segment.
fn literal(text: &str) -> Vec<Segment> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Segment::Literal(text.to_string())]
    }
}

/// Combine every `(a, b)` pair in row-major order: all of `bs` for `as_[0]`,
/// then all of `bs` for `as_[1]`, and so on. The first error aborts.
pub fn outer_product<F>(as_: &[Value], bs: &[Value], mut combine: F) -> Result<Vec<Value>, ErrorKind>
where
    F: FnMut(&Value, &Value) -> Result<Value, ErrorKind>,
{
    let mut out = Vec::with_capacity(as_.len() * bs.len());
    for a in as_ {
        for b in bs {
            out.push(combine(a, b)?);
        }
    }
    Ok(out)
}
