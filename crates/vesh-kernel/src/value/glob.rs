//! Glob pattern values.
//!
//! A `GlobPattern` is produced by a wildcard primary and grows by
//! concatenation until the enclosing compound finishes; only then is it
//! expanded against the filesystem. Indexing a pattern applies a modifier
//! and yields a modified copy:
//!
//! ```text
//!   *[nomatch-ok]      empty expansion is not an error
//!   *[match-hidden]    last wildcard may match a leading '.'
//!   *[but:foo]         drop "foo" from the results
//!   *[set:abc]         last wildcard only takes a, b or c
//!   *[range:a-z]       last wildcard only takes a..=z
//!   *[digit]           last wildcard only takes a character class
//! ```

use std::fmt;

use vesh_glob::{CharClass, Matcher, Pattern, Segment, Wild};

use super::{Indexable, Value};
use crate::error::ErrorKind;

/// Whole-pattern flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GlobFlags {
    pub nomatch_ok: bool,
}

impl GlobFlags {
    pub fn union(self, other: GlobFlags) -> GlobFlags {
        GlobFlags {
            nomatch_ok: self.nomatch_ok || other.nomatch_ok,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GlobPattern {
    pub pattern: Pattern,
    pub flags: GlobFlags,
    /// Exact results to exclude.
    pub buts: Vec<String>,
}

impl GlobPattern {
    /// A pattern of exactly one segment, as produced by a wildcard primary.
    pub fn from_segment(segment: Segment) -> Self {
        Self {
            pattern: Pattern::new(vec![segment]),
            ..Default::default()
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.pattern.segments
    }

    fn last_wild_mut(&mut self) -> Result<&mut Wild, ErrorKind> {
        self.pattern.last_wild_mut().ok_or(ErrorKind::MustFollowWildcard)
    }

    fn add_matcher(&mut self, matcher: Matcher) -> Result<(), ErrorKind> {
        self.last_wild_mut()?.matchers.push(matcher);
        Ok(())
    }
}

fn parse_range(expr: &str) -> Result<Matcher, ErrorKind> {
    let chars: Vec<char> = expr.chars().collect();
    if chars.len() != 3 || chars[1] != '-' {
        return Err(ErrorKind::BadRangeModifier(expr.to_string()));
    }
    Ok(Matcher::Range(chars[0], chars[2]))
}

impl Indexable for GlobPattern {
    fn index(&self, index: &Value) -> Result<Value, ErrorKind> {
        let Value::String(modifier) = index else {
            return Err(ErrorKind::ModifierMustBeString);
        };
        let mut gp = self.clone();
        if modifier == "nomatch-ok" {
            gp.flags.nomatch_ok = true;
        } else if let Some(but) = modifier.strip_prefix("but:") {
            gp.buts.push(but.to_string());
        } else if modifier == "match-hidden" {
            gp.last_wild_mut()?.match_hidden = true;
        } else if let Some(class) = CharClass::from_name(modifier) {
            gp.add_matcher(Matcher::Class(class))?;
        } else if let Some(set) = modifier.strip_prefix("set:") {
            gp.add_matcher(Matcher::Set(set.to_string()))?;
        } else if let Some(range) = modifier.strip_prefix("range:") {
            gp.add_matcher(parse_range(range)?)?;
        } else {
            return Err(ErrorKind::UnknownModifier(modifier.clone()));
        }
        Ok(Value::Glob(gp))
    }
}

impl fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}
