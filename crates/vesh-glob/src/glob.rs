//! Segment matching.
//!
//! Matches a sequence of pattern segments against a name:
//! - `Literal` must match verbatim
//! - `Slash` matches exactly one `/`
//! - `?` matches one character other than `/`
//! - `*` matches zero or more characters other than `/`
//! - `**` matches zero or more characters including `/`
//!
//! A wildcard never consumes a `.` at the start of a path component unless
//! it was marked `match_hidden`.

use std::cell::Cell;

use crate::pattern::{Segment, Wild, WildKind};

/// Maximum number of recursive calls for one match. Protects against
/// adversarial patterns like `*a*a*a*...*a` that cause O(n^k) backtracking.
/// Counted as total work (calls), not stack depth, to bound actual CPU cost.
const MAX_MATCH_CALLS: usize = 100_000;

/// Match `name` against `segments`. The whole name must be consumed.
///
/// # Examples
/// ```
/// use vesh_glob::{match_segments, Pattern};
///
/// let p = Pattern::parse("*.rs").unwrap();
/// assert!(match_segments(&p.segments, "main.rs"));
/// assert!(!match_segments(&p.segments, ".hidden.rs"));
/// assert!(!match_segments(&p.segments, "main.go"));
/// ```
pub fn match_segments(segments: &[Segment], name: &str) -> bool {
    let input: Vec<char> = name.chars().collect();
    let calls = Cell::new(0usize);
    match_bounded(segments, 0, &input, 0, &calls)
}

fn at_component_start(input: &[char], ii: usize) -> bool {
    ii == 0 || input[ii - 1] == '/'
}

/// Whether `wild` may consume the character at `ii`.
fn wild_takes(wild: &Wild, input: &[char], ii: usize) -> bool {
    let c = input[ii];
    if c == '/' {
        return wild.kind == WildKind::StarStar;
    }
    if c == '.' && !wild.match_hidden && at_component_start(input, ii) {
        return false;
    }
    wild.accepts(c)
}

/// Work-bounded recursive matching with backtracking for `*` and `**`.
///
/// Returns `false` (non-match) if total recursive calls exceed
/// `MAX_MATCH_CALLS`.
fn match_bounded(segments: &[Segment], si: usize, input: &[char], ii: usize, calls: &Cell<usize>) -> bool {
    let count = calls.get() + 1;
    calls.set(count);
    if count > MAX_MATCH_CALLS {
        return false;
    }

    let Some(seg) = segments.get(si) else {
        return ii >= input.len();
    };

    match seg {
        Segment::Literal(text) => {
            let mut pos = ii;
            for c in text.chars() {
                if pos >= input.len() || input[pos] != c {
                    return false;
                }
                pos += 1;
            }
            match_bounded(segments, si + 1, input, pos, calls)
        }

        Segment::Slash => {
            if ii < input.len() && input[ii] == '/' {
                match_bounded(segments, si + 1, input, ii + 1, calls)
            } else {
                false
            }
        }

        Segment::Wild(wild) => match wild.kind {
            WildKind::Question => {
                if ii < input.len() && wild_takes(wild, input, ii) {
                    match_bounded(segments, si + 1, input, ii + 1, calls)
                } else {
                    false
                }
            }
            WildKind::Star | WildKind::StarStar => {
                // Try consuming 0, 1, 2, ... characters, stopping at the
                // first one the wildcard refuses.
                let mut end = ii;
                loop {
                    if match_bounded(segments, si + 1, input, end, calls) {
                        return true;
                    }
                    if end >= input.len() || !wild_takes(wild, input, end) {
                        return false;
                    }
                    end += 1;
                }
            }
        },
    }
}
