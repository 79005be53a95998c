//! Glob pattern data model.
//!
//! A pattern is an ordered sequence of segments:
//! - `Literal` text, which may itself contain `/`
//! - `Slash`, a path separator placeholder (runs of `/` collapse into one)
//! - `Wild`, a wildcard: `?` (one char), `*` (any run within a path
//!   component) or `**` (any run, crossing path components)
//!
//! Wildcards carry a `match_hidden` flag and an optional set of matchers that
//! restrict which characters they accept.

use std::fmt;

use thiserror::Error;

/// Errors when building glob patterns from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("bad wildcard: {0:?}")]
    BadWildcard(String),
    #[error("dangling escape at end of pattern {0:?}")]
    DanglingEscape(String),
}

/// The shape of a wildcard segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WildKind {
    /// `?`
    Question,
    /// `*`
    Star,
    /// `**`
    StarStar,
}

/// Named character classes accepted as wildcard restrictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Control,
    Digit,
    Graphic,
    Letter,
    Lower,
    Mark,
    Number,
    Print,
    Punct,
    Space,
    Symbol,
    Title,
    Upper,
}

const ASCII_SYMBOLS: &str = "$+<=>^`|~";

impl CharClass {
    /// Look up a class by its modifier name (`digit`, `upper`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let class = match name {
            "control" => CharClass::Control,
            "digit" => CharClass::Digit,
            "graphic" => CharClass::Graphic,
            "letter" => CharClass::Letter,
            "lower" => CharClass::Lower,
            "mark" => CharClass::Mark,
            "number" => CharClass::Number,
            "print" => CharClass::Print,
            "punct" => CharClass::Punct,
            "space" => CharClass::Space,
            "symbol" => CharClass::Symbol,
            "title" => CharClass::Title,
            "upper" => CharClass::Upper,
            _ => return None,
        };
        Some(class)
    }

    /// Check whether `c` belongs to this class.
    pub fn contains(self, c: char) -> bool {
        match self {
            CharClass::Control => c.is_control(),
            CharClass::Digit => c.is_ascii_digit(),
            CharClass::Graphic => !c.is_control() && (c == ' ' || !c.is_whitespace() || is_space_separator(c)),
            CharClass::Letter => c.is_alphabetic(),
            CharClass::Lower => c.is_lowercase(),
            CharClass::Mark => is_combining_mark(c),
            CharClass::Number => c.is_numeric(),
            CharClass::Print => !c.is_control() && (c == ' ' || !c.is_whitespace()),
            CharClass::Punct => c.is_ascii_punctuation() && !ASCII_SYMBOLS.contains(c),
            CharClass::Space => c.is_whitespace(),
            CharClass::Symbol => ASCII_SYMBOLS.contains(c),
            CharClass::Title => is_titlecase(c),
            CharClass::Upper => c.is_uppercase(),
        }
    }
}

fn is_space_separator(c: char) -> bool {
    matches!(c, '\u{00A0}' | '\u{1680}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}')
}

fn is_combining_mark(c: char) -> bool {
    matches!(
        c,
        '\u{0300}'..='\u{036F}'
            | '\u{1AB0}'..='\u{1AFF}'
            | '\u{1DC0}'..='\u{1DFF}'
            | '\u{20D0}'..='\u{20FF}'
            | '\u{FE20}'..='\u{FE2F}'
    )
}

fn is_titlecase(c: char) -> bool {
    matches!(
        c,
        '\u{01C5}'
            | '\u{01C8}'
            | '\u{01CB}'
            | '\u{01F2}'
            | '\u{1F88}'..='\u{1F8F}'
            | '\u{1F98}'..='\u{1F9F}'
            | '\u{1FA8}'..='\u{1FAF}'
            | '\u{1FBC}'
            | '\u{1FCC}'
            | '\u{1FFC}'
    )
}

/// A restriction on the characters a wildcard accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Matcher {
    Class(CharClass),
    /// Any character of the set.
    Set(String),
    /// Inclusive character range.
    Range(char, char),
}

impl Matcher {
    pub fn accepts(&self, c: char) -> bool {
        match self {
            Matcher::Class(class) => class.contains(c),
            Matcher::Set(set) => set.contains(c),
            Matcher::Range(from, to) => *from <= c && c <= *to,
        }
    }
}

/// A wildcard segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Wild {
    pub kind: WildKind,
    /// Whether the wildcard may match a `.` at the start of a path component.
    pub match_hidden: bool,
    /// When non-empty, a character is accepted if any matcher accepts it.
    pub matchers: Vec<Matcher>,
}

impl Wild {
    pub fn new(kind: WildKind) -> Self {
        Self {
            kind,
            match_hidden: false,
            matchers: Vec::new(),
        }
    }

    /// Check whether a single character may be consumed by this wildcard.
    pub fn accepts(&self, c: char) -> bool {
        self.matchers.is_empty() || self.matchers.iter().any(|m| m.accepts(c))
    }
}

/// One segment of a glob pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Literal(String),
    Slash,
    Wild(Wild),
}

impl Segment {
    pub fn is_wild(&self) -> bool {
        matches!(self, Segment::Wild(_))
    }
}

/// Translate the source text of a wildcard token into one segment.
///
/// ```
/// use vesh_glob::{wildcard_to_segment, Segment, WildKind};
///
/// let seg = wildcard_to_segment("**").unwrap();
/// assert!(matches!(seg, Segment::Wild(w) if w.kind == WildKind::StarStar));
/// assert!(wildcard_to_segment("*?").is_err());
/// ```
pub fn wildcard_to_segment(text: &str) -> Result<Segment, PatternError> {
    let kind = match text {
        "*" => WildKind::Star,
        "**" => WildKind::StarStar,
        "?" => WildKind::Question,
        _ => return Err(PatternError::BadWildcard(text.to_string())),
    };
    Ok(Segment::Wild(Wild::new(kind)))
}

/// A glob pattern: segments plus an optional directory override.
///
/// The directory override is an absolute base path that replaces the
/// pattern's own root; it is set by tilde expansion of `~/...` patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pattern {
    pub segments: Vec<Segment>,
    pub dir_override: Option<String>,
}

impl Pattern {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            dir_override: None,
        }
    }

    /// Parse pattern text.
    ///
    /// `/` becomes `Slash` (runs collapse), `?`, `*` and `**` become
    /// wildcards (three or more stars are still `**`), `\` escapes the next
    /// character, everything else accumulates into literals.
    ///
    /// ```
    /// use vesh_glob::{Pattern, Segment};
    ///
    /// let p = Pattern::parse("src/*.rs").unwrap();
    /// assert_eq!(p.segments.len(), 4);
    /// assert_eq!(p.segments[1], Segment::Slash);
    /// assert_eq!(p.to_string(), "src/*.rs");
    /// ```
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(escaped) => literal.push(escaped),
                    None => return Err(PatternError::DanglingEscape(text.to_string())),
                },
                '/' => {
                    flush_literal(&mut literal, &mut segments);
                    while chars.peek() == Some(&'/') {
                        chars.next();
                    }
                    segments.push(Segment::Slash);
                }
                '?' => {
                    flush_literal(&mut literal, &mut segments);
                    segments.push(Segment::Wild(Wild::new(WildKind::Question)));
                }
                '*' => {
                    flush_literal(&mut literal, &mut segments);
                    let mut stars = 1;
                    while chars.peek() == Some(&'*') {
                        chars.next();
                        stars += 1;
                    }
                    let kind = if stars == 1 { WildKind::Star } else { WildKind::StarStar };
                    segments.push(Segment::Wild(Wild::new(kind)));
                }
                _ => literal.push(c),
            }
        }
        flush_literal(&mut literal, &mut segments);

        Ok(Pattern::new(segments))
    }

    /// Append segments in place.
    pub fn append(&mut self, segments: impl IntoIterator<Item = Segment>) {
        self.segments.extend(segments);
    }

    /// The last segment if it is a wildcard.
    pub fn last_wild_mut(&mut self) -> Option<&mut Wild> {
        match self.segments.last_mut() {
            Some(Segment::Wild(wild)) => Some(wild),
            _ => None,
        }
    }
}

fn flush_literal(literal: &mut String, segments: &mut Vec<Segment>) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dir) = &self.dir_override {
            write!(f, "{dir}")?;
        }
        for seg in &self.segments {
            match seg {
                Segment::Literal(text) => {
                    for c in text.chars() {
                        if matches!(c, '*' | '?' | '\\') {
                            write!(f, "\\")?;
                        }
                        write!(f, "{c}")?;
                    }
                }
                Segment::Slash => write!(f, "/")?,
                Segment::Wild(wild) => match wild.kind {
                    WildKind::Question => write!(f, "?")?,
                    WildKind::Star => write!(f, "*")?,
                    WildKind::StarStar => write!(f, "**")?,
                },
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parse_literal_only() {
        let p = Pattern::parse("main.rs").unwrap();
        assert_eq!(p.segments, vec![Segment::Literal("main.rs".into())]);
    }

    #[test]
    fn parse_collapses_slashes() {
        let p = Pattern::parse("a//b").unwrap();
        assert_eq!(
            p.segments,
            vec![
                Segment::Literal("a".into()),
                Segment::Slash,
                Segment::Literal("b".into()),
            ]
        );
    }

    #[rstest]
    #[case("?", WildKind::Question)]
    #[case("*", WildKind::Star)]
    #[case("**", WildKind::StarStar)]
    #[case("***", WildKind::StarStar)]
    fn parse_wildcards(#[case] text: &str, #[case] kind: WildKind) {
        let p = Pattern::parse(text).unwrap();
        assert_eq!(p.segments, vec![Segment::Wild(Wild::new(kind))]);
    }

    #[test]
    fn parse_escape_keeps_star_literal() {
        let p = Pattern::parse(r"a\*b").unwrap();
        assert_eq!(p.segments, vec![Segment::Literal("a*b".into())]);
        assert_eq!(p.to_string(), r"a\*b");
    }

    #[test]
    fn parse_dangling_escape_fails() {
        assert!(matches!(Pattern::parse("a\\"), Err(PatternError::DanglingEscape(_))));
    }

    #[rstest]
    #[case("*")]
    #[case("**")]
    #[case("?")]
    fn wildcard_to_segment_accepts(#[case] text: &str) {
        assert!(wildcard_to_segment(text).unwrap().is_wild());
    }

    #[rstest]
    #[case("")]
    #[case("***")]
    #[case("*?")]
    #[case("x")]
    fn wildcard_to_segment_rejects(#[case] text: &str) {
        let err = wildcard_to_segment(text).unwrap_err();
        assert_eq!(err, PatternError::BadWildcard(text.to_string()));
    }

    #[test]
    fn char_class_lookup() {
        assert_eq!(CharClass::from_name("digit"), Some(CharClass::Digit));
        assert_eq!(CharClass::from_name("bogus"), None);
        assert!(CharClass::Digit.contains('7'));
        assert!(!CharClass::Digit.contains('x'));
        assert!(CharClass::Upper.contains('Q'));
        assert!(CharClass::Symbol.contains('+'));
        assert!(!CharClass::Punct.contains('+'));
        assert!(CharClass::Punct.contains('!'));
    }

    #[test]
    fn wild_matchers_union() {
        let mut wild = Wild::new(WildKind::Star);
        assert!(wild.accepts('x'));
        wild.matchers.push(Matcher::Range('a', 'c'));
        wild.matchers.push(Matcher::Set("xyz".into()));
        assert!(wild.accepts('b'));
        assert!(wild.accepts('y'));
        assert!(!wild.accepts('m'));
    }
}
