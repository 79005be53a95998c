//! Tilde and glob expansion of compound results.

use std::path::Path;

use vesh_glob::{GlobError, Segment};

use crate::error::ErrorKind;
use crate::frame::Frame;
use crate::paths::{current_home, home_of};
use crate::value::{GlobPattern, Value};

fn home_override(fm: &Frame) -> Option<&Path> {
    fm.config().home_override.as_deref()
}

/// Expand a leading `~` or `~user` in one value.
///
/// Strings split at the first `/` into user name and rest. For patterns the
/// user name must end inside the first literal segment; a pattern starting
/// with a separator is rooted at the invoking user's home instead.
pub async fn tilde(value: Value, fm: &Frame) -> Result<Value, ErrorKind> {
    match value {
        Value::String(s) => {
            let (user, rest) = s.split_once('/').unwrap_or((s.as_str(), ""));
            let home = home_of(user, home_override(fm)).await?;
            let path = if rest.is_empty() { home } else { home.join(rest) };
            Ok(Value::String(path.to_string_lossy().into_owned()))
        }
        Value::Glob(mut gp) => {
            match gp.pattern.segments.first() {
                Some(Segment::Literal(text)) => {
                    let i = text.find('/').ok_or(ErrorKind::CannotDetermineUserName)?;
                    let home = home_of(&text[..i], home_override(fm)).await?;
                    let rewritten = format!("{}{}", home.to_string_lossy(), &text[i..]);
                    gp.pattern.segments[0] = Segment::Literal(rewritten);
                }
                Some(Segment::Slash) => {
                    let home = current_home(home_override(fm))?;
                    gp.pattern.dir_override = Some(home.to_string_lossy().into_owned());
                }
                Some(Segment::Wild(_)) | None => return Err(ErrorKind::BadGlobPattern),
            }
            Ok(Value::Glob(gp))
        }
        other => Err(ErrorKind::TildeOnValue(other.kind())),
    }
}

/// Expand one pattern against the filesystem, dropping excluded names.
pub async fn glob(gp: &GlobPattern, fm: &Frame) -> Result<Vec<Value>, ErrorKind> {
    tracing::trace!(pattern = %gp, "globbing");
    let names = fm.globber().expand(&gp.pattern).await.map_err(|err| match err {
        GlobError::Interrupted => ErrorKind::Interrupted,
    })?;
    let values: Vec<Value> = names
        .into_iter()
        .filter(|name| !gp.buts.contains(name))
        .map(Value::String)
        .collect();
    if values.is_empty() && !gp.flags.nomatch_ok {
        return Err(ErrorKind::WildcardNoMatch);
    }
    Ok(values)
}

/// Replace every pattern in `values` by its matches, in place. Other values
/// keep their positions.
pub async fn expand_globs(values: Vec<Value>, fm: &Frame) -> Result<Vec<Value>, ErrorKind> {
    if !values.iter().any(Value::is_glob) {
        return Ok(values);
    }
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::Glob(gp) => out.extend(glob(&gp, fm).await?),
            other => out.push(other),
        }
    }
    Ok(out)
}
