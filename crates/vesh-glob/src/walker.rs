//! Async, cancellable pattern expansion, generic over `WalkerFs`.
//!
//! The pattern is split into path components. Components are expanded left
//! to right against a frontier of directories:
//!
//! ```text
//!   literal component   → existence check, no listing (so `.` and `..` work)
//!   wildcard component  → list, sort by name, match each entry
//!   component with `**` → walk every descendant, match the joined remainder
//! ```
//!
//! Matches come out in discovery order: frontier order first, then name
//! order within a directory.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::glob::match_segments;
use crate::pattern::{Pattern, Segment, WildKind};
use crate::{GlobError, WalkerDirEntry, WalkerFs};

/// A pattern cut at its path separators.
#[derive(Debug, Default)]
struct Plan {
    absolute: bool,
    components: Vec<Vec<Segment>>,
    /// Pattern ended with a separator: only directories match.
    dir_only: bool,
}

impl Plan {
    fn new(segments: &[Segment]) -> Self {
        let mut plan = Plan::default();
        let mut current: Vec<Segment> = Vec::new();
        let mut seen_content = false;
        let mut ends_with_separator = false;

        let boundary = |current: &mut Vec<Segment>, plan: &mut Plan, seen_content: bool| {
            if current.is_empty() {
                if !seen_content {
                    plan.absolute = true;
                }
            } else {
                plan.components.push(std::mem::take(current));
            }
        };

        for seg in segments {
            match seg {
                Segment::Slash => {
                    boundary(&mut current, &mut plan, seen_content);
                    ends_with_separator = true;
                }
                Segment::Literal(text) => {
                    for (i, piece) in text.split('/').enumerate() {
                        if i > 0 {
                            boundary(&mut current, &mut plan, seen_content);
                            ends_with_separator = true;
                        }
                        if !piece.is_empty() {
                            current.push(Segment::Literal(piece.to_string()));
                            seen_content = true;
                            ends_with_separator = false;
                        }
                    }
                }
                Segment::Wild(_) => {
                    current.push(seg.clone());
                    seen_content = true;
                    ends_with_separator = false;
                }
            }
        }
        if !current.is_empty() {
            plan.components.push(current);
        }
        plan.dir_only = ends_with_separator && !plan.components.is_empty();
        plan
    }
}

fn is_literal(component: &[Segment]) -> bool {
    component.iter().all(|s| matches!(s, Segment::Literal(_)))
}

fn has_star_star(component: &[Segment]) -> bool {
    component
        .iter()
        .any(|s| matches!(s, Segment::Wild(w) if w.kind == WildKind::StarStar))
}

fn literal_text(component: &[Segment]) -> String {
    component
        .iter()
        .filter_map(|s| match s {
            Segment::Literal(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

/// Expands glob patterns against a `WalkerFs`.
///
/// # Examples
/// ```ignore
/// use vesh_glob::{Globber, LocalFs, Pattern};
///
/// let fs = LocalFs::new();
/// let globber = Globber::new(&fs, "/project");
/// let paths = globber.expand(&Pattern::parse("src/*.rs")?).await?;
/// ```
pub struct Globber<'a, F: WalkerFs> {
    fs: &'a F,
    cwd: PathBuf,
    cancel: CancellationToken,
}

impl<'a, F: WalkerFs> Globber<'a, F> {
    /// Create a globber resolving relative patterns against `cwd`.
    pub fn new(fs: &'a F, cwd: impl AsRef<Path>) -> Self {
        Self {
            fs,
            cwd: cwd.as_ref().to_path_buf(),
            cancel: CancellationToken::new(),
        }
    }

    /// Observe `cancel` between filesystem calls.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn check_cancel(&self) -> Result<(), GlobError> {
        if self.cancel.is_cancelled() {
            tracing::debug!("glob aborted");
            return Err(GlobError::Interrupted);
        }
        Ok(())
    }

    /// Map a displayed path prefix onto the filesystem.
    fn resolve(&self, text: &str) -> PathBuf {
        if text.is_empty() {
            self.cwd.clone()
        } else if Path::new(text).is_absolute() {
            PathBuf::from(text)
        } else {
            self.cwd.join(text)
        }
    }

    async fn sorted_entries(&self, dir: &str) -> Result<Vec<(String, bool, bool)>, GlobError> {
        self.check_cancel()?;
        let path = self.resolve(dir);
        let entries = match self.fs.list_dir(&path).await {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(dir = %path.display(), "skipping unreadable directory: {err}");
                return Ok(Vec::new());
            }
        };
        let mut entries: Vec<_> = entries
            .into_iter()
            .map(|e| (e.name().to_string(), e.is_dir(), e.is_symlink()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    /// Expand `pattern`, returning matching paths in discovery order.
    pub async fn expand(&self, pattern: &Pattern) -> Result<Vec<String>, GlobError> {
        let plan = Plan::new(&pattern.segments);

        let root = match (&pattern.dir_override, plan.absolute) {
            (Some(dir), true) => format!("{}/", dir.trim_end_matches('/')),
            (Some(dir), false) => dir.clone(),
            (None, true) => "/".to_string(),
            (None, false) => String::new(),
        };

        if plan.components.is_empty() {
            // Nothing but separators: the root itself.
            return Ok(if root.is_empty() { Vec::new() } else { vec![root] });
        }

        let mut frontier = vec![root];
        let mut results = Vec::new();
        let last = plan.components.len() - 1;

        for (idx, component) in plan.components.iter().enumerate() {
            let is_last = idx == last;

            if has_star_star(component) {
                let mut rest = Vec::new();
                for (i, comp) in plan.components[idx..].iter().enumerate() {
                    if i > 0 {
                        rest.push(Segment::Slash);
                    }
                    rest.extend(comp.iter().cloned());
                }
                for dir in &frontier {
                    self.walk_descendants(dir, &rest, plan.dir_only, &mut results).await?;
                }
                return Ok(results);
            }

            let mut next = Vec::new();
            if is_literal(component) {
                let name = literal_text(component);
                for dir in &frontier {
                    self.check_cancel()?;
                    let text = format!("{dir}{name}");
                    let path = self.resolve(&text);
                    if is_last {
                        let found = if plan.dir_only {
                            self.fs.is_dir(&path).await
                        } else {
                            self.fs.exists(&path).await
                        };
                        if found {
                            results.push(finish(text, plan.dir_only));
                        }
                    } else if self.fs.is_dir(&path).await {
                        next.push(format!("{text}/"));
                    }
                }
            } else {
                for dir in &frontier {
                    for (name, entry_is_dir, _) in self.sorted_entries(dir).await? {
                        if !match_segments(component, &name) {
                            continue;
                        }
                        let text = format!("{dir}{name}");
                        if is_last {
                            if !plan.dir_only || entry_is_dir {
                                results.push(finish(text, plan.dir_only));
                            }
                        } else if entry_is_dir {
                            next.push(format!("{text}/"));
                        }
                    }
                }
            }
            frontier = next;
        }

        Ok(results)
    }

    /// Pre-order walk of everything below `dir`, matching relative paths
    /// against `rest`. Symlinked directories are matched but not entered.
    async fn walk_descendants(
        &self,
        dir: &str,
        rest: &[Segment],
        dir_only: bool,
        results: &mut Vec<String>,
    ) -> Result<(), GlobError> {
        // Stack of (relative path, is_dir, is_symlink); children are pushed
        // in reverse so the alphabetically-first entry is visited first.
        let mut stack: Vec<(String, bool, bool)> = self.sorted_entries(dir).await?.into_iter().rev().collect();

        while let Some((rel, is_dir, is_symlink)) = stack.pop() {
            if match_segments(rest, &rel) && (!dir_only || is_dir) {
                results.push(finish(format!("{dir}{rel}"), dir_only));
            }
            if is_dir && !is_symlink {
                let children = self.sorted_entries(&format!("{dir}{rel}")).await?;
                for (name, child_dir, child_link) in children.into_iter().rev() {
                    stack.push((format!("{rel}/{name}"), child_dir, child_link));
                }
            }
        }
        Ok(())
    }
}

fn finish(text: String, dir_only: bool) -> String {
    if dir_only { format!("{text}/") } else { text }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalFs;
    use std::fs;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/lib")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::write(root.join("a.txt"), "").unwrap();
        fs::write(root.join("b.txt"), "").unwrap();
        fs::write(root.join("c.md"), "").unwrap();
        fs::write(root.join(".dot.txt"), "").unwrap();
        fs::write(root.join("src/main.rs"), "").unwrap();
        fs::write(root.join("src/lib/mod.rs"), "").unwrap();
        dir
    }

    async fn expand(dir: &Path, pattern: &str) -> Vec<String> {
        let fs = LocalFs::new();
        Globber::new(&fs, dir)
            .expand(&Pattern::parse(pattern).unwrap())
            .await
            .unwrap()
    }

    #[test]
    fn plan_splits_literals_at_separators() {
        let plan = Plan::new(&Pattern::parse("/a/b*/").unwrap().segments);
        assert!(plan.absolute);
        assert!(plan.dir_only);
        assert_eq!(plan.components.len(), 2);
    }

    #[tokio::test]
    async fn star_in_cwd_sorted() {
        let dir = tree();
        assert_eq!(expand(dir.path(), "*.txt").await, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn star_skips_hidden() {
        let dir = tree();
        let all = expand(dir.path(), "*").await;
        assert_eq!(all, vec!["a.txt", "b.txt", "c.md", "src"]);
    }

    #[tokio::test]
    async fn nested_component() {
        let dir = tree();
        assert_eq!(expand(dir.path(), "s*/*.rs").await, vec!["src/main.rs"]);
    }

    #[tokio::test]
    async fn star_star_crosses_directories() {
        let dir = tree();
        assert_eq!(
            expand(dir.path(), "**.rs").await,
            vec!["src/lib/mod.rs", "src/main.rs"]
        );
    }

    #[tokio::test]
    async fn trailing_slash_matches_directories() {
        let dir = tree();
        assert_eq!(expand(dir.path(), "*/").await, vec!["src/"]);
    }

    #[tokio::test]
    async fn literal_component_checks_existence() {
        let dir = tree();
        assert_eq!(expand(dir.path(), "src/main.rs").await, vec!["src/main.rs"]);
        assert!(expand(dir.path(), "src/nope.rs").await.is_empty());
    }

    #[tokio::test]
    async fn absolute_pattern_keeps_prefix() {
        let dir = tree();
        let text = format!("{}/*.md", dir.path().display());
        let expected = format!("{}/c.md", dir.path().display());
        assert_eq!(expand(Path::new("/"), &text).await, vec![expected]);
    }

    #[tokio::test]
    async fn dir_override_replaces_root() {
        let dir = tree();
        let mut pattern = Pattern::parse("/*.md").unwrap();
        pattern.dir_override = Some(dir.path().display().to_string());
        let fs = LocalFs::new();
        let got = Globber::new(&fs, "/").expand(&pattern).await.unwrap();
        assert_eq!(got, vec![format!("{}/c.md", dir.path().display())]);
    }

    #[tokio::test]
    async fn cancelled_expansion_is_interrupted() {
        let dir = tree();
        let fs = LocalFs::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = Globber::new(&fs, dir.path())
            .with_cancel(cancel)
            .expand(&Pattern::parse("*").unwrap())
            .await;
        assert!(matches!(result, Err(GlobError::Interrupted)));
    }
}
