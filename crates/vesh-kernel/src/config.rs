//! Evaluator configuration.

use std::path::PathBuf;

use crate::pipe_stream::PIPE_BUFFER_SIZE;

/// Capacity of the typed value channel used by output capture.
pub const CAPTURE_BUFFER_SIZE: usize = 16;

/// Most elements a braced range may produce.
pub const MAX_RANGE_LEN: usize = 1 << 20;

#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Name of this evaluator (for identification in logs).
    pub name: String,

    /// Directory relative glob patterns are expanded against.
    pub cwd: PathBuf,

    /// Typed-value channel capacity for output capture. Producers wait when
    /// it is full.
    pub capture_buffer_size: usize,

    /// Byte pipe capacity for output capture.
    pub pipe_buffer_size: usize,

    /// Used as the current user's home directory instead of asking the OS.
    pub home_override: Option<PathBuf>,

    /// A braced range longer than this is "bad range" instead of being built.
    pub max_range_len: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")),
            capture_buffer_size: CAPTURE_BUFFER_SIZE,
            pipe_buffer_size: PIPE_BUFFER_SIZE,
            home_override: None,
            max_range_len: MAX_RANGE_LEN,
        }
    }
}

impl EvalConfig {
    /// A throwaway evaluator working in the process's current directory.
    pub fn transient() -> Self {
        Self {
            name: "transient".to_string(),
            ..Self::default()
        }
    }

    /// An evaluator pinned to `cwd` whose home directory is `cwd` as well,
    /// so neither globbing nor tilde expansion looks outside it.
    pub fn isolated(cwd: impl Into<PathBuf>) -> Self {
        let cwd = cwd.into();
        Self {
            name: "isolated".to_string(),
            home_override: Some(cwd.clone()),
            cwd,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    pub fn with_capture_buffer_size(mut self, size: usize) -> Self {
        self.capture_buffer_size = size;
        self
    }

    pub fn with_pipe_buffer_size(mut self, size: usize) -> Self {
        self.pipe_buffer_size = size;
        self
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home_override = Some(home.into());
        self
    }

    pub fn with_max_range_len(mut self, len: usize) -> Self {
        self.max_range_len = len;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EvalConfig::default();
        assert_eq!(config.capture_buffer_size, 16);
        assert_eq!(config.pipe_buffer_size, 64 * 1024);
        assert!(config.home_override.is_none());
        assert_eq!(config.max_range_len, MAX_RANGE_LEN);
    }

    #[test]
    fn isolated_pins_home_to_cwd() {
        let config = EvalConfig::isolated("/tmp/box").with_capture_buffer_size(2);
        assert_eq!(config.cwd, PathBuf::from("/tmp/box"));
        assert_eq!(config.home_override, Some(PathBuf::from("/tmp/box")));
        assert_eq!(config.capture_buffer_size, 2);
        assert_eq!(config.name, "isolated");
    }
}
