//! Home directory lookup for tilde expansion.
//!
//! | form      | resolved through                               |
//! |-----------|------------------------------------------------|
//! | `~`       | config override, `BaseDirs`, then `$HOME`      |
//! | `~user`   | the system password database (`/etc/passwd`)   |

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::error::ErrorKind;

const PASSWD_PATH: &str = "/etc/passwd";

/// Home directory of the invoking user.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use vesh_kernel::paths::current_home;
///
/// let home = current_home(Some(Path::new("/sandbox"))).unwrap();
/// assert_eq!(home, Path::new("/sandbox"));
/// ```
pub fn current_home(home_override: Option<&Path>) -> Result<PathBuf, ErrorKind> {
    if let Some(home) = home_override {
        return Ok(home.to_path_buf());
    }
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
        .ok_or(ErrorKind::NoCurrentHome)
}

/// Find `user`'s home directory in passwd-formatted text.
pub fn passwd_home(passwd: &str, user: &str) -> Option<PathBuf> {
    passwd
        .lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let fields: Vec<&str> = line.split(':').collect();
            (fields.len() >= 6 && fields[0] == user).then(|| PathBuf::from(fields[5]))
        })
}

/// Home directory of a named user.
pub async fn user_home(user: &str) -> Result<PathBuf, ErrorKind> {
    let passwd = tokio::fs::read_to_string(PASSWD_PATH).await.map_err(|err| {
        tracing::debug!("cannot read {PASSWD_PATH}: {err}");
        ErrorKind::NoUserHome(user.to_string())
    })?;
    passwd_home(&passwd, user).ok_or_else(|| ErrorKind::NoUserHome(user.to_string()))
}

/// Home directory of `user`, or of the invoking user when `user` is empty.
pub async fn home_of(user: &str, home_override: Option<&Path>) -> Result<PathBuf, ErrorKind> {
    if user.is_empty() {
        current_home(home_override)
    } else {
        user_home(user).await
    }
}
