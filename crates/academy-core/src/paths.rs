use crate::error::{CoreError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const HOME_ENV: &str = "ACADEMY_HOME";
pub const STATE_DIR: &str = ".academy";
pub const SESSION_DIR: &str = "session";
pub const CONFIG_FILE: &str = "config.yaml";

pub const TOKEN_FILE: &str = "token";
pub const REFRESH_TOKEN_FILE: &str = "refresh_token";
pub const USER_FILE: &str = "user.json";
pub const PROFILE_FILE: &str = "profile.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Resolve the state directory.
///
/// Priority:
/// 1. `explicit` (the `--home` flag, which clap also fills from `ACADEMY_HOME`)
/// 2. `ACADEMY_HOME` environment variable
/// 3. `~/.academy`
pub fn state_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    state_dir_with(explicit, |key| std::env::var_os(key))
}

/// [`state_dir`] with the environment read through `lookup`.
pub fn state_dir_with(
    explicit: Option<&Path>,
    lookup: impl Fn(&str) -> Option<OsString>,
) -> Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }
    if let Some(p) = lookup(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(p));
    }
    home::home_dir()
        .map(|h| h.join(STATE_DIR))
        .ok_or(CoreError::HomeNotFound)
}

pub fn config_path(state_dir: &Path) -> PathBuf {
    state_dir.join(CONFIG_FILE)
}

pub fn session_dir(state_dir: &Path) -> PathBuf {
    state_dir.join(SESSION_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_dir_wins() {
        let dir = TempDir::new().unwrap();
        assert_eq!(state_dir(Some(dir.path())).unwrap(), dir.path());
    }

    #[test]
    fn home_env_used_without_explicit_dir() {
        let dir = TempDir::new().unwrap();
        let env_dir = dir.path().to_path_buf();
        let resolved = state_dir_with(None, |key| {
            (key == HOME_ENV).then(|| env_dir.clone().into_os_string())
        })
        .unwrap();
        assert_eq!(resolved, dir.path());
    }

    #[test]
    fn explicit_dir_beats_home_env() {
        let dir = TempDir::new().unwrap();
        let resolved =
            state_dir_with(Some(dir.path()), |_| Some(OsString::from("/elsewhere"))).unwrap();
        assert_eq!(resolved, dir.path());
    }

    #[test]
    fn blank_home_env_falls_back_to_home_dir() {
        let resolved = state_dir_with(None, |_| Some(OsString::new()));
        if let Some(home) = home::home_dir() {
            assert_eq!(resolved.unwrap(), home.join(STATE_DIR));
        }
    }

    #[test]
    fn session_files_live_under_session_dir() {
        let root = Path::new("/tmp/academy");
        assert_eq!(session_dir(root), Path::new("/tmp/academy/session"));
        assert_eq!(config_path(root), Path::new("/tmp/academy/config.yaml"));
    }
}
