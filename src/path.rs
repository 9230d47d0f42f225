// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine where the profile document lives, and apply `PATH` updates that
//! package managers ask for after installing software.

use std::{
    env::{self, JoinPathsError},
    ffi::OsString,
    path::PathBuf,
};
use tracing::{debug, info, instrument};

/// Environment variable overriding the profile document location.
pub const PROFILE_FILE_ENV: &str = "DEVSTRAP_PROFILE_FILE";

/// Determine default absolute path to profile document.
///
/// Uses `$DEVSTRAP_PROFILE_FILE` when set. Otherwise uses XDG Base Directory
/// path `$XDG_CONFIG_HOME/devstrap/profile.toml`, or the platform equivalent.
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`PathError::NoWayHome`] if configuration directory cannot be
///   determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_profile_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(PROFILE_FILE_ENV).filter(|path| !path.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    dirs::config_dir()
        .map(|path| path.join("devstrap").join("profile.toml"))
        .ok_or(PathError::NoWayHome)
}

/// Prepend entries to `PATH` of the current process.
///
/// Entries already on `PATH` are left where they are. Only affects this
/// process and the children it spawns afterwards. Returns the entries that
/// were actually added.
///
/// # Errors
///
/// - Return [`PathError::JoinPaths`] if an entry contains the platform path
///   separator.
#[instrument(skip(entries), level = "debug")]
pub fn prepend_to_path(entries: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let current = env::var_os("PATH").unwrap_or_default();
    let existing = env::split_paths(&current).collect::<Vec<_>>();

    let mut added: Vec<PathBuf> = Vec::new();
    for entry in entries {
        if existing.contains(entry) || added.contains(entry) {
            debug!("{:?} already on PATH", entry.display());
            continue;
        }
        added.push(entry.clone());
    }

    if added.is_empty() {
        return Ok(added);
    }

    let joined: OsString = env::join_paths(added.iter().chain(existing.iter()))?;
    env::set_var("PATH", &joined);
    info!("prepended {} entries to PATH for this session", added.len());

    Ok(added)
}

/// Path resolution error types.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// No way to determine user's configuration directory.
    ///
    /// # See Also
    ///
    /// - [`dirs::config_dir`](https://docs.rs/dirs/latest/dirs/fn.config_dir.html)
    #[error("cannot determine absolute path to user's configuration directory")]
    NoWayHome,

    /// Entries cannot be joined into a `PATH` value.
    #[error(transparent)]
    JoinPaths(#[from] JoinPathsError),
}

/// Friendly result alias :3
pub type Result<T, E = PathError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("DEVSTRAP_PROFILE_FILE", "/home/blah/profile.toml")])]
    fn profile_path_honors_override() -> anyhow::Result<()> {
        assert_eq!(default_profile_path()?, PathBuf::from("/home/blah/profile.toml"));

        Ok(())
    }

    #[cfg(unix)]
    #[sealed_test(env = [("PATH", "/usr/bin:/bin")])]
    fn prepend_skips_entries_already_present() -> anyhow::Result<()> {
        let added = prepend_to_path(&[
            PathBuf::from("/opt/homebrew/bin"),
            PathBuf::from("/usr/bin"),
            PathBuf::from("/opt/homebrew/bin"),
            PathBuf::from("/opt/homebrew/sbin"),
        ])?;
        assert_eq!(
            added,
            vec![PathBuf::from("/opt/homebrew/bin"), PathBuf::from("/opt/homebrew/sbin")]
        );
        assert_eq!(
            env::var("PATH")?,
            "/opt/homebrew/bin:/opt/homebrew/sbin:/usr/bin:/bin"
        );

        // Second application changes nothing.
        assert!(prepend_to_path(&[PathBuf::from("/opt/homebrew/bin")])?.is_empty());
        assert_eq!(
            env::var("PATH")?,
            "/opt/homebrew/bin:/opt/homebrew/sbin:/usr/bin:/bin"
        );

        Ok(())
    }

    #[cfg(unix)]
    #[sealed_test(env = [("PATH", "/usr/bin")])]
    fn prepend_rejects_separator_in_entry() {
        let result = prepend_to_path(&[PathBuf::from("/bad:entry")]);
        assert!(matches!(result, Err(PathError::JoinPaths(_))));
    }
}
