// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Runtime configuration.
//!
//! Homesick does not read configuration files. Everything it needs to know
//! about where the user's home directory is, where castles live, and how
//! linking should behave is gathered into plain values here, and passed
//! explicitly to whatever needs them.

use crate::path::{default_repos_dir, home_dir, normalize, NoWayHome};

use std::{
    io,
    path::{Path, PathBuf},
};

/// Locations that homesick operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Destination root that castle contents get linked into.
    pub home_dir: PathBuf,

    /// Root directory that houses all castles.
    pub repos_dir: PathBuf,
}

impl Settings {
    /// Construct settings for given home directory.
    ///
    /// Repos directory defaults to `<home>/.homesick/repos`.
    pub fn new(home_dir: impl Into<PathBuf>) -> Self {
        let home_dir = home_dir.into();
        let repos_dir = default_repos_dir(&home_dir);

        Self {
            home_dir,
            repos_dir,
        }
    }

    /// Use a different repos directory.
    pub fn with_repos_dir(mut self, repos_dir: impl Into<PathBuf>) -> Self {
        self.repos_dir = repos_dir.into();
        self
    }

    /// Construct settings from optional user supplied overrides.
    ///
    /// Overrides are shell expanded first, so `~/dots` or `$XDG_DATA_HOME/repos`
    /// work even when quoted on the command line. Falls back to the user's
    /// actual home directory when no home override is given.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::ShellExpansion`] if an override references an
    ///   undefined variable.
    /// - Return [`ConfigError::NoWayHome`] if home directory cannot be
    ///   determined.
    pub fn from_overrides(home: Option<&str>, repos: Option<&str>) -> Result<Self> {
        let home_dir = match home {
            Some(home) => expand_path(home)?,
            None => home_dir()?,
        };

        let mut settings = Self::new(home_dir);
        if let Some(repos) = repos {
            settings = settings.with_repos_dir(expand_path(repos)?);
        }

        Ok(settings)
    }
}

/// Options that control how the castle linker places symlinks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkOptions {
    /// Replace whatever already occupies a destination path.
    pub force: bool,

    /// Create real directories and only link leaf files.
    pub overlay: bool,
}

impl LinkOptions {
    pub fn new(force: bool, overlay: bool) -> Self {
        Self { force, overlay }
    }
}

/// Perform shell expansion on a user supplied path, and make it absolute.
///
/// Relative paths are resolved against the current working directory, and
/// `.` or `..` components are resolved lexically.
///
/// # Errors
///
/// - Return [`ConfigError::ShellExpansion`] if path references an undefined
///   variable.
/// - Return [`ConfigError::Absolute`] if current working directory cannot be
///   determined.
pub fn expand_path(path: impl AsRef<str>) -> Result<PathBuf> {
    let expanded = shellexpand::full(path.as_ref())?;
    let path = Path::new(expanded.as_ref());
    let absolute = std::path::absolute(path).map_err(|source| ConfigError::Absolute {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(normalize(absolute))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to perform shell expansion on user supplied path.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Home directory cannot be determined.
    #[error(transparent)]
    NoWayHome(#[from] NoWayHome),

    /// User supplied path cannot be made absolute.
    #[error("cannot make {path:?} absolute")]
    Absolute { path: PathBuf, source: io::Error },
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("BLAH", "/home/blah")])]
    fn overrides_are_shell_expanded() -> anyhow::Result<()> {
        let result = Settings::from_overrides(Some("$BLAH"), Some("$BLAH/dots"))?;
        let expect = Settings {
            home_dir: "/home/blah".into(),
            repos_dir: "/home/blah/dots".into(),
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[sealed_test(env = [("BLAH", "/home/blah")])]
    fn repos_dir_follows_home_override() -> anyhow::Result<()> {
        let result = Settings::from_overrides(Some("$BLAH"), None)?;
        assert_eq!(result.repos_dir, PathBuf::from("/home/blah/.homesick/repos"));

        Ok(())
    }

    #[sealed_test]
    fn relative_overrides_become_absolute() -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        let result = Settings::from_overrides(Some("rel_home/"), Some("./dots/../repos"))?;
        let expect = Settings {
            home_dir: cwd.join("rel_home"),
            repos_dir: cwd.join("repos"),
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[sealed_test]
    fn undefined_variable_is_an_error() {
        let result = Settings::from_overrides(Some("$HOMESICK_SURELY_UNDEFINED"), None);
        assert!(matches!(result, Err(ConfigError::ShellExpansion(_))));
    }
}
