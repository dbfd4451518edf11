// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Repository reference resolution.
//!
//! Users can point `homesick clone` at three kinds of things:
//!
//! 1. A directory that already exists on the local file system. It gets
//!    symlinked into the repos directory as is.
//! 2. A GitHub shorthand like `user/repo`, which expands to
//!    `git://github.com/user/repo.git` and is cloned into `user/repo`.
//! 3. Anything Git itself understands as a remote, e.g.,
//!    `git://host/path/to.git`, `git@host:path/to.git`, `http://host/path/to`,
//!    or a host alias like `gitolite:repo.git`. The castle is named after
//!    the last path segment minus any `.git` suffix.
//!
//! Anything else is rejected before Git is ever invoked.

use std::path::{Path, PathBuf};

/// Resolved repository reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoRef {
    /// Existing directory on the local file system.
    Local(PathBuf),

    /// Remote repository to clone.
    Remote {
        /// URL handed to `git clone`.
        url: String,

        /// Castle name relative to the repos directory.
        destination: PathBuf,
    },
}

impl RepoRef {
    /// Resolve a user supplied repository reference.
    ///
    /// Local paths win over everything else, so a directory named `user/repo`
    /// in the current working directory is not mistaken for a GitHub
    /// shorthand.
    ///
    /// # Errors
    ///
    /// - Return [`FormatError`] if reference matches no known form.
    pub fn resolve(reference: impl AsRef<str>) -> Result<Self> {
        let reference = reference.as_ref();
        if reference.is_empty() {
            return Err(FormatError(reference.into()));
        }

        if Path::new(reference).exists() {
            return Ok(Self::Local(PathBuf::from(reference)));
        }

        if let Some((user, repo)) = github_shorthand(reference) {
            return Ok(Self::Remote {
                url: format!("git://github.com/{user}/{repo}.git"),
                destination: Path::new(user).join(repo),
            });
        }

        if reference.contains('/') || scp_like(reference) {
            let name = castle_name(reference).ok_or_else(|| FormatError(reference.into()))?;
            return Ok(Self::Remote {
                url: reference.into(),
                destination: PathBuf::from(name),
            });
        }

        Err(FormatError(reference.into()))
    }
}

fn github_shorthand(reference: &str) -> Option<(&str, &str)> {
    let (user, repo) = reference.split_once('/')?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if is_github_name(user) && is_github_name(repo) {
        Some((user, repo))
    } else {
        None
    }
}

fn is_github_name(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

// Forms like `host:path` where neither side is empty.
fn scp_like(reference: &str) -> bool {
    match reference.split_once(':') {
        Some((host, path)) => !host.is_empty() && !path.is_empty() && !path.contains(':'),
        None => false,
    }
}

fn castle_name(reference: &str) -> Option<&str> {
    let trimmed = reference.trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':'])
        .next()
        .filter(|segment| !segment.is_empty())?;
    let name = last.strip_suffix(".git").unwrap_or(last);

    match name {
        "" | "." | ".." => None,
        name => Some(name),
    }
}

/// Repository reference matches no known form.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown repository reference format: {0:?}")]
pub struct FormatError(pub String);

/// Friendly result alias :3
type Result<T, E = FormatError> = std::result::Result<T, E>;
