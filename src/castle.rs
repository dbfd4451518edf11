// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Castle domain representation.
//!
//! A __castle__ is a dotfile repository that lives somewhere below the repos
//! directory, i.e., `~/.homesick/repos/<name>`. Castle names can span more
//! than one path segment, so `~/.homesick/repos/wtf/zomg` is a castle named
//! `wtf/zomg`. A castle is usually a Git repository cloned from a remote, but
//! it can also be a symlink to a local directory that the user cloned by
//! path.
//!
//! # Linkable Root
//!
//! Files in a castle that should show up in the user's home directory go in
//! a top-level `home` directory. This keeps things like READMEs or install
//! scripts out of home. If a castle has no `home` directory, then the castle
//! root itself is linked.
//!
//! # See Also
//!
//! 1. [`link`]
//! 2. [`git`]

pub mod git;
pub mod link;

use git2::{ErrorCode, IndexAddOption, Repository};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, instrument};

/// A single castle in the repos directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Castle {
    name: String,
    root: PathBuf,
}

impl Castle {
    /// Name of directory holding the files to link.
    pub const HOME: &'static str = "home";

    /// Open existing castle by name.
    ///
    /// Castles are never created implicitly. The name must be relative to the
    /// repos directory, and must not step outside of it.
    ///
    /// # Errors
    ///
    /// - Return [`CastleError::InvalidName`] if name is empty, absolute, or
    ///   contains `.` or `..` components.
    /// - Return [`CastleError::NotFound`] if castle directory does not exist.
    pub fn open(repos_dir: impl AsRef<Path>, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let name = name.trim_end_matches('/').to_string();
        let relative = Path::new(&name);
        let valid = !name.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !valid {
            return Err(CastleError::InvalidName { name });
        }

        let root = repos_dir.as_ref().join(relative);
        if !root.is_dir() {
            return Err(CastleError::NotFound { name, path: root });
        }

        Ok(Self { name, root })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Directory whose contents get linked into home.
    pub fn linkable_root(&self) -> PathBuf {
        let home = self.root.join(Self::HOME);
        if home.is_dir() {
            home
        } else {
            self.root.clone()
        }
    }

    /// URL of the "origin" remote, if castle is a Git repository that has one.
    ///
    /// # Errors
    ///
    /// - Return [`CastleError::Git2`] if castle repository exists but cannot
    ///   be read.
    pub fn remote_url(&self) -> Result<Option<String>> {
        let Some(repository) = self.repository()? else {
            return Ok(None);
        };

        let remote = match repository.find_remote("origin") {
            Ok(remote) => remote,
            Err(err) if err.code() == ErrorCode::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(remote.url().map(ToString::to_string))
    }

    /// Stage path relative to castle root in the castle's index.
    ///
    /// Does nothing if castle is not a Git repository, e.g., a plain local
    /// directory that was cloned by path.
    ///
    /// # Errors
    ///
    /// - Return [`CastleError::Git2`] if libgit2 operations fail.
    #[instrument(skip(self, path), level = "debug")]
    pub fn stage(&self, path: impl AsRef<Path>) -> Result<bool> {
        let Some(repository) = self.repository()? else {
            debug!("castle {} is not a git repository", self.name);
            return Ok(false);
        };

        let mut index = repository.index()?;
        index.add_all([path.as_ref()], IndexAddOption::DEFAULT, None)?;
        index.write()?;
        debug!("staged {} in {}", path.as_ref().display(), self.name);

        Ok(true)
    }

    fn repository(&self) -> Result<Option<Repository>> {
        if !self.root.join(".git").exists() {
            return Ok(None);
        }

        Ok(Some(Repository::open(&self.root)?))
    }
}

/// All possible error types for castle interaction.
#[derive(Debug, thiserror::Error)]
pub enum CastleError {
    /// Castle does not exist in repos directory.
    #[error("castle {name:?} does not exist at {path:?}")]
    NotFound { name: String, path: PathBuf },

    /// Castle name cannot address a directory below the repos directory.
    #[error("invalid castle name {name:?}")]
    InvalidName { name: String },

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
type Result<T, E = CastleError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;
    use std::fs;

    #[test_case(""; "empty")]
    #[test_case("/etc"; "absolute")]
    #[test_case("../escape"; "parent")]
    #[test_case("wtf/../zomg"; "nested parent")]
    #[test_case("./zomg"; "current dir")]
    #[test]
    fn reject_invalid_name(name: &str) {
        let result = Castle::open("/nonexistent/repos", name);
        assert!(matches!(result, Err(CastleError::InvalidName { .. })));
    }

    #[sealed_test]
    fn missing_castle_is_not_found() {
        let result = Castle::open("repos", "glencairn");
        assert!(matches!(result, Err(CastleError::NotFound { .. })));
    }

    #[sealed_test]
    fn linkable_root_prefers_home_dir() -> anyhow::Result<()> {
        fs::create_dir_all("repos/wtf/zomg/home")?;
        fs::create_dir_all("repos/glencairn")?;

        let nested = Castle::open("repos", "wtf/zomg/")?;
        pretty_assertions::assert_eq!(nested.name(), "wtf/zomg");
        pretty_assertions::assert_eq!(
            nested.linkable_root(),
            PathBuf::from("repos/wtf/zomg/home")
        );

        let flat = Castle::open("repos", "glencairn")?;
        pretty_assertions::assert_eq!(flat.linkable_root(), PathBuf::from("repos/glencairn"));

        Ok(())
    }

    #[sealed_test]
    fn remote_url_of_plain_directory_is_none() -> anyhow::Result<()> {
        fs::create_dir_all("repos/glencairn")?;

        let castle = Castle::open("repos", "glencairn")?;
        pretty_assertions::assert_eq!(castle.remote_url()?, None);
        assert!(!castle.stage("anything")?);

        Ok(())
    }

    #[sealed_test]
    fn remote_url_reads_origin() -> anyhow::Result<()> {
        let repository = Repository::init("repos/zomg")?;
        repository.remote("origin", "git://github.com/technicalpickles/zomg.git")?;

        let castle = Castle::open("repos", "zomg")?;
        pretty_assertions::assert_eq!(
            castle.remote_url()?,
            Some("git://github.com/technicalpickles/zomg.git".into())
        );

        Ok(())
    }

    #[sealed_test]
    fn stage_adds_path_to_index() -> anyhow::Result<()> {
        Repository::init("repos/zomg")?;
        fs::create_dir_all("repos/zomg/home")?;
        fs::write("repos/zomg/home/.zshrc", "export EDITOR=vim\n")?;

        let castle = Castle::open("repos", "zomg")?;
        assert!(castle.stage("home/.zshrc")?);

        let index = Repository::open("repos/zomg")?.index()?;
        assert!(index.get_path(Path::new("home/.zshrc"), 0).is_some());

        Ok(())
    }
}
