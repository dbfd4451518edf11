// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Castle store management and manipulation.
//!
//! Homesick groups castles together into one place called the __repos
//! directory__. It houses every castle the user can link into their home
//! directory.
//!
//! # Repos Directory Layout
//!
//! The repos directory defaults to `~/.homesick/repos`. Each castle is a
//! directory below it, and the castle's name is its path relative to the
//! repos directory. Unlike a flat store, castles can be nested, e.g.,
//! `~/.homesick/repos/wtf/zomg` is a castle named `wtf/zomg`. This is what
//! GitHub shorthand clones like `user/repo` produce.
//!
//! A directory counts as a castle for listing purposes when it contains a
//! `.git` directory. Anything below a castle belongs to that castle, even if
//! it happens to contain a `.git` directory of its own.

use crate::{
    castle::{
        git::{GitBinary, GitClient, GitError},
        link::{LinkError, LinkReport, LinkTarget, Linker},
        Castle, CastleError,
    },
    config::{LinkOptions, Settings},
    path::normalize,
    reference::{FormatError, RepoRef},
};

use glob::{glob_with, MatchOptions, Pattern};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Castle listed in the repos directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastleEntry {
    /// Name relative to repos directory.
    pub name: String,

    /// URL of castle's origin remote.
    pub remote: Option<String>,
}

/// Repos directory along with the home directory castles get linked into.
#[derive(Debug)]
pub struct Store<G = GitBinary>
where
    G: GitClient,
{
    settings: Settings,
    git: G,
}

impl<G> Store<G>
where
    G: GitClient,
{
    /// Open repos directory.
    ///
    /// Creates the repos directory if it does not exist yet.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::MissingHome`] if home directory does not exist.
    /// - Return [`StoreError::Io`] if repos directory cannot be created.
    pub fn open(settings: Settings, git: G) -> Result<Self> {
        if !settings.home_dir.is_dir() {
            return Err(StoreError::MissingHome {
                path: settings.home_dir,
            });
        }

        make_dirs(&settings.repos_dir)?;

        Ok(Self { settings, git })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn git(&self) -> &G {
        &self.git
    }

    /// Open castle by name.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Castle`] if castle does not exist or its name is
    ///   invalid.
    pub fn castle(&self, name: impl Into<String>) -> Result<Castle> {
        Ok(Castle::open(&self.settings.repos_dir, name)?)
    }

    /// Clone castle into repos directory.
    ///
    /// Local directories are symlinked into the repos directory under their
    /// own name. Everything else is handed over to Git. Returns path of new
    /// castle.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Format`] if reference cannot be resolved.
    /// - Return [`StoreError::AlreadyCloned`] if destination already exists.
    ///   Git is not invoked in this case.
    /// - Return [`StoreError::Git`] if Git fails to clone.
    /// - Return [`StoreError::Io`] if local castle cannot be symlinked.
    #[instrument(skip(self), level = "debug")]
    pub fn clone_castle(&self, reference: &str) -> Result<PathBuf> {
        match RepoRef::resolve(reference)? {
            RepoRef::Local(path) => {
                let path = std::path::absolute(&path).map_err(|err| io_error(&path, err))?;
                let name = path
                    .file_name()
                    .ok_or_else(|| FormatError(reference.into()))?;
                let destination = self.settings.repos_dir.join(name);
                self.ensure_vacant(&destination)?;

                info!("symlink {} -> {}", destination.display(), path.display());
                symlink_dir(&path, &destination).map_err(|err| io_error(&destination, err))?;

                Ok(destination)
            }
            RepoRef::Remote { url, destination } => {
                let destination = self.settings.repos_dir.join(destination);
                self.ensure_vacant(&destination)?;
                if let Some(parent) = destination.parent() {
                    make_dirs(parent)?;
                }

                info!("clone {url} into {}", destination.display());
                self.git.clone_repo(&url, &destination)?;

                Ok(destination)
            }
        }
    }

    /// List every castle in repos directory sorted by name.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Glob`] if repos directory path cannot be turned
    ///   into a search pattern.
    /// - Return [`StoreError::Castle`] if a castle's remote cannot be read.
    #[instrument(skip(self), level = "debug")]
    pub fn list(&self) -> Result<Vec<CastleEntry>> {
        let repos_dir = self.settings.repos_dir.to_string_lossy();
        let pattern = format!("{}/**/*/.git", Pattern::escape(&repos_dir));
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };

        let mut names = Vec::new();
        for path in glob_with(&pattern, options)?.flatten() {
            if !path.is_dir() {
                continue;
            }

            let Some(castle_dir) = path.parent() else {
                continue;
            };

            if let Ok(name) = castle_dir.strip_prefix(&self.settings.repos_dir) {
                names.push(name.to_path_buf());
            }
        }
        names.sort();

        let mut castles: Vec<PathBuf> = Vec::new();
        for name in names {
            // INVARIANT: Nested repositories belong to their enclosing castle.
            if castles.iter().any(|castle| name.starts_with(castle)) {
                debug!("skip {} nested inside another castle", name.display());
                continue;
            }
            castles.push(name);
        }

        let mut entries = Vec::new();
        for name in castles {
            let name = name.to_string_lossy().into_owned();
            let castle = self.castle(name.as_str())?;
            entries.push(CastleEntry {
                remote: castle.remote_url()?,
                name,
            });
        }

        Ok(entries)
    }

    /// Pull latest changes into a castle.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Castle`] if castle does not exist.
    /// - Return [`StoreError::Git`] if Git fails to pull.
    #[instrument(skip(self), level = "debug")]
    pub fn pull(&self, name: &str) -> Result<()> {
        let castle = self.castle(name)?;
        info!("pull {}", castle.name());
        self.git.pull(castle.root())?;

        Ok(())
    }

    /// Pull latest changes into every listed castle.
    ///
    /// Stops at the first castle that fails to pull.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Git`] if Git fails to pull.
    pub fn pull_all(&self) -> Result<()> {
        for entry in self.list()? {
            self.pull(&entry.name)?;
        }

        Ok(())
    }

    /// Link castle contents into home directory.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Castle`] if castle does not exist.
    /// - Return [`StoreError::Link`] if linking fails.
    #[instrument(skip(self), level = "debug")]
    pub fn symlink(&self, name: &str, options: LinkOptions) -> Result<LinkReport> {
        let castle = self.castle(name)?;
        let linker = Linker::new(&self.settings.home_dir, options);

        Ok(linker.link(castle.linkable_root())?)
    }

    /// Move file from home directory into castle, and link it back.
    ///
    /// The file keeps its path relative to the home directory, so tracking
    /// `~/.config/nvim/init.lua` places it at `.config/nvim/init.lua` in the
    /// castle's linkable root. The moved file is staged in the castle's index
    /// when the castle is a Git repository.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Castle`] if castle does not exist.
    /// - Return [`StoreError::MissingFile`] if file does not exist.
    /// - Return [`StoreError::OutsideHome`] if file is not inside the home
    ///   directory.
    /// - Return [`StoreError::AlreadyTracked`] if castle already has an entry
    ///   at the file's path.
    /// - Return [`StoreError::Io`] if file cannot be moved.
    /// - Return [`StoreError::Link`] if file cannot be linked back.
    #[instrument(skip(self, file), level = "debug")]
    pub fn track(&self, file: impl AsRef<Path>, name: &str) -> Result<LinkReport> {
        let castle = self.castle(name)?;
        let file = file.as_ref();
        let file = normalize(std::path::absolute(file).map_err(|err| io_error(file, err))?);

        if fs::symlink_metadata(&file).is_err() {
            return Err(StoreError::MissingFile { path: file });
        }

        let relative = match file.strip_prefix(&self.settings.home_dir) {
            Ok(relative) if relative.components().next().is_some() => relative.to_path_buf(),
            _ => return Err(StoreError::OutsideHome { path: file }),
        };

        let tracked = castle.linkable_root().join(&relative);
        if fs::symlink_metadata(&tracked).is_ok() {
            return Err(StoreError::AlreadyTracked { path: tracked });
        }

        if let Some(parent) = tracked.parent() {
            make_dirs(parent)?;
        }

        info!("move {} to {}", file.display(), tracked.display());
        fs::rename(&file, &tracked).map_err(|err| io_error(&file, err))?;

        let linker = Linker::new(&self.settings.home_dir, LinkOptions::default());
        let report = linker.apply([LinkTarget::link(&tracked, &file)])?;

        if let Ok(in_castle) = tracked.strip_prefix(castle.root()) {
            castle.stage(in_castle)?;
        }

        Ok(report)
    }

    fn ensure_vacant(&self, destination: &Path) -> Result<()> {
        if fs::symlink_metadata(destination).is_ok() {
            return Err(StoreError::AlreadyCloned {
                path: destination.to_path_buf(),
            });
        }

        Ok(())
    }
}

fn make_dirs(path: &Path) -> Result<()> {
    mkdirp::mkdirp(path).map_err(|err| io_error(path, err))?;
    Ok(())
}

#[cfg(unix)]
fn symlink_dir(source: &Path, destination: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, destination)
}

#[cfg(windows)]
fn symlink_dir(source: &Path, destination: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(source, destination)
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// All possible error types for repos directory interaction.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Repository reference cannot be resolved.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Castle destination is already taken.
    #[error("castle already cloned to {path:?}")]
    AlreadyCloned { path: PathBuf },

    /// Git invocation fails.
    #[error(transparent)]
    Git(#[from] GitError),

    /// Castle lookup or castle repository access fails.
    #[error(transparent)]
    Castle(#[from] CastleError),

    /// Linking castle contents fails.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Home directory does not exist.
    #[error("home directory {path:?} does not exist")]
    MissingHome { path: PathBuf },

    /// File to track does not exist.
    #[error("cannot track {path:?}, it does not exist")]
    MissingFile { path: PathBuf },

    /// File to track lives outside of home directory.
    #[error("cannot track {path:?}, it is not inside the home directory")]
    OutsideHome { path: PathBuf },

    /// Castle already holds an entry at the tracked path.
    #[error("{path:?} is already tracked")]
    AlreadyTracked { path: PathBuf },

    /// Repos directory cannot be turned into a search pattern.
    #[error(transparent)]
    Glob(#[from] glob::PatternError),

    /// Filesystem operation fails.
    #[error("filesystem operation failed at {path:?}")]
    Io { path: PathBuf, source: io::Error },
}

/// Friendly result alias :3
type Result<T, E = StoreError> = std::result::Result<T, E>;
