// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Castle linking logic.
//!
//! The castle linker places symlinks in the user's home directory that point
//! back into a castle. It operates in one of two modes:
//!
//! - __Default__: every top-level entry of the castle's linkable root gets
//!   one symlink in home. Directories are linked wholesale.
//! - __Overlay__: directories are mirrored as real directories in home, and
//!   only leaf files get symlinked. This lets a castle contribute a few files
//!   to something like `~/.config` without taking over the whole directory.
//!
//! # Conflicts
//!
//! A destination that already holds a symlink to the intended source is left
//! alone. Anything else occupying a destination is a conflict. Conflicts are
//! reported and skipped unless the linker is forced, in which case whatever
//! is in the way gets removed first. A conflict never aborts the rest of the
//! batch.

use crate::config::LinkOptions;

use ignore::WalkBuilder;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// Kind of entry a link target produces in home.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Symlink pointing at the source.
    Link,

    /// Real directory mirroring a castle directory (overlay mode only).
    Directory,
}

/// Source path in a castle paired with its destination in home.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: TargetKind,
}

impl LinkTarget {
    /// Construct new symlink target.
    pub fn link(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            kind: TargetKind::Link,
        }
    }

    /// Construct new directory target.
    pub fn directory(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            kind: TargetKind::Directory,
        }
    }
}

/// What happened to a single link target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Destination was empty and has been filled.
    Created,

    /// Destination was already in the intended state.
    Identical,

    /// Destination is occupied by something else and was left untouched.
    Conflict,

    /// Destination was occupied by something else, which got replaced.
    Overwritten,
}

impl LinkOutcome {
    /// Short status label for given target kind.
    pub fn label(&self, kind: TargetKind) -> &'static str {
        match (self, kind) {
            (Self::Created, TargetKind::Link) => "symlink",
            (Self::Created, TargetKind::Directory) => "create",
            (Self::Identical, TargetKind::Link) => "identical",
            (Self::Identical, TargetKind::Directory) => "exist",
            (Self::Conflict, _) => "conflict",
            (Self::Overwritten, _) => "overwrite",
        }
    }

    /// Whether the filesystem changed.
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Overwritten)
    }
}

/// Reported outcome of one link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    pub target: LinkTarget,
    pub outcome: LinkOutcome,
}

impl Display for LinkEntry {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(
            fmt,
            "{:>9}  {}",
            self.outcome.label(self.target.kind),
            self.target.destination.display()
        )
    }
}

/// Outcomes of every link target attempted in one run, in processing order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkReport {
    entries: Vec<LinkEntry>,
}

impl LinkReport {
    pub fn entries(&self) -> &[LinkEntry] {
        &self.entries
    }

    /// Entries that were skipped because of a conflict.
    pub fn conflicts(&self) -> impl Iterator<Item = &LinkEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.outcome == LinkOutcome::Conflict)
    }

    /// Find outcome for given destination path.
    pub fn outcome_of(&self, destination: impl AsRef<Path>) -> Option<LinkOutcome> {
        self.entries
            .iter()
            .find(|entry| entry.target.destination == destination.as_ref())
            .map(|entry| entry.outcome)
    }

    /// Whether any target changed the filesystem.
    pub fn has_changes(&self) -> bool {
        self.entries.iter().any(|entry| entry.outcome.is_change())
    }
}

/// Entry found at a destination path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Symlink with its raw target.
    Symlink(PathBuf),

    /// Real directory.
    Directory,

    /// Regular file, or anything else that is not a directory.
    File,
}

/// Filesystem operations the linker relies on.
///
/// Nothing is ever followed through a symlink: [`LinkFs::entry_kind`] reports
/// the link itself, and removal deletes the link rather than its target.
pub trait LinkFs {
    /// Inspect entry at `path`, or `None` if nothing is there.
    fn entry_kind(&self, path: &Path) -> io::Result<Option<EntryKind>>;

    /// Create symlink at `destination` pointing to `source`.
    fn symlink(&self, source: &Path, destination: &Path) -> io::Result<()>;

    /// Create a single real directory.
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Remove entry of given kind at `path`, recursively for directories.
    fn remove(&self, path: &Path, kind: &EntryKind) -> io::Result<()>;
}

/// Filesystem of the host machine.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostFs;

impl LinkFs for HostFs {
    fn entry_kind(&self, path: &Path) -> io::Result<Option<EntryKind>> {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_symlink() => {
                Ok(Some(EntryKind::Symlink(fs::read_link(path)?)))
            }
            Ok(meta) if meta.is_dir() => Ok(Some(EntryKind::Directory)),
            Ok(_) => Ok(Some(EntryKind::File)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    #[cfg(unix)]
    fn symlink(&self, source: &Path, destination: &Path) -> io::Result<()> {
        std::os::unix::fs::symlink(source, destination)
    }

    #[cfg(windows)]
    fn symlink(&self, source: &Path, destination: &Path) -> io::Result<()> {
        if source.is_dir() {
            std::os::windows::fs::symlink_dir(source, destination)
        } else {
            std::os::windows::fs::symlink_file(source, destination)
        }
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn remove(&self, path: &Path, kind: &EntryKind) -> io::Result<()> {
        match kind {
            EntryKind::Directory => fs::remove_dir_all(path),
            // Directory symlinks on Windows are directories as far as removal
            // is concerned.
            #[cfg(windows)]
            EntryKind::Symlink(_) if path.is_dir() => fs::remove_dir(path),
            EntryKind::Symlink(_) | EntryKind::File => fs::remove_file(path),
        }
    }
}

/// Castle linker.
///
/// Computes link targets from a castle's linkable root, and applies them to
/// the home directory according to its [`LinkOptions`].
#[derive(Debug, Clone)]
pub struct Linker<F = HostFs>
where
    F: LinkFs,
{
    fs: F,
    home_dir: PathBuf,
    options: LinkOptions,
}

impl Linker<HostFs> {
    /// Construct new linker operating on the host filesystem.
    pub fn new(home_dir: impl Into<PathBuf>, options: LinkOptions) -> Self {
        Self::with_fs(HostFs, home_dir, options)
    }
}

impl<F> Linker<F>
where
    F: LinkFs,
{
    /// Construct new linker over given filesystem.
    pub fn with_fs(fs: F, home_dir: impl Into<PathBuf>, options: LinkOptions) -> Self {
        Self {
            fs,
            home_dir: home_dir.into(),
            options,
        }
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn home_dir(&self) -> &Path {
        self.home_dir.as_path()
    }

    /// Link contents of castle root into home directory.
    ///
    /// # Errors
    ///
    /// - Return [`LinkError::MissingPath`] if castle root or home directory
    ///   does not exist.
    /// - Return [`LinkError::Permission`] if the OS denies a link, unlink, or
    ///   directory creation.
    /// - Return [`LinkError::Io`] for any other filesystem failure.
    #[instrument(skip(self, root), level = "debug")]
    pub fn link(&self, root: impl AsRef<Path>) -> Result<LinkReport> {
        let targets = self.targets(root)?;
        self.apply(targets)
    }

    /// Compute link targets for castle root.
    ///
    /// Entries of each directory are visited in file name order. Anything
    /// named `.git` is skipped along with its contents.
    ///
    /// # Errors
    ///
    /// - Return [`LinkError::MissingPath`] if castle root or home directory
    ///   does not exist.
    /// - Return [`LinkError::Walk`] if castle root cannot be traversed.
    pub fn targets(&self, root: impl AsRef<Path>) -> Result<Vec<LinkTarget>> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(LinkError::MissingPath {
                path: root.to_path_buf(),
            });
        }

        if !self.home_dir.is_dir() {
            return Err(LinkError::MissingPath {
                path: self.home_dir.clone(),
            });
        }

        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(|entry| entry.file_name() != ".git");
        if !self.options.overlay {
            builder.max_depth(Some(1));
        }

        let mut targets = Vec::new();
        for entry in builder.build() {
            let entry = entry?;
            if entry.depth() == 0 {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };

            let source = entry.path().to_path_buf();
            let destination = self.home_dir.join(relative);
            let is_dir = entry.file_type().is_some_and(|kind| kind.is_dir());
            if self.options.overlay && is_dir {
                targets.push(LinkTarget::directory(source, destination));
            } else {
                targets.push(LinkTarget::link(source, destination));
            }
        }

        Ok(targets)
    }

    /// Apply link targets in order.
    ///
    /// A directory target that ends in conflict blocks every target beneath
    /// it, which are then reported as conflicts without being touched.
    ///
    /// # Errors
    ///
    /// - Return [`LinkError::Permission`] if the OS denies a link, unlink, or
    ///   directory creation.
    /// - Return [`LinkError::Io`] for any other filesystem failure.
    pub fn apply(&self, targets: impl IntoIterator<Item = LinkTarget>) -> Result<LinkReport> {
        let mut report = LinkReport::default();
        let mut blocked: Vec<PathBuf> = Vec::new();

        for target in targets {
            let outcome = if blocked
                .iter()
                .any(|dir| target.destination.starts_with(dir))
            {
                LinkOutcome::Conflict
            } else {
                match target.kind {
                    TargetKind::Link => self.apply_link(&target)?,
                    TargetKind::Directory => self.apply_directory(&target)?,
                }
            };

            if target.kind == TargetKind::Directory && outcome == LinkOutcome::Conflict {
                blocked.push(target.destination.clone());
            }

            debug!(
                "{} {} -> {}",
                outcome.label(target.kind),
                target.destination.display(),
                target.source.display()
            );
            report.entries.push(LinkEntry { target, outcome });
        }

        Ok(report)
    }

    fn apply_link(&self, target: &LinkTarget) -> Result<LinkOutcome> {
        let LinkTarget {
            source,
            destination,
            ..
        } = target;

        let existing = self
            .fs
            .entry_kind(destination)
            .map_err(|err| fs_error(destination, err))?;
        match existing {
            None => {
                self.symlink(source, destination)?;
                Ok(LinkOutcome::Created)
            }
            Some(EntryKind::Symlink(current)) if current == *source => Ok(LinkOutcome::Identical),
            Some(kind) if !self.options.force => {
                debug!("{} already exists as {kind:?}", destination.display());
                Ok(LinkOutcome::Conflict)
            }
            Some(kind) => {
                self.remove(destination, &kind)?;
                self.symlink(source, destination)?;
                Ok(LinkOutcome::Overwritten)
            }
        }
    }

    fn apply_directory(&self, target: &LinkTarget) -> Result<LinkOutcome> {
        let destination = &target.destination;
        let existing = self
            .fs
            .entry_kind(destination)
            .map_err(|err| fs_error(destination, err))?;
        match existing {
            None => {
                self.create_dir(destination)?;
                Ok(LinkOutcome::Created)
            }
            Some(EntryKind::Directory) => Ok(LinkOutcome::Identical),
            Some(kind) if !self.options.force => {
                debug!("{} already exists as {kind:?}", destination.display());
                Ok(LinkOutcome::Conflict)
            }
            Some(kind) => {
                self.remove(destination, &kind)?;
                self.create_dir(destination)?;
                Ok(LinkOutcome::Overwritten)
            }
        }
    }

    fn symlink(&self, source: &Path, destination: &Path) -> Result<()> {
        self.fs
            .symlink(source, destination)
            .map_err(|err| fs_error(destination, err))
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        self.fs.create_dir(path).map_err(|err| fs_error(path, err))
    }

    fn remove(&self, path: &Path, kind: &EntryKind) -> Result<()> {
        self.fs.remove(path, kind).map_err(|err| fs_error(path, err))
    }
}

fn fs_error(path: &Path, source: io::Error) -> LinkError {
    let path = path.to_path_buf();
    if source.kind() == io::ErrorKind::PermissionDenied {
        LinkError::Permission { path, source }
    } else {
        LinkError::Io { path, source }
    }
}

/// Castle linking error types.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Castle root or home directory does not exist.
    #[error("directory {path:?} does not exist")]
    MissingPath { path: PathBuf },

    /// OS refused to link, unlink, or create a directory.
    #[error("permission denied at {path:?}")]
    Permission { path: PathBuf, source: io::Error },

    /// Any other filesystem failure.
    #[error("filesystem operation failed at {path:?}")]
    Io { path: PathBuf, source: io::Error },

    /// Castle root cannot be traversed.
    #[error(transparent)]
    Walk(#[from] ignore::Error),
}

/// Friendly result alias :3
type Result<T, E = LinkError> = std::result::Result<T, E>;
