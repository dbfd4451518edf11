// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Git process invocation.
//!
//! Homesick does not speak any Git protocol itself. Cloning and pulling are
//! delegated to the user's Git binary, so whatever credentials, SSH agents,
//! and URL rewrites they already configured keep working. The exit status of
//! the child process is the only thing that decides success.

use indicatif::{ProgressBar, ProgressStyle};
use std::{ffi::OsStr, path::Path, process::Command, time::Duration};
use tracing::{debug, instrument};

/// Layer of indirection for Git invocation.
pub trait GitClient {
    /// Clone repository at `url` into `destination`.
    fn clone_repo(&self, url: &str, destination: &Path) -> Result<()>;

    /// Pull latest changes for castle at `castle_dir`, including submodules.
    fn pull(&self, castle_dir: &Path) -> Result<()>;
}

/// Git access through the Git binary found on `$PATH`.
#[derive(Debug, Clone)]
pub struct GitBinary {
    program: String,
}

impl GitBinary {
    /// Construct new Git binary client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different Git executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run<I, S>(&self, dir: Option<&Path>, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args = args
            .into_iter()
            .map(|arg| arg.as_ref().to_os_string())
            .collect::<Vec<_>>();
        let display = args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ");

        let bar = spinner(format!("{} {display}", self.program))?;
        let result = syscall_non_interactive(&self.program, dir, &args);
        bar.finish_and_clear();

        result.map_err(|err| match err {
            GitError::Failed { message, .. } => GitError::Failed {
                command: format!("{} {display}", self.program),
                message,
            },
            err => err,
        })
    }
}

impl Default for GitBinary {
    fn default() -> Self {
        Self {
            program: "git".into(),
        }
    }
}

impl GitClient for GitBinary {
    #[instrument(skip(self), level = "debug")]
    fn clone_repo(&self, url: &str, destination: &Path) -> Result<()> {
        let output = self.run(None, clone_args(url, destination))?;
        debug!("{output}");

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn pull(&self, castle_dir: &Path) -> Result<()> {
        let output = self.run(Some(castle_dir), ["pull", "--quiet"])?;
        debug!("{output}");

        let output = self.run(
            Some(castle_dir),
            ["submodule", "--quiet", "update", "--init", "--recursive"],
        )?;
        debug!("{output}");

        Ok(())
    }
}

// INVARIANT: Everything after `--` is positional, so a URL can never be
// mistaken for an option.
fn clone_args<'a>(url: &'a str, destination: &'a Path) -> [&'a OsStr; 6] {
    [
        OsStr::new("clone"),
        OsStr::new("--quiet"),
        OsStr::new("--recursive"),
        OsStr::new("--"),
        OsStr::new(url),
        destination.as_os_str(),
    ]
}

fn spinner(message: String) -> Result<ProgressBar> {
    let style = ProgressStyle::with_template("{elapsed_precise:.green}  {spinner:.yellow} {msg}")?
        .tick_chars("-\\|/ ");
    let bar = ProgressBar::new_spinner();
    bar.set_style(style);
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    Ok(bar)
}

fn syscall_non_interactive(
    cmd: impl AsRef<OsStr>,
    dir: Option<&Path>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    let mut command = Command::new(cmd.as_ref());
    command.args(args);
    if let Some(dir) = dir {
        command.current_dir(dir);
    }

    let output = command.output()?;
    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();
    let mut message = String::new();

    if !stdout.is_empty() {
        message.push_str(format!("stdout: {stdout}").as_str());
    }

    if !stderr.is_empty() {
        message.push_str(format!("stderr: {stderr}").as_str());
    }

    // INVARIANT: Chomp trailing newlines.
    let message = message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message);

    if !output.status.success() {
        return Err(GitError::Failed {
            command: cmd.as_ref().to_string_lossy().into_owned(),
            message,
        });
    }

    Ok(message)
}

/// Git invocation error types.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    /// Git binary could not be spawned.
    #[error("cannot run git")]
    Syscall(#[from] std::io::Error),

    /// Git exited with a failure status.
    #[error("command {command:?} failed:\n{message}")]
    Failed { command: String, message: String },

    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),
}

/// Friendly result alias :3
type Result<T, E = GitError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use sealed_test::prelude::*;

    #[sealed_test]
    fn missing_program_cannot_be_spawned() {
        let git = GitBinary::with_program("homesick-surely-not-a-real-git");
        let result = git.clone_repo("gitolite:dots.git", Path::new("dots"));
        assert!(matches!(result, Err(GitError::Syscall(_))));
    }

    #[test]
    fn clone_url_is_never_an_option() {
        let args = clone_args("--upload-pack=touch pwned:x", Path::new("x"));
        let position = args.iter().position(|arg| *arg == "--");
        assert_eq!(position, Some(3));
        assert_eq!(args[4], OsStr::new("--upload-pack=touch pwned:x"));
    }

    #[sealed_test]
    fn failing_exit_status_is_reported() {
        let git = GitBinary::with_program("false");
        let result = git.pull(Path::new("."));
        match result {
            Err(GitError::Failed { command, .. }) => {
                assert_eq!(command, "false pull --quiet");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
