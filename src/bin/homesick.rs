// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use homesick::{
    castle::link::LinkOutcome, GitBinary, LinkOptions, LinkReport, Settings, Store,
};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "homesick [options] <homesick-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Use a different home directory to link castles into.
    #[arg(long, global = true, value_name = "path")]
    pub home: Option<String>,

    /// Use a different repos directory to keep castles in.
    #[arg(long, global = true, value_name = "path")]
    pub repos: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let settings = Settings::from_overrides(self.home.as_deref(), self.repos.as_deref())?;
        let store = Store::open(settings, GitBinary::new())?;

        match self.command {
            Command::Clone(opts) => run_clone(&store, opts),
            Command::Symlink(opts) => run_symlink(&store, opts),
            Command::List => run_list(&store),
            Command::Pull(opts) => run_pull(&store, opts),
            Command::Track(opts) => run_track(&store, opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Clone castle from a URI, a local path, or a GitHub shorthand.
    #[command(override_usage = "homesick clone <uri>")]
    Clone(CloneOptions),

    /// Symlink castle contents into the home directory.
    #[command(
        visible_alias = "link",
        override_usage = "homesick symlink [options] <castle>"
    )]
    Symlink(SymlinkOptions),

    /// List castles in the repos directory.
    #[command(override_usage = "homesick list")]
    List,

    /// Pull latest changes for a castle.
    #[command(override_usage = "homesick pull [options] [<castle>]")]
    Pull(PullOptions),

    /// Move a file from the home directory into a castle and link it back.
    #[command(override_usage = "homesick track <file> <castle>")]
    Track(TrackOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CloneOptions {
    /// URI, local path, or `user/repo` shorthand to clone.
    #[arg(required = true, value_name = "uri")]
    pub uri: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct SymlinkOptions {
    /// Name of castle to link.
    #[arg(required = true, value_name = "castle")]
    pub castle: String,

    /// Replace files, directories, and symlinks already in the way.
    #[arg(short, long)]
    pub force: bool,

    /// Create real directories and only link files inside them.
    #[arg(short, long)]
    pub overlay: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct PullOptions {
    /// Name of castle to pull.
    #[arg(group = "target", value_name = "castle")]
    pub castle: Option<String>,

    /// Pull every castle.
    #[arg(short, long, group = "target")]
    pub all: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct TrackOptions {
    /// File in the home directory to track.
    #[arg(required = true, value_name = "file")]
    pub file: PathBuf,

    /// Name of castle to move file into.
    #[arg(required = true, value_name = "castle")]
    pub castle: String,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_clone(store: &Store, opts: CloneOptions) -> Result<()> {
    let path = store.clone_castle(&opts.uri)?;
    info!("cloned castle to {}", path.display());

    Ok(())
}

fn run_symlink(store: &Store, opts: SymlinkOptions) -> Result<()> {
    let options = LinkOptions::new(opts.force, opts.overlay);
    let report = store.symlink(&opts.castle, options)?;
    show_report(&report);

    let conflicts = report.conflicts().count();
    if conflicts > 0 {
        warn!("skipped {conflicts} conflicting entries, use --force to replace them");
    }

    Ok(())
}

fn run_list(store: &Store) -> Result<()> {
    let entries = store.list()?;
    let width = entries
        .iter()
        .map(|entry| entry.name.len())
        .max()
        .unwrap_or_default();

    for entry in entries {
        let remote = entry.remote.as_deref().unwrap_or("<no remote>");
        println!("{:>width$}  {remote}", entry.name);
    }

    Ok(())
}

fn run_pull(store: &Store, opts: PullOptions) -> Result<()> {
    match (opts.castle, opts.all) {
        (_, true) => store.pull_all()?,
        (Some(castle), false) => store.pull(&castle)?,
        (None, false) => bail!("name a castle to pull, or pass --all"),
    }

    Ok(())
}

fn run_track(store: &Store, opts: TrackOptions) -> Result<()> {
    let report = store.track(&opts.file, &opts.castle)?;
    show_report(&report);

    Ok(())
}

fn show_report(report: &LinkReport) {
    for entry in report.entries() {
        match entry.outcome {
            LinkOutcome::Conflict => warn!("{entry}"),
            _ => info!("{entry}"),
        }
    }
}
