// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{write_file, FakeGit, RepoFixture, Sandbox};

use anyhow::Result;
use homesick::{store::StoreError, LinkOutcome, Settings, Store};
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::fs;

#[sealed_test]
fn move_tracked_file_into_castle() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let castle = sandbox.given_castle("castle_repo", "castle_repo")?;
    let some_rc_file = sandbox.home_file(".some_rc_file")?;
    fs::write(&some_rc_file, "set -o vi\n")?;

    let report = sandbox.store()?.track(&some_rc_file, "castle_repo")?;

    let tracked_file = castle.join(".some_rc_file");
    assert!(tracked_file.exists());
    assert_eq!(fs::read_to_string(&tracked_file)?, "set -o vi\n");
    assert_eq!(fs::read_link(&some_rc_file)?, tracked_file);
    assert_eq!(report.outcome_of(&some_rc_file), Some(LinkOutcome::Created));

    let fixture = RepoFixture::open(sandbox.repos.join("castle_repo"))?;
    assert!(fixture.is_staged("home/.some_rc_file")?);

    Ok(())
}

#[sealed_test]
fn track_keeps_path_relative_to_home() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let castle = sandbox.given_castle("castle_repo", "castle_repo")?;
    let init = sandbox.home_file(".config/nvim/init.lua")?;

    sandbox.store()?.track(&init, "castle_repo")?;

    let tracked_file = castle.join(".config/nvim/init.lua");
    assert!(tracked_file.is_file());
    assert_eq!(fs::read_link(&init)?, tracked_file);
    assert!(!sandbox.home.join(".config").is_symlink());

    Ok(())
}

#[sealed_test]
fn track_directory() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let castle = sandbox.given_castle("castle_repo", "castle_repo")?;
    sandbox.home_file(".vim/vimrc")?;

    sandbox
        .store()?
        .track(sandbox.home.join(".vim/"), "castle_repo")?;

    assert_eq!(fs::read_link(sandbox.home.join(".vim"))?, castle.join(".vim"));
    assert!(castle.join(".vim/vimrc").is_file());

    let fixture = RepoFixture::open(sandbox.repos.join("castle_repo"))?;
    assert!(fixture.is_staged("home/.vim/vimrc")?);

    Ok(())
}

#[sealed_test]
fn track_already_tracked_file_fails() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let castle = sandbox.given_castle("castle_repo", "castle_repo")?;
    write_file(castle.join(".some_rc_file"))?;
    let some_rc_file = sandbox.home_file(".some_rc_file")?;

    let result = sandbox.store()?.track(&some_rc_file, "castle_repo");

    assert!(matches!(result, Err(StoreError::AlreadyTracked { .. })));
    assert!(!some_rc_file.is_symlink());

    Ok(())
}

#[sealed_test]
fn track_file_outside_home_fails() -> Result<()> {
    let sandbox = Sandbox::new()?;
    sandbox.given_castle("castle_repo", "castle_repo")?;
    let outside = write_file(sandbox.root.join("outside"))?;

    let result = sandbox.store()?.track(&outside, "castle_repo");

    assert!(matches!(result, Err(StoreError::OutsideHome { .. })));
    assert!(outside.is_file());

    Ok(())
}

#[sealed_test]
fn track_missing_file_fails() -> Result<()> {
    let sandbox = Sandbox::new()?;
    sandbox.given_castle("castle_repo", "castle_repo")?;

    let result = sandbox
        .store()?
        .track(sandbox.home.join(".nope"), "castle_repo");

    assert!(matches!(result, Err(StoreError::MissingFile { .. })));

    Ok(())
}

#[sealed_test]
fn track_with_relative_home_override() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let castle = sandbox.given_castle("castle_repo", "castle_repo")?;
    let bashrc = sandbox.home_file(".bashrc")?;
    let settings = Settings::from_overrides(Some("user"), None)?;

    Store::open(settings, FakeGit::default())?.track("user/.bashrc", "castle_repo")?;

    let tracked_file = castle.join(".bashrc");
    assert!(tracked_file.is_file());
    assert_eq!(fs::read_link(&bashrc)?, tracked_file);
    assert!(bashrc.is_file());

    Ok(())
}

#[sealed_test]
fn track_resolves_parent_components() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let castle = sandbox.given_castle("castle_repo", "castle_repo")?;
    let bashrc = sandbox.home_file(".bashrc")?;

    sandbox
        .store()?
        .track(sandbox.home.join("foo/../.bashrc"), "castle_repo")?;

    assert_eq!(fs::read_link(&bashrc)?, castle.join(".bashrc"));
    assert!(!castle.join("foo").exists());

    Ok(())
}
