// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{RepoFixture, Sandbox};

use anyhow::Result;
use homesick::CastleEntry;
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::fs;

#[sealed_test]
fn list_each_castle_in_repos_dir() -> Result<()> {
    let sandbox = Sandbox::new()?;
    sandbox.given_castle("zomg", "zomg")?;
    sandbox.given_castle("zomg", "wtf/zomg")?;

    let result = sandbox.store()?.list()?;
    let expect = vec![
        CastleEntry {
            name: "wtf/zomg".into(),
            remote: Some("git://github.com/technicalpickles/zomg.git".into()),
        },
        CastleEntry {
            name: "zomg".into(),
            remote: Some("git://github.com/technicalpickles/zomg.git".into()),
        },
    ];

    assert_eq!(result, expect);

    Ok(())
}

#[sealed_test]
fn list_skips_repositories_nested_in_castles() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let castle = sandbox.given_castle("vim", "vim")?;
    RepoFixture::new(castle.join(".vim/bundle/fugitive"))?
        .with_origin("git://github.com/tpope/vim-fugitive.git")?;

    let result = sandbox
        .store()?
        .list()?
        .into_iter()
        .map(|entry| entry.name)
        .collect::<Vec<_>>();

    assert_eq!(result, vec!["vim".to_string()]);

    Ok(())
}

#[sealed_test]
fn list_castle_without_origin() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let fixture = RepoFixture::new(sandbox.repos.join("local"))?;
    fixture.stage_and_commit("home/.zshrc", "export EDITOR=vim\n")?;
    fs::create_dir_all(sandbox.repos.join("not_a_castle"))?;

    let result = sandbox.store()?.list()?;
    let expect = vec![CastleEntry {
        name: "local".into(),
        remote: None,
    }];

    assert_eq!(result, expect);

    Ok(())
}
