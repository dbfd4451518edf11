// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{GitCall, Sandbox};

use anyhow::Result;
use homesick::{castle::CastleError, store::StoreError};
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;

#[sealed_test]
fn pull_named_castle() -> Result<()> {
    let sandbox = Sandbox::new()?;
    sandbox.given_castle("zomg", "wtf/zomg")?;
    let store = sandbox.store()?;

    store.pull("wtf/zomg")?;

    let expect = vec![GitCall::Pull {
        castle_dir: sandbox.repos.join("wtf/zomg"),
    }];
    assert_eq!(store.git().calls(), expect);

    Ok(())
}

#[sealed_test]
fn pull_all_castles_in_name_order() -> Result<()> {
    let sandbox = Sandbox::new()?;
    sandbox.given_castle("zomg", "zomg")?;
    sandbox.given_castle("zomg", "wtf/zomg")?;
    sandbox.given_castle("glencairn", "glencairn")?;
    let store = sandbox.store()?;

    store.pull_all()?;

    let expect = ["glencairn", "wtf/zomg", "zomg"]
        .into_iter()
        .map(|name| GitCall::Pull {
            castle_dir: sandbox.repos.join(name),
        })
        .collect::<Vec<_>>();
    assert_eq!(store.git().calls(), expect);

    Ok(())
}

#[sealed_test]
fn pull_missing_castle_fails() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let store = sandbox.store()?;

    let result = store.pull("nope");

    assert!(matches!(
        result,
        Err(StoreError::Castle(CastleError::NotFound { .. }))
    ));
    assert!(store.git().calls().is_empty());

    Ok(())
}
