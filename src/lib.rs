// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Homesick, a dotfile manager built on Git and symlinks.
//!
//! Dotfile repositories are called __castles__. Homesick clones castles into
//! a repos directory, and links their contents into the user's home
//! directory. Linking comes in two flavours: whole top-level entries, or an
//! overlay that mirrors directories for real and only links leaf files.
//!
//! # See Also
//!
//! 1. [`store`]
//! 2. [`castle`]
//! 3. [`castle::link`]

pub mod castle;
pub mod config;
pub mod path;
pub mod reference;
pub mod store;

pub use castle::{
    git::{GitBinary, GitClient},
    link::{LinkOutcome, LinkReport, Linker},
    Castle,
};
pub use config::{LinkOptions, Settings};
pub use reference::RepoRef;
pub use store::{CastleEntry, Store};
