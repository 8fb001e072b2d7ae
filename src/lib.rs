//! Symlink-based dotfile stowing engine.
//!
//! Mirrors a source directory into a destination with one symlink per file,
//! honouring per-directory `.stowconfig` ignore rules, ownership and
//! overwrite policies, and never linking anything into the source itself.
//!
//! The public API is organised into layers, leaf first:
//!
//! - **[`tree`]**: in-memory mirror of the source directory
//! - **[`config`]**: `.stowconfig` parsing, glob resolution, user defaults
//! - **[`trim`]**: the ordered pipeline that shrinks the tree before linking
//! - **[`link`]**: link policy and the recursive link walk
//! - **[`stower`]**: one run, including the confirmation gate
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod config;
pub mod error;
pub mod link;
pub mod logging;
pub mod ownership;
pub mod paths;
pub mod prompt;
pub mod stower;
pub mod tree;
pub mod trim;
