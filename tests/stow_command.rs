#![cfg(unix)]
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing,
    clippy::panic
)]
//! Integration tests for a full stow run.
//!
//! Each test lays out a source and destination on disk, runs the whole
//! pipeline non-interactively and inspects the resulting symlinks.

mod common;

use std::fs;

use common::{Answer, ForeignPaths, StowFixture};
use pstow_cli::error::{PathError, StowError};
use pstow_cli::logging::Logger;
use pstow_cli::ownership::SystemOwnership;
use pstow_cli::prompt::Confirmation;
use pstow_cli::stower::{AbortReason, StowOptions, StowOutcome, StowState, Stower};

// ---------------------------------------------------------------------------
// Basic scenarios
// ---------------------------------------------------------------------------

#[test]
fn fresh_destination_gets_every_file() {
    let fx = StowFixture::builder()
        .with_file("a.txt")
        .with_file("sub/b.txt")
        .build();

    let outcome = fx.run(fx.options()).unwrap();

    let StowOutcome::Linked(report) = outcome else {
        panic!("expected a linked outcome, got {outcome:?}");
    };
    assert_eq!(report.linked, 2);
    assert_eq!(report.failed, 0);
    assert!(fx.is_linked("a.txt"));
    assert!(fx.is_linked("sub/b.txt"));
    assert!(fx.dst("sub").symlink_metadata().unwrap().is_dir());
}

#[test]
fn regular_file_in_the_way_is_skipped_without_force() {
    let fx = StowFixture::builder()
        .with_file("a.txt")
        .with_file("sub/b.txt")
        .with_dest_file("a.txt")
        .build();

    let outcome = fx.run(fx.options()).unwrap();

    let StowOutcome::Linked(report) = outcome else {
        panic!("expected a linked outcome, got {outcome:?}");
    };
    assert_eq!(report.skipped, 1);
    assert_eq!(report.linked, 1);
    assert_eq!(fs::read_to_string(fx.dst("a.txt")).unwrap(), "existing");
    assert!(fx.is_linked("sub/b.txt"));
}

#[test]
fn force_replaces_regular_file() {
    let fx = StowFixture::builder()
        .with_file("a.txt")
        .with_dest_file("a.txt")
        .build();
    let options = StowOptions {
        force: true,
        ..fx.options()
    };

    fx.run(options).unwrap();

    assert!(fx.is_linked("a.txt"));
}

#[test]
fn ignored_file_empties_and_prunes_its_directory() {
    let fx = StowFixture::builder()
        .with_file("a.txt")
        .with_file("sub/b.txt")
        .with_config("sub", "[ignore]\nb.txt\n")
        .build();

    fx.run(fx.options()).unwrap();

    assert!(fx.is_linked("a.txt"));
    assert!(!fx.dst("sub").exists());
    assert!(!fx.dst(".stowconfig").exists());
}

#[test]
fn excluded_directory_is_dropped_before_its_config_is_read() {
    // The invalid pattern would fail the run if this config were read.
    let fx = StowFixture::builder()
        .with_file("a.txt")
        .with_file("sub/b.txt")
        .with_config("sub", "[ignore]\n[unclosed\n")
        .build();
    let options = StowOptions {
        exclude: vec![fx.src("sub")],
        ..fx.options()
    };

    let outcome = fx.run(options).unwrap();

    assert!(matches!(outcome, StowOutcome::Linked(r) if r.linked == 1));
    assert!(fx.is_linked("a.txt"));
    assert!(!fx.dst("sub").exists());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn second_run_is_idempotent() {
    let fx = StowFixture::builder()
        .with_file("a.txt")
        .with_file("sub/b.txt")
        .with_file("sub/deeper/c.txt")
        .build();

    fx.run(fx.options()).unwrap();
    let first = StowFixture::symlinks_under(&fx.dest);
    let outcome = fx.run(fx.options()).unwrap();
    let second = StowFixture::symlinks_under(&fx.dest);

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    let StowOutcome::Linked(report) = outcome else {
        panic!("expected a linked outcome, got {outcome:?}");
    };
    assert_eq!(report.already_linked, 3);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.failed, 0);
}

#[test]
fn nothing_is_linked_inside_the_source() {
    // The source contains a directory named like itself, so with the
    // destination set to the source's parent, `cfg/cfg/inner.txt` would map
    // back onto `cfg/inner.txt`.
    let fx = StowFixture::builder()
        .with_file("a.txt")
        .with_file("cfg/inner.txt")
        .build();
    let options = StowOptions {
        destination: Some(fx.base.clone()),
        ..fx.options()
    };

    let outcome = fx.run(options).unwrap();

    let StowOutcome::Linked(report) = outcome else {
        panic!("expected a linked outcome, got {outcome:?}");
    };
    assert_eq!(report.linked, 1);
    assert_eq!(report.skipped, 1);
    assert!(fx.base.join("a.txt").symlink_metadata().unwrap().is_symlink());
    assert!(!fx.src("inner.txt").exists());
    assert!(StowFixture::symlinks_under(&fx.source).is_empty());
}

#[test]
fn ignore_patterns_stay_inside_their_directory() {
    let fx = StowFixture::builder()
        .with_file("note")
        .with_file("sub/note")
        .with_file("sub/keep")
        .with_config("sub", "note\n../note\n/keep/\n")
        .build();

    fx.run(fx.options()).unwrap();

    assert!(fx.is_linked("note"));
    assert!(!fx.dst("sub/note").exists());
    assert!(!fx.dst("sub/keep").exists());
}

#[test]
fn foreign_files_are_linked_only_when_overwriting_others() {
    let fx = StowFixture::builder()
        .with_file("mine")
        .with_file("theirs")
        .build();
    let ownership = ForeignPaths::new(vec![fx.src("theirs")]);

    fx.run_with(fx.options(), &ownership).unwrap();
    assert!(fx.is_linked("mine"));
    assert!(!fx.dst("theirs").exists());

    let options = StowOptions {
        overwrite_others: true,
        ..fx.options()
    };
    fx.run_with(options, &ownership).unwrap();
    assert!(fx.is_linked("theirs"));
}

#[test]
fn foreign_directory_is_trimmed_whole() {
    let fx = StowFixture::builder()
        .with_file("mine")
        .with_file("shared/x")
        .with_file("shared/y")
        .build();
    let ownership = ForeignPaths::new(vec![fx.src("shared")]);

    fx.run_with(fx.options(), &ownership).unwrap();

    assert!(fx.is_linked("mine"));
    assert!(!fx.dst("shared").exists());
}

#[test]
fn foreign_destination_is_never_replaced() {
    let fx = StowFixture::builder().with_file("a").build();
    std::os::unix::fs::symlink("/nowhere", fx.dst("a")).unwrap();
    let ownership = ForeignPaths::new(vec![fx.dst("a")]);

    let outcome = fx.run_with(fx.options(), &ownership).unwrap();

    assert!(matches!(outcome, StowOutcome::Linked(r) if r.skipped == 1));
    assert_eq!(
        fs::read_link(fx.dst("a")).unwrap(),
        std::path::PathBuf::from("/nowhere")
    );
}

#[test]
fn fully_ignored_subtree_creates_no_directory() {
    let fx = StowFixture::builder()
        .with_file("a")
        .with_file("deep/er/x.log")
        .with_file("deep/y.log")
        .with_dir("hollow/empty")
        .with_config("", "**/*.log\n")
        .build();

    fx.run(fx.options()).unwrap();

    assert!(fx.is_linked("a"));
    assert!(!fx.dst("deep").exists());
    assert!(!fx.dst("hollow").exists());
}

// ---------------------------------------------------------------------------
// Run control
// ---------------------------------------------------------------------------

#[test]
fn missing_parent_without_make_parents_is_fatal() {
    let fx = StowFixture::builder().with_file("sub/b.txt").build();
    let options = StowOptions {
        make_parents: false,
        ..fx.options()
    };

    let err = fx.run(options).unwrap_err();

    assert!(matches!(
        err,
        StowError::Path(PathError::MissingParent(ref p)) if *p == fx.dst("sub")
    ));
}

#[test]
fn declined_prompt_leaves_destination_untouched() {
    let fx = StowFixture::builder().with_file("a.txt").build();
    let log = Logger::new();
    let ownership = SystemOwnership::current();
    let confirm = Answer(Confirmation::Declined);
    let options = StowOptions {
        non_interactive: false,
        ..fx.options()
    };
    let mut stower = Stower::new(options, &log, &ownership, &confirm).unwrap();

    let outcome = stower.run().unwrap();

    assert_eq!(outcome, StowOutcome::Aborted(AbortReason::Declined));
    assert_eq!(stower.state(), StowState::Aborted);
    assert_eq!(fs::read_dir(&fx.dest).unwrap().count(), 0);
}

#[test]
fn status_mode_previews_without_linking() {
    let fx = StowFixture::builder()
        .with_file("a.txt")
        .with_file("sub/b.txt")
        .build();
    let options = StowOptions {
        status: true,
        ..fx.options()
    };

    let outcome = fx.run(options).unwrap();

    assert!(matches!(outcome, StowOutcome::Displayed(Some(r)) if r.linked == 2));
    assert_eq!(fs::read_dir(&fx.dest).unwrap().count(), 0);
}

#[test]
fn symlinked_directory_in_source_is_linked_as_one_entry() {
    let fx = StowFixture::builder().with_file("real/x").build();
    std::os::unix::fs::symlink(fx.src("real"), fx.src("alias")).unwrap();

    fx.run(fx.options()).unwrap();

    assert!(fx.is_linked("alias"));
    assert!(fx.is_linked("real/x"));
}

#[test]
fn bracketed_ignore_patterns_keep_later_rules_active() {
    let fx = StowFixture::builder()
        .with_file("a")
        .with_file(".vimrc.swp")
        .with_file("secret.key")
        .with_config("", "[ignore]\n[._]*.sw[a-p]\nsecret.key\n")
        .build();

    let outcome = fx.run(fx.options()).unwrap();

    assert!(matches!(outcome, StowOutcome::Linked(r) if r.linked == 1));
    assert!(fx.is_linked("a"));
    assert!(!fx.dst(".vimrc.swp").exists());
    assert!(!fx.dst("secret.key").exists());
}

#[test]
fn unreadable_destination_is_a_failure_not_a_skip() {
    let fx = StowFixture::builder().with_file("sub/b.txt").build();
    fs::write(fx.dst("sub"), "plain file").unwrap();

    let outcome = fx.run(fx.options()).unwrap();

    let StowOutcome::Linked(report) = outcome else {
        panic!("expected a linked outcome, got {outcome:?}");
    };
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(fs::read_to_string(fx.dst("sub")).unwrap(), "plain file");
}
