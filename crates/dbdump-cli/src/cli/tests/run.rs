//! Tests for the run subcommand and target collection.

use super::parse;
use crate::cli::commands::collect_target_files;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn cli_parse_run_defaults() {
    match parse(&["dbdump", "run", "targets/"]) {
        CliCommand::Run {
            targets,
            jobs,
            dump_destination,
            dump_error,
            json,
        } => {
            assert_eq!(targets, vec![PathBuf::from("targets/")]);
            assert!(jobs.is_none());
            assert!(dump_destination.is_none());
            assert!(dump_error.is_none());
            assert!(!json);
        }
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_parse_run_overrides() {
    match parse(&[
        "dbdump",
        "run",
        "a.toml",
        "b.toml",
        "--jobs",
        "4",
        "--dump-destination",
        "/srv/dumps",
        "--dump-error",
        "/srv/errors",
        "--json",
    ]) {
        CliCommand::Run {
            targets,
            jobs,
            dump_destination,
            dump_error,
            json,
        } => {
            assert_eq!(targets.len(), 2);
            assert_eq!(jobs, Some(4));
            assert_eq!(dump_destination, Some(PathBuf::from("/srv/dumps")));
            assert_eq!(dump_error, Some(PathBuf::from("/srv/errors")));
            assert!(json);
        }
        _ => panic!("expected Run with overrides"),
    }
}

#[test]
fn cli_parse_run_concurrency_alias() {
    match parse(&["dbdump", "run", "t.toml", "--concurrency", "2"]) {
        CliCommand::Run { jobs, .. } => assert_eq!(jobs, Some(2)),
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_run_requires_target() {
    assert!(Cli::try_parse_from(["dbdump", "run"]).is_err());
}

#[test]
fn collect_expands_directories_and_keeps_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.toml"), "").unwrap();
    std::fs::write(dir.path().join("a.toml"), "").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "").unwrap();
    std::fs::create_dir(dir.path().join("sub.toml")).unwrap();
    let explicit = PathBuf::from("/etc/dbdump/extra.conf");

    let files =
        collect_target_files(&[dir.path().to_path_buf(), explicit.clone()], "toml").unwrap();
    assert_eq!(
        files,
        vec![dir.path().join("a.toml"), dir.path().join("b.toml"), explicit]
    );
}
