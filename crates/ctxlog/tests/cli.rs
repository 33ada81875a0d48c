//! Command-line parsing and dispatch.

use clap::Parser;
use ctxlog::cli::{Cli, Command, is_error, run_with_input};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::{TempDir, tempdir};

fn workspace() -> TempDir {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("ctxlog.json5"),
        "{ storage: { capacity: 10 }, search: { default_limit: 3 } }",
    )
    .expect("write config");
    dir
}

fn run(dir: &Path, args: &[&str], stdin: &str) -> String {
    let config = dir.join("ctxlog.json5");
    let root = dir.join("store");
    let mut argv = vec![
        "ctxlog".to_string(),
        "--config".to_string(),
        config.display().to_string(),
        "--root".to_string(),
        root.display().to_string(),
    ];
    argv.extend(args.iter().map(|arg| arg.to_string()));
    let cli = Cli::try_parse_from(argv).expect("parse");
    run_with_input(cli, &mut stdin.as_bytes()).expect("run")
}

#[test]
fn parses_summary_with_tags() {
    let cli = Cli::try_parse_from([
        "ctxlog", "summary", "Fixed the build", "-t", "ci", "--tag", "rust", "--max-words", "20",
    ])
    .expect("parse");
    match cli.command {
        Command::Summary {
            text,
            tags,
            max_words,
        } => {
            assert_eq!(text, "Fixed the build");
            assert_eq!(tags, vec!["ci", "rust"]);
            assert_eq!(max_words, Some(20));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn defaults_apply_to_recent_and_cleanup() {
    let cli = Cli::try_parse_from(["ctxlog", "recent"]).expect("parse");
    assert!(matches!(cli.command, Command::Recent { sessions: 3 }));
    let cli = Cli::try_parse_from(["ctxlog", "cleanup"]).expect("parse");
    assert!(matches!(cli.command, Command::Cleanup { days: 30 }));
    assert!(Cli::try_parse_from(["ctxlog", "bogus"]).is_err());
}

#[test]
fn summary_then_search_round_trip() {
    let dir = workspace();
    let saved = run(
        dir.path(),
        &["summary", "Decided to use sqlite for the cache", "-t", "storage"],
        "",
    );
    assert_eq!(saved, "Session summary saved (7 words, 1 key phrases)");

    let found = run(dir.path(), &["search", "sqlite", "--scope", "sessions"], "");
    assert!(found.starts_with("=== SEARCH RESULTS for 'sqlite' ==="));
    assert!(found.contains("[relevance: 1]"));

    let stats = run(dir.path(), &["stats"], "");
    assert!(stats.contains("Session summaries: 1"));
    assert!(stats.contains("(10 records per store)"));
}

#[test]
fn dash_reads_text_from_stdin() {
    let dir = workspace();
    let out = run(
        dir.path(),
        &["event", "error_solved", "-", "--project", "api"],
        "Error: pool exhausted; fixed by raising max connections\n",
    );
    assert_eq!(out, "Recorded error_solved event for api");
}

#[test]
fn operation_errors_are_reported_as_text() {
    let dir = workspace();
    let out = run(dir.path(), &["search", "anything", "--scope", "planets"], "");
    assert!(is_error(&out));
    assert!(out.contains("invalid scope 'planets'"));
    assert!(!is_error(&run(dir.path(), &["cleanup", "7"], "")));
}
