// tests/cmdline_tests.rs

mod common;

use common::args;
use loader::cmdline::{parse, Invocation, MAX_TOKEN_CHARS};
use std::path::PathBuf;

#[test]
fn test_no_argument_means_refresh() {
    assert_eq!(parse(args(&[])), Invocation::Refresh);
}

#[test]
fn test_empty_argument_means_refresh() {
    assert_eq!(parse(args(&[""])), Invocation::Refresh);
}

#[test]
fn test_switches_ignore_case() {
    assert_eq!(parse(args(&["/?"])), Invocation::Help);
    assert_eq!(parse(args(&["/s"])), Invocation::Stop);
    assert_eq!(parse(args(&["/S"])), Invocation::Stop);
}

#[test]
fn test_other_token_is_table_path() {
    assert_eq!(
        parse(args(&["vboxdd.bin"])),
        Invocation::CustomTable(PathBuf::from("vboxdd.bin"))
    );
    // near misses are paths too
    assert_eq!(parse(args(&["/stop"])), Invocation::CustomTable(PathBuf::from("/stop")));
    assert_eq!(parse(args(&["-s"])), Invocation::CustomTable(PathBuf::from("-s")));
}

#[test]
fn test_only_first_token_counts() {
    assert_eq!(parse(args(&["/s", "table.bin"])), Invocation::Stop);
    assert_eq!(parse(args(&["table.bin", "/s"])), Invocation::CustomTable(PathBuf::from("table.bin")));
    assert_eq!(parse(args(&["", "/s"])), Invocation::Refresh);
}

#[test]
fn test_long_token_is_capped() {
    let long = "a".repeat(MAX_TOKEN_CHARS + 40);

    match parse(args(&[&long])) {
        Invocation::CustomTable(path) => {
            assert_eq!(path.as_os_str().len(), MAX_TOKEN_CHARS);
        }
        other => panic!("unexpected: {other:?}"),
    }
}
