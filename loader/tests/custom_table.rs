// tests/custom_table.rs

//! Custom patch tables given on the command line.
//!
//! Key responsibilities:
//! - Accept every size in 1..=4096 and hand back exactly the file bytes.
//! - Reject empty, oversized and missing files without producing a table.

use std::fs;
use tempfile::{NamedTempFile, TempDir};

use loader::{table::load_custom, Error};
use shared::constants::MAX_CUSTOM_TABLE_SIZE;

#[test]
fn test_exact_bytes_are_returned() {
    let dir = TempDir::new().unwrap();
    for size in [1usize, 2, 511, 4095, 4096] {
        let bytes: Vec<u8> = (0..size).map(|i| (i * 7 % 251) as u8).collect();
        let path = dir.path().join(format!("table_{size}.bin"));
        fs::write(&path, &bytes).unwrap();

        let table = load_custom(&path).unwrap();
        assert_eq!(table.len(), size);
        assert_eq!(table.as_bytes(), &bytes[..]);
    }
}

#[test]
fn test_empty_file_is_rejected() {
    let tmp = NamedTempFile::new().unwrap();

    let err = load_custom(tmp.path()).unwrap_err();
    assert!(matches!(err, Error::TableSize { size: 0, .. }), "unexpected: {err:?}");
}

#[test]
fn test_oversized_file_is_rejected() {
    let tmp = NamedTempFile::new().unwrap();
    fs::write(tmp.path(), vec![0x90u8; MAX_CUSTOM_TABLE_SIZE as usize + 1]).unwrap();

    let err = load_custom(tmp.path()).unwrap_err();
    match err {
        Error::TableSize { size, max, .. } => {
            assert_eq!(size, 4097);
            assert_eq!(max, 4096);
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_missing_file_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.bin");

    let err = load_custom(&path).unwrap_err();
    assert!(matches!(err, Error::TableRead { .. }), "unexpected: {err:?}");
    assert!(err.to_string().contains("missing.bin"));
}

#[test]
fn test_fingerprint_is_sha256_of_content() {
    let tmp = NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"abc").unwrap();

    let table = load_custom(tmp.path()).unwrap();
    assert_eq!(
        table.fingerprint(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}
