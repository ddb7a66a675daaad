//! Listing and metadata snapshot behavior.

mod common;

use common::{open_ok, ScriptedArchive, ScriptedEntry};
use runrar::Timestamp;

fn basic_blueprint() -> ScriptedArchive {
    ScriptedArchive::with_entries(vec![
        ScriptedEntry::file("docs/readme.md", b"hello world"),
        ScriptedEntry::directory("docs"),
        ScriptedEntry::file("data.bin", &[0xAB; 1000]),
    ])
}

#[test]
fn lists_all_entries_in_order() {
    let fixture = open_ok(basic_blueprint());
    let entries = fixture.archive.entries().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].path(), "docs/readme.md");
    assert_eq!(entries[0].name(), "readme.md");
    assert_eq!(entries[1].path(), "docs");
    assert!(entries[1].is_directory());
    assert_eq!(entries[2].uncompressed_size(), 1000);
}

#[test]
fn entry_metadata_is_decoded() {
    let fixture = open_ok(basic_blueprint());
    let entries = fixture.archive.entries().unwrap();
    let first = &entries[0];
    assert!(first.is_file());
    assert!(!first.is_encrypted());
    assert_eq!(first.host_os(), runrar::HostOs::Unix);
    assert_eq!(first.compression_method(), runrar::CompressionMethod::Normal);
    assert_eq!(first.hash_type(), runrar::HashType::Crc32);
    assert_eq!(
        first.modification_time(),
        Timestamp::from_halves(
            (common::FIXED_MTIME_TICKS >> 32) as u32,
            (common::FIXED_MTIME_TICKS & 0xFFFF_FFFF) as u32,
        )
    );
    assert!(first.creation_time().is_none());
}

#[test]
fn listing_never_decodes_bodies() {
    let fixture = open_ok(basic_blueprint());
    fixture.archive.entries().unwrap();
    assert_eq!(fixture.counters().data_calls, 0);
}

#[test]
fn every_open_is_closed() {
    let fixture = open_ok(basic_blueprint());
    fixture.archive.entries().unwrap();
    fixture.archive.entries().unwrap();
    let counters = fixture.counters();
    // One snapshot open plus one per listing.
    assert_eq!(counters.opens, 3);
    assert_eq!(counters.closes, 3);
}

#[test]
fn comment_is_snapshotted_once() {
    let fixture = open_ok(basic_blueprint().comment("archived by tests"));
    assert!(fixture.archive.has_comment());
    assert_eq!(fixture.archive.comment(), "archived by tests");
    let opens_after_snapshot = fixture.counters().opens;
    // Served from the snapshot, no further native calls.
    let _ = fixture.archive.comment();
    assert_eq!(fixture.counters().opens, opens_after_snapshot);
}

#[test]
fn missing_comment_reads_as_empty() {
    let fixture = open_ok(basic_blueprint());
    assert!(!fixture.archive.has_comment());
    assert_eq!(fixture.archive.comment(), "");
}

#[test]
fn oversized_comment_fails_open() {
    let mut blueprint = basic_blueprint();
    blueprint.comment_truncated = true;
    let result = common::open(blueprint, runrar::OpenOptions::new());
    assert!(matches!(
        result.map(|_| ()),
        Err(runrar::Error::SmallBuffer { .. })
    ));
}

#[test]
fn empty_archive_is_flagged() {
    let fixture = open_ok(ScriptedArchive::default());
    assert!(fixture.archive.is_empty_archive());
    assert!(fixture.archive.entries().unwrap().is_empty());
}

#[test]
fn non_empty_archive_is_not_flagged_empty() {
    let fixture = open_ok(basic_blueprint());
    assert!(!fixture.archive.is_empty_archive());
}

#[test]
fn size_totals_sum_over_entries() {
    let fixture = open_ok(basic_blueprint());
    assert_eq!(fixture.archive.uncompressed_size().unwrap(), 11 + 1000);
    assert_eq!(fixture.archive.compressed_size().unwrap(), 11 + 1000);
}

#[test]
fn volume_flags_are_exposed() {
    let fixture = open_ok(basic_blueprint().volume_set());
    assert!(fixture.archive.is_volume());
    assert!(fixture.archive.is_first_volume());
    assert!(!fixture.archive.has_multiple_volumes());

    let plain = open_ok(basic_blueprint());
    assert!(!plain.archive.is_volume());
}

#[test]
fn open_rejects_missing_file() {
    let (engine, counters) = common::engine(basic_blueprint());
    let result =
        runrar::Archive::open_with(engine, "/no/such/file.rar", runrar::OpenOptions::new());
    assert!(matches!(
        result.map(|_| ()),
        Err(runrar::Error::BadArchive { .. })
    ));
    // The path check fails before the engine is ever asked to open.
    assert_eq!(counters.borrow().opens, 0);
}

#[test]
fn entry_equality_matches_by_archive_and_path() {
    let fixture = open_ok(basic_blueprint());
    let first = fixture.archive.entries().unwrap();
    let second = fixture.archive.entries().unwrap();
    assert_eq!(first[0], second[0]);
    assert_ne!(first[0], second[2]);
}
