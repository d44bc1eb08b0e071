//! End-to-end tests for repairing royallib.com archives.
//!
//! Each test builds download archives in a temporary directory, runs the
//! pipeline over them and inspects the repacked output.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fb2fix::{Error, FixConfig, Fixer, resolve_inputs};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const SAMPLE_DOCUMENT: &str = "<?xml version=\"1.0\" encoding=\"windows-1251\"?>\n\
<FictionBook><body><p>Пример текста</p></body><myfooter>junk</myfooter></FictionBook>\n";

fn cp1251(text: &str) -> Vec<u8> {
    let (bytes, _, had_errors) = encoding_rs::WINDOWS_1251.encode(text);
    assert!(!had_errors);
    bytes.into_owned()
}

/// Write a ZIP with the given entries and return its path.
fn write_archive(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    let mut zip = ZipWriter::new(File::create(&path).unwrap());
    for (entry, data) in entries {
        zip.start_file(*entry, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
    path
}

/// Read back every entry of a ZIP as `(name, text)`.
fn read_archive(path: &Path) -> Vec<(String, String)> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut text = String::new();
            file.read_to_string(&mut text).unwrap();
            (file.name().to_string(), text)
        })
        .collect()
}

/// A download directory plus an isolated workspace root.
struct Fixture {
    dir: TempDir,
    work: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let work = dir.path().join("work");
        fs::create_dir(&work).unwrap();
        Self { dir, work }
    }

    fn books(&self) -> &Path {
        self.dir.path()
    }

    fn fixer(&self) -> Fixer {
        Fixer::with_config(FixConfig::default().with_workspace_root(&self.work))
    }

    fn workspaces_left(&self) -> usize {
        fs::read_dir(&self.work).unwrap().count()
    }
}

// ============================================================================
// Single archive
// ============================================================================

#[test]
fn test_sample_archive_is_repaired() {
    let fx = Fixture::new();
    let source = write_archive(
        fx.books(),
        "royallib.com - Sample Title - royallib.com.fb2.zip",
        &[(
            "royallib.com - Sample Title - royallib.com.fb2",
            cp1251(SAMPLE_DOCUMENT).as_slice(),
        )],
    );

    let report = fx.fixer().process_one(&source).expect("repair failed");

    let output = fx.books().join("Sample Title.fb2.zip");
    assert_eq!(report.output, output);
    assert_eq!(report.entry_name, "royallib.com - Sample Title - royallib.com.fb2");
    assert_eq!(report.document_name, "Sample Title.fb2");
    assert!(report.reencoded);
    assert!(report.source_removed);
    assert!(report.kept_workspace.is_none());

    assert!(!source.exists(), "original archive should be deleted");
    let entries = read_archive(&output);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, "Sample Title.fb2");
    assert_eq!(
        entries[0].1,
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<FictionBook><body><p>Пример текста</p></body></FictionBook>\n"
    );

    assert_eq!(fx.workspaces_left(), 0);
}

#[test]
fn test_utf8_document_is_only_stripped() {
    let fx = Fixer::new();
    let dir = TempDir::new().unwrap();
    let document = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<FictionBook>\
<myheader>\nreklama\n</myheader><p>Текст</p></FictionBook>";
    let source = write_archive(
        dir.path(),
        "Book - royallib.com.fb2.zip",
        &[("Book - royallib.com.fb2", document.as_bytes())],
    );

    let report = fx.process_one(&source).unwrap();

    assert!(!report.reencoded);
    let entries = read_archive(&report.output);
    assert_eq!(entries[0].0, "Book.fb2");
    assert_eq!(
        entries[0].1,
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<FictionBook><p>Текст</p></FictionBook>"
    );
}

#[test]
fn test_other_entries_are_dropped() {
    let fx = Fixture::new();
    let source = write_archive(
        fx.books(),
        "x.zip",
        &[
            ("cover.jpg", b"\xFF\xD8"),
            ("nested/Story - royallib.com.FB2", b"<FictionBook/>"),
            ("readme.txt", b"hello"),
        ],
    );

    let report = fx.fixer().process_one(&source).unwrap();

    assert_eq!(report.output, fx.books().join("Story.fb2.zip"));
    let entries = read_archive(&report.output);
    assert_eq!(entries, vec![("Story.fb2".to_string(), "<FictionBook/>".to_string())]);
}

#[test]
fn test_last_document_entry_wins() {
    let fx = Fixture::new();
    let source = write_archive(
        fx.books(),
        "two.zip",
        &[("First.fb2", b"<first/>"), ("Second.fb2", b"<second/>")],
    );

    let report = fx.fixer().process_one(&source).unwrap();

    assert_eq!(report.document_name, "Second.fb2");
    assert_eq!(read_archive(&report.output)[0].1, "<second/>");
}

#[test]
fn test_already_clean_archive_is_rewritten_in_place() {
    let fx = Fixture::new();
    let source = write_archive(
        fx.books(),
        "Clean.fb2.zip",
        &[("Clean.fb2", b"<p>a</p><myfooter>x</myfooter>")],
    );

    let report = fx.fixer().process_one(&source).unwrap();

    assert_eq!(report.output, source);
    assert!(!report.source_removed);
    assert!(source.exists());
    assert_eq!(read_archive(&source)[0].1, "<p>a</p>");
}

#[test]
fn test_existing_output_is_overwritten() {
    let fx = Fixture::new();
    fs::write(fx.books().join("Title.fb2.zip"), b"stale, not even a zip").unwrap();
    let source = write_archive(
        fx.books(),
        "Title - royallib.com.fb2.zip",
        &[("Title - royallib.com.fb2", b"<fresh/>")],
    );

    let report = fx.fixer().process_one(&source).unwrap();

    assert_eq!(read_archive(&report.output), vec![("Title.fb2".to_string(), "<fresh/>".to_string())]);
}

#[test]
fn test_missing_document_is_reported() {
    let fx = Fixture::new();
    let source = write_archive(fx.books(), "empty.zip", &[("readme.txt", b"nothing here")]);

    let err = fx.fixer().process_one(&source).unwrap_err();

    assert!(matches!(&err, Error::DocumentNotFound(p) if p == &source));
    assert_eq!(err.exit_code(), 2);
    assert!(source.exists(), "input must be left alone");
    assert_eq!(fx.workspaces_left(), 0);
}

#[test]
fn test_corrupt_archive_is_zip_error() {
    let fx = Fixture::new();
    let source = fx.books().join("broken.fb2.zip");
    fs::write(&source, b"PK but not really").unwrap();

    let err = fx.fixer().process_one(&source).unwrap_err();

    assert!(matches!(err, Error::Zip(_)));
    assert!(source.exists());
    assert_eq!(fx.workspaces_left(), 0);
}

#[test]
fn test_keep_workspace_leaves_staged_document() {
    let fx = Fixture::new();
    let source = write_archive(
        fx.books(),
        "Kept - royallib.com.fb2.zip",
        &[("Kept - royallib.com.fb2", b"<kept/>")],
    );
    let fixer = Fixer::with_config(
        FixConfig::default()
            .with_workspace_root(&fx.work)
            .with_keep_workspace(true),
    );

    let report = fixer.process_one(&source).unwrap();

    let workspace = report.kept_workspace.expect("workspace path");
    assert!(workspace.starts_with(&fx.work));
    assert_eq!(fs::read_to_string(workspace.join("Kept.fb2")).unwrap(), "<kept/>");
}

// ============================================================================
// Batches
// ============================================================================

#[test]
fn test_batch_continues_past_failures() {
    let fx = Fixture::new();
    write_archive(fx.books(), "a.fb2.zip", &[("A - royallib.com.fb2", b"<a/>")]);
    write_archive(fx.books(), "b.fb2.zip", &[("notes.txt", b"no book")]);
    write_archive(fx.books(), "c.fb2.zip", &[("C - royallib.com.fb2", b"<c/>")]);

    let pattern = fx.books().join("*.fb2.zip");
    let mut inputs = resolve_inputs(pattern.to_str().unwrap()).unwrap();
    inputs.sort();
    assert_eq!(inputs.len(), 3);

    let mut seen = Vec::new();
    let summary = fx.fixer().fix_all(inputs, |path, result| {
        seen.push((path.file_name().unwrap().to_owned(), result.is_ok()));
    });

    assert_eq!(seen.len(), 3);
    assert_eq!(summary.fixed.len(), 2);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].0, fx.books().join("b.fb2.zip"));
    assert!(matches!(summary.failures[0].1, Error::DocumentNotFound(_)));
    assert_eq!(summary.exit_code(), 2);

    assert!(fx.books().join("A.fb2.zip").exists());
    assert!(fx.books().join("C.fb2.zip").exists());
    assert!(fx.books().join("b.fb2.zip").exists());
    assert_eq!(fx.workspaces_left(), 0);
}

#[test]
fn test_empty_batch_succeeds() {
    let fx = Fixture::new();
    let pattern = fx.books().join("*.fb2.zip");
    let inputs = resolve_inputs(pattern.to_str().unwrap()).unwrap();

    let summary = fx.fixer().fix_all(inputs, |_, _| panic!("nothing to process"));

    assert!(summary.is_success());
    assert_eq!(summary.exit_code(), 0);
}
