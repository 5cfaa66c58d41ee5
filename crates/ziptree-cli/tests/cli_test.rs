use std::fs;
use std::io::Write;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Write a zip where `Some(bytes)` is a file and `None` a directory entry
fn write_zip(path: &Path, entries: &[(&str, Option<&[u8]>)]) {
    let file = fs::File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    for (name, content) in entries {
        match content {
            Some(bytes) => {
                writer.start_file(*name, options).unwrap();
                writer.write_all(bytes).unwrap();
            }
            None => {
                writer.add_directory(*name, options).unwrap();
            }
        }
    }
    writer.finish().unwrap();
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("ziptree").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ziptree"));
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("ziptree").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Mirror a ZIP archive's tree"));
}

#[test]
fn test_extract_basic() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("test.zip");
    let output_dir = temp_dir.path().join("output");

    write_zip(
        &archive_path,
        &[("a/b.txt", Some(b"hello")), ("a/c/", None)],
    );

    let mut cmd = Command::cargo_bin("ziptree").unwrap();
    cmd.arg(&archive_path)
        .arg("-o")
        .arg(&output_dir)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(output_dir.join("a/b.txt")).unwrap(),
        "hello"
    );
    assert!(output_dir.join("a/c").is_dir());
}

#[test]
fn test_extract_twice_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("test.zip");
    let output_dir = temp_dir.path().join("output");

    write_zip(&archive_path, &[("file.txt", Some(b"archived"))]);

    let mut cmd = Command::cargo_bin("ziptree").unwrap();
    cmd.arg(&archive_path)
        .arg("-o")
        .arg(&output_dir)
        .assert()
        .success();

    // drift the destination, then re-run
    fs::write(output_dir.join("file.txt"), b"drifted").unwrap();

    let mut cmd = Command::cargo_bin("ziptree").unwrap();
    cmd.arg(&archive_path)
        .arg("-o")
        .arg(&output_dir)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(output_dir.join("file.txt")).unwrap(),
        "archived"
    );
}

#[test]
fn test_missing_archive_is_rejected() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("ziptree").unwrap();
    cmd.arg(temp_dir.path().join("absent.zip"))
        .arg("-o")
        .arg(temp_dir.path().join("out"))
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("cannot be found"));

    assert!(!temp_dir.path().join("out").exists());
}

#[test]
fn test_destination_file_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("test.zip");
    let occupied = temp_dir.path().join("occupied");

    write_zip(&archive_path, &[("f.txt", Some(b"x"))]);
    fs::write(&occupied, b"plain file").unwrap();

    let mut cmd = Command::cargo_bin("ziptree").unwrap();
    cmd.arg(&archive_path)
        .arg("-o")
        .arg(&occupied)
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("points to a file"));

    assert_eq!(fs::read(&occupied).unwrap(), b"plain file");
}

#[test]
fn test_garbage_archive_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let bad_archive = temp_dir.path().join("bad.zip");
    fs::write(&bad_archive, b"not a zip file").unwrap();

    let mut cmd = Command::cargo_bin("ziptree").unwrap();
    cmd.arg(&bad_archive)
        .arg("-o")
        .arg(temp_dir.path().join("out"))
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_conflict_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("test.zip");
    let output_dir = temp_dir.path().join("output");

    write_zip(&archive_path, &[("a/", None), ("a/b.txt", Some(b"x"))]);

    fs::create_dir(&output_dir).unwrap();
    fs::write(output_dir.join("a"), b"file in the way").unwrap();

    let mut cmd = Command::cargo_bin("ziptree").unwrap();
    cmd.arg(&archive_path)
        .arg("-o")
        .arg(&output_dir)
        .assert()
        .failure()
        .code(4);
}

#[test]
fn test_verbose_and_quiet_flags() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("test.zip");

    write_zip(&archive_path, &[("f.txt", Some(b"x"))]);

    // verbose shows per-entry debug logs
    let mut cmd = Command::cargo_bin("ziptree").unwrap();
    cmd.arg("-v")
        .arg(&archive_path)
        .arg("-o")
        .arg(temp_dir.path().join("out1"))
        .assert()
        .success()
        .stderr(predicate::str::contains("DEBUG"));

    // quiet suppresses everything
    let mut cmd = Command::cargo_bin("ziptree").unwrap();
    cmd.arg("-q")
        .arg(&archive_path)
        .arg("-o")
        .arg(temp_dir.path().join("out2"))
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}
