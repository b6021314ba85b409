use std::fs;

use combiner_engine::{ensure_output_dir, AtomicFileWriter, PersistError, StagedFile};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("downloads");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write(".combiner_state.ron", "(jobs: [])").unwrap();
    assert_eq!(fs::read_to_string(&first).unwrap(), "(jobs: [])");

    let second = writer.write(".combiner_state.ron", "(jobs: [1])").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "(jobs: [1])");
}

#[test]
fn staged_file_is_invisible_until_persisted() {
    let temp = TempDir::new().unwrap();
    let mut staged = StagedFile::create(temp.path()).unwrap();
    staged.write_chunk(b"part one, ").unwrap();
    staged.write_chunk(b"part two").unwrap();
    assert_eq!(staged.bytes_written(), 18);
    assert!(!temp.path().join("result.xlsx").exists());

    let path = staged.persist("result.xlsx").unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"part one, part two");
}

#[test]
fn dropped_staged_file_leaves_nothing_behind() {
    let temp = TempDir::new().unwrap();
    {
        let mut staged = StagedFile::create(temp.path()).unwrap();
        staged.write_chunk(b"partial").unwrap();
    }
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn staged_file_rejects_paths_as_names() {
    let temp = TempDir::new().unwrap();
    let staged = StagedFile::create(temp.path()).unwrap();
    let err = staged.persist("../escape.xlsx").unwrap_err();
    assert!(matches!(err, PersistError::FileName(_)));
}

#[test]
fn output_path_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.write("state.ron", "data").is_err());
    assert!(!file_path.with_file_name("state.ron").exists());
}
