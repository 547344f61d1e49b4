/*!
 * Tests for file utility functions
 */

use std::fs;

use anyhow::Result;
use pagewise::file_utils::FileManager;

use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "exists.pdf", "content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path().join("absent.pdf")));
    Ok(())
}

/// Test that only files with the wanted extension are found, in order
#[test]
fn test_find_files_withMixedExtensions_shouldReturnSortedMatches() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("nested");
    fs::create_dir_all(&nested)?;
    common::create_test_file(temp_dir.path(), "b.pdf", "b")?;
    common::create_test_file(temp_dir.path(), "a.PDF", "a")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "n")?;
    common::create_test_file(&nested, "c.pdf", "c")?;

    let files = FileManager::find_files(temp_dir.path(), ".pdf")?;

    let names: Vec<String> = files
        .iter()
        .map(|p| p.strip_prefix(temp_dir.path()).unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.PDF", "b.pdf", "nested/c.pdf"]);
    Ok(())
}

/// Test that the source hash follows file content
#[test]
fn test_hash_file_withChangedContent_shouldChangeHash() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "doc.pdf", "one")?;
    let first = FileManager::hash_file(&file)?;
    assert_eq!(first.len(), 64);
    assert_eq!(first, FileManager::hash_file(&file)?);

    fs::write(&file, "two")?;

    assert_ne!(first, FileManager::hash_file(&file)?);
    Ok(())
}

/// Test that document ids come from the file stem
#[test]
fn test_document_id_withEmptyStem_shouldUseFallback() {
    assert_eq!(FileManager::document_id("/in/report.pdf"), "report");
    assert_eq!(FileManager::document_id(""), "document");
}
