/*!
 * Tests for file utility functions
 */

use std::path::Path;
use anyhow::Result;
use lingocap::file_utils::FileManager;
use crate::common;

/// Test that a directory input yields its caption files in order
#[test]
fn test_caption_inputs_withDirectory_shouldFindJsonFilesSorted() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    common::create_caption_file(dir, "b.en.json", &common::two_sentence_json())?;
    common::create_caption_file(dir, "a.ja.json", &common::japanese_json())?;
    common::create_test_file(dir, "notes.txt", "not captions")?;

    let inputs = FileManager::caption_inputs(dir)?;

    assert_eq!(inputs.len(), 2);
    assert!(inputs[0].ends_with("a.ja.json"));
    assert!(inputs[1].ends_with("b.en.json"));
    Ok(())
}

/// Test that a file input is returned as is and a missing path fails
#[test]
fn test_caption_inputs_withFileOrMissingPath_shouldBehave() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_caption_file(temp_dir.path(), "x.json", &common::two_sentence_json())?;

    assert_eq!(FileManager::caption_inputs(&file)?, vec![file.clone()]);
    assert!(FileManager::caption_inputs(temp_dir.path().join("missing")).is_err());
    Ok(())
}

/// Test reading a caption track written by the fixtures
#[test]
fn test_read_caption_track_withValidFile_shouldDecodeEvents() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_caption_file(temp_dir.path(), "vid.json", &common::two_sentence_json())?;

    let track = FileManager::read_caption_track(&file)?;

    assert_eq!(track.events.len(), 4);
    assert_eq!(track.segment_count(), 6);
    Ok(())
}

/// Test that a broken caption file reports the path
#[test]
fn test_read_caption_track_withInvalidJson_shouldFailWithContext() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "broken.json", "{ events: ")?;

    let err = FileManager::read_caption_track(&file).unwrap_err();

    assert!(format!("{:#}", err).contains("broken.json"));
    Ok(())
}

/// Test that write_json creates missing parent directories
#[test]
fn test_write_json_withNestedPath_shouldCreateParents() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("out.json");

    FileManager::write_json(&path, &serde_json::json!({ "ok": true }))?;

    assert!(FileManager::file_exists(&path));
    assert!(FileManager::read_to_string(&path)?.contains("\"ok\": true"));
    Ok(())
}

/// Test output path and video id derivation
#[test]
fn test_paths_shouldDeriveNamesFromCaptionFiles() {
    let output = FileManager::generate_output_path("/in/abc.ja.json", "/out", "punctuated", "json");
    assert_eq!(output, Path::new("/out/abc.ja.punctuated.json"));
    assert_eq!(FileManager::video_id_from_path("/in/abc.ja.json"), "abc");
}
