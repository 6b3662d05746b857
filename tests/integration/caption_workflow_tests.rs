/*!
 * Caption files through the application controller
 */

use anyhow::Result;

use lingocap::app_controller::Controller;
use lingocap::captions::FileCaptionFetcher;
use lingocap::file_utils::FileManager;
use lingocap::session::SessionManager;
use crate::common;

/// Test segmenting a single caption file
#[test]
fn test_segmentPath_withSingleFile_shouldListSentences() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_caption_file(temp_dir.path(), "abc123.en.json", &common::two_sentence_json())?;
    let controller = Controller::with_config(common::test_config())?;

    let files = controller.segment_path(&path, None)?;

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].video_id, "abc123");
    let texts: Vec<String> = files[0].sentences.iter().map(|s| s.display_text()).collect();
    assert_eq!(texts, vec!["Hello world.", "How are you?"]);
    Ok(())
}

/// Test looking up the sentence at a given time
#[test]
fn test_segmentPath_withTime_shouldReturnOnlyThatSentence() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_caption_file(temp_dir.path(), "abc123.json", &common::two_sentence_json())?;
    let controller = Controller::with_config(common::test_config())?;

    let files = controller.segment_path(&path, Some(4500))?;

    assert_eq!(files[0].sentences.len(), 1);
    assert_eq!(files[0].sentences[0].key(), (2, 4));
    assert_eq!(files[0].sentences[0].start_time_ms, 3000);

    // Before the first word the nearest word decides
    let before_first = controller.segment_path(&path, Some(10))?;
    assert_eq!(before_first[0].sentences[0].key(), (0, 1));
    Ok(())
}

/// Test that broken files in a directory are skipped
#[test]
fn test_segmentPath_withDirectory_shouldSkipInvalidFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_caption_file(temp_dir.path(), "a.en.json", &common::two_sentence_json())?;
    common::create_caption_file(temp_dir.path(), "b.ja.json", &common::japanese_json())?;
    common::create_test_file(temp_dir.path(), "c.json", "{ not json")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "ignored")?;
    let controller = Controller::with_config(common::test_config())?;

    let files = controller.segment_path(temp_dir.path(), None)?;

    let ids: Vec<&str> = files.iter().map(|f| f.video_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(files[1].sentences[0].display_text(), "今日はいい天気。");
    Ok(())
}

/// Test that a single broken file is an error
#[test]
fn test_segmentPath_withInvalidFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.json", "{ not json")?;
    let controller = Controller::with_config(common::test_config())?;

    assert!(controller.segment_path(&path, None).is_err());
    assert!(controller.segment_path(&temp_dir.path().join("missing.json"), None).is_err());
    Ok(())
}

/// Test that punctuation restoration refuses to run when disabled
#[tokio::test]
async fn test_punctuateFile_whenDisabled_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_caption_file(temp_dir.path(), "abc.json", &common::two_sentence_json())?;
    let controller = Controller::with_config(common::test_config())?;

    let err = controller.punctuate_file(&path, None).await.unwrap_err();

    assert!(err.to_string().contains("disabled"));
    Ok(())
}

/// Test downloading through a fetcher into an output directory
#[tokio::test]
async fn test_fetchWith_withFileFetcher_shouldStoreTrack() -> Result<()> {
    let source = common::create_temp_dir()?;
    common::create_caption_file(source.path(), "abc123.ja.json", &common::japanese_json())?;
    let output = common::create_temp_dir()?;
    let controller = Controller::with_config(common::test_config())?;
    let fetcher = FileCaptionFetcher::new(source.path());

    let path = controller
        .fetch_with(&fetcher, "abc123", "ja", Some(output.path().join("captions")))
        .await?;

    assert_eq!(path, output.path().join("captions").join("abc123.ja.json"));
    let track = FileManager::read_caption_track(&path)?;
    assert_eq!(track.events.len(), 5);
    Ok(())
}

/// Test that a fetch for an unknown video reports an error
#[tokio::test]
async fn test_fetchWith_withMissingVideo_shouldFail() -> Result<()> {
    let source = common::create_temp_dir()?;
    let controller = Controller::with_config(common::test_config())?;
    let fetcher = FileCaptionFetcher::new(source.path());

    let result = controller.fetch_with(&fetcher, "nope", "en", Some(source.path().to_path_buf())).await;

    assert!(result.is_err());
    Ok(())
}

/// Test that opening a second file replaces the session
#[test]
fn test_openSession_withTwoFiles_shouldReplaceSession() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let english = common::create_caption_file(temp_dir.path(), "vid.en.json", &common::two_sentence_json())?;
    let japanese = common::create_caption_file(temp_dir.path(), "vid.ja.json", &common::japanese_json())?;
    let controller = Controller::with_config(common::test_config())?;
    let mut manager = SessionManager::from_config(&controller.config);

    let first = controller.open_session(&mut manager, &english)?;
    let second = controller.open_session(&mut manager, &japanese)?;

    assert_ne!(first.id(), second.id());
    assert_eq!(second.word_count(), 5);
    assert_eq!(manager.current().map(|s| s.id().to_string()), Some(second.id().to_string()));
    Ok(())
}
