/*!
 * Session lifecycle across video loads
 */

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use lingocap::augment::AugmenterSettings;
use lingocap::captions::{CaptionTrack, FileCaptionFetcher};
use lingocap::errors::CaptionError;
use lingocap::providers::mock::MockProvider;
use lingocap::session::{SessionManager, SessionSettings};
use crate::common;

fn manager(provider: &MockProvider) -> SessionManager {
    let settings = AugmenterSettings { cooldown: Duration::ZERO, ..Default::default() };
    SessionManager::new(SessionSettings::default()).with_chat_model(Arc::new(provider.clone()), settings)
}

/// Test that reopening the same video keeps its session
#[test]
fn test_load_sameVideoTwice_shouldReuseSession() {
    let mut manager = manager(&MockProvider::working());
    let track = common::caption_track(&["a", "b"], 0, 100);

    let first = manager.load("vid", "en", &track).unwrap();
    let second = manager.load("vid", "en", &track).unwrap();

    assert_eq!(first.id(), second.id());
    assert!(Arc::ptr_eq(&first, &second));
}

/// Test that opening another video drops the old session and its cache
#[tokio::test]
async fn test_load_otherVideo_shouldClearPreviousCache() {
    let mut manager = manager(&MockProvider::replying("no marks at all"));
    let first = manager.load("one", "en", &common::caption_track(&["no", "marks", "at", "all"], 0, 100)).unwrap();
    let sentence = first.sentence_at(0).unwrap();
    first.augment(&sentence).await;
    let old_augmenter = Arc::clone(first.augmenter().unwrap());
    assert!(old_augmenter.cache().contains(sentence.key()));

    let second = manager.load("two", "en", &common::caption_track(&["fresh", "start"], 0, 100)).unwrap();

    assert!(old_augmenter.cache().is_empty());
    assert_ne!(first.id(), second.id());
    assert!(second.augmenter().unwrap().cache().is_empty());
    assert_eq!(manager.current().map(|s| s.video_id().to_string()), Some("two".to_string()));
}

/// Test that a track without words is rejected
#[test]
fn test_load_withEmptyTrack_shouldFail() {
    let mut manager = SessionManager::new(SessionSettings::default());
    manager.load("old", "en", &common::caption_track(&["x"], 0, 100)).unwrap();

    let empty: CaptionTrack = serde_json::from_value(serde_json::json!({ "events": [] })).unwrap();
    let result = manager.load("new", "en", &empty);

    assert!(matches!(result, Err(CaptionError::EmptyTrack(id)) if id == "new"));
    assert!(manager.current().is_none());
}

/// Test fetching captions only for videos that are not open
#[test]
fn test_loadFrom_withOpenVideo_shouldNotFetchAgain() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_caption_file(temp_dir.path(), "vid.en.json", &common::two_sentence_json())?;
    let fetcher = FileCaptionFetcher::new(temp_dir.path());
    let mut manager = SessionManager::new(SessionSettings::default());

    let result = tokio_test::block_on(async {
        let first = manager.load_from(&fetcher, "vid", "en").await?;
        std::fs::remove_file(&path)?;
        let second = manager.load_from(&fetcher, "vid", "en").await?;
        let other = manager.load_from(&fetcher, "other", "en").await;
        Ok::<_, anyhow::Error>((first, second, other.is_err()))
    });

    let (first, second, other_failed) = result?;
    assert_eq!(first.id(), second.id());
    assert!(other_failed);
    Ok(())
}

/// Test session summaries
#[test]
fn test_info_shouldDescribeSession() {
    let mut manager = SessionManager::new(SessionSettings::default());
    let track: CaptionTrack = serde_json::from_value(common::japanese_json()).unwrap();

    let session = manager.load("jp", "ja", &track).unwrap();
    let info = session.info();

    assert_eq!(info.video_id, "jp");
    assert_eq!(info.language, "ja");
    assert_eq!(info.word_count, 5);
    assert!(info.japanese);
    assert_eq!(info.id, session.id());
}

/// Test discarding the open session
#[test]
fn test_discard_shouldForgetSession() {
    let mut manager = SessionManager::new(SessionSettings::default());
    manager.load("vid", "en", &common::caption_track(&["a"], 0, 100)).unwrap();

    manager.discard();
    manager.discard();

    assert!(manager.current().is_none());
}
