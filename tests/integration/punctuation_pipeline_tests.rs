/*!
 * Punctuation restoration against mock providers
 */

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use lingocap::app_config::NavigationConfig;
use lingocap::app_controller::Controller;
use lingocap::augment::{AugmentOutcome, AugmenterSettings, SkipReason};
use lingocap::captions::CaptionTrack;
use lingocap::playback::{ControllerEvent, NavigationController, SimulatedPlayer, VideoPlayer};
use lingocap::providers::mock::MockProvider;
use lingocap::session::{CaptionSession, SessionManager, SessionSettings};
use crate::common;

fn fast_settings() -> AugmenterSettings {
    AugmenterSettings {
        cooldown: Duration::ZERO,
        retry_after: Duration::from_millis(50),
        ..Default::default()
    }
}

fn load(provider: &MockProvider, track: &CaptionTrack) -> Arc<CaptionSession> {
    common::init_test_logging();
    let mut manager = SessionManager::new(SessionSettings::default())
        .with_chat_model(Arc::new(provider.clone()), fast_settings());
    manager.load("vid", "en", track).unwrap()
}

fn unpunctuated() -> CaptionTrack {
    common::caption_track(&["so", "i", "think", "we", "should", "go"], 0, 400)
}

/// Test that a punctuated answer becomes new sentence boundaries
#[tokio::test]
async fn test_augment_withSplittingAnswer_shouldCreateSentences() {
    let provider = MockProvider::replying("So I think. We should go!");
    let session = load(&provider, &unpunctuated());
    let sentence = session.sentence_at(0).unwrap();
    assert_eq!(sentence.key(), (0, 5));

    let outcome = session.augment(&sentence).await;

    assert_eq!(outcome, Some(AugmentOutcome::Applied { inserted: 2 }));
    assert_eq!(provider.received(), vec!["so i think we should go".to_string()]);
    let texts: Vec<String> = session.sentences().iter().map(|s| s.display_text()).collect();
    assert_eq!(texts, vec!["so i think.", "we should go!"]);
}

/// Test that the rebuilt words survive a round trip unchanged
#[tokio::test]
async fn test_augment_shouldKeepWordTimings() {
    let provider = MockProvider::working();
    let session = load(&provider, &unpunctuated());
    let before: Vec<_> = session.timeline().read().words().cloned().collect();

    let sentence = session.sentence_at(1000).unwrap();
    session.augment(&sentence).await;

    let after: Vec<_> = session.timeline().read().words().cloned().collect();
    assert_eq!(before, after);
    assert_eq!(session.timeline().read().slot(5), Some('.'));
}

/// Test the fallback for a failing provider
#[tokio::test]
async fn test_augment_withFailingProvider_shouldFallBackToPlainText() {
    let provider = MockProvider::failing();
    let session = load(&provider, &unpunctuated());
    let sentence = session.sentence_at(0).unwrap();

    let outcome = session.augment(&sentence).await;

    match outcome {
        Some(AugmentOutcome::Fallback { text, .. }) => assert_eq!(text, "so i think we should go"),
        other => panic!("expected fallback, got {:?}", other),
    }
    assert_eq!(session.sentence_at(0).unwrap().display_text(), "so i think we should go");

    // The span becomes available again once the retry delay has passed
    let augmenter = session.augmenter().unwrap();
    assert_eq!(augmenter.skip_reason(&sentence), Some(SkipReason::Cached));
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(augmenter.skip_reason(&sentence), None);
}

/// Test that an empty answer counts as a failure
#[tokio::test]
async fn test_augment_withEmptyAnswer_shouldFallBack() {
    let provider = MockProvider::empty();
    let session = load(&provider, &unpunctuated());
    let sentence = session.sentence_at(0).unwrap();

    match session.augment(&sentence).await {
        Some(AugmentOutcome::Fallback { reason, .. }) => assert!(reason.contains("empty")),
        other => panic!("expected fallback, got {:?}", other),
    }
}

/// Test that sentences with punctuation are never sent
#[tokio::test]
async fn test_augment_withPunctuatedSentence_shouldSkipRequest() {
    let provider = MockProvider::working();
    let track: CaptionTrack = serde_json::from_value(common::two_sentence_json()).unwrap();
    let session = load(&provider, &track);
    let sentence = session.sentence_at(1500).unwrap();

    let outcome = session.augment(&sentence).await;

    assert_eq!(outcome, Some(AugmentOutcome::Skipped(SkipReason::AlreadyPunctuated)));
    assert_eq!(provider.request_count(), 0);
}

/// Test punctuation restoration for unspaced Japanese text
#[tokio::test]
async fn test_augment_withJapaneseAnswer_shouldAlignByCharacters() {
    let provider = MockProvider::replying("今日は、いい天気ですね。");
    let track = common::caption_track(&["今日は", "いい", "天気", "です", "ね"], 0, 300);
    let session = load(&provider, &track);
    let sentence = session.sentence_at(0).unwrap();
    let augmenter = session.augmenter().unwrap();

    let outcome = augmenter.augment(&session.timeline(), &sentence).await;

    assert_eq!(outcome, AugmentOutcome::Applied { inserted: 2 });
    assert_eq!(session.sentence_at(0).unwrap().display_text(), "今日は、いい天気ですね。");
}

/// Test that a session leaves Japanese sentences to the pause heuristic
#[tokio::test]
async fn test_augment_withJapaneseSession_shouldLeaveSentenceToGapHeuristic() {
    let provider = MockProvider::working();
    let track = common::caption_track(&["今日は", "いい", "天気", "です", "ね"], 0, 300);
    let session = load(&provider, &track);
    let sentence = session.sentence_at(0).unwrap();

    let outcome = session.augment(&sentence).await;

    assert_eq!(outcome, Some(AugmentOutcome::Skipped(SkipReason::GapHeuristic)));
    assert_eq!(provider.request_count(), 0);
}

/// Test that only one request runs at a time
#[tokio::test]
async fn test_augment_whileRequestRunning_shouldSkipOthers() {
    let provider = MockProvider::slow(200);
    let session = load(&provider, &unpunctuated());
    let sentence = session.sentence_at(0).unwrap();

    let background = {
        let session = Arc::clone(&session);
        let sentence = sentence.clone();
        tokio::spawn(async move { session.augment(&sentence).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut other = sentence.clone();
    other.start_word = 3;
    other.words = other.words.split_off(3);
    other.punctuation = other.punctuation.split_off(3);
    assert_eq!(session.augment(&other).await, Some(AugmentOutcome::Skipped(SkipReason::InFlight)));

    assert_eq!(background.await.unwrap(), Some(AugmentOutcome::Applied { inserted: 1 }));
    assert_eq!(provider.request_count(), 1);
}

/// Test that the live display loop requests punctuation for what it shows
#[tokio::test]
async fn test_controllerLoop_shouldRequestPunctuationForVisibleSentence() {
    let provider = MockProvider::working();
    let session = load(&provider, &unpunctuated());
    let player = Arc::new(SimulatedPlayer::manual(10_000));
    player.play().unwrap();
    player.advance(500);

    let settings = NavigationConfig { poll_interval_ms: 10, ..NavigationConfig::default() };
    let controller = NavigationController::new(player, Arc::clone(&session), settings);
    let (tx, rx) = mpsc::channel(4);
    let running = tokio::spawn(controller.run(rx));

    tokio::time::sleep(Duration::from_millis(200)).await;
    tx.send(ControllerEvent::Shutdown).await.unwrap();
    let controller = running.await.unwrap();

    assert_eq!(provider.request_count(), 1);
    assert_eq!(session.sentence_at(500).unwrap().display_text(), "so i think we should go.");
    assert!(controller.last_update().is_some());
}

/// Test that a whole-session run sends every word exactly once when sentences end at window edges
#[tokio::test]
async fn test_punctuateSession_withLongUnpunctuatedText_shouldSendEachWordOnce() {
    let words: Vec<String> = (0..500).map(|i| format!("w{}", i)).collect();
    let refs: Vec<&str> = words.iter().map(String::as_str).collect();
    let provider = MockProvider::working();
    let session = load(&provider, &common::caption_track(&refs, 0, 100));
    let controller = Controller::with_config(common::test_config()).unwrap();

    let summary = controller.punctuate_session(&session).await.unwrap();

    assert_eq!(summary.requested, 3);
    assert_eq!(summary.applied, 3);
    let received = provider.received();
    let firsts: Vec<Option<&str>> = received.iter().map(|text| text.split_whitespace().next()).collect();
    assert_eq!(firsts, vec![Some("w0"), Some("w201"), Some("w402")]);
    let sent: usize = received.iter().map(|text| text.split_whitespace().count()).sum();
    assert_eq!(sent, 500);
}

/// Test that an unreachable model stops the run before any sentence is sent
#[tokio::test]
async fn test_punctuateSession_withUnreachableModel_shouldFailBeforeRequests() {
    let provider = MockProvider::failing();
    let session = load(&provider, &unpunctuated());
    let controller = Controller::with_config(common::test_config()).unwrap();

    let err = controller.punctuate_session(&session).await.unwrap_err();

    assert!(err.to_string().contains("Cannot reach Mock"));
    assert_eq!(provider.request_count(), 0);
}
