/*!
 * Navigation controller driving a simulated player
 */

use std::sync::Arc;

use tokio::sync::mpsc;

use lingocap::app_config::{DisplayConfig, NavigationConfig};
use lingocap::captions::CaptionTrack;
use lingocap::playback::{
    ControllerEvent, FocusTarget, KeyEvent, NavigationCommand, NavigationController, NavigationMode, OverlayRenderer,
    PlayerEvent, SimulatedPlayer, TextRenderer, VideoPlayer,
};
use lingocap::session::{CaptionSession, SessionSettings};
use crate::common::{self, SharedBuffer};

fn session() -> Arc<CaptionSession> {
    let track: CaptionTrack = serde_json::from_value(common::two_sentence_json()).unwrap();
    Arc::new(CaptionSession::new("vid", "en", &track, &SessionSettings::default()).unwrap())
}

fn playing_at(position_ms: u64) -> Arc<SimulatedPlayer> {
    let player = Arc::new(SimulatedPlayer::manual(10_000));
    player.play().unwrap();
    player.advance(position_ms);
    player
}

/// Test what a terminal renderer prints for live and replayed sentences
#[test]
fn test_textRenderer_shouldPrintLiveAndReplayLines() {
    let player = playing_at(1500);
    let buffer = SharedBuffer::default();
    let mut controller = NavigationController::new(player.clone(), session(), NavigationConfig::default());
    controller.subscribe(Box::new(TextRenderer::new(buffer.clone())));

    controller.tick();
    controller.tick();
    controller.handle_command(NavigationCommand::Next);

    assert_eq!(buffer.contents(), "[00:01.000] Hello world.\n[00:03.000] (replay) How are you?\n");
}

/// Test that every subscriber receives the same update
#[test]
fn test_overlayRenderer_withBionicReading_shouldEmphasizeWords() {
    let player = playing_at(1500);
    let overlay = SharedBuffer::default();
    let text = SharedBuffer::default();
    let display = DisplayConfig { bionic_reading: true, ..DisplayConfig::default() };
    let mut controller = NavigationController::new(player, session(), NavigationConfig::default());
    controller.subscribe(Box::new(OverlayRenderer::new(display, overlay.clone())));
    controller.subscribe(Box::new(TextRenderer::new(text.clone())));

    controller.tick();

    assert!(overlay.contents().contains("<b>Hel</b>lo <b>wor</b>ld.</div>"));
    assert!(text.contents().contains("Hello world."));
}

/// Test that the replay pauses once playback passes the sentence end
#[test]
fn test_replay_withAutoPause_shouldStopAtSentenceEnd() {
    let player = playing_at(4200);
    let mut controller = NavigationController::new(player.clone(), session(), NavigationConfig::default());

    let target = controller.handle_command(NavigationCommand::Previous).unwrap();
    assert_eq!(target.key(), (0, 1));
    assert_eq!(player.current_time_ms().unwrap(), 1000);

    player.advance(1999);
    controller.tick();
    assert!(!player.is_paused().unwrap());

    player.advance(1);
    controller.tick();
    assert!(player.is_paused().unwrap());
    assert_eq!(player.current_time_ms().unwrap(), 3000);
    assert_eq!(controller.current_sentence().map(|s| s.key()), Some((0, 1)));
}

/// Test that replay keeps playing when auto-pause is off
#[test]
fn test_replay_withoutAutoPause_shouldKeepPlaying() {
    let player = playing_at(1500);
    let settings = NavigationConfig { auto_pause: false, ..NavigationConfig::default() };
    let mut controller = NavigationController::new(player.clone(), session(), settings);

    controller.handle_command(NavigationCommand::Current);
    player.advance(5000);
    controller.tick();

    assert!(!player.is_paused().unwrap());
}

/// Test that only a play the controller did not trigger returns to live mode
#[test]
fn test_playEvents_shouldDistinguishUserFromReplay() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let player = Arc::new(SimulatedPlayer::manual(10_000).with_events(tx));
    player.play().unwrap();
    assert_eq!(rx.try_recv(), Ok(PlayerEvent::Play));
    player.advance(1500);

    let mut controller = NavigationController::new(player.clone(), session(), NavigationConfig::default());
    controller.handle_command(NavigationCommand::Next);
    assert_eq!(rx.try_recv(), Ok(PlayerEvent::Play));
    controller.on_play_event();
    assert!(matches!(controller.mode(), NavigationMode::Replay(_)));

    player.advance(3000);
    controller.tick();
    assert!(player.is_paused().unwrap());

    // The user resumes playback
    player.play().unwrap();
    assert_eq!(rx.try_recv(), Ok(PlayerEvent::Play));
    controller.on_play_event();
    assert_eq!(controller.mode(), &NavigationMode::Live);
}

/// Test the event loop end to end
#[tokio::test]
async fn test_run_shouldIgnoreKeysTypedIntoTextFields() {
    let player = playing_at(1500);
    let controller = NavigationController::new(player.clone(), session(), NavigationConfig::default());
    let (tx, rx) = mpsc::channel(8);

    tx.send(ControllerEvent::Key(KeyEvent::from_char('d').with_focus(FocusTarget::Input))).await.unwrap();
    tx.send(ControllerEvent::Shutdown).await.unwrap();
    let controller = controller.run(rx).await;
    assert_eq!(controller.mode(), &NavigationMode::Live);

    let (tx, rx) = mpsc::channel(8);
    tx.send(ControllerEvent::Key(KeyEvent::from_char('a'))).await.unwrap();
    tx.send(ControllerEvent::Command(NavigationCommand::Next)).await.unwrap();
    drop(tx);
    let controller = controller.run(rx).await;

    match controller.mode() {
        NavigationMode::Replay(replay) => assert_eq!(replay.sentence.key(), (2, 4)),
        other => panic!("expected replay, got {:?}", other),
    }
    assert_eq!(player.current_time_ms().unwrap(), 3000);
}
