/*!
 * Display and navigation controller.
 *
 * Two modes exist. In live mode the overlay follows the playback position on
 * a fixed poll interval. A previous/current/next command switches to replay
 * mode: the video is paused, moved to the sentence start and played again,
 * and with auto-pause enabled it is paused once the position reaches the
 * sentence end. A play event that the controller did not cause returns to
 * live mode.
 */

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::app_config::NavigationConfig;
use crate::augment::AugmentOutcome;
use crate::errors::PlaybackError;
use crate::segmentation::Sentence;
use crate::session::CaptionSession;

use super::keyboard::{command_for_key, KeyEvent};
use super::player::VideoPlayer;
use super::render::{DisplayMode, Renderer, SubtitleSource, SubtitleUpdate};

/// Sentence navigation command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationCommand {
    /// Replay the sentence before the current one
    Previous,
    /// Replay the current sentence
    Current,
    /// Replay the sentence after the current one
    Next,
}

/// Input to the controller loop
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// A key press, mapped through `command_for_key`
    Key(KeyEvent),
    /// A navigation command
    Command(NavigationCommand),
    /// The video started playing
    Play,
    /// Stop the loop
    Shutdown,
}

/// Sentence being replayed
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayState {
    /// Replayed sentence
    pub sentence: Sentence,
    /// Whether auto-pause already stopped playback at the sentence end
    pub paused_at_end: bool,
}

/// Controller mode
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationMode {
    /// Overlay follows playback
    Live,
    /// One sentence is replayed
    Replay(ReplayState),
}

/// Drives the overlay and sentence replay for one caption session
pub struct NavigationController {
    player: Arc<dyn VideoPlayer>,
    session: Arc<CaptionSession>,
    settings: NavigationConfig,
    source: SubtitleSource,
    mode: NavigationMode,
    // Set right before the controller itself calls play
    programmatic_play: bool,
    suppress_until: Option<Instant>,
    current: Option<Sentence>,
}

impl NavigationController {
    /// Create a controller in live mode
    pub fn new(player: Arc<dyn VideoPlayer>, session: Arc<CaptionSession>, settings: NavigationConfig) -> Self {
        Self {
            player,
            session,
            settings,
            source: SubtitleSource::new(),
            mode: NavigationMode::Live,
            programmatic_play: false,
            suppress_until: None,
            current: None,
        }
    }

    /// Add a renderer for subtitle updates
    pub fn subscribe(&mut self, renderer: Box<dyn Renderer>) {
        self.source.subscribe(renderer);
    }

    /// Current mode
    pub fn mode(&self) -> &NavigationMode {
        &self.mode
    }

    /// Sentence shown by the last tick or command
    pub fn current_sentence(&self) -> Option<&Sentence> {
        self.current.as_ref()
    }

    /// Last update published to renderers
    pub fn last_update(&self) -> Option<&SubtitleUpdate> {
        self.source.last()
    }

    /// Switch to another video's session and return to live mode
    pub fn set_session(&mut self, session: Arc<CaptionSession>) {
        info!("Navigation switched to video {}", session.video_id());
        self.session = session;
        self.mode = NavigationMode::Live;
        self.programmatic_play = false;
        self.suppress_until = None;
        self.current = None;
    }

    /// Poll the player once and publish the visible sentence if it changed.
    ///
    /// Also enforces auto-pause at the end of a replayed sentence.
    pub fn tick(&mut self) -> Option<SubtitleUpdate> {
        let now_ms = match self.player.current_time_ms() {
            Ok(time) => time,
            Err(e) => {
                warn!("Skipping display update: {}", e);
                return None;
            }
        };

        self.enforce_auto_pause(now_ms);

        if let Some(until) = self.suppress_until {
            if Instant::now() < until {
                return None;
            }
            self.suppress_until = None;
        }

        let (sentence, mode) = match &self.mode {
            NavigationMode::Replay(replay) => (
                self.session.sentence_from(replay.sentence.start_word),
                DisplayMode::Replay,
            ),
            NavigationMode::Live => (self.session.sentence_at(now_ms), DisplayMode::Live),
        };
        let Some(sentence) = sentence else {
            debug!("No sentence at {}ms, keeping previous overlay", now_ms);
            return None;
        };

        let update = SubtitleUpdate::from_sentence(&sentence, mode);
        self.current = Some(sentence);
        self.source.emit(update.clone()).then_some(update)
    }

    /// Replay the previous, current or next sentence.
    ///
    /// Returns the sentence now being replayed, or `None` when there is
    /// nothing to navigate to or the video is unavailable.
    pub fn handle_command(&mut self, command: NavigationCommand) -> Option<Sentence> {
        let reference = match self.reference_sentence() {
            Ok(Some(sentence)) => sentence,
            Ok(None) => {
                debug!("No sentence to navigate from");
                return None;
            }
            Err(e) => {
                warn!("Ignoring {:?}: {}", command, e);
                return None;
            }
        };

        let target = match command {
            NavigationCommand::Previous => self.session.previous_sentence(&reference).unwrap_or(reference),
            NavigationCommand::Current => reference,
            NavigationCommand::Next => match self.session.next_sentence(&reference) {
                Some(next) => next,
                None => {
                    debug!("Already at the last sentence");
                    return None;
                }
            },
        };

        if let Err(e) = self.start_replay(&target) {
            warn!("Ignoring {:?}: {}", command, e);
            self.programmatic_play = false;
            return None;
        }

        if command == NavigationCommand::Current {
            self.suppress_until = Some(Instant::now() + Duration::from_millis(self.settings.replay_suppress_ms));
        }

        info!("Replaying words {}..={} ({}ms - {}ms)",
            target.start_word, target.end_word, target.start_time_ms, target.end_time_ms);
        self.mode = NavigationMode::Replay(ReplayState { sentence: target.clone(), paused_at_end: false });
        self.source.emit(SubtitleUpdate::from_sentence(&target, DisplayMode::Replay));
        self.current = Some(target.clone());
        Some(target)
    }

    /// React to the video starting playback
    pub fn on_play_event(&mut self) {
        if self.programmatic_play {
            self.programmatic_play = false;
            debug!("Play event caused by replay");
            return;
        }
        if matches!(self.mode, NavigationMode::Replay(_)) {
            info!("Playback resumed by user, following live captions");
            self.mode = NavigationMode::Live;
            self.suppress_until = None;
        }
    }

    /// Run the poll loop until `Shutdown` arrives or the channel closes
    pub async fn run(mut self, mut events: mpsc::Receiver<ControllerEvent>) -> Self {
        let mut interval = tokio::time::interval(Duration::from_millis(self.settings.poll_interval_ms.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Following captions of video {}", self.session.video_id());

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick();
                    self.request_punctuation();
                }
                event = events.recv() => match event {
                    Some(ControllerEvent::Key(key)) => {
                        if let Some(command) = command_for_key(&key) {
                            self.handle_command(command);
                        }
                    }
                    Some(ControllerEvent::Command(command)) => {
                        self.handle_command(command);
                    }
                    Some(ControllerEvent::Play) => self.on_play_event(),
                    Some(ControllerEvent::Shutdown) | None => break,
                },
            }
        }

        debug!("Navigation loop stopped");
        self
    }

    fn reference_sentence(&self) -> Result<Option<Sentence>, PlaybackError> {
        if let NavigationMode::Replay(replay) = &self.mode {
            return Ok(self.session.sentence_from(replay.sentence.start_word));
        }
        let now_ms = self.player.current_time_ms()?;
        Ok(self.session.sentence_at(now_ms))
    }

    fn start_replay(&mut self, target: &Sentence) -> Result<(), PlaybackError> {
        self.player.pause()?;
        self.player.seek(target.start_time_ms)?;
        self.programmatic_play = true;
        self.player.play()
    }

    fn enforce_auto_pause(&mut self, now_ms: u64) {
        if !self.settings.auto_pause {
            return;
        }
        let NavigationMode::Replay(replay) = &mut self.mode else {
            return;
        };
        if replay.paused_at_end || now_ms < replay.sentence.end_time_ms {
            return;
        }

        match self.player.pause() {
            Ok(()) => {
                replay.paused_at_end = true;
                debug!("Paused at {}ms, end of replayed sentence", now_ms);
            }
            Err(e) => warn!("Cannot pause at sentence end: {}", e),
        }
    }

    fn request_punctuation(&self) {
        let (Some(sentence), Some(augmenter)) = (&self.current, self.session.augmenter()) else {
            return;
        };
        if augmenter.skip_reason(sentence).is_some() {
            return;
        }

        let session = Arc::clone(&self.session);
        let sentence = sentence.clone();
        tokio::spawn(async move {
            if let Some(AugmentOutcome::Fallback { reason, .. }) = session.augment(&sentence).await {
                debug!("Showing unpunctuated sentence {:?}: {}", sentence.key(), reason);
            }
        });
    }
}
