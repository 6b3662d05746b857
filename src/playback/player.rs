/*!
 * Video player seam and an in-memory simulated player.
 */

use std::time::Duration;

use log::debug;
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;

use crate::errors::PlaybackError;

/// Control surface of the video element
pub trait VideoPlayer: Send + Sync {
    /// Current playback position
    fn current_time_ms(&self) -> Result<u64, PlaybackError>;

    /// Jump to `time_ms`
    fn seek(&self, time_ms: u64) -> Result<(), PlaybackError>;

    /// Start or resume playback
    fn play(&self) -> Result<(), PlaybackError>;

    /// Pause playback
    fn pause(&self) -> Result<(), PlaybackError>;

    /// Whether playback is paused
    fn is_paused(&self) -> Result<bool, PlaybackError>;
}

/// Events a player reports to its host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Playback started after being paused
    Play,
}

/// How the simulated clock advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    /// Follow real time while playing
    Wall,
    /// Only move when `advance` is called
    Manual,
}

#[derive(Debug)]
struct PlayerState {
    position_ms: u64,
    playing_since: Option<Instant>,
    available: bool,
}

/// In-memory player used by the CLI and tests
#[derive(Debug)]
pub struct SimulatedPlayer {
    state: Mutex<PlayerState>,
    clock: ClockMode,
    duration_ms: u64,
    events: Option<UnboundedSender<PlayerEvent>>,
}

impl SimulatedPlayer {
    /// Player following wall-clock time, paused at zero
    pub fn new(duration_ms: u64) -> Self {
        Self::with_clock(duration_ms, ClockMode::Wall)
    }

    /// Player whose clock only moves through `advance`
    pub fn manual(duration_ms: u64) -> Self {
        Self::with_clock(duration_ms, ClockMode::Manual)
    }

    fn with_clock(duration_ms: u64, clock: ClockMode) -> Self {
        Self {
            state: Mutex::new(PlayerState {
                position_ms: 0,
                playing_since: None,
                available: true,
            }),
            clock,
            duration_ms,
            events: None,
        }
    }

    /// Report play events on `sender`
    pub fn with_events(mut self, sender: UnboundedSender<PlayerEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Total length of the simulated video
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Move a manual clock forward by `ms` if playing
    pub fn advance(&self, ms: u64) {
        let mut state = self.state.lock();
        if state.playing_since.is_some() {
            state.position_ms = (state.position_ms + ms).min(self.duration_ms);
        }
    }

    /// Simulate the video element being removed or loaded
    pub fn set_available(&self, available: bool) {
        self.state.lock().available = available;
    }

    fn position(&self, state: &PlayerState) -> u64 {
        let elapsed = match (self.clock, state.playing_since) {
            (ClockMode::Wall, Some(since)) => since.elapsed(),
            _ => Duration::ZERO,
        };
        (state.position_ms + elapsed.as_millis() as u64).min(self.duration_ms)
    }

    fn checked(&self) -> Result<parking_lot::MutexGuard<'_, PlayerState>, PlaybackError> {
        let state = self.state.lock();
        if state.available {
            Ok(state)
        } else {
            Err(PlaybackError::VideoUnavailable)
        }
    }
}

impl VideoPlayer for SimulatedPlayer {
    fn current_time_ms(&self) -> Result<u64, PlaybackError> {
        let state = self.checked()?;
        Ok(self.position(&state))
    }

    fn seek(&self, time_ms: u64) -> Result<(), PlaybackError> {
        let mut state = self.checked()?;
        state.position_ms = time_ms.min(self.duration_ms);
        if state.playing_since.is_some() {
            state.playing_since = Some(Instant::now());
        }
        debug!("Seeked to {}ms", state.position_ms);
        Ok(())
    }

    fn play(&self) -> Result<(), PlaybackError> {
        let mut state = self.checked()?;
        if state.playing_since.is_some() {
            return Ok(());
        }
        state.playing_since = Some(Instant::now());
        drop(state);

        if let Some(events) = &self.events {
            let _ = events.send(PlayerEvent::Play);
        }
        Ok(())
    }

    fn pause(&self) -> Result<(), PlaybackError> {
        let mut state = self.checked()?;
        let position = self.position(&state);
        state.position_ms = position;
        state.playing_since = None;
        Ok(())
    }

    fn is_paused(&self) -> Result<bool, PlaybackError> {
        Ok(self.checked()?.playing_since.is_none())
    }
}
