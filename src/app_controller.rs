use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::app_config::Config;
use crate::augment::AugmentOutcome;
use crate::captions::{CaptionFetcher, HttpCaptionFetcher};
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::playback::{
    ControllerEvent, KeyEvent, NavigationController, OverlayRenderer, PlayerEvent, SimulatedPlayer, TextRenderer,
    VideoPlayer,
};
use crate::segmentation::Sentence;
use crate::session::{CaptionSession, SessionManager, SessionSettings};

// @module: Application controller for the caption workflows

/// Sentences found in one caption file
#[derive(Debug, Clone, Serialize)]
pub struct SegmentedFile {
    /// Caption file
    pub path: PathBuf,
    /// Video id derived from the file name
    pub video_id: String,
    /// Sentences in order
    pub sentences: Vec<Sentence>,
}

/// Tally of a punctuation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PunctuationSummary {
    /// Sentences sent to the model
    pub requested: usize,
    /// Responses spliced into the timeline
    pub applied: usize,
    /// Punctuation marks written
    pub inserted: usize,
    /// Requests that fell back to the unpunctuated text
    pub failed: usize,
}

#[derive(Serialize)]
struct PunctuatedCaptions<'a> {
    video_id: &'a str,
    model: &'a str,
    summary: &'a PunctuationSummary,
    sentences: Vec<Sentence>,
}

/// Default directory for fetched caption files
pub fn default_caption_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lingocap")
        .join("captions")
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    pub config: Config,
}

impl Controller {
    /// Create a controller with the default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    /// Load a caption file into `manager`, replacing whatever session it held
    pub fn open_session(&self, manager: &mut SessionManager, path: &Path) -> Result<Arc<CaptionSession>> {
        let track = FileManager::read_caption_track(path)?;
        let video_id = FileManager::video_id_from_path(path);

        // Two files may share a video id (one per language)
        manager.discard();
        manager
            .load(&video_id, &self.config.language, &track)
            .with_context(|| format!("Failed to load captions from {:?}", path))
    }

    /// Segment a caption file or every caption file below a directory.
    ///
    /// With `at_ms` only the sentence playing at that time is returned.
    pub fn segment_path(&self, input: &Path, at_ms: Option<u64>) -> Result<Vec<SegmentedFile>> {
        let paths = FileManager::caption_inputs(input)?;
        let single = paths.len() == 1;
        let mut manager = SessionManager::new(SessionSettings::from_config(&self.config));
        let mut results = Vec::with_capacity(paths.len());

        for path in paths {
            let session = match self.open_session(&mut manager, &path) {
                Ok(session) => session,
                Err(e) if single => return Err(e),
                Err(e) => {
                    warn!("Skipping {:?}: {:#}", path, e);
                    continue;
                }
            };

            let sentences = match at_ms {
                Some(time_ms) => session.sentence_at(time_ms).into_iter().collect(),
                None => session.sentences(),
            };
            debug!("{:?}: {} words, {} sentences", path, session.word_count(), sentences.len());

            results.push(SegmentedFile {
                path,
                video_id: session.video_id().to_string(),
                sentences,
            });
        }

        Ok(results)
    }

    /// Restore punctuation for every unpunctuated sentence of a caption file.
    ///
    /// The result is written as JSON to `output`, or next to the input.
    pub async fn punctuate_file(&self, input: &Path, output: Option<PathBuf>) -> Result<(PathBuf, PunctuationSummary)> {
        if !self.config.punctuation.enabled {
            return Err(anyhow!("Punctuation restoration is disabled in the configuration"));
        }

        let mut manager = SessionManager::from_config(&self.config);
        let session = self.open_session(&mut manager, input)?;
        let summary = self.punctuate_session(&session).await?;
        let model = session.augmenter().map_or("none", |a| a.model_name());

        let output = output.unwrap_or_else(|| {
            let dir = input.parent().unwrap_or(Path::new("."));
            FileManager::generate_output_path(input, dir, "punctuated", "json")
        });
        FileManager::write_json(&output, &PunctuatedCaptions {
            video_id: session.video_id(),
            model,
            summary: &summary,
            sentences: session.sentences(),
        })?;

        info!("Punctuated {} of {} sentences ({} marks), saved to {:?}",
            summary.applied, summary.requested, summary.inserted, output);
        Ok((output, summary))
    }

    /// Request punctuation for every unpunctuated sentence of `session`, in order.
    ///
    /// The model connection is checked once before the first request so an unreachable
    /// endpoint fails fast instead of once per sentence.
    pub async fn punctuate_session(&self, session: &CaptionSession) -> Result<PunctuationSummary> {
        let augmenter = session
            .augmenter()
            .cloned()
            .ok_or_else(|| anyhow!("No punctuation model configured"))?;
        augmenter
            .check_connection()
            .await
            .with_context(|| format!("Cannot reach {}", augmenter.model_name()))?;
        info!("Restoring punctuation of {} with {}", session.video_id(), augmenter.model_name());

        let total = session.word_count();
        let progress = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} words ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress.set_style(style.progress_chars("█▓▒░"));
        progress.set_message("Punctuating");

        let mut summary = PunctuationSummary::default();
        let mut idx = 0;
        while idx < total {
            let Some(sentence) = session.sentence_from(idx) else {
                break;
            };

            if sentence.lacks_punctuation() {
                let wait = augmenter.cooldown_remaining();
                if !wait.is_zero() {
                    debug!("Waiting {}ms for the cool-down", wait.as_millis());
                    tokio::time::sleep(wait).await;
                }

                match session.augment(&sentence).await {
                    Some(AugmentOutcome::Applied { inserted }) => {
                        summary.requested += 1;
                        summary.applied += 1;
                        summary.inserted += inserted;
                    }
                    Some(AugmentOutcome::Fallback { reason, .. }) => {
                        summary.requested += 1;
                        summary.failed += 1;
                        progress.suspend(|| warn!("Words {}..={} left unpunctuated: {}", sentence.start_word, sentence.end_word, reason));
                    }
                    Some(AugmentOutcome::Skipped(reason)) => debug!("Skipped words {}..={}: {:?}", sentence.start_word, sentence.end_word, reason),
                    None => {}
                }
            }

            // New boundaries may have split the sentence; continue after its first part
            let end_word = session.sentence_from(idx).map_or(sentence.end_word, |s| s.end_word);
            idx = end_word + 1;
            progress.set_position(idx.min(total) as u64);
        }
        progress.finish_and_clear();
        Ok(summary)
    }

    /// Download a caption track through the configured URL template
    pub async fn fetch_captions(&self, video_id: &str, language: Option<&str>, output_dir: Option<PathBuf>) -> Result<PathBuf> {
        let language = language_utils::normalize_to_part1_or_part2t(language.unwrap_or(self.config.language.as_str()))?;
        let fetcher = HttpCaptionFetcher::new(&self.config.captions.url_template, self.config.captions.timeout_secs)?;
        self.fetch_with(&fetcher, video_id, &language, output_dir).await
    }

    /// Download a caption track with `fetcher` and store it as `<dir>/<video_id>.<lang>.json`
    pub async fn fetch_with(
        &self,
        fetcher: &dyn CaptionFetcher,
        video_id: &str,
        language: &str,
        output_dir: Option<PathBuf>,
    ) -> Result<PathBuf> {
        let track = fetcher
            .fetch(video_id, language)
            .await
            .with_context(|| format!("Failed to fetch captions for {}", video_id))?;
        if track.segment_count() == 0 {
            warn!("Caption track for {} has no text segments", video_id);
        }

        let dir = output_dir.unwrap_or_else(default_caption_dir);
        FileManager::ensure_dir(&dir)?;
        let path = dir.join(format!("{}.{}.json", video_id, language));
        FileManager::write_json(&path, &track)?;

        info!("Saved {} caption segments to {:?}", track.segment_count(), path);
        Ok(path)
    }

    /// Play a caption file against a simulated player, reading navigation keys from stdin
    pub async fn replay(&self, input: &Path, from_ms: u64, overlay: bool) -> Result<()> {
        let mut manager = SessionManager::from_config(&self.config);
        let session = self.open_session(&mut manager, input)?;
        let duration_ms = session.timeline().read().words().map(|w| w.end_time_ms).max().unwrap_or(0);

        let (player_tx, mut player_rx) = mpsc::unbounded_channel();
        let player = Arc::new(SimulatedPlayer::new(duration_ms).with_events(player_tx));
        player.seek(from_ms)?;
        player.play()?;

        let mut controller = NavigationController::new(player.clone(), session, self.config.navigation.clone());
        if overlay {
            controller.subscribe(Box::new(OverlayRenderer::new(self.config.display.clone(), std::io::stdout())));
        } else {
            controller.subscribe(Box::new(TextRenderer::new(std::io::stdout())));
        }

        let (events_tx, events_rx) = mpsc::channel(32);
        let play_events = events_tx.clone();
        tokio::spawn(async move {
            while let Some(PlayerEvent::Play) = player_rx.recv().await {
                if play_events.send(ControllerEvent::Play).await.is_err() {
                    break;
                }
            }
        });
        tokio::spawn(read_commands(Arc::clone(&player), events_tx));

        println!("Commands: a = previous, s = current, d = next, p = play/pause, q = quit (then Enter)");
        controller.run(events_rx).await;
        info!("Replay finished");
        Ok(())
    }
}

// Forward stdin commands to the navigation loop until `q` or end of input
async fn read_commands(player: Arc<SimulatedPlayer>, events: mpsc::Sender<ControllerEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read command: {}", e);
                break;
            }
        };

        let event = match line.trim().chars().next() {
            Some('q') => break,
            Some('p') => {
                toggle_playback(player.as_ref());
                continue;
            }
            Some(c @ ('a' | 's' | 'd')) => ControllerEvent::Key(KeyEvent::from_char(c)),
            Some(other) => {
                warn!("Unknown command '{}'", other);
                continue;
            }
            None => continue,
        };
        if events.send(event).await.is_err() {
            return;
        }
    }
    let _ = events.send(ControllerEvent::Shutdown).await;
}

fn toggle_playback(player: &dyn VideoPlayer) {
    let result = match player.is_paused() {
        Ok(true) => player.play(),
        Ok(false) => player.pause(),
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        warn!("Cannot toggle playback: {}", e);
    }
}
