/*!
 * Per-video caption session.
 *
 * A session owns everything derived from one video's captions: the shared
 * timeline, the segmenter, gap heuristic bookkeeping and the punctuation
 * augmenter with its cache. It is created when a video's captions load and
 * dropped when another video is opened.
 */

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Local};
use log::debug;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use uuid::Uuid;

use crate::app_config::Config;
use crate::augment::{AugmentOutcome, PunctuationAugmenter, SkipReason};
use crate::captions::{CaptionTrack, PunctuationSet, Timeline, WordRebuilder};
use crate::errors::CaptionError;
use crate::segmentation::{GapHeuristic, GapHeuristicConfig, Sentence, SentenceSegmenter, DEFAULT_WINDOW_WORDS};

/// Segmentation settings applied to every new session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Active boundary punctuation
    pub punctuation: PunctuationSet,
    /// Words searched on each side of the current word
    pub window_words: usize,
    /// Gap heuristic tuning
    pub gap: GapHeuristicConfig,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            punctuation: PunctuationSet::default(),
            window_words: DEFAULT_WINDOW_WORDS,
            gap: GapHeuristicConfig::default(),
        }
    }
}

impl SessionSettings {
    /// Settings from the application configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            punctuation: config.punctuation_set(),
            window_words: config.segmentation.window_words,
            gap: config.segmentation.gap.clone(),
        }
    }
}

/// High-level session information for display and tracking
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    /// Session ID
    pub id: String,
    /// Video the captions belong to
    pub video_id: String,
    /// Caption language
    pub language: String,
    /// Number of rebuilt words
    pub word_count: usize,
    /// Whether the captions are Japanese text
    pub japanese: bool,
    /// Creation time
    pub created_at: String,
}

/// Caption state for one loaded video
#[derive(Debug)]
pub struct CaptionSession {
    id: String,
    video_id: String,
    language: String,
    created_at: DateTime<Local>,
    timeline: Arc<RwLock<Timeline>>,
    segmenter: SentenceSegmenter,
    heuristic: GapHeuristic,
    chunk_words: usize,
    // Chunks of `chunk_words` words already scanned by the gap heuristic
    processed_chunks: Mutex<HashSet<usize>>,
    augmenter: Option<Arc<PunctuationAugmenter>>,
}

impl CaptionSession {
    /// Rebuild `track` into a new session
    pub fn new(
        video_id: impl Into<String>,
        language: impl Into<String>,
        track: &CaptionTrack,
        settings: &SessionSettings,
    ) -> Result<Self, CaptionError> {
        let video_id = video_id.into();
        let timeline = WordRebuilder::new(settings.punctuation).rebuild(track);
        if timeline.is_empty() {
            return Err(CaptionError::EmptyTrack(video_id));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            video_id,
            language: language.into(),
            created_at: Local::now(),
            timeline: Arc::new(RwLock::new(timeline)),
            segmenter: SentenceSegmenter::new(settings.punctuation, settings.window_words),
            heuristic: GapHeuristic::new(settings.gap.clone(), settings.punctuation),
            chunk_words: settings.window_words.max(1),
            processed_chunks: Mutex::new(HashSet::new()),
            augmenter: None,
        })
    }

    /// Attach a punctuation augmenter
    pub fn with_augmenter(mut self, augmenter: Arc<PunctuationAugmenter>) -> Self {
        self.augmenter = Some(augmenter);
        self
    }

    /// Session ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Video the captions belong to
    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Caption language
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Shared timeline
    pub fn timeline(&self) -> Arc<RwLock<Timeline>> {
        Arc::clone(&self.timeline)
    }

    /// Punctuation augmenter, when punctuation restoration is enabled
    pub fn augmenter(&self) -> Option<&Arc<PunctuationAugmenter>> {
        self.augmenter.as_ref()
    }

    /// Number of rebuilt words
    pub fn word_count(&self) -> usize {
        self.timeline.read().word_count()
    }

    /// Summary for display
    pub fn info(&self) -> SessionInfo {
        let timeline = self.timeline.read();
        let last = timeline.word_count().saturating_sub(1);
        SessionInfo {
            id: self.id.clone(),
            video_id: self.video_id.clone(),
            language: self.language.clone(),
            word_count: timeline.word_count(),
            japanese: timeline.is_japanese_range(0, last),
            created_at: self.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Sentence playing at `time_ms`
    pub fn sentence_at(&self, time_ms: u64) -> Option<Sentence> {
        let anchor = self.timeline.read().word_index_at(time_ms)?;
        self.sentence_containing(anchor)
    }

    /// Sentence containing `word_index`
    pub fn sentence_containing(&self, word_index: usize) -> Option<Sentence> {
        self.prepare_window(word_index);
        self.segmenter.sentence_containing(&self.timeline.read(), word_index)
    }

    /// Sentence containing `word_index`, starting no earlier than it
    pub fn sentence_from(&self, word_index: usize) -> Option<Sentence> {
        self.prepare_window(word_index);
        self.segmenter.sentence_from(&self.timeline.read(), word_index)
    }

    /// Sentence before `sentence`
    pub fn previous_sentence(&self, sentence: &Sentence) -> Option<Sentence> {
        let idx = sentence.start_word.checked_sub(1)?;
        self.prepare_window(idx);
        self.segmenter.previous(&self.timeline.read(), sentence)
    }

    /// Sentence after `sentence`
    pub fn next_sentence(&self, sentence: &Sentence) -> Option<Sentence> {
        self.prepare_window(sentence.end_word + 1);
        self.segmenter.next(&self.timeline.read(), sentence)
    }

    /// Every sentence in order
    pub fn sentences(&self) -> Vec<Sentence> {
        let count = self.word_count();
        let mut idx = 0;
        while idx < count {
            self.prepare_window(idx);
            idx += self.chunk_words;
        }
        self.segmenter.all(&self.timeline.read())
    }

    /// Request punctuation for `sentence` if an augmenter is attached.
    ///
    /// Japanese sentences whose chunks the gap heuristic has scanned are left
    /// to the heuristic.
    pub async fn augment(&self, sentence: &Sentence) -> Option<AugmentOutcome> {
        let augmenter = self.augmenter.as_ref()?;
        if self.handled_by_heuristic(sentence) {
            debug!("Session {}: words {}..={} segmented by pauses", &self.id[..8], sentence.start_word, sentence.end_word);
            return Some(AugmentOutcome::Skipped(SkipReason::GapHeuristic));
        }
        Some(augmenter.augment(&self.timeline, sentence).await)
    }

    fn handled_by_heuristic(&self, sentence: &Sentence) -> bool {
        if !sentence.is_japanese() {
            return false;
        }
        let processed = self.processed_chunks.lock();
        (sentence.start_word / self.chunk_words..=sentence.end_word / self.chunk_words)
            .all(|chunk| processed.contains(&chunk))
    }

    /// Run the gap heuristic over every unprocessed Japanese chunk in the window around `word_index`
    fn prepare_window(&self, word_index: usize) {
        let (from, to) = self.segmenter.window_around(&self.timeline.read(), word_index);
        let first_chunk = from / self.chunk_words;
        let last_chunk = to / self.chunk_words;

        for chunk in first_chunk..=last_chunk {
            if !self.processed_chunks.lock().insert(chunk) {
                continue;
            }

            let mut timeline = self.timeline.write();
            let start = chunk * self.chunk_words;
            // Chunks share their edge word so the gap between them is scanned too.
            let end = ((chunk + 1) * self.chunk_words).min(timeline.word_count().saturating_sub(1));
            if start > end || !timeline.is_japanese_range(start, end) {
                continue;
            }

            let inserted = self.heuristic.apply(&mut timeline, start, end);
            debug!("Session {}: gap heuristic chunk {} inserted {} boundaries", &self.id[..8], chunk, inserted.len());
        }
    }
}
