/*!
 * Punctuation augmenter.
 *
 * Sends an unpunctuated sentence to a chat model and splices the returned
 * punctuation back into the shared timeline. At most one request runs at a
 * time, requests are spaced by a cool-down, and a span is never requested
 * twice unless an earlier attempt failed and its cache entry expired.
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;

use crate::app_config::PunctuationConfig;
use crate::captions::Timeline;
use crate::errors::{AugmentError, ProviderError};
use crate::providers::ChatModel;
use crate::segmentation::Sentence;

use super::cache::{PunctuationCache, SpanKey};
use super::prompts::PunctuationPrompt;
use super::splice;

/// Request settings for the augmenter
#[derive(Debug, Clone)]
pub struct AugmenterSettings {
    /// Instruction prompt
    pub prompt: PunctuationPrompt,
    /// Caption language name substituted into the prompt
    pub language: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Minimum spacing between two requests
    pub cooldown: Duration,
    /// Delay before a failed span may be requested again
    pub retry_after: Duration,
}

impl Default for AugmenterSettings {
    fn default() -> Self {
        Self {
            prompt: PunctuationPrompt::default(),
            language: "English".to_string(),
            temperature: 0.0,
            cooldown: Duration::from_millis(5000),
            retry_after: Duration::from_millis(10_000),
        }
    }
}

impl AugmenterSettings {
    /// Settings from the punctuation configuration
    pub fn from_config(config: &PunctuationConfig, language: impl Into<String>) -> Self {
        Self {
            prompt: PunctuationPrompt::from_override(config.common.prompt.as_deref()),
            language: language.into(),
            temperature: config.common.temperature,
            cooldown: Duration::from_millis(config.common.cooldown_ms),
            retry_after: Duration::from_millis(config.common.retry_after_ms),
        }
    }
}

/// Why a sentence was not sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The sentence has no words
    Empty,
    /// A slot inside the sentence already carries punctuation
    AlreadyPunctuated,
    /// The span was already requested
    Cached,
    /// Another request is running
    InFlight,
    /// The previous request was too recent
    CoolingDown,
    /// Japanese text left to the pause-based gap heuristic
    GapHeuristic,
}

/// Result of one augmentation attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AugmentOutcome {
    /// Punctuation was written into `inserted` slots
    Applied {
        /// Number of slots written
        inserted: usize,
    },
    /// No request was made
    Skipped(SkipReason),
    /// The request failed; `text` is the unpunctuated sentence to show instead
    Fallback {
        /// Plain sentence text
        text: String,
        /// What went wrong
        reason: String,
    },
}

// Clears the in-flight flag however the request ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Restores punctuation through a chat model
#[derive(Debug)]
pub struct PunctuationAugmenter {
    model: Arc<dyn ChatModel>,
    settings: AugmenterSettings,
    cache: PunctuationCache,
    in_flight: AtomicBool,
    last_request: Mutex<Option<Instant>>,
}

impl PunctuationAugmenter {
    /// Create an augmenter with its own empty cache
    pub fn new(model: Arc<dyn ChatModel>, settings: AugmenterSettings) -> Self {
        Self::with_cache(model, settings, PunctuationCache::new())
    }

    /// Create an augmenter that records spans in `cache`
    pub fn with_cache(model: Arc<dyn ChatModel>, settings: AugmenterSettings, cache: PunctuationCache) -> Self {
        Self {
            model,
            settings,
            cache,
            in_flight: AtomicBool::new(false),
            last_request: Mutex::new(None),
        }
    }

    /// Span cache
    pub fn cache(&self) -> &PunctuationCache {
        &self.cache
    }

    /// Settings in use
    pub fn settings(&self) -> &AugmenterSettings {
        &self.settings
    }

    /// Name of the underlying model provider
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Check that the model endpoint answers
    pub async fn check_connection(&self) -> Result<(), ProviderError> {
        self.model.check_connection().await
    }

    /// Whether a request is currently running
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Time left until the next request is allowed
    pub fn cooldown_remaining(&self) -> Duration {
        match *self.last_request.lock() {
            Some(last) => self.settings.cooldown.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Request punctuation for `sentence` and splice it into `timeline`
    pub async fn augment(&self, timeline: &Arc<RwLock<Timeline>>, sentence: &Sentence) -> AugmentOutcome {
        if let Some(reason) = self.skip_reason(sentence) {
            debug!("Skipping sentence {:?}: {:?}", sentence.key(), reason);
            return AugmentOutcome::Skipped(reason);
        }

        // Claim the flag first so concurrent callers cannot both pass the checks.
        if self.in_flight.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            return AugmentOutcome::Skipped(SkipReason::InFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let key = sentence.key();
        if !self.cache.try_insert(key) {
            return AugmentOutcome::Skipped(SkipReason::Cached);
        }
        *self.last_request.lock() = Some(Instant::now());

        let text = sentence.plain_text();
        info!("Requesting punctuation from {} for words {}..={}", self.model.name(), key.0, key.1);

        match self.request_and_splice(timeline, sentence, &text).await {
            Ok(inserted) => {
                debug!("Inserted {} punctuation marks into sentence {:?}", inserted, key);
                AugmentOutcome::Applied { inserted }
            }
            Err(e) => {
                match &e {
                    AugmentError::Provider(_) => error!("Punctuation request for {:?} failed: {}", key, e),
                    _ => warn!("Discarding punctuation response for {:?}: {}", key, e),
                }
                self.schedule_release(key);
                AugmentOutcome::Fallback { text, reason: e.to_string() }
            }
        }
    }

    /// Why `sentence` would not be sent right now, if it would not
    pub fn skip_reason(&self, sentence: &Sentence) -> Option<SkipReason> {
        if sentence.is_empty() {
            Some(SkipReason::Empty)
        } else if !sentence.lacks_punctuation() {
            Some(SkipReason::AlreadyPunctuated)
        } else if self.cache.contains(sentence.key()) {
            Some(SkipReason::Cached)
        } else if self.is_in_flight() {
            Some(SkipReason::InFlight)
        } else if !self.cooldown_remaining().is_zero() {
            Some(SkipReason::CoolingDown)
        } else {
            None
        }
    }

    async fn request_and_splice(
        &self,
        timeline: &Arc<RwLock<Timeline>>,
        sentence: &Sentence,
        text: &str,
    ) -> Result<usize, AugmentError> {
        let system = self.settings.prompt.render(&self.settings.language);
        let response = self.model.chat(&system, text, self.settings.temperature).await?;
        let insertions = splice::plan(sentence, &response)?;

        let mut timeline = timeline.write();
        splice::apply(&mut timeline, sentence, &insertions)
    }

    fn schedule_release(&self, key: SpanKey) {
        let cache = self.cache.clone();
        let delay = self.settings.retry_after;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            cache.remove(key);
        });
    }
}
