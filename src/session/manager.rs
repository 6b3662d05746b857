/*!
 * Session manager for the caption session lifecycle.
 *
 * This module handles:
 * - Building a session when a video's captions load
 * - Keeping the session while the same video stays open
 * - Discarding the session, and every cache it owns, on navigation
 */

use std::sync::Arc;

use log::{debug, info};

use crate::app_config::Config;
use crate::augment::{AugmenterSettings, PunctuationAugmenter};
use crate::captions::{CaptionFetcher, CaptionTrack};
use crate::errors::CaptionError;
use crate::language_utils;
use crate::providers::{self, ChatModel};

use super::models::{CaptionSession, SessionSettings};

/// Session manager holding at most one live caption session
#[derive(Debug)]
pub struct SessionManager {
    /// Settings applied to every new session
    settings: SessionSettings,
    /// Chat model and request settings used for punctuation, if enabled
    punctuation: Option<(Arc<dyn ChatModel>, AugmenterSettings)>,
    /// Session of the open video
    current: Option<Arc<CaptionSession>>,
}

impl SessionManager {
    /// Create a session manager without punctuation restoration
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            punctuation: None,
            current: None,
        }
    }

    /// Create a session manager from the application configuration
    pub fn from_config(config: &Config) -> Self {
        let manager = Self::new(SessionSettings::from_config(config));
        if !config.punctuation.enabled {
            return manager;
        }

        let language = language_utils::get_language_name(&config.language)
            .unwrap_or_else(|_| config.language.clone());
        let settings = AugmenterSettings::from_config(&config.punctuation, language);
        manager.with_chat_model(providers::create_chat_model(&config.punctuation), settings)
    }

    /// Enable punctuation restoration through `model`
    pub fn with_chat_model(mut self, model: Arc<dyn ChatModel>, settings: AugmenterSettings) -> Self {
        self.punctuation = Some((model, settings));
        self
    }

    /// Session of the open video
    pub fn current(&self) -> Option<Arc<CaptionSession>> {
        self.current.clone()
    }

    /// Open `video_id` with an already fetched track.
    ///
    /// Loading the video that is already open keeps the existing session.
    /// Loading any other video replaces it.
    pub fn load(&mut self, video_id: &str, language: &str, track: &CaptionTrack) -> Result<Arc<CaptionSession>, CaptionError> {
        if let Some(session) = self.current_for(video_id) {
            debug!("Video {} already loaded in session {}", video_id, &session.id()[..8]);
            return Ok(session);
        }

        self.discard();
        let session = Arc::new(self.build(video_id, language, track)?);
        info!("Loaded captions for video {} ({} words, session {})",
            video_id, session.word_count(), &session.id()[..8]);
        self.current = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Open `video_id`, fetching its captions unless it is already open
    pub async fn load_from(
        &mut self,
        fetcher: &dyn CaptionFetcher,
        video_id: &str,
        language: &str,
    ) -> Result<Arc<CaptionSession>, CaptionError> {
        if let Some(session) = self.current_for(video_id) {
            return Ok(session);
        }
        let track = fetcher.fetch(video_id, language).await?;
        self.load(video_id, language, &track)
    }

    /// Drop the open session and its caches
    pub fn discard(&mut self) {
        if let Some(session) = self.current.take() {
            if let Some(augmenter) = session.augmenter() {
                augmenter.cache().clear();
            }
            info!("Discarded session {} for video {}", &session.id()[..8], session.video_id());
        }
    }

    fn current_for(&self, video_id: &str) -> Option<Arc<CaptionSession>> {
        self.current.as_ref()
            .filter(|s| s.video_id() == video_id)
            .cloned()
    }

    fn build(&self, video_id: &str, language: &str, track: &CaptionTrack) -> Result<CaptionSession, CaptionError> {
        let session = CaptionSession::new(video_id, language, track, &self.settings)?;
        Ok(match &self.punctuation {
            Some((model, settings)) => {
                let augmenter = PunctuationAugmenter::new(Arc::clone(model), settings.clone());
                session.with_augmenter(Arc::new(augmenter))
            }
            None => session,
        })
    }
}
