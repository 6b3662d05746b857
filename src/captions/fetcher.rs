/*!
 * Caption fetchers.
 *
 * The host page resolves the caption URL internally; here the URL comes from
 * a configurable template expanded with `videoId` and `lang`. A file-system
 * fetcher serves previously downloaded tracks.
 */

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::CaptionError;
use crate::template::{TemplateContext, UrlTemplate};

use super::model::CaptionTrack;

/// Default caption endpoint template
pub const DEFAULT_CAPTION_URL_TEMPLATE: &str =
    "https://www.youtube.com/api/timedtext?v=${encodeURIComponent(videoId)}&lang=${default(lang, 'en')}&fmt=json3";

/// Something that can produce the raw caption track for a video
#[async_trait]
pub trait CaptionFetcher: Send + Sync {
    /// Fetch the caption track for `video_id` in `language`
    async fn fetch(&self, video_id: &str, language: &str) -> Result<CaptionTrack, CaptionError>;
}

/// Fetches caption JSON over HTTP
pub struct HttpCaptionFetcher {
    client: Client,
    template: UrlTemplate,
}

impl HttpCaptionFetcher {
    /// Create a fetcher from a URL template
    pub fn new(url_template: &str, timeout_secs: u64) -> Result<Self, CaptionError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            template: UrlTemplate::parse(url_template)?,
        })
    }

    /// URL the fetcher would request
    pub fn url_for(&self, video_id: &str, language: &str) -> Result<String, CaptionError> {
        let ctx = TemplateContext::new()
            .with("videoId", video_id)
            .with("lang", language);
        Ok(self.template.render(&ctx)?)
    }
}

#[async_trait]
impl CaptionFetcher for HttpCaptionFetcher {
    async fn fetch(&self, video_id: &str, language: &str) -> Result<CaptionTrack, CaptionError> {
        let url = self.url_for(video_id, language)?;
        debug!("Fetching captions from {}", url);

        let response = self.client.get(&url)
            .send()
            .await
            .map_err(|e| CaptionError::Fetch(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Caption endpoint answered {} for video {}", status, video_id);
            return Err(CaptionError::Fetch(format!("caption endpoint returned {}", status)));
        }

        let body = response.text().await
            .map_err(|e| CaptionError::Fetch(format!("failed to read caption body: {}", e)))?;
        if body.trim().is_empty() {
            return Err(CaptionError::EmptyTrack(video_id.to_string()));
        }

        CaptionTrack::from_json(&body)
    }
}

/// Serves `<dir>/<video_id>.<lang>.json`, falling back to `<dir>/<video_id>.json`
pub struct FileCaptionFetcher {
    dir: PathBuf,
}

impl FileCaptionFetcher {
    /// Create a fetcher rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl CaptionFetcher for FileCaptionFetcher {
    async fn fetch(&self, video_id: &str, language: &str) -> Result<CaptionTrack, CaptionError> {
        let localized = self.dir.join(format!("{}.{}.json", video_id, language));
        let path = if localized.is_file() {
            localized
        } else {
            self.dir.join(format!("{}.json", video_id))
        };

        let content = tokio::fs::read_to_string(&path).await?;
        CaptionTrack::from_json(&content)
    }
}
