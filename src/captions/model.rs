/*!
 * Serde model of the timed-caption JSON served by the video platform.
 *
 * The payload looks like
 * `{ "events": [{ "tStartMs": 0, "dDurationMs": 1200, "segs": [{ "utf8": "Hello", "tOffsetMs": 0 }] }] }`.
 * Every field is optional on the wire; events without segments (window
 * definitions, style events) are kept and simply produce no words.
 */

use serde::{Deserialize, Serialize};

use crate::errors::CaptionError;

/// A complete caption track for one video
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptionTrack {
    /// Timed caption events in presentation order
    #[serde(default)]
    pub events: Vec<CaptionEvent>,
}

/// A single timed block of caption text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptionEvent {
    /// Absolute start of the event
    #[serde(rename = "tStartMs", default)]
    pub start_time_ms: u64,

    /// Duration of the event
    #[serde(rename = "dDurationMs", default)]
    pub duration_ms: u64,

    /// Sub-segments, usually one word each for auto-generated tracks
    #[serde(rename = "segs", default)]
    pub segments: Vec<CaptionSegment>,
}

/// One piece of text inside an event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptionSegment {
    /// Segment text, may carry leading whitespace and trailing punctuation
    #[serde(rename = "utf8", default)]
    pub text: String,

    /// Offset relative to the owning event's start
    #[serde(rename = "tOffsetMs", default, skip_serializing_if = "Option::is_none")]
    pub offset_ms: Option<u64>,
}

impl CaptionTrack {
    /// Decode a track from the raw JSON payload
    pub fn from_json(json: &str) -> Result<Self, CaptionError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Number of segments across all events
    pub fn segment_count(&self) -> usize {
        self.events.iter().map(|e| e.segments.len()).sum()
    }
}

impl CaptionEvent {
    /// End of the event as announced by the track, `None` when it overflows
    pub fn end_time_ms(&self) -> Option<u64> {
        self.start_time_ms.checked_add(self.duration_ms)
    }
}

impl CaptionSegment {
    /// Absolute start time of this segment within `event`, `None` when it overflows
    pub fn absolute_start_ms(&self, event: &CaptionEvent) -> Option<u64> {
        event.start_time_ms.checked_add(self.offset_ms.unwrap_or(0))
    }
}
