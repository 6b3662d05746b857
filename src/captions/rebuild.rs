/*!
 * Word rebuilder: flattens caption events into an interleaved timeline.
 *
 * The timeline alternates `Word` entries and punctuation slots so that later
 * stages can write a character into a slot without shifting the index of any
 * word. Even indices are words, odd indices are slots, and the timeline is
 * always exactly twice as long as the word list.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use super::model::CaptionTrack;
use super::punctuation::PunctuationSet;

/// A single timed word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Word text with trailing punctuation removed
    pub text: String,

    /// Start of the word
    pub start_time_ms: u64,

    /// End of the word, chained to the next word's start
    pub end_time_ms: u64,

    /// Punctuation the caption track carried after this word
    pub punctuation: Option<char>,
}

impl Word {
    /// Create a word without punctuation
    pub fn new(text: impl Into<String>, start_time_ms: u64, end_time_ms: u64) -> Self {
        Self {
            text: text.into(),
            start_time_ms,
            end_time_ms,
            punctuation: None,
        }
    }

    /// Midpoint of the word's time range
    pub fn midpoint_ms(&self) -> u64 {
        self.start_time_ms + (self.end_time_ms.saturating_sub(self.start_time_ms)) / 2
    }
}

/// One position in the timeline
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEntry {
    /// A timed word
    Word(Word),
    /// Zero or one punctuation character following the previous word
    Slot(Option<char>),
}

impl TimelineEntry {
    /// The word stored at this position, if any
    pub fn as_word(&self) -> Option<&Word> {
        match self {
            Self::Word(word) => Some(word),
            Self::Slot(_) => None,
        }
    }

    /// Whether this is a punctuation slot
    pub fn is_slot(&self) -> bool {
        matches!(self, Self::Slot(_))
    }
}

/// Interleaved word / punctuation-slot sequence for one video
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    /// Build a timeline from words, seeding each slot with the word's own punctuation
    pub fn from_words(words: Vec<Word>) -> Self {
        let mut entries = Vec::with_capacity(words.len() * 2);
        for word in words {
            let slot = word.punctuation;
            entries.push(TimelineEntry::Word(word));
            entries.push(TimelineEntry::Slot(slot));
        }
        Self { entries }
    }

    /// Raw interleaved entries
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Number of timeline positions (twice the word count)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the timeline holds no words
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of words
    pub fn word_count(&self) -> usize {
        self.entries.len() / 2
    }

    /// Word at `word_index`
    pub fn word(&self, word_index: usize) -> Option<&Word> {
        self.entries.get(word_index * 2).and_then(TimelineEntry::as_word)
    }

    /// Iterate over all words in order
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.entries.iter().filter_map(TimelineEntry::as_word)
    }

    /// Punctuation currently stored after `word_index`
    pub fn slot(&self, word_index: usize) -> Option<char> {
        match self.entries.get(word_index * 2 + 1) {
            Some(TimelineEntry::Slot(c)) => *c,
            _ => None,
        }
    }

    /// Write `punctuation` into the slot after `word_index`.
    ///
    /// Only the slot changes; every word keeps its text and timing.
    /// Returns false when the index is out of range.
    pub fn set_slot(&mut self, word_index: usize, punctuation: Option<char>) -> bool {
        match self.entries.get_mut(word_index * 2 + 1) {
            Some(TimelineEntry::Slot(slot)) => {
                *slot = punctuation;
                true
            }
            _ => false,
        }
    }

    /// Index of the word whose `[start, end)` range contains `time_ms`.
    ///
    /// The last word's range is closed. When no word contains the time the
    /// word whose midpoint is nearest wins.
    pub fn word_index_at(&self, time_ms: u64) -> Option<usize> {
        let count = self.word_count();
        if count == 0 {
            return None;
        }

        // Words are ordered by start time; find the last word starting at or before time_ms.
        let candidate = self.partition_point(time_ms);
        if let Some(idx) = candidate.checked_sub(1) {
            if let Some(word) = self.word(idx) {
                let is_last = idx + 1 == count;
                if time_ms < word.end_time_ms || (is_last && time_ms <= word.end_time_ms) {
                    return Some(idx);
                }
            }
        }

        self.nearest_by_midpoint(time_ms, 0, count)
    }

    /// Word in `[from, to)` whose midpoint is closest to `time_ms`
    pub fn nearest_by_midpoint(&self, time_ms: u64, from: usize, to: usize) -> Option<usize> {
        (from..to.min(self.word_count()))
            .filter_map(|idx| self.word(idx).map(|w| (idx, w.midpoint_ms().abs_diff(time_ms))))
            .min_by_key(|(_, distance)| *distance)
            .map(|(idx, _)| idx)
    }

    /// Plain text of the words in `[from, to]`, joined for the given script
    pub fn text_between(&self, from: usize, to: usize, with_punctuation: bool) -> String {
        let joiner = if self.is_japanese_range(from, to) { "" } else { " " };
        (from..=to)
            .filter_map(|idx| {
                self.word(idx).map(|word| match (with_punctuation, self.slot(idx)) {
                    (true, Some(p)) => format!("{}{}", word.text, p),
                    _ => word.text.clone(),
                })
            })
            .collect::<Vec<_>>()
            .join(joiner)
    }

    /// Whether the words in `[from, to]` are Japanese text
    pub fn is_japanese_range(&self, from: usize, to: usize) -> bool {
        (from..=to)
            .filter_map(|idx| self.word(idx))
            .any(|w| super::punctuation::is_japanese_text(&w.text))
    }

    fn partition_point(&self, time_ms: u64) -> usize {
        let mut low = 0;
        let mut high = self.word_count();
        while low < high {
            let mid = (low + high) / 2;
            match self.word(mid) {
                Some(word) if word.start_time_ms <= time_ms => low = mid + 1,
                _ => high = mid,
            }
        }
        low
    }
}

/// Rebuilds per-word timing from caption events
#[derive(Debug, Clone, Default)]
pub struct WordRebuilder {
    punctuation: PunctuationSet,
}

impl WordRebuilder {
    /// Create a rebuilder that strips the given punctuation set
    pub fn new(punctuation: PunctuationSet) -> Self {
        Self { punctuation }
    }

    /// Flatten the track into words with chained end times
    pub fn rebuild_words(&self, track: &CaptionTrack) -> Vec<Word> {
        let mut words: Vec<Word> = Vec::new();

        for event in &track.events {
            let Some(event_end) = event.end_time_ms() else {
                debug!("Skipping caption event at {}ms: end time overflows", event.start_time_ms);
                continue;
            };

            for (seg_idx, segment) in event.segments.iter().enumerate() {
                if segment.text.trim_matches(|c| c == '\n' || c == '\r').is_empty() {
                    continue;
                }

                let Some(seg_start) = segment.absolute_start_ms(event) else {
                    continue;
                };
                // A segment spans until the next segment of the same event starts.
                let seg_end = event
                    .segments
                    .get(seg_idx + 1)
                    .and_then(|next| next.absolute_start_ms(event))
                    .unwrap_or(event_end)
                    .max(seg_start);

                let tokens: Vec<&str> = segment.text.split_whitespace().collect();
                let step = (seg_end - seg_start) / tokens.len().max(1) as u64;

                for (tok_idx, token) in tokens.iter().enumerate() {
                    let (text, punctuation) = self.punctuation.strip_trailing(token);
                    if text.is_empty() {
                        // A lone punctuation token belongs to the word before it.
                        if let (Some(p), Some(prev)) = (punctuation, words.last_mut()) {
                            prev.punctuation.get_or_insert(p);
                        }
                        continue;
                    }

                    words.push(Word {
                        text: text.to_string(),
                        start_time_ms: seg_start + step * tok_idx as u64,
                        end_time_ms: event_end.max(seg_start),
                        punctuation,
                    });
                }
            }
        }

        close_temporal_gaps(&mut words);
        debug!("Rebuilt {} words from {} caption events", words.len(), track.events.len());
        words
    }

    /// Flatten the track into an interleaved timeline
    pub fn rebuild(&self, track: &CaptionTrack) -> Timeline {
        Timeline::from_words(self.rebuild_words(track))
    }
}

/// Chain every word's end to the next word's start; the last word keeps its own end
fn close_temporal_gaps(words: &mut [Word]) {
    for idx in 1..words.len() {
        let next_start = words[idx].start_time_ms;
        words[idx - 1].end_time_ms = next_start;
    }
}
