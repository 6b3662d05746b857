/*!
 * Sentence segmenter.
 *
 * Given a timestamp, find the word playing at that time and grow a sentence
 * around it up to the nearest boundary punctuation on each side. The search
 * is confined to a window of words around the anchor so lookups stay cheap on
 * long videos; when no boundary is found the window edge closes the sentence.
 */

use serde::Serialize;

use crate::captions::{PunctuationSet, Timeline, Word};

/// Default number of words searched on each side of the anchor word
pub const DEFAULT_WINDOW_WORDS: usize = 200;

/// A contiguous run of words bounded by punctuation or window edges
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sentence {
    /// Index of the first word
    pub start_word: usize,

    /// Index of the last word, inclusive
    pub end_word: usize,

    /// Earliest start among the words
    pub start_time_ms: u64,

    /// Latest end among the words
    pub end_time_ms: u64,

    /// Words in order
    pub words: Vec<Word>,

    /// Punctuation slot after each word, parallel to `words`
    pub punctuation: Vec<Option<char>>,
}

impl Sentence {
    /// Word index range key used by caches
    pub fn key(&self) -> (usize, usize) {
        (self.start_word, self.end_word)
    }

    /// Number of words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the sentence has no words
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Whether `word_index` falls inside the sentence
    pub fn contains_word(&self, word_index: usize) -> bool {
        (self.start_word..=self.end_word).contains(&word_index)
    }

    /// Whether no slot inside the sentence carries any punctuation
    pub fn lacks_punctuation(&self) -> bool {
        self.punctuation.iter().all(Option::is_none)
    }

    /// Whether this is Japanese text
    pub fn is_japanese(&self) -> bool {
        self.words.iter().any(|w| crate::captions::punctuation::is_japanese_text(&w.text))
    }

    /// Words joined without punctuation
    pub fn plain_text(&self) -> String {
        let joiner = if self.is_japanese() { "" } else { " " };
        self.words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(joiner)
    }

    /// Words joined with their punctuation
    pub fn display_text(&self) -> String {
        let joiner = if self.is_japanese() { "" } else { " " };
        self.words
            .iter()
            .zip(&self.punctuation)
            .map(|(word, p)| match p {
                Some(c) => format!("{}{}", word.text, c),
                None => word.text.clone(),
            })
            .collect::<Vec<_>>()
            .join(joiner)
    }
}

/// Locates sentences inside a timeline
#[derive(Debug, Clone)]
pub struct SentenceSegmenter {
    punctuation: PunctuationSet,
    window_words: usize,
}

impl Default for SentenceSegmenter {
    fn default() -> Self {
        Self::new(PunctuationSet::default(), DEFAULT_WINDOW_WORDS)
    }
}

impl SentenceSegmenter {
    /// Create a segmenter
    pub fn new(punctuation: PunctuationSet, window_words: usize) -> Self {
        Self {
            punctuation,
            window_words: window_words.max(1),
        }
    }

    /// Boundary set in use
    pub fn punctuation(&self) -> PunctuationSet {
        self.punctuation
    }

    /// Search window `[from, to]` around `word_index`
    pub fn window_around(&self, timeline: &Timeline, word_index: usize) -> (usize, usize) {
        let last = timeline.word_count().saturating_sub(1);
        let from = word_index.saturating_sub(self.window_words);
        let to = (word_index + self.window_words).min(last);
        (from, to)
    }

    /// Sentence playing at `time_ms`
    pub fn locate(&self, timeline: &Timeline, time_ms: u64) -> Option<Sentence> {
        let anchor = timeline.word_index_at(time_ms)?;
        self.sentence_containing(timeline, anchor)
    }

    /// Sentence that contains `word_index`
    pub fn sentence_containing(&self, timeline: &Timeline, word_index: usize) -> Option<Sentence> {
        if word_index >= timeline.word_count() {
            return None;
        }
        let (window_start, window_end) = self.window_around(timeline, word_index);

        // A boundary in the slot before the anchor closes the previous sentence.
        let start = (window_start..word_index)
            .rev()
            .find(|&idx| self.is_boundary_slot(timeline, idx))
            .map(|idx| idx + 1)
            .unwrap_or(window_start);

        let end = (word_index..=window_end)
            .find(|&idx| self.is_boundary_slot(timeline, idx))
            .unwrap_or(window_end);

        build_sentence(timeline, start, end)
    }

    /// Sentence that contains `word_index` but starts no earlier than it.
    ///
    /// A sentence closed by the window edge may reach back over words that
    /// already belong to the sentence before; the start is clamped so stepping
    /// forward never revisits them.
    pub fn sentence_from(&self, timeline: &Timeline, word_index: usize) -> Option<Sentence> {
        let found = self.sentence_containing(timeline, word_index)?;
        if found.start_word >= word_index {
            return Some(found);
        }
        build_sentence(timeline, word_index, found.end_word)
    }

    /// Sentence that contains `word_index` but ends no later than it
    pub fn sentence_until(&self, timeline: &Timeline, word_index: usize) -> Option<Sentence> {
        let found = self.sentence_containing(timeline, word_index)?;
        if found.end_word <= word_index {
            return Some(found);
        }
        build_sentence(timeline, found.start_word, word_index)
    }

    /// Sentence immediately before `sentence`
    pub fn previous(&self, timeline: &Timeline, sentence: &Sentence) -> Option<Sentence> {
        let idx = sentence.start_word.checked_sub(1)?;
        self.sentence_until(timeline, idx)
    }

    /// Sentence immediately after `sentence`
    pub fn next(&self, timeline: &Timeline, sentence: &Sentence) -> Option<Sentence> {
        self.sentence_from(timeline, sentence.end_word + 1)
    }

    /// Every sentence of the timeline in order, without overlap
    pub fn all(&self, timeline: &Timeline) -> Vec<Sentence> {
        let mut sentences = Vec::new();
        let mut idx = 0;
        while let Some(sentence) = self.sentence_from(timeline, idx) {
            idx = sentence.end_word + 1;
            sentences.push(sentence);
        }
        sentences
    }

    fn is_boundary_slot(&self, timeline: &Timeline, word_index: usize) -> bool {
        timeline.slot(word_index).is_some_and(|c| self.punctuation.is_boundary(c))
    }
}

fn build_sentence(timeline: &Timeline, start: usize, end: usize) -> Option<Sentence> {
    let words: Vec<Word> = (start..=end).filter_map(|idx| timeline.word(idx).cloned()).collect();
    let start_time_ms = words.iter().map(|w| w.start_time_ms).min()?;
    let end_time_ms = words.iter().map(|w| w.end_time_ms).max()?;
    let punctuation = (start..=end).map(|idx| timeline.slot(idx)).collect();

    Some(Sentence {
        start_word: start,
        end_word: end,
        start_time_ms,
        end_time_ms,
        words,
        punctuation,
    })
}
