/*!
 * Aligning a punctuated model response with timeline words.
 *
 * The model sees the sentence as plain text and answers with the same words
 * plus punctuation. The answer is cleaned, aligned word by word with the
 * sentence, and every punctuation character found after a matched word is
 * written into that word's slot. Word text and timing are never touched.
 */

use log::debug;

use crate::captions::punctuation::is_known_punctuation;
use crate::captions::Timeline;
use crate::errors::AugmentError;
use crate::segmentation::Sentence;

/// Caption marker that always ends a sentence
pub const MUSIC_MARKER: &str = "[music]";

// How many sentence words a response token may skip ahead to find its match
const LOOKAHEAD_WORDS: usize = 4;

// How many response characters may precede a word in unspaced scripts
const LOOKAHEAD_CHARS: usize = 8;

// Closing characters ignored when reading punctuation off a token
const CLOSING_CHARS: &[char] = &['"', '\'', '”', '’', ')', '»', '」', '』'];

/// Punctuation to write after one word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    /// Absolute word index in the timeline
    pub word_index: usize,
    /// Character for the word's slot
    pub punctuation: char,
}

/// Drop any preamble before the sentence's first word and trailing ellipses or newlines
pub fn clean_response(response: &str, first_word: &str) -> String {
    let start = find_first_word(response, first_word).unwrap_or(0);
    let mut text = response[start..].trim_end();

    loop {
        let trimmed = text.trim_end_matches(['\n', '\r']).trim_end();
        let trimmed = trimmed
            .strip_suffix("...")
            .or_else(|| trimmed.strip_suffix('…'))
            .unwrap_or(trimmed);
        if trimmed.len() == text.len() {
            break;
        }
        text = trimmed;
    }

    text.trim().to_string()
}

/// Work out which slots of `sentence` receive which punctuation
pub fn plan(sentence: &Sentence, response: &str) -> Result<Vec<Insertion>, AugmentError> {
    let first = sentence.words.first().ok_or(AugmentError::NoMatchingWords)?;
    let cleaned = clean_response(response, &first.text);
    if cleaned.is_empty() {
        return Err(AugmentError::EmptyResponse);
    }

    let (insertions, matched) = if sentence.is_japanese() {
        plan_unspaced(sentence, &cleaned)
    } else {
        plan_spaced(sentence, &cleaned)
    };

    debug!("Aligned {}/{} words of sentence {:?}, {} insertions",
        matched, sentence.len(), sentence.key(), insertions.len());

    if matched == 0 {
        return Err(AugmentError::NoMatchingWords);
    }
    Ok(insertions)
}

/// Write `insertions` into empty slots of the sentence and mark music markers.
///
/// Fails with `Stale` when the timeline no longer holds the sentence's words
/// at the same positions. Returns the number of slots written.
pub fn apply(timeline: &mut Timeline, sentence: &Sentence, insertions: &[Insertion]) -> Result<usize, AugmentError> {
    if is_stale(timeline, sentence) {
        return Err(AugmentError::Stale(sentence.key()));
    }

    let mut inserted = 0;
    for insertion in insertions {
        if !sentence.contains_word(insertion.word_index) || timeline.slot(insertion.word_index).is_some() {
            continue;
        }
        if timeline.set_slot(insertion.word_index, Some(insertion.punctuation)) {
            inserted += 1;
        }
    }

    Ok(inserted + mark_music_markers(timeline, sentence.start_word, sentence.end_word))
}

/// Whether the timeline changed under `sentence`
pub fn is_stale(timeline: &Timeline, sentence: &Sentence) -> bool {
    sentence.words.iter().enumerate().any(|(offset, word)| {
        match timeline.word(sentence.start_word + offset) {
            Some(current) => current.text != word.text || current.start_time_ms != word.start_time_ms,
            None => true,
        }
    })
}

/// Give every `[music]` word in `[from, to]` a terminal if its slot is empty
pub fn mark_music_markers(timeline: &mut Timeline, from: usize, to: usize) -> usize {
    let markers: Vec<usize> = (from..=to)
        .filter(|&idx| timeline.word(idx).is_some_and(|w| w.text == MUSIC_MARKER))
        .filter(|&idx| timeline.slot(idx).is_none())
        .collect();

    for &idx in &markers {
        timeline.set_slot(idx, Some('.'));
    }
    markers.len()
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split a response token into its text and the last trailing punctuation character
fn split_token(token: &str) -> (&str, Option<char>) {
    let mut end = token.len();
    let mut punctuation = None;

    for (idx, c) in token.char_indices().rev() {
        if CLOSING_CHARS.contains(&c) {
            end = idx;
        } else if is_known_punctuation(c) {
            punctuation.get_or_insert(c);
            end = idx;
        } else {
            break;
        }
    }

    (&token[..end], punctuation)
}

fn token_offsets(text: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start = None;

    for (idx, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push((s, &text[s..idx]));
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push((s, &text[s..]));
    }
    tokens
}

fn find_first_word(response: &str, first_word: &str) -> Option<usize> {
    let target = normalize(first_word);
    if target.is_empty() {
        return None;
    }

    token_offsets(response)
        .into_iter()
        .find(|(_, token)| normalize(token) == target)
        .map(|(offset, _)| offset)
        .or_else(|| response.find(first_word))
}

fn plan_spaced(sentence: &Sentence, response: &str) -> (Vec<Insertion>, usize) {
    let mut tokens: Vec<(String, Option<char>)> = Vec::new();
    for raw in response.split_whitespace() {
        let (text, punctuation) = split_token(raw);
        let norm = normalize(text);
        if norm.is_empty() {
            // A detached mark like " ?" belongs to the token before it.
            if let (Some(p), Some(last)) = (punctuation, tokens.last_mut()) {
                last.1.get_or_insert(p);
            }
            continue;
        }
        tokens.push((norm, punctuation));
    }

    let words: Vec<String> = sentence.words.iter().map(|w| normalize(&w.text)).collect();
    let mut insertions = Vec::new();
    let mut cursor = 0;
    let mut matched = 0;

    for (norm, punctuation) in &tokens {
        let limit = (cursor + LOOKAHEAD_WORDS).min(words.len());
        let Some(j) = (cursor..limit).find(|&j| words[j] == *norm) else {
            continue;
        };
        matched += 1;
        cursor = j + 1;
        if let Some(p) = punctuation {
            insertions.push(Insertion { word_index: sentence.start_word + j, punctuation: *p });
        }
    }

    // The answer's final mark goes on the sentence's last word even if alignment drifted.
    if let (Some((norm, Some(p))), Some(last)) = (tokens.last(), words.last()) {
        let end = sentence.end_word;
        if norm == last && !insertions.iter().any(|i| i.word_index == end) {
            insertions.push(Insertion { word_index: end, punctuation: *p });
        }
    }

    (insertions, matched)
}

fn plan_unspaced(sentence: &Sentence, response: &str) -> (Vec<Insertion>, usize) {
    let chars: Vec<char> = response.chars().collect();
    let mut insertions = Vec::new();
    let mut pos = 0;
    let mut matched = 0;

    for (offset, word) in sentence.words.iter().enumerate() {
        let needle: Vec<char> = word.text.chars().filter(|c| !c.is_whitespace()).collect();
        if needle.is_empty() {
            continue;
        }
        let Some(at) = find_chars(&chars, pos, &needle) else {
            continue;
        };
        matched += 1;

        let mut after = at + needle.len();
        let mut found = None;
        while after < chars.len() && (is_known_punctuation(chars[after]) || chars[after].is_whitespace()) {
            if is_known_punctuation(chars[after]) {
                found = Some(chars[after]);
            }
            after += 1;
        }
        if let Some(p) = found {
            insertions.push(Insertion { word_index: sentence.start_word + offset, punctuation: p });
        }
        pos = after;
    }

    (insertions, matched)
}

fn find_chars(haystack: &[char], from: usize, needle: &[char]) -> Option<usize> {
    let last_start = (from + LOOKAHEAD_CHARS).min(haystack.len().saturating_sub(needle.len()));
    (from..=last_start).find(|&start| {
        haystack.get(start..start + needle.len()).is_some_and(|window| window == needle)
    })
}
