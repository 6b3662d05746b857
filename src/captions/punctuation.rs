/*!
 * Punctuation sets and script detection shared by the rebuilder, the
 * segmenter and the augmenter.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters that always end a sentence
pub const TERMINAL_PUNCTUATION: &[char] = &['.', '!', '?', '。', '！', '？', '…'];

/// Characters that end a sentence only when comma-sentencing is enabled
pub const COMMA_PUNCTUATION: &[char] = &[',', ';', ':', '，', '、', '；', '：'];

/// Terminal character inserted after synthetic boundaries in Japanese text
pub const JAPANESE_FULL_STOP: char = '。';

// @const: Hiragana, katakana and CJK unified ideographs
static JAPANESE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{Hiragana}\p{Katakana}\u{4E00}-\u{9FFF}]").unwrap()
});

/// Set of characters currently treated as sentence boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PunctuationSet {
    /// Whether commas (and their CJK equivalents) split sentences
    pub comma_sentencing: bool,
}

impl Default for PunctuationSet {
    fn default() -> Self {
        Self::new(false)
    }
}

impl PunctuationSet {
    /// Create a set, optionally treating commas as boundaries
    pub fn new(comma_sentencing: bool) -> Self {
        Self { comma_sentencing }
    }

    /// Whether `c` belongs to the active set
    pub fn is_boundary(&self, c: char) -> bool {
        TERMINAL_PUNCTUATION.contains(&c) || (self.comma_sentencing && COMMA_PUNCTUATION.contains(&c))
    }

    /// Remove the trailing run of active punctuation from `token`.
    ///
    /// Returns the remaining text and the last stripped character, so
    /// `"world..."` yields `("world", Some('.'))` and `"wait?!"` yields
    /// `("wait", Some('!'))`.
    pub fn strip_trailing<'a>(&self, token: &'a str) -> (&'a str, Option<char>) {
        let mut end = token.len();
        let mut stripped = None;

        for (idx, c) in token.char_indices().rev() {
            if !self.is_boundary(c) {
                break;
            }
            if stripped.is_none() {
                stripped = Some(c);
            }
            end = idx;
        }

        (&token[..end], stripped)
    }
}

/// Whether a character is any punctuation the augmenter may splice in
pub fn is_known_punctuation(c: char) -> bool {
    TERMINAL_PUNCTUATION.contains(&c) || COMMA_PUNCTUATION.contains(&c)
}

/// Whether `text` contains Japanese kana or CJK ideographs
pub fn is_japanese_text(text: &str) -> bool {
    JAPANESE_REGEX.is_match(text)
}

/// Terminal character that fits the script of `text`
pub fn terminal_for(text: &str) -> char {
    if is_japanese_text(text) {
        JAPANESE_FULL_STOP
    } else {
        '.'
    }
}
