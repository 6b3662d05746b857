/*!
 * Subtitle rendering.
 *
 * The navigation controller publishes every visible sentence change through
 * a `SubtitleSource`; any number of `Renderer`s subscribe to it. Two
 * renderers ship with the crate: overlay markup honouring the display
 * preferences, and plain timestamped text for terminals.
 */

use std::io::Write;

use log::warn;

use crate::app_config::DisplayConfig;
use crate::captions::punctuation::{is_japanese_text, is_known_punctuation};
use crate::segmentation::Sentence;

/// Whether the controller is following playback or replaying one sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Display follows the playback position
    Live,
    /// A single sentence is being replayed
    Replay,
}

/// A change of the visible subtitle
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleUpdate {
    /// First and last word index of the sentence
    pub sentence_key: (usize, usize),
    /// Sentence text with punctuation
    pub text: String,
    /// Sentence start
    pub start_time_ms: u64,
    /// Sentence end
    pub end_time_ms: u64,
    /// Controller mode when the update was produced
    pub mode: DisplayMode,
}

impl SubtitleUpdate {
    /// Update showing `sentence`
    pub fn from_sentence(sentence: &Sentence, mode: DisplayMode) -> Self {
        Self {
            sentence_key: sentence.key(),
            text: sentence.display_text(),
            start_time_ms: sentence.start_time_ms,
            end_time_ms: sentence.end_time_ms,
            mode,
        }
    }
}

/// Receives subtitle updates
pub trait Renderer: Send {
    /// Show `update`
    fn render(&mut self, update: &SubtitleUpdate);
}

/// Fan-out of subtitle updates to subscribed renderers
#[derive(Default)]
pub struct SubtitleSource {
    renderers: Vec<Box<dyn Renderer>>,
    last: Option<SubtitleUpdate>,
}

impl SubtitleSource {
    /// Create a source without subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a renderer
    pub fn subscribe(&mut self, renderer: Box<dyn Renderer>) {
        self.renderers.push(renderer);
    }

    /// Number of subscribed renderers
    pub fn subscriber_count(&self) -> usize {
        self.renderers.len()
    }

    /// Last update emitted
    pub fn last(&self) -> Option<&SubtitleUpdate> {
        self.last.as_ref()
    }

    /// Send `update` to every renderer unless it repeats the last one.
    ///
    /// Returns whether the update was delivered.
    pub fn emit(&mut self, update: SubtitleUpdate) -> bool {
        if self.last.as_ref() == Some(&update) {
            return false;
        }
        for renderer in &mut self.renderers {
            renderer.render(&update);
        }
        self.last = Some(update);
        true
    }
}

/// Escape text for inclusion in HTML
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wrap the first half of every word (rounded up) in `<b>`, escaping everything
pub fn bionic_markup(text: &str) -> String {
    text.split(' ')
        .map(|token| {
            let core_end = token
                .char_indices()
                .rev()
                .find(|(_, c)| !is_known_punctuation(*c))
                .map(|(idx, c)| idx + c.len_utf8())
                .unwrap_or(0);
            let (core, tail) = token.split_at(core_end);

            let count = core.chars().count();
            if count == 0 {
                return escape_html(token);
            }
            let split = core.char_indices()
                .nth(count.div_ceil(2))
                .map(|(idx, _)| idx)
                .unwrap_or(core.len());
            let (bold, rest) = core.split_at(split);

            format!("<b>{}</b>{}{}", escape_html(bold), escape_html(rest), escape_html(tail))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Overlay markup for `text` under the given display preferences.
///
/// Bionic emphasis only applies to space-separated scripts.
pub fn overlay_markup(display: &DisplayConfig, text: &str) -> String {
    let body = if display.bionic_reading && !is_japanese_text(text) {
        bionic_markup(text)
    } else {
        escape_html(text)
    };

    format!(
        "<div class=\"lingocap-overlay\" style=\"font-family: {}; font-size: {}px;\">{}</div>",
        escape_html(&display.font_family),
        display.font_size_px,
        body
    )
}

/// Writes overlay markup, one update per line
pub struct OverlayRenderer<W: Write + Send> {
    display: DisplayConfig,
    out: W,
}

impl<W: Write + Send> OverlayRenderer<W> {
    /// Create a renderer writing to `out`
    pub fn new(display: DisplayConfig, out: W) -> Self {
        Self { display, out }
    }
}

impl<W: Write + Send> Renderer for OverlayRenderer<W> {
    fn render(&mut self, update: &SubtitleUpdate) {
        let markup = overlay_markup(&self.display, &update.text);
        if let Err(e) = writeln!(self.out, "{}", markup) {
            warn!("Failed to write overlay: {}", e);
        }
    }
}

/// Writes `[mm:ss.mmm] text` lines
pub struct TextRenderer<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> TextRenderer<W> {
    /// Create a renderer writing to `out`
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> Renderer for TextRenderer<W> {
    fn render(&mut self, update: &SubtitleUpdate) {
        let marker = match update.mode {
            DisplayMode::Live => "",
            DisplayMode::Replay => " (replay)",
        };
        if let Err(e) = writeln!(self.out, "[{}]{} {}", format_timestamp(update.start_time_ms), marker, update.text) {
            warn!("Failed to write subtitle: {}", e);
        }
    }
}

/// Format milliseconds as `mm:ss.mmm`
pub fn format_timestamp(ms: u64) -> String {
    format!("{:02}:{:02}.{:03}", ms / 60_000, (ms / 1000) % 60, ms % 1000)
}
