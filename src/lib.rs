/*!
 * # lingocap - sentence-level captions for language learners
 *
 * Auto-generated video captions arrive as a stream of timed fragments with
 * little or no punctuation. This library turns them into something a
 * learner can navigate one sentence at a time.
 *
 * ## Features
 *
 * - Rebuild caption events into timed words with punctuation slots
 * - Locate the sentence playing at any time, with a timing heuristic for
 *   Japanese captions that carry no punctuation at all
 * - Restore missing punctuation through a language model:
 *   - Ollama (local LLM)
 *   - OpenAI API (and OpenAI-compatible servers such as LM Studio)
 *   - Anthropic API
 * - Replay the previous, current or next sentence and pause at its end
 * - Render the visible sentence as styled overlay markup with optional
 *   bionic-reading emphasis
 * - Fetch caption tracks through a configurable URL template
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `captions`: caption model, fetchers and the word rebuilder
 * - `segmentation`: sentence segmenter and the time-gap heuristic
 * - `augment`: punctuation augmenter with its cache and response splicing
 * - `providers`: language-model clients behind the `ChatModel` trait
 * - `playback`: player seam, keyboard mapping, renderers and the navigation controller
 * - `session`: per-video session state and its manager
 * - `template`: the URL template expression language
 * - `app_config`: configuration management
 * - `app_controller`: workflows behind the CLI commands
 * - `file_utils`, `language_utils`: file system and ISO language helpers
 * - `errors`: custom error types for the library
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod augment;
pub mod captions;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod playback;
pub mod providers;
pub mod segmentation;
pub mod session;
pub mod template;

// Re-export main types for easier usage
pub use app_config::Config;
pub use augment::{AugmentOutcome, PunctuationAugmenter};
pub use captions::{CaptionTrack, Timeline, Word, WordRebuilder};
pub use errors::{AppError, AugmentError, CaptionError, PlaybackError, ProviderError, TemplateError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use playback::{NavigationCommand, NavigationController};
pub use segmentation::{Sentence, SentenceSegmenter};
pub use session::{CaptionSession, SessionManager};
