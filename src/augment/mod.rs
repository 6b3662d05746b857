/*!
 * Punctuation augmentation through a language model.
 *
 * - `cache`: spans already requested
 * - `prompts`: instruction prompt
 * - `splice`: aligning the model answer with timeline words
 * - `augmenter`: request throttling and the round trip itself
 */

pub mod augmenter;
pub mod cache;
pub mod prompts;
pub mod splice;

pub use self::augmenter::{AugmentOutcome, AugmenterSettings, PunctuationAugmenter, SkipReason};
pub use self::cache::PunctuationCache;
pub use self::prompts::PunctuationPrompt;
