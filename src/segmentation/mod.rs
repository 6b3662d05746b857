/*!
 * Sentence segmentation over a rebuilt caption timeline.
 *
 * - `sentence`: punctuation-bounded sentence lookup
 * - `gap_heuristic`: timing-based boundary inference for unpunctuated scripts
 */

pub mod gap_heuristic;
pub mod sentence;

pub use self::gap_heuristic::{GapHeuristic, GapHeuristicConfig};
pub use self::sentence::{Sentence, SentenceSegmenter, DEFAULT_WINDOW_WORDS};
