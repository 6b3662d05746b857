/*!
 * Caption handling: the raw caption model, fetching, punctuation sets and
 * the word rebuilder that turns caption events into a timeline.
 */

pub mod fetcher;
pub mod model;
pub mod punctuation;
pub mod rebuild;

pub use self::fetcher::{CaptionFetcher, FileCaptionFetcher, HttpCaptionFetcher};
pub use self::model::{CaptionEvent, CaptionSegment, CaptionTrack};
pub use self::punctuation::PunctuationSet;
pub use self::rebuild::{Timeline, TimelineEntry, Word, WordRebuilder};
