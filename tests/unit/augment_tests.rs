/*!
 * Tests for punctuation splicing, caching and prompts
 */

use lingocap::augment::splice::{self, Insertion, MUSIC_MARKER};
use lingocap::augment::{PunctuationCache, PunctuationPrompt};
use lingocap::captions::{Timeline, Word};
use lingocap::errors::AugmentError;
use lingocap::segmentation::{Sentence, SentenceSegmenter};

fn timeline(words: &[&str]) -> Timeline {
    Timeline::from_words(
        words.iter().enumerate()
            .map(|(i, w)| Word::new(*w, i as u64 * 300, (i as u64 + 1) * 300))
            .collect(),
    )
}

fn sentence_at(timeline: &Timeline, word_index: usize) -> Sentence {
    SentenceSegmenter::default().sentence_containing(timeline, word_index).unwrap()
}

/// Test that splicing never changes words, only empty slots
#[test]
fn test_splice_withPunctuatedAnswer_shouldPreserveWords() {
    let mut tl = timeline(&["well", "i", "guess", "so", "right"]);
    let before: Vec<Word> = tl.words().cloned().collect();
    let sentence = sentence_at(&tl, 0);

    let insertions = splice::plan(&sentence, "Well, I guess so. Right?").unwrap();
    let inserted = splice::apply(&mut tl, &sentence, &insertions).unwrap();

    let after: Vec<Word> = tl.words().cloned().collect();
    assert_eq!(before, after);
    assert_eq!(inserted, 3);
    assert_eq!(tl.slot(0), Some(','));
    assert_eq!(tl.slot(3), Some('.'));
    assert_eq!(tl.slot(4), Some('?'));
    assert_eq!(tl.slot(1), None);
}

/// Test that a model reply with extra or missing words still aligns
#[test]
fn test_plan_withDriftingAnswer_shouldSkipUnknownTokens() {
    let tl = timeline(&["we", "went", "home", "late"]);
    let sentence = sentence_at(&tl, 0);

    let insertions = splice::plan(&sentence, "We, um, went home late.").unwrap();

    assert_eq!(insertions, vec![
        Insertion { word_index: 0, punctuation: ',' },
        Insertion { word_index: 3, punctuation: '.' },
    ]);
}

/// Test that occupied slots and slots outside the sentence are left alone
#[test]
fn test_apply_withOccupiedOrForeignSlots_shouldSkipThem() {
    let mut tl = timeline(&["one", "two", "three", "four"]);
    let sentence = sentence_at(&tl, 0);
    tl.set_slot(1, Some(';'));

    let insertions = vec![
        Insertion { word_index: 1, punctuation: '.' },
        Insertion { word_index: 2, punctuation: ',' },
        Insertion { word_index: 9, punctuation: '.' },
    ];
    let inserted = splice::apply(&mut tl, &sentence, &insertions).unwrap();

    assert_eq!(inserted, 1);
    assert_eq!(tl.slot(1), Some(';'));
    assert_eq!(tl.slot(2), Some(','));
}

/// Test that a changed timeline rejects the response
#[test]
fn test_apply_withChangedTimeline_shouldReportStale() {
    let tl = timeline(&["alpha", "beta"]);
    let sentence = sentence_at(&tl, 0);
    let mut replaced = timeline(&["gamma", "delta"]);

    assert!(splice::is_stale(&replaced, &sentence));
    let result = splice::apply(&mut replaced, &sentence, &[Insertion { word_index: 1, punctuation: '.' }]);

    assert!(matches!(result, Err(AugmentError::Stale((0, 1)))));
    assert_eq!(replaced.slot(1), None);
}

/// Test that music markers always end a sentence
#[test]
fn test_markMusicMarkers_shouldTerminateMarkers() {
    let mut tl = timeline(&["hey", MUSIC_MARKER, "there", "[Music]"]);

    assert_eq!(splice::mark_music_markers(&mut tl, 0, 3), 1);
    assert_eq!(tl.slot(1), Some('.'));
    assert_eq!(tl.slot(3), None);
    assert_eq!(splice::mark_music_markers(&mut tl, 0, 3), 0);
}

/// Test response cleanup
#[test]
fn test_cleanResponse_shouldDropPreambleAndTrailingEllipsis() {
    assert_eq!(splice::clean_response("Here it is: ok then", "ok"), "ok then");
    assert_eq!(splice::clean_response("ok then…\n\n", "ok"), "ok then");
    assert_eq!(splice::clean_response("nothing matches...", "zzz"), "nothing matches");
}

/// Test that the cache claims a span only once until released
#[test]
fn test_cache_claimAndRelease_shouldTrackSpans() {
    let cache = PunctuationCache::new();
    let shared = cache.clone();

    assert!(cache.try_insert((0, 4)));
    assert!(!shared.try_insert((0, 4)));
    assert!(shared.contains((0, 4)));
    assert_eq!(cache.stats(), (1, 1, 0.5));

    assert!(cache.remove((0, 4)));
    assert!(!cache.remove((0, 4)));
    assert!(cache.try_insert((0, 4)));

    shared.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.stats(), (0, 0, 0.0));
}

/// Test prompt rendering
#[test]
fn test_prompt_render_shouldMentionLanguage() {
    let prompt = PunctuationPrompt::default().render("Japanese");

    assert!(prompt.contains("Japanese captions"));
    assert!(!prompt.contains("{language}"));
    assert_eq!(PunctuationPrompt::from_override(Some("Fix {language}")).render("German"), "Fix German");
}
