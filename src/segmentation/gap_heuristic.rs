/*!
 * Sliding-window time-gap boundary detection.
 *
 * Auto-generated Japanese captions carry no terminal punctuation, so sentence
 * boundaries are inferred from pauses between words instead. A gap between
 * two consecutive word starts becomes a boundary when it is long compared to
 * the gaps around it, or simply very long.
 *
 * The thresholds are empirical. They are exposed as configuration and should
 * not be assumed to generalize beyond the material they were tuned on.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::captions::punctuation::{terminal_for, PunctuationSet};
use crate::captions::Timeline;

/// Tuning knobs for the gap heuristic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapHeuristicConfig {
    /// Number of neighbouring gaps considered on each side
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// A gap this many times the local average is a boundary
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Gaps shorter than this are never boundaries
    #[serde(default = "default_min_gap_ms")]
    pub min_gap_ms: u64,

    /// Gaps longer than this are always boundaries
    #[serde(default = "default_max_gap_ms")]
    pub max_gap_ms: u64,

    /// Gaps longer than this are left out of local averages
    #[serde(default = "default_outlier_cutoff_ms")]
    pub outlier_cutoff_ms: u64,

    /// Minimum words between two boundaries unless the gap exceeds `max_gap_ms`
    #[serde(default = "default_min_words_between")]
    pub min_words_between: usize,
}

fn default_window_size() -> usize {
    10
}

fn default_multiplier() -> f64 {
    2.6
}

fn default_min_gap_ms() -> u64 {
    300
}

fn default_max_gap_ms() -> u64 {
    2000
}

fn default_outlier_cutoff_ms() -> u64 {
    1500
}

fn default_min_words_between() -> usize {
    2
}

impl Default for GapHeuristicConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            multiplier: default_multiplier(),
            min_gap_ms: default_min_gap_ms(),
            max_gap_ms: default_max_gap_ms(),
            outlier_cutoff_ms: default_outlier_cutoff_ms(),
            min_words_between: default_min_words_between(),
        }
    }
}

/// Infers sentence boundaries from inter-word timing
#[derive(Debug, Clone, Default)]
pub struct GapHeuristic {
    config: GapHeuristicConfig,
    punctuation: PunctuationSet,
}

impl GapHeuristic {
    /// Create a heuristic with the given tuning
    pub fn new(config: GapHeuristicConfig, punctuation: PunctuationSet) -> Self {
        Self { config, punctuation }
    }

    /// Configuration in use
    pub fn config(&self) -> &GapHeuristicConfig {
        &self.config
    }

    /// Start-to-start gaps between consecutive words in `[from, to]`
    pub fn gaps(timeline: &Timeline, from: usize, to: usize) -> Vec<u64> {
        (from..to)
            .filter_map(|idx| {
                let current = timeline.word(idx)?;
                let next = timeline.word(idx + 1)?;
                Some(next.start_time_ms.saturating_sub(current.start_time_ms))
            })
            .collect()
    }

    /// Average of the gaps around `index`, ignoring `index` itself and outliers
    pub fn local_average(&self, gaps: &[u64], index: usize) -> Option<f64> {
        let lo = index.saturating_sub(self.config.window_size);
        let hi = (index + self.config.window_size).min(gaps.len().saturating_sub(1));

        let (sum, count) = (lo..=hi)
            .filter(|&j| j != index)
            .filter_map(|j| gaps.get(j))
            .filter(|&&gap| gap <= self.config.outlier_cutoff_ms)
            .fold((0u64, 0usize), |(sum, count), &gap| (sum + gap, count + 1));

        (count > 0).then(|| sum as f64 / count as f64)
    }

    /// Whether a single gap qualifies as a boundary, ignoring spacing rules
    pub fn is_boundary_gap(&self, gap: u64, local_average: Option<f64>) -> bool {
        if gap < self.config.min_gap_ms {
            return false;
        }
        gap > self.config.max_gap_ms
            || local_average.is_some_and(|avg| gap as f64 > avg * self.config.multiplier)
    }

    /// Word indices in `[from, to]` after which a boundary should be inserted.
    ///
    /// Existing boundary punctuation counts toward the spacing rule and is
    /// never reported again, so running detection over an already processed
    /// range yields nothing new. Slots holding any other punctuation are
    /// never reported either.
    pub fn detect(&self, timeline: &Timeline, from: usize, to: usize) -> Vec<usize> {
        let gaps = Self::gaps(timeline, from, to);
        let mut boundaries = Vec::new();
        let mut last_boundary: Option<usize> = None;

        for (k, &gap) in gaps.iter().enumerate() {
            let word_index = from + k;

            match timeline.slot(word_index) {
                Some(c) if self.punctuation.is_boundary(c) => {
                    last_boundary = Some(word_index);
                    continue;
                }
                // Slots already holding a comma are kept as they are.
                Some(_) => continue,
                None => {}
            }

            if !self.is_boundary_gap(gap, self.local_average(&gaps, k)) {
                continue;
            }

            let too_close = last_boundary
                .is_some_and(|last| word_index - last < self.config.min_words_between);
            if too_close && gap <= self.config.max_gap_ms {
                continue;
            }

            boundaries.push(word_index);
            last_boundary = Some(word_index);
        }

        boundaries
    }

    /// Detect boundaries in `[from, to]` and write a synthetic terminal into each slot
    pub fn apply(&self, timeline: &mut Timeline, from: usize, to: usize) -> Vec<usize> {
        let boundaries = self.detect(timeline, from, to);
        for &idx in &boundaries {
            let terminal = timeline.word(idx).map(|w| terminal_for(&w.text)).unwrap_or('.');
            timeline.set_slot(idx, Some(terminal));
        }
        if !boundaries.is_empty() {
            debug!("Gap heuristic inserted {} boundaries in words {}..={}", boundaries.len(), from, to);
        }
        boundaries
    }
}
