//! Search for the fewest extra sources that lift a failing goal to target.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::atlas::Atlas;
use crate::config::EvaluatorConfig;
use crate::element::{ELEMENTS, Element, PipVector};
use crate::evaluator::evaluate_uncached;
use crate::goal::Goal;
use crate::numbers::u32_to_usize;

/// Bounds applied to a recommendation search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub trials: u32,
    pub single_element_add_cap: u32,
    pub multi_element_add_cap: u32,
    pub deadline: Option<Duration>,
}

impl SearchLimits {
    #[must_use]
    pub fn from_config(config: &EvaluatorConfig) -> Self {
        Self {
            trials: config.recommend_trials,
            single_element_add_cap: config.single_element_add_cap,
            multi_element_add_cap: config.multi_element_add_cap,
            deadline: config.deadline(),
        }
    }
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self::from_config(&EvaluatorConfig::default())
    }
}

/// A site whose pips feed no requirement of the goal and could be swapped out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutSuggestion {
    pub element: Element,
    /// Sources to cut; always one.
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub add_sources: PipVector,
    pub total_adds: u32,
    pub cut_suggestion: Option<CutSuggestion>,
    /// Probability after the suggested additions.
    pub new_probability: f64,
    /// False when the search stopped at its cap below target.
    pub reached_target: bool,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let adds: Vec<String> = self
            .add_sources
            .iter()
            .filter(|&(_, count)| count > 0)
            .map(|(element, count)| format!("+{count} {}", element.label()))
            .collect();
        if adds.is_empty() {
            write!(f, "no additions")?;
        } else {
            write!(f, "add {}", adds.join(", "))?;
        }
        write!(f, " -> {:.1}%", self.new_probability * 100.0)?;
        if let Some(cut) = self.cut_suggestion {
            write!(f, " (consider cutting one {} source)", cut.element.label())?;
        }
        Ok(())
    }
}

/// Recommend extra single-pip sources for a goal that misses `target`.
///
/// Single-element goals search `adds` linearly up to the single-element cap.
/// Multi-element goals add one source at a time to the required element with
/// the lowest coverage ratio, up to the multi-element cap. Every candidate
/// atlas is re-evaluated from scratch, so the exact/simulated choice follows
/// the modified atlas. At the cap the last candidate is returned as a best
/// effort.
pub fn recommend<R: Rng + ?Sized>(
    goal: &Goal,
    atlas: &Atlas,
    n_seen: usize,
    target: f64,
    limits: &SearchLimits,
    rng: &mut R,
) -> Recommendation {
    let n = n_seen.min(atlas.site_count());
    let mut recommendation = match goal.single_element() {
        Some(element) => search_single(goal, element, atlas, n, target, limits, rng),
        None => search_greedy(goal, atlas, n, target, limits, rng),
    };
    recommendation.cut_suggestion = find_cut_candidate(atlas, &goal.requirement);
    if !recommendation.reached_target {
        log::debug!(
            "goal {} stays below {target:.2} after {} adds ({:.4})",
            goal.id,
            recommendation.total_adds,
            recommendation.new_probability
        );
    }
    recommendation
}

/// Probability after appending `adds` sources; sites seen grows with the atlas.
fn evaluate_with_adds<R: Rng + ?Sized>(
    goal: &Goal,
    atlas: &Atlas,
    n: usize,
    adds: &PipVector,
    limits: &SearchLimits,
    rng: &mut R,
) -> f64 {
    let modified = atlas.with_added_sources(adds);
    let draws = n
        .saturating_add(u32_to_usize(adds.total()))
        .min(modified.site_count());
    evaluate_uncached(goal, &modified, draws, limits.trials, limits.deadline, rng).probability
}

fn search_single<R: Rng + ?Sized>(
    goal: &Goal,
    element: Element,
    atlas: &Atlas,
    n: usize,
    target: f64,
    limits: &SearchLimits,
    rng: &mut R,
) -> Recommendation {
    let mut last = None;
    for adds in 1..=limits.single_element_add_cap {
        let candidate = PipVector::single(element, adds);
        let probability = evaluate_with_adds(goal, atlas, n, &candidate, limits, rng);
        last = Some((candidate, probability));
        if probability >= target {
            break;
        }
    }
    finish(goal, atlas, n, target, limits, rng, last)
}

fn search_greedy<R: Rng + ?Sized>(
    goal: &Goal,
    atlas: &Atlas,
    n: usize,
    target: f64,
    limits: &SearchLimits,
    rng: &mut R,
) -> Recommendation {
    let counts = atlas.source_counts();
    let mut add_sources = PipVector::default();
    let mut last = None;
    for _ in 0..limits.multi_element_add_cap {
        let Some(weakest) = weakest_element(&goal.requirement, &counts, &add_sources) else {
            break;
        };
        add_sources.add(weakest, 1);
        let probability = evaluate_with_adds(goal, atlas, n, &add_sources, limits, rng);
        last = Some((add_sources, probability));
        if probability >= target {
            break;
        }
    }
    finish(goal, atlas, n, target, limits, rng, last)
}

/// Wrap the last candidate tried, or the unmodified atlas when none was.
fn finish<R: Rng + ?Sized>(
    goal: &Goal,
    atlas: &Atlas,
    n: usize,
    target: f64,
    limits: &SearchLimits,
    rng: &mut R,
    last: Option<(PipVector, f64)>,
) -> Recommendation {
    let (add_sources, new_probability) = last.unwrap_or_else(|| {
        let none = PipVector::default();
        (none, evaluate_with_adds(goal, atlas, n, &none, limits, rng))
    });
    Recommendation {
        add_sources,
        total_adds: add_sources.total(),
        cut_suggestion: None,
        new_probability,
        reached_target: new_probability >= target,
    }
}

/// Required element with the lowest `(sources + adds) / required` ratio;
/// ties go to the earliest element in canonical order.
fn weakest_element(
    requirement: &PipVector,
    counts: &PipVector,
    adds: &PipVector,
) -> Option<Element> {
    let mut weakest: Option<(Element, f64)> = None;
    for element in requirement.active_elements() {
        let have = f64::from(counts.get(element).saturating_add(adds.get(element)));
        let ratio = have / f64::from(requirement.get(element));
        if weakest.is_none_or(|(_, best)| ratio < best) {
            weakest = Some((element, ratio));
        }
    }
    weakest.map(|(element, _)| element)
}

/// The non-required element with the most sources, if it has any.
///
/// Ties keep the earliest element in canonical order.
#[must_use]
pub fn find_cut_candidate(atlas: &Atlas, requirement: &PipVector) -> Option<CutSuggestion> {
    let counts = atlas.source_counts();
    let mut best: Option<Element> = None;
    let mut best_count = 0;
    for element in ELEMENTS {
        if requirement.get(element) > 0 {
            continue;
        }
        let count = counts.get(element);
        if count > best_count {
            best = Some(element);
            best_count = count;
        }
    }
    best.map(|element| CutSuggestion { element, count: 1 })
}
