//! Monte Carlo pip-sum estimator.
//!
//! Each trial draws a uniformly random subset of `n` distinct sites, sums the
//! pips of every required element over the subset and succeeds when all sums
//! meet the requirement. Used whenever the exact model does not apply:
//! multi-pip sites or goals spanning several elements.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::atlas::Atlas;
use crate::constants::{DEADLINE_CHECK_INTERVAL, Z_95};
use crate::element::PipVector;
use crate::numbers::{clamp_probability, trials_to_f64};

/// Point estimate with a 95% normal-approximation interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub probability: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    /// Trials actually run; lower than requested when a deadline was hit.
    pub trials_run: u32,
}

impl SimulationOutcome {
    const fn empty() -> Self {
        Self {
            probability: 0.0,
            ci_low: 0.0,
            ci_high: 0.0,
            trials_run: 0,
        }
    }

    fn from_counts(successes: u32, trials: u32) -> Self {
        if trials == 0 {
            return Self::empty();
        }
        let total = trials_to_f64(trials);
        let p = trials_to_f64(successes) / total;
        let margin = Z_95 * (p * (1.0 - p) / total).sqrt();
        Self {
            probability: clamp_probability(p),
            ci_low: clamp_probability(p - margin),
            ci_high: clamp_probability(p + margin),
            trials_run: trials,
        }
    }

    /// Half-width of the confidence interval.
    #[must_use]
    pub fn margin(&self) -> f64 {
        (self.ci_high - self.ci_low) / 2.0
    }
}

/// Reusable draw buffer: partial Fisher-Yates over an index array with an
/// exact restore after every trial.
#[derive(Debug, Clone)]
pub struct SiteSampler {
    indices: Vec<usize>,
    swaps: Vec<usize>,
}

impl SiteSampler {
    #[must_use]
    pub fn new(population: usize) -> Self {
        Self {
            indices: (0..population).collect(),
            swaps: Vec::new(),
        }
    }

    /// Shuffle a uniform random `n`-subset into the front of the buffer and
    /// return it. Call [`SiteSampler::restore`] before the next draw.
    pub fn draw<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> &[usize] {
        let population = self.indices.len();
        let n = n.min(population);
        self.swaps.clear();
        for i in 0..n {
            let j = rng.gen_range(i..population);
            self.indices.swap(i, j);
            self.swaps.push(j);
        }
        &self.indices[..n]
    }

    /// Undo the swaps of the last draw, leaving the identity permutation.
    pub fn restore(&mut self) {
        for (i, &j) in self.swaps.iter().enumerate().rev() {
            self.indices.swap(i, j);
        }
        self.swaps.clear();
    }

    #[cfg(test)]
    fn is_identity(&self) -> bool {
        self.indices.iter().enumerate().all(|(i, &v)| i == v)
    }
}

/// Estimate P(every required element's pip sum ≥ requirement) over `trials`
/// draws of `n_seen` sites.
pub fn simulate<R: Rng + ?Sized>(
    atlas: &Atlas,
    n_seen: usize,
    requirement: &PipVector,
    trials: u32,
    rng: &mut R,
) -> SimulationOutcome {
    simulate_with_deadline(atlas, n_seen, requirement, trials, None, rng)
}

/// As [`simulate`], stopping early once `budget` has elapsed.
///
/// The estimate then comes from the trials already run and its interval is
/// correspondingly wider.
pub fn simulate_with_deadline<R: Rng + ?Sized>(
    atlas: &Atlas,
    n_seen: usize,
    requirement: &PipVector,
    trials: u32,
    budget: Option<Duration>,
    rng: &mut R,
) -> SimulationOutcome {
    let n = n_seen.min(atlas.site_count());
    if n == 0 {
        return SimulationOutcome::empty();
    }

    let columns: Vec<(Vec<u32>, u32)> = requirement
        .iter()
        .filter(|&(_, needed)| needed > 0)
        .map(|(element, needed)| (atlas.pip_column(element), needed))
        .collect();
    let deadline = budget.map(|budget| Instant::now() + budget);
    let mut sampler = SiteSampler::new(atlas.site_count());
    let mut successes = 0_u32;
    let mut run = 0_u32;

    while run < trials {
        if run % DEADLINE_CHECK_INTERVAL == 0
            && let Some(deadline) = deadline
            && Instant::now() >= deadline
        {
            log::warn!("simulation deadline hit after {run} of {trials} trials");
            break;
        }
        let drawn = sampler.draw(n, rng);
        let pass = columns.iter().all(|(pips, needed)| {
            let sum = drawn
                .iter()
                .fold(0_u32, |acc, &site| acc.saturating_add(pips[site]));
            sum >= *needed
        });
        if pass {
            successes += 1;
        }
        sampler.restore();
        run += 1;
    }

    SimulationOutcome::from_counts(successes, run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::Site;
    use crate::element::Element;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn atlas_with(fire_sites: usize, big_fire: usize, blanks: usize) -> Atlas {
        let mut sites = Vec::new();
        sites.extend(
            (0..fire_sites).map(|_| Site::new("Fire", PipVector::single(Element::Fire, 1))),
        );
        sites.extend(
            (0..big_fire).map(|_| Site::new("Big Fire", PipVector::single(Element::Fire, 2))),
        );
        sites.extend((0..blanks).map(|_| Site::new("Blank", PipVector::default())));
        Atlas::from_sites(sites)
    }

    #[test]
    fn sampler_restores_identity() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut sampler = SiteSampler::new(12);
        for n in [0, 1, 5, 12, 20] {
            let drawn = sampler.draw(n, &mut rng).to_vec();
            let mut unique = drawn.clone();
            unique.sort_unstable();
            unique.dedup();
            assert_eq!(unique.len(), drawn.len());
            sampler.restore();
            assert!(sampler.is_identity());
        }
    }

    #[test]
    fn sampler_draws_every_subset_uniformly() {
        // 4 choose 2 = 6 subsets, each expected 1/6 of the time.
        let mut rng = SmallRng::seed_from_u64(11);
        let mut sampler = SiteSampler::new(4);
        let mut counts = std::collections::HashMap::new();
        let draws = 60_000;
        for _ in 0..draws {
            let mut pair = sampler.draw(2, &mut rng).to_vec();
            pair.sort_unstable();
            *counts.entry(pair).or_insert(0_u32) += 1;
            sampler.restore();
        }
        assert_eq!(counts.len(), 6);
        for count in counts.values() {
            let share = f64::from(*count) / f64::from(draws);
            assert!((share - 1.0 / 6.0).abs() < 0.01, "share {share}");
        }
    }

    #[test]
    fn empty_draw_returns_zero_width_interval() {
        let mut rng = SmallRng::seed_from_u64(1);
        let outcome = simulate(
            &Atlas::default(),
            3,
            &PipVector::single(Element::Fire, 1),
            1_000,
            &mut rng,
        );
        assert_eq!(outcome, SimulationOutcome::empty());

        let atlas = atlas_with(5, 0, 5);
        let outcome = simulate(&atlas, 0, &PipVector::single(Element::Fire, 1), 1_000, &mut rng);
        assert!(outcome.probability.abs() < f64::EPSILON);
        assert!(outcome.margin().abs() < f64::EPSILON);
    }

    #[test]
    fn multi_pip_site_can_meet_threshold_alone() {
        // One fire=2 site among 30; drawing one site meets fire>=2 about 1/30 of the time.
        let mut rng = SmallRng::seed_from_u64(0x5EED);
        let atlas = atlas_with(0, 1, 29);
        let outcome = simulate(&atlas, 1, &PipVector::single(Element::Fire, 2), 50_000, &mut rng);
        assert!(outcome.probability > 0.01 && outcome.probability < 0.08);
        assert!(outcome.ci_low <= outcome.probability && outcome.probability <= outcome.ci_high);
        assert_eq!(outcome.trials_run, 50_000);
    }

    #[test]
    fn certain_and_impossible_requirements() {
        let mut rng = SmallRng::seed_from_u64(9);
        let all_fire = atlas_with(10, 0, 0);
        let certain = simulate(&all_fire, 3, &PipVector::single(Element::Fire, 3), 2_000, &mut rng);
        assert!((certain.probability - 1.0).abs() < f64::EPSILON);
        assert!(certain.margin().abs() < f64::EPSILON);

        let impossible = simulate(
            &all_fire,
            3,
            &PipVector::single(Element::Water, 1),
            2_000,
            &mut rng,
        );
        assert!(impossible.probability.abs() < f64::EPSILON);
    }

    #[test]
    fn huge_pip_counts_saturate() {
        let atlas = Atlas::from_sites(vec![
            Site::new("Volcano", PipVector::single(Element::Fire, u32::MAX)),
            Site::new("Volcano", PipVector::single(Element::Fire, u32::MAX)),
        ]);
        let mut rng = SmallRng::seed_from_u64(3);
        let needed = PipVector::single(Element::Fire, u32::MAX);
        let outcome = simulate(&atlas, 2, &needed, 100, &mut rng);
        assert!((outcome.probability - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_trials_and_zero_budget_yield_empty_outcome() {
        let mut rng = SmallRng::seed_from_u64(4);
        let atlas = atlas_with(5, 0, 5);
        let req = PipVector::single(Element::Fire, 1);
        assert_eq!(simulate(&atlas, 3, &req, 0, &mut rng).trials_run, 0);
        let outcome =
            simulate_with_deadline(&atlas, 3, &req, 10_000, Some(Duration::ZERO), &mut rng);
        assert_eq!(outcome.trials_run, 0);
        assert!(outcome.probability.abs() < f64::EPSILON);
    }
}
