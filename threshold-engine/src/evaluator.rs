//! Goal evaluation: method selection, caching and pass/fail against a target.
//!
//! A single-element goal over an atlas where every site holds at most one pip
//! of that element is a plain hypergeometric draw and is computed exactly.
//! Anything else, multi-pip sites or several required elements, falls back to
//! the Monte Carlo pip-sum estimator.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::atlas::{Atlas, default_n_seen};
use crate::cache::{CacheKey, CacheStats, EvaluationCache};
use crate::config::{ConfigError, EvaluatorConfig, TurnOverride};
use crate::element::{Element, PipVector};
use crate::goal::Goal;
use crate::hypergeometric::hypergeometric_at_least;
use crate::numbers::probability_percent;
use crate::recommend::{Recommendation, SearchLimits, recommend};
use crate::rng::RngStreams;
use crate::simulation::simulate_with_deadline;

/// How a probability was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Exact,
    Simulated,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Simulated => write!(f, "simulated"),
        }
    }
}

/// Method-specific diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum MathDetails {
    Exact {
        /// `N`
        population: usize,
        /// `K`: sites with at least one pip of `element`.
        successes: usize,
        /// `n`
        draws: usize,
        /// `r`
        required: u32,
        element: Element,
    },
    Simulated {
        population: usize,
        draws: usize,
        requirement: PipVector,
        trials: u32,
        ci_low: f64,
        ci_high: f64,
    },
}

/// Probability of meeting a goal plus how it was computed.
///
/// Independent of any target; this is what the cache stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub probability: f64,
    pub details: MathDetails,
}

impl Evaluation {
    #[must_use]
    pub const fn method(&self) -> Method {
        match self.details {
            MathDetails::Exact { .. } => Method::Exact,
            MathDetails::Simulated { .. } => Method::Simulated,
        }
    }

    /// 95% interval, present for simulated results only.
    #[must_use]
    pub const fn confidence_interval(&self) -> Option<(f64, f64)> {
        match self.details {
            MathDetails::Exact { .. } => None,
            MathDetails::Simulated {
                ci_low, ci_high, ..
            } => Some((ci_low, ci_high)),
        }
    }

    /// Sites seen (`n`) used for this evaluation.
    #[must_use]
    pub const fn draws(&self) -> usize {
        match self.details {
            MathDetails::Exact { draws, .. } | MathDetails::Simulated { draws, .. } => draws,
        }
    }

    /// Probability as a whole percent.
    #[must_use]
    pub fn percent(&self) -> i32 {
        probability_percent(self.probability)
    }

    /// Human-readable description of the computation.
    #[must_use]
    pub fn explain(&self) -> String {
        match &self.details {
            MathDetails::Exact {
                population,
                successes,
                draws,
                required,
                element,
            } => format!(
                "Hypergeometric (exact): P(X >= {required}) where X ~ Hypergeometric(N={population}, K={successes}, n={draws}); \
                 K counts sites with >= 1 {} pip",
                element.label()
            ),
            MathDetails::Simulated {
                population,
                draws,
                requirement,
                trials,
                ci_low,
                ci_high,
            } => {
                let parts: Vec<String> = requirement
                    .iter()
                    .filter(|&(_, needed)| needed > 0)
                    .map(|(element, needed)| format!("{} pips >= {needed}", element.label()))
                    .collect();
                format!(
                    "Monte Carlo (pip-sum): {trials} trials drawing {draws} of {population} sites; \
                     requirement: {}; 95% CI [{:.1}%, {:.1}%]",
                    parts.join(", "),
                    ci_low * 100.0,
                    ci_high * 100.0
                )
            }
        }
    }
}

/// Evaluation of one goal against a caller-chosen target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalReport {
    pub goal: Goal,
    pub evaluation: Evaluation,
    pub passes: bool,
    /// Present only when the goal misses the target.
    pub recommendation: Option<Recommendation>,
}

/// The element to evaluate exactly, or `None` when the goal must be simulated.
fn exact_element(goal: &Goal, atlas: &Atlas) -> Option<Element> {
    goal.single_element()
        .filter(|&element| atlas.is_binary_for(element))
}

/// Exact for single-element goals over an atlas with 0/1 pips of that
/// element; simulated otherwise.
#[must_use]
pub fn choose_method(goal: &Goal, atlas: &Atlas) -> Method {
    if exact_element(goal, atlas).is_some() {
        Method::Exact
    } else {
        Method::Simulated
    }
}

/// Compute an evaluation without consulting any cache.
pub fn evaluate_uncached<R: Rng + ?Sized>(
    goal: &Goal,
    atlas: &Atlas,
    n_seen: usize,
    trials: u32,
    deadline: Option<Duration>,
    rng: &mut R,
) -> Evaluation {
    let population = atlas.site_count();
    let draws = n_seen.min(population);

    if let Some(element) = exact_element(goal, atlas) {
        let successes = atlas.sites_with(element);
        let required = goal.requirement.get(element);
        log::trace!("goal {} exact: N={population} K={successes} n={draws} r={required}", goal.id);
        return Evaluation {
            probability: hypergeometric_at_least(population, successes, draws, required),
            details: MathDetails::Exact {
                population,
                successes,
                draws,
                required,
                element,
            },
        };
    }

    log::trace!("goal {} simulated: N={population} n={draws}", goal.id);
    let outcome = simulate_with_deadline(atlas, draws, &goal.requirement, trials, deadline, rng);
    Evaluation {
        probability: outcome.probability,
        details: MathDetails::Simulated {
            population,
            draws,
            requirement: goal.requirement,
            trials: outcome.trials_run,
            ci_low: outcome.ci_low,
            ci_high: outcome.ci_high,
        },
    }
}

/// Evaluates goals for one deck snapshot, memoizing results.
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: EvaluatorConfig,
    cache: EvaluationCache,
    streams: RngStreams,
    computations: u64,
}

impl Evaluator {
    /// Build an evaluator from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(config: EvaluatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            cache: EvaluationCache::new(config.cache_capacity),
            streams: RngStreams::from_optional_seed(config.seed),
            computations: 0,
            config,
        })
    }

    /// Evaluator with default settings and a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        let config = EvaluatorConfig {
            seed: Some(seed),
            ..EvaluatorConfig::default()
        };
        Self {
            cache: EvaluationCache::new(config.cache_capacity),
            streams: RngStreams::from_user_seed(seed),
            computations: 0,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Probability that `n_seen` random sites meet the goal's requirement.
    ///
    /// Results are cached by atlas shape, clamped `n_seen` and requirement.
    pub fn evaluate_goal(&mut self, goal: &Goal, atlas: &Atlas, n_seen: usize) -> Evaluation {
        let key = CacheKey::new(atlas, n_seen, &goal.requirement);
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }
        let evaluation = evaluate_uncached(
            goal,
            atlas,
            key.n_seen,
            self.config.trials,
            self.config.deadline(),
            self.streams.simulation(),
        );
        self.computations += 1;
        log::debug!(
            "goal {} evaluated {} at n={}: {:.4}",
            goal.id,
            evaluation.method(),
            key.n_seen,
            evaluation.probability
        );
        self.cache.insert(key, evaluation.clone());
        evaluation
    }

    /// Evaluate every goal at its own turn (or the override), mark pass/fail
    /// against `target` and attach recommendations to failures.
    pub fn evaluate_all_goals(
        &mut self,
        goals: &[Goal],
        atlas: &Atlas,
        turn: TurnOverride,
        target: f64,
    ) -> Vec<GoalReport> {
        goals
            .iter()
            .map(|goal| {
                let effective_turn = turn.resolve(goal.target_turn);
                let n_seen = default_n_seen(atlas, u32::from(effective_turn));
                let evaluation = self.evaluate_goal(goal, atlas, n_seen);
                let passes = evaluation.probability >= target;
                let recommendation =
                    (!passes).then(|| self.recommend(goal, atlas, n_seen, target));
                GoalReport {
                    goal: goal.clone(),
                    evaluation,
                    passes,
                    recommendation,
                }
            })
            .collect()
    }

    /// Search for added sources that lift the goal to `target`.
    pub fn recommend(
        &mut self,
        goal: &Goal,
        atlas: &Atlas,
        n_seen: usize,
        target: f64,
    ) -> Recommendation {
        let limits = SearchLimits::from_config(&self.config);
        recommend(
            goal,
            atlas,
            n_seen,
            target,
            &limits,
            self.streams.recommendation(),
        )
    }

    /// Forget cached evaluations; call whenever the deck snapshot changes.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    #[must_use]
    pub const fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Evaluations actually computed (cache misses).
    #[must_use]
    pub const fn computations(&self) -> u64 {
        self.computations
    }

    /// Random draws consumed across all streams.
    #[must_use]
    pub const fn random_draws(&self) -> u64 {
        self.streams.total_draws()
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        let config = EvaluatorConfig::default();
        Self {
            cache: EvaluationCache::new(config.cache_capacity),
            streams: RngStreams::from_entropy(),
            computations: 0,
            config,
        }
    }
}
