//! Threshold Reliability Engine
//!
//! Probability that a deck's resource sites meet the elemental thresholds of
//! its spells by a given turn. Single-element goals over 0/1-pip atlases are
//! computed exactly with the hypergeometric distribution; everything else is
//! estimated by Monte Carlo sampling. Failing goals get a recommendation for
//! extra sources. The crate has no I/O of its own; decks arrive through
//! [`DeckSource`].

pub mod atlas;
pub mod cache;
pub mod card;
pub mod config;
pub mod constants;
pub mod element;
pub mod evaluator;
pub mod goal;
pub mod hypergeometric;
pub mod numbers;
pub mod recommend;
pub mod rng;
pub mod simulation;

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

// Re-export commonly used types
pub use atlas::{Atlas, AtlasSummary, Site, build_atlas, default_n_seen};
pub use cache::{CacheKey, CacheStats, EvaluationCache};
pub use card::{CardType, DeckError, DeckList, FormattedCard};
pub use config::{AnalysisRequest, ConfigError, EvaluatorConfig, TurnOverride};
pub use element::{ELEMENTS, Element, PipVector};
pub use evaluator::{
    Evaluation, Evaluator, GoalReport, MathDetails, Method, choose_method, evaluate_uncached,
};
pub use goal::{CardNames, Goal, derive_goals};
pub use hypergeometric::{hypergeometric_at_least, log_n_choose_k};
pub use recommend::{CutSuggestion, Recommendation, SearchLimits, find_cut_candidate, recommend};
pub use rng::{CountingRng, RngStreams, SimRng, derive_stream_seed};
pub use simulation::{SimulationOutcome, SiteSampler, simulate, simulate_with_deadline};

/// Trait for abstracting deck loading
/// Platform-specific implementations should provide this
pub trait DeckSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the current deck's formatted card list
    ///
    /// # Errors
    ///
    /// Returns an error if the deck cannot be read or parsed.
    fn load_deck(&self) -> Result<DeckList, Self::Error>;
}

/// Atlas and goals derived from one version of a deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckSnapshot {
    pub name: Option<String>,
    pub atlas: Atlas,
    pub goals: Vec<Goal>,
    /// Hash of the card list; changes whenever the deck does.
    pub fingerprint: u64,
}

impl DeckSnapshot {
    #[must_use]
    pub fn from_deck(deck: &DeckList) -> Self {
        Self {
            name: deck.name.clone(),
            atlas: build_atlas(&deck.cards),
            goals: derive_goals(&deck.cards),
            fingerprint: deck_fingerprint(&deck.cards),
        }
    }
}

/// Stable XxHash64 of a card list.
#[must_use]
pub fn deck_fingerprint(cards: &[FormattedCard]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    cards.hash(&mut hasher);
    hasher.finish()
}

/// Full analysis of one deck against one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdReport {
    pub deck_name: Option<String>,
    pub atlas: AtlasSummary,
    pub target: f64,
    pub turn: TurnOverride,
    pub results: Vec<GoalReport>,
}

impl ThresholdReport {
    /// Goals below target.
    pub fn failing(&self) -> impl Iterator<Item = &GoalReport> + '_ {
        self.results.iter().filter(|result| !result.passes)
    }

    #[must_use]
    pub fn fail_count(&self) -> usize {
        self.failing().count()
    }

    #[must_use]
    pub fn all_pass(&self) -> bool {
        self.results.iter().all(|result| result.passes)
    }
}

/// Main engine tying a deck source to a caching evaluator
pub struct ReliabilityEngine<S>
where
    S: DeckSource,
{
    source: S,
    evaluator: Evaluator,
    fingerprint: Option<u64>,
}

impl<S> ReliabilityEngine<S>
where
    S: DeckSource,
{
    /// Create a new engine with the provided deck source and evaluator
    pub const fn new(source: S, evaluator: Evaluator) -> Self {
        Self {
            source,
            evaluator,
            fingerprint: None,
        }
    }

    /// Load the deck and evaluate every goal
    ///
    /// # Errors
    ///
    /// Returns an error if the deck cannot be loaded.
    pub fn analyze(&mut self, request: &AnalysisRequest) -> Result<ThresholdReport, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let deck = self.source.load_deck().map_err(Into::into)?;
        Ok(self.analyze_deck(&deck, request))
    }

    /// Evaluate an in-memory card list
    pub fn analyze_cards(
        &mut self,
        cards: &[FormattedCard],
        request: &AnalysisRequest,
    ) -> ThresholdReport {
        self.analyze_deck(&DeckList::new(cards.to_vec()), request)
    }

    /// Evaluate an already-loaded deck
    pub fn analyze_deck(&mut self, deck: &DeckList, request: &AnalysisRequest) -> ThresholdReport {
        let snapshot = DeckSnapshot::from_deck(deck);
        self.analyze_snapshot(&snapshot, request)
    }

    /// Evaluate a snapshot, dropping cached results if the deck changed
    pub fn analyze_snapshot(
        &mut self,
        snapshot: &DeckSnapshot,
        request: &AnalysisRequest,
    ) -> ThresholdReport {
        if self.fingerprint != Some(snapshot.fingerprint) {
            if self.fingerprint.is_some() {
                log::debug!("deck changed; clearing evaluation cache");
            }
            self.evaluator.clear_cache();
            self.fingerprint = Some(snapshot.fingerprint);
        }
        let results = self.evaluator.evaluate_all_goals(
            &snapshot.goals,
            &snapshot.atlas,
            request.turn,
            request.target,
        );
        log::info!(
            "analyzed {} goals over {}; {} below {:.0}%",
            results.len(),
            snapshot.atlas.summary(),
            results.iter().filter(|result| !result.passes).count(),
            request.target * 100.0
        );
        ThresholdReport {
            deck_name: snapshot.name.clone(),
            atlas: snapshot.atlas.summary(),
            target: request.target,
            turn: request.turn,
            results,
        }
    }

    #[must_use]
    pub const fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub const fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, thiserror::Error)]
    #[error("deck unavailable")]
    struct Unavailable;

    struct MemorySource {
        deck: RefCell<Option<DeckList>>,
    }

    impl MemorySource {
        fn new(cards: Vec<FormattedCard>) -> Self {
            Self {
                deck: RefCell::new(Some(DeckList::new(cards))),
            }
        }

        fn replace(&self, cards: Vec<FormattedCard>) {
            *self.deck.borrow_mut() = Some(DeckList::new(cards));
        }
    }

    impl DeckSource for MemorySource {
        type Error = Unavailable;

        fn load_deck(&self) -> Result<DeckList, Self::Error> {
            self.deck.borrow().clone().ok_or(Unavailable)
        }
    }

    fn cards(fire_sites: u32) -> Vec<FormattedCard> {
        vec![
            FormattedCard::site("Fire Site", PipVector::single(Element::Fire, 1), fire_sites),
            FormattedCard::site("Blank Site", PipVector::default(), 30 - fire_sites),
            FormattedCard::spell("Fireball", Some(3), PipVector::single(Element::Fire, 1)),
        ]
    }

    fn engine(source: MemorySource) -> ReliabilityEngine<MemorySource> {
        let evaluator = Evaluator::new(EvaluatorConfig {
            trials: 2_000,
            recommend_trials: 1_000,
            seed: Some(7),
            ..EvaluatorConfig::default()
        })
        .unwrap();
        ReliabilityEngine::new(source, evaluator)
    }

    #[test]
    fn analyze_reports_every_goal() {
        let mut engine = engine(MemorySource::new(cards(10)));
        let report = engine.analyze(&AnalysisRequest::default()).unwrap();
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.atlas.site_count, 30);
        assert_eq!(report.results[0].evaluation.method(), Method::Exact);
        assert_eq!(report.fail_count() == 0, report.all_pass());
    }

    #[test]
    fn unchanged_deck_reuses_cache() {
        let mut engine = engine(MemorySource::new(cards(10)));
        let request = AnalysisRequest::default();
        engine.analyze(&request).unwrap();
        engine.analyze(&request).unwrap();
        assert_eq!(engine.evaluator().computations(), 1);
        assert_eq!(engine.evaluator().cache_stats().hits, 1);
    }

    #[test]
    fn changed_deck_clears_cache() {
        let mut engine = engine(MemorySource::new(cards(10)));
        let request = AnalysisRequest::default();
        engine.analyze(&request).unwrap();
        engine.source().replace(cards(12));
        engine.analyze(&request).unwrap();
        assert_eq!(engine.evaluator().computations(), 2);
        assert_eq!(engine.evaluator().cache_len(), 1);
    }

    #[test]
    fn source_errors_propagate() {
        let source = MemorySource::new(Vec::new());
        *source.deck.borrow_mut() = None;
        let mut engine = engine(source);
        let err = engine.analyze(&AnalysisRequest::default()).unwrap_err();
        assert_eq!(err.to_string(), "deck unavailable");
    }

    #[test]
    fn analyze_cards_skips_the_source() {
        let source = MemorySource::new(Vec::new());
        *source.deck.borrow_mut() = None;
        let mut engine = engine(source);
        let report = engine.analyze_cards(&cards(30), &AnalysisRequest::default());
        assert!(report.all_pass());
        assert!(report.deck_name.is_none());
    }

    #[test]
    fn fingerprint_tracks_card_changes() {
        let base = deck_fingerprint(&cards(10));
        assert_eq!(base, deck_fingerprint(&cards(10)));
        assert_ne!(base, deck_fingerprint(&cards(11)));
    }
}
