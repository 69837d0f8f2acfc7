//! Bounded FIFO cache of goal evaluations.
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::atlas::Atlas;
use crate::element::PipVector;
use crate::evaluator::Evaluation;

/// Inputs that fully determine an evaluation: atlas shape, draws and requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub site_count: usize,
    pub source_counts: PipVector,
    pub n_seen: usize,
    pub requirement: PipVector,
}

impl CacheKey {
    /// Key for an evaluation; `n_seen` is clamped to the atlas size.
    #[must_use]
    pub fn new(atlas: &Atlas, n_seen: usize, requirement: &PipVector) -> Self {
        Self {
            site_count: atlas.site_count(),
            source_counts: atlas.source_counts(),
            n_seen: n_seen.min(atlas.site_count()),
            requirement: *requirement,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Evaluation cache evicting the oldest inserted entry once full.
#[derive(Debug, Clone)]
pub struct EvaluationCache {
    capacity: usize,
    entries: HashMap<CacheKey, Evaluation>,
    order: VecDeque<CacheKey>,
    stats: CacheStats,
}

impl EvaluationCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Look up an evaluation, recording a hit or miss.
    pub fn get(&mut self, key: &CacheKey) -> Option<&Evaluation> {
        if let Some(found) = self.entries.get(key) {
            self.stats.hits += 1;
            Some(found)
        } else {
            self.stats.misses += 1;
            None
        }
    }

    /// Whether `key` is cached, without touching the statistics.
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert an evaluation, evicting the oldest entry when at capacity.
    pub fn insert(&mut self, key: CacheKey, evaluation: Evaluation) {
        if self.entries.insert(key, evaluation).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                self.stats.evictions += 1;
                log::debug!("evaluation cache evicted {oldest:?}");
            }
        }
    }

    /// Drop every entry and reset statistics.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.stats = CacheStats::default();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::evaluator::MathDetails;

    fn key(n_seen: usize) -> CacheKey {
        CacheKey {
            site_count: 1_000,
            source_counts: PipVector::single(Element::Fire, 10),
            n_seen,
            requirement: PipVector::single(Element::Fire, 1),
        }
    }

    fn evaluation(probability: f64) -> Evaluation {
        Evaluation {
            probability,
            details: MathDetails::Exact {
                population: 1_000,
                successes: 10,
                draws: 3,
                required: 1,
                element: Element::Fire,
            },
        }
    }

    #[test]
    fn evicts_oldest_inserted_first() {
        let mut cache = EvaluationCache::new(200);
        for n in 0..=200 {
            cache.insert(key(n), evaluation(0.5));
        }
        assert_eq!(cache.len(), 200);
        assert!(!cache.contains(&key(0)));
        assert!(cache.contains(&key(1)));
        assert!(cache.contains(&key(200)));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn reads_do_not_refresh_position() {
        let mut cache = EvaluationCache::new(2);
        cache.insert(key(1), evaluation(0.1));
        cache.insert(key(2), evaluation(0.2));
        assert!(cache.get(&key(1)).is_some());
        cache.insert(key(3), evaluation(0.3));
        assert!(!cache.contains(&key(1)));
        assert!(cache.contains(&key(2)));
    }

    #[test]
    fn tracks_hits_and_misses_and_clears() {
        let mut cache = EvaluationCache::new(4);
        assert!(cache.get(&key(1)).is_none());
        cache.insert(key(1), evaluation(0.4));
        cache.insert(key(1), evaluation(0.4));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key(1)).is_some());
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                evictions: 0
            }
        );
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn key_clamps_draws_to_atlas_size() {
        let atlas = crate::atlas::build_atlas(&[crate::card::FormattedCard::site(
            "Blank",
            PipVector::default(),
            4,
        )]);
        let req = PipVector::single(Element::Fire, 1);
        assert_eq!(CacheKey::new(&atlas, 9, &req), CacheKey::new(&atlas, 4, &req));
    }
}
