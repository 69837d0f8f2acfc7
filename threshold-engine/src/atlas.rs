//! The atlas: every draw-eligible site copy and its aggregate pip totals.
use serde::{Deserialize, Serialize};

use crate::card::FormattedCard;
use crate::constants::OPENING_SITES;
use crate::element::{ELEMENTS, Element, PipVector};
use crate::numbers::u32_to_usize;

/// One physical copy of a site card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub pips: PipVector,
}

impl Site {
    #[must_use]
    pub fn new(name: &str, pips: PipVector) -> Self {
        Self {
            name: name.to_string(),
            pips,
        }
    }

    /// Synthetic single-pip site used for hypothetical atlases.
    #[must_use]
    pub fn synthetic(element: Element) -> Self {
        Self {
            name: format!("+{element} source"),
            pips: PipVector::single(element, 1),
        }
    }
}

/// Multiset of sites available to be drawn, plus per-element pip totals.
///
/// Built once per card-list snapshot; fields are private so the site count
/// and source totals always agree with `sites`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atlas {
    sites: Vec<Site>,
    source_counts: PipVector,
}

impl Atlas {
    /// Build from already-expanded sites.
    #[must_use]
    pub fn from_sites(sites: Vec<Site>) -> Self {
        let source_counts = sites
            .iter()
            .fold(PipVector::default(), |acc, site| acc.plus(&site.pips));
        Self {
            sites,
            source_counts,
        }
    }

    #[must_use]
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Population size `N`.
    #[must_use]
    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Total pip mass per element (not the number of sites).
    #[must_use]
    pub const fn source_counts(&self) -> PipVector {
        self.source_counts
    }

    /// Number of sites with at least one pip of `element`.
    #[must_use]
    pub fn sites_with(&self, element: Element) -> usize {
        self.sites
            .iter()
            .filter(|site| site.pips.get(element) >= 1)
            .count()
    }

    /// True when every site contributes 0 or 1 pip of `element`.
    #[must_use]
    pub fn is_binary_for(&self, element: Element) -> bool {
        self.sites.iter().all(|site| site.pips.get(element) <= 1)
    }

    /// Per-site pip counts for one element, in site order.
    #[must_use]
    pub fn pip_column(&self, element: Element) -> Vec<u32> {
        self.sites.iter().map(|site| site.pips.get(element)).collect()
    }

    /// Copy of this atlas with `adds` synthetic single-pip sites appended.
    #[must_use]
    pub fn with_added_sources(&self, adds: &PipVector) -> Self {
        let extra = u32_to_usize(adds.total());
        let mut sites = Vec::with_capacity(self.sites.len() + extra);
        sites.extend_from_slice(&self.sites);
        for (element, count) in adds.iter() {
            sites.extend((0..count).map(|_| Site::synthetic(element)));
        }
        Self {
            sites,
            source_counts: self.source_counts.plus(adds),
        }
    }

    /// Sites seen by `turn`; see [`default_n_seen`].
    #[must_use]
    pub fn default_n_seen(&self, turn: u32) -> usize {
        default_n_seen(self, turn)
    }

    #[must_use]
    pub fn summary(&self) -> AtlasSummary {
        AtlasSummary {
            site_count: self.site_count(),
            source_counts: self.source_counts,
        }
    }
}

/// Build an atlas from a formatted card list.
///
/// Only site cards contribute; each is expanded by its quantity.
#[must_use]
pub fn build_atlas(cards: &[FormattedCard]) -> Atlas {
    let mut sites = Vec::new();
    for card in cards.iter().filter(|card| card.is_site()) {
        let pips = card.thresholds();
        sites.extend((0..card.quantity).map(|_| Site::new(&card.name, pips)));
    }
    Atlas::from_sites(sites)
}

/// Sites seen by a turn: three in the opening draw, one more per later turn,
/// never more than the atlas holds.
#[must_use]
pub fn default_n_seen(atlas: &Atlas, turn: u32) -> usize {
    let seen = u32_to_usize(turn.saturating_add(2)).max(OPENING_SITES);
    seen.min(atlas.site_count())
}

/// Size and pip totals of an atlas, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasSummary {
    pub site_count: usize,
    pub source_counts: PipVector,
}

impl std::fmt::Display for AtlasSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let plural = if self.site_count == 1 { "" } else { "s" };
        write!(f, "{} site{plural}", self.site_count)?;
        let parts: Vec<String> = ELEMENTS
            .iter()
            .filter_map(|&element| {
                let count = self.source_counts.get(element);
                (count > 0).then(|| {
                    let plural = if count == 1 { "" } else { "s" };
                    format!("{count} {} pip{plural}", element.label())
                })
            })
            .collect();
        if !parts.is_empty() {
            write!(f, " ({})", parts.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::FormattedCard;

    fn fire(n: u32) -> PipVector {
        PipVector::single(Element::Fire, n)
    }

    #[test]
    fn build_atlas_reads_pips_and_quantities() {
        let cards = vec![
            FormattedCard::site("Fire Site", fire(1), 3),
            FormattedCard::site("Dual Site", PipVector::new(1, 0, 1, 0), 2),
            FormattedCard::site("Big Fire", fire(2), 1),
        ];
        let atlas = build_atlas(&cards);
        assert_eq!(atlas.site_count(), 6);
        assert_eq!(atlas.source_counts(), PipVector::new(7, 0, 2, 0));
        assert_eq!(atlas.sites_with(Element::Fire), 6);
        assert!(!atlas.is_binary_for(Element::Fire));
        assert!(atlas.is_binary_for(Element::Earth));
    }

    #[test]
    fn non_site_cards_are_ignored() {
        let cards = vec![
            FormattedCard::site("Fire Site", fire(1), 5),
            FormattedCard::spell("Fireball", Some(3), fire(2)),
        ];
        assert_eq!(build_atlas(&cards).site_count(), 5);
        let empty = build_atlas(&[]);
        assert!(empty.is_empty());
        assert!(empty.source_counts().is_zero());
    }

    #[test]
    fn added_sources_leave_original_untouched() {
        let atlas = build_atlas(&[FormattedCard::site("Blank", PipVector::default(), 4)]);
        let modified = atlas.with_added_sources(&PipVector::new(2, 0, 0, 1));
        assert_eq!(atlas.site_count(), 4);
        assert_eq!(modified.site_count(), 7);
        assert_eq!(modified.source_counts(), PipVector::new(2, 0, 0, 1));
        assert_eq!(modified.sites()[4].name, "+fire source");
        assert_eq!(modified.sites()[6].name, "+air source");
    }

    #[test]
    fn default_n_seen_grows_with_turn_and_clamps() {
        let thirty = build_atlas(&[FormattedCard::site("Blank", PipVector::default(), 30)]);
        let seen: Vec<usize> = (1..=5).map(|turn| thirty.default_n_seen(turn)).collect();
        assert_eq!(seen, vec![3, 4, 5, 6, 7]);
        assert_eq!(thirty.default_n_seen(0), 3);

        let four = build_atlas(&[FormattedCard::site("Blank", PipVector::default(), 4)]);
        assert_eq!(four.default_n_seen(1), 3);
        assert_eq!(four.default_n_seen(3), 4);
        assert_eq!(four.default_n_seen(9), 4);

        assert_eq!(default_n_seen(&Atlas::default(), 4), 0);
    }

    #[test]
    fn summary_lists_positive_elements() {
        let atlas = build_atlas(&[
            FormattedCard::site("Fire Site", fire(1), 10),
            FormattedCard::site("Spring", PipVector::single(Element::Water, 1), 1),
            FormattedCard::site("Blank", PipVector::default(), 19),
        ]);
        assert_eq!(
            atlas.summary().to_string(),
            "30 sites (10 Fire pips, 1 Water pip)"
        );
        assert_eq!(Atlas::default().summary().to_string(), "0 sites");
    }
}
