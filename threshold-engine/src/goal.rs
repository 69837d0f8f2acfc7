//! Threshold goals derived from a deck's non-site cards.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

use crate::card::FormattedCard;
use crate::constants::{DEFAULT_CARD_COST, MAX_TARGET_TURN, MIN_TARGET_TURN};
use crate::element::{Element, PipVector};

/// Member card names stored inline for the common small case.
pub type CardNames = SmallVec<[String; 4]>;

/// Shared minimum-pip requirement across every card demanding the same vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// Canonical requirement key, e.g. `2-0-0-0`.
    pub id: String,
    pub requirement: PipVector,
    pub card_names: CardNames,
    /// Turn by which the requirement matters, in `1..=10`.
    pub target_turn: u8,
    pub is_multi_element: bool,
    pub active_element_count: usize,
}

impl Goal {
    /// Build a goal, deriving the id and element counts from `requirement`.
    #[must_use]
    pub fn new(requirement: PipVector, card_names: CardNames, target_turn: u8) -> Self {
        let active_element_count = requirement.active_count();
        Self {
            id: requirement.key(),
            requirement,
            card_names,
            target_turn: target_turn.clamp(MIN_TARGET_TURN, MAX_TARGET_TURN),
            is_multi_element: active_element_count > 1,
            active_element_count,
        }
    }

    /// The only required element of a single-element goal.
    #[must_use]
    pub fn single_element(&self) -> Option<Element> {
        if self.is_multi_element {
            return None;
        }
        self.requirement.active_elements().next()
    }
}

/// Clamp a card cost into the target-turn range.
fn turn_for_cost(cost: u32) -> u8 {
    let clamped = cost.clamp(u32::from(MIN_TARGET_TURN), u32::from(MAX_TARGET_TURN));
    u8::try_from(clamped).unwrap_or(MAX_TARGET_TURN)
}

/// Group non-site cards by identical requirement vectors.
///
/// Cards with no threshold are skipped. Goals keep the order in which their
/// first member appears; a goal's target turn is its cheapest member's cost,
/// with missing costs treated as 3.
#[must_use]
pub fn derive_goals(cards: &[FormattedCard]) -> Vec<Goal> {
    struct Group {
        requirement: PipVector,
        names: CardNames,
        lowest_cost: u32,
    }

    let mut groups: Vec<Group> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for card in cards.iter().filter(|card| !card.is_site()) {
        let requirement = card.thresholds();
        if requirement.is_zero() {
            continue;
        }
        let slot = *index_by_key.entry(requirement.key()).or_insert_with(|| {
            groups.push(Group {
                requirement,
                names: CardNames::new(),
                lowest_cost: u32::MAX,
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        if !group.names.iter().any(|name| name == &card.name) {
            group.names.push(card.name.clone());
        }
        group.lowest_cost = group
            .lowest_cost
            .min(card.cost.unwrap_or(DEFAULT_CARD_COST));
    }

    groups
        .into_iter()
        .map(|group| Goal::new(group.requirement, group.names, turn_for_cost(group.lowest_cost)))
        .collect()
}
