//! Formatted card records supplied by the deck collaborator.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::element::PipVector;

/// Card type as reported by the deck data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Minion,
    Magic,
    Site,
    Aura,
    Artifact,
    #[serde(other)]
    Unknown,
}

/// One deck entry with its quantity and elemental thresholds.
///
/// For sites the thresholds are the pips the site provides; for every other
/// card they are the pips the card requires.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedCard {
    pub name: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    #[serde(default)]
    pub cost: Option<u32>,
    #[serde(default = "FormattedCard::default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub fire_threshold: u32,
    #[serde(default)]
    pub water_threshold: u32,
    #[serde(default)]
    pub earth_threshold: u32,
    #[serde(default)]
    pub air_threshold: u32,
}

impl FormattedCard {
    const fn default_quantity() -> u32 {
        1
    }

    /// Site card providing `pips`, expanded `quantity` times in the atlas.
    #[must_use]
    pub fn site(name: &str, pips: PipVector, quantity: u32) -> Self {
        Self::with_thresholds(name, CardType::Site, None, pips, quantity)
    }

    /// Non-site card requiring `thresholds`.
    #[must_use]
    pub fn spell(name: &str, cost: Option<u32>, thresholds: PipVector) -> Self {
        Self::with_thresholds(name, CardType::Minion, cost, thresholds, 1)
    }

    fn with_thresholds(
        name: &str,
        card_type: CardType,
        cost: Option<u32>,
        pips: PipVector,
        quantity: u32,
    ) -> Self {
        Self {
            name: name.to_string(),
            card_type,
            cost,
            quantity,
            fire_threshold: pips.fire,
            water_threshold: pips.water,
            earth_threshold: pips.earth,
            air_threshold: pips.air,
        }
    }

    #[must_use]
    pub fn is_site(&self) -> bool {
        self.card_type == CardType::Site
    }

    /// Threshold fields as a pip vector.
    #[must_use]
    pub const fn thresholds(&self) -> PipVector {
        PipVector::new(
            self.fire_threshold,
            self.water_threshold,
            self.earth_threshold,
            self.air_threshold,
        )
    }
}

/// Errors raised when a deck list cannot be accepted.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("deck json is invalid: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("card at position {index} has an empty name")]
    EmptyName { index: usize },
    #[error("card '{name}' has quantity 0")]
    ZeroQuantity { name: String },
}

/// A deck's formatted card list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckList {
    #[serde(default)]
    pub name: Option<String>,
    pub cards: Vec<FormattedCard>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeckListRepr {
    Bare(Vec<FormattedCard>),
    Named(DeckList),
}

impl DeckList {
    #[must_use]
    pub const fn new(cards: Vec<FormattedCard>) -> Self {
        Self { name: None, cards }
    }

    /// Parse a deck from JSON: either a bare card array or an object with `cards`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a card fails validation.
    pub fn from_json(json: &str) -> Result<Self, DeckError> {
        let deck = match serde_json::from_str::<DeckListRepr>(json)? {
            DeckListRepr::Bare(cards) => Self::new(cards),
            DeckListRepr::Named(deck) => deck,
        };
        deck.validate()?;
        Ok(deck)
    }

    /// Check card names and quantities.
    ///
    /// # Errors
    ///
    /// Returns the first offending card.
    pub fn validate(&self) -> Result<(), DeckError> {
        for (index, card) in self.cards.iter().enumerate() {
            if card.name.trim().is_empty() {
                return Err(DeckError::EmptyName { index });
            }
            if card.quantity == 0 {
                return Err(DeckError::ZeroQuantity {
                    name: card.name.clone(),
                });
            }
        }
        Ok(())
    }
}
