//! Elemental resource types and per-element pip vectors.
use serde::{Deserialize, Serialize};

/// One of the four elemental resources a site can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Water,
    Earth,
    Air,
}

/// Fixed iteration order used for keys, tie-breaking and display.
pub const ELEMENTS: [Element; 4] = [Element::Fire, Element::Water, Element::Earth, Element::Air];

impl Element {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fire => "Fire",
            Self::Water => "Water",
            Self::Earth => "Earth",
            Self::Air => "Air",
        }
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fire => write!(f, "fire"),
            Self::Water => write!(f, "water"),
            Self::Earth => write!(f, "earth"),
            Self::Air => write!(f, "air"),
        }
    }
}

/// Non-negative pip count per element.
///
/// Used for what a site provides, aggregate source counts, goal requirements
/// and recommended additions alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PipVector {
    #[serde(default)]
    pub fire: u32,
    #[serde(default)]
    pub water: u32,
    #[serde(default)]
    pub earth: u32,
    #[serde(default)]
    pub air: u32,
}

impl PipVector {
    #[must_use]
    pub const fn new(fire: u32, water: u32, earth: u32, air: u32) -> Self {
        Self {
            fire,
            water,
            earth,
            air,
        }
    }

    /// Vector with `count` pips of a single element and zero elsewhere.
    #[must_use]
    pub fn single(element: Element, count: u32) -> Self {
        let mut pips = Self::default();
        pips.set(element, count);
        pips
    }

    #[must_use]
    pub const fn get(&self, element: Element) -> u32 {
        match element {
            Element::Fire => self.fire,
            Element::Water => self.water,
            Element::Earth => self.earth,
            Element::Air => self.air,
        }
    }

    pub fn set(&mut self, element: Element, value: u32) {
        match element {
            Element::Fire => self.fire = value,
            Element::Water => self.water = value,
            Element::Earth => self.earth = value,
            Element::Air => self.air = value,
        }
    }

    /// Saturating in-place addition for one element.
    pub fn add(&mut self, element: Element, value: u32) {
        self.set(element, self.get(element).saturating_add(value));
    }

    /// Element-wise saturating sum.
    #[must_use]
    pub fn plus(&self, other: &Self) -> Self {
        let mut sum = *self;
        for (element, value) in other.iter() {
            sum.add(element, value);
        }
        sum
    }

    /// Pairs of (element, count) in fixed element order.
    pub fn iter(&self) -> impl Iterator<Item = (Element, u32)> + '_ {
        ELEMENTS.iter().map(move |&element| (element, self.get(element)))
    }

    /// Elements with a positive count, in fixed order.
    pub fn active_elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.iter()
            .filter(|&(_, value)| value > 0)
            .map(|(element, _)| element)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_elements().count()
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.fire == 0 && self.water == 0 && self.earth == 0 && self.air == 0
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.iter()
            .fold(0_u32, |acc, (_, value)| acc.saturating_add(value))
    }

    /// Canonical key: counts joined with `-` in element order, e.g. `2-0-0-0`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}-{}-{}-{}", self.fire, self.water, self.earth, self.air)
    }
}
