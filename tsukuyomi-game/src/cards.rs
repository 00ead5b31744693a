//! Card catalog: the fixed Hyakunin-Isshu reading set.
//!
//! The catalog is static reference data: 100 numbered poem cards plus the
//! joka read twice at the start of a session and one closing card at the end.
//! The special cards never take part in selection or shuffling.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::BTreeSet;

/// Numbers reserved for the fixed cards, outside the 1..=100 base range.
pub const JOKA_FIRST_NO: u8 = 101;
pub const JOKA_SECOND_NO: u8 = 102;
pub const CLOSING_NO: u8 = 103;

/// One card of the reading set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub no: u8,
    /// First kana of the kaminoku; the sound a player can react to.
    pub initial: char,
    pub tens_digit: u8,
    pub ones_digit: u8,
    pub kaminoku: String,
    pub shimonoku: String,
}

impl Card {
    /// Whether this is one of the fixed prefix/suffix cards.
    #[must_use]
    pub const fn is_special(&self) -> bool {
        self.no < 1 || self.no > 100
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog must contain exactly 100 cards, found {0}")]
    WrongCardCount(usize),
    #[error("card number {0} is out of range or duplicated")]
    BadCardNumber(u8),
    #[error("card {0} has an empty kaminoku")]
    EmptyVerse(u8),
}

#[derive(Debug, Deserialize)]
struct RawCard {
    no: u8,
    kaminoku: String,
    shimonoku: String,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    prefix: [RawCard; 2],
    cards: Vec<RawCard>,
    suffix: RawCard,
}

/// The full reading set: two fixed prefix cards, 100 base cards and one
/// fixed suffix card.
#[derive(Debug, Clone)]
pub struct CardCatalog {
    prefix: [Card; 2],
    base: Vec<Card>,
    suffix: Card,
}

static BUNDLED: Lazy<CardCatalog> = Lazy::new(|| {
    CardCatalog::from_json(include_str!("../assets/cards.json"))
        .expect("bundled cards.json should be valid")
});

impl CardCatalog {
    /// Parse a catalog from JSON and validate its shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, the card count is not 100,
    /// a card number is out of range or duplicated, or a verse is empty.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        if raw.cards.len() != 100 {
            return Err(CatalogError::WrongCardCount(raw.cards.len()));
        }

        let mut seen = BTreeSet::new();
        let mut base = Vec::with_capacity(raw.cards.len());
        for card in raw.cards {
            if !(1..=100).contains(&card.no) || !seen.insert(card.no) {
                return Err(CatalogError::BadCardNumber(card.no));
            }
            base.push(enrich(card)?);
        }

        let [p0, p1] = raw.prefix;
        Ok(Self {
            prefix: [enrich(p0)?, enrich(p1)?],
            base,
            suffix: enrich(raw.suffix)?,
        })
    }

    /// The catalog compiled into the binary.
    ///
    /// # Panics
    ///
    /// Panics if the bundled data is malformed, which is a build defect.
    #[must_use]
    pub fn bundled() -> &'static Self {
        &BUNDLED
    }

    #[must_use]
    pub fn prefix(&self) -> &[Card; 2] {
        &self.prefix
    }

    #[must_use]
    pub fn suffix(&self) -> &Card {
        &self.suffix
    }

    /// All 100 base cards, in catalog order.
    #[must_use]
    pub fn base_cards(&self) -> &[Card] {
        &self.base
    }

    /// Look up a base card by number.
    #[must_use]
    pub fn card(&self, no: u8) -> Option<&Card> {
        self.base.iter().find(|card| card.no == no)
    }

    /// Whether `no` names a known base card.
    #[must_use]
    pub fn is_base_no(&self, no: u8) -> bool {
        (1..=100).contains(&no)
    }

    /// The numbers of all base cards.
    #[must_use]
    pub fn all_base_nos(&self) -> BTreeSet<u8> {
        self.base.iter().map(|card| card.no).collect()
    }
}

fn enrich(raw: RawCard) -> Result<Card, CatalogError> {
    let initial = raw
        .kaminoku
        .chars()
        .next()
        .ok_or(CatalogError::EmptyVerse(raw.no))?;
    Ok(Card {
        no: raw.no,
        initial,
        tens_digit: (raw.no / 10) % 10,
        ones_digit: raw.no % 10,
        kaminoku: raw.kaminoku,
        shimonoku: raw.shimonoku,
    })
}
