//! Deck building: the playable reading sequence.
//!
//! A deck is always `prefix(2) + selected cards in order + suffix(1)`. The
//! cards in between carry an ordinal tag and an indicator derived from the
//! initials of the cards read after them. Decks are derived state and are
//! rebuilt whenever the selection or the order changes; they are never
//! persisted.

use crate::cards::CardCatalog;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{BTreeSet, HashSet};

/// Marker shown on a card in the reading view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Indicator {
    /// Nothing notable: a later card shares this card's initial.
    #[default]
    None,
    /// No later card shares the initial; the card is decided by its first
    /// sound alone.
    Single,
    /// Same uniqueness, but the card is a blank-card addition and is not on
    /// the field.
    NoSameSound,
}

/// One entry of the built reading sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableCard {
    pub no: u8,
    /// 1-based reading position; `None` for the fixed prefix/suffix cards.
    pub ordinal: Option<u32>,
    pub kaminoku: String,
    pub shimonoku: String,
    pub is_manual: bool,
    pub indicator: Indicator,
    initial: char,
}

impl PlayableCard {
    /// Upper verse with the ordinal tag prepended.
    #[must_use]
    pub fn display_kaminoku(&self) -> String {
        tag(self.ordinal, &self.kaminoku)
    }

    /// Lower verse with the ordinal tag prepended.
    #[must_use]
    pub fn display_shimonoku(&self) -> String {
        tag(self.ordinal, &self.shimonoku)
    }

    #[must_use]
    pub const fn is_special(&self) -> bool {
        self.ordinal.is_none()
    }
}

fn tag(ordinal: Option<u32>, verse: &str) -> String {
    match ordinal {
        Some(n) => format!("{n} {verse}"),
        None => verse.to_owned(),
    }
}

/// A fresh uniform permutation of the selected card numbers. The fixed
/// prefix/suffix cards are never part of the shuffle.
#[must_use]
pub fn shuffled_order(selected: &BTreeSet<u8>, rng: &mut impl Rng) -> Vec<u8> {
    let mut order: Vec<u8> = selected.iter().copied().collect();
    order.shuffle(rng);
    order
}

/// Build the playable sequence for `order`.
///
/// `order` entries that are not in `selected` are dropped rather than trusted;
/// a stale order can never smuggle a card back into play.
#[must_use]
pub fn build_deck(
    catalog: &CardCatalog,
    order: &[u8],
    selected: &BTreeSet<u8>,
    manual: &BTreeSet<u8>,
) -> Vec<PlayableCard> {
    let mut deck = Vec::with_capacity(order.len() + 3);
    for card in catalog.prefix() {
        deck.push(PlayableCard {
            no: card.no,
            ordinal: None,
            kaminoku: card.kaminoku.clone(),
            shimonoku: card.shimonoku.clone(),
            is_manual: false,
            indicator: Indicator::None,
            initial: card.initial,
        });
    }
    for &no in order {
        if !selected.contains(&no) {
            continue;
        }
        let Some(card) = catalog.card(no) else {
            continue;
        };
        let ordinal = u32::try_from(deck.len() - 1).unwrap_or(u32::MAX);
        deck.push(PlayableCard {
            no: card.no,
            ordinal: Some(ordinal),
            kaminoku: card.kaminoku.clone(),
            shimonoku: card.shimonoku.clone(),
            is_manual: manual.contains(&no),
            indicator: Indicator::None,
            initial: card.initial,
        });
    }
    let suffix = catalog.suffix();
    deck.push(PlayableCard {
        no: suffix.no,
        ordinal: None,
        kaminoku: suffix.kaminoku.clone(),
        shimonoku: suffix.shimonoku.clone(),
        is_manual: false,
        indicator: Indicator::None,
        initial: suffix.initial,
    });

    mark_indicators(&mut deck);
    deck
}

/// Scan from the end toward the start: a card whose initial no later card
/// shares is decided the moment its first sound is read.
fn mark_indicators(deck: &mut [PlayableCard]) {
    let mut seen = HashSet::new();
    for card in deck.iter_mut().rev() {
        if card.is_special() {
            continue;
        }
        if !seen.contains(&card.initial) {
            card.indicator = if card.is_manual {
                Indicator::NoSameSound
            } else {
                Indicator::Single
            };
        }
        seen.insert(card.initial);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn catalog() -> &'static CardCatalog {
        CardCatalog::bundled()
    }

    fn set(nos: &[u8]) -> BTreeSet<u8> {
        nos.iter().copied().collect()
    }

    #[test]
    fn deck_is_prefix_order_suffix() {
        let selected = set(&[10, 20, 30]);
        let deck = build_deck(catalog(), &[20, 10, 30], &selected, &BTreeSet::new());
        let nos: Vec<u8> = deck.iter().map(|card| card.no).collect();
        assert_eq!(nos, vec![101, 102, 20, 10, 30, 103]);
    }

    #[test]
    fn ordinals_start_at_one_and_skip_specials() {
        let selected = set(&[10, 20, 30]);
        let deck = build_deck(catalog(), &[20, 10, 30], &selected, &BTreeSet::new());
        let ordinals: Vec<Option<u32>> = deck.iter().map(|card| card.ordinal).collect();
        assert_eq!(
            ordinals,
            vec![None, None, Some(1), Some(2), Some(3), None]
        );
        assert!(deck[2].display_kaminoku().starts_with("1 "));
        assert_eq!(deck[0].display_kaminoku(), deck[0].kaminoku);
    }

    #[test]
    fn foreign_order_entries_are_dropped() {
        let selected = set(&[10, 20]);
        let deck = build_deck(catalog(), &[20, 99, 10], &selected, &BTreeSet::new());
        let nos: Vec<u8> = deck.iter().map(|card| card.no).collect();
        assert_eq!(nos, vec![101, 102, 20, 10, 103]);
        // ordinals close the gap
        assert_eq!(deck[3].ordinal, Some(2));
    }

    #[test]
    fn duplicate_initial_only_marks_latest_occurrence() {
        // 17 and 42 both open on ち; 1 opens on あ alone.
        let selected = set(&[1, 17, 42]);
        let deck = build_deck(catalog(), &[17, 42, 1], &selected, &BTreeSet::new());
        assert_eq!(deck[2].no, 17);
        assert_eq!(deck[2].indicator, Indicator::None);
        assert_eq!(deck[3].no, 42);
        assert_eq!(deck[3].indicator, Indicator::Single);
        assert_eq!(deck[4].indicator, Indicator::Single);
    }

    #[test]
    fn manual_addition_gets_no_same_sound() {
        let selected = set(&[1, 17]);
        let manual = set(&[17]);
        let deck = build_deck(catalog(), &[1, 17], &selected, &manual);
        assert_eq!(deck[3].no, 17);
        assert!(deck[3].is_manual);
        assert_eq!(deck[3].indicator, Indicator::NoSameSound);
        assert_eq!(deck[2].indicator, Indicator::Single);
    }

    #[test]
    fn specials_never_carry_indicators() {
        let selected = set(&[1]);
        let deck = build_deck(catalog(), &[1], &selected, &BTreeSet::new());
        assert_eq!(deck[0].indicator, Indicator::None);
        assert_eq!(deck[1].indicator, Indicator::None);
        assert_eq!(deck.last().unwrap().indicator, Indicator::None);
    }

    #[test]
    fn shuffle_preserves_the_multiset() {
        let mut rng = SmallRng::seed_from_u64(0xDECA_F0);
        let selected: BTreeSet<u8> = (1..=100).collect();
        let order = shuffled_order(&selected, &mut rng);
        assert_eq!(order.len(), 100);
        assert_eq!(order.iter().copied().collect::<BTreeSet<u8>>(), selected);
    }
}
