//! Live drill session: the selection, its reading order and the cursor.
//!
//! The session owns the only mutable copy of the drill state. Action handlers
//! borrow it; nothing else keeps card state of its own. The derived deck is
//! rebuilt at every construction point so the invariants from the module
//! contract (manual ⊆ selected, order is a permutation of selected, cursor in
//! bounds) cannot drift.

use crate::cards::CardCatalog;
use crate::deck::{self, PlayableCard};
use rand::Rng;
use std::collections::BTreeSet;

/// Editor-facing state of one base card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardSelectionState {
    NotSelected,
    Selected,
    ManualAddition,
}

/// The running drill session.
#[derive(Debug, Clone)]
pub struct Session {
    selected: BTreeSet<u8>,
    manual: BTreeSet<u8>,
    order: Vec<u8>,
    current_index: usize,
    deck: Vec<PlayableCard>,
}

impl Session {
    /// Fresh default session: every base card, shuffled, cursor at the start.
    #[must_use]
    pub fn new_default(catalog: &CardCatalog, rng: &mut impl Rng) -> Self {
        let selected = catalog.all_base_nos();
        let order = deck::shuffled_order(&selected, rng);
        Self::assemble(catalog, selected, BTreeSet::new(), order, 0)
    }

    /// Rebuild a session from restored parts, reconciling anything a stale
    /// save could disagree on: the order is reduced to known selected cards,
    /// the selection to the order, manual marks to the selection, and the
    /// cursor is clamped into the playable range.
    #[must_use]
    pub fn from_parts(
        catalog: &CardCatalog,
        selected: BTreeSet<u8>,
        manual: BTreeSet<u8>,
        order: Vec<u8>,
        current_index: usize,
    ) -> Self {
        let order: Vec<u8> = order
            .into_iter()
            .filter(|no| selected.contains(no) && catalog.is_base_no(*no))
            .collect();
        let selected: BTreeSet<u8> = order.iter().copied().collect();
        let manual: BTreeSet<u8> = manual.intersection(&selected).copied().collect();
        Self::assemble(catalog, selected, manual, order, current_index)
    }

    fn assemble(
        catalog: &CardCatalog,
        selected: BTreeSet<u8>,
        manual: BTreeSet<u8>,
        order: Vec<u8>,
        current_index: usize,
    ) -> Self {
        let deck = deck::build_deck(catalog, &order, &selected, &manual);
        let mut session = Self {
            selected,
            manual,
            order,
            current_index,
            deck,
        };
        session.current_index = session.current_index.min(session.last_playable_index());
        session
    }

    #[must_use]
    pub fn selected(&self) -> &BTreeSet<u8> {
        &self.selected
    }

    #[must_use]
    pub fn manual(&self) -> &BTreeSet<u8> {
        &self.manual
    }

    #[must_use]
    pub fn order(&self) -> &[u8] {
        &self.order
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    /// Full deck length including the three fixed cards.
    #[must_use]
    pub fn playable_count(&self) -> usize {
        self.deck.len()
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Largest index the cursor may reach: the last card paired with a
    /// following upper verse.
    #[must_use]
    pub fn last_playable_index(&self) -> usize {
        self.deck.len().saturating_sub(2)
    }

    #[must_use]
    pub fn current_card(&self) -> &PlayableCard {
        &self.deck[self.current_index]
    }

    /// The card whose upper verse is read next; at the end of the deck this
    /// saturates on the final card.
    #[must_use]
    pub fn next_card(&self) -> &PlayableCard {
        &self.deck[(self.current_index + 1).min(self.deck.len() - 1)]
    }

    #[must_use]
    pub fn selection_state(&self, no: u8) -> CardSelectionState {
        if self.manual.contains(&no) {
            CardSelectionState::ManualAddition
        } else if self.selected.contains(&no) {
            CardSelectionState::Selected
        } else {
            CardSelectionState::NotSelected
        }
    }

    /// Step forward. Returns true when the cursor moved.
    pub fn advance(&mut self) -> bool {
        if self.current_index < self.last_playable_index() {
            self.current_index += 1;
            true
        } else {
            false
        }
    }

    /// Step backward. Returns true when the cursor moved.
    pub fn retreat(&mut self) -> bool {
        if self.current_index > 0 {
            self.current_index -= 1;
            true
        } else {
            false
        }
    }

    /// Re-deal the same selection in a fresh random order and rewind.
    pub fn reshuffle(&mut self, catalog: &CardCatalog, rng: &mut impl Rng) {
        self.order = deck::shuffled_order(&self.selected, rng);
        self.deck = deck::build_deck(catalog, &self.order, &self.selected, &self.manual);
        self.current_index = 0;
    }

    /// Swap in a committed draft selection: fresh shuffle, cursor rewound,
    /// deck rebuilt.
    pub fn replace_selection(
        &mut self,
        catalog: &CardCatalog,
        selected: BTreeSet<u8>,
        manual: BTreeSet<u8>,
        rng: &mut impl Rng,
    ) {
        self.order = deck::shuffled_order(&selected, rng);
        self.selected = selected;
        self.manual = manual;
        self.deck = deck::build_deck(catalog, &self.order, &self.selected, &self.manual);
        self.current_index = 0;
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

    #[test]
    fn default_session_holds_every_card() {
        let mut rng = SmallRng::seed_from_u64(1);
        let session = Session::new_default(catalog(), &mut rng);
        assert_eq!(session.selected_count(), 100);
        assert_eq!(session.playable_count(), 103);
        assert_eq!(session.current_index(), 0);
        assert!(session.manual().is_empty());
    }

    #[test]
    fn advance_and_retreat_respect_bounds() {
        let selected: BTreeSet<u8> = [1, 2, 3].into_iter().collect();
        let order = vec![1, 2, 3];
        let mut session =
            Session::from_parts(catalog(), selected, BTreeSet::new(), order, 0);

        assert!(!session.retreat());
        let last = session.last_playable_index();
        assert_eq!(last, 4); // 3 cards + 3 specials, minus the terminal pair
        for _ in 0..10 {
            session.advance();
        }
        assert_eq!(session.current_index(), last);
        assert!(!session.advance());
        assert!(session.retreat());
        assert_eq!(session.current_index(), last - 1);
    }

    #[test]
    fn next_card_saturates_at_deck_end() {
        let selected: BTreeSet<u8> = [1].into_iter().collect();
        let mut session =
            Session::from_parts(catalog(), selected, BTreeSet::new(), vec![1], 0);
        while session.advance() {}
        assert_eq!(session.current_index(), session.last_playable_index());
        assert_eq!(session.next_card().no, 103);
        session.advance();
        assert_eq!(session.next_card().no, 103);
    }

    #[test]
    fn from_parts_reconciles_stale_state() {
        let selected: BTreeSet<u8> = [1, 2, 3].into_iter().collect();
        let manual: BTreeSet<u8> = [2, 50].into_iter().collect();
        let order = vec![3, 1, 2, 77]; // 77 never selected
        let session = Session::from_parts(catalog(), selected, manual, order, 99);

        let expected_selected: BTreeSet<u8> = [1, 2, 3].into_iter().collect();
        let expected_manual: BTreeSet<u8> = [2].into_iter().collect();
        assert_eq!(session.order(), &[3, 1, 2]);
        assert_eq!(session.selected(), &expected_selected);
        assert_eq!(session.manual(), &expected_manual);
        assert_eq!(session.current_index(), session.last_playable_index());
    }

    #[test]
    fn reshuffle_keeps_the_selection_multiset() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut session = Session::new_default(catalog(), &mut rng);
        for _ in 0..5 {
            session.advance();
        }
        let before: BTreeSet<u8> = session.order().iter().copied().collect();
        session.reshuffle(catalog(), &mut rng);
        let after: BTreeSet<u8> = session.order().iter().copied().collect();
        assert_eq!(before, after);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn replace_selection_rebuilds_order_and_rewinds() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut session = Session::new_default(catalog(), &mut rng);
        for _ in 0..3 {
            session.advance();
        }
        let selected: BTreeSet<u8> = [5, 6, 7].into_iter().collect();
        let manual: BTreeSet<u8> = [6].into_iter().collect();
        session.replace_selection(catalog(), selected.clone(), manual, &mut rng);
        assert_eq!(session.selected(), &selected);
        assert_eq!(
            session.order().iter().copied().collect::<BTreeSet<u8>>(),
            selected
        );
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.playable_count(), 6);
    }
}
