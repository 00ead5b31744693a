//! Selection engine: which base cards are in play.
//!
//! Editing always happens against a [`DraftSelection`], a working copy of the
//! live session's card sets. The controller commits or discards the draft as
//! a whole, so a cancelled edit leaves the session untouched.

use crate::cards::CardCatalog;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::BTreeSet;

/// Which digit of the card number a digit filter inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitPlace {
    Ones,
    Tens,
}

/// Recoverable, user-visible selection failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("digit filter needs exactly 5 digits, got {0}")]
    InvalidSelectionSize(usize),
    #[error("selection is empty")]
    EmptySelection,
    #[error("no cards left to add")]
    NoCandidates,
    #[error("no selection editor is open")]
    NoEditorOpen,
}

/// Result of a random top-up request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopUpOutcome {
    /// Every requested card was added.
    Added(usize),
    /// The candidate pool ran out; only this many cards were added.
    Partial(usize),
}

impl TopUpOutcome {
    #[must_use]
    pub const fn added(self) -> usize {
        match self {
            Self::Added(n) | Self::Partial(n) => n,
        }
    }
}

/// Cards whose tens/ones digit is in `digits`.
///
/// # Errors
///
/// Returns [`SelectionError::InvalidSelectionSize`] unless exactly 5 distinct
/// digits are given.
pub fn digit_matches(
    catalog: &CardCatalog,
    digits: &BTreeSet<u8>,
    place: DigitPlace,
) -> Result<BTreeSet<u8>, SelectionError> {
    if digits.len() != 5 {
        return Err(SelectionError::InvalidSelectionSize(digits.len()));
    }
    Ok(catalog
        .base_cards()
        .iter()
        .filter(|card| {
            let digit = match place {
                DigitPlace::Ones => card.ones_digit,
                DigitPlace::Tens => card.tens_digit,
            };
            digits.contains(&digit)
        })
        .map(|card| card.no)
        .collect())
}

/// Cards whose phonetic initial is in `initials`.
///
/// # Errors
///
/// Returns [`SelectionError::EmptySelection`] if no initial is given.
pub fn initial_matches(
    catalog: &CardCatalog,
    initials: &BTreeSet<char>,
) -> Result<BTreeSet<u8>, SelectionError> {
    if initials.is_empty() {
        return Err(SelectionError::EmptySelection);
    }
    Ok(catalog
        .base_cards()
        .iter()
        .filter(|card| initials.contains(&card.initial))
        .map(|card| card.no)
        .collect())
}

/// A working copy of the session's selection, mutated by the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftSelection {
    selected: BTreeSet<u8>,
    manual: BTreeSet<u8>,
    /// While on, newly added cards are tracked as blank-card additions.
    blank_mode: bool,
}

impl DraftSelection {
    #[must_use]
    pub fn new(selected: BTreeSet<u8>, manual: BTreeSet<u8>) -> Self {
        Self {
            selected,
            manual,
            blank_mode: false,
        }
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
    pub const fn blank_mode(&self) -> bool {
        self.blank_mode
    }

    pub fn set_blank_mode(&mut self, on: bool) {
        self.blank_mode = on;
    }

    #[must_use]
    pub fn is_selected(&self, no: u8) -> bool {
        self.selected.contains(&no)
    }

    #[must_use]
    pub fn is_manual(&self, no: u8) -> bool {
        self.manual.contains(&no)
    }

    /// Flip one card in or out of the selection. Returns true if the card is
    /// selected afterwards.
    pub fn toggle(&mut self, no: u8) -> bool {
        if self.selected.remove(&no) {
            self.manual.remove(&no);
            false
        } else {
            self.insert(no);
            true
        }
    }

    pub fn select_all(&mut self, catalog: &CardCatalog) {
        for no in catalog.all_base_nos() {
            self.insert(no);
        }
    }

    pub fn select_none(&mut self) {
        self.selected.clear();
        self.manual.clear();
    }

    /// Add every card whose digit in `place` is one of `digits`.
    /// Returns how many cards the filter newly added.
    ///
    /// # Errors
    ///
    /// See [`digit_matches`]; the draft is unchanged on error.
    pub fn apply_digit_filter(
        &mut self,
        catalog: &CardCatalog,
        digits: &BTreeSet<u8>,
        place: DigitPlace,
    ) -> Result<usize, SelectionError> {
        let matches = digit_matches(catalog, digits, place)?;
        Ok(self.insert_all(matches))
    }

    /// Add every card whose initial is one of `initials`.
    /// Returns how many cards the filter newly added.
    ///
    /// # Errors
    ///
    /// See [`initial_matches`]; the draft is unchanged on error.
    pub fn apply_initial_filter(
        &mut self,
        catalog: &CardCatalog,
        initials: &BTreeSet<char>,
    ) -> Result<usize, SelectionError> {
        let matches = initial_matches(catalog, initials)?;
        Ok(self.insert_all(matches))
    }

    /// Add up to `count` randomly drawn unselected cards, preferring cards
    /// whose initial already occurs in the selection before falling back to
    /// cards with an unseen initial.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::NoCandidates`] when every base card is
    /// already selected.
    pub fn top_up(
        &mut self,
        catalog: &CardCatalog,
        count: usize,
        rng: &mut impl Rng,
    ) -> Result<TopUpOutcome, SelectionError> {
        if count == 0 {
            return Ok(TopUpOutcome::Added(0));
        }

        let seen_initials: BTreeSet<char> = catalog
            .base_cards()
            .iter()
            .filter(|card| self.selected.contains(&card.no))
            .map(|card| card.initial)
            .collect();

        let mut familiar = Vec::new();
        let mut fresh = Vec::new();
        for card in catalog.base_cards() {
            if self.selected.contains(&card.no) {
                continue;
            }
            if seen_initials.contains(&card.initial) {
                familiar.push(card.no);
            } else {
                fresh.push(card.no);
            }
        }
        if familiar.is_empty() && fresh.is_empty() {
            return Err(SelectionError::NoCandidates);
        }

        familiar.shuffle(rng);
        fresh.shuffle(rng);

        let mut added = 0;
        for no in familiar.into_iter().chain(fresh) {
            if added == count {
                break;
            }
            self.insert(no);
            added += 1;
        }

        if added < count {
            Ok(TopUpOutcome::Partial(added))
        } else {
            Ok(TopUpOutcome::Added(added))
        }
    }

    /// Close the draft for committing.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::EmptySelection`] if nothing is selected;
    /// a session must always hold at least one card.
    pub fn finish(self) -> Result<(BTreeSet<u8>, BTreeSet<u8>), SelectionError> {
        if self.selected.is_empty() {
            return Err(SelectionError::EmptySelection);
        }
        Ok((self.selected, self.manual))
    }

    fn insert(&mut self, no: u8) {
        if self.selected.insert(no) && self.blank_mode {
            self.manual.insert(no);
        }
    }

    fn insert_all(&mut self, nos: BTreeSet<u8>) -> usize {
        let mut added = 0;
        for no in nos {
            if !self.selected.contains(&no) {
                self.insert(no);
                added += 1;
            }
        }
        added
    }
}
