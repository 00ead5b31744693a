//! Drill controller: the single owner of session state.
//!
//! Every UI action funnels through here. The controller restores or builds
//! the session at startup, stages selection edits in a draft, consults the
//! [`Confirm`] gate before destructive actions, and persists the live session
//! after every mutation. The UI consumes its read-only projections and never
//! holds card state of its own.

use crate::cards::CardCatalog;
use crate::deck::PlayableCard;
use crate::selection::{DigitPlace, DraftSelection, SelectionError, TopUpOutcome};
use crate::session::{CardSelectionState, Session};
use crate::storage::{SessionArchive, StateStore};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::collections::BTreeSet;

/// Synchronous yes/no gate the controller consults before a destructive
/// action. The web layer backs this with `window.confirm`.
pub trait Confirm {
    fn confirm(&self, message: &str) -> bool;
}

/// Gate that always answers yes, for embedders without a prompt surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

pub const RESHUFFLE_PROMPT: &str = "読み札をシャッフルしますが，いいですか？";
pub const COMMIT_PROMPT: &str = "選んだ札で読み札を作り直しますが，いいですか？";

pub struct DrillController<S: StateStore> {
    catalog: &'static CardCatalog,
    session: Session,
    draft: Option<DraftSelection>,
    archive: SessionArchive<S>,
    rng: ChaCha20Rng,
}

impl<S: StateStore> DrillController<S> {
    /// Restore the saved session from `store`, or start a default one when
    /// nothing usable is saved. The RNG is entropy-seeded.
    pub fn new(store: S) -> Self {
        Self::with_rng(store, ChaCha20Rng::from_entropy())
    }

    /// Deterministic construction for tests and replay.
    pub fn with_seed(store: S, seed: u64) -> Self {
        Self::with_rng(store, ChaCha20Rng::seed_from_u64(seed))
    }

    fn with_rng(store: S, mut rng: ChaCha20Rng) -> Self {
        let catalog = CardCatalog::bundled();
        let archive = SessionArchive::new(store);
        let restored = archive.load(catalog).map(|data| {
            Session::from_parts(
                catalog,
                data.selected_card_numbers.into_iter().collect(),
                data.manual_addition_numbers.into_iter().collect(),
                data.order,
                data.current_index,
            )
        });
        // An active session never runs on an empty selection; a save that
        // reconciles down to nothing is as unusable as no save at all.
        let session = match restored.filter(|session| !session.selected().is_empty()) {
            Some(session) => session,
            None => {
                archive.clear();
                Session::new_default(catalog, &mut rng)
            }
        };
        let controller = Self {
            catalog,
            session,
            draft: None,
            archive,
            rng,
        };
        controller.archive.save(&controller.session);
        controller
    }

    // ---- projections -----------------------------------------------------

    #[must_use]
    pub fn current_card(&self) -> &PlayableCard {
        self.session.current_card()
    }

    #[must_use]
    pub fn next_card(&self) -> &PlayableCard {
        self.session.next_card()
    }

    #[must_use]
    pub fn playable_count(&self) -> usize {
        self.session.playable_count()
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.session.selected_count()
    }

    #[must_use]
    pub fn selection_state(&self, no: u8) -> CardSelectionState {
        self.session.selection_state(no)
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn draft(&self) -> Option<&DraftSelection> {
        self.draft.as_ref()
    }

    #[must_use]
    pub fn catalog(&self) -> &'static CardCatalog {
        self.catalog
    }

    #[must_use]
    pub fn archive(&self) -> &SessionArchive<S> {
        &self.archive
    }

    // ---- navigation ------------------------------------------------------

    /// Step to the next card. Returns true when the cursor moved; the UI
    /// reveals the timer affordance on movement.
    pub fn advance(&mut self) -> bool {
        let moved = self.session.advance();
        if moved {
            self.archive.save(&self.session);
        }
        moved
    }

    /// Step back to the previous card.
    pub fn retreat(&mut self) -> bool {
        let moved = self.session.retreat();
        if moved {
            self.archive.save(&self.session);
        }
        moved
    }

    /// Re-deal the current selection after the gate confirms. Returns true
    /// when the reshuffle happened.
    pub fn reshuffle(&mut self, gate: &impl Confirm) -> bool {
        if !gate.confirm(RESHUFFLE_PROMPT) {
            return false;
        }
        self.session.reshuffle(self.catalog, &mut self.rng);
        self.archive.save(&self.session);
        true
    }

    // ---- selection editing -----------------------------------------------

    /// Open the editor: stage a draft copy of the live selection. Reopening
    /// resets any previous draft.
    pub fn open_editor(&mut self) {
        self.draft = Some(DraftSelection::new(
            self.session.selected().clone(),
            self.session.manual().clone(),
        ));
    }

    pub fn cancel_draft(&mut self) {
        self.draft = None;
    }

    /// Commit the draft after the gate confirms: the live selection is
    /// replaced atomically, the deck re-dealt, and the cursor rewound.
    ///
    /// # Errors
    ///
    /// [`SelectionError::NoEditorOpen`] without an open draft,
    /// [`SelectionError::EmptySelection`] when the draft holds no cards;
    /// the draft stays open in both cases. Returns `Ok(false)` when the gate
    /// declines.
    pub fn commit_draft(&mut self, gate: &impl Confirm) -> Result<bool, SelectionError> {
        let draft = self.draft.as_ref().ok_or(SelectionError::NoEditorOpen)?;
        if draft.selected().is_empty() {
            return Err(SelectionError::EmptySelection);
        }
        if !gate.confirm(COMMIT_PROMPT) {
            return Ok(false);
        }
        // Checked non-empty above; the draft is consumed only past the gate.
        let draft = self.draft.take().ok_or(SelectionError::NoEditorOpen)?;
        let (selected, manual) = draft.finish()?;
        self.session
            .replace_selection(self.catalog, selected, manual, &mut self.rng);
        self.archive.save(&self.session);
        Ok(true)
    }

    /// Flip one card in the draft.
    ///
    /// # Errors
    ///
    /// [`SelectionError::NoEditorOpen`] without an open draft.
    pub fn toggle_card(&mut self, no: u8) -> Result<bool, SelectionError> {
        Ok(self.draft_mut()?.toggle(no))
    }

    /// # Errors
    ///
    /// [`SelectionError::NoEditorOpen`] without an open draft.
    pub fn select_all(&mut self) -> Result<(), SelectionError> {
        let catalog = self.catalog;
        self.draft_mut()?.select_all(catalog);
        Ok(())
    }

    /// # Errors
    ///
    /// [`SelectionError::NoEditorOpen`] without an open draft.
    pub fn select_none(&mut self) -> Result<(), SelectionError> {
        self.draft_mut()?.select_none();
        Ok(())
    }

    /// Toggle blank-card tracking for subsequent draft additions.
    ///
    /// # Errors
    ///
    /// [`SelectionError::NoEditorOpen`] without an open draft.
    pub fn set_blank_mode(&mut self, on: bool) -> Result<(), SelectionError> {
        self.draft_mut()?.set_blank_mode(on);
        Ok(())
    }

    /// Add all cards matching five digits in the given place.
    ///
    /// # Errors
    ///
    /// [`SelectionError::NoEditorOpen`] or any [`digit filter
    /// error`](crate::selection::digit_matches).
    pub fn filter_digits(
        &mut self,
        digits: &BTreeSet<u8>,
        place: DigitPlace,
    ) -> Result<usize, SelectionError> {
        let catalog = self.catalog;
        self.draft_mut()?.apply_digit_filter(catalog, digits, place)
    }

    /// Add all cards opening on one of the given initials.
    ///
    /// # Errors
    ///
    /// [`SelectionError::NoEditorOpen`] or any [`initial filter
    /// error`](crate::selection::initial_matches).
    pub fn filter_initials(&mut self, initials: &BTreeSet<char>) -> Result<usize, SelectionError> {
        let catalog = self.catalog;
        self.draft_mut()?.apply_initial_filter(catalog, initials)
    }

    /// Randomly add up to `count` unselected cards to the draft.
    ///
    /// # Errors
    ///
    /// [`SelectionError::NoEditorOpen`] or
    /// [`SelectionError::NoCandidates`].
    pub fn top_up(&mut self, count: usize) -> Result<TopUpOutcome, SelectionError> {
        let catalog = self.catalog;
        let rng = &mut self.rng;
        self.draft
            .as_mut()
            .ok_or(SelectionError::NoEditorOpen)?
            .top_up(catalog, count, rng)
    }

    fn draft_mut(&mut self) -> Result<&mut DraftSelection, SelectionError> {
        self.draft.as_mut().ok_or(SelectionError::NoEditorOpen)
    }
}
