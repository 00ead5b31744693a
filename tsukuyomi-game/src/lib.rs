//! Tsukuyomi Session Core
//!
//! Platform-agnostic session logic for the Tsukuyomi karuta reading drill.
//! This crate provides the card catalog, selection engine, deck builder,
//! navigation state and persistence without UI or platform-specific
//! dependencies; the web crate wires it to the browser.

pub mod cards;
pub mod controller;
pub mod deck;
pub mod selection;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use cards::{Card, CardCatalog, CatalogError};
pub use controller::{AlwaysConfirm, COMMIT_PROMPT, Confirm, DrillController, RESHUFFLE_PROMPT};
pub use deck::{Indicator, PlayableCard, build_deck, shuffled_order};
pub use selection::{
    DigitPlace, DraftSelection, SelectionError, TopUpOutcome, digit_matches, initial_matches,
};
pub use session::{CardSelectionState, Session};
pub use storage::{
    LEGACY_STORAGE_KEY, MemoryStore, STORAGE_KEY, SaveData, SessionArchive, StateStore,
};
