//! Browser-backed state store.
//!
//! Implements the core's [`StateStore`] seam over localStorage. When the
//! browser offers no storage (private mode, embedded webviews), every call
//! errors and the session core degrades to in-memory-only operation; the
//! player never sees it.

use crate::dom;
use tsukuyomi_game::StateStore;

/// Session store over `window.localStorage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStore;

#[derive(Debug, thiserror::Error)]
pub enum BrowserStoreError {
    #[error("localStorage unavailable: {0}")]
    Unavailable(String),
    #[error("localStorage operation failed: {0}")]
    Operation(String),
}

fn storage() -> Result<web_sys::Storage, BrowserStoreError> {
    dom::local_storage().map_err(|err| BrowserStoreError::Unavailable(dom::js_error_message(&err)))
}

impl StateStore for BrowserStore {
    type Error = BrowserStoreError;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        storage()?
            .get_item(key)
            .map_err(|err| BrowserStoreError::Operation(dom::js_error_message(&err)))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        storage()?
            .set_item(key, value)
            .map_err(|err| BrowserStoreError::Operation(dom::js_error_message(&err)))
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        storage()?
            .remove_item(key)
            .map_err(|err| BrowserStoreError::Operation(dom::js_error_message(&err)))
    }
}
