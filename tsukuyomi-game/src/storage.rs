//! Persistence: versioned session snapshots in a key-value store.
//!
//! The store itself is a platform seam ([`StateStore`]): the web crate backs
//! it with localStorage, tests and native callers with [`MemoryStore`]. All
//! storage failures are logged and swallowed; a session that cannot be
//! persisted keeps running in memory. Corrupt or unrecognizable saved state
//! is never surfaced to the player, it just falls back to a fresh session.

use crate::cards::CardCatalog;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::cell::RefCell;

/// Key the current schema is stored under.
pub const STORAGE_KEY: &str = "tsukuyomi_state_v2";
/// Key of the retired v1 schema, migrated on first load after an upgrade.
pub const LEGACY_STORAGE_KEY: &str = "tsukuyomi_state_v1";

pub const SAVE_VERSION: u32 = 2;

/// Minimal string key-value store the session is persisted to.
pub trait StateStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the value stored under `key`, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be reached.
    fn read(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Write `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the value cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Remove `key`; removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be reached.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

/// In-memory store for tests and native callers without durable storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    type Error = Infallible;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// The persisted record, schema version 2. Field names are fixed wire
/// format; the derived deck is never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    pub version: u32,
    pub current_index: usize,
    pub order: Vec<u8>,
    pub selected_card_numbers: Vec<u8>,
    pub manual_addition_numbers: Vec<u8>,
}

impl SaveData {
    #[must_use]
    pub fn from_session(session: &Session) -> Self {
        Self {
            version: SAVE_VERSION,
            current_index: session.current_index(),
            order: session.order().to_vec(),
            selected_card_numbers: session.selected().iter().copied().collect(),
            manual_addition_numbers: session.manual().iter().copied().collect(),
        }
    }
}

/// Loose view of a stored v2 record, so presence of the individual fields
/// can be checked instead of failing the whole parse.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSaveData {
    version: Option<u32>,
    current_index: Option<usize>,
    order: Option<Vec<u8>>,
    selected_card_numbers: Option<Vec<u8>>,
    manual_addition_numbers: Option<Vec<u8>>,
}

impl RawSaveData {
    /// A record is usable only if all three card sequences are present and
    /// every ordered number names a known base card. An absent index reads
    /// as 0, matching the old startup behavior.
    fn validate(self, catalog: &CardCatalog) -> Option<SaveData> {
        let order = self.order?;
        let selected = self.selected_card_numbers?;
        let manual = self.manual_addition_numbers?;
        if !order.iter().all(|&no| catalog.is_base_no(no)) {
            return None;
        }
        Some(SaveData {
            version: self.version.unwrap_or(SAVE_VERSION),
            current_index: self.current_index.unwrap_or(0),
            order,
            selected_card_numbers: selected,
            manual_addition_numbers: manual,
        })
    }
}

/// The retired v1 record: a flat enriched card list plus a bare index.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LegacySave {
    current_index: Option<i64>,
    yomifudalist: Option<Vec<LegacyEntry>>,
}

#[derive(Debug, Deserialize)]
struct LegacyEntry {
    no: i64,
    #[allow(dead_code)]
    #[serde(default)]
    kaminoku: String,
    #[allow(dead_code)]
    #[serde(default)]
    shimonoku: String,
}

/// Rebuild a v2 record from a v1 one. The v1 list stored the whole reading
/// sequence including the two joka cards and the closing card, so the base
/// numbers are the body of the list; blank-card bookkeeping did not exist
/// yet. Returns `None` when the required shape is missing.
fn migrate_legacy(legacy: &LegacySave) -> Option<SaveData> {
    let index = legacy.current_index?;
    let list = legacy.yomifudalist.as_ref()?;
    if list.len() < 3 {
        return None;
    }
    let body = &list[2..list.len() - 1];
    let order: Vec<u8> = body
        .iter()
        .map(|entry| u8::try_from(entry.no))
        .collect::<Result<_, _>>()
        .ok()?;

    // v1 clamped its restore index to [0, len+1]; kept bit for bit even
    // though the live bound works out to the same value.
    let max_index = order.len() + 1;
    let current_index = usize::try_from(index).unwrap_or(0).min(max_index);

    Some(SaveData {
        version: SAVE_VERSION,
        current_index,
        order: order.clone(),
        selected_card_numbers: order,
        manual_addition_numbers: Vec::new(),
    })
}

/// Persistence adapter bound to one [`StateStore`].
#[derive(Debug, Default)]
pub struct SessionArchive<S: StateStore> {
    store: S,
}

impl<S: StateStore> SessionArchive<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Snapshot `session` into the store. Failures are logged and swallowed;
    /// the session keeps running in memory.
    pub fn save(&self, session: &Session) {
        let data = SaveData::from_session(session);
        match serde_json::to_string(&data) {
            Ok(payload) => {
                if let Err(err) = self.store.write(STORAGE_KEY, &payload) {
                    log::warn!("failed to persist session state: {err}");
                }
            }
            Err(err) => log::warn!("failed to serialize session state: {err}"),
        }
    }

    /// Restore the last saved record, migrating a v1 record forward when no
    /// v2 record exists. Anything unreadable or invalid yields `None`; state
    /// that parsed but failed validation is erased first.
    pub fn load(&self, catalog: &CardCatalog) -> Option<SaveData> {
        match self.store.read(STORAGE_KEY) {
            Ok(Some(raw)) => {
                let parsed: RawSaveData = serde_json::from_str(&raw).ok()?;
                match parsed.validate(catalog) {
                    Some(data) => Some(data),
                    None => {
                        self.clear();
                        None
                    }
                }
            }
            Ok(None) => self.load_legacy(catalog),
            Err(err) => {
                log::warn!("failed to read saved session state: {err}");
                None
            }
        }
    }

    fn load_legacy(&self, catalog: &CardCatalog) -> Option<SaveData> {
        let raw = match self.store.read(LEGACY_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("failed to read legacy session state: {err}");
                return None;
            }
        };
        let legacy: LegacySave = match serde_json::from_str(&raw) {
            Ok(legacy) => legacy,
            Err(_) => return None,
        };
        let Some(data) = migrate_legacy(&legacy) else {
            self.clear();
            return None;
        };

        // Carry the migrated record forward and retire the old key.
        match serde_json::to_string(&data) {
            Ok(payload) => {
                if let Err(err) = self.store.write(STORAGE_KEY, &payload) {
                    log::warn!("failed to write migrated session state: {err}");
                }
            }
            Err(err) => log::warn!("failed to serialize migrated state: {err}"),
        }
        if let Err(err) = self.store.remove(LEGACY_STORAGE_KEY) {
            log::warn!("failed to remove legacy session state: {err}");
        }

        if data.order.iter().all(|&no| catalog.is_base_no(no)) {
            Some(data)
        } else {
            self.clear();
            None
        }
    }

    /// Erase both the current and the legacy key. Idempotent; failures are
    /// logged and swallowed.
    pub fn clear(&self) {
        for key in [STORAGE_KEY, LEGACY_STORAGE_KEY] {
            if let Err(err) = self.store.remove(key) {
                log::warn!("failed to clear saved state under {key}: {err}");
            }
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}
