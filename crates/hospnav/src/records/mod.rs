//! JSON record collections kept in a [`KeyValueStore`].
//!
//! Each collection is a JSON array stored under one fixed key. Mutations are
//! plain functions over `Vec<T>`: load the whole array, change it in memory,
//! then write the whole array back with [`RecordStore::save_all`]. Two
//! writers on the same key are last-write-wins.

pub mod family;
pub mod medication;
pub mod recognition;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::storage::KeyValueStore;

pub use family::{FamilyMember, FamilyMemberForm, Relation};
pub use medication::Medication;
pub use recognition::MedicationRecognition;

/// A record type stored as one element of a JSON array.
pub trait Record: Serialize + DeserializeOwned {
    /// The storage key holding this collection.
    const KEY: &'static str;

    /// Check the record before it is written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] describing the first problem found.
    fn validate(&self) -> Result<()>;
}

/// Something with a human-readable name that lists can be filtered on.
pub trait Named {
    /// The name shown for this item in lists.
    fn display_name(&self) -> &str;
}

/// Keep the items whose display name contains `term`, ignoring case.
///
/// An empty `term` keeps everything. Order is preserved.
#[must_use]
pub fn filter_by_name_substring<T: Named + Clone>(records: &[T], term: &str) -> Vec<T> {
    if term.is_empty() {
        return records.to_vec();
    }
    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|record| record.display_name().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Build a `<prefix>-<millis>` id, bumping the number until `taken` is false.
pub(crate) fn timestamp_id(prefix: &str, millis: i64, taken: impl Fn(&str) -> bool) -> String {
    let mut n = millis;
    loop {
        let id = format!("{prefix}-{n}");
        if !taken(&id) {
            return id;
        }
        n += 1;
    }
}

/// Typed access to JSON collections in a key-value store.
#[derive(Clone, Copy)]
pub struct RecordStore<'a> {
    store: &'a dyn KeyValueStore,
}

impl std::fmt::Debug for RecordStore<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore").finish_non_exhaustive()
    }
}

impl<'a> RecordStore<'a> {
    /// Wrap a key-value store.
    #[must_use]
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Read the collection stored under `key`.
    ///
    /// A missing key is an empty collection. So is malformed JSON: the
    /// problem is logged and the read path carries on.
    ///
    /// # Errors
    ///
    /// Returns an error only if the underlying store cannot be read.
    pub fn load_all<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(records) => Ok(records),
            Err(source) => {
                let err = Error::StorageDecode {
                    key: key.to_string(),
                    source,
                };
                warn!("{err}; treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Validate and write the whole collection under `key` in one call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if any record is invalid (nothing is
    /// written), or the store's error if the write is rejected.
    pub fn save_all<T: Record>(&self, key: &str, records: &[T]) -> Result<()> {
        for record in records {
            record.validate()?;
        }
        let json = serde_json::to_string(records)?;
        self.store.set(key, &json)?;
        debug!("Saved {} records under '{}'", records.len(), key);
        Ok(())
    }

    /// Replace the collection under `key` with an empty one.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the write is rejected.
    pub fn delete_all<T>(&self, key: &str) -> Result<Vec<T>> {
        self.store.set(key, "[]")?;
        debug!("Cleared '{}'", key);
        Ok(Vec::new())
    }

    /// [`load_all`](Self::load_all) on the record type's own key.
    ///
    /// # Errors
    ///
    /// Returns an error only if the underlying store cannot be read.
    pub fn load<T: Record>(&self) -> Result<Vec<T>> {
        self.load_all(T::KEY)
    }

    /// [`save_all`](Self::save_all) on the record type's own key.
    ///
    /// # Errors
    ///
    /// See [`save_all`](Self::save_all).
    pub fn save<T: Record>(&self, records: &[T]) -> Result<()> {
        self.save_all(T::KEY, records)
    }

    /// [`delete_all`](Self::delete_all) on the record type's own key.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the write is rejected.
    pub fn clear<T: Record>(&self) -> Result<Vec<T>> {
        self.delete_all(T::KEY)
    }
}
