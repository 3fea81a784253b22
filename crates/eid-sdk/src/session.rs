//! In-memory session state with write-through persistence.

use std::fmt;
use std::sync::Arc;

use eid_models::TribeName;
use tracing::debug;

use crate::credentials::Credential;
use crate::storage::{KeyValueStorage, StorageKey};

/// Credential and current tribe, mirrored to durable storage.
///
/// This is the only writer of the persisted keys. Every setter updates
/// memory and storage together, so a reader never observes one without
/// the other.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
    credential: Option<Credential>,
    current_tribe: Option<TribeName>,
}

impl SessionStore {
    /// Seed the session from whatever `storage` holds.
    pub fn restore(storage: Arc<dyn KeyValueStorage>) -> Self {
        let credential = storage
            .get(StorageKey::Credential)
            .filter(|t| !t.is_empty())
            .map(Credential::new);
        let current_tribe = storage
            .get(StorageKey::CurrentTribe)
            .and_then(|t| TribeName::parse(&t).ok());

        debug!(
            has_credential = credential.is_some(),
            tribe = ?current_tribe,
            "session restored"
        );

        Self {
            storage,
            credential,
            current_tribe,
        }
    }

    /// The current credential, if any.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Replace the credential. `None` deletes the persisted key.
    pub fn set_credential(&mut self, credential: Option<Credential>) {
        match &credential {
            Some(c) => self.storage.set(StorageKey::Credential, c.as_str()),
            None => self.storage.remove(StorageKey::Credential),
        }
        self.credential = credential;
    }

    /// The current tribe context, if any.
    pub fn current_tribe(&self) -> Option<&TribeName> {
        self.current_tribe.as_ref()
    }

    /// Replace the tribe context. `None` deletes the persisted key.
    pub fn set_current_tribe(&mut self, tribe: Option<TribeName>) {
        match &tribe {
            Some(t) => self.storage.set(StorageKey::CurrentTribe, t.as_str()),
            None => self.storage.remove(StorageKey::CurrentTribe),
        }
        self.current_tribe = tribe;
    }

    /// Drop both the credential and the tribe context.
    pub fn clear(&mut self) {
        self.set_credential(None);
        self.set_current_tribe(None);
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("credential", &self.credential)
            .field("current_tribe", &self.current_tribe)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn restores_persisted_values() {
        let storage = Arc::new(MemoryStorage::with_entries([
            (StorageKey::Credential, "tok"),
            (StorageKey::CurrentTribe, "Fire"),
        ]));
        let session = SessionStore::restore(storage);
        assert_eq!(session.credential().map(Credential::as_str), Some("tok"));
        assert_eq!(session.current_tribe(), Some(&TribeName::new("Fire")));
    }

    #[test]
    fn credential_write_is_idempotent() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = SessionStore::restore(storage.clone());

        session.set_credential(Some(Credential::new("t")));
        session.set_credential(Some(Credential::new("t")));

        assert_eq!(session.credential().map(Credential::as_str), Some("t"));
        assert_eq!(storage.get(StorageKey::Credential).as_deref(), Some("t"));
    }

    #[test]
    fn clearing_credential_keeps_tribe() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = SessionStore::restore(storage.clone());
        session.set_credential(Some(Credential::new("t")));
        session.set_current_tribe(Some("Water".into()));

        session.set_credential(None);

        assert!(session.credential().is_none());
        assert_eq!(storage.get(StorageKey::Credential), None);
        assert_eq!(storage.get(StorageKey::CurrentTribe).as_deref(), Some("Water"));
    }

    #[test]
    fn clear_removes_both_keys() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = SessionStore::restore(storage.clone());
        session.set_credential(Some(Credential::new("t")));
        session.set_current_tribe(Some("Water".into()));

        session.clear();

        assert_eq!(storage.get(StorageKey::Credential), None);
        assert_eq!(storage.get(StorageKey::CurrentTribe), None);
    }

    #[test]
    fn blank_persisted_values_are_ignored() {
        let storage = Arc::new(MemoryStorage::with_entries([
            (StorageKey::Credential, ""),
            (StorageKey::CurrentTribe, "   "),
        ]));
        let session = SessionStore::restore(storage);
        assert!(session.credential().is_none());
        assert!(session.current_tribe().is_none());
    }
}
