//! Typed roster and session slots over a [`LocalStore`].

use qroster_error::{Result, RosterError};
use qroster_types::{Roster, Session};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::LocalStore;

/// Slot holding the serialized roster.
pub const DEFAULT_ROSTER_SLOT: &str = "ismailia_schools_data";

/// Slot holding the current session.
pub const DEFAULT_SESSION_SLOT: &str = "session";

/// The roster and session mirror kept on the device.
#[derive(Debug)]
pub struct LocalMirror<L> {
    store: L,
    roster_slot: String,
    session_slot: String,
}

impl<L: LocalStore> LocalMirror<L> {
    pub fn new(store: L) -> Self {
        Self::with_slots(store, DEFAULT_ROSTER_SLOT, DEFAULT_SESSION_SLOT)
    }

    pub fn with_slots(
        store: L,
        roster_slot: impl Into<String>,
        session_slot: impl Into<String>,
    ) -> Self {
        Self {
            store,
            roster_slot: roster_slot.into(),
            session_slot: session_slot.into(),
        }
    }

    pub const fn store(&self) -> &L {
        &self.store
    }

    pub fn roster_slot(&self) -> &str {
        &self.roster_slot
    }

    /// Last persisted roster, if any.
    ///
    /// # Errors
    /// [`RosterError::CorruptSlot`] when the slot exists but does not decode.
    pub fn load_roster(&self) -> Result<Option<Roster>> {
        let roster: Option<Roster> = self.read_json(&self.roster_slot)?;
        if let Some(roster) = &roster {
            debug!(
                slot = %self.roster_slot,
                schools = roster.len(),
                "roster loaded from local store"
            );
        }
        Ok(roster)
    }

    pub fn save_roster(&self, roster: &Roster) -> Result<()> {
        self.write_json(&self.roster_slot, roster)
    }

    pub fn load_session(&self) -> Result<Option<Session>> {
        self.read_json(&self.session_slot)
    }

    pub fn save_session(&self, session: &Session) -> Result<()> {
        self.write_json(&self.session_slot, session)
    }

    pub fn clear_session(&self) -> Result<()> {
        self.store.clear_slot(&self.session_slot)
    }

    fn read_json<T: DeserializeOwned>(&self, slot: &str) -> Result<Option<T>> {
        let Some(bytes) = self.store.read_slot(slot)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes).map(Some).map_err(|err| {
            warn!(slot, error = %err, "local slot failed to decode");
            RosterError::corrupt_slot(slot, err.to_string())
        })
    }

    fn write_json<T: Serialize>(&self, slot: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.store.write_slot(slot, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileStore, MemoryStore};
    use qroster_types::{Checklist, ChecklistItem, Role, Scope, seed_roster};
    use serde_json::{Value, json};

    #[test]
    fn roster_round_trip() {
        let mirror = LocalMirror::new(MemoryStore::new());
        assert_eq!(mirror.load_roster().unwrap(), None);
        let roster = seed_roster()
            .with_checklist(
                "school-0-3",
                Checklist::default().with(ChecklistItem::TeamFormed, true),
            )
            .unwrap();
        mirror.save_roster(&roster).unwrap();
        assert_eq!(mirror.load_roster().unwrap(), Some(roster));
    }

    #[test]
    fn roster_with_encoded_checklists_loads_equal() {
        let store = MemoryStore::new();
        let roster = seed_roster()
            .with_checklist("school-2-1", Checklist::complete())
            .unwrap();
        let mut value = serde_json::to_value(&roster).unwrap();
        for entry in value.as_array_mut().unwrap() {
            let encoded = serde_json::to_string(&entry["checklist"]).unwrap();
            entry["checklist"] = Value::String(encoded);
        }
        store
            .write_slot(DEFAULT_ROSTER_SLOT, &serde_json::to_vec(&value).unwrap())
            .unwrap();

        let mirror = LocalMirror::new(store);
        assert_eq!(mirror.load_roster().unwrap(), Some(roster));
    }

    #[test]
    fn corrupt_roster_slot_is_reported() {
        let store = MemoryStore::new();
        store.write_slot(DEFAULT_ROSTER_SLOT, b"{not json").unwrap();
        let mirror = LocalMirror::new(store);
        let err = mirror.load_roster().unwrap_err();
        assert!(matches!(err, RosterError::CorruptSlot { .. }));
    }

    #[test]
    fn stored_layout_is_camel_case_array() {
        let store = MemoryStore::new();
        let mirror = LocalMirror::new(&store);
        mirror.save_roster(&seed_roster()).unwrap();
        let bytes = store.read_slot(DEFAULT_ROSTER_SLOT).unwrap().unwrap();
        let raw: Value = serde_json::from_slice(&bytes).unwrap();
        let first = &raw.as_array().unwrap()[0];
        assert_eq!(first["areaId"], json!("north"));
        assert_eq!(first["completionPercentage"], json!(0));
        assert!(first["checklist"].is_object());
    }

    #[test]
    fn session_slot_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = LocalMirror::with_slots(FileStore::open(dir.path()).unwrap(), "r", "s");
        let session = Session {
            user_id: "u-1".to_owned(),
            email: "superadmin@gmail.com".to_owned(),
            display_name: "SUPERADMIN".to_owned(),
            role: Role::SuperAdmin,
            scope: Scope::AllRegions,
            local_only: false,
            access_token: Some("tok".to_owned()),
        };
        mirror.save_session(&session).unwrap();
        assert_eq!(mirror.load_session().unwrap(), Some(session));
        mirror.clear_session().unwrap();
        assert_eq!(mirror.load_session().unwrap(), None);
        assert!(!dir.path().join("s.json").exists());
    }
}
