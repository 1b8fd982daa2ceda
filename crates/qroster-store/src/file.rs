//! Directory-backed slot store: one `<slot>.json` file per slot.
//!
//! Writes go to a temporary file in the same directory which is then
//! renamed over the slot file, so a crash mid-write leaves the previous
//! contents intact.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use qroster_error::{Result, RosterError};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::LocalStore;

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "local file store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `slot`.
    pub fn slot_path(&self, slot: &str) -> Result<PathBuf> {
        validate_slot_name(slot)?;
        Ok(self.root.join(format!("{slot}.json")))
    }
}

fn validate_slot_name(slot: &str) -> Result<()> {
    let valid = !slot.is_empty()
        && slot
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(RosterError::internal(format!("invalid slot name: {slot:?}")))
    }
}

impl LocalStore for FileStore {
    fn read_slot(&self, slot: &str) -> Result<Option<Vec<u8>>> {
        let path = self.slot_path(slot)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_slot(&self, slot: &str, bytes: &[u8]) -> Result<()> {
        let path = self.slot_path(slot)?;
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|err| RosterError::Io(err.error))?;
        debug!(slot, bytes = bytes.len(), "slot written");
        Ok(())
    }

    fn clear_slot(&self, slot: &str) -> Result<()> {
        let path = self.slot_path(slot)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_slot_reads_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.read_slot("roster").unwrap(), None);
    }

    #[test]
    fn write_replaces_contents() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested")).unwrap();
        store.write_slot("roster", b"[1]").unwrap();
        store.write_slot("roster", b"[1,2]").unwrap();
        assert_eq!(store.read_slot("roster").unwrap().as_deref(), Some(&b"[1,2]"[..]));
        assert!(dir.path().join("nested").join("roster.json").is_file());
    }

    #[test]
    fn survives_reopen() {
        let dir = tempdir().unwrap();
        FileStore::open(dir.path())
            .unwrap()
            .write_slot("session", b"{}")
            .unwrap();
        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.read_slot("session").unwrap().as_deref(), Some(&b"{}"[..]));
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.write_slot("s", b"x").unwrap();
        store.clear_slot("s").unwrap();
        store.clear_slot("s").unwrap();
        assert_eq!(store.read_slot("s").unwrap(), None);
    }

    #[test]
    fn rejects_path_like_slot_names() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        for bad in ["", "../escape", "a/b", "dot.name"] {
            assert!(store.write_slot(bad, b"x").is_err(), "{bad}");
        }
    }
}
