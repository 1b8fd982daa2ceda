//! In-memory slot store with optional write-failure injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use qroster_error::{Result, RosterError};

use crate::LocalStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write and clear fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn slot_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.slots.lock().keys().cloned().collect();
        names.sort();
        names
    }

    fn check_writable(&self, slot: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RosterError::Io(std::io::Error::other(format!(
                "injected write failure for slot `{slot}`"
            ))));
        }
        Ok(())
    }
}

impl LocalStore for MemoryStore {
    fn read_slot(&self, slot: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.slots.lock().get(slot).cloned())
    }

    fn write_slot(&self, slot: &str, bytes: &[u8]) -> Result<()> {
        self.check_writable(slot)?;
        self.slots.lock().insert(slot.to_owned(), bytes.to_vec());
        Ok(())
    }

    fn clear_slot(&self, slot: &str) -> Result<()> {
        self.check_writable(slot)?;
        self.slots.lock().remove(slot);
        Ok(())
    }
}
