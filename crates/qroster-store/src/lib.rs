//! Local persistence for qroster.
//!
//! A [`LocalStore`] is a set of named byte slots. Two backends ship here:
//! [`FileStore`] (one JSON file per slot, atomically replaced) and
//! [`MemoryStore`] (for tests and ephemeral runs). [`LocalMirror`] layers the
//! typed roster and session slots on top of either.

pub mod file;
pub mod memory;
pub mod mirror;

use std::sync::Arc;

use qroster_error::Result;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use mirror::{DEFAULT_ROSTER_SLOT, DEFAULT_SESSION_SLOT, LocalMirror};

/// Durable named slots holding opaque bytes.
pub trait LocalStore {
    /// Read a slot. A slot that was never written yields `Ok(None)`.
    fn read_slot(&self, slot: &str) -> Result<Option<Vec<u8>>>;

    /// Replace a slot's contents. Returns only once the write is durable.
    fn write_slot(&self, slot: &str, bytes: &[u8]) -> Result<()>;

    /// Remove a slot. Removing a missing slot is not an error.
    fn clear_slot(&self, slot: &str) -> Result<()>;
}

impl<T: LocalStore + ?Sized> LocalStore for &T {
    fn read_slot(&self, slot: &str) -> Result<Option<Vec<u8>>> {
        (**self).read_slot(slot)
    }

    fn write_slot(&self, slot: &str, bytes: &[u8]) -> Result<()> {
        (**self).write_slot(slot, bytes)
    }

    fn clear_slot(&self, slot: &str) -> Result<()> {
        (**self).clear_slot(slot)
    }
}

impl<T: LocalStore + ?Sized> LocalStore for Arc<T> {
    fn read_slot(&self, slot: &str) -> Result<Option<Vec<u8>>> {
        (**self).read_slot(slot)
    }

    fn write_slot(&self, slot: &str, bytes: &[u8]) -> Result<()> {
        (**self).write_slot(slot, bytes)
    }

    fn clear_slot(&self, slot: &str) -> Result<()> {
        (**self).clear_slot(slot)
    }
}

impl<T: LocalStore + ?Sized> LocalStore for Box<T> {
    fn read_slot(&self, slot: &str) -> Result<Option<Vec<u8>>> {
        (**self).read_slot(slot)
    }

    fn write_slot(&self, slot: &str, bytes: &[u8]) -> Result<()> {
        (**self).write_slot(slot, bytes)
    }

    fn clear_slot(&self, slot: &str) -> Result<()> {
        (**self).clear_slot(slot)
    }
}
