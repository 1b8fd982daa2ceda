//! In-process stand-ins for the remote collection and identity provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use qroster_error::{Result, RosterError};

use crate::row::{RemoteRow, decode_rows};
use crate::{EMPTY_RESULT_CODE, Identity, IdentityProvider, RemoteStore};

/// Shared remote collection held in memory, with failure injection and call
/// counters.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    rows: Mutex<Vec<RemoteRow>>,
    offline: AtomicBool,
    fail_upserts: AtomicBool,
    probe_reports_empty: AtomicBool,
    raw_body: Mutex<Option<String>>,
    access_token: Mutex<Option<String>>,
    probe_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<RemoteRow>) -> Self {
        let remote = Self::new();
        *remote.rows.lock() = rows;
        remote
    }

    /// Every call fails as unreachable while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Upserts fail as unreachable while set; probe and fetch still work.
    pub fn set_fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    /// Probe fails with the "no rows" code, as an empty table does on some
    /// backends.
    pub fn set_probe_reports_empty(&self, empty: bool) {
        self.probe_reports_empty.store(empty, Ordering::SeqCst);
    }

    /// Serve this collection body verbatim from `fetch_all` instead of the
    /// stored rows, as a misbehaving backend would.
    pub fn set_raw_body(&self, body: Option<&str>) {
        *self.raw_body.lock() = body.map(str::to_owned);
    }

    pub fn rows(&self) -> Vec<RemoteRow> {
        self.rows.lock().clone()
    }

    pub fn row(&self, id: &str) -> Option<RemoteRow> {
        self.rows.lock().iter().find(|row| row.id == id).cloned()
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token.lock().clone()
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RosterError::unavailable("memory remote is offline"));
        }
        Ok(())
    }
}

impl RemoteStore for MemoryRemote {
    fn probe(&self) -> Result<()> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if self.probe_reports_empty.load(Ordering::SeqCst) {
            return Err(RosterError::RemoteRejected {
                status: 406,
                code: EMPTY_RESULT_CODE.to_owned(),
                message: "no rows".to_owned(),
            });
        }
        Ok(())
    }

    fn fetch_all(&self) -> Result<Vec<RemoteRow>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let raw_body = self.raw_body.lock().clone();
        if let Some(body) = raw_body {
            return decode_rows(&body);
        }
        Ok(self.rows())
    }

    fn upsert(&self, row: &RemoteRow) -> Result<()> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(RosterError::unavailable("injected upsert failure"));
        }
        let mut rows = self.rows.lock();
        match rows.iter_mut().find(|existing| existing.id == row.id) {
            Some(existing) => *existing = row.clone(),
            None => rows.push(row.clone()),
        }
        Ok(())
    }

    fn set_access_token(&self, token: Option<&str>) {
        *self.access_token.lock() = token.map(str::to_owned);
    }
}

/// Remote that is never reachable. Used when no backend is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineRemote;

impl RemoteStore for OfflineRemote {
    fn probe(&self) -> Result<()> {
        Err(RosterError::unavailable("no remote configured"))
    }

    fn fetch_all(&self) -> Result<Vec<RemoteRow>> {
        Err(RosterError::unavailable("no remote configured"))
    }

    fn upsert(&self, _row: &RemoteRow) -> Result<()> {
        Err(RosterError::unavailable("no remote configured"))
    }
}

impl IdentityProvider for OfflineRemote {
    fn sign_in_with_password(&self, _email: &str, _password: &str) -> Result<Identity> {
        Err(RosterError::unavailable("no identity provider configured"))
    }

    fn sign_out(&self, _access_token: &str) -> Result<()> {
        Ok(())
    }
}

/// Identity provider backed by a fixed account table.
#[derive(Debug, Default)]
pub struct MemoryIdentityProvider {
    accounts: HashMap<String, (String, String)>,
    offline: AtomicBool,
    sign_outs: AtomicUsize,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `email` with `password`; the user id is derived from the email.
    pub fn with_account(mut self, email: &str, password: &str) -> Self {
        self.accounts.insert(
            email.to_owned(),
            (password.to_owned(), format!("uid-{email}")),
        );
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

impl IdentityProvider for MemoryIdentityProvider {
    fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RosterError::unavailable("identity provider offline"));
        }
        match self.accounts.get(email) {
            Some((expected, id)) if expected == password => Ok(Identity {
                id: id.clone(),
                email: email.to_owned(),
                access_token: Some(format!("token-{id}")),
            }),
            _ => Err(RosterError::RemoteRejected {
                status: 400,
                code: "invalid_credentials".to_owned(),
                message: "Invalid login credentials".to_owned(),
            }),
        }
    }

    fn sign_out(&self, _access_token: &str) -> Result<()> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
