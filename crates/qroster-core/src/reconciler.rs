//! The reconciler: owns the in-memory roster and keeps the local mirror and
//! the remote collection consistent with it.
//!
//! Local persistence is authoritative for durability. The remote copy is
//! authoritative for content whenever it is reachable and non-empty, and a
//! fetch replaces the in-memory roster wholesale. Edits are written to the
//! local mirror before they become visible in memory; the remote upsert that
//! follows is advisory.

use std::fmt;

use qroster_error::Result;
use qroster_remote::{RemoteRow, RemoteStore};
use qroster_store::{LocalMirror, LocalStore};
use qroster_types::{Checklist, Connectivity, Roster, School, Session, seed_roster};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::access::accessible_schools;
use crate::connectivity::probe_connectivity;

/// Result of a remote fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The roster was replaced by the remote contents.
    Replaced { schools: usize },
    /// The remote answered with no rows; the roster was kept.
    EmptyIgnored,
    /// The fetch itself failed.
    Failed { reason: String },
    /// The remote answered but a row did not decode or its checklist matched
    /// neither accepted shape; the roster was kept.
    Malformed { reason: String },
    /// The probe failed, so no fetch was attempted.
    Unreachable,
}

impl SyncOutcome {
    /// `Replaced` and `EmptyIgnored` both count as a successful sync.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Replaced { .. } | Self::EmptyIgnored)
    }
}

/// Result of a checklist edit that was persisted locally (or skipped).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditOutcome {
    /// Saved locally and accepted by the remote.
    Synced,
    /// Saved locally; the remote was skipped or refused.
    LocalOnly,
    /// No school with that id; nothing changed.
    NotFound,
}

/// Notification delivered to subscribers after each state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    RosterReplaced { schools: usize },
    SchoolUpdated { school_id: String, completion: u8 },
    ConnectivityChanged(Connectivity),
    SessionChanged { signed_in: bool },
}

type Listener = Box<dyn FnMut(&StateChange)>;

/// Application state plus the sync policy over a [`LocalStore`] and a
/// [`RemoteStore`].
pub struct Reconciler<L, R> {
    local: LocalMirror<L>,
    remote: R,
    roster: Roster,
    connectivity: Connectivity,
    session: Option<Session>,
    listeners: Vec<Listener>,
}

impl<L, R> fmt::Debug for Reconciler<L, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("schools", &self.roster.len())
            .field("connectivity", &self.connectivity)
            .field("session", &self.session.as_ref().map(|s| &s.email))
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl<L: LocalStore, R: RemoteStore> Reconciler<L, R> {
    /// Load the roster and any stored session without touching the network.
    ///
    /// A missing, empty or corrupt roster slot yields the seed roster, so the
    /// roster is never empty afterwards. Connectivity stays `Connecting`
    /// until something probes.
    pub fn load(local: LocalMirror<L>, remote: R) -> Self {
        let roster = match local.load_roster() {
            Ok(Some(roster)) if !roster.is_empty() => {
                debug!(schools = roster.len(), "roster loaded from local store");
                roster
            }
            Ok(_) => {
                info!("no local roster; starting from the seed roster");
                seed_roster()
            }
            Err(err) => {
                warn!(error = %err, "local roster unreadable; starting from the seed roster");
                seed_roster()
            }
        };
        let session = local.load_session().unwrap_or_else(|err| {
            warn!(error = %err, "stored session unreadable; ignoring it");
            None
        });
        if let Some(session) = &session {
            remote.set_access_token(session.access_token.as_deref());
        }
        Self {
            local,
            remote,
            roster,
            connectivity: Connectivity::Connecting,
            session,
            listeners: Vec::new(),
        }
    }

    /// [`Reconciler::load`], then bring the roster up to date for the stored
    /// session, if any.
    pub fn bootstrap(local: LocalMirror<L>, remote: R) -> Self {
        let mut this = Self::load(local, remote);
        this.start();
        this
    }

    /// Like [`Reconciler::bootstrap`] but with an explicit session in place
    /// of the stored one. The stored session slot is left as it is.
    pub fn bootstrap_with_session(
        local: LocalMirror<L>,
        remote: R,
        session: Option<Session>,
    ) -> Self {
        let mut this = Self::load(local, remote);
        this.remote
            .set_access_token(session.as_ref().and_then(|s| s.access_token.as_deref()));
        this.session = session;
        this.start();
        this
    }

    fn start(&mut self) -> Option<SyncOutcome> {
        let local_only = self.session.as_ref()?.local_only;
        if local_only {
            self.set_connectivity(Connectivity::Offline);
            return None;
        }
        Some(self.force_sync())
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&StateChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self, change: &StateChange) {
        for listener in &mut self.listeners {
            listener(change);
        }
    }

    fn set_connectivity(&mut self, next: Connectivity) {
        if self.connectivity != next {
            info!(from = %self.connectivity, to = %next, "connectivity changed");
            self.connectivity = next;
            self.notify(&StateChange::ConnectivityChanged(next));
        }
    }

    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    pub const fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub const fn local(&self) -> &LocalMirror<L> {
        &self.local
    }

    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Schools visible to the current session; empty when signed out.
    pub fn accessible_schools(&self) -> Vec<&School> {
        self.session
            .as_ref()
            .map(|session| accessible_schools(&self.roster, session))
            .unwrap_or_default()
    }

    /// Probe the remote and record the result.
    pub fn probe(&mut self) -> Connectivity {
        let observed = probe_connectivity(&self.remote);
        self.set_connectivity(observed);
        observed
    }

    /// Fetch the whole remote collection and, if it is non-empty and every
    /// row parses, replace the roster with it.
    pub fn fetch_remote(&mut self) -> SyncOutcome {
        let rows = match self.remote.fetch_all() {
            Ok(rows) => rows,
            Err(err) if err.is_connectivity() => {
                warn!(error = %err, "remote fetch failed");
                self.set_connectivity(Connectivity::Offline);
                return SyncOutcome::Failed {
                    reason: err.to_string(),
                };
            }
            Err(err) => {
                // The remote answered; only its payload is unusable.
                warn!(error = %err, "remote rows undecodable; keeping the local roster");
                self.set_connectivity(Connectivity::Connected);
                return SyncOutcome::Malformed {
                    reason: err.to_string(),
                };
            }
        };
        self.set_connectivity(Connectivity::Connected);

        if rows.is_empty() {
            info!("remote collection is empty; keeping the local roster");
            return SyncOutcome::EmptyIgnored;
        }

        let schools = match rows
            .into_iter()
            .map(RemoteRow::into_school)
            .collect::<Result<Vec<School>>>()
        {
            Ok(schools) => schools,
            Err(err) => {
                warn!(error = %err, "remote rows rejected; keeping the local roster");
                return SyncOutcome::Malformed {
                    reason: err.to_string(),
                };
            }
        };

        let roster = Roster::new(schools);
        if let Err(err) = self.local.save_roster(&roster) {
            error!(error = %err, "failed to persist fetched roster");
        }
        let count = roster.len();
        self.roster = roster;
        info!(schools = count, "roster replaced from remote");
        self.notify(&StateChange::RosterReplaced { schools: count });
        SyncOutcome::Replaced { schools: count }
    }

    /// Re-probe; fetch only when the remote is reachable.
    pub fn force_sync(&mut self) -> SyncOutcome {
        if self.probe() == Connectivity::Connected {
            self.fetch_remote()
        } else {
            SyncOutcome::Unreachable
        }
    }

    /// Replace one school's checklist.
    ///
    /// The updated roster is written to the local mirror before it replaces
    /// the in-memory copy. The remote upsert follows unless the session is
    /// local-only or absent; its failure only downgrades the outcome.
    ///
    /// # Errors
    /// Only a failed local write. The in-memory roster is unchanged then.
    pub fn update_checklist(
        &mut self,
        school_id: &str,
        checklist: Checklist,
    ) -> Result<EditOutcome> {
        let Some(next) = self.roster.with_checklist(school_id, checklist) else {
            info!(school_id, "checklist edit for unknown school ignored");
            return Ok(EditOutcome::NotFound);
        };

        if let Err(err) = self.local.save_roster(&next) {
            error!(school_id, error = %err, "failed to persist checklist edit");
            return Err(err);
        }
        self.roster = next;

        let Some(school) = self.roster.get(school_id) else {
            return Ok(EditOutcome::NotFound);
        };
        let row = RemoteRow::from_school(school);
        let completion = school.completion_percentage();
        self.notify(&StateChange::SchoolUpdated {
            school_id: school_id.to_owned(),
            completion,
        });

        let push = self.session.as_ref().is_some_and(|s| !s.local_only);
        let outcome = if push {
            match self.remote.upsert(&row) {
                Ok(()) => {
                    self.set_connectivity(Connectivity::Connected);
                    EditOutcome::Synced
                }
                Err(err) => {
                    warn!(school_id, error = %err, "remote upsert failed; edit kept locally");
                    if err.is_connectivity() {
                        self.set_connectivity(Connectivity::Offline);
                    }
                    EditOutcome::LocalOnly
                }
            }
        } else {
            EditOutcome::LocalOnly
        };
        info!(school_id, completion, outcome = ?outcome, "checklist updated");
        Ok(outcome)
    }

    /// Install `session`, persist it, and sync for it.
    ///
    /// Returns `None` for a local-only session, which forces `Offline`
    /// instead of syncing.
    pub fn sign_in(&mut self, session: Session) -> Option<SyncOutcome> {
        if let Err(err) = self.local.save_session(&session) {
            warn!(error = %err, "failed to persist session");
        }
        self.remote.set_access_token(session.access_token.as_deref());
        info!(email = %session.email, local_only = session.local_only, "session installed");
        self.session = Some(session);
        self.notify(&StateChange::SessionChanged { signed_in: true });
        self.start()
    }

    /// Drop the session and its stored copy. The roster is kept.
    pub fn sign_out(&mut self) -> Option<Session> {
        let previous = self.session.take();
        if let Err(err) = self.local.clear_session() {
            warn!(error = %err, "failed to clear stored session");
        }
        self.remote.set_access_token(None);
        if previous.is_some() {
            info!("session dropped");
            self.notify(&StateChange::SessionChanged { signed_in: false });
        }
        previous
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    use super::*;
    use qroster_remote::MemoryRemote;
    use qroster_store::MemoryStore;
    use qroster_types::{ChecklistItem, LOCAL_SESSION_ID, Role, Scope};

    fn admin(local_only: bool) -> Session {
        Session {
            user_id: if local_only { LOCAL_SESSION_ID.to_owned() } else { "uid-1".to_owned() },
            email: "superadmin@gmail.com".to_owned(),
            display_name: "SUPERADMIN".to_owned(),
            role: Role::SuperAdmin,
            scope: Scope::AllRegions,
            local_only,
            access_token: (!local_only).then(|| "tok".to_owned()),
        }
    }

    fn mirror() -> LocalMirror<Arc<MemoryStore>> {
        LocalMirror::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn load_without_anything_uses_seed() {
        let rec = Reconciler::load(mirror(), Arc::new(MemoryRemote::new()));
        assert_eq!(rec.roster(), &seed_roster());
        assert_eq!(rec.connectivity(), Connectivity::Connecting);
        assert!(rec.session().is_none());
        assert!(rec.accessible_schools().is_empty());
    }

    #[test]
    fn bootstrap_without_session_stays_off_the_network() {
        let remote = Arc::new(MemoryRemote::new());
        let rec = Reconciler::bootstrap(mirror(), Arc::clone(&remote));
        assert_eq!(remote.probe_calls(), 0);
        assert_eq!(rec.connectivity(), Connectivity::Connecting);
    }

    #[test]
    fn local_only_session_forces_offline_without_probing() {
        let remote = Arc::new(MemoryRemote::new());
        let rec =
            Reconciler::bootstrap_with_session(mirror(), Arc::clone(&remote), Some(admin(true)));
        assert_eq!(rec.connectivity(), Connectivity::Offline);
        assert_eq!(remote.probe_calls(), 0);
        assert_eq!(remote.fetch_calls(), 0);
    }

    #[test]
    fn provider_session_probes_then_fetches() {
        let remote = Arc::new(MemoryRemote::new());
        let rec =
            Reconciler::bootstrap_with_session(mirror(), Arc::clone(&remote), Some(admin(false)));
        assert_eq!(remote.probe_calls(), 1);
        assert_eq!(remote.fetch_calls(), 1);
        assert_eq!(rec.connectivity(), Connectivity::Connected);
        assert_eq!(remote.access_token().as_deref(), Some("tok"));
        assert_eq!(rec.roster(), &seed_roster());
    }

    #[test]
    fn listeners_observe_changes() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut rec = Reconciler::load(mirror(), Arc::new(MemoryRemote::new()));
        let sink = Rc::clone(&seen);
        rec.subscribe(move |change| sink.borrow_mut().push(change.clone()));

        rec.sign_in(admin(true));
        let id = rec.roster().as_slice()[0].id.clone();
        rec.update_checklist(&id, Checklist::complete()).unwrap();

        let seen = seen.borrow();
        assert_eq!(seen[0], StateChange::SessionChanged { signed_in: true });
        assert_eq!(seen[1], StateChange::ConnectivityChanged(Connectivity::Offline));
        assert_eq!(seen[2], StateChange::SchoolUpdated { school_id: id, completion: 100 });
    }

    #[test]
    fn edit_without_session_is_local_only() {
        let remote = Arc::new(MemoryRemote::new());
        let mut rec = Reconciler::load(mirror(), Arc::clone(&remote));
        let id = rec.roster().as_slice()[3].id.clone();
        let checklist = Checklist::default().with(ChecklistItem::WarningSigns, true);
        assert_eq!(rec.update_checklist(&id, checklist).unwrap(), EditOutcome::LocalOnly);
        assert_eq!(remote.upsert_calls(), 0);
        assert_eq!(rec.roster().get(&id).unwrap().completion_percentage(), 10);
    }

    #[test]
    fn sign_out_keeps_roster_and_clears_slot() {
        let local = mirror();
        let store = Arc::clone(local.store());
        let mut rec = Reconciler::load(local, Arc::new(MemoryRemote::new()));
        rec.sign_in(admin(true));
        assert!(LocalMirror::new(Arc::clone(&store)).load_session().unwrap().is_some());

        let before = rec.roster().clone();
        assert!(rec.sign_out().is_some());
        assert!(rec.sign_out().is_none());
        assert_eq!(rec.roster(), &before);
        assert!(LocalMirror::new(store).load_session().unwrap().is_none());
    }

    #[test]
    fn sync_outcome_success_classes() {
        assert!(SyncOutcome::Replaced { schools: 1 }.is_success());
        assert!(SyncOutcome::EmptyIgnored.is_success());
        assert!(!SyncOutcome::Unreachable.is_success());
        assert!(!SyncOutcome::Failed { reason: String::new() }.is_success());
        assert!(!SyncOutcome::Malformed { reason: String::new() }.is_success());
    }
}
