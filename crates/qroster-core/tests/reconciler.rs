//! End-to-end behavior of the reconciler over in-memory and file-backed
//! stores.

use std::sync::Arc;

use proptest::prelude::*;
use qroster_core::{EditOutcome, Reconciler, SyncOutcome, login};
use qroster_remote::{MemoryIdentityProvider, MemoryRemote, OfflineRemote, RemoteRow};
use qroster_store::{FileStore, LocalMirror, LocalStore, MemoryStore};
use qroster_types::{
    Checklist, ChecklistItem, Connectivity, LOCAL_SESSION_ID, Role, Roster, School, SchoolType,
    Scope, Session, seed_roster,
};
use serde_json::json;

type MemReconciler = Reconciler<Arc<MemoryStore>, Arc<MemoryRemote>>;

fn session(local_only: bool) -> Session {
    Session {
        user_id: if local_only { LOCAL_SESSION_ID.to_owned() } else { "uid-7".to_owned() },
        email: "superadmin@gmail.com".to_owned(),
        display_name: "SUPERADMIN".to_owned(),
        role: Role::SuperAdmin,
        scope: Scope::AllRegions,
        local_only,
        access_token: (!local_only).then(|| "token".to_owned()),
    }
}

fn remote_school(id: &str, area: &str, checklist: Checklist) -> School {
    School::new(
        id,
        format!("remote {id}"),
        SchoolType::Commercial,
        area,
        "admin1@gmail.com",
        "2023-09-01",
    )
    .with_checklist(checklist)
}

fn rows(schools: &[School]) -> Vec<RemoteRow> {
    schools.iter().map(RemoteRow::from_school).collect()
}

fn setup(
    remote: MemoryRemote,
    session: Option<Session>,
) -> (Arc<MemoryStore>, Arc<MemoryRemote>, MemReconciler) {
    let store = Arc::new(MemoryStore::new());
    let remote = Arc::new(remote);
    let rec = Reconciler::bootstrap_with_session(
        LocalMirror::new(Arc::clone(&store)),
        Arc::clone(&remote),
        session,
    );
    (store, remote, rec)
}

fn stored_roster(store: &Arc<MemoryStore>) -> Roster {
    LocalMirror::new(Arc::clone(store)).load_roster().unwrap().unwrap()
}

fn half_done() -> Checklist {
    Checklist::default()
        .with(ChecklistItem::TeamFormed, true)
        .with(ChecklistItem::VisionMission, true)
        .with(ChecklistItem::SafetyProcedures, true)
        .with(ChecklistItem::AttendanceStats, true)
        .with(ChecklistItem::QualityDatabase, true)
}

#[test]
fn edit_is_local_before_remote_and_survives_remote_failure() {
    let remote = MemoryRemote::new();
    remote.set_fail_upserts(true);
    let (store, remote, mut rec) = setup(remote, Some(session(false)));
    let id = rec.roster().as_slice()[0].id.clone();

    let outcome = rec.update_checklist(&id, half_done()).unwrap();
    assert_eq!(outcome, EditOutcome::LocalOnly);
    assert_eq!(remote.upsert_calls(), 1);

    let school = rec.roster().get(&id).unwrap();
    assert_eq!(*school.checklist(), half_done());
    assert_eq!(school.completion_percentage(), 50);
    assert_eq!(stored_roster(&store).get(&id).unwrap().completion_percentage(), 50);
}

#[test]
fn edit_is_pushed_as_full_row_when_reachable() {
    let (_, remote, mut rec) = setup(MemoryRemote::new(), Some(session(false)));
    let id = rec.roster().as_slice()[5].id.clone();
    assert_eq!(rec.update_checklist(&id, Checklist::complete()).unwrap(), EditOutcome::Synced);

    let row = remote.row(&id).unwrap();
    assert_eq!(row.completion_percentage, Some(100));
    assert_eq!(row.checklist, serde_json::to_value(Checklist::complete()).unwrap());
    assert_eq!(row.area_id, rec.roster().get(&id).unwrap().area_id);
    assert_eq!(rec.connectivity(), Connectivity::Connected);
}

#[test]
fn offline_upsert_marks_offline() {
    let (_, remote, mut rec) = setup(MemoryRemote::new(), Some(session(false)));
    remote.set_offline(true);
    let id = rec.roster().as_slice()[0].id.clone();
    assert_eq!(rec.update_checklist(&id, half_done()).unwrap(), EditOutcome::LocalOnly);
    assert_eq!(rec.connectivity(), Connectivity::Offline);
}

#[test]
fn local_only_session_never_upserts() {
    let (store, remote, mut rec) = setup(MemoryRemote::new(), Some(session(true)));
    let id = rec.roster().as_slice()[2].id.clone();
    assert_eq!(rec.update_checklist(&id, half_done()).unwrap(), EditOutcome::LocalOnly);
    assert_eq!(remote.upsert_calls(), 0);
    assert_eq!(rec.connectivity(), Connectivity::Offline);
    assert_eq!(*stored_roster(&store).get(&id).unwrap().checklist(), half_done());
}

#[test]
fn unknown_school_is_reported_and_nothing_changes() {
    let (store, remote, mut rec) = setup(MemoryRemote::new(), Some(session(false)));
    let before = rec.roster().clone();
    assert_eq!(rec.update_checklist("school-99-99", half_done()).unwrap(), EditOutcome::NotFound);
    assert_eq!(rec.roster(), &before);
    assert_eq!(remote.upsert_calls(), 0);
    assert!(LocalMirror::new(Arc::clone(&store)).load_roster().unwrap().is_none());
}

#[test]
fn failed_local_write_is_an_error_and_memory_is_untouched() {
    let (store, remote, mut rec) = setup(MemoryRemote::new(), Some(session(false)));
    store.set_fail_writes(true);
    let before = rec.roster().clone();
    let id = before.as_slice()[0].id.clone();
    assert!(rec.update_checklist(&id, half_done()).is_err());
    assert_eq!(rec.roster(), &before);
    assert_eq!(remote.upsert_calls(), 0);
}

#[test]
fn empty_remote_keeps_local_roster() {
    let (store, _, mut rec) = setup(MemoryRemote::new(), Some(session(false)));
    let id = rec.roster().as_slice()[0].id.clone();
    rec.update_checklist(&id, half_done()).unwrap();
    let before = rec.roster().clone();
    // The upsert above made the remote non-empty; start over with an empty one.
    let mut rec = Reconciler::bootstrap_with_session(
        LocalMirror::new(Arc::clone(&store)),
        Arc::new(MemoryRemote::new()),
        Some(session(false)),
    );
    assert_eq!(rec.roster(), &before);
    assert_eq!(rec.fetch_remote(), SyncOutcome::EmptyIgnored);
    assert_eq!(rec.roster(), &before);
}

#[test]
fn non_empty_remote_replaces_roster_wholesale() {
    let remote_schools = vec![
        remote_school("r-1", "north", half_done()),
        remote_school("r-2", "fayed", Checklist::complete()),
    ];
    let (store, _, rec) = setup(
        MemoryRemote::with_rows(rows(&remote_schools)),
        Some(session(false)),
    );

    assert_eq!(rec.roster().as_slice(), remote_schools.as_slice());
    assert!(!rec.roster().contains(&seed_roster().as_slice()[0].id));
    assert_eq!(stored_roster(&store), Roster::new(remote_schools));
    assert_eq!(rec.connectivity(), Connectivity::Connected);
}

#[test]
fn encoded_checklists_load_like_structured_ones() {
    let structured = remote_school("r-1", "tall", half_done());
    let mut encoded_row = RemoteRow::from_school(&structured);
    encoded_row.checklist = json!(serde_json::to_string(&half_done()).unwrap());
    encoded_row.completion_percentage = Some(0);

    let (_, _, rec) = setup(MemoryRemote::with_rows(vec![encoded_row]), Some(session(false)));
    let school = rec.roster().get("r-1").unwrap();
    assert_eq!(school, &structured);
    assert_eq!(school.completion_percentage(), 50);
}

#[test]
fn malformed_row_rejects_the_whole_fetch() {
    let good = RemoteRow::from_school(&remote_school("r-1", "tall", half_done()));
    let mut bad = RemoteRow::from_school(&remote_school("r-2", "tall", half_done()));
    bad.checklist = json!(["teamFormed"]);
    let (_, remote, mut rec) = setup(MemoryRemote::with_rows(vec![good, bad]), None);

    let outcome = rec.force_sync();
    assert!(matches!(outcome, SyncOutcome::Malformed { .. }));
    assert_eq!(rec.roster(), &seed_roster());
    assert_eq!(remote.fetch_calls(), 1);
}

#[test]
fn undecodable_rows_keep_roster_and_stay_connected() {
    let (store, remote, mut rec) = setup(MemoryRemote::new(), Some(session(false)));
    remote.set_raw_body(Some(
        r#"[{"id":42,"name":"n","type":"unknown","area_id":"tall","checklist":{}}]"#,
    ));

    let outcome = rec.force_sync();
    assert!(matches!(outcome, SyncOutcome::Malformed { .. }), "{outcome:?}");
    assert_eq!(rec.connectivity(), Connectivity::Connected);
    assert_eq!(rec.roster(), &seed_roster());
    assert_eq!(stored_roster(&store), seed_roster());
}

#[test]
fn shared_password_signs_north_admin_in_offline() {
    let session = login(&OfflineRemote, "admin1@gmail.com", "123456", "123456").unwrap();
    assert_eq!(session.role, Role::Admin);
    assert_eq!(session.scope, Scope::Region("north".to_owned()));
    assert!(session.local_only);
    assert_eq!(session.user_id, LOCAL_SESSION_ID);

    let (_, remote, mut rec) = setup(MemoryRemote::new(), None);
    let probes_before = remote.probe_calls();
    assert_eq!(rec.sign_in(session), None);
    assert_eq!(rec.connectivity(), Connectivity::Offline);
    assert_eq!(remote.probe_calls(), probes_before);
    assert_eq!(remote.fetch_calls(), 0);
    assert!(rec.accessible_schools().iter().all(|s| s.area_id == "north"));
    assert!(!rec.accessible_schools().is_empty());
}

#[test]
fn fetch_failure_goes_offline() {
    let (_, remote, mut rec) = setup(MemoryRemote::new(), None);
    remote.set_offline(true);
    assert!(matches!(rec.fetch_remote(), SyncOutcome::Failed { .. }));
    assert_eq!(rec.connectivity(), Connectivity::Offline);
    assert_eq!(rec.force_sync(), SyncOutcome::Unreachable);
    assert_eq!(rec.roster(), &seed_roster());
}

#[test]
fn empty_result_probe_still_syncs() {
    let remote = MemoryRemote::new();
    remote.set_probe_reports_empty(true);
    let (_, remote, rec) = setup(remote, Some(session(false)));
    assert_eq!(rec.connectivity(), Connectivity::Connected);
    assert_eq!(remote.fetch_calls(), 1);
}

#[test]
fn corrupt_local_slot_falls_back_to_seed() {
    let store = Arc::new(MemoryStore::new());
    store.write_slot("ismailia_schools_data", b"{not json").unwrap();
    let rec = Reconciler::bootstrap(LocalMirror::new(Arc::clone(&store)), OfflineRemote);
    assert_eq!(rec.roster(), &seed_roster());
}

#[test]
fn empty_local_slot_falls_back_to_seed() {
    let store = Arc::new(MemoryStore::new());
    store.write_slot("ismailia_schools_data", b"[]").unwrap();
    let rec = Reconciler::bootstrap(LocalMirror::new(Arc::clone(&store)), OfflineRemote);
    assert!(!rec.roster().is_empty());
}

#[test]
fn regional_admin_sees_only_their_schools_after_sync() {
    let remote_schools = vec![
        remote_school("r-1", "north", half_done()),
        remote_school("r-2", "fayed", half_done()),
        remote_school("r-3", "north", Checklist::default()),
    ];
    let mut admin = session(false);
    admin.role = Role::Admin;
    admin.scope = Scope::Region("north".to_owned());
    let (_, _, rec) = setup(MemoryRemote::with_rows(rows(&remote_schools)), Some(admin));
    let ids: Vec<&str> = rec.accessible_schools().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["r-1", "r-3"]);
}

#[test]
fn state_survives_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let id = {
        let store = FileStore::open(dir.path()).unwrap();
        let idp = MemoryIdentityProvider::new();
        let session = login(&idp, "admin5@gmail.com", "123456", "123456").unwrap();
        let mut rec = Reconciler::load(LocalMirror::new(store), OfflineRemote);
        assert_eq!(rec.sign_in(session), None);
        let id = rec.accessible_schools()[0].id.clone();
        assert_eq!(rec.update_checklist(&id, half_done()).unwrap(), EditOutcome::LocalOnly);
        id
    };

    let store = FileStore::open(dir.path()).unwrap();
    let rec = Reconciler::bootstrap(LocalMirror::new(store), OfflineRemote);
    let session = rec.session().unwrap();
    assert!(session.local_only);
    assert_eq!(session.scope, Scope::Region("tall".to_owned()));
    assert_eq!(rec.connectivity(), Connectivity::Offline);
    assert_eq!(rec.roster().get(&id).unwrap().completion_percentage(), 50);
}

fn checklist_strategy() -> impl Strategy<Value = Checklist> {
    prop::array::uniform10(any::<bool>()).prop_map(|flags| {
        ChecklistItem::ALL
            .into_iter()
            .zip(flags)
            .fold(Checklist::default(), |checklist, (item, done)| checklist.with(item, done))
    })
}

proptest! {
    #[test]
    fn repeated_edit_is_idempotent(index in 0_usize..39, checklist in checklist_strategy()) {
        let (store, remote, mut rec) = setup(MemoryRemote::new(), Some(session(false)));
        let id = rec.roster().as_slice()[index % rec.roster().len()].id.clone();

        prop_assert_eq!(rec.update_checklist(&id, checklist).unwrap(), EditOutcome::Synced);
        let once_memory = rec.roster().clone();
        let once_local = stored_roster(&store);
        let once_remote = remote.rows();

        prop_assert_eq!(rec.update_checklist(&id, checklist).unwrap(), EditOutcome::Synced);
        prop_assert_eq!(rec.roster(), &once_memory);
        prop_assert_eq!(stored_roster(&store), once_local);
        prop_assert_eq!(remote.rows(), once_remote);
        prop_assert_eq!(
            rec.roster().get(&id).unwrap().completion_percentage(),
            checklist.completion_percentage()
        );
    }
}
