//! Connectivity probe.

use qroster_remote::{EMPTY_RESULT_CODE, RemoteStore};
use qroster_types::Connectivity;
use tracing::{debug, warn};

/// Classify the remote as reachable or not with one existence query.
///
/// A failure carrying the "no rows" code still means the collection
/// answered, so it counts as connected. Every other error is offline.
pub fn probe_connectivity<R: RemoteStore + ?Sized>(remote: &R) -> Connectivity {
    match remote.probe() {
        Ok(()) => {
            debug!("connectivity probe succeeded");
            Connectivity::Connected
        }
        Err(err) if err.remote_code() == Some(EMPTY_RESULT_CODE) => {
            debug!("connectivity probe reached an empty collection");
            Connectivity::Connected
        }
        Err(err) => {
            warn!(error = %err, "connectivity probe failed");
            Connectivity::Offline
        }
    }
}
