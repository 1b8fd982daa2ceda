//! Session establishment with the offline fallback path.

use qroster_error::{Result, RosterError};
use qroster_remote::{Identity, IdentityProvider};
use qroster_types::{LOCAL_SESSION_ID, RegionLookup, Role, Scope, Session, region_for_email};
use tracing::{info, warn};

/// Shared password that admits a known administrator when the identity
/// provider cannot be used.
pub const FALLBACK_PASSWORD: &str = "123456";

/// Trim and lowercase an email for lookup and comparison.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_uppercase()
}

fn role_and_scope(email: &str) -> (Role, Scope) {
    match region_for_email(email) {
        Some(RegionLookup::All) => (Role::SuperAdmin, Scope::AllRegions),
        Some(RegionLookup::Region(area)) => (Role::Admin, Scope::Region(area.to_owned())),
        None => (Role::Admin, Scope::Unassigned),
    }
}

/// Session for an identity the provider accepted.
pub fn session_for_identity(identity: Identity) -> Session {
    let email = normalize_email(&identity.email);
    let (role, scope) = role_and_scope(&email);
    Session {
        user_id: identity.id,
        display_name: display_name(&email),
        email,
        role,
        scope,
        local_only: false,
        access_token: identity.access_token,
    }
}

fn local_session(email: String) -> Session {
    let (role, scope) = role_and_scope(&email);
    Session {
        user_id: LOCAL_SESSION_ID.to_owned(),
        display_name: display_name(&email),
        email,
        role,
        scope,
        local_only: true,
        access_token: None,
    }
}

/// Authenticate `email`/`password`.
///
/// The provider is tried first. If it fails for any reason, a local-only
/// session is granted when `password` equals `fallback_password` and the
/// email belongs to a known administrator.
///
/// # Errors
/// [`RosterError::InvalidCredentials`] when both paths refuse. The provider's
/// own error is logged but never surfaced.
pub fn login<P: IdentityProvider + ?Sized>(
    provider: &P,
    email: &str,
    password: &str,
    fallback_password: &str,
) -> Result<Session> {
    let email = normalize_email(email);
    match provider.sign_in_with_password(&email, password) {
        Ok(identity) => {
            let session = session_for_identity(identity);
            info!(email = %session.email, role = %session.role, "signed in");
            Ok(session)
        }
        Err(err) => {
            warn!(email = %email, error = %err, "identity provider refused sign-in");
            if password == fallback_password && region_for_email(&email).is_some() {
                warn!(email = %email, "falling back to a local-only session");
                Ok(local_session(email))
            } else {
                Err(RosterError::InvalidCredentials)
            }
        }
    }
}
