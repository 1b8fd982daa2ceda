//! Remote side of qroster: the hosted school collection and the identity
//! provider.
//!
//! Both are reached through traits ([`RemoteStore`], [`IdentityProvider`]) so
//! the reconciler never depends on a transport. [`http`] holds the blocking
//! REST clients; [`memory`] holds the doubles used by tests and by offline
//! runs.

pub mod http;
pub mod memory;
pub mod row;

use std::sync::Arc;

use qroster_error::Result;

pub use http::{GoTrueProvider, PostgrestStore, RemoteEndpoint};
pub use memory::{MemoryIdentityProvider, MemoryRemote, OfflineRemote};
pub use row::{RemoteRow, decode_rows};

/// PostgREST code meaning "the result contains no rows". A probe that fails
/// with this code has still reached the collection.
pub const EMPTY_RESULT_CODE: &str = "PGRST116";

/// Row-oriented remote collection of school records.
pub trait RemoteStore {
    /// Cheapest possible existence query against the collection.
    fn probe(&self) -> Result<()>;

    /// Every row of the collection.
    fn fetch_all(&self) -> Result<Vec<RemoteRow>>;

    /// Insert or replace one full row, keyed by `id`.
    fn upsert(&self, row: &RemoteRow) -> Result<()>;

    /// Bearer token for subsequent requests; `None` reverts to the anonymous key.
    fn set_access_token(&self, _token: Option<&str>) {}
}

/// Identity returned by a successful provider sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub access_token: Option<String>,
}

/// External password authentication.
pub trait IdentityProvider {
    fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity>;

    fn sign_out(&self, access_token: &str) -> Result<()>;
}

impl<T: RemoteStore + ?Sized> RemoteStore for Arc<T> {
    fn probe(&self) -> Result<()> {
        (**self).probe()
    }

    fn fetch_all(&self) -> Result<Vec<RemoteRow>> {
        (**self).fetch_all()
    }

    fn upsert(&self, row: &RemoteRow) -> Result<()> {
        (**self).upsert(row)
    }

    fn set_access_token(&self, token: Option<&str>) {
        (**self).set_access_token(token);
    }
}

impl<T: RemoteStore + ?Sized> RemoteStore for Box<T> {
    fn probe(&self) -> Result<()> {
        (**self).probe()
    }

    fn fetch_all(&self) -> Result<Vec<RemoteRow>> {
        (**self).fetch_all()
    }

    fn upsert(&self, row: &RemoteRow) -> Result<()> {
        (**self).upsert(row)
    }

    fn set_access_token(&self, token: Option<&str>) {
        (**self).set_access_token(token);
    }
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for Box<T> {
    fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity> {
        (**self).sign_in_with_password(email, password)
    }

    fn sign_out(&self, access_token: &str) -> Result<()> {
        (**self).sign_out(access_token)
    }
}
