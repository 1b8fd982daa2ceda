//! Blocking REST clients for a PostgREST collection and a GoTrue-style
//! password grant endpoint.
//!
//! Transport failures map to [`RosterError::RemoteUnavailable`]; non-success
//! responses map to [`RosterError::RemoteRejected`] carrying the server's
//! error code when the body has one. A collection body that arrives but does
//! not decode is [`RosterError::MalformedRow`].

use std::time::Duration;

use parking_lot::RwLock;
use qroster_error::{Result, RosterError};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::row::{RemoteRow, decode_rows};
use crate::{Identity, IdentityProvider, RemoteStore};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the hosted backend lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    /// Project base URL, e.g. `https://<project>.supabase.co`.
    pub url: String,
    /// Public anonymous key sent as `apikey`.
    pub anon_key: String,
    /// Collection name.
    pub table: String,
    pub timeout: Duration,
}

impl RemoteEndpoint {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            table: "schools".to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    fn base(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// `<base>/rest/v1/<table>`
    pub fn collection_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base(), self.table)
    }

    /// `<base>/auth/v1/<path>`
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base(), path.trim_start_matches('/'))
    }

    fn client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| RosterError::config(format!("http client: {err}")))
    }
}

/// Error body shape shared by PostgREST and GoTrue.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

fn rejection(status: u16, body: &str) -> RosterError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed
        .error_code
        .or_else(|| match parsed.code {
            Some(serde_json::Value::String(code)) => Some(code),
            Some(serde_json::Value::Number(code)) => Some(code.to_string()),
            _ => None,
        })
        .or(parsed.error)
        .unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.msg)
        .or(parsed.error_description)
        .unwrap_or_else(|| body.chars().take(200).collect());
    RosterError::RemoteRejected {
        status,
        code,
        message,
    }
}

fn send(request: RequestBuilder) -> Result<Response> {
    let response = request
        .send()
        .map_err(|err| RosterError::unavailable(err.to_string()))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(rejection(status.as_u16(), &body))
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// PostgREST-backed [`RemoteStore`].
#[derive(Debug)]
pub struct PostgrestStore {
    client: Client,
    endpoint: RemoteEndpoint,
    access_token: RwLock<Option<String>>,
}

impl PostgrestStore {
    pub fn new(endpoint: RemoteEndpoint) -> Result<Self> {
        Ok(Self {
            client: endpoint.client()?,
            endpoint,
            access_token: RwLock::new(None),
        })
    }

    pub const fn endpoint(&self) -> &RemoteEndpoint {
        &self.endpoint
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self
            .access_token
            .read()
            .clone()
            .unwrap_or_else(|| self.endpoint.anon_key.clone());
        request
            .header("apikey", &self.endpoint.anon_key)
            .bearer_auth(bearer)
    }
}

impl RemoteStore for PostgrestStore {
    fn probe(&self) -> Result<()> {
        let request = self
            .client
            .get(self.endpoint.collection_url())
            .query(&[("select", "id"), ("limit", "1")])
            .header("Prefer", "count=exact");
        send(self.authorize(request))?;
        Ok(())
    }

    fn fetch_all(&self) -> Result<Vec<RemoteRow>> {
        let request = self
            .client
            .get(self.endpoint.collection_url())
            .query(&[("select", "*")]);
        let body = send(self.authorize(request))?
            .text()
            .map_err(|err| RosterError::unavailable(format!("reading rows: {err}")))?;
        let rows = decode_rows(&body)?;
        debug!(rows = rows.len(), table = %self.endpoint.table, "remote rows fetched");
        Ok(rows)
    }

    fn upsert(&self, row: &RemoteRow) -> Result<()> {
        let request = self
            .client
            .post(self.endpoint.collection_url())
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row]);
        send(self.authorize(request))?;
        debug!(school_id = %row.id, "remote row upserted");
        Ok(())
    }

    fn set_access_token(&self, token: Option<&str>) {
        *self.access_token.write() = token.map(str::to_owned);
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// GoTrue password-grant [`IdentityProvider`].
#[derive(Debug)]
pub struct GoTrueProvider {
    client: Client,
    endpoint: RemoteEndpoint,
}

impl GoTrueProvider {
    pub fn new(endpoint: RemoteEndpoint) -> Result<Self> {
        Ok(Self {
            client: endpoint.client()?,
            endpoint,
        })
    }
}

impl IdentityProvider for GoTrueProvider {
    fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity> {
        let request = self
            .client
            .post(self.endpoint.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.endpoint.anon_key)
            .json(&json!({ "email": email, "password": password }));
        let token: TokenResponse = send(request)?
            .json()
            .map_err(|err| {
                RosterError::unavailable(format!("undecodable token response: {err}"))
            })?;
        info!(user_id = %token.user.id, "identity provider accepted credentials");
        Ok(Identity {
            id: token.user.id,
            email: token.user.email.unwrap_or_else(|| email.to_owned()),
            access_token: Some(token.access_token),
        })
    }

    fn sign_out(&self, access_token: &str) -> Result<()> {
        let request = self
            .client
            .post(self.endpoint.auth_url("logout"))
            .header("apikey", &self.endpoint.anon_key)
            .bearer_auth(access_token);
        send(request)?;
        Ok(())
    }
}
