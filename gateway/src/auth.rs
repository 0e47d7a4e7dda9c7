use crate::config::{SessionStoreConfig, StaticSession};
use crate::errors::GatewayError;
use async_trait::async_trait;
use http::header::{COOKIE, HeaderMap};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub use shared::http::ACCESS_TOKEN_HEADER;

/// Authentication material of the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthContext {
    /// Bearer credential forwarded by the middleware
    Token { value: String },
    /// Server-side session resolved from the caller's cookies
    Session {
        access_token: String,
        user_id: String,
    },
}

impl AuthContext {
    /// The credential sent downstream as `Authorization: Bearer <token>`.
    pub fn bearer_token(&self) -> &str {
        match self {
            AuthContext::Token { value } => value,
            AuthContext::Session { access_token, .. } => access_token,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    Token,
    Session,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Token => "token",
            AuthMode::Session => "session",
        }
    }
}

/// Strategy resolving an [`AuthContext`] from request headers.
///
/// Implementations only read; they never validate token signatures, which is
/// the identity provider's job.
#[async_trait]
pub trait AuthResolver: Send + Sync {
    fn mode(&self) -> AuthMode;

    async fn resolve(&self, headers: &HeaderMap) -> Result<AuthContext, GatewayError>;
}

/// Reads the token from the `x-access-token` header.
pub struct TokenHeaderResolver;

#[async_trait]
impl AuthResolver for TokenHeaderResolver {
    fn mode(&self) -> AuthMode {
        AuthMode::Token
    }

    async fn resolve(&self, headers: &HeaderMap) -> Result<AuthContext, GatewayError> {
        let raw = headers
            .get(ACCESS_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();

        let token = raw.strip_prefix("Bearer ").map(str::trim).unwrap_or(raw);
        if token.is_empty() {
            return Err(GatewayError::Unauthorized);
        }

        Ok(AuthContext::Token {
            value: token.to_string(),
        })
    }
}

/// Cookies sent by the caller, both raw (for forwarding) and parsed.
#[derive(Clone, Debug, Default)]
pub struct Cookies {
    raw: String,
    values: HashMap<String, String>,
}

impl Cookies {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let raw = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ");

        let mut values = HashMap::new();
        for pair in raw.split(';') {
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    values
                        .entry(name.to_string())
                        .or_insert_with(|| value.trim().trim_matches('"').to_string());
                }
            }
        }

        Cookies { raw, values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
}

impl From<StaticSession> for Session {
    fn from(s: StaticSession) -> Self {
        Session {
            access_token: s.access_token,
            user_id: s.user_id,
        }
    }
}

/// External store that maps a caller's cookies to a session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_session(&self, cookies: &Cookies) -> Option<Session>;
}

/// Resolves the caller's session through a [`SessionStore`].
pub struct SessionResolver {
    store: Arc<dyn SessionStore>,
}

impl SessionResolver {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        SessionResolver { store }
    }
}

#[async_trait]
impl AuthResolver for SessionResolver {
    fn mode(&self) -> AuthMode {
        AuthMode::Session
    }

    async fn resolve(&self, headers: &HeaderMap) -> Result<AuthContext, GatewayError> {
        let cookies = Cookies::from_headers(headers);
        if cookies.is_empty() {
            return Err(GatewayError::Unauthorized);
        }

        match self.store.find_session(&cookies).await {
            Some(session) if !session.access_token.is_empty() => Ok(AuthContext::Session {
                access_token: session.access_token,
                user_id: session.user_id,
            }),
            _ => Err(GatewayError::Unauthorized),
        }
    }
}

/// In-process sessions keyed by the value of a single cookie.
pub struct StaticSessionStore {
    cookie_name: String,
    sessions: HashMap<String, Session>,
}

impl StaticSessionStore {
    pub fn new(cookie_name: impl Into<String>, sessions: HashMap<String, Session>) -> Self {
        StaticSessionStore {
            cookie_name: cookie_name.into(),
            sessions,
        }
    }
}

#[async_trait]
impl SessionStore for StaticSessionStore {
    async fn find_session(&self, cookies: &Cookies) -> Option<Session> {
        let key = cookies.get(&self.cookie_name)?;
        self.sessions.get(key).cloned()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteSessionResponse {
    access_token: String,
    user_id: String,
}

/// Session endpoint of the identity provider.
///
/// The caller's `Cookie` header is forwarded unchanged; a 200 answer with
/// `{accessToken, userId}` is a session, anything else is not.
pub struct RemoteSessionStore {
    client: reqwest::Client,
    url: Url,
}

impl RemoteSessionStore {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(RemoteSessionStore { client, url })
    }
}

#[async_trait]
impl SessionStore for RemoteSessionStore {
    async fn find_session(&self, cookies: &Cookies) -> Option<Session> {
        let response = self
            .client
            .get(self.url.clone())
            .header(COOKIE, cookies.raw())
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "session store unreachable");
                return None;
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            tracing::debug!(status = %response.status(), "no session for caller");
            return None;
        }

        match response.json::<RemoteSessionResponse>().await {
            Ok(body) => Some(Session {
                access_token: body.access_token,
                user_id: body.user_id,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "malformed session store response");
                None
            }
        }
    }
}

pub fn session_store_from_config(
    config: &SessionStoreConfig,
) -> Result<Arc<dyn SessionStore>, reqwest::Error> {
    let store: Arc<dyn SessionStore> = match config {
        SessionStoreConfig::Static {
            cookie_name,
            sessions,
        } => Arc::new(StaticSessionStore::new(
            cookie_name.clone(),
            sessions
                .iter()
                .map(|(k, v)| (k.clone(), Session::from(v.clone())))
                .collect(),
        )),
        SessionStoreConfig::Remote { url, timeout_secs } => Arc::new(RemoteSessionStore::new(
            url.clone(),
            Duration::from_secs(*timeout_secs),
        )?),
    };
    Ok(store)
}
