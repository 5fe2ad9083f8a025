use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use axum::http::{header, HeaderMap};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::access::SessionState;
use super::domain::Principal;

pub const SESSION_COOKIE_NAME: &str = "estate_hub_session";

/// Opaque bearer token naming a server-side session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 24];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(Base64UrlUnpadded::encode_string(&bytes))
    }

    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

        cookie_header
            .split(';')
            .map(str::trim)
            .filter_map(|cookie| cookie.strip_prefix(SESSION_COOKIE_NAME)?.strip_prefix('='))
            .find(|value| !value.is_empty())
            .map(|value| Self(value.to_string()))
    }

    pub fn to_cookie_header(&self) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/",
            SESSION_COOKIE_NAME, self.0
        )
    }

    pub fn expired_cookie_header() -> String {
        format!(
            "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
            SESSION_COOKIE_NAME
        )
    }
}

/// Sessions one principal may hold at once. Opening another closes the oldest.
pub const MAX_SESSIONS_PER_PRINCIPAL: usize = 5;

struct OpenSession {
    principal: Principal,
    serial: u64,
}

#[derive(Default)]
struct SessionTable {
    next_serial: u64,
    open: HashMap<SessionToken, OpenSession>,
}

impl SessionTable {
    fn evict_oldest_beyond_cap(&mut self, identifier: &str) {
        let mut owned: Vec<(u64, SessionToken)> = self
            .open
            .iter()
            .filter(|(_, session)| session.principal.identifier == identifier)
            .map(|(token, session)| (session.serial, token.clone()))
            .collect();
        if owned.len() <= MAX_SESSIONS_PER_PRINCIPAL {
            return;
        }

        owned.sort_unstable_by_key(|(serial, _)| *serial);
        let excess = owned.len() - MAX_SESSIONS_PER_PRINCIPAL;
        for (_, token) in owned.into_iter().take(excess) {
            self.open.remove(&token);
        }
        debug!(identifier, evicted = excess, "oldest sessions closed");
    }
}

/// Principals of open sessions, keyed by token. Nothing survives a restart.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<SessionTable>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, principal: Principal) -> SessionToken {
        let token = SessionToken::generate();
        debug!(identifier = %principal.identifier, "session opened");

        let mut table = self.sessions();
        let serial = table.next_serial;
        table.next_serial += 1;
        let identifier = principal.identifier.clone();
        table
            .open
            .insert(token.clone(), OpenSession { principal, serial });
        table.evict_oldest_beyond_cap(&identifier);
        token
    }

    pub fn resolve(&self, token: Option<&SessionToken>) -> SessionState {
        token
            .and_then(|token| {
                self.sessions()
                    .open
                    .get(token)
                    .map(|session| session.principal.clone())
            })
            .into()
    }

    /// Returns whether a session was actually closed.
    pub fn close(&self, token: &SessionToken) -> bool {
        let closed = self.sessions().open.remove(token).is_some();
        if closed {
            debug!("session closed");
        }
        closed
    }

    pub fn len(&self) -> usize {
        self.sessions().open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions().open.is_empty()
    }

    fn sessions(&self) -> MutexGuard<'_, SessionTable> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
