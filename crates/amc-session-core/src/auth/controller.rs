//! Session lifecycle controller.
//!
//! The controller is the only component that changes the token slot after
//! start-up. It never caches validity: every getter reads the store and
//! decodes the token again, so the store stays the single source of truth.
//!
//! Every failure (undecodable token, expired token, rejected refresh) ends
//! the same way: the slot is cleared and the route-aware logout policy runs.
//! None of them is returned to callers.

use std::sync::{Arc, Mutex, MutexGuard};

use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, AuthApi};

use super::policy::{landing_path, logout_action, LogoutAction};
use super::token::{self, now_millis, Claims};
use super::{CredentialStore, Navigator, SessionError};

/// Derived view over the stored credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    NoSession,
    Valid(Claims),
}

/// Outcome of one liveness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCheck {
    /// Nothing stored; logout policy applied.
    NoSession,
    /// Stored token is expired or undecodable; cleared and logout policy applied.
    Expired,
    /// Token is live and should be refreshed.
    Live { remaining_ms: i64 },
}

/// Bookkeeping that orders writes to the token slot.
#[derive(Debug, Default)]
struct SlotState {
    /// Bumped by sign-in and logout. A refresh started under an older
    /// generation never touches the slot.
    generation: u64,
    /// Sequence number handed to the most recently started refresh.
    next_request: u64,
    /// Sequence number of the refresh whose token is in the slot.
    last_applied: u64,
}

/// Identity of one in-flight refresh.
#[derive(Debug, Clone, Copy)]
struct RefreshTicket {
    seq: u64,
    generation: u64,
}

impl SlotState {
    fn issue_ticket(&mut self) -> RefreshTicket {
        self.next_request += 1;
        RefreshTicket {
            seq: self.next_request,
            generation: self.generation,
        }
    }

    /// A refresh answer is stale once the slot was replaced or cleared, or a
    /// later refresh already landed.
    fn is_stale(&self, ticket: RefreshTicket) -> bool {
        self.generation != ticket.generation || self.last_applied > ticket.seq
    }
}

pub struct SessionController<A: AuthApi = ApiClient> {
    store: Arc<dyn CredentialStore>,
    api: A,
    navigator: Arc<dyn Navigator>,
    slot: Mutex<SlotState>,
}

impl<A: AuthApi> SessionController<A> {
    pub fn new(store: Arc<dyn CredentialStore>, api: A, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            store,
            api,
            navigator,
            slot: Mutex::new(SlotState::default()),
        }
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    fn lock_slot(&self) -> MutexGuard<'_, SlotState> {
        // The guarded value is plain counters, so a poisoned lock is still usable.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load_token(&self) -> Option<String> {
        match self.store.read() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read token slot, treating as empty");
                None
            }
        }
    }

    fn write_token(&self, token: &str) {
        if let Err(e) = self.store.write(token) {
            warn!(error = %e, "Failed to write token slot");
        }
    }

    /// Raw stored token, valid or not.
    pub fn token(&self) -> Option<String> {
        self.load_token()
    }

    /// Store a token issued by a login or refresh exchange.
    pub fn set_credential(&self, token: &str) {
        let mut slot = self.lock_slot();
        self.write_token(token);
        slot.generation += 1;
    }

    /// `Authorization: Bearer <token>` whenever a token is stored.
    ///
    /// Expiry is deliberately not checked; the remote side rejects stale
    /// tokens on its own.
    pub fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.load_token() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(header::AUTHORIZATION, value);
                }
                Err(e) => warn!(error = %e, "Stored token is not a valid header value"),
            }
        }
        headers
    }

    fn claims(&self) -> Option<Claims> {
        let token = self.load_token()?;
        match token::inspect(&token, now_millis()) {
            Ok(claims) => Some(claims),
            Err(e) => {
                debug!(error = %e, "Stored token does not yield a session");
                None
            }
        }
    }

    pub fn user_id(&self) -> Option<String> {
        self.claims().map(|c| c.sub)
    }

    pub fn role(&self) -> Option<String> {
        self.claims().map(|c| c.role)
    }

    /// Expiry of the live session, in seconds since the epoch
    pub fn expiry(&self) -> Option<i64> {
        self.claims().map(|c| c.exp)
    }

    pub fn session_state(&self) -> SessionState {
        match self.claims() {
            Some(claims) => SessionState::Valid(claims),
            None => SessionState::NoSession,
        }
    }

    /// Clear the slot, then apply the route-aware policy for the current path.
    pub fn logout(&self) -> LogoutAction {
        let had_token = {
            let mut slot = self.lock_slot();
            let had_token = self.load_token().is_some();
            if let Err(e) = self.store.clear() {
                warn!(error = %e, "Failed to clear token slot");
            }
            slot.generation += 1;
            had_token
        };

        let path = self.navigator.current_path();
        let action = logout_action(had_token, &path);
        debug!(had_token, path = %path, ?action, "Logged out");
        self.navigator.apply(&action);
        action
    }

    /// Exchange the current token for a fresh one.
    ///
    /// No-op without a token. An expired or undecodable token, or any failure
    /// of the exchange, logs out instead. Failures are not retried.
    ///
    /// When refreshes overlap, the token from the most recently started one
    /// wins regardless of completion order. Answers arriving after a sign-in
    /// or logout are dropped.
    pub async fn refresh(&self) {
        let (existing, ticket) = {
            let mut slot = self.lock_slot();
            match self.load_token() {
                Some(token) => (token, slot.issue_ticket()),
                None => return,
            }
        };

        let claims = match token::inspect(&existing, now_millis()) {
            Ok(claims) => claims,
            Err(e) => {
                info!(error = %e, "Cannot refresh, logging out");
                self.logout();
                return;
            }
        };

        match self.api.refresh(&existing).await {
            Ok(issued) => {
                let mut slot = self.lock_slot();
                if slot.is_stale(ticket) {
                    debug!(sub = %claims.sub, seq = ticket.seq, "Discarding superseded refresh");
                    return;
                }
                self.write_token(&issued);
                slot.last_applied = ticket.seq;
                debug!(sub = %claims.sub, seq = ticket.seq, "Session refreshed");
            }
            Err(e) => {
                let stale = self.lock_slot().is_stale(ticket);
                if stale {
                    debug!(error = %e, seq = ticket.seq, "Superseded refresh failed, ignoring");
                    return;
                }
                let rejected = e.is_rejection();
                let e = SessionError::from(e);
                if rejected {
                    info!(error = %e, sub = %claims.sub, "Refresh rejected, logging out");
                } else {
                    warn!(error = %e, sub = %claims.sub, "Refresh failed, logging out");
                }
                self.logout();
            }
        }
    }

    /// One liveness check. Logs out when there is no live session; a
    /// `Live` result means the caller should refresh.
    pub fn check_session(&self) -> SessionCheck {
        if self.load_token().is_none() {
            self.logout();
            return SessionCheck::NoSession;
        }

        let now = now_millis();
        let remaining_ms = self
            .claims()
            .map(|c| c.millis_remaining(now))
            .unwrap_or(-1);

        if remaining_ms <= 0 {
            info!("Session expired");
            self.logout();
            return SessionCheck::Expired;
        }

        SessionCheck::Live { remaining_ms }
    }

    /// Sign in against the auth authority and store the issued token.
    ///
    /// Unlike the lifecycle operations this surfaces its error: reporting a
    /// failed sign-in is the caller's job. Returns the landing path for the
    /// signed-in role.
    pub async fn login(&self, username: &str, password: &str) -> Result<&'static str, ApiError> {
        let token = self.api.login(username, password).await?;
        self.set_credential(&token);

        let role = self.role();
        info!(username = username, role = ?role, "Signed in");
        Ok(landing_path(role.as_deref()))
    }
}
