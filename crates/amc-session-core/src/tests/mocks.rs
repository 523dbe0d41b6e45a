//! Mock implementations for testing

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::api::{ApiError, AuthApi, AuthEndpoint};
use crate::auth::token::now_millis;
use crate::auth::{CredentialStore, MemoryStore, PathNavigator, SessionController};

/// Build an unsigned JWT carrying the given claims.
pub fn make_token(sub: &str, role: &str, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = serde_json::json!({ "sub": sub, "role": role, "exp": exp });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    format!("{}.{}.fake_signature", header, payload)
}

pub fn now_secs() -> i64 {
    now_millis() / 1000
}

/// Auth authority that answers every exchange with a canned outcome.
pub struct StubApi {
    issued: Option<String>,
    refresh_calls: Arc<AtomicUsize>,
}

impl StubApi {
    pub fn issuing(token: &str) -> Self {
        Self {
            issued: Some(token.to_string()),
            refresh_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            issued: None,
            refresh_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Counter shared with the stub, readable after the stub has moved
    /// into a controller.
    pub fn refresh_counter(&self) -> Arc<AtomicUsize> {
        self.refresh_calls.clone()
    }

    fn answer(&self, endpoint: AuthEndpoint) -> Result<String, ApiError> {
        self.issued.clone().ok_or(ApiError::Rejected { endpoint })
    }
}

impl AuthApi for StubApi {
    async fn login(&self, _username: &str, _password: &str) -> Result<String, ApiError> {
        self.answer(AuthEndpoint::Login)
    }

    async fn refresh(&self, _token: &str) -> Result<String, ApiError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(AuthEndpoint::Refresh)
    }
}

/// Auth authority whose refresh answers arrive after a delay.
///
/// Each refresh call takes the next scripted `(delay, issued)` pair in call
/// order; `None` answers with a rejection. Meant for paused-clock tests.
pub struct DelayedApi {
    script: Mutex<VecDeque<(Duration, Option<String>)>>,
}

impl DelayedApi {
    pub fn new(script: impl IntoIterator<Item = (u64, Option<&'static str>)>) -> Self {
        let script = script
            .into_iter()
            .map(|(ms, issued)| (Duration::from_millis(ms), issued.map(str::to_string)))
            .collect();
        Self {
            script: Mutex::new(script),
        }
    }
}

impl AuthApi for DelayedApi {
    async fn login(&self, _username: &str, _password: &str) -> Result<String, ApiError> {
        Err(ApiError::Rejected {
            endpoint: AuthEndpoint::Login,
        })
    }

    async fn refresh(&self, _token: &str) -> Result<String, ApiError> {
        let next = self.script.lock().unwrap().pop_front();
        let (delay, issued) = next.expect("refresh called more often than scripted");
        tokio::time::sleep(delay).await;
        issued.ok_or(ApiError::Rejected {
            endpoint: AuthEndpoint::Refresh,
        })
    }
}

/// Controller over an in-memory slot and navigator positioned at `path`.
pub fn controller<A: AuthApi>(
    token: Option<String>,
    api: A,
    path: &str,
) -> (SessionController<A>, Arc<PathNavigator>) {
    let store: Arc<dyn CredentialStore> = match token {
        Some(t) => Arc::new(MemoryStore::with_token(t)),
        None => Arc::new(MemoryStore::new()),
    };
    let nav = Arc::new(PathNavigator::new(path));
    (SessionController::new(store, api, nav.clone()), nav)
}
