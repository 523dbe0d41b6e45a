use thiserror::Error;

use crate::api::ApiError;

/// Reasons a stored credential does not yield a live session.
///
/// The controller treats every variant the same way (the session is absent
/// and the logout policy runs); the distinction only reaches the logs.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Malformed credential: {0}")]
    MalformedCredential(String),

    #[error("Credential expired at {expiry}")]
    Expired { expiry: i64 },

    #[error("Refresh rejected: {0}")]
    RefreshRejected(#[from] ApiError),
}
