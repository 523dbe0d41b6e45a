use std::fmt;

use thiserror::Error;

/// The two credential-issuing exchanges offered by the auth authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEndpoint {
    Login,
    Refresh,
}

impl fmt::Display for AuthEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthEndpoint::Login => f.write_str("login"),
            AuthEndpoint::Refresh => f.write_str("refresh"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    /// 401: wrong username/password on login, a token the authority no
    /// longer honours on refresh.
    #[error("{endpoint} rejected: {}", rejection_reason(.endpoint))]
    Rejected { endpoint: AuthEndpoint },

    #[error("{endpoint} forbidden for this principal: {body}")]
    Forbidden { endpoint: AuthEndpoint, body: String },

    #[error("Auth server is throttling {endpoint} requests")]
    Throttled { endpoint: AuthEndpoint },

    #[error("Auth server unavailable during {endpoint} ({status}): {body}")]
    Unavailable {
        endpoint: AuthEndpoint,
        status: u16,
        body: String,
    },

    #[error("Unexpected {endpoint} response ({status}): {body}")]
    UnexpectedStatus {
        endpoint: AuthEndpoint,
        status: u16,
        body: String,
    },

    #[error("Could not reach the auth server: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unreadable {endpoint} response: {reason}")]
    MalformedBody { endpoint: AuthEndpoint, reason: String },

    #[error("{endpoint} response did not contain a token")]
    MissingToken { endpoint: AuthEndpoint },
}

fn rejection_reason(endpoint: &AuthEndpoint) -> &'static str {
    match endpoint {
        AuthEndpoint::Login => "wrong username or password",
        AuthEndpoint::Refresh => "the current token is no longer accepted",
    }
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 200;

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes)", &body[..end], body.len())
}

impl ApiError {
    pub fn from_status(endpoint: AuthEndpoint, status: reqwest::StatusCode, body: &str) -> Self {
        let code = status.as_u16();
        match code {
            401 => ApiError::Rejected { endpoint },
            403 => ApiError::Forbidden {
                endpoint,
                body: truncate_body(body),
            },
            429 => ApiError::Throttled { endpoint },
            500..=599 => ApiError::Unavailable {
                endpoint,
                status: code,
                body: truncate_body(body),
            },
            _ => ApiError::UnexpectedStatus {
                endpoint,
                status: code,
                body: truncate_body(body),
            },
        }
    }

    /// True when the authority answered and refused the credential, as
    /// opposed to the exchange failing on the way.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected { .. } | ApiError::Forbidden { .. })
    }
}
