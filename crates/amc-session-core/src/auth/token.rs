//! Offline inspection of the bearer credential.
//!
//! The credential is a JWT. Only the payload segment is read; the signature
//! is never checked here since the auth authority does that on every request.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SessionError;

/// Claims embedded in the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated principal
    pub sub: String,
    pub role: String,
    /// Expiry in whole seconds since the epoch
    pub exp: i64,
}

impl Claims {
    /// True once `exp` (seconds) lies before `now_ms` (milliseconds).
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.exp.saturating_mul(1000) < now_ms
    }

    /// Milliseconds left before expiry; zero or negative once expired.
    pub fn millis_remaining(&self, now_ms: i64) -> i64 {
        self.exp.saturating_mul(1000) - now_ms
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Decode the claims of `token` without verifying it.
pub fn decode(token: &str) -> Result<Claims, SessionError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next()) {
        (Some(_header), Some(payload)) => payload,
        _ => {
            return Err(SessionError::MalformedCredential(
                "expected header.payload.signature".to_string(),
            ))
        }
    };

    // Some issuers pad their segments even though JWTs shouldn't be.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| SessionError::MalformedCredential(format!("payload is not base64url: {}", e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| SessionError::MalformedCredential(format!("payload is not valid claims: {}", e)))
}

/// Decode `token` and reject it if it expired before `now_ms`.
pub fn inspect(token: &str, now_ms: i64) -> Result<Claims, SessionError> {
    let claims = decode(token)?;
    if claims.is_expired(now_ms) {
        return Err(SessionError::Expired { expiry: claims.exp });
    }
    Ok(claims)
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mocks::make_token;

    #[test]
    fn test_decode_reads_claims() {
        let token = make_token("user-42", "ADMIN", 1_700_000_000);
        let claims = decode(&token).unwrap();
        assert_eq!(claims.sub, "user-42");
        assert_eq!(claims.role, "ADMIN");
        assert_eq!(claims.exp, 1_700_000_000);
    }

    #[test]
    fn test_decode_ignores_extra_claims() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
        let payload = URL_SAFE_NO_PAD
            .encode(br#"{"sub":"7","role":"EDITOR","exp":10,"iat":1,"iss":"amc"}"#);
        let claims = decode(&format!("{}.{}.", header, payload)).unwrap();
        assert_eq!(claims.role, "EDITOR");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode(""), Err(SessionError::MalformedCredential(_))));
        assert!(matches!(decode("no-dots"), Err(SessionError::MalformedCredential(_))));
        assert!(matches!(decode("a.!!!.c"), Err(SessionError::MalformedCredential(_))));

        let not_claims = URL_SAFE_NO_PAD.encode(br#"{"hello":"world"}"#);
        assert!(matches!(
            decode(&format!("h.{}.s", not_claims)),
            Err(SessionError::MalformedCredential(_))
        ));
    }

    #[test]
    fn test_expiry_compares_seconds_against_millis() {
        let claims = Claims {
            sub: "u".to_string(),
            role: "ADMIN".to_string(),
            exp: 1_000,
        };

        assert!(!claims.is_expired(999_999));
        // Exactly at expiry is not yet expired.
        assert!(!claims.is_expired(1_000_000));
        assert!(claims.is_expired(1_000_001));

        // Comparing seconds to millis directly would call this expired.
        assert!(!claims.is_expired(5_000));
    }

    #[test]
    fn test_millis_remaining() {
        let claims = Claims {
            sub: "u".to_string(),
            role: "ADMIN".to_string(),
            exp: 100,
        };
        assert_eq!(claims.millis_remaining(90_000), 10_000);
        assert_eq!(claims.millis_remaining(100_000), 0);
        assert!(claims.millis_remaining(100_500) < 0);
    }

    #[test]
    fn test_inspect_rejects_expired() {
        let now = now_millis();
        let past = make_token("u", "ADMIN", now / 1000 - 10);
        let future = make_token("u", "ADMIN", now / 1000 + 3600);

        assert!(matches!(inspect(&past, now), Err(SessionError::Expired { .. })));
        assert!(inspect(&future, now).is_ok());
    }
}
