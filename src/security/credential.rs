//! Shared-secret credential.

use axum::http::HeaderName;
use subtle::ConstantTimeEq;

use crate::error::AuthFailure;

/// Header in which callers present the shared secret.
pub static GATEKEEPER_PASSWORD_HEADER: HeaderName = HeaderName::from_static("x-gatekeeper-password");

/// The gateway's shared secret. Never logged and never forwarded.
#[derive(Clone)]
pub struct SharedSecret(String);

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exact-equality check in constant time.
    pub fn matches(&self, presented: &[u8]) -> bool {
        self.0.as_bytes().ct_eq(presented).into()
    }

    /// Check an optional presented value.
    pub fn verify(&self, presented: Option<&[u8]>) -> Result<(), AuthFailure> {
        match presented {
            None => Err(AuthFailure::Missing),
            Some(value) if self.matches(value) => Ok(()),
            Some(_) => Err(AuthFailure::Mismatch),
        }
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_only() {
        let secret = SharedSecret::new("password");
        assert!(secret.matches(b"password"));
        assert!(!secret.matches(b"Password"));
        assert!(!secret.matches(b"password "));
        assert!(!secret.matches(b"pass"));
        assert!(!secret.matches(b""));
    }

    #[test]
    fn test_verify() {
        let secret = SharedSecret::new("password");
        assert_eq!(secret.verify(None), Err(AuthFailure::Missing));
        assert_eq!(secret.verify(Some(b"nope")), Err(AuthFailure::Mismatch));
        assert_eq!(secret.verify(Some(b"password")), Ok(()));
    }

    #[test]
    fn test_debug_is_redacted() {
        assert!(!format!("{:?}", SharedSecret::new("password")).contains("password"));
    }
}
