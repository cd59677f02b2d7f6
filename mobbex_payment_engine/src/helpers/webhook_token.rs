//! # Webhook security token
//!
//! Mobbex appends a `mobbex_token` parameter to the webhook and return URLs it calls back. The token is not a
//! signature over the body; it is a per-installation shared secret derived from the API credentials:
//!
//! ```text
//!     token = hex( sha256( "{api_key}|{access_token}" ) )
//! ```
//!
//! Both the webhook gate and the redirect/return flow validate the same token, so the derivation lives here in the
//! engine rather than in the server crate.
//!
//! Validation compares the presented token against the derived one in constant time. A failed comparison is an
//! authentication failure and nothing else; callers must not conflate it with malformed payloads or store errors.
use mwg_common::Secret;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Derives the expected webhook token for the given installation credentials.
pub fn derive_webhook_token(api_key: &str, access_token: &str) -> String {
    let digest = Sha256::digest(format!("{api_key}|{access_token}").as_bytes());
    hex::encode(digest)
}

/// Validates incoming webhook tokens against a per-installation secret.
///
/// Pure and stateless beyond the derived token; cheap to clone into request handlers.
#[derive(Clone, Debug)]
pub struct WebhookTokenValidator {
    expected: Secret<String>,
}

impl WebhookTokenValidator {
    pub fn new(api_key: &str, access_token: &Secret<String>) -> Self {
        let expected = derive_webhook_token(api_key, access_token.reveal());
        Self { expected: Secret::new(expected) }
    }

    pub fn validate(&self, token: &str) -> bool {
        self.expected.reveal().as_bytes().ct_eq(token.as_bytes()).into()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn validator() -> WebhookTokenValidator {
        WebhookTokenValidator::new("app-key-123", &Secret::new("access-token-456".to_string()))
    }

    #[test]
    fn valid_token_is_accepted() {
        let token = derive_webhook_token("app-key-123", "access-token-456");
        assert!(validator().validate(&token));
    }

    #[test]
    fn invalid_tokens_are_rejected() {
        let v = validator();
        assert!(!v.validate(""));
        assert!(!v.validate("deadbeef"));
        let other = derive_webhook_token("app-key-123", "some-other-token");
        assert!(!v.validate(&other));
    }

    #[test]
    fn token_is_case_sensitive() {
        let token = derive_webhook_token("app-key-123", "access-token-456").to_uppercase();
        assert!(!validator().validate(&token));
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = derive_webhook_token("k", "t");
        let b = derive_webhook_token("k", "t");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }
}
