//! Access gate: signed bearer tokens for cart and order endpoints.
//!
//! A token is `base64url(claims JSON) . base64url(SHA-256(secret.payload))`.
//! Verification is a single signature check; the signing secret is injected
//! configuration, never a compile-time constant.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use buyit_core::AccountId;

/// Errors from token verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GateError {
    /// The token is not structurally a payload.signature pair.
    #[error("malformed token")]
    Malformed,
    /// The signature does not match the payload.
    #[error("invalid token signature")]
    BadSignature,
}

/// Claims carried inside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated account.
    pub account_id: AccountId,
    /// Unix timestamp of issuance.
    pub issued_at: i64,
}

/// Token issuer and verifier.
#[derive(Clone)]
pub struct AccessGate {
    secret: SecretString,
}

impl AccessGate {
    /// Create a gate from the injected signing secret.
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Issue a token for `account_id`.
    #[must_use]
    pub fn issue(&self, account_id: AccountId) -> String {
        let claims = Claims {
            account_id,
            issued_at: Utc::now().timestamp(),
        };
        // Claims are two plain fields; serialization cannot fail
        let payload_json = serde_json::to_vec(&claims).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(payload_json);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes()));
        format!("{payload}.{signature}")
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Malformed`] for structurally invalid tokens and
    /// [`GateError::BadSignature`] when the signature does not match.
    pub fn verify(&self, token: &str) -> Result<Claims, GateError> {
        let (payload, signature) = token.split_once('.').ok_or(GateError::Malformed)?;

        let presented = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| GateError::Malformed)?;
        let expected = self.sign(payload.as_bytes());
        if !constant_time_eq(&presented, &expected) {
            return Err(GateError::BadSignature);
        }

        let payload_json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| GateError::Malformed)?;
        serde_json::from_slice(&payload_json).map_err(|_| GateError::Malformed)
    }

    fn sign(&self, payload: &[u8]) -> [u8; 32] {
        let digest = Sha256::new()
            .chain_update(self.secret.expose_secret().as_bytes())
            .chain_update(b".")
            .chain_update(payload)
            .finalize();
        digest.into()
    }
}

/// Compare without short-circuiting on the first mismatched byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0_u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn gate() -> AccessGate {
        AccessGate::new(SecretString::from("kQ9#mZ2$vL7&xW4!pD8@nR5^tG1*cF6%"))
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let gate = gate();
        let token = gate.issue(AccountId::new(42));

        let claims = gate.verify(&token).unwrap();
        assert_eq!(claims.account_id, AccountId::new(42));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let gate = gate();
        let token = gate.issue(AccountId::new(1));

        // Swap in a forged payload claiming another account
        let (_, signature) = token.split_once('.').unwrap();
        let forged_payload =
            URL_SAFE_NO_PAD.encode(br#"{"account_id":2,"issued_at":0}"#);
        let forged = format!("{forged_payload}.{signature}");

        assert_eq!(gate.verify(&forged), Err(GateError::BadSignature));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = gate().issue(AccountId::new(1));
        let other = AccessGate::new(SecretString::from("zX8!bN3$kM6&qJ2@wH9^vC4*rT7%yU1#"));

        assert_eq!(other.verify(&token), Err(GateError::BadSignature));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let gate = gate();
        assert_eq!(gate.verify("no-dot-here"), Err(GateError::Malformed));
        assert_eq!(gate.verify("a.%%%"), Err(GateError::Malformed));
        assert_eq!(gate.verify(""), Err(GateError::Malformed));
    }
}
