use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::error::{Error, Result};

pub fn generate_random_string(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub id: Uuid,
    pub email: String,
    #[serde(rename = "iat")]
    pub issued_at: i64,
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct TokenMaker {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenMaker {
    pub const MIN_KEY_LEN: usize = 32;

    pub fn new(symmetric_key: &str) -> Result<Self> {
        if symmetric_key.len() < Self::MIN_KEY_LEN {
            return Err(Error::Config(format!(
                "token key must be at least {} characters",
                Self::MIN_KEY_LEN
            )));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(symmetric_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(symmetric_key.as_bytes()),
        })
    }

    pub fn create_token(&self, email: &str, duration: Duration) -> Result<(String, TokenPayload)> {
        let issued_at = Utc::now().timestamp();
        let payload = TokenPayload {
            id: Uuid::new_v4(),
            email: email.to_string(),
            issued_at,
            expires_at: issued_at + duration.as_secs() as i64,
        };
        let token = self.sign(&payload)?;
        Ok((token, payload))
    }

    pub fn verify_token(&self, token: &str) -> Result<TokenPayload> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        decode::<TokenPayload>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => Error::Unauthorized("token has expired".to_string()),
                _ => Error::Unauthorized("token is invalid".to_string()),
            })
    }

    fn sign(&self, payload: &TokenPayload) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), payload, &self.encoding_key)
            .map_err(|e| Error::Internal(format!("failed to sign token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "12345678901234567890123456789012";

    #[test]
    fn random_strings_have_requested_length() {
        let code = generate_random_string(32);
        assert_eq!(code.len(), 32);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(code, generate_random_string(32));
    }

    #[test]
    fn rejects_short_keys() {
        assert!(matches!(TokenMaker::new("short"), Err(Error::Config(_))));
    }

    #[test]
    fn round_trips_payload() {
        let maker = TokenMaker::new(KEY).unwrap();
        let (token, payload) = maker
            .create_token("alice@example.com", Duration::from_secs(60))
            .unwrap();
        let verified = maker.verify_token(&token).unwrap();
        assert_eq!(verified, payload);
        assert_eq!(verified.expires_at - verified.issued_at, 60);
    }

    #[test]
    fn expired_token_is_rejected() {
        let maker = TokenMaker::new(KEY).unwrap();
        let now = Utc::now().timestamp();
        let stale = TokenPayload {
            id: Uuid::new_v4(),
            email: "alice@example.com".into(),
            issued_at: now - 120,
            expires_at: now - 60,
        };
        let token = maker.sign(&stale).unwrap();
        match maker.verify_token(&token) {
            Err(Error::Unauthorized(msg)) => assert_eq!(msg, "token has expired"),
            other => panic!("unexpected {:?}", other.map(|p| p.email)),
        }
    }

    #[test]
    fn token_from_other_key_is_invalid() {
        let maker = TokenMaker::new(KEY).unwrap();
        let other = TokenMaker::new("abcdefghijklmnopqrstuvwxyz012345").unwrap();
        let (token, _) = other
            .create_token("bob@example.com", Duration::from_secs(60))
            .unwrap();
        assert!(matches!(maker.verify_token(&token), Err(Error::Unauthorized(_))));
        assert!(matches!(maker.verify_token("garbage"), Err(Error::Unauthorized(_))));
    }
}
