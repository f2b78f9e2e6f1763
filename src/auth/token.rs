//! Session tokens: HS256 JWTs carrying the user id and email

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::{AuthError, AuthResult};
use crate::config::AuthConfig;

/// Shortest accepted signing secret, in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Token payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    /// Issued at, seconds since the epoch
    pub iat: u64,
    /// Expiry, seconds since the epoch
    pub exp: u64,
}

/// Signs and verifies session tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    /// Build from config, generating a random secret when none usable is set
    pub fn from_config(config: &AuthConfig) -> Self {
        if config.jwt_secret.len() >= MIN_SECRET_LEN {
            return Self::new(config.jwt_secret.as_bytes(), config.token_ttl_secs);
        }

        if !config.jwt_secret.is_empty() {
            tracing::warn!(
                min_len = MIN_SECRET_LEN,
                "auth.jwt_secret is too short, using a random secret"
            );
        } else {
            tracing::info!("No auth.jwt_secret set, tokens will not survive a restart");
        }

        let mut secret = [0u8; MIN_SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::new(&secret, config.token_ttl_secs)
    }

    /// Issue a token for a user
    pub fn issue(&self, user_id: &str, email: &str) -> AuthResult<String> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> AuthResult<String> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    /// Check signature and expiry
    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected token");
                AuthError::InvalidToken
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::new(SECRET, 3600);
        let token = issuer.issue("user-1", "ada@example.com").unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenIssuer::new(SECRET, 3600)
            .issue("user-1", "ada@example.com")
            .unwrap();
        let other = TokenIssuer::new(b"ffffffffffffffffffffffffffffffff", 3600);
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(other.verify("garbage"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = TokenIssuer::new(SECRET, 3600);
        let now = chrono::Utc::now().timestamp() as u64;
        let token = issuer
            .sign(&Claims {
                sub: "user-1".to_string(),
                email: "ada@example.com".to_string(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();

        assert!(matches!(issuer.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_short_secret_replaced() {
        let config = AuthConfig {
            jwt_secret: "short".to_string(),
            token_ttl_secs: 60,
        };
        let a = TokenIssuer::from_config(&config);
        let b = TokenIssuer::from_config(&config);

        let token = a.issue("user-1", "ada@example.com").unwrap();
        assert!(a.verify(&token).is_ok());
        assert!(b.verify(&token).is_err());
    }
}
