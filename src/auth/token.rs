use crate::config::AuthConfig;
use crate::error::AppError;
use crate::models::Role;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// The two token kinds, signed with independent secrets and lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Short-lived credential carried as a bearer header on each request.
    Access,
    /// Long-lived credential exchanged for new access tokens; its liveness is
    /// tracked in the session store.
    Refresh,
}

/// Represents the claims encoded within a signed token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the account's username.
    pub sub: String,
    /// Issuer identifier.
    pub iss: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
    /// Fresh random token identifier, unique per issued token.
    pub jti: String,
    /// Identity key of the account the token was issued for.
    #[serde(rename = "accountId")]
    pub account_id: i32,
    /// Role scope of the account at issuance time.
    pub scope: Role,
}

/// Verification failure kinds.
///
/// Signature and expiry are evaluated independently: decoding runs with expiry
/// validation disabled so a tampered-but-expired token still reports
/// `InvalidSignature`, and only a well-signed stale token reports `Expired`.
#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    InvalidSignature,
    Expired,
    Malformed,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenError::InvalidSignature => write!(f, "invalid token signature"),
            TokenError::Expired => write!(f, "token expired"),
            TokenError::Malformed => write!(f, "malformed token"),
        }
    }
}

/// Token-verification failures surface to callers as `Unauthenticated`.
impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        AppError::Unauthenticated(error.to_string())
    }
}

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl SigningKeys {
    fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }
}

/// Encodes and verifies signed access/refresh tokens (HMAC-SHA-512).
///
/// Stateless apart from its configuration; cheap to clone and safe to call
/// concurrently from any number of workers.
#[derive(Clone)]
pub struct TokenCodec {
    issuer: String,
    access: SigningKeys,
    refresh: SigningKeys,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            issuer: config.token_issuer.clone(),
            access: SigningKeys::new(&config.access_token_secret, config.access_token_ttl),
            refresh: SigningKeys::new(&config.refresh_token_secret, config.refresh_token_ttl),
        }
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Issues a signed token of the given kind for an account.
    ///
    /// Each call produces a fresh `jti`, so two tokens issued in the same
    /// second are still distinguishable.
    pub fn issue(
        &self,
        subject: &str,
        account_id: i32,
        scope: Role,
        kind: TokenKind,
    ) -> Result<String, AppError> {
        let keys = self.keys(kind);
        let now = chrono::Utc::now().timestamp() as usize;

        let claims = Claims {
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now + keys.lifetime.as_secs() as usize,
            jti: Uuid::new_v4().to_string(),
            account_id,
            scope,
        };

        encode(&Header::new(Algorithm::HS512), &claims, &keys.encoding)
            .map_err(|e| AppError::InternalServerError(format!("Failed to sign token: {}", e)))
    }

    /// Verifies a token string against the given kind's secret and lifetime.
    ///
    /// Returns `InvalidSignature` when the signature does not match (even if
    /// the token is also expired), `Expired` when the signature is good but
    /// the expiry instant has passed, and `Malformed` for undecodable input.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let keys = self.keys(kind);

        // Expiry is checked by hand below so that a bad signature is never
        // reported as a mere expiry.
        let mut validation = Validation::new(Algorithm::HS512);
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })?;

        let now = chrono::Utc::now().timestamp() as usize;
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoogleOAuthConfig;

    fn test_config() -> AuthConfig {
        AuthConfig {
            access_token_secret: "access-secret-for-tests".to_string(),
            refresh_token_secret: "refresh-secret-for-tests".to_string(),
            access_token_ttl: Duration::from_secs(900),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            otp_ttl: Duration::from_secs(300),
            token_issuer: "planforge.app".to_string(),
            google: GoogleOAuthConfig {
                client_id: String::new(),
                client_secret: String::new(),
                redirect_uri: String::new(),
                token_url: String::new(),
                userinfo_url: String::new(),
            },
            upstream_timeout: Duration::from_secs(10),
        }
    }

    fn expired_claims(subject: &str) -> Claims {
        let past = (chrono::Utc::now().timestamp() - 7200) as usize;
        Claims {
            sub: subject.to_string(),
            iss: "planforge.app".to_string(),
            iat: past - 60,
            exp: past,
            jti: Uuid::new_v4().to_string(),
            account_id: 7,
            scope: Role::User,
        }
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let codec = TokenCodec::new(&test_config());
        let token = codec
            .issue("alice", 42, Role::Admin, TokenKind::Access)
            .unwrap();
        let claims = codec.verify(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.account_id, 42);
        assert_eq!(claims.scope, Role::Admin);
        assert_eq!(claims.iss, "planforge.app");
    }

    #[test]
    fn test_token_ids_are_unique() {
        let codec = TokenCodec::new(&test_config());
        let first = codec.issue("alice", 1, Role::User, TokenKind::Access).unwrap();
        let second = codec.issue("alice", 1, Role::User, TokenKind::Access).unwrap();
        let a = codec.verify(&first, TokenKind::Access).unwrap();
        let b = codec.verify(&second, TokenKind::Access).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_kinds_use_independent_secrets() {
        let codec = TokenCodec::new(&test_config());
        let refresh = codec
            .issue("alice", 1, Role::User, TokenKind::Refresh)
            .unwrap();

        // A refresh token presented as an access token must fail the
        // signature check, not merely look odd.
        assert_eq!(
            codec.verify(&refresh, TokenKind::Access),
            Err(TokenError::InvalidSignature)
        );
        assert!(codec.verify(&refresh, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn test_expired_token_with_valid_signature() {
        let codec = TokenCodec::new(&test_config());
        let claims = expired_claims("bob");
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret("access-secret-for-tests".as_bytes()),
        )
        .unwrap();

        assert_eq!(
            codec.verify(&token, TokenKind::Access),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_tampered_and_expired_reports_invalid_signature() {
        let codec = TokenCodec::new(&test_config());
        let claims = expired_claims("bob");
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret("a-completely-different-secret".as_bytes()),
        )
        .unwrap();

        // Signature failure takes precedence over expiry.
        assert_eq!(
            codec.verify(&token, TokenKind::Access),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_garbage_input_is_malformed() {
        let codec = TokenCodec::new(&test_config());
        assert_eq!(
            codec.verify("not-a-token", TokenKind::Access),
            Err(TokenError::Malformed)
        );
    }
}
