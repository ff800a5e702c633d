pub mod extractors;
pub mod federation;
pub mod mailer;
pub mod middleware;
pub mod otp;
pub mod password;
pub mod repository;
pub mod service;
pub mod session;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

// Re-export necessary items
pub use extractors::AuthenticatedAccount;
pub use federation::{FederatedProfile, GoogleFederator, IdentityFederator};
pub use mailer::{LogMailer, Mailer};
pub use middleware::AuthMiddleware;
pub use otp::OtpStore;
pub use password::{hash_password, verify_password};
pub use repository::{AccountRepository, PgAccountRepository};
pub use service::{CredentialService, IssuedTokens, SendOtpOutcome, UniqueCheck};
pub use session::{InMemorySessionStore, RedisSessionStore, SessionStore};
pub use token::{Claims, TokenCodec, TokenError, TokenKind};

/// Name of the HTTP-only cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

lazy_static! {
    // Regex for username validation: alphanumeric, underscores, hyphens
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username of the account to authenticate.
    #[validate(length(min = 3, max = 32))]
    pub username: String,
    /// User's password.
    /// Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Represents the payload for a new account registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username for the new account.
    /// Must be between 3 and 32 characters, alphanumeric, and can include underscores or hyphens.
    #[validate(
        length(min = 3, max = 32),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    /// Email address for the new account.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// Password for the new account.
    /// Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
    /// Optional display name.
    #[validate(length(max = 100))]
    pub full_name: Option<String>,
    /// Optional phone number, kept unique across accounts.
    #[validate(length(min = 7, max = 20))]
    pub phone_number: Option<String>,
}

/// Payload for token introspection.
#[derive(Debug, Deserialize, Validate)]
pub struct IntrospectRequest {
    #[validate(length(min = 1))]
    pub token: String,
}

/// Payload asking whether registration fields are still available.
#[derive(Debug, Deserialize, Validate)]
pub struct UniqueCheckRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
}

/// Payload verifying a password-reset code without consuming it.
#[derive(Debug, Deserialize, Validate)]
pub struct OtpCheckRequest {
    #[validate(length(min = 3, max = 32))]
    pub username: String,
    #[validate(length(equal = 6))]
    pub otp: String,
}

/// Payload consuming a password-reset code to set a new password.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 3, max = 32))]
    pub username: String,
    #[validate(length(equal = 6))]
    pub otp: String,
    #[validate(length(min = 6))]
    pub new_password: String,
}

/// Query string for the send-OTP endpoint; the key may be an email or a
/// username.
#[derive(Debug, Deserialize)]
pub struct SendOtpQuery {
    pub key: String,
}

/// Query string for the OAuth2 callback exchange.
#[derive(Debug, Deserialize)]
pub struct OutboundAuthQuery {
    pub code: String,
}

/// Response structure after successful authentication.
/// Contains the signed access token; the refresh token travels only as an
/// HTTP-only cookie and never appears in a body.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IntrospectResponse {
    pub valid: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UniqueCheckResponse {
    pub is_email_valid: bool,
    pub is_phone_valid: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendOtpResponse {
    pub username: Option<String>,
    pub email: Option<String>,
    pub valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_login_request_validation() {
        let valid_login = LoginRequest {
            username: "test_user".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid_login.validate().is_ok());

        let short_username_login = LoginRequest {
            username: "tu".to_string(),
            password: "password123".to_string(),
        };
        assert!(short_username_login.validate().is_err());

        let short_password_login = LoginRequest {
            username: "test_user".to_string(),
            password: "123".to_string(),
        };
        assert!(short_password_login.validate().is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let valid_register = RegisterRequest {
            username: "test_user-123".to_string(),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
            full_name: Some("Test User".to_string()),
            phone_number: Some("5551234567".to_string()),
        };
        assert!(valid_register.validate().is_ok());

        let invalid_username_register = RegisterRequest {
            username: "test user!".to_string(), // Contains space and exclamation
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
            full_name: None,
            phone_number: None,
        };
        assert!(invalid_username_register.validate().is_err());

        let invalid_email_register = RegisterRequest {
            username: "test_user".to_string(),
            email: "testexample.com".to_string(),
            password: "password123".to_string(),
            full_name: None,
            phone_number: None,
        };
        assert!(invalid_email_register.validate().is_err());
    }

    #[test]
    fn test_otp_code_must_be_six_characters() {
        let valid = OtpCheckRequest {
            username: "test_user".to_string(),
            otp: "042137".to_string(),
        };
        assert!(valid.validate().is_ok());

        let too_short = OtpCheckRequest {
            username: "test_user".to_string(),
            otp: "4213".to_string(),
        };
        assert!(too_short.validate().is_err());
    }
}
