use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::auth::federation::IdentityFederator;
use crate::auth::mailer::Mailer;
use crate::auth::otp::OtpStore;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repository::AccountRepository;
use crate::auth::session::SessionStore;
use crate::auth::token::{TokenCodec, TokenKind};
use crate::auth::RegisterRequest;
use crate::config::AuthConfig;
use crate::error::AppError;
use crate::models::{Account, NewAccount, Role};

/// Access/refresh pair handed back from a successful login.
///
/// The route layer turns the refresh half into an HTTP-only cookie; the
/// access half travels in the response body.
#[derive(Debug)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_ttl: Duration,
}

/// Outcome of a send-OTP request. `valid == false` means no account matched
/// the key; the response never says whether the key was tried as an email or
/// a username.
#[derive(Debug)]
pub struct SendOtpOutcome {
    pub valid: bool,
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug)]
pub struct UniqueCheck {
    pub email_available: bool,
    pub phone_available: bool,
}

/// Orchestrates the authentication use cases over the token codec, the
/// session store, the OTP store, and the identity federator.
///
/// Each use case is a short synchronous sequence with explicit failure
/// short-circuiting; there is no long-lived state across requests. Domain
/// failures map to distinct `AppError` kinds; store and network failures
/// propagate as-is and are never converted into authentication verdicts.
pub struct CredentialService {
    accounts: Arc<dyn AccountRepository>,
    sessions: Arc<dyn SessionStore>,
    federator: Arc<dyn IdentityFederator>,
    mailer: Arc<dyn Mailer>,
    tokens: TokenCodec,
    otp: OtpStore,
    refresh_ttl: Duration,
}

impl CredentialService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        sessions: Arc<dyn SessionStore>,
        federator: Arc<dyn IdentityFederator>,
        mailer: Arc<dyn Mailer>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            tokens: TokenCodec::new(config),
            otp: OtpStore::new(Arc::clone(&accounts), config.otp_ttl),
            refresh_ttl: config.refresh_token_ttl,
            accounts,
            sessions,
            federator,
            mailer,
        }
    }

    /// Codec handle for request middleware that verifies bearer tokens.
    pub fn token_codec(&self) -> &TokenCodec {
        &self.tokens
    }

    /// Authenticates a username/password pair and opens a session.
    ///
    /// A new refresh token is written to the session store under the account
    /// key, which invalidates whatever refresh token a previous login left
    /// there (last write wins).
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedTokens, AppError> {
        let account = self
            .accounts
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound("No account for that username".into()))?;

        if !verify_password(password, &account.password_hash)? || !account.is_active {
            return Err(AppError::Unauthenticated("Invalid credentials".into()));
        }

        let access_token =
            self.tokens
                .issue(&account.username, account.id, account.role, TokenKind::Access)?;
        let refresh_token =
            self.tokens
                .issue(&account.username, account.id, account.role, TokenKind::Refresh)?;

        self.sessions
            .set(account.id, &refresh_token, self.refresh_ttl)
            .await?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            refresh_ttl: self.refresh_ttl,
        })
    }

    /// Creates a new account. Uniqueness is checked username, then email,
    /// then phone; the first violation wins and nothing is persisted.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Account, AppError> {
        if self.accounts.exists_by_username(&request.username).await? {
            return Err(AppError::UsernameExists("Username already taken".into()));
        }
        if self.accounts.exists_by_email(&request.email).await? {
            return Err(AppError::EmailExists("Email already registered".into()));
        }
        if let Some(phone) = &request.phone_number {
            if self.accounts.exists_by_phone(phone).await? {
                return Err(AppError::PhoneExists("Phone number already registered".into()));
            }
        }

        let password_hash = hash_password(&request.password)?;

        self.accounts
            .insert(NewAccount {
                username: request.username.clone(),
                email: request.email.clone(),
                password_hash,
                is_active: true,
                role: Role::User,
                full_name: request.full_name.clone(),
                phone_number: request.phone_number.clone(),
                avatar_url: None,
            })
            .await
    }

    /// Reports whether an access token is currently valid. Bad tokens are a
    /// `false`, never an error.
    pub fn introspect(&self, token: &str) -> bool {
        self.tokens.verify(token, TokenKind::Access).is_ok()
    }

    pub async fn check_unique(
        &self,
        email: &str,
        phone: &str,
    ) -> Result<UniqueCheck, AppError> {
        Ok(UniqueCheck {
            email_available: !self.accounts.exists_by_email(email).await?,
            phone_available: !self.accounts.exists_by_phone(phone).await?,
        })
    }

    /// Exchanges a live refresh token for a new access token.
    ///
    /// The presented token must verify against the refresh secret AND
    /// byte-for-byte equal the session store's current value for the account.
    /// The refresh token itself is not rotated; it stays valid until its own
    /// expiry or until a later login overwrites it. Every domain failure on
    /// this path is reported as `Unauthenticated`.
    pub async fn refresh(&self, presented: &str) -> Result<String, AppError> {
        let claims = self.tokens.verify(presented, TokenKind::Refresh)?;

        let account = self
            .accounts
            .find_by_username(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("Unknown refresh subject".into()))?;

        // A refresh racing a concurrent login may observe the just-written
        // newer token here and fail; that conservative outcome is intended.
        match self.sessions.get(account.id).await? {
            Some(stored) if stored == presented => {}
            _ => return Err(AppError::Unauthenticated("Refresh token is no longer valid".into())),
        }

        self.tokens
            .issue(&account.username, account.id, account.role, TokenKind::Access)
    }

    /// Issues a password-reset code for the account matching `key`, which is
    /// tried as an email first and as a username second.
    ///
    /// When nothing matches, the outcome is `valid == false` rather than an
    /// error, and a hit does not reveal which field matched.
    pub async fn send_otp(&self, key: &str) -> Result<SendOtpOutcome, AppError> {
        let account = match self.accounts.find_by_email(key).await? {
            Some(account) => Some(account),
            None => self.accounts.find_by_username(key).await?,
        };

        let account = match account {
            Some(account) => account,
            None => {
                return Ok(SendOtpOutcome {
                    valid: false,
                    username: None,
                    email: None,
                })
            }
        };

        let code = self.otp.issue(account.id).await?;
        self.mailer
            .send_email(
                &account.email,
                "PlanForge password reset",
                &format!("Your one-time code is {}.", code),
            )
            .await?;

        Ok(SendOtpOutcome {
            valid: true,
            username: Some(account.username),
            email: Some(account.email),
        })
    }

    /// Compares a candidate code against the account's stored one.
    pub async fn check_otp(&self, username: &str, code: &str) -> Result<bool, AppError> {
        let account = self
            .accounts
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound("No account for that username".into()))?;
        Ok(self.otp.check(&account, code))
    }

    /// Consumes the reset code to set a new password.
    ///
    /// On a match, the password hash and the code are replaced/cleared in one
    /// statement. On a mismatch the password is untouched but the code is
    /// still cleared, so a code survives exactly one change-password attempt.
    pub async fn change_password(
        &self,
        username: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let account = self
            .accounts
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound("No account for that username".into()))?;

        if !self.otp.check(&account, code) {
            self.otp.clear(account.id).await?;
            return Err(AppError::OtpInvalid("One-time code does not match".into()));
        }

        let password_hash = hash_password(new_password)?;
        self.accounts
            .update_password_clearing_otp(account.id, &password_hash)
            .await
    }

    /// Federated login: exchanges the provider authorization code, fetches
    /// the external profile, and finds or creates the local account by email.
    ///
    /// Only an access token is issued on this path; no refresh cookie is set.
    pub async fn outbound_authenticate(&self, code: &str) -> Result<String, AppError> {
        let provider_token = self.federator.exchange_code(code).await?;
        let profile = self.federator.fetch_profile(&provider_token).await?;

        let account = match self.accounts.find_by_email(&profile.email).await? {
            Some(account) => account,
            None => {
                log::info!("Creating account for federated login: {}", profile.email);
                let username = self.derive_username(&profile.email).await?;
                // Nobody ever logs in with this password; it only keeps the
                // column non-empty and unguessable.
                let password_hash = hash_password(&Uuid::new_v4().to_string())?;
                self.accounts
                    .insert(NewAccount {
                        username,
                        email: profile.email.clone(),
                        password_hash,
                        is_active: true,
                        role: Role::User,
                        full_name: profile.name.clone(),
                        phone_number: None,
                        avatar_url: profile.picture.clone(),
                    })
                    .await?
            }
        };

        if !account.is_active {
            return Err(AppError::AccountDisabled("Account is deactivated".into()));
        }

        self.tokens
            .issue(&account.username, account.id, account.role, TokenKind::Access)
    }

    /// Derives a unique username from the email local part, resolving
    /// collisions with a numeric suffix: `bob`, `bob1`, `bob2`, ...
    async fn derive_username(&self, email: &str) -> Result<String, AppError> {
        let base = email.split('@').next().unwrap_or(email).to_lowercase();
        let mut candidate = base.clone();
        let mut counter = 1;
        while self.accounts.exists_by_username(&candidate).await? {
            candidate = format!("{}{}", base, counter);
            counter += 1;
        }
        Ok(candidate)
    }
}
