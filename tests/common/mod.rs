//! Shared fixtures for the integration tests: in-memory implementations of
//! the account repository and identity federator, plus a recording mailer.
#![allow(dead_code)] // each test binary uses a different subset

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use planforge_auth::auth::{
    AccountRepository, CredentialService, FederatedProfile, IdentityFederator, InMemorySessionStore,
    Mailer, SessionStore,
};
use planforge_auth::config::{AuthConfig, GoogleOAuthConfig};
use planforge_auth::error::AppError;
use planforge_auth::models::{Account, NewAccount};

#[derive(Default)]
pub struct InMemoryAccountRepository {
    pub accounts: Mutex<Vec<Account>>,
    next_id: AtomicI32,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.accounts.lock().await.len()
    }

    pub async fn stored_otp(&self, username: &str) -> Option<String> {
        let accounts = self.accounts.lock().await;
        accounts
            .iter()
            .find(|a| a.username == username)
            .and_then(|a| a.otp.clone())
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        let accounts = self.accounts.lock().await;
        Ok(accounts.iter().find(|a| a.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let accounts = self.accounts.lock().await;
        Ok(accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, AppError> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn exists_by_phone(&self, phone: &str) -> Result<bool, AppError> {
        let accounts = self.accounts.lock().await;
        Ok(accounts
            .iter()
            .any(|a| a.phone_number.as_deref() == Some(phone)))
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, AppError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = Account {
            id,
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            is_active: account.is_active,
            role: account.role,
            otp: None,
            full_name: account.full_name,
            phone_number: account.phone_number,
            avatar_url: account.avatar_url,
            created_at: Utc::now(),
        };
        self.accounts.lock().await.push(stored.clone());
        Ok(stored)
    }

    async fn update_password_clearing_otp(
        &self,
        account_id: i32,
        password_hash: &str,
    ) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().await;
        if let Some(account) = accounts.iter_mut().find(|a| a.id == account_id) {
            account.password_hash = password_hash.to_string();
            account.otp = None;
        }
        Ok(())
    }

    async fn set_otp(&self, account_id: i32, code: &str) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().await;
        if let Some(account) = accounts.iter_mut().find(|a| a.id == account_id) {
            account.otp = Some(code.to_string());
        }
        Ok(())
    }

    async fn clear_otp(&self, account_id: i32) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().await;
        if let Some(account) = accounts.iter_mut().find(|a| a.id == account_id) {
            account.otp = None;
        }
        Ok(())
    }
}

/// Federator stub returning a fixed profile for any authorization code.
pub struct StubFederator {
    pub profile: FederatedProfile,
}

impl StubFederator {
    pub fn returning(email: &str, name: &str) -> Self {
        Self {
            profile: FederatedProfile {
                email: email.to_string(),
                name: Some(name.to_string()),
                picture: None,
            },
        }
    }
}

#[async_trait]
impl IdentityFederator for StubFederator {
    async fn exchange_code(&self, _code: &str) -> Result<String, AppError> {
        Ok("provider-access-token".to_string())
    }

    async fn fetch_profile(&self, _access_token: &str) -> Result<FederatedProfile, AppError> {
        Ok(self.profile.clone())
    }
}

/// Mailer capturing every message instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        self.sent
            .lock()
            .await
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

pub fn test_auth_config() -> AuthConfig {
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

pub struct TestHarness {
    pub service: CredentialService,
    pub accounts: Arc<InMemoryAccountRepository>,
    pub sessions: Arc<InMemorySessionStore>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn build_harness(config: AuthConfig) -> TestHarness {
    build_harness_with_federator(config, StubFederator::returning("bob@example.com", "Bob"))
}

pub fn build_harness_with_federator(config: AuthConfig, federator: StubFederator) -> TestHarness {
    let accounts = Arc::new(InMemoryAccountRepository::new());
    let sessions = Arc::new(InMemorySessionStore::new());
    let mailer = Arc::new(RecordingMailer::default());

    let service = CredentialService::new(
        accounts.clone() as Arc<dyn AccountRepository>,
        sessions.clone() as Arc<dyn SessionStore>,
        Arc::new(federator),
        mailer.clone() as Arc<dyn Mailer>,
        &config,
    );

    TestHarness {
        service,
        accounts,
        sessions,
        mailer,
    }
}
