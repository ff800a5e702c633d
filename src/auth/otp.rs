use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::repository::AccountRepository;
use crate::error::AppError;
use crate::models::Account;

/// Transient one-time-code holder for the password-reset flow.
///
/// Codes live on the account row; expiry is enforced by an in-process delayed
/// task armed at issuance, not by a store TTL. A process restart before the
/// timer fires leaves the code logically stale until the field is next
/// overwritten (documented trade-off, kept faithful to current behavior).
pub struct OtpStore {
    accounts: Arc<dyn AccountRepository>,
    ttl: Duration,
}

impl OtpStore {
    pub fn new(accounts: Arc<dyn AccountRepository>, ttl: Duration) -> Self {
        Self { accounts, ttl }
    }

    /// Fixed 6 decimal digits, left-zero-padded, from a CSPRNG.
    fn generate_code() -> String {
        format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
    }

    /// Generates a fresh code, persists it on the account (overwriting any
    /// prior code), and arms the delayed clear.
    ///
    /// At most one code is live per account; the timer armed for a replaced
    /// code fires against the newer value and clears it early in the worst
    /// case, which only shortens the reset window, never extends it.
    pub async fn issue(&self, account_id: i32) -> Result<String, AppError> {
        let code = Self::generate_code();
        self.accounts.set_otp(account_id, &code).await?;
        self.schedule_clear(account_id);
        Ok(code)
    }

    /// Exact string match against the currently stored code. A consumed or
    /// expired code is `None` and never matches.
    pub fn check(&self, account: &Account, candidate: &str) -> bool {
        account.otp.as_deref() == Some(candidate)
    }

    /// Clears the stored code. Idempotent: clearing an account without a live
    /// code is a no-op.
    pub async fn clear(&self, account_id: i32) -> Result<(), AppError> {
        self.accounts.clear_otp(account_id).await
    }

    /// Arms a one-shot background task that clears the code after the
    /// configured lifetime. Runs off the request path; its failure is logged
    /// and swallowed.
    fn schedule_clear(&self, account_id: i32) {
        let accounts = Arc::clone(&self.accounts);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Err(e) = accounts.clear_otp(account_id).await {
                log::warn!(
                    "Failed to clear expired OTP for account {}: {}",
                    account_id,
                    e
                );
            }
        });
    }
}
