use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::error::AppError;
use crate::models::{Account, NewAccount, Role};

/// Account persistence as seen by the credential subsystem.
///
/// The auth core reads identity fields and writes only `password_hash` and
/// `otp`; everything else belongs to the account CRUD layer, which is an
/// external collaborator behind this trait.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;
    async fn exists_by_username(&self, username: &str) -> Result<bool, AppError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError>;
    async fn exists_by_phone(&self, phone: &str) -> Result<bool, AppError>;
    async fn insert(&self, account: NewAccount) -> Result<Account, AppError>;
    /// Sets a new password hash and clears any stored OTP in one statement.
    async fn update_password_clearing_otp(
        &self,
        account_id: i32,
        password_hash: &str,
    ) -> Result<(), AppError>;
    async fn set_otp(&self, account_id: i32, code: &str) -> Result<(), AppError>;
    /// Clears the stored OTP. Idempotent; clearing an already-empty field is
    /// a no-op.
    async fn clear_otp(&self, account_id: i32) -> Result<(), AppError>;
}

const ACCOUNT_COLUMNS: &str = "id, username, email, password_hash, is_active, role, otp, \
     full_name, phone_number, avatar_url, created_at";

/// Maps a row to an `Account`, rejecting unknown role codes as
/// `RoleNotFound` instead of carrying them as open strings.
fn account_from_row(row: &PgRow) -> Result<Account, AppError> {
    let role_code: String = row.try_get("role")?;
    Ok(Account {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        is_active: row.try_get("is_active")?,
        role: Role::from_code(&role_code)?,
        otp: row.try_get("otp")?,
        full_name: row.try_get("full_name")?,
        phone_number: row.try_get("phone_number")?,
        avatar_url: row.try_get("avatar_url")?,
        created_at: row.try_get("created_at")?,
    })
}

pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by(&self, column: &str, value: &str) -> Result<Option<Account>, AppError> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE {} = $1",
            ACCOUNT_COLUMNS, column
        );
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| account_from_row(&r)).transpose()
    }

    async fn exists_by(&self, column: &str, value: &str) -> Result<bool, AppError> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM accounts WHERE {} = $1)", column);
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        self.find_by("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        self.find_by("email", email).await
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, AppError> {
        self.exists_by("username", username).await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        self.exists_by("email", email).await
    }

    async fn exists_by_phone(&self, phone: &str) -> Result<bool, AppError> {
        self.exists_by("phone_number", phone).await
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, AppError> {
        let sql = format!(
            "INSERT INTO accounts \
                 (username, email, password_hash, is_active, role, full_name, phone_number, avatar_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {}",
            ACCOUNT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&account.username)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(account.is_active)
            .bind(account.role.as_code())
            .bind(&account.full_name)
            .bind(&account.phone_number)
            .bind(&account.avatar_url)
            .fetch_one(&self.pool)
            .await?;
        account_from_row(&row)
    }

    async fn update_password_clearing_otp(
        &self,
        account_id: i32,
        password_hash: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE accounts SET password_hash = $1, otp = NULL WHERE id = $2")
            .bind(password_hash)
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_otp(&self, account_id: i32, code: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE accounts SET otp = $1 WHERE id = $2")
            .bind(code)
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear_otp(&self, account_id: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE accounts SET otp = NULL WHERE id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
