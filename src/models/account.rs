use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Role scope attached to every account and carried in token claims.
///
/// A closed enum with a stable wire form: `"USER"` / `"ADMIN"`. Any other
/// stored role code is a misconfiguration and rejected as `RoleNotFound`
/// rather than flowing through as an open string.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_code(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, AppError> {
        match code {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(AppError::RoleNotFound(format!(
                "Unknown role code: {}",
                other
            ))),
        }
    }
}

/// Represents an account entity as stored in the database.
///
/// The credential subsystem reads and writes `password_hash` and `otp`, and
/// reads the rest; profile mutation belongs to the account CRUD layer.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub role: Role,
    pub otp: Option<String>,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to persist a brand-new account, before an id exists.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub role: Role,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub avatar_url: Option<String>,
}

/// Public view of an account, safe to serialize into API responses.
/// Never carries the password hash or the OTP code.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            role: account.role,
            is_active: account.is_active,
            full_name: account.full_name,
            phone_number: account.phone_number,
            avatar_url: account.avatar_url,
            created_at: account.created_at,
        }
    }
}
