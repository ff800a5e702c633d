use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::error::AppError;

/// Key-value store holding the single currently-valid refresh token per
/// account, with per-entry TTL.
///
/// `set` overwrites any prior value for the same account, which is what makes
/// a later login silently invalidate refresh tokens from earlier ones. The
/// store is the sole authority on whether a refresh token is still alive;
/// signature and expiry checks alone are not enough.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn set(&self, account_id: i32, token: &str, ttl: Duration) -> Result<(), AppError>;
    async fn get(&self, account_id: i32) -> Result<Option<String>, AppError>;
    async fn delete(&self, account_id: i32) -> Result<(), AppError>;
    async fn exists(&self, account_id: i32) -> Result<bool, AppError>;
}

fn session_key(account_id: i32) -> String {
    format!("refresh_token:{}", account_id)
}

/// Production store backed by Redis, relying on its native key expiry.
///
/// `ConnectionManager` multiplexes and reconnects under the hood, so clones
/// are cheap and every call grabs its own handle.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let client = Client::open(redis_url)
            .map_err(|e| AppError::UpstreamUnavailable(format!("Invalid Redis URL: {}", e)))?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn set(&self, account_id: i32, token: &str, ttl: Duration) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(session_key(account_id), token, ttl.as_secs())
            .await?;
        Ok(())
    }

    async fn get(&self, account_id: i32) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.clone();
        let token: Option<String> = conn.get(session_key(account_id)).await?;
        Ok(token)
    }

    async fn delete(&self, account_id: i32) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(session_key(account_id)).await?;
        Ok(())
    }

    async fn exists(&self, account_id: i32) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(session_key(account_id)).await?;
        Ok(exists)
    }
}

/// Dev/test store keeping entries in process memory.
///
/// Expiry is enforced lazily on read; entries never outlive their deadline
/// from a caller's point of view.
#[derive(Default)]
pub struct InMemorySessionStore {
    entries: RwLock<HashMap<i32, (String, Instant)>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn set(&self, account_id: i32, token: &str, ttl: Duration) -> Result<(), AppError> {
        let mut entries = self.entries.write().await;
        entries.insert(account_id, (token.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn get(&self, account_id: i32) -> Result<Option<String>, AppError> {
        let mut entries = self.entries.write().await;
        let expired = match entries.get(&account_id) {
            Some((_, deadline)) => *deadline <= Instant::now(),
            None => return Ok(None),
        };
        if expired {
            entries.remove(&account_id);
            return Ok(None);
        }
        Ok(entries.get(&account_id).map(|(token, _)| token.clone()))
    }

    async fn delete(&self, account_id: i32) -> Result<(), AppError> {
        let mut entries = self.entries.write().await;
        entries.remove(&account_id);
        Ok(())
    }

    async fn exists(&self, account_id: i32) -> Result<bool, AppError> {
        Ok(self.get(account_id).await?.is_some())
    }
}
