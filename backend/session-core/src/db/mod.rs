//! Repository traits and Postgres implementations
//!
//! Every component of the core receives its datastore as an injected trait
//! object rather than reaching for a shared handle, so protocol logic can be
//! exercised against in-memory doubles.
use crate::config::DatabaseSettings;
use crate::error::Result;
use crate::models::{LinkingStateRecord, OtpRequestRecord, RefreshTokenRecord, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

pub mod linking_states;
pub mod otp_requests;
pub mod refresh_tokens;
pub mod users;

#[cfg(test)]
pub(crate) mod memory;

pub use linking_states::PgLinkingStateRepo;
pub use otp_requests::PgOtpRequestRepo;
pub use refresh_tokens::PgRefreshTokenRepo;
pub use users::PgUserDirectory;

/// Create a connection pool from database settings
pub async fn create_pool(settings: &DatabaseSettings) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout))
        .connect(&settings.url)
        .await?;
    Ok(pool)
}

/// Read-only view of the user-management collaborator
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
}

/// Persistence for hashed refresh tokens
#[async_trait]
pub trait RefreshTokenRepo: Send + Sync {
    async fn insert(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord>;

    /// All records for a user, revoked and expired ones included. Lookup by
    /// presented value is a hash-compare scan over these; callers must not
    /// assume O(1).
    async fn all_for_user(&self, user_id: Uuid) -> Result<Vec<RefreshTokenRecord>>;

    /// Flip `is_revoked` and stamp `last_used_at`, but only if the row is not
    /// already revoked. Returns whether this call won the flip; a concurrent
    /// rotation that lost observes `false` and reports a replay.
    async fn mark_revoked(&self, id: Uuid) -> Result<bool>;

    async fn touch_last_used(&self, id: Uuid) -> Result<()>;

    /// Delete rows that are both revoked and expired. Idempotent.
    async fn delete_swept(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// Persistence for one-time-code requests
#[async_trait]
pub trait OtpRequestRepo: Send + Sync {
    async fn insert(
        &self,
        user_id: Uuid,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<OtpRequestRecord>;

    async fn latest_for_user(&self, user_id: Uuid) -> Result<Option<OtpRequestRecord>>;

    async fn mark_consumed(&self, id: Uuid) -> Result<()>;
}

/// Persistence for external-provider linking states
#[async_trait]
pub trait LinkingStateRepo: Send + Sync {
    async fn insert(&self, state: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<()>;

    /// Read and delete in one step so a state can only ever resolve once.
    async fn take(&self, state: &str) -> Result<Option<LinkingStateRecord>>;
}
