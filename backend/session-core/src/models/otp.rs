use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One-time-code request
///
/// The code itself is stored only as a slow salted hash. The most recently
/// created record for a user is the one checked at verification time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OtpRequestRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
    pub created_at: DateTime<Utc>,
}

impl OtpRequestRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
