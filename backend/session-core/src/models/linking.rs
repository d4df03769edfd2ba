use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Short-lived correlation record for external-provider linking
///
/// Ties a provider callback (which cannot carry the caller's session token
/// through a third-party redirect) back to the originating user. Single use:
/// resolving a state removes the row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LinkingStateRecord {
    pub state: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
