use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Identity read from the user-management collaborator
///
/// This core never mutates users; it only needs the credential hash and the
/// two-factor flag to drive session issuance.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub two_factor_enabled: bool,
}
