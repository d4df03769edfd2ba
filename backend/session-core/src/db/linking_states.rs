//! Linking-state database operations
use crate::db::LinkingStateRepo;
use crate::error::Result;
use crate::models::LinkingStateRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgLinkingStateRepo {
    pool: PgPool,
}

impl PgLinkingStateRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkingStateRepo for PgLinkingStateRepo {
    async fn insert(&self, state: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO linking_states (state, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(state)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn take(&self, state: &str) -> Result<Option<LinkingStateRecord>> {
        // Delete-and-return keeps resolution single use even under
        // concurrent callbacks.
        let record = sqlx::query_as::<_, LinkingStateRecord>(
            r#"
            DELETE FROM linking_states
            WHERE state = $1
            RETURNING state, user_id, expires_at, created_at
            "#,
        )
        .bind(state)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}
