//! One-time-code request database operations
use crate::db::OtpRequestRepo;
use crate::error::Result;
use crate::models::OtpRequestRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgOtpRequestRepo {
    pool: PgPool,
}

impl PgOtpRequestRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpRequestRepo for PgOtpRequestRepo {
    async fn insert(
        &self,
        user_id: Uuid,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<OtpRequestRecord> {
        let record = sqlx::query_as::<_, OtpRequestRecord>(
            r#"
            INSERT INTO otp_requests (id, user_id, code_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, code_hash, expires_at, consumed, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(code_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn latest_for_user(&self, user_id: Uuid) -> Result<Option<OtpRequestRecord>> {
        let record = sqlx::query_as::<_, OtpRequestRecord>(
            r#"
            SELECT id, user_id, code_hash, expires_at, consumed, created_at
            FROM otp_requests
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn mark_consumed(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE otp_requests
            SET consumed = TRUE
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
