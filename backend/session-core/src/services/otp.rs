//! One-time-code issuance and verification
//!
//! A code lives for five minutes, fixed by the protocol. Delivery is
//! fire-and-forget: a mailer failure is logged and never surfaces to the
//! caller, who would otherwise learn nothing actionable.
use crate::db::OtpRequestRepo;
use crate::error::{AuthError, Result};
use crate::models::User;
use crate::security::otp::{generate_code, hash_code, verify_code};
use crate::services::mailer::{mask_email, OtpMailer};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const OTP_TTL_MINUTES: i64 = 5;

#[derive(Clone)]
pub struct OtpService {
    repo: Arc<dyn OtpRequestRepo>,
    mailer: Arc<dyn OtpMailer>,
}

impl OtpService {
    pub fn new(repo: Arc<dyn OtpRequestRepo>, mailer: Arc<dyn OtpMailer>) -> Self {
        Self { repo, mailer }
    }

    /// Generate a fresh code for a user, persist its hash, dispatch it
    pub async fn request(&self, user: &User) -> Result<()> {
        let code = generate_code();
        let code_hash = hash_code(&code)?;
        let expires_at = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);

        self.repo.insert(user.id, &code_hash, expires_at).await?;

        if let Err(err) = self.mailer.send_otp_email(&user.email, &code).await {
            warn!(
                user_id = %user.id,
                recipient = %mask_email(&user.email),
                error = %err,
                "failed to deliver verification code; code remains valid"
            );
        }

        info!(
            user_id = %user.id,
            recipient = %mask_email(&user.email),
            "verification code issued"
        );
        Ok(())
    }

    /// Verify a presented code against the user's most recent request
    ///
    /// A consumed record rejects reuse even inside its expiry window; see
    /// DESIGN.md for the reasoning behind enforcing the flag.
    pub async fn verify(&self, user_id: Uuid, presented_code: &str) -> Result<()> {
        let record = self
            .repo
            .latest_for_user(user_id)
            .await?
            .ok_or(AuthError::OtpNotFound)?;

        if record.is_expired(Utc::now()) {
            return Err(AuthError::OtpExpired);
        }

        if record.consumed {
            warn!(user_id = %user_id, "already-consumed verification code presented again");
            return Err(AuthError::OtpConsumed);
        }

        if !verify_code(presented_code, &record.code_hash)? {
            return Err(AuthError::OtpMismatch);
        }

        self.repo.mark_consumed(record.id).await?;
        Ok(())
    }
}
