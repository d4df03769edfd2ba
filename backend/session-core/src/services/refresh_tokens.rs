//! Refresh token store and rotation protocol
//!
//! Refresh tokens are long-lived bearer secrets, so only a one-way hash is
//! ever persisted; a presented value is matched by re-hashing and comparing,
//! never by reverse lookup. Rotation is single use: exchanging a token
//! persists its replacement before revoking it, so a crash mid-rotation
//! leaves the old token valid rather than locking the user out.
use crate::db::RefreshTokenRepo;
use crate::error::{AuthError, Result};
use crate::models::{RefreshTokenRecord, User};
use crate::security::tokens::{TokenSigner, TokenType};
use crate::services::session::TokenPair;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Hash a raw refresh token for at-rest storage
///
/// The raw value is a signed token with a fresh 128-bit `jti`, so a fast
/// hash is sound here; the slow salted hash is reserved for low-entropy
/// secrets (passwords, OTP codes).
pub fn hash_refresh_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Clone)]
pub struct RefreshTokenService {
    repo: Arc<dyn RefreshTokenRepo>,
    signer: Arc<TokenSigner>,
}

impl RefreshTokenService {
    pub fn new(repo: Arc<dyn RefreshTokenRepo>, signer: Arc<TokenSigner>) -> Self {
        Self { repo, signer }
    }

    /// Persist the hash of a freshly issued raw refresh token
    pub async fn issue(
        &self,
        user_id: Uuid,
        raw_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let token_hash = hash_refresh_token(raw_token);
        self.repo.insert(user_id, &token_hash, expires_at).await?;
        Ok(())
    }

    /// Find the record matching a presented raw token and check its state
    ///
    /// Scans every record for the user and compares hashes; the count is
    /// bounded by rotation plus the sweeper, but this is O(n), not a keyed
    /// lookup. On a match:
    /// - revoked record: the value was already rotated or logged out, so
    ///   this is a replay
    /// - expired record: revoked as a side effect, then reported expired
    /// - otherwise the record is live and `last_used_at` is stamped
    pub async fn validate(&self, user_id: Uuid, raw_token: &str) -> Result<RefreshTokenRecord> {
        let presented_hash = hash_refresh_token(raw_token);
        let records = self.repo.all_for_user(user_id).await?;

        let Some(record) = records.into_iter().find(|r| r.token_hash == presented_hash) else {
            return Err(AuthError::TokenInvalid);
        };

        if record.is_revoked {
            warn!(
                user_id = %user_id,
                record_id = %record.id,
                "revoked refresh token presented again; possible replay or stolen token"
            );
            return Err(AuthError::TokenReplayed);
        }

        if record.is_expired(Utc::now()) {
            // Dead on arrival; retire the row so the sweeper can collect it.
            self.repo.mark_revoked(record.id).await?;
            return Err(AuthError::TokenExpired);
        }

        self.repo.touch_last_used(record.id).await?;
        Ok(record)
    }

    /// Revoke a presented refresh token
    ///
    /// Validation runs first, so revoking an already-revoked token reports a
    /// replay instead of silently succeeding twice.
    pub async fn revoke(&self, user_id: Uuid, raw_token: &str) -> Result<()> {
        let record = self.validate(user_id, raw_token).await?;

        if !self.repo.mark_revoked(record.id).await? {
            // A concurrent revocation got there between validate and here.
            warn!(
                user_id = %user_id,
                record_id = %record.id,
                "lost revocation race; treating as replay"
            );
            return Err(AuthError::TokenReplayed);
        }

        Ok(())
    }

    /// Exchange a valid refresh token for a new access/refresh pair
    ///
    /// The new refresh record is durably written before the old one is
    /// revoked: a crash in between leaves the presented token still valid,
    /// never the user without any valid token. A retry after such a crash
    /// simply rotates again; a retry after full commit observes a replay.
    pub async fn rotate(&self, user: &User, raw_token: &str) -> Result<TokenPair> {
        let record = self.validate(user.id, raw_token).await?;

        let access = self
            .signer
            .sign_for(TokenType::Access, user)
            .map_err(|e| AuthError::SessionRenewalFailed(e.to_string()))?;
        let refresh = self
            .signer
            .sign_for(TokenType::Refresh, user)
            .map_err(|e| AuthError::SessionRenewalFailed(e.to_string()))?;

        let new_hash = hash_refresh_token(&refresh.token);
        self.repo
            .insert(user.id, &new_hash, refresh.expires_at())
            .await
            .map_err(|e| AuthError::SessionRenewalFailed(e.to_string()))?;

        // New pair is durable; only now invalidate the presented token.
        if !self.repo.mark_revoked(record.id).await? {
            warn!(
                user_id = %user.id,
                record_id = %record.id,
                "concurrent rotation won the revoke; reporting replay"
            );
            return Err(AuthError::TokenReplayed);
        }

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            expires_in: access.claims.exp - access.claims.iat,
        })
    }
}
