//! Session issuance protocol
//!
//! Drives a login through its states:
//!
//! ```text
//! Unauthenticated -> CredentialsChecked -> TwoFactorPending -> Authenticated
//!                                       \__________________________/
//!                                        (two_factor_enabled = false)
//! ```
//!
//! A 2FA-pending token is the only artifact of the interstitial state. It is
//! never persisted and carries no resource-access rights; it stays
//! cryptographically valid until its own five-minute expiry, which only
//! grants the right to keep attempting code verification.
use crate::db::UserDirectory;
use crate::error::{AuthError, Result};
use crate::models::User;
use crate::security::password::verify_password;
use crate::security::tokens::{TokenSigner, TokenType};
use crate::services::mailer::mask_email;
use crate::services::otp::OtpService;
use crate::services::refresh_tokens::RefreshTokenService;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Final token pair handed to the request layer
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Outcome of a credential check
#[derive(Debug)]
pub enum LoginOutcome {
    /// Terminal: full session issued
    Authenticated(TokenPair),
    /// Interstitial: a code was dispatched; present it with this token
    TwoFactorRequired { pending_token: String },
}

#[derive(Clone)]
pub struct SessionService {
    users: Arc<dyn UserDirectory>,
    signer: Arc<TokenSigner>,
    refresh_tokens: RefreshTokenService,
    otp: OtpService,
    mask_unknown_email: bool,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        signer: Arc<TokenSigner>,
        refresh_tokens: RefreshTokenService,
        otp: OtpService,
        mask_unknown_email: bool,
    ) -> Self {
        Self {
            users,
            signer,
            refresh_tokens,
            otp,
            mask_unknown_email,
        }
    }

    /// Check credentials and either issue a session or enter the 2FA step
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None if self.mask_unknown_email => return Err(AuthError::InvalidCredentials),
            None => return Err(AuthError::UserNotFound),
        };

        if !verify_password(password, &user.password_hash)? {
            info!(
                user_id = %user.id,
                email = %mask_email(email),
                "login rejected: password mismatch"
            );
            return Err(AuthError::InvalidCredentials);
        }

        if user.two_factor_enabled {
            self.otp.request(&user).await?;
            let pending = self.signer.sign_for(TokenType::TwoFaPending, &user)?;
            info!(
                user_id = %user.id,
                email = %mask_email(email),
                "credentials accepted; awaiting second factor"
            );
            return Ok(LoginOutcome::TwoFactorRequired {
                pending_token: pending.token,
            });
        }

        let pair = self.issue_pair(&user).await?;
        info!(user_id = %user.id, email = %mask_email(email), "session issued");
        Ok(LoginOutcome::Authenticated(pair))
    }

    /// Complete a pending login by presenting the one-time code
    pub async fn verify_two_factor(&self, pending_token: &str, code: &str) -> Result<TokenPair> {
        let claims = self.signer.verify(pending_token, TokenType::TwoFaPending)?;
        let user = self.load_user(claims.user_id()?).await?;

        self.otp.verify(user.id, code).await?;

        let pair = self.issue_pair(&user).await?;
        info!(user_id = %user.id, "second factor accepted; session issued");
        Ok(pair)
    }

    /// Re-run the code dispatch without re-checking the password
    ///
    /// Returns a fresh pending token; the old one stays valid until its own
    /// expiry but points at a code the new record has superseded.
    pub async fn resend_two_factor(&self, pending_token: &str) -> Result<String> {
        let claims = self.signer.verify(pending_token, TokenType::TwoFaPending)?;
        let user = self.load_user(claims.user_id()?).await?;

        self.otp.request(&user).await?;
        let fresh = self.signer.sign_for(TokenType::TwoFaPending, &user)?;
        Ok(fresh.token)
    }

    /// Exchange a refresh token for a new pair (rotation)
    pub async fn refresh(&self, raw_refresh_token: &str) -> Result<TokenPair> {
        // An expired-but-authentic token still reaches the store so the
        // stale record gets revoked as a side effect.
        let claims = match self.signer.verify(raw_refresh_token, TokenType::Refresh) {
            Ok(claims) => claims,
            Err(AuthError::TokenExpired) => self
                .signer
                .verify_ignoring_expiry(raw_refresh_token, TokenType::Refresh)?,
            Err(e) => return Err(e),
        };

        let user = self.load_user(claims.user_id()?).await?;
        self.refresh_tokens.rotate(&user, raw_refresh_token).await
    }

    /// End a session by revoking its refresh token
    pub async fn logout(&self, raw_refresh_token: &str) -> Result<()> {
        let claims = self
            .signer
            .verify_ignoring_expiry(raw_refresh_token, TokenType::Refresh)?;
        let user_id = claims.user_id()?;

        self.refresh_tokens.revoke(user_id, raw_refresh_token).await?;
        info!(user_id = %user_id, "session revoked on logout");
        Ok(())
    }

    async fn load_user(&self, id: Uuid) -> Result<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn issue_pair(&self, user: &User) -> Result<TokenPair> {
        let access = self.signer.sign_for(TokenType::Access, user)?;
        let refresh = self.signer.sign_for(TokenType::Refresh, user)?;

        self.refresh_tokens
            .issue(user.id, &refresh.token, refresh.expires_at())
            .await?;

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            expires_in: access.claims.exp - access.claims.iat,
        })
    }
}
