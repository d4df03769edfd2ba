//! Signed, typed, expiring tokens
//!
//! Every issued token carries a `token_type` claim and is verified against an
//! expected type, so an access token can never stand in for a refresh token
//! and a 2FA-pending token never authorizes a resource call. Each token gets
//! a fresh `jti`, so two rotations for the same user never produce colliding
//! signatures.
//!
//! The signer is an injected instance constructed from configuration; keys
//! are never held in process-global state.
use crate::config::TokenSettings;
use crate::error::{AuthError, Result};
use crate::models::User;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// 2FA-pending tokens are deliberately short-lived and not configurable:
/// they only authorize submitting a one-time code.
const TWO_FA_PENDING_TTL_MINUTES: i64 = 5;

/// The three token families this core issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    #[serde(rename = "access")]
    Access,
    #[serde(rename = "refresh")]
    Refresh,
    #[serde(rename = "2fa_pending")]
    TwoFaPending,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
            TokenType::TwoFaPending => "2fa_pending",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims carried by every issued token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Email address
    pub email: String,
    /// Display name
    pub name: String,
    /// Token family
    pub token_type: TokenType,
    /// Unique token id, fresh per issuance
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::TokenInvalid)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// A freshly signed token together with its claims
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub claims: Claims,
}

impl SignedToken {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.claims.expires_at()
    }
}

/// HS256 token signer with per-family key selection
///
/// Access and 2FA-pending tokens share the access secret; refresh tokens use
/// their own secret when one is configured.
pub struct TokenSigner {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenSigner {
    pub fn new(settings: &TokenSettings) -> Self {
        let access_secret = settings.access_secret.as_bytes();
        let refresh_secret = settings
            .refresh_secret
            .as_deref()
            .unwrap_or(&settings.access_secret)
            .as_bytes();

        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
            access_ttl: settings.access_ttl,
            refresh_ttl: settings.refresh_ttl,
        }
    }

    pub fn ttl_for(&self, kind: TokenType) -> Duration {
        match kind {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
            TokenType::TwoFaPending => Duration::minutes(TWO_FA_PENDING_TTL_MINUTES),
        }
    }

    fn encoding_key(&self, kind: TokenType) -> &EncodingKey {
        match kind {
            TokenType::Refresh => &self.refresh_encoding,
            TokenType::Access | TokenType::TwoFaPending => &self.access_encoding,
        }
    }

    fn decoding_key(&self, kind: TokenType) -> &DecodingKey {
        match kind {
            TokenType::Refresh => &self.refresh_decoding,
            TokenType::Access | TokenType::TwoFaPending => &self.access_decoding,
        }
    }

    /// Sign a token of the given family for a user, with the configured TTL
    pub fn sign_for(&self, kind: TokenType, user: &User) -> Result<SignedToken> {
        self.sign_with_ttl(kind, user, self.ttl_for(kind))
    }

    /// Sign with an explicit TTL
    pub fn sign_with_ttl(
        &self,
        kind: TokenType,
        user: &User,
        ttl: Duration,
    ) -> Result<SignedToken> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.display_name.clone(),
            token_type: kind,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        let token = encode(&Header::new(JWT_ALGORITHM), &claims, self.encoding_key(kind))
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(SignedToken { token, claims })
    }

    /// Verify a token against an expected family
    ///
    /// Fails with `TokenExpired` past the `exp` claim, `TokenInvalid` on a bad
    /// signature or malformed token, and `WrongTokenType` when the signature
    /// is good but the family does not match.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims> {
        self.decode_checked(token, expected, true)
    }

    /// Verify signature and family but tolerate an elapsed `exp`
    ///
    /// Used where the store must still see an expired-but-authentic token,
    /// e.g. to revoke it as a side effect.
    pub fn verify_ignoring_expiry(&self, token: &str, expected: TokenType) -> Result<Claims> {
        self.decode_checked(token, expected, false)
    }

    fn decode_checked(
        &self,
        token: &str,
        expected: TokenType,
        validate_exp: bool,
    ) -> Result<Claims> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = validate_exp;
        validation.leeway = 0;

        let data = decode::<Claims>(token, self.decoding_key(expected), &validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            },
        )?;

        if data.claims.token_type != expected {
            return Err(AuthError::WrongTokenType {
                expected,
                actual: data.claims.token_type,
            });
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::password::hash_password;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            display_name: "Test User".to_string(),
            password_hash: hash_password("irrelevant").unwrap(),
            two_factor_enabled: false,
        }
    }

    fn test_signer() -> TokenSigner {
        TokenSigner::new(&TokenSettings {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: Some("test-refresh-secret".to_string()),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
        })
    }

    #[test]
    fn test_sign_and_verify_roundtrip() {
        let signer = test_signer();
        let user = test_user();

        let signed = signer.sign_for(TokenType::Access, &user).unwrap();
        assert_eq!(signed.token.matches('.').count(), 2); // JWT has 3 parts

        let claims = signer.verify(&signed.token, TokenType::Access).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_type_isolation() {
        let signer = test_signer();
        let user = test_user();

        let access = signer.sign_for(TokenType::Access, &user).unwrap();
        let refresh = signer.sign_for(TokenType::Refresh, &user).unwrap();
        let pending = signer.sign_for(TokenType::TwoFaPending, &user).unwrap();

        // An access token never passes as a refresh token, and vice versa.
        assert!(signer.verify(&access.token, TokenType::Refresh).is_err());
        assert!(signer.verify(&refresh.token, TokenType::Access).is_err());

        // A 2FA-pending token never authorizes a resource call.
        let result = signer.verify(&pending.token, TokenType::Access);
        assert!(matches!(
            result,
            Err(AuthError::WrongTokenType {
                expected: TokenType::Access,
                actual: TokenType::TwoFaPending,
            })
        ));
    }

    #[test]
    fn test_wrong_type_with_shared_secret() {
        // With a single secret for both families the signature always checks
        // out, so the type claim is the only guard.
        let signer = TokenSigner::new(&TokenSettings {
            access_secret: "shared".to_string(),
            refresh_secret: None,
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
        });
        let user = test_user();

        let access = signer.sign_for(TokenType::Access, &user).unwrap();
        let result = signer.verify(&access.token, TokenType::Refresh);
        assert!(matches!(result, Err(AuthError::WrongTokenType { .. })));
    }

    #[test]
    fn test_expired_token_fails_even_with_valid_signature() {
        let signer = test_signer();
        let user = test_user();

        let signed = signer
            .sign_with_ttl(TokenType::Access, &user, Duration::seconds(-10))
            .unwrap();

        let result = signer.verify(&signed.token, TokenType::Access);
        assert!(matches!(result, Err(AuthError::TokenExpired)));

        // Signature and type still check out when expiry is tolerated.
        let claims = signer
            .verify_ignoring_expiry(&signed.token, TokenType::Access)
            .unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);
    }

    #[test]
    fn test_tampered_token_fails() {
        let signer = test_signer();
        let user = test_user();

        let signed = signer.sign_for(TokenType::Access, &user).unwrap();
        let tampered = signed.token.replace('a', "b");

        let result = signer.verify(&tampered, TokenType::Access);
        assert!(matches!(result, Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_malformed_token_fails() {
        let signer = test_signer();
        let result = signer.verify("not.a.token", TokenType::Access);
        assert!(matches!(result, Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_fresh_jti_per_issuance() {
        let signer = test_signer();
        let user = test_user();

        let first = signer.sign_for(TokenType::Refresh, &user).unwrap();
        let second = signer.sign_for(TokenType::Refresh, &user).unwrap();

        assert_ne!(first.claims.jti, second.claims.jti);
        assert_ne!(first.token, second.token);
    }

    #[test]
    fn test_refresh_outlives_access() {
        let signer = test_signer();
        let user = test_user();

        let access = signer.sign_for(TokenType::Access, &user).unwrap();
        let refresh = signer.sign_for(TokenType::Refresh, &user).unwrap();

        assert!(refresh.claims.exp > access.claims.exp);
    }

    #[test]
    fn test_pending_ttl_is_five_minutes() {
        let signer = test_signer();
        assert_eq!(
            signer.ttl_for(TokenType::TwoFaPending),
            Duration::minutes(5)
        );
    }
}
