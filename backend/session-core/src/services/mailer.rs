//! One-time-code delivery boundary
//!
//! The core treats delivery as fire-and-forget: a failed send is logged and
//! never fails the OTP step that triggered it.
use crate::config::EmailSettings;
use crate::error::{AuthError, Result};
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn send_otp_email(&self, recipient: &str, code: &str) -> Result<()>;
}

/// SMTP transport wrapper (or no-op)
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the mailer from configuration
    ///
    /// If SMTP host is empty, operates in no-op mode (logs only). Useful for
    /// development and testing without email infrastructure.
    pub fn new(config: &EmailSettings) -> Result<Self> {
        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| AuthError::Internal(format!("Invalid SMTP_FROM address: {}", e)))?;

        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; mailer will operate in no-op mode");
            None
        } else {
            let builder = if config.use_starttls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            }
            .map_err(|e| {
                AuthError::Internal(format!("Failed to configure SMTP transport: {}", e))
            })?
            .port(config.smtp_port);

            let builder = if let (Some(username), Some(password)) =
                (&config.smtp_username, &config.smtp_password)
            {
                builder.credentials(Credentials::new(username.to_string(), password.to_string()))
            } else {
                builder
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self { transport, from })
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }
}

#[async_trait]
impl OtpMailer for SmtpMailer {
    async fn send_otp_email(&self, recipient: &str, code: &str) -> Result<()> {
        let subject = "Your verification code";
        let body = format!(
            "Your verification code is: {}\n\n\
            This code will expire in 5 minutes.\n\n\
            If you did not request this, please ignore this email.",
            code
        );

        if let Some(transport) = &self.transport {
            let to = recipient.parse::<Mailbox>().map_err(|e| {
                AuthError::Internal(format!("Invalid recipient email address: {}", e))
            })?;

            let email = Message::builder()
                .from(self.from.clone())
                .to(to)
                .subject(subject)
                .header(header::ContentType::TEXT_PLAIN)
                .body(body)
                .map_err(|e| {
                    AuthError::Internal(format!("Failed to build email message: {}", e))
                })?;

            transport
                .send(email)
                .await
                .map_err(|e| AuthError::Internal(format!("Failed to send email: {}", e)))?;
            info!(recipient = %mask_email(recipient), "verification code email sent");
        } else {
            info!(
                recipient = %mask_email(recipient),
                "mailer running in no-op mode; skipping actual send"
            );
        }
        Ok(())
    }
}

/// Mask an email address for logging
pub(crate) fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let local = &email[..at_pos];
        let domain = &email[at_pos..];
        // Char-wise, not byte-wise: local parts may be internationalized.
        let mut chars = local.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(first), Some(_), Some(_)) => format!("{}***{}", first, domain),
            _ => format!("**{}", domain),
        }
    } else {
        "***@***".to_string()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("alice@example.com"), "a***@example.com");
        assert_eq!(mask_email("ab@example.com"), "**@example.com");
        assert_eq!(mask_email("not-an-email"), "***@***");
    }

    #[test]
    fn test_mask_email_multibyte_local_part() {
        // Internationalized local parts must not panic on a char boundary.
        assert_eq!(mask_email("日本語@example.com"), "日***@example.com");
        assert_eq!(mask_email("ää@example.com"), "**@example.com");
    }

    #[test]
    fn test_noop_mode_without_host() {
        let mailer = SmtpMailer::new(&EmailSettings {
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_from: "noreply@example.com".to_string(),
            use_starttls: false,
        })
        .unwrap();
        assert!(!mailer.is_enabled());
    }
}
