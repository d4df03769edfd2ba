//! Business logic for the session lifecycle
//!
//! - `session`: login state machine, refresh, logout
//! - `refresh_tokens`: hashed store, rotation, replay detection
//! - `otp`: one-time-code issuance and verification
//! - `linking`: external-provider correlation states
//! - `mailer`: OTP delivery boundary
//! - `sweeper`: periodic purge of dead refresh tokens
pub mod linking;
pub mod mailer;
pub mod otp;
pub mod refresh_tokens;
pub mod session;
pub mod sweeper;

pub use linking::LinkingStateService;
pub use mailer::{OtpMailer, SmtpMailer};
pub use otp::OtpService;
pub use refresh_tokens::RefreshTokenService;
pub use session::{LoginOutcome, SessionService, TokenPair};
pub use sweeper::ExpirySweeper;
