//! Authentication Session Core
//!
//! Turns a verified identity into a bounded-lifetime, revocable session and
//! safely renews that session over time. Transport framing (HTTP routing,
//! cookies, request validation) is owned by the embedding service; this crate
//! exposes the protocol as injectable services.
//!
//! ## Modules
//!
//! - `config`: Environment-driven settings (TTLs, secrets, SMTP, database)
//! - `db`: Repository traits and Postgres implementations
//! - `error`: Error types
//! - `models`: Persisted record shapes
//! - `security`: Password hashing, token signing, OTP code primitives
//! - `services`: Session issuance, refresh rotation, OTP, linking, sweeper
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod security;
pub mod services;

// Re-export commonly used types
pub use error::{AuthError, Result};
pub use security::tokens::{TokenSigner, TokenType};
pub use services::session::{LoginOutcome, SessionService, TokenPair};
