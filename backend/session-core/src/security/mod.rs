//! Security primitives for session issuance
//!
//! - **password**: Argon2id credential hashing and verification
//! - **tokens**: Signed, typed, expiring tokens (access / refresh / 2FA-pending)
//! - **otp**: 6-digit one-time codes with slow salted hashing
pub mod otp;
pub mod password;
pub mod tokens;

pub use password::{hash_password, verify_password};
pub use tokens::{Claims, SignedToken, TokenSigner, TokenType};
