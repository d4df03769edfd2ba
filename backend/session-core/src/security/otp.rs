//! One-time-code primitives
//!
//! Codes are uniform over 000000-999999 and stored only as a slow salted
//! hash, so a leaked table does not allow offline guessing at full speed.
use crate::error::Result;
use crate::security::password;
use rand::Rng;

pub const OTP_CODE_LENGTH: usize = 6;

/// Generate a uniformly distributed 6-digit code, left-zero-padded
pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:06}")
}

/// Hash a code for at-rest storage (Argon2id, random salt)
pub fn hash_code(code: &str) -> Result<String> {
    password::hash_password(code)
}

/// Compare a presented code against a stored hash
pub fn verify_code(code: &str, code_hash: &str) -> Result<bool> {
    password::verify_password(code, code_hash)
}
