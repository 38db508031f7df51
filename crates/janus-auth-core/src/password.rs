//! Password hashing
//!
//! bcrypt with a fixed work factor of 10. Comparison is constant-time
//! with respect to the digest content.

use rand::Rng;

use crate::error::AuthError;

/// bcrypt work factor
pub const HASH_COST: u32 = 10;

/// Hash a plaintext password.
pub fn hash_password(plaintext: &str) -> Result<String, AuthError> {
    bcrypt::hash(plaintext, HASH_COST).map_err(|e| {
        tracing::error!("password hashing failed: {e}");
        AuthError::Internal("password hashing failed".to_string())
    })
}

/// Compare a plaintext candidate against a stored digest.
///
/// An unparsable digest counts as a mismatch rather than an error; the
/// caller cannot distinguish the two.
pub fn verify_password(plaintext: &str, digest: &str) -> bool {
    bcrypt::verify(plaintext, digest).unwrap_or(false)
}

/// Throwaway password seeded for federated users who never chose one.
/// Never shown to anyone; it only keeps the password column non-empty
/// and unguessable.
pub fn generate_throwaway_password() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..8)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!("google-oauth-{suffix}")
}
