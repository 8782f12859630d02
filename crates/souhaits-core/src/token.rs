//! Opaque random tokens for sessions and challenges.

use rand::RngCore;

/// 128 random bits from the OS, hex-encoded.
pub fn generate() -> String {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
