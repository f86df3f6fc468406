//! Keyed message authentication over arbitrary byte payloads.
//!
//! `tag = HMAC-SHA256(key, message)`, returned raw or hex-encoded. Stateless;
//! the ingestion pipeline itself never calls this, it is composed by callers
//! that need signed links or integrity checks.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the HMAC-SHA256 tag of `message` under `key`.
pub fn sign(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Like [`sign`], rendered as a lowercase hex string.
pub fn sign_hex(key: &[u8], message: &[u8]) -> String {
    hex::encode(sign(key, message))
}

/// Constant-time verification of a previously issued tag.
pub fn verify(key: &[u8], message: &[u8], tag: &[u8]) -> bool {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key size");
    mac.update(message);
    mac.verify_slice(tag).is_ok()
}
