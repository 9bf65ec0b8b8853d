use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;

/// Bytes of entropy in a reset token.
pub const RESET_TOKEN_BYTES: usize = 32;

/// Random URL-safe token (base64, no padding) from `bytes` of OS-backed randomness.
pub fn random_url_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(&buf)
}
