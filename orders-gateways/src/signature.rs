//! Webhook payload signing and verification.

use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Signs a webhook payload using HMAC-SHA256.
pub fn sign_payload(payload: &[u8], secret: &str) -> String {
    use hmac::{Hmac, Mac};

    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a webhook signature using constant-time comparison.
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    let expected = sign_payload(payload, secret);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}
