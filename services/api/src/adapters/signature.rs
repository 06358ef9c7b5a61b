//! services/api/src/adapters/signature.rs
//!
//! Verifies PIX webhook signatures: a base64 HMAC-SHA256 of the raw request
//! body, keyed with the secret shared with the payment provider.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use prompt_vault_core::ports::SignatureVerifier;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct HmacSignatureVerifier {
    secret: String,
}

impl HmacSignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// The signature the provider is expected to send for `payload`.
    pub fn sign(&self, payload: &[u8]) -> Option<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).ok()?;
        mac.update(payload);
        Some(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

impl SignatureVerifier for HmacSignatureVerifier {
    fn verify(&self, signature: &str, payload: &[u8]) -> bool {
        let Ok(provided) = STANDARD.decode(signature.trim()) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(self.secret.as_bytes()) else {
            return false;
        };
        mac.update(payload);
        // Constant-time comparison.
        mac.verify_slice(&provided).is_ok()
    }
}
