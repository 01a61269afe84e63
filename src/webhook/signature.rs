use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// How inbound payloads are authenticated. `Disabled` is an explicit
/// opt-in for development setups; it is never inferred silently beyond
/// the loud warning at construction time.
#[derive(Debug, Clone)]
pub enum SignatureMode {
    Enforced { secret: String },
    Disabled,
}

#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    mode: SignatureMode,
}

impl SignatureVerifier {
    pub fn new(secret: Option<String>) -> Self {
        let mode = match secret {
            Some(s) if !s.is_empty() => SignatureMode::Enforced { secret: s },
            _ => {
                warn!("Webhook secret not configured. Signature verification disabled.");
                SignatureMode::Disabled
            }
        };
        SignatureVerifier { mode }
    }

    pub fn is_enforced(&self) -> bool {
        matches!(self.mode, SignatureMode::Enforced { .. })
    }

    /// Check an `X-Hub-Signature-256` style header (`sha256=<hex digest>`)
    /// against the raw request body. Fails closed on a missing header,
    /// a missing prefix, or undecodable hex. The digest comparison is
    /// constant-time.
    pub fn verify(&self, payload: &[u8], signature: Option<&str>) -> bool {
        let secret = match &self.mode {
            SignatureMode::Enforced { secret } => secret,
            SignatureMode::Disabled => return true,
        };

        let signature = match signature {
            Some(s) if !s.is_empty() => s,
            _ => {
                warn!("Missing webhook signature header");
                return false;
            }
        };

        let hex_digest = match signature.strip_prefix(SIGNATURE_PREFIX) {
            Some(rest) => rest,
            None => {
                warn!("Invalid signature format. Expected 'sha256=' prefix");
                return false;
            }
        };

        let received = match hex::decode(hex_digest) {
            Ok(bytes) => bytes,
            Err(_) => {
                warn!("Webhook signature is not valid hex");
                return false;
            }
        };

        let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(payload);
        mac.verify_slice(&received).is_ok()
    }
}

/// Produce the `sha256=<hex>` signature a sender would attach for this
/// payload and secret.
pub fn sign(secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(payload);
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes()))
}
