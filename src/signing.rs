//! Record signing
//!
//! Signing is a capability picked once at construction. The default is
//! a no-op; a keyed signer is swapped in when the configuration enables
//! signing and supplies key material. A degraded setup never raises, it
//! logs a warning and keeps going unsigned.

use crate::config::TrackerConfig;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::warn;

/// Capability for signing record bytes and checking signatures
pub trait Signer: Send + Sync {
    /// Short name for logs and reports
    fn name(&self) -> &'static str;

    /// Sign canonical record bytes. `None` means this signer does not
    /// produce signatures.
    fn sign(&self, bytes: &[u8]) -> Option<String>;

    /// Check a signature against canonical record bytes. Signers that
    /// cannot check always accept.
    fn verify(&self, bytes: &[u8], signature: &str) -> bool;
}

/// Signer that signs nothing and accepts everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSigner;

impl Signer for NoopSigner {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn sign(&self, _bytes: &[u8]) -> Option<String> {
        None
    }

    fn verify(&self, _bytes: &[u8], _signature: &str) -> bool {
        true
    }
}

/// Keyed signer: lowercase hex SHA-256 over key-wrapped record bytes
#[derive(Debug, Clone)]
pub struct Sha256Signer {
    key: Vec<u8>,
}

impl Sha256Signer {
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: key.as_ref().to_vec(),
        }
    }
}

impl Signer for Sha256Signer {
    fn name(&self) -> &'static str {
        "sha256"
    }

    fn sign(&self, bytes: &[u8]) -> Option<String> {
        let mut hasher = Sha256::new();
        hasher.update(&self.key);
        hasher.update(bytes);
        hasher.update(&self.key);
        Some(hex::encode(hasher.finalize()))
    }

    fn verify(&self, bytes: &[u8], signature: &str) -> bool {
        self.sign(bytes).as_deref() == Some(signature)
    }
}

/// Build the signer a configuration asks for. Signing enabled without
/// key material degrades to the no-op signer with a warning.
pub fn signer_from_config(config: &TrackerConfig) -> Arc<dyn Signer> {
    if !config.enable_signing {
        return Arc::new(NoopSigner);
    }
    match &config.signing_key {
        Some(key) => Arc::new(Sha256Signer::new(key)),
        None => {
            warn!("signing enabled without a signing key, records will be stored unsigned");
            Arc::new(NoopSigner)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_signer_signs_nothing_and_accepts_anything() {
        let signer = NoopSigner;
        assert_eq!(signer.sign(b"payload"), None);
        assert!(signer.verify(b"payload", "whatever"));
    }

    #[test]
    fn keyed_signer_round_trips() {
        let signer = Sha256Signer::new("secret-key");
        let sig = signer.sign(b"payload").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(signer.verify(b"payload", &sig));
        assert!(!signer.verify(b"tampered", &sig));
        assert!(!signer.verify(b"payload", "0000"));
    }

    #[test]
    fn different_keys_sign_differently() {
        let a = Sha256Signer::new("key-a");
        let b = Sha256Signer::new("key-b");
        assert_ne!(a.sign(b"payload"), b.sign(b"payload"));
    }

    #[test]
    fn config_without_key_degrades_to_noop() {
        let config = TrackerConfig {
            enable_signing: true,
            signing_key: None,
            ..TrackerConfig::default()
        };
        let signer = signer_from_config(&config);
        assert_eq!(signer.name(), "noop");

        let config = TrackerConfig {
            enable_signing: true,
            signing_key: Some("material".into()),
            ..TrackerConfig::default()
        };
        let signer = signer_from_config(&config);
        assert_eq!(signer.name(), "sha256");
        assert!(signer.sign(b"x").is_some());
    }
}
