//! Shared secret produced by the external key-agreement step

use sha2::{Digest, Sha256};

/// Outcome of a key agreement between this side and a peer
#[derive(Clone, PartialEq, Eq)]
pub struct AgreementSecret {
    /// Raw shared secret bytes
    shared_secret: Vec<u8>,
    /// Our session-scoped public key, hex encoded
    public_key: String,
}

impl AgreementSecret {
    /// Create a new agreement secret
    pub fn new(shared_secret: Vec<u8>, public_key: impl Into<String>) -> Self {
        Self {
            shared_secret,
            public_key: public_key.into(),
        }
    }

    /// Our public key for this agreement
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn shared_secret(&self) -> &[u8] {
        &self.shared_secret
    }

    /// Topic of the settled session: hex-encoded SHA-256 of the shared secret
    pub fn derived_topic(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.shared_secret);
        hex::encode(hasher.finalize())
    }
}

// Never print the secret itself.
impl std::fmt::Debug for AgreementSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgreementSecret")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_topic() {
        let secret = AgreementSecret::new(b"abc".to_vec(), "ff01");
        assert_eq!(
            secret.derived_topic(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(secret.public_key(), "ff01");
    }

    #[test]
    fn test_distinct_secrets_yield_distinct_topics() {
        let a = AgreementSecret::new(vec![1; 32], "aa");
        let b = AgreementSecret::new(vec![2; 32], "aa");
        assert_ne!(a.derived_topic(), b.derived_topic());
        assert_eq!(a.derived_topic().len(), 64);
    }

    #[test]
    fn test_debug_hides_secret() {
        let secret = AgreementSecret::new(vec![0xde, 0xad], "aa");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("shared_secret"));
        assert_eq!(debug, r#"AgreementSecret { public_key: "aa", .. }"#);
    }
}
