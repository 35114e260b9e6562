//! Cache key generation.

use crate::params::ArgumentSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of digest bytes kept in a fingerprint (128 bits).
const FINGERPRINT_BYTES: usize = 16;

/// `namespace:fingerprint`, where the fingerprint is a digest of the
/// canonical form of the effective arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub namespace: String,
    pub fingerprint: String,
    full: String,
}

impl CacheKey {
    pub fn new(namespace: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let fingerprint = fingerprint.into();
        let full = format!("{}:{}", namespace, fingerprint);
        Self {
            namespace,
            fingerprint,
            full,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// Same fingerprint under an extra leading namespace segment.
    pub fn prefixed(&self, prefix: &str) -> Self {
        Self::new(format!("{}:{}", prefix, self.namespace), self.fingerprint.clone())
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full)
    }
}

/// Hex digest of arbitrary text, truncated to 128 bits.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.finalize()[..FINGERPRINT_BYTES]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct CacheKeyGenerator {
    salt: Option<String>,
}

impl CacheKeyGenerator {
    pub fn new() -> Self {
        Self { salt: None }
    }

    /// Mix a salt into every digest, e.g. to invalidate all keys after an API upgrade.
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    pub fn generate(&self, namespace: &str, args: &ArgumentSet) -> CacheKey {
        // Argument maps are sorted by name, so the JSON text is canonical.
        let mut canonical = serde_json::to_string(args.as_map()).unwrap_or_default();
        if let Some(ref salt) = self.salt {
            canonical.push('\u{1f}');
            canonical.push_str(salt);
        }
        CacheKey::new(namespace, fingerprint(&canonical))
    }
}
