//! Content fingerprints.
//!
//! # Responsibilities
//! - Digest a single entity deterministically
//! - Combine child digests where their order carries no meaning
//! - Separate semantically distinct roles with labels
//!
//! # Design Decisions
//! - SHA-256 with a fresh hasher per digest; no hasher state is shared between calls
//! - Every write is length-prefixed so adjacent fields cannot run into each other
//! - Unordered combination hashes the sorted child digests, so equal children never cancel out
//! - An empty collection is the all-zero digest

use std::fmt;

use sha2::{Digest, Sha256};

use crate::model::ModelError;

/// Width of every fingerprint in bytes.
pub const FINGERPRINT_LEN: usize = 32;

/// A fixed-width digest used purely as an equality token.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Digest of an empty collection.
    pub const ZERO: Fingerprint = Fingerprint([0; FINGERPRINT_LEN]);

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Combine digests without regard to their order.
    ///
    /// Returns [`Fingerprint::ZERO`] when there is nothing to combine.
    pub fn combine_unordered<I>(parts: I) -> Fingerprint
    where
        I: IntoIterator<Item = Fingerprint>,
    {
        let mut parts: Vec<Fingerprint> = parts.into_iter().collect();
        if parts.is_empty() {
            return Self::ZERO;
        }

        parts.sort_unstable();

        let mut hasher = FingerprintHasher::new();
        hasher.label("unordered").u64(parts.len() as u64);
        for part in &parts {
            hasher.fingerprint(part);
        }
        hasher.finish()
    }
}

impl From<[u8; FINGERPRINT_LEN]> for Fingerprint {
    fn from(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Fingerprint {
    type Error = ModelError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; FINGERPRINT_LEN] =
            bytes.try_into().map_err(|_| ModelError::FingerprintLength {
                expected: FINGERPRINT_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self(array))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self)
    }
}

/// Incremental, order-sensitive digest builder.
pub struct FingerprintHasher {
    inner: Sha256,
}

impl FingerprintHasher {
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    /// Write a role label (e.g. "inclusion" vs "exclusion").
    pub fn label(&mut self, label: &str) -> &mut Self {
        self.bytes(label.as_bytes())
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update((data.len() as u64).to_le_bytes());
        self.inner.update(data);
        self
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.inner.update(value.to_le_bytes());
        self
    }

    pub fn fingerprint(&mut self, fingerprint: &Fingerprint) -> &mut Self {
        self.inner.update(fingerprint.0);
        self
    }

    pub fn finish(self) -> Fingerprint {
        Fingerprint(self.inner.finalize().into())
    }
}

impl Default for FingerprintHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Entities with a content fingerprint.
pub trait Fingerprinted {
    fn fingerprint(&self) -> Fingerprint;
}
