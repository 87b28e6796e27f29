use govl_types::{EncodingError, EntryFields, EntryHash};

use crate::canonical::encode_fields;

/// Domain-separated BLAKE3 hasher for ledger entries.
///
/// The domain tag is prepended to every digest so an entry digest can never
/// collide with a digest computed for some other purpose over the same bytes.
/// The predecessor digest is hashed before the canonical field encoding:
/// `BLAKE3(domain ":" previous_hash canonical(fields))`.
pub struct EntryHasher {
    domain: &'static str,
}

impl EntryHasher {
    /// Hasher for ledger entries.
    pub const ENTRY: Self = Self {
        domain: "govl-entry-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Digest an entry's fields chained onto its predecessor.
    ///
    /// Fails with [`EncodingError`] before hashing if the fields are malformed.
    pub fn digest(
        &self,
        previous_hash: &EntryHash,
        fields: &EntryFields<'_>,
    ) -> Result<EntryHash, EncodingError> {
        let encoded = encode_fields(fields)?;
        Ok(self.digest_encoded(previous_hash, &encoded))
    }

    /// Digest already-canonical bytes chained onto a predecessor.
    pub fn digest_encoded(&self, previous_hash: &EntryHash, encoded: &[u8]) -> EntryHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(previous_hash.as_bytes());
        hasher.update(encoded);
        EntryHash::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that fields and predecessor reproduce the expected digest.
    ///
    /// Fields that can no longer be encoded never match.
    pub fn verify(
        &self,
        previous_hash: &EntryHash,
        fields: &EntryFields<'_>,
        expected: &EntryHash,
    ) -> bool {
        self.digest(previous_hash, fields)
            .map(|computed| computed == *expected)
            .unwrap_or(false)
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}
