//! Content-addressed object ids.
//!
//! Every object stored in the repository is identified by the SHA-1 of its
//! framed content (`"{type} {len}\0"` followed by the payload), so equal
//! bytes always yield the same id. The same framing hashes arbitrary
//! content as a blob, which is how agent IRIs are derived from an author
//! e-mail address.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::errors::StoreError;
use crate::internal::object::types::ObjectType;

/// 20-byte SHA-1 object id with hex formatting and parsing.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize, Serialize,
)]
pub struct ObjectId([u8; 20]);

impl Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl AsRef<[u8]> for ObjectId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

/// Parse a 40-character hex string into an `ObjectId`.
impl FromStr for ObjectId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 40 {
            return Err(StoreError::InvalidHashValue(s.to_string()));
        }
        let bytes = hex::decode(s).map_err(|_| StoreError::InvalidHashValue(s.to_string()))?;
        let mut h = [0u8; 20];
        h.copy_from_slice(&bytes);
        Ok(ObjectId(h))
    }
}

impl ObjectId {
    /// Build an id from exactly 20 raw bytes, as found inside tree entries.
    pub fn from_raw_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.len() != 20 {
            return Err(StoreError::InvalidHashValue(hex::encode(bytes)));
        }
        let mut h = [0u8; 20];
        h.copy_from_slice(bytes);
        Ok(ObjectId(h))
    }

    /// Hash the canonical object framing: `"{type} {len}\0"` + data.
    pub fn from_type_and_data(object_type: ObjectType, data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(object_type.to_bytes());
        hasher.update(b" ");
        hasher.update(data.len().to_string().as_bytes());
        hasher.update(b"\0");
        hasher.update(data);
        ObjectId(hasher.finalize().into())
    }

    /// Content hash of arbitrary bytes under blob framing. Used to derive
    /// stable agent identifiers from e-mail addresses.
    pub fn hash_content(data: &[u8]) -> Self {
        Self::from_type_and_data(ObjectType::Blob, data)
    }
}
