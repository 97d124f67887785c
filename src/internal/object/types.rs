//! Object type enumeration.
//!
//! Each object stored in the repository carries one of these types; the
//! type name participates in the content-address framing, so `blob`,
//! `tree` and `commit` must keep their canonical spellings.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// Repository object types.
///
/// * `Blob`: stores the content of a file (here: an N-Quads document).
/// * `Tree`: a directory; maps names to blobs and sub-trees.
/// * `Commit`: a dataset version with author, committer, message and
///   parent commits.
/// * `Tag`: a named pointer to another object.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Commit,
    Tree,
    Blob,
    Tag,
}

const COMMIT_OBJECT_TYPE: &[u8] = b"commit";
const TREE_OBJECT_TYPE: &[u8] = b"tree";
const BLOB_OBJECT_TYPE: &[u8] = b"blob";
const TAG_OBJECT_TYPE: &[u8] = b"tag";

impl Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ObjectType::Commit => write!(f, "commit"),
            ObjectType::Tree => write!(f, "tree"),
            ObjectType::Blob => write!(f, "blob"),
            ObjectType::Tag => write!(f, "tag"),
        }
    }
}

impl ObjectType {
    pub fn to_bytes(&self) -> &'static [u8] {
        match self {
            ObjectType::Commit => COMMIT_OBJECT_TYPE,
            ObjectType::Tree => TREE_OBJECT_TYPE,
            ObjectType::Blob => BLOB_OBJECT_TYPE,
            ObjectType::Tag => TAG_OBJECT_TYPE,
        }
    }

    /// Parses a string representation of an object type.
    pub fn from_string(s: &str) -> Result<ObjectType, StoreError> {
        match s {
            "commit" => Ok(ObjectType::Commit),
            "tree" => Ok(ObjectType::Tree),
            "blob" => Ok(ObjectType::Blob),
            "tag" => Ok(ObjectType::Tag),
            _ => Err(StoreError::InvalidObjectType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify ObjectType::Blob converts to its ASCII byte representation "blob".
    #[test]
    fn test_object_type_to_bytes() {
        assert_eq!(ObjectType::Blob.to_bytes(), b"blob");
        assert_eq!(ObjectType::Commit.to_string(), "commit");
    }

    /// Verify parsing "tree" string returns ObjectType::Tree.
    #[test]
    fn test_object_type_from_string() {
        assert_eq!(ObjectType::from_string("tree").unwrap(), ObjectType::Tree);
        assert_eq!(ObjectType::from_string("tag").unwrap(), ObjectType::Tag);
        assert!(ObjectType::from_string("invalid_type").is_err());
    }
}
