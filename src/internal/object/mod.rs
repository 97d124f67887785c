//! Object model definitions for blobs, trees, commits and signatures,
//! plus the codec trait that lets the object database create strongly
//! typed values from raw bytes.

pub mod blob;
pub mod commit;
pub mod signature;
pub mod tree;
pub mod types;

use crate::{errors::StoreError, hash::ObjectId, internal::object::types::ObjectType};

/// **The Object Trait**
/// Defines the common interface for all repository object types.
pub trait ObjectTrait: Send + Sync {
    /// Creates a new object from a byte slice.
    fn from_bytes(data: &[u8], id: ObjectId) -> Result<Self, StoreError>
    where
        Self: Sized;

    /// Returns the type of the object.
    fn object_type(&self) -> ObjectType;

    /// Serialises the object into its canonical byte representation.
    fn to_data(&self) -> Result<Vec<u8>, StoreError>;

    /// Computes the object id from serialized data.
    fn compute_id(&self) -> Result<ObjectId, StoreError> {
        let data = self.to_data()?;
        Ok(ObjectId::from_type_and_data(self.object_type(), &data))
    }
}
