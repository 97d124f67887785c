//! In-memory content-addressed object database.
//!
//! Objects are stored as raw payload bytes keyed by their id; typed
//! accessors decode on the way out. Because ids are content hashes, an
//! insert can never change an existing entry.

use dashmap::DashMap;

use crate::errors::StoreError;
use crate::hash::ObjectId;
use crate::internal::object::ObjectTrait;
use crate::internal::object::blob::Blob;
use crate::internal::object::commit::Commit;
use crate::internal::object::tree::Tree;
use crate::internal::object::types::ObjectType;

/// Raw stored object: type tag plus payload bytes.
#[derive(Debug, Clone)]
pub struct RawObject {
    pub object_type: ObjectType,
    pub data: Vec<u8>,
}

/// Object database backed by a concurrent map.
#[derive(Default, Debug)]
pub struct ObjectDb {
    objects: DashMap<ObjectId, RawObject>,
}

impl ObjectDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store any object; returns its id.
    pub fn put(&self, object: &impl ObjectTrait) -> Result<ObjectId, StoreError> {
        let data = object.to_data()?;
        let id = ObjectId::from_type_and_data(object.object_type(), &data);
        self.objects.insert(
            id,
            RawObject {
                object_type: object.object_type(),
                data,
            },
        );
        Ok(id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    fn get_raw(&self, id: &ObjectId, expected: ObjectType) -> Result<RawObject, StoreError> {
        let raw = self
            .objects
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::ObjectNotFound(id.to_string()))?;
        if raw.object_type != expected {
            return Err(StoreError::InvalidObjectType(format!(
                "{id} is a {} object, expected {expected}",
                raw.object_type
            )));
        }
        Ok(raw)
    }

    pub fn get_blob(&self, id: &ObjectId) -> Result<Blob, StoreError> {
        let raw = self.get_raw(id, ObjectType::Blob)?;
        Blob::from_bytes(&raw.data, *id)
    }

    pub fn get_tree(&self, id: &ObjectId) -> Result<Tree, StoreError> {
        let raw = self.get_raw(id, ObjectType::Tree)?;
        Tree::from_bytes(&raw.data, *id)
    }

    pub fn get_commit(&self, id: &ObjectId) -> Result<Commit, StoreError> {
        let raw = self.get_raw(id, ObjectType::Commit)?;
        Commit::from_bytes(&raw.data, *id)
    }
}
