//! The Blob object stores raw file content, here the bytes of one
//! N-Quads document. Blobs carry no structure of their own; the line
//! view over the content lives in the synchronisation layer.

use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::hash::ObjectId;
use crate::internal::object::ObjectTrait;
use crate::internal::object::types::ObjectType;

/// Raw content object addressed by the hash of its bytes.
#[derive(Eq, Debug, Clone, Serialize, Deserialize)]
pub struct Blob {
    pub id: ObjectId,
    pub data: Vec<u8>,
}

impl PartialEq for Blob {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Blob {
    pub fn new(data: &[u8]) -> Blob {
        Blob {
            id: ObjectId::from_type_and_data(ObjectType::Blob, data),
            data: data.to_vec(),
        }
    }
}

impl ObjectTrait for Blob {
    fn from_bytes(data: &[u8], id: ObjectId) -> Result<Self, StoreError> {
        Ok(Blob {
            id,
            data: data.to_vec(),
        })
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }

    fn to_data(&self) -> Result<Vec<u8>, StoreError> {
        Ok(self.data.clone())
    }
}
