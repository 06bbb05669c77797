use nbx_crypto::ContentHasher;
use nbx_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A bounded slice of a larger byte sequence.
    Block,
    /// A [`StoredAsset`] record.
    Asset,
}

impl ObjectKind {
    /// Single-byte tag used by on-disk backends.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Block => 1,
            Self::Asset => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Block),
            2 => Some(Self::Asset),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Block => write!(f, "block"),
            Self::Asset => write!(f, "asset"),
        }
    }
}

/// A stored object: kind tag + bytes.
///
/// `StoredObject` is the unit of storage. Its address is the hash of `data`
/// under the hasher for its kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    pub fn block(data: Vec<u8>) -> Self {
        Self::new(ObjectKind::Block, data)
    }

    /// Compute the content address for this object.
    pub fn compute_address(&self) -> Address {
        let hasher = match self.kind {
            ObjectKind::Block => &ContentHasher::BLOCK,
            ObjectKind::Asset => &ContentHasher::ASSET,
        };
        hasher.hash(&self.data)
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Reconstructable record of a byte sequence: ordered block addresses plus
/// the declared total length.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAsset {
    pub blocks: Vec<Address>,
    pub size: u64,
}

impl StoredAsset {
    pub fn new(blocks: Vec<Address>, size: u64) -> Self {
        Self { blocks, size }
    }

    /// Canonical record bytes. The asset address is the hash of these.
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Content address of this record.
    pub fn address(&self) -> StoreResult<Address> {
        Ok(ContentHasher::ASSET.hash(&self.encode()?))
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        Ok(StoredObject::new(ObjectKind::Asset, self.encode()?))
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        if obj.kind != ObjectKind::Asset {
            return Err(StoreError::WrongKind {
                address: obj.compute_address(),
                expected: ObjectKind::Asset,
                actual: obj.kind,
            });
        }
        bincode::deserialize(&obj.data).map_err(|e| StoreError::CorruptObject {
            address: obj.compute_address(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_and_asset_domains_differ() {
        let block = StoredObject::new(ObjectKind::Block, b"same".to_vec());
        let asset = StoredObject::new(ObjectKind::Asset, b"same".to_vec());
        assert_ne!(block.compute_address(), asset.compute_address());
    }

    #[test]
    fn asset_record_roundtrip() {
        let asset = StoredAsset::new(vec![Address::of(b"a"), Address::of(b"b")], 10);
        let stored = asset.to_stored_object().unwrap();
        assert_eq!(StoredAsset::from_stored_object(&stored).unwrap(), asset);
        assert_eq!(stored.compute_address(), asset.address().unwrap());
    }

    #[test]
    fn asset_address_depends_on_block_order() {
        let a = StoredAsset::new(vec![Address::of(b"1"), Address::of(b"2")], 2);
        let b = StoredAsset::new(vec![Address::of(b"2"), Address::of(b"1")], 2);
        assert_ne!(a.address().unwrap(), b.address().unwrap());
    }

    #[test]
    fn asset_address_depends_on_size() {
        let a = StoredAsset::new(vec![Address::of(b"1")], 2);
        let b = StoredAsset::new(vec![Address::of(b"1")], 3);
        assert_ne!(a.address().unwrap(), b.address().unwrap());
    }

    #[test]
    fn decoding_a_block_as_asset_fails() {
        let stored = StoredObject::block(b"not a record".to_vec());
        let err = StoredAsset::from_stored_object(&stored).unwrap_err();
        assert!(matches!(err, StoreError::WrongKind { .. }));
    }

    #[test]
    fn kind_tags_roundtrip() {
        for kind in [ObjectKind::Block, ObjectKind::Asset] {
            assert_eq!(ObjectKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ObjectKind::from_tag(9), None);
    }
}
