use std::collections::HashMap;
use std::sync::RwLock;

use nbx_types::Address;

use crate::error::StoreResult;
use crate::object::{ObjectKind, StoredObject};
use crate::traits::BlockStore;

/// In-memory, HashMap-based block store.
///
/// Intended for tests and embedding. All objects are held in memory behind a
/// `RwLock` for safe concurrent access. Objects are cloned on read/write.
pub struct InMemoryBlockStore {
    objects: RwLock<HashMap<Address, StoredObject>>,
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects (blocks and asset records) currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Number of stored objects of kind [`ObjectKind::Block`].
    pub fn block_count(&self) -> usize {
        self.count_kind(ObjectKind::Block)
    }

    /// Number of stored objects of kind [`ObjectKind::Asset`].
    pub fn asset_count(&self) -> usize {
        self.count_kind(ObjectKind::Asset)
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(StoredObject::size)
            .sum()
    }

    /// Sorted list of all addresses in the store.
    pub fn all_addresses(&self) -> Vec<Address> {
        let map = self.objects.read().expect("lock poisoned");
        let mut addresses: Vec<Address> = map.keys().copied().collect();
        addresses.sort();
        addresses
    }

    fn count_kind(&self, kind: ObjectKind) -> usize {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|obj| obj.kind == kind)
            .count()
    }
}

impl Default for InMemoryBlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStore for InMemoryBlockStore {
    fn read(&self, address: &Address) -> StoreResult<Option<StoredObject>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(address).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<Address> {
        let address = object.compute_address();
        let mut map = self.objects.write().expect("lock poisoned");
        // Same address always maps to the same content; a second write is a no-op.
        map.entry(address).or_insert_with(|| object.clone());
        Ok(address)
    }

    fn exists(&self, address: &Address) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(address))
    }
}

impl std::fmt::Debug for InMemoryBlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlockStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(content: &[u8]) -> StoredObject {
        StoredObject::block(content.to_vec())
    }

    #[test]
    fn write_and_read_block() {
        let store = InMemoryBlockStore::new();
        let obj = block(b"hello world");
        let address = store.write(&obj).unwrap();
        assert_eq!(store.read(&address).unwrap(), Some(obj));
    }

    #[test]
    fn write_is_idempotent() {
        let store = InMemoryBlockStore::new();
        let a1 = store.write(&block(b"same")).unwrap();
        let a2 = store.write(&block(b"same")).unwrap();
        assert_eq!(a1, a2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn read_missing_returns_none() {
        let store = InMemoryBlockStore::new();
        assert!(store.read(&Address::of(b"missing")).unwrap().is_none());
        assert!(!store.exists(&Address::of(b"missing")).unwrap());
    }

    #[test]
    fn batch_roundtrip_preserves_order() {
        let store = InMemoryBlockStore::new();
        let objects = vec![block(b"1"), block(b"2"), block(b"3")];
        let addresses = store.write_batch(&objects).unwrap();
        let read_back = store.read_batch(&addresses).unwrap();
        for (obj, read) in objects.iter().zip(read_back) {
            assert_eq!(Some(obj.clone()), read);
        }
    }

    #[test]
    fn counts_by_kind() {
        let store = InMemoryBlockStore::new();
        store.write(&block(b"a")).unwrap();
        store.write(&block(b"b")).unwrap();
        store
            .write(&StoredObject::new(ObjectKind::Asset, b"record".to_vec()))
            .unwrap();
        assert_eq!(store.block_count(), 2);
        assert_eq!(store.asset_count(), 1);
        assert_eq!(store.total_bytes(), 8);
    }

    #[test]
    fn all_addresses_is_sorted() {
        let store = InMemoryBlockStore::new();
        for content in [b"x", b"y", b"z"] {
            store.write(&block(content)).unwrap();
        }
        let addresses = store.all_addresses();
        assert_eq!(addresses.len(), 3);
        assert!(addresses.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn concurrent_identical_writes_converge() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryBlockStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.write(&block(b"shared")).unwrap())
            })
            .collect();
        let addresses: Vec<Address> = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .collect();
        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn debug_format() {
        let store = InMemoryBlockStore::new();
        store.write(&block(b"x")).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryBlockStore"));
        assert!(debug.contains("object_count"));
    }
}
