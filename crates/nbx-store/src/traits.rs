use nbx_types::Address;

use crate::error::StoreResult;
use crate::object::StoredObject;

/// Content-addressed, write-once object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written: the same data always produces the
///   same address.
/// - Writing an object that already exists is a no-op returning its address.
/// - Concurrent reads and writes are safe; concurrent writes of identical
///   content converge.
/// - The store never interprets object contents.
pub trait BlockStore: Send + Sync {
    /// Read an object by address.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    fn read(&self, address: &Address) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content address.
    fn write(&self, object: &StoredObject) -> StoreResult<Address>;

    /// Check whether an object exists in the store.
    fn exists(&self, address: &Address) -> StoreResult<bool>;

    /// Read multiple objects in a batch.
    fn read_batch(&self, addresses: &[Address]) -> StoreResult<Vec<Option<StoredObject>>> {
        addresses.iter().map(|a| self.read(a)).collect()
    }

    /// Write multiple objects in a batch and return their addresses.
    fn write_batch(&self, objects: &[StoredObject]) -> StoreResult<Vec<Address>> {
        objects.iter().map(|obj| self.write(obj)).collect()
    }
}
