use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use nbx_types::Address;
use tracing::trace;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};
use crate::traits::BlockStore;

const OBJECTS_DIR: &str = "objects";
const TMP_DIR: &str = "tmp";

/// Filesystem block store.
///
/// Layout: `<root>/objects/ab/cdef…` where `abcdef…` is the hex address. Each
/// file holds one kind tag byte followed by the object bytes. Files are
/// written to `<root>/tmp` first and renamed into place, so a reader never
/// observes a partially written object. Reads return the file contents as
/// stored; [`AssetStore`](crate::AssetStore) checks them against their
/// addresses.
#[derive(Debug, Clone)]
pub struct FsBlockStore {
    root: PathBuf,
}

impl FsBlockStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join(OBJECTS_DIR))?;
        std::fs::create_dir_all(root.join(TMP_DIR))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, address: &Address) -> PathBuf {
        let hex = address.to_hex();
        self.root.join(OBJECTS_DIR).join(&hex[..2]).join(&hex[2..])
    }

    fn decode(address: &Address, bytes: Vec<u8>) -> StoreResult<StoredObject> {
        let Some((&tag, data)) = bytes.split_first() else {
            return Err(StoreError::CorruptObject {
                address: *address,
                reason: "empty object file".into(),
            });
        };
        let kind = ObjectKind::from_tag(tag).ok_or_else(|| StoreError::CorruptObject {
            address: *address,
            reason: format!("unknown kind tag {tag}"),
        })?;
        Ok(StoredObject::new(kind, data.to_vec()))
    }
}

impl BlockStore for FsBlockStore {
    fn read(&self, address: &Address) -> StoreResult<Option<StoredObject>> {
        match std::fs::read(self.object_path(address)) {
            Ok(bytes) => Self::decode(address, bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, object: &StoredObject) -> StoreResult<Address> {
        let address = object.compute_address();
        let path = self.object_path(&address);
        if path.exists() {
            return Ok(address);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut tmp = tempfile::NamedTempFile::new_in(self.root.join(TMP_DIR))?;
        tmp.write_all(&[object.kind.tag()])?;
        tmp.write_all(&object.data)?;
        tmp.as_file().sync_all()?;
        // Renaming over an existing file is fine: it holds identical bytes.
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        trace!(address = %address.short_hex(), kind = %object.kind, "wrote object file");
        Ok(address)
    }

    fn exists(&self, address: &Address) -> StoreResult<bool> {
        Ok(self.object_path(address).exists())
    }
}
