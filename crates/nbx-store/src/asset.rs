use std::sync::Arc;

use nbx_crypto::ContentHasher;
use nbx_types::Address;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredAsset, StoredObject};
use crate::traits::BlockStore;

/// Default block size: 2 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 2 * 1024 * 1024;

/// Chunking policy for an [`AssetStore`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum block length in bytes. Every block but the last is exactly
    /// this long.
    pub chunk_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl StoreConfig {
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self { chunk_size }
    }
}

/// Splits byte sequences into fixed-size blocks and reassembles them.
///
/// The chunk size is fixed for the lifetime of the instance. Fetching replays
/// the stored block list, so assets saved by an instance with a different
/// chunk size are still readable.
#[derive(Clone)]
pub struct AssetStore {
    store: Arc<dyn BlockStore>,
    config: StoreConfig,
}

impl AssetStore {
    pub fn new(store: Arc<dyn BlockStore>, config: StoreConfig) -> StoreResult<Self> {
        if config.chunk_size == 0 {
            return Err(StoreError::InvalidConfig("chunk_size must be non-zero".into()));
        }
        Ok(Self { store, config })
    }

    pub fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }

    /// The underlying block store.
    pub fn blocks(&self) -> &Arc<dyn BlockStore> {
        &self.store
    }

    /// Store `data` and return its asset record.
    ///
    /// Re-saving identical bytes returns an identical record and writes
    /// nothing new.
    pub fn save(&self, data: &[u8]) -> StoreResult<StoredAsset> {
        let blocks: Vec<StoredObject> = data
            .chunks(self.config.chunk_size)
            .map(|chunk| StoredObject::block(chunk.to_vec()))
            .collect();
        let asset = StoredAsset::new(
            blocks.iter().map(StoredObject::compute_address).collect(),
            data.len() as u64,
        );
        let record = asset.to_stored_object()?;
        let address = record.compute_address();

        if self.store.exists(&address)? {
            debug!(asset = %address.short_hex(), "asset already stored");
            return Ok(asset);
        }

        self.store.write_batch(&blocks)?;
        self.store.write(&record)?;
        debug!(
            asset = %address.short_hex(),
            blocks = asset.blocks.len(),
            size = asset.size,
            "stored asset"
        );
        Ok(asset)
    }

    /// Resolve an asset address back into its complete bytes.
    ///
    /// The blocks are concatenated and their total length compared with the
    /// declared size before the record itself is checked against `address`,
    /// so a record whose length was altered fails with
    /// [`StoreError::SizeMismatch`].
    pub fn fetch(&self, address: &Address) -> StoreResult<Vec<u8>> {
        let record = self.read_record(address)?;
        let asset = StoredAsset::from_stored_object(&record)?;
        let data = self.concatenate(address, &asset)?;
        check_address(address, &record)?;
        Ok(data)
    }

    /// Load and decode the asset record stored under `address`.
    pub fn load(&self, address: &Address) -> StoreResult<StoredAsset> {
        let record = self.read_record(address)?;
        check_address(address, &record)?;
        StoredAsset::from_stored_object(&record)
    }

    /// Concatenate the blocks of `asset` in declared order.
    ///
    /// Fails with [`StoreError::SizeMismatch`] when the concatenation is not
    /// exactly `asset.size` bytes long.
    pub fn reassemble(&self, asset: &StoredAsset) -> StoreResult<Vec<u8>> {
        self.concatenate(&asset.address()?, asset)
    }

    fn read_record(&self, address: &Address) -> StoreResult<StoredObject> {
        let record = self
            .store
            .read(address)?
            .ok_or(StoreError::NotFound(*address))?;
        if record.kind != ObjectKind::Asset {
            return Err(StoreError::WrongKind {
                address: *address,
                expected: ObjectKind::Asset,
                actual: record.kind,
            });
        }
        Ok(record)
    }

    fn concatenate(&self, address: &Address, asset: &StoredAsset) -> StoreResult<Vec<u8>> {
        let mut data = Vec::new();
        for block_address in &asset.blocks {
            let block = self
                .store
                .read(block_address)?
                .ok_or(StoreError::NotFound(*block_address))?;
            if block.kind != ObjectKind::Block {
                return Err(StoreError::WrongKind {
                    address: *block_address,
                    expected: ObjectKind::Block,
                    actual: block.kind,
                });
            }
            if !ContentHasher::BLOCK.verify(&block.data, block_address) {
                return Err(StoreError::HashMismatch {
                    address: *block_address,
                    computed: block.compute_address(),
                });
            }
            data.extend_from_slice(&block.data);
        }

        let actual = data.len() as u64;
        if actual != asset.size {
            return Err(StoreError::SizeMismatch {
                address: *address,
                expected: asset.size,
                actual,
            });
        }
        Ok(data)
    }
}

fn check_address(address: &Address, record: &StoredObject) -> StoreResult<()> {
    let computed = record.compute_address();
    if computed != *address {
        return Err(StoreError::HashMismatch {
            address: *address,
            computed,
        });
    }
    Ok(())
}

impl std::fmt::Debug for AssetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetStore")
            .field("chunk_size", &self.config.chunk_size)
            .finish()
    }
}
