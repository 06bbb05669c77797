//! Chunked, content-addressed block storage for NBX.
//!
//! Raw byte sequences (modules, UI assets) are split into fixed-size blocks,
//! each stored under the domain-separated BLAKE3 hash of its bytes. An
//! ordered list of block addresses plus the total length forms a
//! [`StoredAsset`], itself stored under the hash of that record.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlockStore`] trait:
//!
//! - [`InMemoryBlockStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsBlockStore`] -- sharded files under a root directory
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Write-then-link: blocks are written before the asset record naming them.
//! 3. Writes of identical content are idempotent no-ops.
//! 4. Chunk boundaries are purely positional; the chunk size is fixed per
//!    [`AssetStore`] instance and never re-derived on fetch.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod asset;
pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod traits;

pub use asset::{AssetStore, StoreConfig, DEFAULT_CHUNK_SIZE};
pub use error::{StoreError, StoreResult};
pub use fs::FsBlockStore;
pub use memory::InMemoryBlockStore;
pub use object::{ObjectKind, StoredAsset, StoredObject};
pub use traits::BlockStore;
