//! High-level SDK for NBX.
//!
//! [`Nbx`] wires a block store, a ledger, the assembler and the unpacker
//! together behind four calls: `save`, `fetch`, `verify` and `verify_deep`.
//! This is the main entry point for applications embedding NBX.

pub mod config;
pub mod error;
pub mod repository;

pub use config::{NbxConfig, DEFAULT_ROOT};
pub use error::{SdkError, SdkResult};
pub use repository::{Nbx, BLOCKS_DIR, LEDGER_DIR};

// Re-export key types
pub use nbx_assembler::{AssemblerConfig, AssemblyError};
pub use nbx_bundle::{
    pack_dir, unpack_dir, Bundle, BundleCodec, BundleError, Location, Manifest, Slot, MANIFEST_FILE,
};
pub use nbx_ledger::{Entry, Ledger};
pub use nbx_store::{BlockStore, StoreConfig};
pub use nbx_token::{EntryTokens, TokenError};
pub use nbx_types::{Address, BundleKind, SlotKind, Token, TokenLevel};
