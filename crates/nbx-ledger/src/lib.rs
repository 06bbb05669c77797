//! Entry ledger for NBX.
//!
//! The assembler hands every resolved manifest to a [`Ledger`], which stores
//! it as an immutable [`Entry`] addressed by content and indexed by root
//! token. The token index is what makes repeated saves of identical content
//! converge on one entry.
//!
//! - [`InMemoryLedger`] for tests and embedding
//! - [`FsLedger`] for a local on-disk ledger

pub mod entry;
pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use entry::Entry;
pub use error::{LedgerError, LedgerResult};
pub use fs::FsLedger;
pub use memory::InMemoryLedger;
pub use traits::Ledger;
