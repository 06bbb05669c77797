//! Recursive assembly and unpacking of nested bundles.
//!
//! Assembly walks a transport bundle bottom-up:
//!
//! ```text
//! decoded -> children resolving -> manifest rewritten -> tokens derived -> persisted
//! ```
//!
//! Unpacking walks an entry top-down:
//!
//! ```text
//! persisted -> walked -> children fetched -> rewritten to inline -> encoded
//! ```
//!
//! Sibling slots are handled on the rayon pool; a parent waits for all of
//! its children and the first failing child aborts the level, so nothing
//! partially resolved is ever persisted.

pub mod assembler;
pub mod config;
pub mod error;
mod parallel;
pub mod unpacker;

#[cfg(test)]
mod fixtures;

pub use assembler::Assembler;
pub use config::{AssemblerConfig, DEFAULT_MAX_DEPTH};
pub use error::{AssemblyError, AssemblyResult};
pub use unpacker::Unpacker;
