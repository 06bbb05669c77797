//! Foundation types for NBX (Nested Bundle eXchange).
//!
//! This crate provides the identity and classification types shared by every
//! other NBX crate.
//!
//! # Key Types
//!
//! - [`Address`] — Content address of stored bytes (BLAKE3 hash)
//! - [`Token`] — Hierarchical integrity token bound to one manifest node
//! - [`BundleKind`] — The three encodable bundle levels
//! - [`SlotKind`] — What a manifest slot points at (module, nested bundle, UI asset)
//! - [`TokenLevel`] — Which level of the token hierarchy a token belongs to

pub mod address;
pub mod error;
pub mod kind;
pub mod token;

pub use address::Address;
pub use error::TypeError;
pub use kind::{BundleKind, SlotKind, TokenLevel};
pub use token::Token;
