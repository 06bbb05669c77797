//! Cryptographic primitives for NBX.
//!
//! Every hash NBX computes goes through a domain-separated BLAKE3
//! [`ContentHasher`], so a block, an asset record, a token, and an entry with
//! identical input bytes never share an identity.
//!
//! All crypto operations wrap established libraries — no custom cryptography.

pub mod hasher;

pub use hasher::{ContentHasher, StreamHasher};
