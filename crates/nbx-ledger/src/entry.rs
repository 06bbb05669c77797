use chrono::{DateTime, Utc};
use nbx_bundle::Manifest;
use nbx_crypto::ContentHasher;
use nbx_token::EntryTokens;
use nbx_types::{Address, BundleKind, Token};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// A persisted, fully resolved manifest with its tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub address: Address,
    pub manifest: Manifest,
    pub tokens: EntryTokens,
    /// When this ledger first recorded the entry. Not part of the address.
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Build an entry stamped with the current time.
    ///
    /// Every slot of `manifest` must be resolved.
    pub fn new(manifest: Manifest, tokens: EntryTokens) -> LedgerResult<Self> {
        if let Some(slot) = manifest.slots.iter().find(|s| s.location.address().is_none()) {
            return Err(LedgerError::Unresolved {
                slot: slot.name.clone(),
            });
        }
        let address = Self::compute_address(&manifest, &tokens)?;
        Ok(Self {
            address,
            manifest,
            tokens,
            created_at: Utc::now(),
        })
    }

    /// `nbx-entry-v1` hash over the canonical encoding of `(manifest, tokens)`.
    pub fn compute_address(manifest: &Manifest, tokens: &EntryTokens) -> LedgerResult<Address> {
        let bytes = bincode::serialize(&(manifest, tokens))
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        Ok(ContentHasher::ENTRY.hash(&bytes))
    }

    pub fn kind(&self) -> BundleKind {
        self.manifest.kind
    }

    pub fn root_token(&self) -> Token {
        self.tokens.root()
    }

    /// Check that the stored address matches the content.
    pub fn verify_address(&self) -> LedgerResult<()> {
        let computed = Self::compute_address(&self.manifest, &self.tokens)?;
        if computed != self.address {
            return Err(LedgerError::CorruptEntry {
                address: self.address,
                reason: format!("content hashes to {computed}"),
            });
        }
        Ok(())
    }
}
