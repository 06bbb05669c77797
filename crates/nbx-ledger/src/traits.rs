use nbx_bundle::Manifest;
use nbx_token::EntryTokens;
use nbx_types::{Address, Token};

use crate::entry::Entry;
use crate::error::LedgerResult;

/// Where resolved manifests live once assembled.
///
/// Entries are immutable. `persist` is idempotent on the root token: a
/// second call with a manifest whose root token is already known returns
/// the existing entry.
pub trait Ledger: Send + Sync {
    /// Record a resolved manifest and its tokens.
    fn persist(&self, manifest: Manifest, tokens: EntryTokens) -> LedgerResult<Entry>;

    /// Find the entry whose root token is `token`.
    fn lookup(&self, token: &Token) -> LedgerResult<Option<Entry>>;

    /// Fetch an entry by address. Fails with `NotFound` if absent.
    fn get(&self, address: &Address) -> LedgerResult<Entry>;

    fn contains(&self, address: &Address) -> LedgerResult<bool> {
        match self.get(address) {
            Ok(_) => Ok(true),
            Err(crate::LedgerError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
