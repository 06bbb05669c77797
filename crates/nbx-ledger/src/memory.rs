use std::collections::HashMap;
use std::sync::RwLock;

use nbx_bundle::Manifest;
use nbx_token::EntryTokens;
use nbx_types::{Address, Token};
use tracing::{debug, info};

use crate::entry::Entry;
use crate::error::{LedgerError, LedgerResult};
use crate::traits::Ledger;

/// In-memory ledger for tests and embedding.
#[derive(Default)]
pub struct InMemoryLedger {
    inner: RwLock<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    entries: HashMap<Address, Entry>,
    by_token: HashMap<Token, Address>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store `entry` under the address of its current content, skipping
    /// token checks and the token index. Test hook for tamper scenarios.
    #[doc(hidden)]
    pub fn force_insert(&self, mut entry: Entry) -> LedgerResult<Address> {
        entry.address = Entry::compute_address(&entry.manifest, &entry.tokens)?;
        let address = entry.address;
        let mut state = self
            .inner
            .write()
            .map_err(|_| LedgerError::Storage("ledger write lock poisoned".into()))?;
        state.entries.insert(address, entry);
        Ok(address)
    }
}

impl Ledger for InMemoryLedger {
    fn persist(&self, manifest: Manifest, tokens: EntryTokens) -> LedgerResult<Entry> {
        let entry = Entry::new(manifest, tokens)?;
        let root = entry.root_token();

        let mut state = self
            .inner
            .write()
            .map_err(|_| LedgerError::Storage("ledger write lock poisoned".into()))?;
        if let Some(existing) = state.by_token.get(&root).and_then(|a| state.entries.get(a)) {
            debug!(entry = %existing.address.short_hex(), "entry already recorded");
            return Ok(existing.clone());
        }

        state.by_token.insert(root, entry.address);
        state.entries.insert(entry.address, entry.clone());
        info!(
            entry = %entry.address.short_hex(),
            kind = %entry.kind(),
            token = %root.short_hex(),
            "persisted entry"
        );
        Ok(entry)
    }

    fn lookup(&self, token: &Token) -> LedgerResult<Option<Entry>> {
        let state = self
            .inner
            .read()
            .map_err(|_| LedgerError::Storage("ledger read lock poisoned".into()))?;
        Ok(state
            .by_token
            .get(token)
            .and_then(|a| state.entries.get(a))
            .cloned())
    }

    fn get(&self, address: &Address) -> LedgerResult<Entry> {
        let state = self
            .inner
            .read()
            .map_err(|_| LedgerError::Storage("ledger read lock poisoned".into()))?;
        let entry = state
            .entries
            .get(address)
            .cloned()
            .ok_or(LedgerError::NotFound(*address))?;
        entry.verify_address()?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::fixtures;

    #[test]
    fn persist_then_get_and_lookup() {
        let ledger = InMemoryLedger::new();
        let (manifest, tokens) = fixtures::component(b"module");
        let root = tokens.root();

        let entry = ledger.persist(manifest, tokens).unwrap();
        assert_eq!(ledger.get(&entry.address).unwrap(), entry);
        assert_eq!(ledger.lookup(&root).unwrap(), Some(entry.clone()));
        assert!(ledger.contains(&entry.address).unwrap());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn persist_is_idempotent_on_root_token() {
        let ledger = InMemoryLedger::new();
        let (manifest, tokens) = fixtures::component(b"module");
        let first = ledger.persist(manifest.clone(), tokens.clone()).unwrap();
        // Same identity, different presentation metadata: the first entry wins.
        let second = ledger
            .persist(manifest.with_description("later"), tokens)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn edited_entry_is_corrupt() {
        let ledger = InMemoryLedger::new();
        let (manifest, tokens) = fixtures::component(b"module");
        let entry = ledger.persist(manifest, tokens).unwrap();

        let mut edited = entry.clone();
        edited.manifest.description = "edited in place".into();
        ledger
            .inner
            .write()
            .unwrap()
            .entries
            .insert(entry.address, edited);

        assert!(matches!(
            ledger.get(&entry.address),
            Err(LedgerError::CorruptEntry { address, .. }) if address == entry.address
        ));
    }

    #[test]
    fn force_insert_readdresses_the_entry() {
        let ledger = InMemoryLedger::new();
        let (manifest, tokens) = fixtures::component(b"module");
        let entry = ledger.persist(manifest, tokens).unwrap();

        let mut edited = entry.clone();
        edited.manifest.description = "rewritten".into();
        let address = ledger.force_insert(edited).unwrap();
        assert_ne!(address, entry.address);
        assert_eq!(ledger.get(&address).unwrap().manifest.description, "rewritten");
        assert_eq!(ledger.get(&entry.address).unwrap(), entry);
    }

    #[test]
    fn missing_entry_is_not_found() {
        let ledger = InMemoryLedger::new();
        let address = Address::of(b"nothing");
        assert_eq!(ledger.get(&address), Err(LedgerError::NotFound(address)));
        assert!(!ledger.contains(&address).unwrap());
        assert!(ledger.lookup(&Token::from_hash([0; 32])).unwrap().is_none());
    }
}
