use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use nbx_bundle::Manifest;
use nbx_token::EntryTokens;
use nbx_types::{Address, Token};
use tracing::{debug, info};

use crate::entry::Entry;
use crate::error::{LedgerError, LedgerResult};
use crate::traits::Ledger;

const ENTRIES_DIR: &str = "entries";
const TOKENS_DIR: &str = "tokens";
const TMP_DIR: &str = "tmp";

/// Filesystem ledger.
///
/// Layout: `<root>/entries/<address>.json` holds each entry;
/// `<root>/tokens/<root token>` holds the hex address of the entry with that
/// root token. Files are written through `<root>/tmp` and renamed into
/// place. Reads recompute the entry address and fail with
/// [`LedgerError::CorruptEntry`] on mismatch.
#[derive(Debug, Clone)]
pub struct FsLedger {
    root: PathBuf,
}

impl FsLedger {
    pub fn open(root: impl AsRef<Path>) -> LedgerResult<Self> {
        let root = root.as_ref().to_path_buf();
        for dir in [ENTRIES_DIR, TOKENS_DIR, TMP_DIR] {
            std::fs::create_dir_all(root.join(dir))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, address: &Address) -> PathBuf {
        self.root
            .join(ENTRIES_DIR)
            .join(format!("{}.json", address.to_hex()))
    }

    fn token_path(&self, token: &Token) -> PathBuf {
        self.root.join(TOKENS_DIR).join(token.to_hex())
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> LedgerResult<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(self.root.join(TMP_DIR))?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| LedgerError::from(e.error))?;
        Ok(())
    }
}

impl Ledger for FsLedger {
    fn persist(&self, manifest: Manifest, tokens: EntryTokens) -> LedgerResult<Entry> {
        let entry = Entry::new(manifest, tokens)?;
        let root = entry.root_token();
        if let Some(existing) = self.lookup(&root)? {
            debug!(entry = %existing.address.short_hex(), "entry already recorded");
            return Ok(existing);
        }

        let json = serde_json::to_vec_pretty(&entry)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        // Entry first, then index, so an index file never dangles.
        self.write_atomic(&self.entry_path(&entry.address), &json)?;
        self.write_atomic(&self.token_path(&root), entry.address.to_hex().as_bytes())?;

        info!(
            entry = %entry.address.short_hex(),
            kind = %entry.kind(),
            token = %root.short_hex(),
            "persisted entry"
        );
        Ok(entry)
    }

    fn lookup(&self, token: &Token) -> LedgerResult<Option<Entry>> {
        let hex = match std::fs::read_to_string(self.token_path(token)) {
            Ok(hex) => hex,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let address = Address::from_hex(hex.trim())
            .map_err(|e| LedgerError::Storage(format!("token index {token}: {e}")))?;
        self.get(&address).map(Some)
    }

    fn get(&self, address: &Address) -> LedgerResult<Entry> {
        let bytes = match std::fs::read(self.entry_path(address)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(LedgerError::NotFound(*address))
            }
            Err(e) => return Err(e.into()),
        };
        let entry: Entry = serde_json::from_slice(&bytes).map_err(|e| LedgerError::CorruptEntry {
            address: *address,
            reason: e.to_string(),
        })?;
        if entry.address != *address {
            return Err(LedgerError::CorruptEntry {
                address: *address,
                reason: format!("file records address {}", entry.address),
            });
        }
        entry.verify_address()?;
        Ok(entry)
    }
}
