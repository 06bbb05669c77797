use std::sync::Arc;

use nbx_assembler::{Assembler, AssemblyError, Unpacker};
use nbx_bundle::{Bundle, Manifest, Slot};
use nbx_ledger::{Entry, FsLedger, InMemoryLedger, Ledger};
use nbx_store::{AssetStore, BlockStore, FsBlockStore, InMemoryBlockStore};
use nbx_token::{EntryTokens, TokenError};
use nbx_types::{Address, BundleKind, SlotKind, Token};
use tracing::{info, warn};

use crate::config::NbxConfig;
use crate::error::{SdkError, SdkResult};

/// Subdirectory of the root holding block store objects.
pub const BLOCKS_DIR: &str = "blocks";
/// Subdirectory of the root holding ledger entries.
pub const LEDGER_DIR: &str = "ledger";

/// High-level NBX API.
///
/// Cloning is cheap; clones share the same block store and ledger.
#[derive(Clone)]
pub struct Nbx {
    blocks: Arc<dyn BlockStore>,
    assets: AssetStore,
    ledger: Arc<dyn Ledger>,
    assembler: Assembler,
    unpacker: Unpacker,
    config: NbxConfig,
}

impl Nbx {
    pub fn new(
        blocks: Arc<dyn BlockStore>,
        ledger: Arc<dyn Ledger>,
        config: NbxConfig,
    ) -> SdkResult<Self> {
        let assets = AssetStore::new(blocks.clone(), config.store.clone())?;
        Ok(Self {
            assembler: Assembler::new(assets.clone(), ledger.clone(), config.assembler.clone()),
            unpacker: Unpacker::new(assets.clone(), ledger.clone(), config.assembler.clone()),
            blocks,
            assets,
            ledger,
            config,
        })
    }

    /// Backends held entirely in memory. `config.root` is ignored.
    pub fn in_memory(config: NbxConfig) -> SdkResult<Self> {
        Self::new(
            Arc::new(InMemoryBlockStore::new()),
            Arc::new(InMemoryLedger::new()),
            config,
        )
    }

    /// Filesystem backends under `config.root`, created if missing.
    pub fn open(config: NbxConfig) -> SdkResult<Self> {
        let blocks = FsBlockStore::open(config.root.join(BLOCKS_DIR))?;
        let ledger = FsLedger::open(config.root.join(LEDGER_DIR))?;
        info!(root = %config.root.display(), "opened nbx store");
        Self::new(Arc::new(blocks), Arc::new(ledger), config)
    }

    pub fn config(&self) -> &NbxConfig {
        &self.config
    }

    pub fn blocks(&self) -> &Arc<dyn BlockStore> {
        &self.blocks
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    // ---- Bundle operations ----

    /// Decode, assemble and persist an encoded bundle of `kind`.
    ///
    /// Saving identical bytes again returns the existing entry. So does
    /// saving a bundle that differs only in its description or resource
    /// paths: those fields do not contribute to tokens, and the returned
    /// entry (and anything later fetched from it) carries the metadata of
    /// whichever bundle was saved first.
    pub fn save(&self, bytes: &[u8], kind: BundleKind) -> SdkResult<Entry> {
        Ok(self.assembler.assemble(bytes, kind)?)
    }

    /// Assemble and persist an already decoded bundle.
    ///
    /// Deduplicates like [`Nbx::save`].
    pub fn save_bundle(&self, bundle: Bundle) -> SdkResult<Entry> {
        Ok(self.assembler.assemble_bundle(bundle)?)
    }

    /// Reconstitute the encoded bundle for the entry at `address`.
    pub fn fetch(&self, address: &Address) -> SdkResult<Vec<u8>> {
        Ok(self.unpacker.unpack(address)?)
    }

    /// Reconstitute the decoded bundle for the entry at `address`.
    pub fn fetch_bundle(&self, address: &Address) -> SdkResult<Bundle> {
        Ok(self.unpacker.unpack_bundle(address, None)?)
    }

    pub fn entry(&self, address: &Address) -> SdkResult<Entry> {
        Ok(self.ledger.get(address)?)
    }

    /// Fetch the bytes of a stored module or UI asset.
    pub fn asset(&self, address: &Address) -> SdkResult<Vec<u8>> {
        Ok(self.assets.fetch(address)?)
    }

    // ---- Verification ----

    /// Verify `entry` against its manifest and its direct children.
    ///
    /// Each nested slot is looked up in the ledger and its declared token
    /// compared with the child entry's root token; a mismatch is reported at
    /// the child's level. The entry's own tokens are then recomputed from
    /// its manifest. Children are not verified recursively; see
    /// [`Nbx::verify_deep`].
    pub fn verify(&self, entry: &Entry) -> SdkResult<()> {
        for (index, slot) in entry.manifest.slots.iter().enumerate() {
            let Some(kind) = slot.kind.nested_kind() else {
                continue;
            };
            let child = self.child_entry(slot, kind)?;
            check_declared(entry, index, kind, child.root_token())?;
        }
        verify_local(entry)
    }

    /// Verify the entry at `address` and everything beneath it.
    ///
    /// Children are checked before parents. Every declared child token must
    /// equal the child entry's root token; a mismatch is reported at the
    /// child's level. Leaf asset records must be present and intact, and
    /// each entry must hash to its own address.
    pub fn verify_deep(&self, address: &Address) -> SdkResult<()> {
        self.verify_tree(address, None, 1).map(|_| ())
    }

    fn verify_tree(
        &self,
        address: &Address,
        expected: Option<BundleKind>,
        depth: usize,
    ) -> SdkResult<Token> {
        let max = self.config.assembler.max_depth;
        if depth > max {
            return Err(AssemblyError::RecursionLimitExceeded { depth, max }.into());
        }

        let entry = self.ledger.get(address)?;
        if let Some(expected) = expected {
            check_kind(address, expected, entry.kind())?;
        }

        for (index, slot) in entry.manifest.slots.iter().enumerate() {
            let child = slot_address(slot)?;
            let Some(kind) = slot.kind.nested_kind() else {
                self.assets.load(&child)?;
                continue;
            };
            let child_root = self.verify_tree(&child, Some(kind), depth + 1)?;
            check_declared(&entry, index, kind, child_root)?;
        }

        verify_local(&entry)?;
        entry.verify_address()?;
        Ok(entry.root_token())
    }

    /// The ledger entry a nested slot points at, which must be of `kind`.
    fn child_entry(&self, slot: &Slot, kind: BundleKind) -> SdkResult<Entry> {
        let address = slot_address(slot)?;
        let child = self.ledger.get(&address)?;
        check_kind(&address, kind, child.kind())?;
        Ok(child)
    }

    // ---- Async boundary ----

    /// [`Nbx::save`] on the blocking pool.
    pub async fn save_async(&self, bytes: Vec<u8>, kind: BundleKind) -> SdkResult<Entry> {
        let nbx = self.clone();
        tokio::task::spawn_blocking(move || nbx.save(&bytes, kind))
            .await
            .map_err(|e| SdkError::Join(e.to_string()))?
    }

    /// [`Nbx::fetch`] on the blocking pool.
    pub async fn fetch_async(&self, address: Address) -> SdkResult<Vec<u8>> {
        let nbx = self.clone();
        tokio::task::spawn_blocking(move || nbx.fetch(&address))
            .await
            .map_err(|e| SdkError::Join(e.to_string()))?
    }
}

fn slot_address(slot: &Slot) -> Result<Address, TokenError> {
    slot.location.address().ok_or_else(|| TokenError::Unresolved {
        slot: slot.name.clone(),
    })
}

fn check_kind(address: &Address, expected: BundleKind, actual: BundleKind) -> SdkResult<()> {
    if expected != actual {
        return Err(AssemblyError::UnexpectedKind {
            address: *address,
            expected,
            actual,
        }
        .into());
    }
    Ok(())
}

/// Compare the token `entry` declares for slot `index` with the root token
/// of the child entry it resolves to.
fn check_declared(
    entry: &Entry,
    index: usize,
    kind: BundleKind,
    child_root: Token,
) -> SdkResult<()> {
    let slot = &entry.manifest.slots[index];
    let declared = declared_child_token(&entry.manifest, &entry.tokens, index).ok_or_else(|| {
        TokenError::ShapeMismatch {
            reason: format!("no declared token for slot '{}'", slot.name),
        }
    })?;
    if declared != child_root {
        let level = kind.root_level();
        warn!(
            entry = %entry.address.short_hex(),
            slot = %slot.name,
            %level,
            "declared child token does not match child entry"
        );
        return Err(TokenError::InvalidToken {
            level,
            expected: child_root,
            found: declared,
        }
        .into());
    }
    Ok(())
}

fn verify_local(entry: &Entry) -> SdkResult<()> {
    if let Err(e) = nbx_token::verify(&entry.manifest, &entry.tokens) {
        warn!(entry = %entry.address.short_hex(), error = %e, "entry failed verification");
        return Err(e.into());
    }
    Ok(())
}

/// The token an entry declares for its nested-bundle slot at `index`.
fn declared_child_token(manifest: &Manifest, tokens: &EntryTokens, index: usize) -> Option<Token> {
    let slot = manifest.slots.get(index)?;
    match (tokens, slot.kind) {
        (EntryTokens::Application { components, .. }, SlotKind::ComponentBundle) => {
            components.get(index).copied()
        }
        (EntryTokens::WebApplication { application, .. }, SlotKind::ApplicationBundle) => {
            Some(*application)
        }
        _ => None,
    }
}

impl std::fmt::Debug for Nbx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Nbx").field("config", &self.config).finish()
    }
}
