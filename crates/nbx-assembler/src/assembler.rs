use std::collections::BTreeMap;
use std::sync::Arc;

use nbx_bundle::{Bundle, BundleCodec, BundleError, Slot};
use nbx_ledger::{Entry, Ledger};
use nbx_store::AssetStore;
use nbx_token::leaf_token;
use nbx_types::{Address, BundleKind, SlotKind, Token};
use tracing::{debug, info};

use crate::config::AssemblerConfig;
use crate::error::AssemblyResult;
use crate::parallel::map_slots;

/// Turns transport bundles into ledger entries, bottom-up.
///
/// Each slot is resolved before its parent: leaves go to the asset store,
/// nested bundles are decoded with the kind their slot requires and
/// assembled recursively. Once every slot has an address the manifest is
/// rewritten, its tokens derived, and the entry persisted unless the ledger
/// already knows its root token.
#[derive(Clone)]
pub struct Assembler {
    assets: AssetStore,
    ledger: Arc<dyn Ledger>,
    config: AssemblerConfig,
}

impl Assembler {
    pub fn new(assets: AssetStore, ledger: Arc<dyn Ledger>, config: AssemblerConfig) -> Self {
        Self {
            assets,
            ledger,
            config,
        }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Decode `bytes` as a bundle of `kind` and assemble it.
    pub fn assemble(&self, bytes: &[u8], kind: BundleKind) -> AssemblyResult<Entry> {
        let bundle = BundleCodec::decode(bytes, kind)?;
        self.assemble_at(bundle, 1)
    }

    /// Assemble an already decoded bundle.
    pub fn assemble_bundle(&self, bundle: Bundle) -> AssemblyResult<Entry> {
        bundle.validate()?;
        self.assemble_at(bundle, 1)
    }

    fn assemble_at(&self, bundle: Bundle, depth: usize) -> AssemblyResult<Entry> {
        self.config.check_depth(depth)?;
        let Bundle {
            manifest,
            resources,
        } = bundle;

        let children = map_slots(&manifest.slots, self.config.parallel, |slot| {
            self.resolve_slot(slot, &resources, depth)
        })?;

        let mut resolved = manifest;
        resolved.slots = resolved
            .slots
            .iter()
            .zip(&children)
            .map(|(slot, (address, _))| slot.resolve(*address))
            .collect();
        let child_tokens: Vec<Token> = children.iter().map(|(_, token)| *token).collect();
        let tokens = nbx_token::derive(&resolved, &child_tokens)?;

        if let Some(existing) = self.ledger.lookup(&tokens.root())? {
            debug!(
                entry = %existing.address.short_hex(),
                kind = %existing.kind(),
                "bundle already assembled"
            );
            return Ok(existing);
        }

        let entry = self.ledger.persist(resolved, tokens)?;
        info!(
            entry = %entry.address.short_hex(),
            kind = %entry.kind(),
            name = %entry.manifest.name,
            depth,
            "assembled bundle"
        );
        Ok(entry)
    }

    /// Store or assemble one slot, returning its address and token.
    fn resolve_slot(
        &self,
        slot: &Slot,
        resources: &BTreeMap<String, Vec<u8>>,
        depth: usize,
    ) -> AssemblyResult<(Address, Token)> {
        let path = slot.location.path();
        let bytes = resources
            .get(path)
            .ok_or_else(|| BundleError::MissingResource {
                slot: slot.name.clone(),
                path: path.to_string(),
            })?;

        let nested = match slot.kind {
            SlotKind::Module | SlotKind::UiAsset => {
                let address = self.assets.save(bytes)?.address()?;
                debug!(slot = %slot.name, asset = %address.short_hex(), "stored leaf");
                return Ok((address, leaf_token(&address)));
            }
            SlotKind::ComponentBundle => BundleKind::Component,
            SlotKind::ApplicationBundle => BundleKind::Application,
        };

        let child = BundleCodec::decode(bytes, nested)?;
        let entry = self.assemble_at(child, depth + 1)?;
        Ok((entry.address, entry.root_token()))
    }
}

impl std::fmt::Debug for Assembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assembler")
            .field("assets", &self.assets)
            .field("config", &self.config)
            .finish()
    }
}
