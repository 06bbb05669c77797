use std::sync::Arc;

use nbx_bundle::{Bundle, BundleCodec};
use nbx_ledger::Ledger;
use nbx_store::AssetStore;
use nbx_token::TokenError;
use nbx_types::{Address, BundleKind, SlotKind};
use tracing::{debug, warn};

use crate::config::AssemblerConfig;
use crate::error::{AssemblyError, AssemblyResult};
use crate::parallel::map_slots;

/// Reconstitutes transport bundles from ledger entries, top-down.
#[derive(Clone)]
pub struct Unpacker {
    assets: AssetStore,
    ledger: Arc<dyn Ledger>,
    config: AssemblerConfig,
}

impl Unpacker {
    pub fn new(assets: AssetStore, ledger: Arc<dyn Ledger>, config: AssemblerConfig) -> Self {
        Self {
            assets,
            ledger,
            config,
        }
    }

    /// Encode the entry at `address`, with every nested bundle inlined.
    pub fn unpack(&self, address: &Address) -> AssemblyResult<Vec<u8>> {
        let bundle = self.unpack_bundle(address, None)?;
        Ok(BundleCodec::encode(&bundle)?)
    }

    /// Rebuild the transport bundle for the entry at `address`.
    ///
    /// With `expected` set, the entry must be of that kind.
    pub fn unpack_bundle(
        &self,
        address: &Address,
        expected: Option<BundleKind>,
    ) -> AssemblyResult<Bundle> {
        self.unpack_at(address, expected, 1)
    }

    fn unpack_at(
        &self,
        address: &Address,
        expected: Option<BundleKind>,
        depth: usize,
    ) -> AssemblyResult<Bundle> {
        self.config.check_depth(depth)?;
        let entry = self.ledger.get(address)?;
        if let Some(expected) = expected {
            if entry.kind() != expected {
                return Err(AssemblyError::UnexpectedKind {
                    address: *address,
                    expected,
                    actual: entry.kind(),
                });
            }
        }
        if self.config.verify_on_fetch {
            if let Err(e) = nbx_token::verify(&entry.manifest, &entry.tokens) {
                warn!(entry = %address.short_hex(), error = %e, "entry failed verification");
                return Err(e.into());
            }
        }

        let resources = map_slots(&entry.manifest.slots, self.config.parallel, |slot| {
            let child = slot.location.address().ok_or_else(|| TokenError::Unresolved {
                slot: slot.name.clone(),
            })?;
            let bytes = match slot.kind {
                SlotKind::Module | SlotKind::UiAsset => self.assets.fetch(&child)?,
                SlotKind::ComponentBundle => {
                    self.unpack_nested(&child, BundleKind::Component, depth)?
                }
                SlotKind::ApplicationBundle => {
                    self.unpack_nested(&child, BundleKind::Application, depth)?
                }
            };
            Ok((slot.location.path().to_string(), bytes))
        })?;

        let mut manifest = entry.manifest;
        manifest.slots = manifest.slots.iter().map(|s| s.inline()).collect();
        let bundle = Bundle {
            manifest,
            resources: resources.into_iter().collect(),
        };

        debug!(
            entry = %address.short_hex(),
            kind = %bundle.manifest.kind,
            resources = bundle.resources.len(),
            "unpacked entry"
        );
        Ok(bundle)
    }

    fn unpack_nested(
        &self,
        address: &Address,
        kind: BundleKind,
        depth: usize,
    ) -> AssemblyResult<Vec<u8>> {
        let child = self.unpack_at(address, Some(kind), depth + 1)?;
        Ok(BundleCodec::encode(&child)?)
    }
}

impl std::fmt::Debug for Unpacker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unpacker")
            .field("assets", &self.assets)
            .field("config", &self.config)
            .finish()
    }
}
