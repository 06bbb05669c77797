use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nbx_bundle::{Bundle, BundleCodec, Manifest, Slot};
use nbx_ledger::InMemoryLedger;
use nbx_store::{
    AssetStore, BlockStore, InMemoryBlockStore, StoreConfig, StoreError, StoreResult, StoredObject,
};
use nbx_types::{Address, BundleKind, SlotKind};

use crate::{Assembler, AssemblerConfig, Unpacker};

pub struct Harness {
    pub blocks: Arc<dyn BlockStore>,
    pub ledger: Arc<InMemoryLedger>,
    pub assembler: Assembler,
    pub unpacker: Unpacker,
}

pub fn harness(config: AssemblerConfig) -> Harness {
    harness_over(Arc::new(InMemoryBlockStore::new()), config)
}

pub fn harness_over(blocks: Arc<dyn BlockStore>, config: AssemblerConfig) -> Harness {
    let assets = AssetStore::new(blocks.clone(), StoreConfig::with_chunk_size(64)).unwrap();
    let ledger = Arc::new(InMemoryLedger::new());
    Harness {
        blocks,
        ledger: ledger.clone(),
        assembler: Assembler::new(assets.clone(), ledger.clone(), config.clone()),
        unpacker: Unpacker::new(assets, ledger, config),
    }
}

pub fn component(name: &str, modules: &[(&str, &str)]) -> Bundle {
    let mut bundle = Bundle::new(Manifest::new(BundleKind::Component, name));
    for (slot, contents) in modules {
        let path = format!("zomes/{slot}.wasm");
        bundle
            .manifest
            .slots
            .push(Slot::bundled(*slot, SlotKind::Module, path.clone()));
        bundle.resources.insert(path, contents.as_bytes().to_vec());
    }
    bundle
}

pub fn application(name: &str, components: &[(&str, &Bundle)]) -> Bundle {
    let mut bundle = Bundle::new(Manifest::new(BundleKind::Application, name));
    for (slot, child) in components {
        let path = format!("{slot}.nbx");
        bundle
            .manifest
            .slots
            .push(Slot::bundled(*slot, SlotKind::ComponentBundle, path.clone()));
        bundle
            .resources
            .insert(path, BundleCodec::encode(child).unwrap());
    }
    bundle
}

pub fn web_application(name: &str, app: &Bundle, ui: &[u8]) -> Bundle {
    Bundle::new(
        Manifest::new(BundleKind::WebApplication, name)
            .with_slot(Slot::bundled("app", SlotKind::ApplicationBundle, "app.nbx"))
            .with_slot(Slot::bundled("ui", SlotKind::UiAsset, "ui.zip")),
    )
    .with_resource("app.nbx", BundleCodec::encode(app).unwrap())
    .with_resource("ui.zip", ui.to_vec())
}

/// Block store that accepts a fixed number of writes, then fails.
pub struct FaultyStore {
    inner: InMemoryBlockStore,
    remaining: AtomicUsize,
}

impl FaultyStore {
    pub fn failing_after(writes: usize) -> Self {
        Self {
            inner: InMemoryBlockStore::new(),
            remaining: AtomicUsize::new(writes),
        }
    }
}

impl BlockStore for FaultyStore {
    fn read(&self, address: &Address) -> StoreResult<Option<StoredObject>> {
        self.inner.read(address)
    }

    fn write(&self, object: &StoredObject) -> StoreResult<Address> {
        let allowed = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !allowed {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.write(object)
    }

    fn exists(&self, address: &Address) -> StoreResult<bool> {
        self.inner.exists(address)
    }
}
