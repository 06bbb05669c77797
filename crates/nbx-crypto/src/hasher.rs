use nbx_types::{Address, TokenLevel};

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"nbx-block-v1"`) that is prepended
/// to every hash computation. A block and a token over identical bytes
/// therefore produce different hashes.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for raw block bytes.
    pub const BLOCK: Self = Self::new("nbx-block-v1");
    /// Hasher for stored asset records (block list + total length).
    pub const ASSET: Self = Self::new("nbx-asset-v1");
    /// Hasher for persisted ledger entries.
    pub const ENTRY: Self = Self::new("nbx-entry-v1");
    /// Token over the ordered modules of a component bundle.
    pub const MODULE_SET: Self = Self::new("nbx-token-module-set-v1");
    /// Token of a component bundle.
    pub const COMPONENT: Self = Self::new("nbx-token-component-v1");
    /// Token of an application bundle.
    pub const APPLICATION: Self = Self::new("nbx-token-application-v1");
    /// Token of a web-application bundle.
    pub const WEB_APPLICATION: Self = Self::new("nbx-token-web-application-v1");

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// The token hasher for a level of the token hierarchy.
    pub const fn for_level(level: TokenLevel) -> Self {
        match level {
            TokenLevel::ModuleSet => Self::MODULE_SET,
            TokenLevel::ComponentBundle => Self::COMPONENT,
            TokenLevel::Application => Self::APPLICATION,
            TokenLevel::WebApplication => Self::WEB_APPLICATION,
        }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Address {
        let mut stream = self.stream();
        stream.update(data);
        stream.finalize()
    }

    /// Start an incremental hash in this domain.
    pub fn stream(&self) -> StreamHasher {
        let mut inner = blake3::Hasher::new();
        inner.update(self.domain.as_bytes());
        inner.update(b":");
        StreamHasher { inner }
    }

    /// Verify that data produces the expected address.
    pub fn verify(&self, data: &[u8], expected: &Address) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Incremental domain-separated hash, for inputs assembled from several parts.
pub struct StreamHasher {
    inner: blake3::Hasher,
}

impl StreamHasher {
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    pub fn finalize(&self) -> Address {
        Address::from_hash(*self.inner.finalize().as_bytes())
    }
}
