//! Bundle manifests and the NBX bundle container.
//!
//! A bundle is a [`Manifest`] plus a map of named resources. The
//! [`BundleCodec`] moves bundles in and out of a single transportable byte
//! stream:
//!
//! ```text
//! offset 0  magic           b"NBXB"
//! offset 4  format version  u32 BE
//! offset 8  kind tag        u8
//! offset 9  payload CRC32   u32 BE
//! offset 13 payload         zstd(bincode(Bundle))
//! ```
//!
//! Map-typed fields are `BTreeMap`s, so keys are always serialized in
//! lexicographic byte order and equal bundles encode to identical bytes.
//! The codec never resolves nested bundles; that is the assembler's job.

pub mod bundle;
pub mod codec;
pub mod error;
pub mod manifest;
pub mod workdir;

pub use bundle::Bundle;
pub use codec::{BundleCodec, BundleHeader, FORMAT_VERSION, HEADER_LEN, MAGIC};
pub use error::{BundleError, BundleResult};
pub use manifest::{Location, Manifest, Slot};
pub use workdir::{pack_dir, read_manifest, unpack_dir, MANIFEST_FILE};
