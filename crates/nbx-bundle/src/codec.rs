use nbx_types::BundleKind;
use tracing::trace;

use crate::bundle::Bundle;
use crate::error::{BundleError, BundleResult};

/// Container magic bytes.
pub const MAGIC: &[u8; 4] = b"NBXB";
/// Current container format version.
pub const FORMAT_VERSION: u32 = 1;
/// Header length: magic + version + kind tag + payload CRC32.
pub const HEADER_LEN: usize = 4 + 4 + 1 + 4;
/// Fixed zstd level; changing it changes encoded bytes.
const COMPRESSION_LEVEL: i32 = 3;

/// Parsed container header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BundleHeader {
    pub version: u32,
    pub kind: BundleKind,
    pub checksum: u32,
}

impl BundleHeader {
    /// Parse and validate the header at the start of `data`.
    pub fn parse(data: &[u8]) -> BundleResult<Self> {
        if data.len() < HEADER_LEN {
            return Err(BundleError::format(format!(
                "bundle too short: {} bytes, header needs {HEADER_LEN}",
                data.len()
            )));
        }
        if &data[0..4] != MAGIC {
            return Err(BundleError::format(format!(
                "bad magic: expected {:?}, got {:?}",
                String::from_utf8_lossy(MAGIC),
                String::from_utf8_lossy(&data[0..4])
            )));
        }
        let version = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        if version != FORMAT_VERSION {
            return Err(BundleError::UnsupportedVersion(version));
        }
        let kind = BundleKind::from_tag(data[8])
            .ok_or_else(|| BundleError::format(format!("unknown kind tag {}", data[8])))?;
        let checksum = u32::from_be_bytes([data[9], data[10], data[11], data[12]]);
        Ok(Self {
            version,
            kind,
            checksum,
        })
    }

    fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&self.version.to_be_bytes());
        buf.push(self.kind.tag());
        buf.extend_from_slice(&self.checksum.to_be_bytes());
    }
}

/// Encodes and decodes bundle containers.
pub struct BundleCodec;

impl BundleCodec {
    /// Encode a validated bundle into container bytes.
    ///
    /// Deterministic: equal bundles always produce identical bytes.
    pub fn encode(bundle: &Bundle) -> BundleResult<Vec<u8>> {
        bundle.validate()?;

        let serialized =
            bincode::serialize(bundle).map_err(|e| BundleError::Serialization(e.to_string()))?;
        let payload = zstd::encode_all(serialized.as_slice(), COMPRESSION_LEVEL)
            .map_err(|e| BundleError::Compression(e.to_string()))?;

        let header = BundleHeader {
            version: FORMAT_VERSION,
            kind: bundle.manifest.kind,
            checksum: crc32fast::hash(&payload),
        };
        let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
        header.write(&mut buf);
        buf.extend_from_slice(&payload);

        trace!(
            kind = %header.kind,
            resources = bundle.resources.len(),
            raw = serialized.len(),
            encoded = buf.len(),
            "encoded bundle"
        );
        Ok(buf)
    }

    /// Decode container bytes, requiring the header to declare `expected`.
    pub fn decode(data: &[u8], expected: BundleKind) -> BundleResult<Bundle> {
        let header = BundleHeader::parse(data)?;
        if header.kind != expected {
            return Err(BundleError::KindMismatch {
                expected,
                actual: header.kind,
            });
        }
        Self::decode_payload(header, &data[HEADER_LEN..])
    }

    /// Decode container bytes of whatever kind the header declares.
    pub fn decode_any(data: &[u8]) -> BundleResult<Bundle> {
        let header = BundleHeader::parse(data)?;
        Self::decode_payload(header, &data[HEADER_LEN..])
    }

    /// Read only the header's kind tag.
    pub fn peek_kind(data: &[u8]) -> BundleResult<BundleKind> {
        BundleHeader::parse(data).map(|h| h.kind)
    }

    fn decode_payload(header: BundleHeader, payload: &[u8]) -> BundleResult<Bundle> {
        let actual = crc32fast::hash(payload);
        if actual != header.checksum {
            return Err(BundleError::format(format!(
                "payload checksum mismatch: header {:08x}, computed {actual:08x}",
                header.checksum
            )));
        }

        let serialized =
            zstd::decode_all(payload).map_err(|e| BundleError::Decompression(e.to_string()))?;
        let bundle: Bundle = bincode::deserialize(&serialized)
            .map_err(|e| BundleError::Deserialization(e.to_string()))?;

        if bundle.manifest.kind != header.kind {
            return Err(BundleError::format(format!(
                "header declares {} but manifest is {}",
                header.kind, bundle.manifest.kind
            )));
        }
        bundle.validate()?;
        Ok(bundle)
    }
}
