use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::bundle::Bundle;
use crate::error::{BundleError, BundleResult};
use crate::manifest::{Location, Manifest};

/// Manifest file name written by [`unpack_dir`].
pub const MANIFEST_FILE: &str = "nbx.toml";

/// Parse a TOML manifest file.
pub fn read_manifest(path: &Path) -> BundleResult<Manifest> {
    let text = std::fs::read_to_string(path)?;
    toml::from_str(&text).map_err(|e| BundleError::ManifestParse(e.to_string()))
}

/// Build a bundle from a TOML manifest and the files its slots name.
///
/// Resource paths are resolved relative to the manifest's directory.
pub fn pack_dir(manifest_path: &Path) -> BundleResult<Bundle> {
    let manifest = read_manifest(manifest_path)?;
    let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let mut bundle = Bundle::new(manifest);
    for slot in &bundle.manifest.slots {
        let Location::Bundled { path } = &slot.location else {
            return Err(BundleError::InvalidManifest(format!(
                "slot '{}' must use a bundled location in a working directory",
                slot.name
            )));
        };
        let file = base.join(checked_relative(path)?);
        let bytes = std::fs::read(&file).map_err(|e| {
            BundleError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {e}", file.display()),
            ))
        })?;
        bundle.resources.insert(path.clone(), bytes);
    }
    bundle.validate()?;

    debug!(
        manifest = %manifest_path.display(),
        kind = %bundle.manifest.kind,
        resources = bundle.resources.len(),
        "packed working directory"
    );
    Ok(bundle)
}

/// Write a bundle's manifest and resources into `dir`.
///
/// Returns the path of the written manifest.
pub fn unpack_dir(bundle: &Bundle, dir: &Path) -> BundleResult<PathBuf> {
    bundle.validate()?;
    std::fs::create_dir_all(dir)?;

    for (path, bytes) in &bundle.resources {
        let target = dir.join(checked_relative(path)?);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, bytes)?;
    }

    let text = toml::to_string_pretty(&bundle.manifest)
        .map_err(|e| BundleError::Serialization(e.to_string()))?;
    let manifest_path = dir.join(MANIFEST_FILE);
    std::fs::write(&manifest_path, text)?;
    Ok(manifest_path)
}

/// Reject resource paths that would escape the bundle directory.
fn checked_relative(path: &str) -> BundleResult<PathBuf> {
    let candidate = Path::new(path);
    let escapes = candidate.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if path.is_empty() || escapes {
        return Err(BundleError::InvalidManifest(format!(
            "resource path '{path}' must be relative and stay inside the bundle directory"
        )));
    }
    Ok(candidate.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BundleCodec;
    use crate::manifest::Slot;
    use nbx_types::{BundleKind, SlotKind};

    const COMPONENT_TOML: &str = r#"
kind = "component"
name = "profiles"
description = "profile management"

[properties]
network = "main"

[[slots]]
name = "integrity"
kind = "module"
location = { bundled = { path = "zomes/integrity.wasm" } }

[[slots]]
name = "coordinator"
kind = "module"
location = { bundled = { path = "zomes/coordinator.wasm" } }
"#;

    fn write_component(dir: &Path) -> PathBuf {
        std::fs::create_dir_all(dir.join("zomes")).unwrap();
        std::fs::write(dir.join("zomes/integrity.wasm"), b"\0asm integrity").unwrap();
        std::fs::write(dir.join("zomes/coordinator.wasm"), b"\0asm coordinator").unwrap();
        let manifest = dir.join(MANIFEST_FILE);
        std::fs::write(&manifest, COMPONENT_TOML).unwrap();
        manifest
    }

    #[test]
    fn pack_reads_manifest_and_resources() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = pack_dir(&write_component(dir.path())).unwrap();

        assert_eq!(bundle.manifest.kind, BundleKind::Component);
        assert_eq!(bundle.manifest.slots.len(), 2);
        assert_eq!(bundle.manifest.properties["network"], "main");
        assert_eq!(
            bundle.resource("zomes/integrity.wasm"),
            Some(&b"\0asm integrity"[..])
        );
    }

    #[test]
    fn unpack_then_pack_is_lossless() {
        let src = tempfile::tempdir().unwrap();
        let original = pack_dir(&write_component(src.path())).unwrap();

        let out = tempfile::tempdir().unwrap();
        let manifest_path = unpack_dir(&original, out.path()).unwrap();
        let repacked = pack_dir(&manifest_path).unwrap();

        assert_eq!(repacked, original);
        assert_eq!(
            BundleCodec::encode(&repacked).unwrap(),
            BundleCodec::encode(&original).unwrap()
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = write_component(dir.path());
        std::fs::remove_file(dir.path().join("zomes/coordinator.wasm")).unwrap();
        assert!(matches!(pack_dir(&manifest).unwrap_err(), BundleError::Io(_)));
    }

    #[test]
    fn escaping_paths_are_rejected() {
        let bundle = Bundle::new(
            Manifest::new(BundleKind::Component, "evil")
                .with_slot(Slot::bundled("m", SlotKind::Module, "../outside.wasm")),
        )
        .with_resource("../outside.wasm", b"x".to_vec());
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            unpack_dir(&bundle, dir.path()).unwrap_err(),
            BundleError::InvalidManifest(_)
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        std::fs::write(&path, "kind = [not toml").unwrap();
        assert!(matches!(read_manifest(&path).unwrap_err(), BundleError::ManifestParse(_)));
    }
}
