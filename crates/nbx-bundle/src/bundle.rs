use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{BundleError, BundleResult};
use crate::manifest::{Location, Manifest};

/// Transport form of a bundle: a manifest plus its named resources.
///
/// Every `Bundled` slot path maps to exactly one resource and every resource
/// is referenced by exactly one slot. [`Bundle::validate`] enforces this.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    pub manifest: Manifest,
    pub resources: BTreeMap<String, Vec<u8>>,
}

impl Bundle {
    pub fn new(manifest: Manifest) -> Self {
        Self {
            manifest,
            resources: BTreeMap::new(),
        }
    }

    pub fn with_resource(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.resources.insert(path.into(), bytes.into());
        self
    }

    pub fn resource(&self, path: &str) -> Option<&[u8]> {
        self.resources.get(path).map(Vec::as_slice)
    }

    /// Check the manifest shape and the slot/resource bijection.
    pub fn validate(&self) -> BundleResult<()> {
        self.manifest.validate_shape()?;

        let mut referenced = BTreeSet::new();
        for slot in &self.manifest.slots {
            let path = match &slot.location {
                Location::Bundled { path } => path,
                Location::Resolved { .. } => {
                    return Err(BundleError::InvalidManifest(format!(
                        "slot '{}' is already resolved; transport bundles carry inline resources",
                        slot.name
                    )));
                }
            };
            if !referenced.insert(path.as_str()) {
                return Err(BundleError::DuplicateReference { path: path.clone() });
            }
            if !self.resources.contains_key(path) {
                return Err(BundleError::MissingResource {
                    slot: slot.name.clone(),
                    path: path.clone(),
                });
            }
        }

        if let Some(orphan) = self
            .resources
            .keys()
            .find(|path| !referenced.contains(path.as_str()))
        {
            return Err(BundleError::OrphanResource {
                path: orphan.clone(),
            });
        }
        Ok(())
    }

    /// Total size of all resources in bytes.
    pub fn resource_bytes(&self) -> u64 {
        self.resources.values().map(|r| r.len() as u64).sum()
    }
}
