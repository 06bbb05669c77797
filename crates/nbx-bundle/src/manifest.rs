use std::collections::{BTreeMap, HashSet};

use nbx_types::{Address, BundleKind, SlotKind};
use serde::{Deserialize, Serialize};

use crate::error::{BundleError, BundleResult};

/// Where a slot's content lives.
///
/// Transport bundles carry `Bundled` slots whose bytes sit in the bundle's
/// resource map. Assembly rewrites each slot to `Resolved`, keeping the
/// resource path so the bundle can be reconstituted exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Location {
    Bundled { path: String },
    Resolved { path: String, address: Address },
}

impl Location {
    pub fn path(&self) -> &str {
        match self {
            Self::Bundled { path } | Self::Resolved { path, .. } => path,
        }
    }

    pub fn address(&self) -> Option<Address> {
        match self {
            Self::Bundled { .. } => None,
            Self::Resolved { address, .. } => Some(*address),
        }
    }
}

/// One declared child of a manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub name: String,
    pub kind: SlotKind,
    pub location: Location,
}

impl Slot {
    pub fn bundled(name: impl Into<String>, kind: SlotKind, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            location: Location::Bundled { path: path.into() },
        }
    }

    /// Rewrite to the resolved form, keeping name, kind and path.
    pub fn resolve(&self, address: Address) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            location: Location::Resolved {
                path: self.location.path().to_string(),
                address,
            },
        }
    }

    /// Rewrite back to the inline form.
    pub fn inline(&self) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            location: Location::Bundled {
                path: self.location.path().to_string(),
            },
        }
    }
}

/// Bundle manifest.
///
/// Identity fields are `kind`, `name`, `properties`, and the ordered
/// `(name, kind)` of each slot. `description` and resource paths are
/// presentation metadata and never contribute to a token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub kind: BundleKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    pub slots: Vec<Slot>,
}

impl Manifest {
    pub fn new(kind: BundleKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: String::new(),
            properties: BTreeMap::new(),
            slots: Vec::new(),
        }
    }

    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// `true` when every slot carries a content address.
    pub fn is_resolved(&self) -> bool {
        self.slots.iter().all(|s| s.location.address().is_some())
    }

    /// `true` when no slot carries a content address.
    pub fn is_inline(&self) -> bool {
        self.slots.iter().all(|s| s.location.address().is_none())
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// Check the slot layout allowed for this manifest's kind.
    ///
    /// - component: at least one slot, all modules
    /// - application: at least one slot, all component bundles
    /// - web-application: exactly one application bundle and one UI asset
    pub fn validate_shape(&self) -> BundleResult<()> {
        if self.name.trim().is_empty() {
            return Err(BundleError::InvalidManifest("manifest name is empty".into()));
        }

        let mut names = HashSet::new();
        for slot in &self.slots {
            if slot.name.trim().is_empty() {
                return Err(BundleError::InvalidManifest("slot name is empty".into()));
            }
            if !names.insert(slot.name.as_str()) {
                return Err(BundleError::InvalidManifest(format!(
                    "duplicate slot name '{}'",
                    slot.name
                )));
            }
        }

        match self.kind {
            BundleKind::Component => self.require_uniform(SlotKind::Module),
            BundleKind::Application => self.require_uniform(SlotKind::ComponentBundle),
            BundleKind::WebApplication => {
                let count = |kind: SlotKind| self.slots.iter().filter(|s| s.kind == kind).count();
                let apps = count(SlotKind::ApplicationBundle);
                let uis = count(SlotKind::UiAsset);
                if apps != 1 || uis != 1 || self.slots.len() != 2 {
                    return Err(BundleError::InvalidManifest(format!(
                        "web-application bundle needs exactly one application-bundle and one \
                         ui-asset slot, found {} slots ({apps} application, {uis} ui)",
                        self.slots.len()
                    )));
                }
                Ok(())
            }
        }
    }

    fn require_uniform(&self, allowed: SlotKind) -> BundleResult<()> {
        if self.slots.is_empty() {
            return Err(BundleError::InvalidManifest(format!(
                "{} bundle '{}' declares no slots",
                self.kind, self.name
            )));
        }
        if let Some(slot) = self.slots.iter().find(|s| s.kind != allowed) {
            return Err(BundleError::InvalidManifest(format!(
                "slot '{}' is a {}, {} bundles only hold {allowed} slots",
                slot.name, slot.kind, self.kind
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component() -> Manifest {
        Manifest::new(BundleKind::Component, "profiles")
            .with_slot(Slot::bundled("integrity", SlotKind::Module, "integrity.wasm"))
            .with_slot(Slot::bundled("coordinator", SlotKind::Module, "coordinator.wasm"))
    }

    #[test]
    fn component_shape_is_valid() {
        component().validate_shape().unwrap();
    }

    #[test]
    fn empty_component_is_rejected() {
        let err = Manifest::new(BundleKind::Component, "empty").validate_shape().unwrap_err();
        assert!(matches!(err, BundleError::InvalidManifest(_)));
    }

    #[test]
    fn wrong_slot_kind_is_rejected() {
        let manifest = Manifest::new(BundleKind::Application, "app")
            .with_slot(Slot::bundled("m", SlotKind::Module, "m.wasm"));
        assert!(matches!(manifest.validate_shape(), Err(BundleError::InvalidManifest(_))));
    }

    #[test]
    fn duplicate_slot_names_are_rejected() {
        let manifest =
            component().with_slot(Slot::bundled("integrity", SlotKind::Module, "x.wasm"));
        assert!(matches!(manifest.validate_shape(), Err(BundleError::InvalidManifest(_))));
    }

    #[test]
    fn web_application_needs_app_and_ui() {
        let ok = Manifest::new(BundleKind::WebApplication, "web")
            .with_slot(Slot::bundled("app", SlotKind::ApplicationBundle, "app.nbx"))
            .with_slot(Slot::bundled("ui", SlotKind::UiAsset, "ui.zip"));
        ok.validate_shape().unwrap();

        let missing_ui = Manifest::new(BundleKind::WebApplication, "web")
            .with_slot(Slot::bundled("app", SlotKind::ApplicationBundle, "app.nbx"));
        assert!(missing_ui.validate_shape().is_err());

        let two_apps = ok
            .clone()
            .with_slot(Slot::bundled("app2", SlotKind::ApplicationBundle, "app2.nbx"));
        assert!(two_apps.validate_shape().is_err());
    }

    #[test]
    fn resolve_and_inline_keep_path() {
        let slot = Slot::bundled("m", SlotKind::Module, "dir/m.wasm");
        let resolved = slot.resolve(Address::of(b"m"));
        assert_eq!(resolved.location.path(), "dir/m.wasm");
        assert_eq!(resolved.location.address(), Some(Address::of(b"m")));
        assert_eq!(resolved.inline(), slot);
    }

    #[test]
    fn resolution_state() {
        let inline = component();
        assert!(inline.is_inline());
        assert!(!inline.is_resolved());

        let mut resolved = inline.clone();
        resolved.slots = resolved
            .slots
            .iter()
            .map(|s| s.resolve(Address::of(s.name.as_bytes())))
            .collect();
        assert!(resolved.is_resolved());
        assert!(!resolved.is_inline());
    }
}
