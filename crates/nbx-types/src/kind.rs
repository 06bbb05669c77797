use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The encodable bundle levels.
///
/// A module is never encoded on its own; it only appears as a resource of a
/// component bundle, so it has no `BundleKind`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundleKind {
    /// A set of modules.
    Component,
    /// A set of component bundles.
    Application,
    /// One application bundle plus a UI asset.
    WebApplication,
}

impl BundleKind {
    pub const ALL: [BundleKind; 3] = [Self::Component, Self::Application, Self::WebApplication];

    /// Tag byte written into the bundle container header.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Component => 1,
            Self::Application => 2,
            Self::WebApplication => 3,
        }
    }

    /// Parse a container header tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Component),
            2 => Some(Self::Application),
            3 => Some(Self::WebApplication),
            _ => None,
        }
    }

    /// The token level whose token is this kind's root token.
    pub fn root_level(&self) -> TokenLevel {
        match self {
            Self::Component => TokenLevel::ComponentBundle,
            Self::Application => TokenLevel::Application,
            Self::WebApplication => TokenLevel::WebApplication,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Application => "application",
            Self::WebApplication => "web-application",
        }
    }
}

impl fmt::Display for BundleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BundleKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "component" => Ok(Self::Component),
            "application" => Ok(Self::Application),
            "web-application" => Ok(Self::WebApplication),
            other => Err(TypeError::UnknownKind(other.to_string())),
        }
    }
}

/// What a manifest slot refers to.
///
/// `Module` and `UiAsset` are leaves stored directly in the block store;
/// `ComponentBundle` and `ApplicationBundle` are nested bundles that are
/// decoded and assembled as their own units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotKind {
    Module,
    ComponentBundle,
    ApplicationBundle,
    UiAsset,
}

impl SlotKind {
    /// The bundle kind a nested-bundle slot must decode to, or `None` for leaves.
    pub fn nested_kind(&self) -> Option<BundleKind> {
        match self {
            Self::Module | Self::UiAsset => None,
            Self::ComponentBundle => Some(BundleKind::Component),
            Self::ApplicationBundle => Some(BundleKind::Application),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.nested_kind().is_none()
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Module => "module",
            Self::ComponentBundle => "component-bundle",
            Self::ApplicationBundle => "application-bundle",
            Self::UiAsset => "ui-asset",
        };
        f.write_str(s)
    }
}

/// A level of the token hierarchy, used to name verification failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenLevel {
    /// Token over the ordered modules of one component bundle.
    ModuleSet,
    ComponentBundle,
    Application,
    WebApplication,
}

impl fmt::Display for TokenLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ModuleSet => "module-set",
            Self::ComponentBundle => "component-bundle",
            Self::Application => "application",
            Self::WebApplication => "web-application",
        };
        f.write_str(s)
    }
}
