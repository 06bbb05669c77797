use nbx_types::{BundleKind, Token, TokenLevel};
use serde::{Deserialize, Serialize};

/// The full token set computed for one entry.
///
/// Each variant carries the tokens of every level below the entry's root
/// that the entry itself declares.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryTokens {
    Component {
        module_set: Token,
        component: Token,
    },
    Application {
        /// Root tokens of the component bundles, in slot order.
        components: Vec<Token>,
        application: Token,
    },
    WebApplication {
        application: Token,
        ui: Token,
        web_application: Token,
    },
}

impl EntryTokens {
    /// The bundle kind these tokens belong to.
    pub fn kind(&self) -> BundleKind {
        match self {
            Self::Component { .. } => BundleKind::Component,
            Self::Application { .. } => BundleKind::Application,
            Self::WebApplication { .. } => BundleKind::WebApplication,
        }
    }

    /// The top-level token; this is what the ledger deduplicates on.
    pub fn root(&self) -> Token {
        match self {
            Self::Component { component, .. } => *component,
            Self::Application { application, .. } => *application,
            Self::WebApplication {
                web_application, ..
            } => *web_application,
        }
    }

    /// Level of [`EntryTokens::root`].
    pub fn root_level(&self) -> TokenLevel {
        self.kind().root_level()
    }
}
