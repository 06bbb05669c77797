use serde::{Deserialize, Serialize};

/// Default limit on bundle nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Assembly and unpacking behaviour.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    /// Maximum number of bundles on any root-to-leaf path, root included.
    pub max_depth: usize,
    /// Resolve sibling slots on the rayon pool.
    pub parallel: bool,
    /// Recompute tokens of every entry before reconstituting it.
    pub verify_on_fetch: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            parallel: true,
            verify_on_fetch: true,
        }
    }
}

impl AssemblerConfig {
    pub(crate) fn check_depth(&self, depth: usize) -> crate::AssemblyResult<()> {
        if depth > self.max_depth {
            return Err(crate::AssemblyError::RecursionLimitExceeded {
                depth,
                max: self.max_depth,
            });
        }
        Ok(())
    }
}
