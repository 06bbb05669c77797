//! Hierarchical integrity tokens.
//!
//! Every resolved manifest node gets a token. Leaves (modules, UI assets)
//! use their content address; composites hash their declared identity
//! fields followed by their children's tokens in slot order, in a hash
//! domain private to their level:
//!
//! | Entry kind | Tokens |
//! |------------|--------|
//! | component | `module_set`, `component` |
//! | application | `components[..]`, `application` |
//! | web-application | `application`, `ui`, `web_application` |
//!
//! Changing any byte of any leaf, reordering siblings, or editing an
//! identity field changes every token from that point to the root.

pub mod deriver;
pub mod error;
pub mod tokens;
pub mod verify;

pub use deriver::{composite_token, derive, leaf_token};
pub use error::{TokenError, TokenResult};
pub use tokens::EntryTokens;
pub use verify::verify;
