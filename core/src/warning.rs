//! Non-fatal conditions recorded during generation.

use derive_more::Display;

/// A condition that was logged and skipped; generation continued.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum GenerationWarning {
    /// A later route claimed a path + method that was already generated.
    #[display("{method} {path} is already claimed by '{claimed_by}', later route dropped")]
    DuplicateOperation {
        /// Normalised path.
        path: String,
        /// Upper-case HTTP method.
        method: String,
        /// Action (or path, for joker routes) of the first claim.
        claimed_by: String,
    },

    /// A component name was registered twice; the later schema replaced it.
    #[display("Component '{name}' registered twice, previous schema overwritten")]
    ComponentCollision {
        /// Component name.
        name: String,
    },

    /// The base document carried its own `openapi` field.
    #[display("Base document version '{version}' discarded")]
    DiscardedBaseVersion {
        /// The discarded value.
        version: String,
    },
}
