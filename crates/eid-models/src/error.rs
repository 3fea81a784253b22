//! Error types for the `eid-models` crate.
//!
//! All fallible constructors and `FromStr` implementations in this crate
//! return variants of [`ModelError`].

/// Errors produced when constructing or validating model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A chain identifier was not of the form `namespace:network`.
    #[error("invalid chain identifier \"{value}\": {reason}")]
    InvalidChainId {
        /// The value that failed validation.
        value: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// A tribe name was empty or only whitespace.
    #[error("invalid tribe name \"{value}\": {reason}")]
    InvalidTribeName {
        /// The value that failed validation.
        value: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// A roster sort or order keyword was not recognised.
    #[error("unknown roster {field} \"{value}\"")]
    UnknownRosterKeyword {
        /// Which query field was being parsed (`sort` or `order`).
        field: String,
        /// The value that failed to parse.
        value: String,
    },
}
