//! Error types for skeleton construction, queries and mutations.
//!
//! This module provides [SkeletonError], whose variants mirror the failure
//! classes of the engine, and [ConfigError] for configuration loading.

use crate::model::node::NodeId;

/// Result type for skeleton operations.
pub type Result<T> = std::result::Result<T, SkeletonError>;

// =#========================================================================#=
// SKELETON ERROR
// =#========================================================================#=
/// Errors raised by skeleton operations.
///
/// Validation happens at the boundary of each operation; a mutating
/// operation returning an error leaves the skeleton as it was.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkeletonError {
    /// Required columns or fields are missing or malformed.
    #[error("Schema error - {0}")]
    Schema(String),

    /// A referenced node, tag or connector does not exist.
    #[error("Not found - {0}")]
    NotFound(String),

    /// The operation would violate a tree invariant
    /// (cycle, cut at root, multiple parents, ...).
    #[error("Structural error - {0}")]
    Structural(String),

    /// The operation requires a single tree but several roots are present.
    #[error("Skeleton has {num_roots} roots - heal it first (e.g. `heal`) to obtain a single tree")]
    MultipleRoots {
        /// Number of roots found
        num_roots: usize,
    },

    /// Data required by the operation is not present (e.g. connectors).
    #[error("Missing data - {0}")]
    MissingData(String),

    /// Fragments could not all be reconnected.
    #[error("Result still consists of {num_fragments} disconnected fragments")]
    DisconnectedResult {
        /// Number of fragments remaining
        num_fragments: usize,
    },
}

impl SkeletonError {
    /// Convenience constructor for a missing node.
    pub fn node_not_found(id: NodeId) -> Self {
        Self::NotFound(format!("node {id} does not exist"))
    }

    /// Convenience constructor for a missing tag.
    pub fn tag_not_found(tag: &str) -> Self {
        Self::NotFound(format!("tag \"{tag}\" does not exist"))
    }

    /// Convenience constructor for a detected cycle.
    pub fn cycle(id: NodeId) -> Self {
        Self::Structural(format!("cycle detected involving node {id}"))
    }

    /// Convenience constructor for a missing column.
    pub fn missing_column(name: &str) -> Self {
        Self::Schema(format!("required column \"{name}\" is missing"))
    }

    /// Returns `true` if this is a [SkeletonError::NotFound].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `true` if this is a [SkeletonError::Structural].
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }
}

// =#========================================================================#=
// CONFIG ERROR
// =#========================================================================#=
/// Errors raised while loading a [Config](crate::config::Config).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("IO error - {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is not valid TOML or does not match the schema.
    #[error("Parse error - {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration parsed but holds an invalid value.
    #[error("Invalid configuration - {0}")]
    Invalid(String),
}
