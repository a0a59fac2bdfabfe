//! Error types for catalog, hierarchy and configuration loading

use thiserror::Error;

/// Load-time configuration errors
///
/// These only surface while building a [`RoleCatalog`](crate::RoleCatalog),
/// a [`RoleHierarchy`](crate::RoleHierarchy) or a
/// [`PolicyConfig`](crate::PolicyConfig). The decision path never returns one.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Catalog has no roles at all
    #[error("Role catalog is empty")]
    EmptyCatalog,

    /// Hierarchy has no ranked roles
    #[error("Role hierarchy is empty")]
    EmptyHierarchy,

    /// The same role was defined twice
    #[error("Duplicate role: {0}")]
    DuplicateRole(String),

    /// Two distinct roles share a rank
    #[error("Duplicate rank {rank} for roles '{first}' and '{second}'")]
    DuplicateRank {
        rank: u32,
        first: String,
        second: String,
    },

    /// Role identifier failed validation
    #[error("Invalid role '{role}': {reason}")]
    InvalidRole { role: String, reason: String },

    /// Permission token failed validation
    #[error("Invalid permission '{permission}': {reason}")]
    InvalidPermission { permission: String, reason: String },

    /// A role referenced by one component is missing from the catalog
    #[error("Unknown role referenced: {0}")]
    UnknownRole(String),

    /// Policy document could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O error while reading a policy document
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Result type for load-time operations
pub type Result<T> = std::result::Result<T, ConfigError>;
