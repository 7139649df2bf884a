//! Error types for the seams of the editor.
//!
//! The editing path itself never fails: guards degrade to no-ops. These types
//! only cover the host bridge, configuration loading and the external polish
//! collaborator.

use thiserror::Error;

/// Errors reported by a [`SelectionBridge`](crate::platform::SelectionBridge) implementation.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum BridgeError {
    /// The node is not (or no longer) part of the rendered document.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No editable region is mounted under this handle.
    #[error("region not mounted: {0}")]
    RegionNotMounted(String),

    /// A range or offset does not fit inside its node.
    #[error("offset {offset} out of bounds for node {node} (len {len})")]
    OutOfBounds {
        node: String,
        offset: usize,
        len: usize,
    },

    /// There is no active selection to act on.
    #[error("no active selection")]
    NoSelection,

    /// The platform cannot perform this operation on the given selection.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Errors while loading an [`EditorConfig`](crate::config::EditorConfig).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// The TOML source could not be parsed into the config schema.
    #[error("invalid editor config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be rendered back to TOML.
    #[error("failed to serialize editor config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Failure reported by an external text-polishing service.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PolishError {
    /// The service could not be reached or refused the request.
    #[error("polish service unavailable: {0}")]
    Unavailable(String),

    /// The service answered with something unusable.
    #[error("polish service returned an invalid response: {0}")]
    InvalidResponse(String),

    /// The target block does not exist in the current document.
    #[error("block not found: {0}")]
    BlockNotFound(String),

    /// The editor is read-only.
    #[error("editor is read-only")]
    ReadOnly,
}
