//! Error types for umbra.

use thiserror::Error;

use crate::ids::{NodeId, SceneId};

/// The main error type for umbra operations.
///
/// None of these are fatal: a failing operation degrades one frame's output
/// or one pick query, and callers are expected to carry on.
#[derive(Error, Debug)]
pub enum UmbraError {
    /// A texture or pipeline state could not be created.
    #[error("resource allocation failed: {0}")]
    ResourceAllocationFailure(String),

    /// A collaborator required by the operation is absent (camera, model, spatial index...).
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    /// A viewport and a node that were expected to share a scene do not.
    #[error("viewport renders {viewport_scene:?} but node belongs to {node_scene}")]
    CrossSceneMismatch {
        node_scene: SceneId,
        viewport_scene: Option<SceneId>,
    },

    /// A type tag was registered twice.
    #[error("type '{0}' is already registered")]
    TypeExists(String),

    /// A type tag has no registered constructor.
    #[error("type '{0}' is not registered")]
    TypeNotFound(String),

    /// The node does not exist (never created or already removed).
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The scene does not exist.
    #[error("scene {0} not found")]
    SceneNotFound(SceneId),

    /// A settings record failed validation.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for umbra operations.
pub type Result<T> = std::result::Result<T, UmbraError>;
