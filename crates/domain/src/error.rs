//! Error types for the domain layer
//!
//! Two families live here:
//! - [`DomainError`] for document-level failures (parsing an adventure, bad lookups)
//! - [`EngineError`] for graph errors surfaced to the end user by the player
//!   decision engine. These are returned as values and never thrown.

use serde::Serialize;
use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Parse error (adventure documents, property values)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a parse error for document-to-type conversion failures.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// A user-facing graph error produced by the decision engine.
///
/// Callers show `title`/`description` inline and halt navigation; they are
/// not expected to retry automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[error("{title}")]
pub struct EngineError {
    pub title: String,
    pub description: Option<String>,
}

impl EngineError {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: Some(description.into()),
        }
    }

    pub fn missing_node() -> Self {
        Self::new("Missing node", "The requested node does not exist.")
    }

    pub fn random_node_without_targets() -> Self {
        Self::new(
            "Random node error",
            "No valid outgoing targets from this random node.",
        )
    }

    pub fn missing_link() -> Self {
        Self::new("Broken link", "This choice is missing.")
    }

    pub fn link_without_destination() -> Self {
        Self::new("Broken link", "This choice has no destination.")
    }

    pub fn missing_target_node() -> Self {
        Self::new("Broken link", "The target node is missing.")
    }

    /// Description or an empty string, for single-line rendering.
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}
