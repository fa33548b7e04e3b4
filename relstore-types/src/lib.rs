//! Core type definitions for relstore.
//!
//! This crate defines the small vocabulary shared by every other crate:
//! - Entity type tags and record ids
//! - Attachables and the operations the reducer consumes
//!
//! Schema and state shapes live in `relstore-model`.

mod ids;
mod operation;

pub use ids::{EntityId, EntityType};
pub use operation::{Attachable, Operation};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("entity id must not be empty")]
    EmptyId,
}
