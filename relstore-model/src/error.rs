//! Error types for schema construction and lookup.

use relstore_types::EntityType;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Inconsistencies found in a model schema, or failed lookups against it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Lookup of an entity type the schema does not declare.
    #[error("unknown entity type: {0}")]
    UnknownEntity(EntityType),

    /// Lookup of a relation field the entity type does not declare.
    #[error("unknown relation {entity}.{field}")]
    UnknownRelation { entity: EntityType, field: String },

    /// A relation points at an entity type the schema does not declare.
    #[error("relation {entity}.{field} targets undeclared entity type {target}")]
    UndeclaredTarget {
        entity: EntityType,
        field: String,
        target: EntityType,
    },

    /// A relation names a reciprocal field the target does not declare.
    #[error("relation {entity}.{field} names missing reciprocal {target}.{reciprocal}")]
    MissingReciprocal {
        entity: EntityType,
        field: String,
        target: EntityType,
        reciprocal: String,
    },

    /// The reciprocal field exists but does not point back at this relation.
    #[error("reciprocal {target}.{reciprocal} does not mirror {entity}.{field}")]
    ReciprocalMismatch {
        entity: EntityType,
        field: String,
        target: EntityType,
        reciprocal: String,
    },
}
