//! Operations consumed by the reducer.
//!
//! An operation is a fully-resolved request to change relational state:
//! create a record (optionally linked to existing ones), remove a record,
//! or attach/detach a single relation edge. Batches group operations into
//! one state transition.

use crate::{EntityId, EntityType, Result};
use serde::{Deserialize, Serialize};

/// A request, bundled with an `Add`, to link the new record to an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachable {
    /// Relation field on the new record.
    pub rel: String,
    /// Id of the existing record to link to.
    pub id: EntityId,
    /// Position inside the new record's MANY list. Ignored for ONE fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Position of the new id inside the target's reciprocal MANY list.
    /// Ignored when the reciprocal is ONE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reciprocal_index: Option<usize>,
}

impl Attachable {
    /// Links through `rel` to `id`, appending on MANY sides.
    #[must_use]
    pub fn new(rel: impl Into<String>, id: impl Into<EntityId>) -> Self {
        Self {
            rel: rel.into(),
            id: id.into(),
            index: None,
            reciprocal_index: None,
        }
    }

    /// Places the target at `index` in the new record's list.
    #[must_use]
    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Places the new record at `index` in the target's reciprocal list.
    #[must_use]
    pub fn reciprocal_at(mut self, index: usize) -> Self {
        self.reciprocal_index = Some(index);
        self
    }
}

/// A state transition understood by the reducer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data")]
pub enum Operation {
    /// Creates a record and links it to existing records.
    Add {
        entity_type: EntityType,
        id: EntityId,
        #[serde(default)]
        attachables: Vec<Attachable>,
    },

    /// Deletes a record and every reference to it.
    Remove {
        entity_type: EntityType,
        id: EntityId,
    },

    /// Links `id` to `target_id` through `rel` (and its reciprocal).
    Attach {
        entity_type: EntityType,
        id: EntityId,
        rel: String,
        target_id: EntityId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reciprocal_index: Option<usize>,
    },

    /// Unlinks `id` from `target_id` through `rel` (and its reciprocal).
    Detach {
        entity_type: EntityType,
        id: EntityId,
        rel: String,
        target_id: EntityId,
    },

    /// Applies each operation in order as a single transition.
    Batch(Vec<Operation>),
}

impl Operation {
    /// Creates a bare `Add` with no attachables.
    #[must_use]
    pub fn add(entity_type: impl Into<EntityType>, id: impl Into<EntityId>) -> Self {
        Self::add_with(entity_type, id, Vec::new())
    }

    /// Creates an `Add` that links the new record as it is created.
    #[must_use]
    pub fn add_with(
        entity_type: impl Into<EntityType>,
        id: impl Into<EntityId>,
        attachables: Vec<Attachable>,
    ) -> Self {
        Self::Add {
            entity_type: entity_type.into(),
            id: id.into(),
            attachables,
        }
    }

    /// Creates a `Remove`.
    #[must_use]
    pub fn remove(entity_type: impl Into<EntityType>, id: impl Into<EntityId>) -> Self {
        Self::Remove {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Creates an `Attach` that appends on MANY sides.
    #[must_use]
    pub fn attach(
        entity_type: impl Into<EntityType>,
        id: impl Into<EntityId>,
        rel: impl Into<String>,
        target_id: impl Into<EntityId>,
    ) -> Self {
        Self::attach_at(entity_type, id, rel, target_id, None, None)
    }

    /// Creates an `Attach` with explicit list positions.
    #[must_use]
    pub fn attach_at(
        entity_type: impl Into<EntityType>,
        id: impl Into<EntityId>,
        rel: impl Into<String>,
        target_id: impl Into<EntityId>,
        index: Option<usize>,
        reciprocal_index: Option<usize>,
    ) -> Self {
        Self::Attach {
            entity_type: entity_type.into(),
            id: id.into(),
            rel: rel.into(),
            target_id: target_id.into(),
            index,
            reciprocal_index,
        }
    }

    /// Creates a `Detach`.
    #[must_use]
    pub fn detach(
        entity_type: impl Into<EntityType>,
        id: impl Into<EntityId>,
        rel: impl Into<String>,
        target_id: impl Into<EntityId>,
    ) -> Self {
        Self::Detach {
            entity_type: entity_type.into(),
            id: id.into(),
            rel: rel.into(),
            target_id: target_id.into(),
        }
    }

    /// Groups operations into one transition.
    #[must_use]
    pub fn batch(ops: impl IntoIterator<Item = Operation>) -> Self {
        Self::Batch(ops.into_iter().collect())
    }

    /// The entity type this operation is addressed to. `None` for batches.
    #[must_use]
    pub fn entity_type(&self) -> Option<&EntityType> {
        match self {
            Self::Add { entity_type, .. }
            | Self::Remove { entity_type, .. }
            | Self::Attach { entity_type, .. }
            | Self::Detach { entity_type, .. } => Some(entity_type),
            Self::Batch(_) => None,
        }
    }

    /// Serializes the operation to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserializes an operation from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
