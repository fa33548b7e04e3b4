use relstore_types::EntityType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a relation field holds a single optional id or an ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// At most one related id. Writes overwrite.
    One,
    /// Ordered list of related ids. Writes insert or append.
    Many,
}

/// Declares one relation field: where it points and how it is mirrored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    /// Entity type the field's ids belong to.
    pub entity: EntityType,
    pub cardinality: Cardinality,
    /// Field on the target entity type that mirrors this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reciprocal: Option<String>,
}

impl RelationDescriptor {
    /// Shorthand for a ONE relation without a reciprocal.
    pub fn one(entity: impl Into<EntityType>) -> Self {
        Self {
            entity: entity.into(),
            cardinality: Cardinality::One,
            reciprocal: None,
        }
    }

    /// Shorthand for a MANY relation without a reciprocal.
    pub fn many(entity: impl Into<EntityType>) -> Self {
        Self {
            entity: entity.into(),
            cardinality: Cardinality::Many,
            reciprocal: None,
        }
    }

    /// Names the mirroring field on the target entity type.
    #[must_use]
    pub fn with_reciprocal(mut self, field: impl Into<String>) -> Self {
        self.reciprocal = Some(field.into());
        self
    }
}

/// Relation fields declared by one entity type, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntitySchema {
    relations: BTreeMap<String, RelationDescriptor>,
}

impl EntitySchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a relation field.
    #[must_use]
    pub fn relation(mut self, field: impl Into<String>, descriptor: RelationDescriptor) -> Self {
        self.relations.insert(field.into(), descriptor);
        self
    }

    pub fn get(&self, field: &str) -> Option<&RelationDescriptor> {
        self.relations.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RelationDescriptor)> {
        self.relations.iter()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

/// The whole model: every entity type and its relation fields.
///
/// Serializes as a plain JSON object so schemas can be authored by hand:
/// `{"account": {"profileId": {"entity": "profile", "cardinality": "one", "reciprocal": "accountId"}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelSchema {
    entities: BTreeMap<EntityType, EntitySchema>,
}

impl ModelSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an entity type.
    #[must_use]
    pub fn entity(mut self, entity_type: impl Into<EntityType>, schema: EntitySchema) -> Self {
        self.entities.insert(entity_type.into(), schema);
        self
    }

    pub fn get(&self, entity_type: &str) -> Option<&EntitySchema> {
        self.entities.get(entity_type)
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.entities.contains_key(entity_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityType, &EntitySchema)> {
        self.entities.iter()
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.entities.keys()
    }
}
