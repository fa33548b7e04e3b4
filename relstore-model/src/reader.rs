//! Validated, indexed view over a [`ModelSchema`].

use crate::{
    Cardinality, ModelSchema, Record, RelValue, RelationDescriptor, SchemaError, SchemaResult,
    State, ValidationHandler,
};
use relstore_types::EntityType;
use std::collections::BTreeMap;
use tracing::debug;

/// The mirroring side of a relation, resolved at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reciprocal {
    /// Entity type that declares the mirroring field.
    pub entity: EntityType,
    pub field: String,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone)]
struct ResolvedRelation {
    descriptor: RelationDescriptor,
    reciprocal: Option<Reciprocal>,
}

/// Reads a [`ModelSchema`] once and answers relation lookups from then on.
///
/// Every declared reciprocal is checked at construction: it must exist on the
/// target entity type and point back at the declaring field. Problems go to
/// the caller's [`ValidationHandler`]; reciprocals that fail the check are
/// left unresolved when the handler lets construction continue.
#[derive(Debug, Clone)]
pub struct ModelSchemaReader {
    schema: ModelSchema,
    relations: BTreeMap<EntityType, BTreeMap<String, ResolvedRelation>>,
    /// Target entity type → every `(source type, field)` pointing at it.
    inbound: BTreeMap<EntityType, Vec<(EntityType, String)>>,
}

impl ModelSchemaReader {
    pub fn new(schema: ModelSchema, handler: &dyn ValidationHandler) -> SchemaResult<Self> {
        let mut relations = BTreeMap::new();
        let mut inbound: BTreeMap<EntityType, Vec<(EntityType, String)>> = BTreeMap::new();

        for (entity_type, entity_schema) in schema.iter() {
            let mut resolved = BTreeMap::new();
            for (field, descriptor) in entity_schema.iter() {
                let reciprocal = resolve_reciprocal(&schema, entity_type, field, descriptor, handler)?;
                if schema.contains(descriptor.entity.as_str()) {
                    inbound
                        .entry(descriptor.entity.clone())
                        .or_default()
                        .push((entity_type.clone(), field.clone()));
                }
                resolved.insert(
                    field.clone(),
                    ResolvedRelation {
                        descriptor: descriptor.clone(),
                        reciprocal,
                    },
                );
            }
            relations.insert(entity_type.clone(), resolved);
        }

        debug!("Read schema with {} entity types", relations.len());
        Ok(Self {
            schema,
            relations,
            inbound,
        })
    }

    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    pub fn has_entity(&self, entity_type: &str) -> bool {
        self.relations.contains_key(entity_type)
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.relations.keys()
    }

    /// Looks up the descriptor of `entity_type.field`.
    pub fn describe(&self, entity_type: &str, field: &str) -> SchemaResult<&RelationDescriptor> {
        let fields = self
            .relations
            .get(entity_type)
            .ok_or_else(|| SchemaError::UnknownEntity(EntityType::from(entity_type)))?;
        fields
            .get(field)
            .map(|r| &r.descriptor)
            .ok_or_else(|| SchemaError::UnknownRelation {
                entity: EntityType::from(entity_type),
                field: field.to_owned(),
            })
    }

    /// The resolved mirroring side of `entity_type.field`, if any.
    pub fn reciprocal_of(&self, entity_type: &str, field: &str) -> Option<&Reciprocal> {
        self.relations
            .get(entity_type)?
            .get(field)?
            .reciprocal
            .as_ref()
    }

    /// Declared relation fields of `entity_type`; empty when undeclared.
    pub fn relations(
        &self,
        entity_type: &str,
    ) -> impl Iterator<Item = (&String, &RelationDescriptor)> {
        self.relations
            .get(entity_type)
            .into_iter()
            .flat_map(|fields| fields.iter().map(|(f, r)| (f, &r.descriptor)))
    }

    /// Every `(source type, field)` whose descriptor targets `entity_type`.
    pub fn inbound(&self, entity_type: &str) -> &[(EntityType, String)] {
        self.inbound
            .get(entity_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// A record with every declared field initialized: ONE unset, MANY empty.
    pub fn new_record(&self, entity_type: &str) -> Option<Record> {
        let fields = self.relations.get(entity_type)?;
        Some(fields.iter().fold(Record::new(), |record, (field, r)| {
            record.with_field(field.clone(), RelValue::empty(r.descriptor.cardinality))
        }))
    }

    /// Every declared entity type mapped to an empty record map.
    pub fn empty_state(&self) -> State {
        let mut state = State::new();
        for entity_type in self.relations.keys() {
            state.insert_entity_type(entity_type.clone());
        }
        state
    }
}

fn resolve_reciprocal(
    schema: &ModelSchema,
    entity_type: &EntityType,
    field: &str,
    descriptor: &RelationDescriptor,
    handler: &dyn ValidationHandler,
) -> SchemaResult<Option<Reciprocal>> {
    let Some(target_schema) = schema.get(descriptor.entity.as_str()) else {
        handler.on_invalid_entity(SchemaError::UndeclaredTarget {
            entity: entity_type.clone(),
            field: field.to_owned(),
            target: descriptor.entity.clone(),
        })?;
        return Ok(None);
    };

    let Some(reciprocal) = &descriptor.reciprocal else {
        return Ok(None);
    };

    let Some(back) = target_schema.get(reciprocal) else {
        handler.on_invalid_rel(SchemaError::MissingReciprocal {
            entity: entity_type.clone(),
            field: field.to_owned(),
            target: descriptor.entity.clone(),
            reciprocal: reciprocal.clone(),
        })?;
        debug!("Leaving {}.{} one-directional", entity_type, field);
        return Ok(None);
    };

    if back.entity != *entity_type || back.reciprocal.as_deref() != Some(field) {
        handler.on_invalid_rel(SchemaError::ReciprocalMismatch {
            entity: entity_type.clone(),
            field: field.to_owned(),
            target: descriptor.entity.clone(),
            reciprocal: reciprocal.clone(),
        })?;
        debug!("Leaving {}.{} one-directional", entity_type, field);
        return Ok(None);
    }

    Ok(Some(Reciprocal {
        entity: descriptor.entity.clone(),
        field: reciprocal.clone(),
        cardinality: back.cardinality,
    }))
}
