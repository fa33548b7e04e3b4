//! Read helpers over a [`State`] snapshot.

use relstore_model::{Cardinality, ModelSchemaReader, Record, State};
use relstore_types::EntityId;
use std::sync::Arc;

/// Schema-aware lookups. Every selector borrows from the snapshot it is given.
#[derive(Debug, Clone)]
pub struct Selectors {
    reader: Arc<ModelSchemaReader>,
}

impl Selectors {
    pub fn new(reader: Arc<ModelSchemaReader>) -> Self {
        Self { reader }
    }

    pub fn entity<'s>(&self, state: &'s State, entity_type: &str, id: &str) -> Option<&'s Record> {
        state.record(entity_type, id)
    }

    pub fn exists(&self, state: &State, entity_type: &str, id: &str) -> bool {
        state.contains(entity_type, id)
    }

    /// Ids of every record of `entity_type`, in key order.
    pub fn ids<'s>(&self, state: &'s State, entity_type: &str) -> Vec<&'s EntityId> {
        state
            .entity_state(entity_type)
            .map(|records| records.ids().collect())
            .unwrap_or_default()
    }

    /// The id held by a declared ONE relation.
    pub fn related_one<'s>(
        &self,
        state: &'s State,
        entity_type: &str,
        id: &str,
        rel: &str,
    ) -> Option<&'s EntityId> {
        let descriptor = self.reader.describe(entity_type, rel).ok()?;
        if descriptor.cardinality != Cardinality::One {
            return None;
        }
        state.record(entity_type, id)?.one(rel)
    }

    /// The ids held by a declared MANY relation; empty otherwise.
    pub fn related_many<'s>(
        &self,
        state: &'s State,
        entity_type: &str,
        id: &str,
        rel: &str,
    ) -> &'s [EntityId] {
        match self.reader.describe(entity_type, rel) {
            Ok(descriptor) if descriptor.cardinality == Cardinality::Many => state
                .record(entity_type, id)
                .map(|record| record.many(rel))
                .unwrap_or_default(),
            _ => &[],
        }
    }

    /// The records a relation points at, in relation order. Ids without a
    /// record are skipped.
    pub fn related_records<'s>(
        &self,
        state: &'s State,
        entity_type: &str,
        id: &str,
        rel: &str,
    ) -> Vec<(&'s EntityId, &'s Record)> {
        let Ok(descriptor) = self.reader.describe(entity_type, rel) else {
            return Vec::new();
        };
        let Some(value) = state.record(entity_type, id).and_then(|r| r.get(rel)) else {
            return Vec::new();
        };
        value
            .ids()
            .iter()
            .filter_map(|target| {
                state
                    .record(descriptor.entity.as_str(), target.as_str())
                    .map(|record| (target, record))
            })
            .collect()
    }
}
