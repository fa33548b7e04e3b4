//! The relational reducer: applies operations to a state snapshot.
//!
//! Every operation keeps both sides of a reciprocal relation in step. Missing
//! records, undeclared relations and half-attached edges never fail: they
//! degrade to a no-op or to removing whatever reference is left.

use crate::link::{clear_side, write_side};
use relstore_model::{Cardinality, ModelSchemaReader, State};
use relstore_types::{Attachable, EntityId, EntityType, Operation};
use std::sync::Arc;
use tracing::debug;

/// Pure state transition function over a validated schema.
#[derive(Debug, Clone)]
pub struct Reducer {
    reader: Arc<ModelSchemaReader>,
}

impl Reducer {
    /// Creates a reducer for the given schema.
    pub fn new(reader: Arc<ModelSchemaReader>) -> Self {
        Self { reader }
    }

    pub fn reader(&self) -> &ModelSchemaReader {
        &self.reader
    }

    /// Applies one operation and returns the next snapshot.
    ///
    /// `state` is left untouched. Branches the operation does not write are
    /// shared with the result; a no-op returns a snapshot for which
    /// [`State::ptr_eq`] holds.
    pub fn reduce(&self, state: &State, operation: &Operation) -> State {
        let mut next = state.clone();
        self.apply(&mut next, operation);
        next
    }

    /// Applies operations in order as a single transition.
    pub fn reduce_all<'a>(
        &self,
        state: &State,
        operations: impl IntoIterator<Item = &'a Operation>,
    ) -> State {
        let mut next = state.clone();
        for operation in operations {
            self.apply(&mut next, operation);
        }
        next
    }

    /// Applies an operation in place. Returns true if the state changed.
    fn apply(&self, state: &mut State, operation: &Operation) -> bool {
        match operation {
            Operation::Add {
                entity_type,
                id,
                attachables,
            } => self.apply_add(state, entity_type, id, attachables),
            Operation::Remove { entity_type, id } => self.apply_remove(state, entity_type, id),
            Operation::Attach {
                entity_type,
                id,
                rel,
                target_id,
                index,
                reciprocal_index,
            } => self.apply_attach(
                state,
                entity_type,
                id,
                rel,
                target_id,
                *index,
                *reciprocal_index,
            ),
            Operation::Detach {
                entity_type,
                id,
                rel,
                target_id,
            } => self.apply_detach(state, entity_type, id, rel, target_id),
            Operation::Batch(operations) => {
                let mut changed = false;
                for operation in operations {
                    changed |= self.apply(state, operation);
                }
                changed
            }
        }
    }

    fn apply_add(
        &self,
        state: &mut State,
        entity_type: &EntityType,
        id: &EntityId,
        attachables: &[Attachable],
    ) -> bool {
        if state.contains(entity_type.as_str(), id.as_str()) {
            debug!("Skipping add of existing {}:{}", entity_type, id);
            return false;
        }
        let Some(record) = self.reader.new_record(entity_type.as_str()) else {
            debug!("Skipping add for undeclared entity type {}", entity_type);
            return false;
        };

        state.insert_record(entity_type, id.clone(), record);
        for attachable in self.effective_attachables(state, entity_type, attachables) {
            self.apply_attach(
                state,
                entity_type,
                id,
                &attachable.rel,
                &attachable.id,
                attachable.index,
                attachable.reciprocal_index,
            );
        }

        debug!("Added {}:{}", entity_type, id);
        true
    }

    /// Attachables that will actually be written: the relation is declared,
    /// the target exists, and for ONE fields only the last such attachable
    /// is kept.
    pub fn effective_attachables<'a>(
        &self,
        state: &State,
        entity_type: &EntityType,
        attachables: &'a [Attachable],
    ) -> Vec<&'a Attachable> {
        let usable: Vec<(&'a Attachable, Cardinality)> = attachables
            .iter()
            .filter_map(|attachable| {
                let Ok(descriptor) = self.reader.describe(entity_type.as_str(), &attachable.rel)
                else {
                    debug!("Skipping attachable on unknown relation {}.{}", entity_type, attachable.rel);
                    return None;
                };
                if !state.contains(descriptor.entity.as_str(), attachable.id.as_str()) {
                    debug!("Skipping attachable to missing {}:{}", descriptor.entity, attachable.id);
                    return None;
                }
                Some((attachable, descriptor.cardinality))
            })
            .collect();

        usable
            .iter()
            .enumerate()
            .filter(|(i, (attachable, cardinality))| {
                *cardinality == Cardinality::Many
                    || !usable[i + 1..]
                        .iter()
                        .any(|(later, _)| later.rel == attachable.rel)
            })
            .map(|(_, (attachable, _))| *attachable)
            .collect()
    }

    fn apply_remove(&self, state: &mut State, entity_type: &EntityType, id: &EntityId) -> bool {
        if state.remove_record(entity_type.as_str(), id.as_str()).is_none() {
            debug!("Skipping remove of missing {}:{}", entity_type, id);
            return false;
        }

        for (source_type, field) in self.reader.inbound(entity_type.as_str()) {
            let holders: Vec<EntityId> = state
                .entity_state(source_type.as_str())
                .map(|records| {
                    records
                        .iter()
                        .filter(|(_, record)| record.references(field, id.as_str()))
                        .map(|(holder, _)| holder.clone())
                        .collect()
                })
                .unwrap_or_default();

            for holder in holders {
                clear_side(state, source_type.as_str(), holder.as_str(), field, id.as_str());
            }
        }

        debug!("Removed {}:{}", entity_type, id);
        true
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_attach(
        &self,
        state: &mut State,
        entity_type: &EntityType,
        id: &EntityId,
        rel: &str,
        target_id: &EntityId,
        index: Option<usize>,
        reciprocal_index: Option<usize>,
    ) -> bool {
        let Ok(descriptor) = self.reader.describe(entity_type.as_str(), rel) else {
            debug!("Skipping attach on unknown relation {}.{}", entity_type, rel);
            return false;
        };
        if !state.contains(entity_type.as_str(), id.as_str()) {
            debug!("Skipping attach from missing {}:{}", entity_type, id);
            return false;
        }
        if !state.contains(descriptor.entity.as_str(), target_id.as_str()) {
            debug!("Skipping attach to missing {}:{}", descriptor.entity, target_id);
            return false;
        }

        let held = descriptor.cardinality == Cardinality::One
            && state
                .record(entity_type.as_str(), id.as_str())
                .and_then(|record| record.one(rel))
                == Some(target_id);
        let mut changed = write_side(
            state,
            entity_type.as_str(),
            id.as_str(),
            rel,
            descriptor.cardinality,
            target_id,
            index,
        );
        if let Some(reciprocal) = self.reader.reciprocal_of(entity_type.as_str(), rel) {
            // An edge whose ONE side already holds the target is not written again.
            let mirrored = held
                && state
                    .record(reciprocal.entity.as_str(), target_id.as_str())
                    .is_some_and(|record| record.references(&reciprocal.field, id.as_str()));
            if mirrored {
                debug!("{}:{}.{} already holds {}", entity_type, id, rel, target_id);
                return changed;
            }
            changed |= write_side(
                state,
                reciprocal.entity.as_str(),
                target_id.as_str(),
                &reciprocal.field,
                reciprocal.cardinality,
                id,
                reciprocal_index,
            );
        }
        changed
    }

    fn apply_detach(
        &self,
        state: &mut State,
        entity_type: &EntityType,
        id: &EntityId,
        rel: &str,
        target_id: &EntityId,
    ) -> bool {
        if self.reader.describe(entity_type.as_str(), rel).is_err() {
            debug!("Skipping detach on unknown relation {}.{}", entity_type, rel);
            return false;
        }
        if !state.contains(entity_type.as_str(), id.as_str()) {
            debug!("Skipping detach from missing {}:{}", entity_type, id);
            return false;
        }

        // The target may already be gone; clear whatever reference is left.
        let mut changed = clear_side(
            state,
            entity_type.as_str(),
            id.as_str(),
            rel,
            target_id.as_str(),
        );
        if let Some(reciprocal) = self.reader.reciprocal_of(entity_type.as_str(), rel) {
            changed |= clear_side(
                state,
                reciprocal.entity.as_str(),
                target_id.as_str(),
                &reciprocal.field,
                id.as_str(),
            );
        }

        if !changed {
            debug!("Nothing to detach between {}:{} and {}", entity_type, id, target_id);
        }
        changed
    }
}
