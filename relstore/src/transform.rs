//! Operation rewriting ahead of the reducer.
//!
//! The reducer overwrites ONE fields in place, which can leave the previous
//! counterpart pointing at a record that no longer points back.
//! [`ActionTransformer::expand`] prepends the detaches that prevent this, so
//! expanded operations keep every reciprocal pair symmetric.
//! [`ActionTransformer::inverse`] computes the operation that undoes another.

use relstore_model::{Cardinality, Record, RelValue, State};
use relstore_reducer::Reducer;
use relstore_types::{Attachable, EntityId, EntityType, Operation};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ActionTransformer {
    reducer: Reducer,
}

impl ActionTransformer {
    pub fn new(reducer: Reducer) -> Self {
        Self { reducer }
    }

    /// Rewrites `operation` so that applying it leaves no one-sided edge.
    ///
    /// Attach and Add are prefixed with Detach operations for the links
    /// their ONE writes would displace. Batches are expanded member by
    /// member against the state each member will actually see.
    pub fn expand(&self, state: &State, operation: Operation) -> Operation {
        match operation {
            Operation::Batch(operations) => {
                let mut current = state.clone();
                let mut expanded = Vec::with_capacity(operations.len());
                for operation in operations {
                    let operation = self.expand(&current, operation);
                    current = self.reducer.reduce(&current, &operation);
                    expanded.push(operation);
                }
                Operation::Batch(expanded)
            }
            operation => {
                let mut operations = self.displaced(state, &operation);
                if operations.is_empty() {
                    return operation;
                }
                operations.push(operation);
                Operation::Batch(operations)
            }
        }
    }

    fn displaced(&self, state: &State, operation: &Operation) -> Vec<Operation> {
        let reader = self.reducer.reader();
        let mut detaches = Vec::new();

        match operation {
            Operation::Attach {
                entity_type,
                id,
                rel,
                target_id,
                ..
            } => {
                let Ok(descriptor) = reader.describe(entity_type.as_str(), rel) else {
                    return detaches;
                };
                let Some(source) = state.record(entity_type.as_str(), id.as_str()) else {
                    return detaches;
                };
                if !state.contains(descriptor.entity.as_str(), target_id.as_str()) {
                    return detaches;
                }

                if descriptor.cardinality == Cardinality::One {
                    if let Some(held) = source.one(rel).filter(|held| *held != target_id) {
                        debug!("Attach displaces {}:{}.{} -> {}", entity_type, id, rel, held);
                        detaches.push(Operation::detach(
                            entity_type.clone(),
                            id.clone(),
                            rel.clone(),
                            held.clone(),
                        ));
                    }
                }
                detaches.extend(self.displaced_holder(state, entity_type, id, rel, target_id));
            }
            Operation::Add {
                entity_type,
                id,
                attachables,
            } => {
                if state.contains(entity_type.as_str(), id.as_str())
                    || !reader.has_entity(entity_type.as_str())
                {
                    return detaches;
                }
                for attachable in self
                    .reducer
                    .effective_attachables(state, entity_type, attachables)
                {
                    let Some(detach) =
                        self.displaced_holder(state, entity_type, id, &attachable.rel, &attachable.id)
                    else {
                        continue;
                    };
                    if !detaches.contains(&detach) {
                        detaches.push(detach);
                    }
                }
            }
            _ => {}
        }
        detaches
    }

    /// Detach for the record currently holding `target_id` through a ONE
    /// reciprocal, unless that record is `id` itself.
    fn displaced_holder(
        &self,
        state: &State,
        entity_type: &EntityType,
        id: &EntityId,
        rel: &str,
        target_id: &EntityId,
    ) -> Option<Operation> {
        let reciprocal = self
            .reducer
            .reader()
            .reciprocal_of(entity_type.as_str(), rel)?;
        if reciprocal.cardinality != Cardinality::One {
            return None;
        }
        let holder = state
            .record(reciprocal.entity.as_str(), target_id.as_str())?
            .one(&reciprocal.field)?;
        if holder == id {
            return None;
        }

        debug!(
            "Attach displaces {}:{}.{} -> {}",
            reciprocal.entity, target_id, reciprocal.field, holder
        );
        Some(Operation::detach(
            reciprocal.entity.clone(),
            target_id.clone(),
            reciprocal.field.clone(),
            holder.clone(),
        ))
    }

    /// The operation that takes the result of applying `operation` to
    /// `state` back to `state`.
    ///
    /// Returns `None` when no single operation restores `state` exactly,
    /// e.g. an Attach that overwrote a ONE field without expansion, or a
    /// Remove of a record whose links were one-sided.
    pub fn inverse(&self, state: &State, operation: &Operation) -> Option<Operation> {
        let applied = self.reducer.reduce(state, operation);
        if applied.ptr_eq(state) {
            return Some(Operation::Batch(Vec::new()));
        }
        let candidate = self.candidate_inverse(state, operation);
        if self.reducer.reduce(&applied, &candidate) == *state {
            Some(candidate)
        } else {
            debug!("No exact inverse for {:?}", operation);
            None
        }
    }

    fn candidate_inverse(&self, state: &State, operation: &Operation) -> Operation {
        match operation {
            Operation::Add {
                entity_type, id, ..
            } => {
                if state.contains(entity_type.as_str(), id.as_str())
                    || !self.reducer.reader().has_entity(entity_type.as_str())
                {
                    return Operation::Batch(Vec::new());
                }
                Operation::remove(entity_type.clone(), id.clone())
            }
            Operation::Remove { entity_type, id } => {
                match state.record(entity_type.as_str(), id.as_str()) {
                    Some(record) => self.restore(state, entity_type, id, record),
                    None => Operation::Batch(Vec::new()),
                }
            }
            Operation::Attach {
                entity_type,
                id,
                rel,
                target_id,
                ..
            } => Operation::detach(entity_type.clone(), id.clone(), rel.clone(), target_id.clone()),
            Operation::Detach {
                entity_type,
                id,
                rel,
                target_id,
            } => self.reattach(state, entity_type, id, rel, target_id),
            Operation::Batch(operations) => {
                let mut current = state.clone();
                let mut inverses = Vec::with_capacity(operations.len());
                for operation in operations {
                    inverses.push(self.candidate_inverse(&current, operation));
                    current = self.reducer.reduce(&current, operation);
                }
                inverses.reverse();
                Operation::Batch(inverses)
            }
        }
    }

    /// Attach that puts a detached edge back at the positions it had.
    fn reattach(
        &self,
        state: &State,
        entity_type: &EntityType,
        id: &EntityId,
        rel: &str,
        target_id: &EntityId,
    ) -> Operation {
        let Some(source) = state.record(entity_type.as_str(), id.as_str()) else {
            return Operation::Batch(Vec::new());
        };
        let mut linked = source.references(rel, target_id.as_str());
        let mut reciprocal_index = None;

        if let Some(reciprocal) = self
            .reducer
            .reader()
            .reciprocal_of(entity_type.as_str(), rel)
        {
            let target = state.record(reciprocal.entity.as_str(), target_id.as_str());
            linked |= target.is_some_and(|r| r.references(&reciprocal.field, id.as_str()));
            reciprocal_index = many_position(target, &reciprocal.field, id, 0);
        }

        if !linked {
            return Operation::Batch(Vec::new());
        }
        Operation::attach_at(
            entity_type.clone(),
            id.clone(),
            rel,
            target_id.clone(),
            many_position(Some(source), rel, target_id, 0),
            reciprocal_index,
        )
    }

    /// Operations recreating a removed record together with every link to it.
    fn restore(
        &self,
        state: &State,
        entity_type: &EntityType,
        id: &EntityId,
        record: &Record,
    ) -> Operation {
        let reader = self.reducer.reader();
        let mut attachables = Vec::new();
        // (field, target) → occurrences seen so far, for repeated MANY links
        let mut seen: HashMap<(&str, &str), usize> = HashMap::new();

        for (field, value) in record.iter() {
            let reciprocal = reader.reciprocal_of(entity_type.as_str(), field);
            for (position, target) in value.ids().iter().enumerate() {
                let nth = seen.entry((field.as_str(), target.as_str())).or_insert(0);
                let reciprocal_index = reciprocal.and_then(|r| {
                    many_position(
                        state.record(r.entity.as_str(), target.as_str()),
                        &r.field,
                        id,
                        *nth,
                    )
                });
                *nth += 1;
                attachables.push(Attachable {
                    rel: field.clone(),
                    id: target.clone(),
                    index: (value.cardinality() == Cardinality::Many).then_some(position),
                    reciprocal_index,
                });
            }
        }

        let mut operations = vec![Operation::add_with(
            entity_type.clone(),
            id.clone(),
            attachables,
        )];

        // Relations without a reciprocal are not covered by the attachables.
        for (source_type, field) in reader.inbound(entity_type.as_str()) {
            if reader.reciprocal_of(source_type.as_str(), field).is_some() {
                continue;
            }
            let Some(records) = state.entity_state(source_type.as_str()) else {
                continue;
            };
            for (holder, held) in records.iter() {
                let Some(value) = held.get(field) else {
                    continue;
                };
                for (position, target) in value.ids().iter().enumerate() {
                    if target != id {
                        continue;
                    }
                    operations.push(Operation::attach_at(
                        source_type.clone(),
                        holder.clone(),
                        field.clone(),
                        id.clone(),
                        (value.cardinality() == Cardinality::Many).then_some(position),
                        None,
                    ));
                }
            }
        }

        Operation::Batch(operations)
    }
}

/// Position of the `nth` occurrence of `id` in a MANY field.
fn many_position(record: Option<&Record>, field: &str, id: &EntityId, nth: usize) -> Option<usize> {
    match record?.get(field)? {
        RelValue::Many(ids) => ids
            .iter()
            .enumerate()
            .filter(|(_, held)| *held == id)
            .nth(nth)
            .map(|(i, _)| i),
        RelValue::One(_) => None,
    }
}
