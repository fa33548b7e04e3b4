//! Single-side relation writes shared by every operation.
//!
//! Each helper touches exactly one record and only copies it when the write
//! actually changes something, so untouched snapshots stay shared.

use relstore_model::{Cardinality, RelValue, State};
use relstore_types::EntityId;

/// Writes `value` into `entity_type[id].field`. Returns true if the record
/// changed; false when the record is absent or already holds `value` in a
/// ONE field.
pub(crate) fn write_side(
    state: &mut State,
    entity_type: &str,
    id: &str,
    field: &str,
    cardinality: Cardinality,
    value: &EntityId,
    index: Option<usize>,
) -> bool {
    let Some(record) = state.record(entity_type, id) else {
        return false;
    };
    if cardinality == Cardinality::One
        && matches!(record.get(field), Some(RelValue::One(Some(held))) if held == value)
    {
        return false;
    }

    match state.record_mut(entity_type, id) {
        Some(record) => {
            record.field_mut(field, cardinality).link(value.clone(), index);
            true
        }
        None => false,
    }
}

/// Removes every reference to `value` from `entity_type[id].field`. Returns
/// true if the record changed.
pub(crate) fn clear_side(
    state: &mut State,
    entity_type: &str,
    id: &str,
    field: &str,
    value: &str,
) -> bool {
    let referenced = state
        .record(entity_type, id)
        .is_some_and(|record| record.references(field, value));
    if !referenced {
        return false;
    }

    state
        .record_mut(entity_type, id)
        .and_then(|record| record.existing_mut(field))
        .is_some_and(|held| held.unlink(value))
}
