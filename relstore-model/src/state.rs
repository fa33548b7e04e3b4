//! Normalized relational state.
//!
//! State is a two-level arena: entity type → record id → record. Records only
//! hold relation fields, each a closed [`RelValue`]. Branches sit behind `Arc`
//! so a transition can copy-on-write the records it touches and share every
//! other branch with the previous snapshot.

use crate::Cardinality;
use relstore_types::{EntityId, EntityType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The value stored in one relation field.
///
/// Serialized untagged: `null` or `"id"` for ONE, `["id", ...]` for MANY.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelValue {
    Many(Vec<EntityId>),
    One(Option<EntityId>),
}

impl RelValue {
    /// The initial value for a freshly declared field.
    #[must_use]
    pub fn empty(cardinality: Cardinality) -> Self {
        match cardinality {
            Cardinality::One => Self::One(None),
            Cardinality::Many => Self::Many(Vec::new()),
        }
    }

    #[must_use]
    pub fn cardinality(&self) -> Cardinality {
        match self {
            Self::One(_) => Cardinality::One,
            Self::Many(_) => Cardinality::Many,
        }
    }

    /// All referenced ids, in order.
    #[must_use]
    pub fn ids(&self) -> &[EntityId] {
        match self {
            Self::One(id) => id.as_slice(),
            Self::Many(ids) => ids,
        }
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids().iter().any(|held| held.as_str() == id)
    }

    /// Position of the first occurrence of `id`.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids().iter().position(|held| held.as_str() == id)
    }

    /// Writes `id` into the field.
    ///
    /// ONE overwrites and ignores `index`. MANY inserts at `index`, clamped to
    /// the list length, or appends when no index is given.
    pub fn link(&mut self, id: EntityId, index: Option<usize>) {
        match self {
            Self::One(held) => *held = Some(id),
            Self::Many(ids) => match index {
                Some(i) => ids.insert(i.min(ids.len()), id),
                None => ids.push(id),
            },
        }
    }

    /// Removes every reference to `id`. Returns true if anything was removed.
    pub fn unlink(&mut self, id: &str) -> bool {
        match self {
            Self::One(held) => {
                if held.as_ref().is_some_and(|h| h.as_str() == id) {
                    *held = None;
                    true
                } else {
                    false
                }
            }
            Self::Many(ids) => {
                let before = ids.len();
                ids.retain(|held| held.as_str() != id);
                ids.len() != before
            }
        }
    }
}

/// A single record: relation field name → value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, RelValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, value: RelValue) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&RelValue> {
        self.fields.get(field)
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// The id held by a ONE field, if set.
    pub fn one(&self, field: &str) -> Option<&EntityId> {
        match self.fields.get(field) {
            Some(RelValue::One(id)) => id.as_ref(),
            _ => None,
        }
    }

    /// The ids held by a MANY field; empty when absent.
    pub fn many(&self, field: &str) -> &[EntityId] {
        match self.fields.get(field) {
            Some(RelValue::Many(ids)) => ids,
            _ => &[],
        }
    }

    /// True if `field` currently references `id`.
    pub fn references(&self, field: &str, id: &str) -> bool {
        self.fields.get(field).is_some_and(|v| v.contains(id))
    }

    /// Mutable access to `field`, initializing it as `cardinality` when it is
    /// absent or holds the other shape.
    pub fn field_mut(&mut self, field: &str, cardinality: Cardinality) -> &mut RelValue {
        let value = self
            .fields
            .entry(field.to_owned())
            .or_insert_with(|| RelValue::empty(cardinality));
        if value.cardinality() != cardinality {
            *value = RelValue::empty(cardinality);
        }
        value
    }

    /// Mutable access to an existing field.
    pub fn existing_mut(&mut self, field: &str) -> Option<&mut RelValue> {
        self.fields.get_mut(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RelValue)> {
        self.fields.iter()
    }
}

/// All records of one entity type, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityState {
    records: BTreeMap<EntityId, Arc<Record>>,
}

impl EntityState {
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id).map(Arc::as_ref)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.records.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Record)> {
        self.records.iter().map(|(id, record)| (id, record.as_ref()))
    }
}

/// The whole store: entity type → records.
///
/// A `State` is an immutable snapshot from the reducer's point of view.
/// The `&mut` methods below copy-on-write and are meant for building the
/// next snapshot from a clone of the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State {
    entities: BTreeMap<EntityType, Arc<EntityState>>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_state(&self, entity_type: &str) -> Option<&EntityState> {
        self.entities.get(entity_type).map(Arc::as_ref)
    }

    pub fn record(&self, entity_type: &str, id: &str) -> Option<&Record> {
        self.entity_state(entity_type).and_then(|records| records.get(id))
    }

    pub fn contains(&self, entity_type: &str, id: &str) -> bool {
        self.record(entity_type, id).is_some()
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.entities.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityType, &EntityState)> {
        self.entities.iter().map(|(t, records)| (t, records.as_ref()))
    }

    /// True when every branch of `self` is the very same allocation as in
    /// `other`, i.e. no transition happened between the two snapshots.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.entities.len() == other.entities.len()
            && self
                .entities
                .iter()
                .zip(other.entities.iter())
                .all(|((ta, a), (tb, b))| ta == tb && Arc::ptr_eq(a, b))
    }

    /// True when both snapshots share the record map of `entity_type`.
    pub fn shares_entity_state(&self, other: &Self, entity_type: &str) -> bool {
        match (self.entities.get(entity_type), other.entities.get(entity_type)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// True when both snapshots share the allocation of one record.
    pub fn shares_record(&self, other: &Self, entity_type: &str, id: &str) -> bool {
        let lookup = |s: &Self| {
            s.entities
                .get(entity_type)
                .and_then(|records| records.records.get(id))
                .cloned()
        };
        match (lookup(self), lookup(other)) {
            (Some(a), Some(b)) => Arc::ptr_eq(&a, &b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Ensures an (empty) record map exists for `entity_type`.
    pub fn insert_entity_type(&mut self, entity_type: EntityType) {
        self.entities.entry(entity_type).or_default();
    }

    /// Inserts or replaces a record.
    pub fn insert_record(&mut self, entity_type: &EntityType, id: EntityId, record: Record) {
        let records = self.entities.entry(entity_type.clone()).or_default();
        Arc::make_mut(records).records.insert(id, Arc::new(record));
    }

    /// Removes a record, returning it if it existed.
    pub fn remove_record(&mut self, entity_type: &str, id: &str) -> Option<Arc<Record>> {
        if !self.contains(entity_type, id) {
            return None;
        }
        let records = self.entities.get_mut(entity_type)?;
        Arc::make_mut(records).records.remove(id)
    }

    /// Copy-on-write access to one record. Only call when about to write:
    /// the record and its entity map stop being shared with older snapshots.
    pub fn record_mut(&mut self, entity_type: &str, id: &str) -> Option<&mut Record> {
        if !self.contains(entity_type, id) {
            return None;
        }
        let records = Arc::make_mut(self.entities.get_mut(entity_type)?);
        records.records.get_mut(id).map(Arc::make_mut)
    }
}
