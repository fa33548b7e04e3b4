//! Shared fixtures for reducer tests.

#![allow(dead_code)]

use relstore_model::{
    EntitySchema, ModelSchema, ModelSchemaReader, RelationDescriptor, State, StrictValidation,
};
use relstore_reducer::Reducer;
use std::sync::Arc;

pub const ACCOUNT: &str = "account";
pub const PROFILE: &str = "profile";
pub const POST: &str = "post";
pub const CATEGORY: &str = "category";

/// account 1–1 profile, profile 1–n post, post n–n category.
pub fn forum_schema() -> ModelSchema {
    ModelSchema::new()
        .entity(
            ACCOUNT,
            EntitySchema::new().relation(
                "profileId",
                RelationDescriptor::one(PROFILE).with_reciprocal("accountId"),
            ),
        )
        .entity(
            PROFILE,
            EntitySchema::new()
                .relation(
                    "accountId",
                    RelationDescriptor::one(ACCOUNT).with_reciprocal("profileId"),
                )
                .relation(
                    "postIds",
                    RelationDescriptor::many(POST).with_reciprocal("profileId"),
                ),
        )
        .entity(
            POST,
            EntitySchema::new()
                .relation(
                    "profileId",
                    RelationDescriptor::one(PROFILE).with_reciprocal("postIds"),
                )
                .relation(
                    "categoryIds",
                    RelationDescriptor::many(CATEGORY).with_reciprocal("postIds"),
                ),
        )
        .entity(
            CATEGORY,
            EntitySchema::new().relation(
                "postIds",
                RelationDescriptor::many(POST).with_reciprocal("categoryIds"),
            ),
        )
}

pub fn forum_reducer() -> Reducer {
    init_tracing();
    let reader = ModelSchemaReader::new(forum_schema(), &StrictValidation)
        .expect("forum schema is valid");
    Reducer::new(Arc::new(reader))
}

/// The empty state overlaid with the entity maps given as JSON.
pub fn state(reducer: &Reducer, json: serde_json::Value) -> State {
    let given: State = serde_json::from_value(json).expect("state fixture is valid JSON");
    let mut state = reducer.reader().empty_state();
    for (entity_type, records) in given.iter() {
        for (id, record) in records.iter() {
            state.insert_record(entity_type, id.clone(), record.clone());
        }
    }
    state
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Every relation value that points at a record which does not exist.
pub fn dangling_references(reducer: &Reducer, state: &State) -> Vec<String> {
    let mut found = Vec::new();
    for (entity_type, records) in state.iter() {
        for (id, record) in records.iter() {
            for (field, value) in record.iter() {
                let Ok(descriptor) = reducer.reader().describe(entity_type.as_str(), field) else {
                    continue;
                };
                for target in value.ids() {
                    if !state.contains(descriptor.entity.as_str(), target.as_str()) {
                        found.push(format!("{entity_type}:{id}.{field} -> {target}"));
                    }
                }
            }
        }
    }
    found
}

/// Every edge whose reciprocal side does not point back.
pub fn asymmetric_edges(reducer: &Reducer, state: &State) -> Vec<String> {
    let mut found = Vec::new();
    for (entity_type, records) in state.iter() {
        for (id, record) in records.iter() {
            for (field, value) in record.iter() {
                let Some(reciprocal) = reducer.reader().reciprocal_of(entity_type.as_str(), field)
                else {
                    continue;
                };
                for target in value.ids() {
                    let mirrored = state
                        .record(reciprocal.entity.as_str(), target.as_str())
                        .is_some_and(|r| r.references(&reciprocal.field, id.as_str()));
                    if !mirrored {
                        found.push(format!("{entity_type}:{id}.{field} -> {target}"));
                    }
                }
            }
        }
    }
    found
}
