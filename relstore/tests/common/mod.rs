//! Shared fixtures for module tests.

#![allow(dead_code)]

use relstore::{
    EntitySchema, ModelSchema, ModelSchemaReader, Module, ModuleOptions, RelationDescriptor,
    State, StrictValidation,
};

pub const ACCOUNT: &str = "account";
pub const PROFILE: &str = "profile";
pub const POST: &str = "post";
pub const CATEGORY: &str = "category";

pub const AUTHOR: &str = "author";
pub const ARTICLE: &str = "article";

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

/// author 1–n article.
pub fn blog_schema() -> ModelSchema {
    ModelSchema::new()
        .entity(
            AUTHOR,
            EntitySchema::new().relation(
                "articleIds",
                RelationDescriptor::many(ARTICLE).with_reciprocal("authorId"),
            ),
        )
        .entity(
            ARTICLE,
            EntitySchema::new().relation(
                "authorId",
                RelationDescriptor::one(AUTHOR).with_reciprocal("articleIds"),
            ),
        )
}

pub fn forum_module() -> Module {
    init_tracing();
    Module::new(forum_schema(), ModuleOptions::new(StrictValidation)).expect("forum schema is valid")
}

pub fn blog_module() -> Module {
    init_tracing();
    Module::new(blog_schema(), ModuleOptions::new(StrictValidation)).expect("blog schema is valid")
}

/// The empty state overlaid with the entity maps given as JSON.
pub fn state(module: &Module, json: serde_json::Value) -> State {
    let given: State = serde_json::from_value(json).expect("state fixture is valid JSON");
    let mut state = module.empty_state();
    for (entity_type, records) in given.iter() {
        for (id, record) in records.iter() {
            state.insert_record(entity_type, id.clone(), record.clone());
        }
    }
    state
}

/// a1 wrote r1 and r2.
pub fn blog_state(module: &Module) -> State {
    state(
        module,
        serde_json::json!({
            "author": { "a1": { "articleIds": ["r1", "r2"] } },
            "article": {
                "r1": { "authorId": "a1" },
                "r2": { "authorId": "a1" }
            }
        }),
    )
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Every edge whose reciprocal side does not point back.
pub fn asymmetric_edges(reader: &ModelSchemaReader, state: &State) -> Vec<String> {
    let mut found = Vec::new();
    for (entity_type, records) in state.iter() {
        for (id, record) in records.iter() {
            for (field, value) in record.iter() {
                let Some(reciprocal) = reader.reciprocal_of(entity_type.as_str(), field) else {
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
