//! Normalized relational store.
//!
//! A [`Module`] is built from a [`ModelSchema`] and bundles:
//! - the [`Reducer`] that applies operations to a [`State`]
//! - [`ActionTypes`] and [`ActionCreators`], the namespaced action vocabulary
//! - [`Selectors`] for reading records and their relations
//! - an [`ActionTransformer`] that keeps ONE relations symmetric and
//!   computes undo operations
//!
//! ```ignore
//! let module = Module::new(schema, ModuleOptions::new(StrictValidation))?;
//! let state = module.dispatch(&module.empty_state(), &module.creators().add("author", "a1"));
//! ```

mod actions;
mod module;
mod selectors;
mod transform;

pub use actions::{
    Action, ActionCreators, ActionTypes, BATCH_SCOPE, Namespacer, Verb, default_namespaced,
};
pub use module::{Module, ModuleOptions};
pub use selectors::Selectors;
pub use transform::ActionTransformer;

pub use relstore_model::{
    Cardinality, EntitySchema, EntityState, LogValidation, ModelSchema, ModelSchemaReader,
    Reciprocal, Record, RelValue, RelationDescriptor, SchemaError, SchemaResult, State,
    StrictValidation, ValidationHandler,
};
pub use relstore_reducer::Reducer;
pub use relstore_types::{Attachable, EntityId, EntityType, Operation};
