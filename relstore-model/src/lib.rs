//! Schema and state model for relstore.
//!
//! Defines the types every other relstore crate depends on:
//! - [`ModelSchema`] / [`EntitySchema`] / [`RelationDescriptor`] — which entity
//!   types exist and how their relation fields point at each other
//! - [`ModelSchemaReader`] — validates a schema once and serves relation and
//!   reciprocal lookups
//! - [`ValidationHandler`] — caller-chosen policy for schema inconsistencies
//! - [`State`] / [`EntityState`] / [`Record`] / [`RelValue`] — the normalized,
//!   copy-on-write store the reducer transforms

mod error;
mod handler;
mod reader;
mod schema;
mod state;

pub use error::{SchemaError, SchemaResult};
pub use handler::{LogValidation, StrictValidation, ValidationHandler};
pub use reader::{ModelSchemaReader, Reciprocal};
pub use schema::{Cardinality, EntitySchema, ModelSchema, RelationDescriptor};
pub use state::{EntityState, Record, RelValue, State};
