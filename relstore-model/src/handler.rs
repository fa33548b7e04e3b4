use crate::{SchemaError, SchemaResult};
use tracing::warn;

/// Decides what happens when [`ModelSchemaReader`](crate::ModelSchemaReader)
/// finds an inconsistency while reading a schema.
///
/// Returning `Err` aborts construction. Returning `Ok(())` lets the reader
/// continue in degraded mode: the offending reciprocal is not resolved, so
/// the relation behaves as one-directional.
///
/// There is no implicit default. Callers pass [`StrictValidation`],
/// [`LogValidation`], or their own handler.
pub trait ValidationHandler: Send + Sync {
    /// A relation targets an entity type the schema does not declare.
    fn on_invalid_entity(&self, error: SchemaError) -> SchemaResult<()>;

    /// A relation's reciprocal is missing or does not mirror it.
    fn on_invalid_rel(&self, error: SchemaError) -> SchemaResult<()>;
}

/// Rejects any inconsistency.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictValidation;

impl ValidationHandler for StrictValidation {
    fn on_invalid_entity(&self, error: SchemaError) -> SchemaResult<()> {
        Err(error)
    }

    fn on_invalid_rel(&self, error: SchemaError) -> SchemaResult<()> {
        Err(error)
    }
}

/// Logs inconsistencies and keeps going.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogValidation;

impl ValidationHandler for LogValidation {
    fn on_invalid_entity(&self, error: SchemaError) -> SchemaResult<()> {
        warn!("Invalid entity in schema: {}", error);
        Ok(())
    }

    fn on_invalid_rel(&self, error: SchemaError) -> SchemaResult<()> {
        warn!("Invalid relation in schema: {}", error);
        Ok(())
    }
}
