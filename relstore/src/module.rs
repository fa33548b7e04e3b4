//! One schema's reducer, action vocabulary and helpers, wired together.

use crate::actions::{Action, ActionCreators, ActionTypes, Namespacer, Verb, default_namespaced};
use crate::selectors::Selectors;
use crate::transform::ActionTransformer;
use relstore_model::{ModelSchema, ModelSchemaReader, SchemaResult, State, ValidationHandler};
use relstore_reducer::Reducer;
use relstore_types::Operation;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Options for [`Module::new`].
#[derive(Clone)]
pub struct ModuleOptions {
    pub namespaced: Namespacer,
    pub validation: Arc<dyn ValidationHandler>,
}

impl ModuleOptions {
    /// Default namespacing with the given schema validation policy.
    pub fn new(validation: impl ValidationHandler + 'static) -> Self {
        Self {
            namespaced: Arc::new(default_namespaced),
            validation: Arc::new(validation),
        }
    }

    #[must_use]
    pub fn with_namespacer(
        mut self,
        namespaced: impl Fn(&str, Verb) -> String + Send + Sync + 'static,
    ) -> Self {
        self.namespaced = Arc::new(namespaced);
        self
    }
}

impl fmt::Debug for ModuleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleOptions").finish_non_exhaustive()
    }
}

/// A relational store module for one schema.
#[derive(Debug, Clone)]
pub struct Module {
    reader: Arc<ModelSchemaReader>,
    reducer: Reducer,
    types: ActionTypes,
    creators: ActionCreators,
    selectors: Selectors,
    transformer: ActionTransformer,
}

impl Module {
    /// Reads `schema` and builds every component from it.
    ///
    /// Fails only when `options.validation` rejects a schema inconsistency.
    pub fn new(schema: ModelSchema, options: ModuleOptions) -> SchemaResult<Self> {
        let reader = Arc::new(ModelSchemaReader::new(schema, options.validation.as_ref())?);
        let reducer = Reducer::new(Arc::clone(&reader));
        let types = ActionTypes::new(&reader, &options.namespaced);

        info!(
            "Initialized module with {} entity types",
            reader.entity_types().count()
        );
        Ok(Self {
            selectors: Selectors::new(Arc::clone(&reader)),
            transformer: ActionTransformer::new(reducer.clone()),
            creators: ActionCreators::new(options.namespaced),
            types,
            reducer,
            reader,
        })
    }

    pub fn reader(&self) -> &ModelSchemaReader {
        &self.reader
    }

    pub fn reducer(&self) -> &Reducer {
        &self.reducer
    }

    pub fn types(&self) -> &ActionTypes {
        &self.types
    }

    pub fn creators(&self) -> &ActionCreators {
        &self.creators
    }

    pub fn selectors(&self) -> &Selectors {
        &self.selectors
    }

    pub fn transformer(&self) -> &ActionTransformer {
        &self.transformer
    }

    /// Every declared entity type with no records.
    pub fn empty_state(&self) -> State {
        self.reader.empty_state()
    }

    /// Applies an action's payload as-is.
    ///
    /// Actions this module does not own, or whose payload does not match
    /// their type, leave the state unchanged.
    pub fn reduce(&self, state: &State, action: &Action) -> State {
        if !self.types.accepts(action) {
            debug!("Ignoring action {}", action.action_type);
            return state.clone();
        }
        self.reducer.reduce(state, &action.payload)
    }

    /// Expands an action's payload, then applies it.
    ///
    /// Unlike [`Module::reduce`], ONE overwrites detach the displaced
    /// counterpart first, so every reciprocal pair stays symmetric.
    pub fn dispatch(&self, state: &State, action: &Action) -> State {
        if !self.types.accepts(action) {
            debug!("Ignoring action {}", action.action_type);
            return state.clone();
        }
        let expanded = self.transformer.expand(state, action.payload.clone());
        self.reducer.reduce(state, &expanded)
    }

    /// Like [`Module::dispatch`], also returning the action that undoes it
    /// when one exists. Undo actions are applied with [`Module::reduce`].
    pub fn dispatch_with_undo(&self, state: &State, action: &Action) -> (State, Option<Action>) {
        if !self.types.accepts(action) {
            debug!("Ignoring action {}", action.action_type);
            return (state.clone(), None);
        }
        let expanded = self.transformer.expand(state, action.payload.clone());
        let undo = self
            .transformer
            .inverse(state, &expanded)
            .map(|inverse| self.creators.wrap(inverse));
        (self.reducer.reduce(state, &expanded), undo)
    }

    /// The expanded payload of `action`, wrapped back into an action.
    pub fn expand(&self, state: &State, action: Action) -> Action {
        self.creators.wrap(self.transformer.expand(state, action.payload))
    }

    /// Applies raw operations in order.
    pub fn apply(&self, state: &State, operations: &[Operation]) -> State {
        self.reducer.reduce_all(state, operations)
    }
}
