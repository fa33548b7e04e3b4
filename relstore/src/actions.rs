//! Namespaced actions wrapping reducer operations.
//!
//! Every operation travels inside an [`Action`] whose `type` string is built
//! by a [`Namespacer`]. Distinct namespacers let several modules share one
//! dispatch channel without their action types colliding.

use relstore_model::ModelSchemaReader;
use relstore_types::{Attachable, EntityId, EntityType, Operation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Scope passed to the namespacer for batch actions.
pub const BATCH_SCOPE: &str = "*";

/// The kind of operation an action carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verb {
    Add,
    Remove,
    Attach,
    Detach,
    Batch,
}

impl Verb {
    /// Verbs that exist once per entity type.
    pub const PER_ENTITY: [Verb; 4] = [Verb::Add, Verb::Remove, Verb::Attach, Verb::Detach];

    /// The verb matching an operation variant.
    #[must_use]
    pub fn of(operation: &Operation) -> Self {
        match operation {
            Operation::Add { .. } => Self::Add,
            Operation::Remove { .. } => Self::Remove,
            Operation::Attach { .. } => Self::Attach,
            Operation::Detach { .. } => Self::Detach,
            Operation::Batch(_) => Self::Batch,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "ADD",
            Self::Remove => "REMOVE",
            Self::Attach => "ATTACH",
            Self::Detach => "DETACH",
            Self::Batch => "BATCH",
        })
    }
}

/// Builds an action type string from a scope (entity type, or
/// [`BATCH_SCOPE`]) and a verb.
pub type Namespacer = Arc<dyn Fn(&str, Verb) -> String + Send + Sync>;

/// Joins scope and verb with `/`, e.g. `account/ADD` or `*/BATCH`.
pub fn default_namespaced(scope: &str, verb: Verb) -> String {
    format!("{scope}/{verb}")
}

/// An operation tagged with its namespaced type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: String,
    pub payload: Operation,
}

/// Every action type a module understands, in both directions.
#[derive(Debug, Clone)]
pub struct ActionTypes {
    names: BTreeMap<EntityType, BTreeMap<Verb, String>>,
    batch: String,
    resolved: HashMap<String, (Option<EntityType>, Verb)>,
}

impl ActionTypes {
    pub fn new(reader: &ModelSchemaReader, namespaced: &Namespacer) -> Self {
        let mut names = BTreeMap::new();
        let mut resolved = HashMap::new();

        for entity_type in reader.entity_types() {
            let mut verbs = BTreeMap::new();
            for verb in Verb::PER_ENTITY {
                let name = namespaced(entity_type.as_str(), verb);
                if resolved
                    .insert(name.clone(), (Some(entity_type.clone()), verb))
                    .is_some()
                {
                    warn!("Action type {} is produced more than once", name);
                }
                verbs.insert(verb, name);
            }
            names.insert(entity_type.clone(), verbs);
        }

        let batch = namespaced(BATCH_SCOPE, Verb::Batch);
        if resolved.insert(batch.clone(), (None, Verb::Batch)).is_some() {
            warn!("Batch action type {} collides with an entity action type", batch);
        }

        Self {
            names,
            batch,
            resolved,
        }
    }

    /// The type string for `verb` on `entity_type`.
    pub fn get(&self, entity_type: &str, verb: Verb) -> Option<&str> {
        if verb == Verb::Batch {
            return Some(&self.batch);
        }
        self.names.get(entity_type)?.get(&verb).map(String::as_str)
    }

    pub fn batch(&self) -> &str {
        &self.batch
    }

    /// Maps a type string back to its entity type (`None` for batches) and verb.
    pub fn resolve(&self, action_type: &str) -> Option<(Option<&EntityType>, Verb)> {
        self.resolved
            .get(action_type)
            .map(|(entity_type, verb)| (entity_type.as_ref(), *verb))
    }

    /// True when `action` carries a type this module owns and a payload of
    /// the matching verb and entity type.
    pub fn accepts(&self, action: &Action) -> bool {
        match self.resolve(&action.action_type) {
            Some((entity_type, verb)) => {
                verb == Verb::of(&action.payload) && entity_type == action.payload.entity_type()
            }
            None => false,
        }
    }
}

/// Builds actions for one module.
#[derive(Clone)]
pub struct ActionCreators {
    namespaced: Namespacer,
}

impl fmt::Debug for ActionCreators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCreators").finish_non_exhaustive()
    }
}

impl ActionCreators {
    pub fn new(namespaced: Namespacer) -> Self {
        Self { namespaced }
    }

    /// Wraps an operation, deriving the type from its verb and entity type.
    pub fn wrap(&self, payload: Operation) -> Action {
        let verb = Verb::of(&payload);
        let scope = payload
            .entity_type()
            .map_or(BATCH_SCOPE, EntityType::as_str);
        let action_type = (self.namespaced)(scope, verb);
        Action {
            action_type,
            payload,
        }
    }

    pub fn add(&self, entity_type: impl Into<EntityType>, id: impl Into<EntityId>) -> Action {
        self.wrap(Operation::add(entity_type, id))
    }

    pub fn add_with(
        &self,
        entity_type: impl Into<EntityType>,
        id: impl Into<EntityId>,
        attachables: Vec<Attachable>,
    ) -> Action {
        self.wrap(Operation::add_with(entity_type, id, attachables))
    }

    pub fn remove(&self, entity_type: impl Into<EntityType>, id: impl Into<EntityId>) -> Action {
        self.wrap(Operation::remove(entity_type, id))
    }

    pub fn attach(
        &self,
        entity_type: impl Into<EntityType>,
        id: impl Into<EntityId>,
        rel: impl Into<String>,
        target_id: impl Into<EntityId>,
    ) -> Action {
        self.wrap(Operation::attach(entity_type, id, rel, target_id))
    }

    pub fn attach_at(
        &self,
        entity_type: impl Into<EntityType>,
        id: impl Into<EntityId>,
        rel: impl Into<String>,
        target_id: impl Into<EntityId>,
        index: Option<usize>,
        reciprocal_index: Option<usize>,
    ) -> Action {
        self.wrap(Operation::attach_at(
            entity_type,
            id,
            rel,
            target_id,
            index,
            reciprocal_index,
        ))
    }

    pub fn detach(
        &self,
        entity_type: impl Into<EntityType>,
        id: impl Into<EntityId>,
        rel: impl Into<String>,
        target_id: impl Into<EntityId>,
    ) -> Action {
        self.wrap(Operation::detach(entity_type, id, rel, target_id))
    }

    /// Groups actions into one batch action.
    pub fn batch(&self, actions: impl IntoIterator<Item = Action>) -> Action {
        self.wrap(Operation::batch(actions.into_iter().map(|a| a.payload)))
    }
}
