//! Reducer core for relstore.
//!
//! [`Reducer::reduce`] turns a [`State`](relstore_model::State) and an
//! [`Operation`](relstore_types::Operation) into the next state:
//!
//! - **Add** creates a record with every relation initialized, then writes
//!   its attachables (and their reciprocals)
//! - **Remove** deletes a record and clears every reference to it
//! - **Attach** / **Detach** write or clear a single edge on both sides
//! - **Batch** folds operations in order into one transition
//!
//! The reducer is total. Missing ids and undeclared relations are no-ops;
//! half-attached edges are cleaned up rather than rejected. Applying an
//! `Attach` then the matching `Detach` restores the prior state exactly.

mod link;
mod reducer;

pub use reducer::Reducer;
